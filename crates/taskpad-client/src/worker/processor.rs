/*
[INPUT]:  WorkerRequest with raw text
[OUTPUT]: Ordered progress events followed by one terminal event
[POS]:    Worker layer - four-stage text transformation
[UPDATE]: When changing stages, progress values or ranking rules
*/

use std::collections::HashMap;
use std::ops::ControlFlow;

use chrono::Utc;

use super::message::{ProcessedText, WorkerEvent, WorkerRequest};

/// Number of entries kept in the frequency ranking
pub const TOP_CHARACTERS: usize = 10;
/// Error message for a job without input
pub const MISSING_TEXT_MESSAGE: &str = "No text provided";

/// Worker state machine:
/// `Idle -> Reversing -> Uppercasing -> Analyzing -> Sorting -> Done`, or
/// `Idle -> Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStage {
    Idle,
    Reversing,
    Uppercasing,
    Analyzing,
    Sorting,
    Done,
    Failed,
}

impl WorkerStage {
    /// Progress reported on entering the stage
    pub fn progress(&self) -> Option<u8> {
        match self {
            WorkerStage::Reversing => Some(25),
            WorkerStage::Uppercasing => Some(50),
            WorkerStage::Analyzing => Some(75),
            WorkerStage::Sorting => Some(90),
            WorkerStage::Done => Some(100),
            WorkerStage::Idle | WorkerStage::Failed => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkerStage::Idle => "Initializing...",
            WorkerStage::Reversing => "Reversing text...",
            WorkerStage::Uppercasing => "Converting to uppercase...",
            WorkerStage::Analyzing => "Analyzing character frequency...",
            WorkerStage::Sorting => "Sorting results...",
            WorkerStage::Done => "Complete!",
            WorkerStage::Failed => "Failed",
        }
    }

    fn progress_event(&self) -> Option<WorkerEvent> {
        self.progress().map(|value| WorkerEvent::Progress {
            value,
            step: self.label().to_string(),
        })
    }
}

pub fn reverse_text(text: &str) -> String {
    text.chars().rev().collect()
}

pub fn uppercase(text: &str) -> String {
    text.to_uppercase()
}

/// Count every character except `' '`, in first-seen order.
pub fn character_frequency(text: &str) -> Vec<(char, usize)> {
    let mut positions: HashMap<char, usize> = HashMap::new();
    let mut counts: Vec<(char, usize)> = Vec::new();

    for ch in text.chars().filter(|ch| *ch != ' ') {
        match positions.get(&ch) {
            Some(&index) => counts[index].1 += 1,
            None => {
                positions.insert(ch, counts.len());
                counts.push((ch, 1));
            }
        }
    }

    counts
}

/// Rank by descending count; ties keep first-seen order.
pub fn rank_characters(frequency: &[(char, usize)], limit: usize) -> String {
    let mut ranked = frequency.to_vec();
    // sort_by is stable
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(limit)
        .map(|(ch, count)| format!("{ch}: {count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Run one job, handing each event to `emit` in order.
///
/// `emit` may stop the job by returning `Break`; nothing further is emitted
/// then. Returns the last stage reached.
pub fn process<F>(request: &WorkerRequest, mut emit: F) -> WorkerStage
where
    F: FnMut(WorkerEvent) -> ControlFlow<()>,
{
    let Some(text) = request.text.as_deref().filter(|text| !text.is_empty()) else {
        let _ = emit(WorkerEvent::Error {
            message: MISSING_TEXT_MESSAGE.to_string(),
        });
        return WorkerStage::Failed;
    };

    macro_rules! enter {
        ($stage:expr) => {
            if let Some(event) = $stage.progress_event()
                && emit(event).is_break()
            {
                return $stage;
            }
        };
    }

    enter!(WorkerStage::Reversing);
    let reversed = reverse_text(text);

    enter!(WorkerStage::Uppercasing);
    let upper = uppercase(&reversed);

    enter!(WorkerStage::Analyzing);
    let frequency = character_frequency(&upper);

    enter!(WorkerStage::Sorting);
    let top_characters = rank_characters(&frequency, TOP_CHARACTERS);

    enter!(WorkerStage::Done);
    let result = ProcessedText {
        original: text.to_string(),
        reversed,
        uppercase: upper,
        character_count: text.chars().count(),
        top_characters,
        processed_at: Utc::now(),
    };
    let _ = emit(WorkerEvent::Done { result });

    WorkerStage::Done
}

/// Run a job synchronously and collect every event.
pub fn process_collect(request: &WorkerRequest) -> Vec<WorkerEvent> {
    let mut events = Vec::new();
    process(request, |event| {
        events.push(event);
        ControlFlow::Continue(())
    });
    events
}
