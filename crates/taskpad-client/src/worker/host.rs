/*
[INPUT]:  WorkerRequest from the interactive context
[OUTPUT]: Channel of WorkerEvents from an isolated blocking task
[POS]:    Worker layer - execution host, termination and single-slot policy
[UPDATE]: When changing isolation, buffering or termination semantics
*/

use std::ops::ControlFlow;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::http::{Result, TaskpadError};

use super::message::{ProcessedText, WorkerEvent, WorkerRequest};
use super::processor::process;

const EVENT_BUFFER: usize = 16;

/// Handle to one running text-processing job.
///
/// The job runs on the blocking pool and shares no state with the caller;
/// events arrive in emission order over a bounded channel.
#[derive(Debug)]
pub struct TextWorker {
    events: mpsc::Receiver<WorkerEvent>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TextWorker {
    /// Post a job to a fresh worker. Must be called inside a Tokio runtime.
    pub fn spawn(request: WorkerRequest) -> Self {
        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        let job_cancel = cancel.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let stage = process(&request, |event| {
                if job_cancel.is_cancelled() {
                    return ControlFlow::Break(());
                }
                match tx.blocking_send(event) {
                    Ok(()) => ControlFlow::Continue(()),
                    Err(_) => ControlFlow::Break(()),
                }
            });
            debug!(?stage, "text worker exited");
        });

        Self {
            events,
            cancel,
            handle,
        }
    }

    /// Next event, or `None` once the job ended or was terminated.
    pub async fn next_event(&mut self) -> Option<WorkerEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.events.recv().await
    }

    /// Stop the job and discard anything still in flight.
    ///
    /// No final event is guaranteed after this.
    pub fn terminate(&mut self) {
        if !self.cancel.is_cancelled() {
            debug!("terminating text worker");
        }
        self.cancel.cancel();
        self.events.close();
    }

    pub fn is_terminated(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// True once the job body has returned
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Drive the job to its terminal event, reporting progress on the way.
    pub async fn run<F>(mut self, mut on_progress: F) -> Result<ProcessedText>
    where
        F: FnMut(u8, &str),
    {
        while let Some(event) = self.next_event().await {
            match event {
                WorkerEvent::Progress { value, step } => on_progress(value, &step),
                WorkerEvent::Done { result } => return Ok(result),
                WorkerEvent::Error { message } => return Err(TaskpadError::Worker(message)),
            }
        }
        Err(TaskpadError::Worker(
            "worker stopped before completing".to_string(),
        ))
    }
}

impl Drop for TextWorker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// At most one active worker per owner.
///
/// Starting a job terminates the previous one first, so two terminal events
/// can never race. Dropping the slot terminates the active worker.
#[derive(Debug, Default)]
pub struct WorkerSlot {
    current: Option<TextWorker>,
}

impl WorkerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, request: WorkerRequest) -> &mut TextWorker {
        self.terminate();
        self.current.insert(TextWorker::spawn(request))
    }

    pub fn current(&mut self) -> Option<&mut TextWorker> {
        self.current.as_mut()
    }

    /// Hand the active worker to the caller, leaving the slot empty
    pub fn take(&mut self) -> Option<TextWorker> {
        self.current.take()
    }

    /// A worker is held and neither terminated nor finished
    pub fn is_active(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|worker| !worker.is_terminated() && !worker.is_finished())
    }

    /// Returns whether a worker was terminated
    pub fn terminate(&mut self) -> bool {
        match self.current.take() {
            Some(mut worker) => {
                worker.terminate();
                true
            }
            None => false,
        }
    }
}
