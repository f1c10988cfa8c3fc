/*
[INPUT]:  Job requests posted to the text worker
[OUTPUT]: Progress, result and error messages emitted by the worker
[POS]:    Worker layer - message protocol (JSON, type-tagged)
[UPDATE]: When adding message kinds or result fields
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound job: `{text}`. A missing or empty text is a failed job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
    #[serde(default)]
    pub text: Option<String>,
}

impl WorkerRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// Final output of a completed job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedText {
    pub original: String,
    pub reversed: String,
    pub uppercase: String,
    /// Characters in the original input, spaces included
    pub character_count: usize,
    /// Up to ten `CHAR: COUNT` entries joined by ", "
    pub top_characters: String,
    pub processed_at: DateTime<Utc>,
}

/// Outbound worker message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerEvent {
    Progress { value: u8, step: String },
    Done { result: ProcessedText },
    Error { message: String },
}

impl WorkerEvent {
    /// Done and Error end a job; nothing follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerEvent::Done { .. } | WorkerEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_text_is_optional() {
        let request: WorkerRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.text, None);

        let request: WorkerRequest = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(request, WorkerRequest::new("hi"));
    }

    #[test]
    fn test_event_wire_shapes() {
        let progress = WorkerEvent::Progress {
            value: 25,
            step: "Reversing text...".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&progress).unwrap(),
            serde_json::json!({"type": "progress", "value": 25, "step": "Reversing text..."})
        );

        let error = WorkerEvent::Error {
            message: "No text provided".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({"type": "error", "message": "No text provided"})
        );
        assert!(error.is_terminal());
        assert!(!progress.is_terminal());
    }

    #[test]
    fn test_result_uses_camel_case_fields() {
        let raw = r#"{
            "type": "done",
            "result": {
                "original": "ab",
                "reversed": "ba",
                "uppercase": "BA",
                "characterCount": 2,
                "topCharacters": "B: 1, A: 1",
                "processedAt": "2024-01-01T00:00:00Z"
            }
        }"#;
        let event: WorkerEvent = serde_json::from_str(raw).unwrap();
        match event {
            WorkerEvent::Done { result } => {
                assert_eq!(result.character_count, 2);
                assert_eq!(result.top_characters, "B: 1, A: 1");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
