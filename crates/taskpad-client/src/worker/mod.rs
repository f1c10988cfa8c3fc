/*
[INPUT]:  Raw task text from the interactive context
[OUTPUT]: Progress and result messages from an isolated worker
[POS]:    Worker layer - off-main-context text processing
[UPDATE]: When changing the worker protocol or stages
*/

pub mod host;
pub mod message;
pub mod processor;

pub use host::{TextWorker, WorkerSlot};
pub use message::{ProcessedText, WorkerEvent, WorkerRequest};
pub use processor::{
    WorkerStage, character_frequency, process, process_collect, rank_characters, reverse_text,
    uppercase,
};
