/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public taskpad client crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod events;
pub mod http;
pub mod types;
pub mod worker;

// Re-export commonly used types from auth
pub use auth::{AuthOutcome, CookieRefresher, Session, SessionManager, SessionStore, TokenRefresher};

pub use events::{ClientEvent, EventBus, NoticeLevel};

// Re-export commonly used types from http
pub use http::{ClientConfig, RequestContext, Result, TaskpadClient, TaskpadError};

// Re-export all types
pub use types::*;

pub use worker::{ProcessedText, TextWorker, WorkerEvent, WorkerRequest, WorkerSlot};
