/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod health;
pub mod pipeline;
pub mod tasks;

pub use error::{GENERIC_ERROR_MESSAGE, Result, TaskpadError};
pub use pipeline::{RequestContext, SESSION_EXPIRED_NOTICE};

pub use client::{API_URL_ENV, ClientConfig, DEFAULT_BASE_URL, TaskpadClient};
