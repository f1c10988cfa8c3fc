/*
[INPUT]:  Credentials, refresh cookie, client event bus
[OUTPUT]: Session state, refreshed tokens, lifecycle outcomes
[POS]:    Auth layer - client-side session lifecycle
[UPDATE]: When auth flow or refresh strategy changes
*/

pub mod manager;
pub mod refresher;
pub mod store;

pub use manager::{AuthOutcome, SessionManager};
pub use refresher::{CookieRefresher, TokenRefresher};
pub use store::{Session, SessionStore};
