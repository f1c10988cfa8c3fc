/*
[INPUT]:  Signals raised by the HTTP pipeline and the session manager
[OUTPUT]: Broadcast ClientEvent stream for session owners and notice surfaces
[POS]:    Cross-component signalling - replaces ambient global events
[UPDATE]: When adding new event kinds or changing delivery guarantees
*/

use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Events published on the client-wide bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The transport could not recover from a 401; the session is dead.
    ForcedLogout,
    /// The transport rotated the access token while retrying a request.
    TokenRotated { access_token: String },
    /// Message meant for the user (error toast equivalent).
    Notice { level: NoticeLevel, message: String },
}

/// Publish/subscribe channel handed to the transport at construction.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: ClientEvent) {
        if self.tx.send(event).is_err() {
            debug!("client event dropped; no subscribers");
        }
    }

    pub fn forced_logout(&self) {
        self.publish(ClientEvent::ForcedLogout);
    }

    pub fn error_notice(&self, message: impl Into<String>) {
        self.publish(ClientEvent::Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        });
    }

    pub fn info_notice(&self, message: impl Into<String>) {
        self.publish(ClientEvent::Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
