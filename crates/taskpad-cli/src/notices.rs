/*
[INPUT]:  Client event bus subscription
[OUTPUT]: User-facing notices on stderr
[POS]:    Presentation layer - the terminal counterpart of toast messages
[UPDATE]: When adding event kinds or changing notice formatting
*/

use console::style;
use taskpad_client::{ClientEvent, NoticeLevel};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Render one event as a notice line, or `None` for silent events
pub fn render(event: &ClientEvent) -> Option<String> {
    match event {
        ClientEvent::Notice {
            level: NoticeLevel::Error,
            message,
        } => Some(format!("{} {message}", style("error:").red().bold())),
        ClientEvent::Notice {
            level: NoticeLevel::Info,
            message,
        } => Some(format!("{} {message}", style("info:").cyan())),
        ClientEvent::ForcedLogout => Some(style("You have been logged out.").yellow().to_string()),
        ClientEvent::TokenRotated { .. } => None,
    }
}

/// Print notices until `shutdown` fires or the bus closes.
pub fn spawn_notice_printer(
    mut events: broadcast::Receiver<ClientEvent>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv() => event,
            };

            match event {
                Ok(event) => {
                    if let Some(line) = render(&event) {
                        eprintln!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "notice printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
        debug!("notice printer stopped");
    })
}
