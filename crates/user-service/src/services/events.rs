//! Change notifications for identity mutations.
//!
//! Listeners (cache invalidation, audit, etc.) subscribe to a broadcast
//! channel. Publishing with nobody listening is not an error, and a slow
//! listener only ever lags itself.

use crate::models::{UserEvent, UserView};
use crate::observability::metrics::record_event_published;
use tokio::sync::broadcast;

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct UserEventBus {
    sender: broadcast::Sender<UserEvent>,
}

impl Default for UserEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl UserEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UserEvent> {
        self.sender.subscribe()
    }

    /// Publish `event`, stripping any token from the carried view.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, event: UserEvent) -> usize {
        let event = match event {
            UserEvent::Created(view) => UserEvent::Created(without_token(view)),
            UserEvent::Updated(view) => UserEvent::Updated(without_token(view)),
        };
        let kind = event.kind();

        match self.sender.send(event) {
            Ok(receivers) => {
                record_event_published(kind);
                receivers
            }
            Err(_) => {
                tracing::debug!(target: "user.services.events", kind, "No subscribers for user event");
                0
            }
        }
    }
}

fn without_token(view: UserView) -> UserView {
    UserView {
        token: None,
        ..view
    }
}
