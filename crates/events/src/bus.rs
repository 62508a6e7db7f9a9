//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the engine, which
//! publishes, and any cache or analysis component that subscribes.
//! Publishing never fails: with no subscribers the event is dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use draftline_core::types::DbId;

// ---------------------------------------------------------------------------
// DocumentEvent
// ---------------------------------------------------------------------------

/// Something that happened to a document.
///
/// Built with [`DocumentEvent::new`] and the `with_*` builder methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEvent {
    /// Dot-separated event name, one of [`crate::names`].
    pub event_type: String,

    pub document_id: DbId,

    /// Branch whose head changed, or the merge target.
    pub branch_id: Option<DbId>,

    pub merge_event_id: Option<DbId>,

    /// User that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// Event-specific extras.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl DocumentEvent {
    pub fn new(event_type: impl Into<String>, document_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            document_id,
            branch_id: None,
            merge_event_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_branch(mut self, branch_id: DbId) -> Self {
        self.branch_id = Some(branch_id);
        self
    }

    pub fn with_merge(mut self, merge_event_id: DbId) -> Self {
        self.merge_event_id = Some(merge_event_id);
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use draftline_events::{DocumentEvent, EventBus};
/// use draftline_events::names::ANALYSIS_INVALIDATED;
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DocumentEvent::new(ANALYSIS_INVALIDATED, 1).with_branch(2));
/// assert_eq!(rx.try_recv().unwrap().branch_id, Some(2));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DocumentEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Returns how many
    /// subscribers it reached.
    pub fn publish(&self, event: DocumentEvent) -> usize {
        let event_type = event.event_type.clone();
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(event_type = %event_type, receivers, "Event published");
                receivers
            }
            // Only fails when nobody is subscribed.
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
