//! Draftline event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DocumentEvent`]: the envelope published whenever a document's
//!   history changes in a way other components care about.
//! - [`names`]: the event types the engine publishes.

pub mod bus;
pub mod names;

pub use bus::{DocumentEvent, EventBus};
