use std::sync::Arc;

use draftline_engine::Engine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Branch, version, and merge engine over the configured store.
    pub engine: Arc<Engine>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
