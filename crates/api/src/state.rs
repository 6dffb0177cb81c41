use std::sync::Arc;

use reelworks_core::Workflow;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// The workflow service, over whichever store the binary wired in.
    pub workflow: Workflow,
    pub config: Arc<ServerConfig>,
}
