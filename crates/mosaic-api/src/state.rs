//! Application state.

use std::sync::Arc;

use mosaic_media::FaceDetector;

use crate::config::ApiConfig;

/// Shared application state.
///
/// The detector is injected at startup so tests can substitute deterministic
/// implementations.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub detector: Arc<dyn FaceDetector>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig, detector: Arc<dyn FaceDetector>) -> Self {
        Self { config, detector }
    }
}
