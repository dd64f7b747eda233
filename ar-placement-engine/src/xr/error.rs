use thiserror::Error;

/// Failures reported by the AR platform or the model loader.
///
/// None of these are fatal: the frame loop keeps running and the user can
/// retry from the start control or by tapping again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArError {
    #[error("AR session unavailable: {0}")]
    SessionUnavailable(String),

    #[error("required feature '{0}' is not supported on this device")]
    FeatureUnsupported(String),

    #[error("hit-test setup failed: {0}")]
    HitTestSetup(String),

    #[error("failed to load '{path}': {reason}")]
    AssetLoad { path: String, reason: String },
}
