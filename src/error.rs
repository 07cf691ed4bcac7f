//! Error types for the rendering pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a request into an image
#[derive(Error, Debug)]
pub enum Error {
    /// Host header and request URL could not be composed into an absolute URL
    #[error("Malformed request URL: {0}")]
    MalformedRequest(String),

    /// Browser launch, navigation or capture failed
    #[error("Rendering failed: {0}")]
    RenderFailure(String),

    /// Navigation or network settle did not finish in time
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Embedded font files could not be loaded
    #[error("Asset loading failed: {0}")]
    Asset(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for failures raised by the rendering session (including timeouts).
    pub fn is_render_failure(&self) -> bool {
        matches!(self, Error::RenderFailure(_) | Error::Timeout(_))
    }
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::RenderFailure(err.to_string())
    }
}
