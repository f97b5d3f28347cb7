use thiserror::Error;

/// Errors produced by the filing automation library
#[derive(Debug, Error)]
pub enum FilingError {
    /// The jurisdiction code is not in the supported set
    #[error("jurisdiction '{0}' is not supported")]
    UnsupportedJurisdiction(String),

    /// The browser automation dependency is missing or failed to start
    #[error(
        "browser driver unavailable: {0}. Install Chrome or Chromium and make sure it is on \
         PATH, or point LaunchOptions::chrome_path at the binary"
    )]
    DriverUnavailable(String),

    /// A text-generation request to the model endpoint failed
    #[error("model request failed: {0}")]
    ModelRequestFailed(String),

    /// Page navigation failed or timed out
    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    /// No element matched the selector on the current page
    #[error("element '{selector}' not found: {reason}")]
    ElementNotFound { selector: String, reason: String },

    /// A browser action (fill, click, read) failed after the element was located
    #[error("browser action failed: {0}")]
    ActionFailed(String),

    /// Screenshot capture or write failed
    #[error("screenshot failed: {0}")]
    ScreenshotFailed(String),

    /// The session was already closed
    #[error("filing session is closed")]
    SessionClosed,

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for filing operations
pub type Result<T> = std::result::Result<T, FilingError>;
