use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// The browser primitives the filing pipeline drives.
///
/// Every operation is fallible: the page may be gone, the selector may not
/// match, the browser process may have died. Stage code converts these
/// errors into stage results; nothing here is assumed to succeed.
///
/// The session lifecycle manager owns the implementing value and tears it
/// down with `close_page` followed by `close_browser`; both shutdown calls
/// must be safe to attempt even if the other failed.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Load a URL in the active page
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait for the current navigation to settle, bounded by the driver's
    /// page-load timeout
    async fn wait_for_settle(&self) -> Result<()>;

    /// Type a value into the element matching the selector
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// Click the element matching the selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Visible text of the current page body
    async fn page_text(&self) -> Result<String>;

    /// Rendered HTML of the current page
    async fn page_html(&self) -> Result<String>;

    /// URL the page currently shows
    async fn current_url(&self) -> Result<String>;

    /// Capture the current page as a PNG at the given path
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Close the active page
    async fn close_page(&self) -> Result<()>;

    /// Shut down the browser process
    async fn close_browser(&self) -> Result<()>;
}
