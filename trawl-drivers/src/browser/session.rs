use async_trait::async_trait;
use std::time::Duration;
use trawl_common::{Target, TrawlError};
use url::Url;

/// Failures reported by a [`BrowserSession`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// A wait condition did not hold before its ceiling.
    #[error("timed out after {waited:?} waiting for {target}")]
    Timeout { target: String, waited: Duration },

    /// Nothing on the page matches the locator.
    #[error("no element matches {target}")]
    NotFound { target: String },

    #[error("could not connect to WebDriver at {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("script failed: {0}")]
    Script(String),

    /// Any other WebDriver failure (stale element, not interactable, ...).
    #[error("WebDriver error: {0}")]
    WebDriver(String),

    #[error("browser session already closed")]
    Closed,
}

impl DriverError {
    pub fn timeout(target: &Target, waited: Duration) -> Self {
        Self::Timeout {
            target: target.to_string(),
            waited,
        }
    }

    pub fn not_found(target: &Target) -> Self {
        Self::NotFound {
            target: target.to_string(),
        }
    }

    /// True when the element simply was not there, as opposed to a broken session.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::NotFound { .. })
    }
}

impl From<DriverError> for TrawlError {
    fn from(err: DriverError) -> Self {
        TrawlError::Driver(err.to_string())
    }
}

/// How long [`BrowserSession::click`] may wait for its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickWait {
    /// Look the element up once.
    Immediate,
    /// Poll until the element is displayed and enabled.
    Clickable(Duration),
}

/// The browser operations the scrape pipeline relies on.
///
/// One session is owned by the run and lent mutably to each step; nothing
/// holds it concurrently.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate and block until the browser reports the load complete.
    async fn goto(&mut self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&mut self) -> Result<Url, DriverError>;

    /// Wait for the element to be present, clear it and type `text`.
    async fn fill(&mut self, target: &Target, text: &str, timeout: Duration)
        -> Result<(), DriverError>;

    async fn click(&mut self, target: &Target, wait: ClickWait) -> Result<(), DriverError>;

    /// Send a Return keystroke to the element.
    async fn press_enter(&mut self, target: &Target) -> Result<(), DriverError>;

    /// Visible text of the first match; `NotFound` when nothing matches.
    async fn first_text(&mut self, target: &Target) -> Result<String, DriverError>;

    /// Visible text of every match in document order, possibly empty.
    async fn all_texts(&mut self, target: &Target) -> Result<Vec<String>, DriverError>;

    /// Wait until at least one element matches, then read `attribute` from
    /// every match in document order.
    async fn all_attributes(
        &mut self,
        target: &Target,
        attribute: &str,
        timeout: Duration,
    ) -> Result<Vec<Option<String>>, DriverError>;

    async fn scroll_to_bottom(&mut self) -> Result<(), DriverError>;

    /// End the browser session. Further calls fail with [`DriverError::Closed`].
    async fn close(&mut self) -> Result<(), DriverError>;
}
