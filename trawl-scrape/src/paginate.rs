use std::time::Duration;
use tracing::{debug, info};
use trawl_config::SiteProfile;
use trawl_drivers::browser::session::{BrowserSession, ClickWait, DriverError};

/// Result of trying to move to the next results page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageTurn {
    /// The "Next" control was clicked.
    Advanced,
    /// No clickable "Next" control appeared in time.
    Exhausted,
    Fault(DriverError),
}

/// Scroll to the bottom of the page, then click the "Next" control if one
/// becomes clickable within `timeout`.
pub async fn paginate(
    session: &mut dyn BrowserSession,
    site: &SiteProfile,
    timeout: Duration,
) -> PageTurn {
    if let Err(e) = session.scroll_to_bottom().await {
        return PageTurn::Fault(e);
    }

    match session
        .click(&site.next_link, ClickWait::Clickable(timeout))
        .await
    {
        Ok(()) => {
            debug!(target: "trawl.paginate", "advanced to next results page");
            PageTurn::Advanced
        }
        Err(e) if e.is_absent() => {
            info!(target: "trawl.paginate", reason = %e, "no next page");
            PageTurn::Exhausted
        }
        Err(e) => PageTurn::Fault(e),
    }
}
