use std::fmt;
use std::time::Duration;
use tracing::{debug, info};
use trawl_config::{SearchQuery, SiteProfile};
use trawl_drivers::browser::session::{BrowserSession, ClickWait, DriverError};

/// Stage of the search form that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStep {
    Keyword,
    Location,
    Filter,
    Submit,
}

impl fmt::Display for SearchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Keyword => "keyword field",
            Self::Location => "location field",
            Self::Filter => "filter toggle",
            Self::Submit => "submit button",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("search {step} failed: {source}")]
pub struct SearchError {
    pub step: SearchStep,
    pub source: DriverError,
}

fn at(step: SearchStep) -> impl FnOnce(DriverError) -> SearchError {
    move |source| SearchError { step, source }
}

/// Fill and submit the search form on the current page.
///
/// The first failing step abandons the submission. The closing Return
/// keystroke on the keyword field is best-effort: the submit click usually
/// navigates away first.
pub async fn submit_search(
    session: &mut dyn BrowserSession,
    site: &SiteProfile,
    query: &SearchQuery,
    timeout: Duration,
) -> Result<(), SearchError> {
    session
        .fill(&site.keyword_field, &query.keyword, timeout)
        .await
        .map_err(at(SearchStep::Keyword))?;

    session
        .fill(&site.location_field, &query.location, timeout)
        .await
        .map_err(at(SearchStep::Location))?;

    session
        .click(&site.filter_toggle, ClickWait::Clickable(timeout))
        .await
        .map_err(at(SearchStep::Filter))?;

    session
        .click(&site.submit_button, ClickWait::Immediate)
        .await
        .map_err(at(SearchStep::Submit))?;

    if let Err(e) = session.press_enter(&site.keyword_field).await {
        debug!(target: "trawl.search", error = %e, "return keystroke skipped");
    }

    info!(
        target: "trawl.search",
        keyword = %query.keyword,
        location = %query.location,
        "search submitted"
    );
    Ok(())
}
