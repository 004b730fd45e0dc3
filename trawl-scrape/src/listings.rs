use std::fmt;
use std::time::Duration;
use tracing::debug;
use trawl_config::SiteProfile;
use trawl_drivers::browser::session::{BrowserSession, DriverError};
use url::Url;

/// URL of one job posting's detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRef(String);

impl ListingRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read the listing anchors on the current results page and keep those that
/// point at the partner domain, in document order.
///
/// Waits up to `timeout` for the anchors to appear. No deduplication.
pub async fn collect_listings(
    session: &mut dyn BrowserSession,
    site: &SiteProfile,
    timeout: Duration,
) -> Result<Vec<ListingRef>, DriverError> {
    let hrefs = session
        .all_attributes(&site.listing_links, "href", timeout)
        .await?;
    let base = session.current_url().await?;
    let total = hrefs.len();

    let kept = partner_links(&base, hrefs, &site.partner_domain);
    debug!(
        target: "trawl.listings",
        anchors = total,
        kept = kept.len(),
        partner = %site.partner_domain,
        "filtered listing anchors"
    );
    Ok(kept)
}

/// Resolve each href against `base` and keep it when its host contains
/// `partner`. Missing or unparsable hrefs are skipped.
pub fn partner_links<I>(base: &Url, hrefs: I, partner: &str) -> Vec<ListingRef>
where
    I: IntoIterator<Item = Option<String>>,
{
    hrefs
        .into_iter()
        .flatten()
        .filter_map(|href| {
            let (url, text) = match Url::parse(&href) {
                Ok(url) => (url, href),
                Err(url::ParseError::RelativeUrlWithoutBase) => {
                    let url = base.join(&href).ok()?;
                    let text = url.to_string();
                    (url, text)
                }
                Err(_) => return None,
            };
            url.host_str()
                .is_some_and(|host| host.contains(partner))
                .then(|| ListingRef(text))
        })
        .collect()
}
