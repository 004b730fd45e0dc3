use crate::detail::extract_details;
use crate::listings::{collect_listings, ListingRef};
use crate::pacing::Pacer;
use crate::paginate::{paginate, PageTurn};
use crate::record::{persist, OutputRecord};
use crate::search::submit_search;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};
use trawl_common::{Result, TrawlError};
use trawl_config::TrawlConfig;
use trawl_drivers::browser::session::BrowserSession;

/// Where a run currently is. Transitions only move forward, apart from the
/// collect/paginate cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    Searched,
    Collecting,
    Paginating,
    Extracting,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::Searched => "searched",
            Self::Collecting => "collecting",
            Self::Paginating => "paginating",
            Self::Extracting => "extracting",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Result pages listings were collected from.
    pub pages: u32,
    pub listings: usize,
    pub records: usize,
    /// Listings whose page loaded but matched none of the detail selectors.
    pub unmatched: usize,
    pub output: PathBuf,
}

/// Run the whole pipeline on `session` and close it afterwards, whether or
/// not the run succeeded.
///
/// A failure to close is reported only when the run itself succeeded.
pub async fn run(session: &mut dyn BrowserSession, config: &TrawlConfig) -> Result<RunSummary> {
    let outcome = drive(session, config).await;

    match session.close().await {
        Ok(()) => outcome,
        Err(e) => match outcome {
            Ok(_) => Err(e.into()),
            Err(run_err) => {
                warn!(target: "trawl.run", error = %e, "browser session did not close cleanly");
                Err(run_err)
            }
        },
    }
}

fn enter(phase: RunPhase) {
    info!(target: "trawl.run", %phase, "phase");
}

async fn drive(session: &mut dyn BrowserSession, config: &TrawlConfig) -> Result<RunSummary> {
    config.validate()?;
    enter(RunPhase::Init);
    let site = &config.site;
    let timeout = config.timeouts.element();

    session
        .goto(&site.root_url)
        .await
        .map_err(|e| TrawlError::Navigation {
            url: site.root_url.clone(),
            reason: e.to_string(),
        })?;

    if let Err(e) = submit_search(session, site, &config.search, timeout).await {
        warn!(target: "trawl.run", error = %e, "search submission abandoned");
    }
    enter(RunPhase::Searched);

    let (pages, listings) = collect_all(session, config).await;
    info!(target: "trawl.run", pages, listings = listings.len(), "collection finished");

    enter(RunPhase::Extracting);
    let (records, unmatched) = extract_all(session, config, &listings).await?;

    persist(&config.output.path, &records)?;
    enter(RunPhase::Done);

    let summary = RunSummary {
        pages,
        listings: listings.len(),
        records: records.len(),
        unmatched,
        output: config.output.path.clone(),
    };
    info!(
        target: "trawl.run",
        records = summary.records,
        unmatched = summary.unmatched,
        output = %summary.output.display(),
        "run complete"
    );
    Ok(summary)
}

/// Alternate collecting and paginating until the page bound is reached or
/// the paginator reports anything but [`PageTurn::Advanced`].
async fn collect_all(
    session: &mut dyn BrowserSession,
    config: &TrawlConfig,
) -> (u32, Vec<ListingRef>) {
    let site = &config.site;
    let timeout = config.timeouts.element();
    let limit = config.pagination.limit();
    let mut pacer = Pacer::new(config.pacing.page_interval());
    let mut listings = Vec::new();
    let mut pages = 0u32;

    loop {
        enter(RunPhase::Collecting);
        pacer.ready().await;
        pages += 1;
        match collect_listings(session, site, timeout).await {
            Ok(found) => {
                info!(target: "trawl.run", page = pages, found = found.len(), "listings collected");
                listings.extend(found);
            }
            Err(e) => warn!(target: "trawl.run", page = pages, error = %e, "listing collection failed"),
        }

        enter(RunPhase::Paginating);
        match paginate(session, site, timeout).await {
            PageTurn::Advanced => pacer.mark(),
            PageTurn::Exhausted => break,
            PageTurn::Fault(e) => {
                warn!(target: "trawl.run", page = pages, error = %e, "pagination failed");
                break;
            }
        }

        if limit.is_some_and(|max| pages >= max) {
            break;
        }
    }

    (pages, listings)
}

/// Visit every listing in order; one output record per listing. Also counts
/// the pages where no detail selector matched.
async fn extract_all(
    session: &mut dyn BrowserSession,
    config: &TrawlConfig,
    listings: &[ListingRef],
) -> Result<(Vec<OutputRecord>, usize)> {
    let mut pacer = Pacer::new(config.pacing.detail_interval());
    let mut records = Vec::with_capacity(listings.len());
    let mut unmatched = 0;

    for (index, listing) in listings.iter().enumerate() {
        pacer.ready().await;
        info!(
            target: "trawl.run",
            index = index + 1,
            total = listings.len(),
            link = %listing,
            "extracting listing"
        );
        let extraction = extract_details(session, &config.site, listing.as_str())
            .await
            .map_err(|e| TrawlError::Navigation {
                url: listing.to_string(),
                reason: e.to_string(),
            })?;
        if extraction.is_empty() {
            warn!(target: "trawl.run", link = %listing, "no detail fields matched, writing placeholders");
            unmatched += 1;
        }
        records.push(OutputRecord::from_extraction(extraction));
    }

    Ok((records, unmatched))
}
