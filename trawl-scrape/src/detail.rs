use tracing::{debug, warn};
use trawl_common::Target;
use trawl_config::SiteProfile;
use trawl_drivers::browser::session::{BrowserSession, DriverError};

/// Outcome of reading a single field.
pub type Field<T> = Result<T, DriverError>;

/// Raw outcome of reading one detail page. Each field succeeded or failed on
/// its own; [`crate::record::JobRecord::from_extraction`] decides what a
/// failure looks like in the output.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailExtraction {
    pub link: String,
    pub title: Field<String>,
    pub company: Field<String>,
    pub location: Field<String>,
    pub benefits: Field<Vec<String>>,
    pub description: Field<String>,
    pub posted_date: Field<String>,
}

impl DetailExtraction {
    /// True when none of the six fields could be read.
    pub fn is_empty(&self) -> bool {
        self.title.is_err()
            && self.company.is_err()
            && self.location.is_err()
            && self.benefits.is_err()
            && self.description.is_err()
            && self.posted_date.is_err()
    }
}

/// Navigate to `link` and read every detail field.
///
/// Only a navigation failure is returned as an error; field failures are
/// logged and recorded in the extraction.
pub async fn extract_details(
    session: &mut dyn BrowserSession,
    site: &SiteProfile,
    link: &str,
) -> Result<DetailExtraction, DriverError> {
    session.goto(link).await?;

    let title = logged(link, "title", first_text(session, &site.title).await);
    let company = logged(link, "company", first_text(session, &site.company).await);
    let location = logged(link, "location", first_text(session, &site.location).await);
    let benefits = logged(link, "benefits", every_text(session, &site.benefits).await);
    let description = logged(
        link,
        "description",
        every_text(session, &site.description)
            .await
            .map(|parts| parts.join(" ")),
    );
    let posted_date = logged(link, "posted_date", first_text(session, &site.posted_date).await);

    Ok(DetailExtraction {
        link: link.to_string(),
        title,
        company,
        location,
        benefits,
        description,
        posted_date,
    })
}

async fn first_text(session: &mut dyn BrowserSession, target: &Target) -> Field<String> {
    session.first_text(target).await
}

/// All matching texts; zero matches count as a miss.
async fn every_text(session: &mut dyn BrowserSession, target: &Target) -> Field<Vec<String>> {
    let texts = session.all_texts(target).await?;
    if texts.is_empty() {
        return Err(DriverError::not_found(target));
    }
    Ok(texts)
}

fn logged<T>(link: &str, field: &'static str, outcome: Field<T>) -> Field<T> {
    match &outcome {
        Ok(_) => debug!(target: "trawl.detail", field, %link, "field extracted"),
        Err(e) => warn!(target: "trawl.detail", field, %link, error = %e, "field unavailable"),
    }
    outcome
}
