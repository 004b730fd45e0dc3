use crate::detail::DetailExtraction;
use serde::{Serialize, Serializer};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use trawl_common::{Result, TrawlError};

/// Substituted for any field whose extraction failed.
pub const PLACEHOLDER: &str = "Not available";
/// Message of the record written for a listing that produced no result.
pub const NO_DETAILS: &str = "No details found";

/// Benefit lines of a posting, or the placeholder when they could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Benefits {
    Listed(Vec<String>),
    Unavailable,
}

impl Serialize for Benefits {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Benefits::Listed(items) => items.serialize(serializer),
            Benefits::Unavailable => serializer.serialize_str(PLACEHOLDER),
        }
    }
}

/// Flat field mapping extracted from one detail page. Field order is the
/// key order of the output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub benefits: Benefits,
    pub description: String,
    pub posted_date: String,
    pub link: String,
}

impl JobRecord {
    /// Apply the placeholder policy: every failed field becomes
    /// [`PLACEHOLDER`], the link is kept verbatim.
    pub fn from_extraction(extraction: DetailExtraction) -> Self {
        fn text<E>(field: std::result::Result<String, E>) -> String {
            field.unwrap_or_else(|_| PLACEHOLDER.to_string())
        }

        Self {
            title: text(extraction.title),
            company: text(extraction.company),
            location: text(extraction.location),
            benefits: extraction
                .benefits
                .map(Benefits::Listed)
                .unwrap_or(Benefits::Unavailable),
            description: text(extraction.description),
            posted_date: text(extraction.posted_date),
            link: extraction.link,
        }
    }
}

/// One line of the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutputRecord {
    Job(JobRecord),
    Error { error: String },
}

impl OutputRecord {
    /// A page that loaded is always a job record, even when none of its
    /// selectors matched: the link still identifies it.
    pub fn from_extraction(extraction: DetailExtraction) -> Self {
        Self::Job(JobRecord::from_extraction(extraction))
    }

    pub fn no_details() -> Self {
        Self::Error {
            error: NO_DETAILS.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Write one JSON object per line. Non-ASCII text is emitted unescaped.
pub fn write_json_lines<W: Write>(mut writer: W, records: &[OutputRecord]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)
            .map_err(|e| TrawlError::Serialize(e.to_string()))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Create (or truncate) `path` and write all records to it.
pub fn persist(path: &Path, records: &[OutputRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write_json_lines(BufWriter::new(file), records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use trawl_drivers::browser::session::DriverError;

    fn missing() -> DriverError {
        DriverError::NotFound {
            target: "class `job_company`".into(),
        }
    }

    fn full_extraction() -> DetailExtraction {
        DetailExtraction {
            link: "https://www.ziprecruiter.com/c/Acme/Job/Data-Intern".into(),
            title: Ok("A".into()),
            company: Ok("Acme".into()),
            location: Ok("Raleigh, NC".into()),
            benefits: Ok(vec!["401k".into(), "Dental".into()]),
            description: Ok("Build pipelines. Ship them.".into()),
            posted_date: Ok("Posted 3 days ago".into()),
        }
    }

    fn lines(records: &[OutputRecord]) -> Vec<String> {
        let mut buf = Vec::new();
        write_json_lines(&mut buf, records).unwrap();
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn job_and_error_records_serialize_to_two_lines() {
        let records = vec![
            OutputRecord::from_extraction(full_extraction()),
            OutputRecord::no_details(),
        ];
        let out = lines(&records);
        assert_eq!(out.len(), 2);

        let first: Value = serde_json::from_str(&out[0]).unwrap();
        assert_eq!(first["title"], "A");
        assert_eq!(first["benefits"], serde_json::json!(["401k", "Dental"]));
        assert_eq!(out[1], r#"{"error":"No details found"}"#);
    }

    #[test]
    fn keys_keep_declared_order() {
        let out = lines(&[OutputRecord::from_extraction(full_extraction())]);
        let keys = ["title", "company", "location", "benefits", "description", "posted_date", "link"];
        let positions: Vec<usize> = keys
            .iter()
            .map(|k| out[0].find(&format!("\"{k}\":")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn failed_fields_become_placeholders() {
        let mut ex = full_extraction();
        ex.company = Err(missing());
        ex.benefits = Err(missing());
        let record = JobRecord::from_extraction(ex);
        assert_eq!(record.company, PLACEHOLDER);
        assert_eq!(record.benefits, Benefits::Unavailable);
        assert_eq!(record.title, "A");

        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["benefits"], PLACEHOLDER);
        assert_eq!(v.as_object().unwrap().len(), 7);
    }

    #[test]
    fn page_with_no_matches_keeps_its_link() {
        let link = "https://www.ziprecruiter.com/j/9";
        let ex = DetailExtraction {
            link: link.into(),
            title: Err(missing()),
            company: Err(missing()),
            location: Err(missing()),
            benefits: Err(missing()),
            description: Err(missing()),
            posted_date: Err(missing()),
        };
        assert!(ex.is_empty());

        let record = OutputRecord::from_extraction(ex);
        assert!(!record.is_error());

        let v = serde_json::to_value(&record).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 7);
        assert_eq!(obj["link"], link);
        for key in ["title", "company", "location", "benefits", "description", "posted_date"] {
            assert_eq!(obj[key], PLACEHOLDER, "{key}");
        }
    }

    #[test]
    fn non_ascii_is_not_escaped() {
        let mut ex = full_extraction();
        ex.location = Ok("Zürich – Remote".into());
        let out = lines(&[OutputRecord::from_extraction(ex)]);
        assert!(out[0].contains("Zürich – Remote"));
    }

    #[test]
    fn persist_creates_parent_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("runs").join("jobs.jl");
        persist(&path, &[OutputRecord::no_details()]).unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, "{\"error\":\"No details found\"}\n");
    }
}
