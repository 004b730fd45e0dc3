//! Common types and utilities shared across the jobtrawl crates.
//!
//! This crate defines the element locator model, observability helpers and
//! the shared error type used throughout the workspace. It stays small so
//! every crate can depend on it without pulling in the browser stack.
//!
//! # Overview
//!
//! - [`Target`] and [`By`]: how a page element is located
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`TrawlError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use trawl_common::{By, Target};
//!
//! let company = Target::class_name("job_company");
//! assert_eq!(company.by, By::ClassName);
//! assert_eq!(company.to_string(), "class `job_company`");
//! ```
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod observability;

/// Strategy used to locate an element on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum By {
    #[serde(rename = "css")]
    Css,
    #[serde(rename = "xpath")]
    XPath,
    #[serde(rename = "id")]
    Id,
    /// Matches the `name` attribute, typically on form inputs.
    #[serde(rename = "name")]
    Name,
    /// Matches a single CSS class.
    #[serde(rename = "class")]
    ClassName,
    /// Matches anchors by their exact visible text.
    #[serde(rename = "link_text")]
    LinkText,
}

/// A locator for one or more elements, kept as data so site layout changes
/// are configuration updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub by: By,
    pub value: String,
}

impl Target {
    pub fn new(by: By, value: impl Into<String>) -> Self {
        Self {
            by,
            value: value.into(),
        }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(By::Css, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(By::XPath, value)
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(By::Id, value)
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::new(By::Name, value)
    }

    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(By::ClassName, value)
    }

    pub fn link_text(value: impl Into<String>) -> Self {
        Self::new(By::LinkText, value)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.by {
            By::Css => "css",
            By::XPath => "xpath",
            By::Id => "id",
            By::Name => "name",
            By::ClassName => "class",
            By::LinkText => "link text",
        };
        write!(f, "{kind} `{}`", self.value)
    }
}

/// Error types used across the jobtrawl workspace.
#[derive(thiserror::Error, Debug)]
pub enum TrawlError {
    /// The browser session reported a failure outside of a guarded extraction.
    #[error("Driver error: {0}")]
    Driver(String),

    /// Navigating the session to a page failed; the run cannot continue.
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Writing the output artifact failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// A record could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Convenient alias for results that use [`TrawlError`].
pub type Result<T> = std::result::Result<T, TrawlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_deserializes_from_by_value_pairs() {
        let t: Target =
            serde_json::from_str(r#"{"by":"xpath","value":"/html/body/div/ul[1]/li/strong/a"}"#)
                .unwrap();
        assert_eq!(t, Target::xpath("/html/body/div/ul[1]/li/strong/a"));

        let t: Target = serde_json::from_str(r#"{"by":"class","value":"job_posted"}"#).unwrap();
        assert_eq!(t.by, By::ClassName);
    }

    #[test]
    fn target_display_names_strategy() {
        assert_eq!(Target::link_text("Next").to_string(), "link text `Next`");
        assert_eq!(Target::name("keywords").to_string(), "name `keywords`");
    }

    #[test]
    fn navigation_error_message_includes_url() {
        let err = TrawlError::Navigation {
            url: "https://example.com/job/1".into(),
            reason: "net::ERR_NAME_NOT_RESOLVED".into(),
        };
        assert_eq!(
            err.to_string(),
            "Navigation to https://example.com/job/1 failed: net::ERR_NAME_NOT_RESOLVED"
        );
    }
}
