//! Loader for run configuration with YAML + environment overlays.
//!
//! Every field has a default matching the collegegrad.com search the tool was
//! built for, so an empty configuration reproduces the stock run. Sources are
//! merged in order: optional YAML file(s), inline YAML snippets, then
//! `JOBTRAWL__`-prefixed environment variables (`JOBTRAWL__SEARCH__KEYWORD`
//! maps to `search.keyword`). String values may reference `${VAR}`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use trawl_common::{Target, TrawlError};
use trawl_common::observability::LogSettings;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "JOBTRAWL";

/// File name looked up when no explicit config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "jobtrawl.yaml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrawlConfig {
    pub site: SiteProfile,
    pub search: SearchQuery,
    pub browser: BrowserConfig,
    pub timeouts: TimeoutConfig,
    pub pacing: PacingConfig,
    pub pagination: PaginationConfig,
    pub output: OutputConfig,
    pub logging: LogSettings,
}

/// The structural contract with the target site: where the form, listings
/// and detail fields live.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub root_url: String,
    /// Listing links are kept only when their host contains this substring.
    pub partner_domain: String,
    pub keyword_field: Target,
    pub location_field: Target,
    pub filter_toggle: Target,
    pub submit_button: Target,
    pub listing_links: Target,
    pub next_link: Target,
    pub title: Target,
    pub company: Target,
    pub location: Target,
    pub benefits: Target,
    pub description: Target,
    pub posted_date: Target,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            root_url: "https://www.collegegrad.com/".into(),
            partner_domain: "ziprecruiter".into(),
            keyword_field: Target::name("keywords"),
            location_field: Target::name("location"),
            filter_toggle: Target::id("ei"),
            submit_button: Target::id("searchJobsBtn"),
            listing_links: Target::xpath("/html/body/div/ul[1]/li/strong/a"),
            next_link: Target::link_text("Next"),
            title: Target::css("h1"),
            company: Target::class_name("job_company"),
            location: Target::class_name("job_location"),
            benefits: Target::class_name("job_benefits_list"),
            description: Target::class_name("job_description"),
            posted_date: Target::class_name("job_posted"),
        }
    }
}

/// Keyword and location submitted to the search form. Immutable per run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub keyword: String,
    pub location: String,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            keyword: "Software, Data, Computer, Information, Technology".into(),
            location: "North Carolina".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// WebDriver endpoint, chromedriver by default.
    pub webdriver_url: String,
    pub headless: bool,
    /// Type form input one character at a time with small random pauses.
    pub human_typing: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: false,
            human_typing: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Ceiling for every element wait.
    pub element_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { element_secs: 10 }
    }
}

impl TimeoutConfig {
    pub fn element(&self) -> Duration {
        Duration::from_secs(self.element_secs)
    }
}

/// Minimum spacing between requests against the target site.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub page_interval_ms: u64,
    pub detail_interval_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page_interval_ms: 2000,
            detail_interval_ms: 1000,
        }
    }
}

impl PacingConfig {
    pub fn page_interval(&self) -> Duration {
        Duration::from_millis(self.page_interval_ms)
    }

    pub fn detail_interval(&self) -> Duration {
        Duration::from_millis(self.detail_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Result pages to collect from. `0` or `null` collects until the site
    /// runs out of pages.
    pub max_pages: Option<u32>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { max_pages: Some(1) }
    }
}

impl PaginationConfig {
    /// Effective page bound, `None` meaning unbounded.
    pub fn limit(&self) -> Option<u32> {
        self.max_pages.filter(|n| *n > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("jobs.jl"),
        }
    }
}

impl TrawlConfig {
    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> trawl_common::Result<()> {
        let site = &self.site;
        if !(site.root_url.starts_with("http://") || site.root_url.starts_with("https://")) {
            return Err(TrawlError::Config(format!(
                "site.root_url must be an http(s) URL, got {:?}",
                site.root_url
            )));
        }
        if site.partner_domain.trim().is_empty() {
            return Err(TrawlError::Config("site.partner_domain is empty".into()));
        }
        for (key, target) in site.targets() {
            if target.value.trim().is_empty() {
                return Err(TrawlError::Config(format!("site.{key} has an empty locator")));
            }
        }
        if self.timeouts.element_secs == 0 {
            return Err(TrawlError::Config("timeouts.element_secs must be positive".into()));
        }
        Ok(())
    }
}

impl SiteProfile {
    fn targets(&self) -> [(&'static str, &Target); 12] {
        [
            ("keyword_field", &self.keyword_field),
            ("location_field", &self.location_field),
            ("filter_toggle", &self.filter_toggle),
            ("submit_button", &self.submit_button),
            ("listing_links", &self.listing_links),
            ("next_link", &self.next_link),
            ("title", &self.title),
            ("company", &self.company),
            ("location", &self.location),
            ("benefits", &self.benefits),
            ("description", &self.description),
            ("posted_date", &self.posted_date),
        ]
    }
}

/// Config files picked up when none is named explicitly, lowest precedence
/// first: the per-user config directory, then `./jobtrawl.yaml`.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = dirs::config_dir()
        .map(|dir| dir.join("jobtrawl").join(DEFAULT_CONFIG_FILE))
        .into_iter()
        .collect();
    paths.push(PathBuf::from(DEFAULT_CONFIG_FILE));
    paths
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct TrawlConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: String,
}

impl Default for TrawlConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TrawlConfigLoader {
    /// Start from built-in defaults; environment overrides are applied last.
    ///
    /// ```
    /// use trawl_config::TrawlConfigLoader;
    ///
    /// let config = TrawlConfigLoader::new()
    ///     .with_yaml_str("search:\n  location: 'Virginia'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.search.location, "Virginia");
    /// assert_eq!(config.site.partner_domain, "ziprecruiter");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Use a different environment prefix (mostly for tests).
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Layer every file from [`config_search_paths`] that exists.
    pub fn with_discovered_files(self) -> Self {
        config_search_paths()
            .into_iter()
            .fold(self, |loader, path| loader.with_optional_file(path))
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use trawl_common::Target;
    /// use trawl_config::TrawlConfigLoader;
    ///
    /// let cfg = TrawlConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// site:
    ///   company: { by: css, value: "span.employer" }
    /// pagination:
    ///   max_pages: 0
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.site.company, Target::css("span.employer"));
    /// assert_eq!(cfg.pagination.limit(), None);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly
    /// typed config, expanding `${VAR}` placeholders first.
    pub fn load(self) -> Result<TrawlConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: TrawlConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
