#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use std::time::Duration;
use trawl_common::Target;
use trawl_common::observability::{init_logging, LogSettings};
use trawl_drivers::browser::session::{BrowserSession, ClickWait, DriverError};
use url::Url;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let settings = LogSettings {
            dir: Some(std::env::temp_dir().join("jobtrawl-tests")),
            filter: "debug".to_string(),
            ..LogSettings::default()
        };
        init_logging("jobtrawl-tests", &settings).unwrap_or_default()
    });
}

/// One element of a scripted page.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub text: String,
    pub attrs: HashMap<String, String>,
    /// Clicking the element navigates here.
    pub navigates_to: Option<String>,
}

impl FakeElement {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn link(href: &str) -> Self {
        let mut attrs = HashMap::new();
        attrs.insert("href".to_string(), href.to_string());
        Self {
            attrs,
            ..Self::default()
        }
    }

    pub fn navigating(url: &str) -> Self {
        Self {
            navigates_to: Some(url.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub elements: HashMap<Target, Vec<FakeElement>>,
}

impl FakePage {
    pub fn with(mut self, target: Target, elements: Vec<FakeElement>) -> Self {
        self.elements.insert(target, elements);
        self
    }
}

/// In-memory [`BrowserSession`] driven by a map of URL to page.
#[derive(Debug, Default)]
pub struct FakeSession {
    pub pages: HashMap<String, FakePage>,
    pub current: Option<String>,
    /// URLs whose navigation fails.
    pub broken: HashSet<String>,
    pub scroll_fails: bool,
    pub close_fails: bool,
    pub closed: bool,
    /// Every call, in order, for assertions.
    pub calls: Vec<String>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn at(mut self, url: &str) -> Self {
        self.current = Some(url.to_string());
        self
    }

    pub fn broken(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }

    pub fn visited(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| c.strip_prefix("goto "))
            .collect()
    }

    fn live(&self) -> Result<(), DriverError> {
        if self.closed {
            Err(DriverError::Closed)
        } else {
            Ok(())
        }
    }

    fn matches(&self, target: &Target) -> Vec<FakeElement> {
        self.current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .and_then(|page| page.elements.get(target))
            .cloned()
            .unwrap_or_default()
    }

    fn first(&self, target: &Target) -> Result<FakeElement, DriverError> {
        self.matches(target)
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::not_found(target))
    }

    fn present(&self, target: &Target, timeout: Duration) -> Result<FakeElement, DriverError> {
        self.first(target)
            .map_err(|_| DriverError::timeout(target, timeout))
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.live()?;
        self.calls.push(format!("goto {url}"));
        if self.broken.contains(url) {
            return Err(DriverError::WebDriver(format!("net::ERR_CONNECTION_RESET at {url}")));
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn current_url(&mut self) -> Result<Url, DriverError> {
        self.live()?;
        let current = self.current.clone().unwrap_or_else(|| "about:blank".into());
        Url::parse(&current).map_err(|e| DriverError::WebDriver(e.to_string()))
    }

    async fn fill(
        &mut self,
        target: &Target,
        text: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        self.live()?;
        self.present(target, timeout)?;
        self.calls.push(format!("fill {} {text}", target.value));
        Ok(())
    }

    async fn click(&mut self, target: &Target, wait: ClickWait) -> Result<(), DriverError> {
        self.live()?;
        let el = match wait {
            ClickWait::Immediate => self.first(target)?,
            ClickWait::Clickable(timeout) => self.present(target, timeout)?,
        };
        self.calls.push(format!("click {}", target.value));
        if let Some(next) = el.navigates_to {
            self.current = Some(next);
        }
        Ok(())
    }

    async fn press_enter(&mut self, target: &Target) -> Result<(), DriverError> {
        self.live()?;
        self.first(target)?;
        self.calls.push(format!("enter {}", target.value));
        Ok(())
    }

    async fn first_text(&mut self, target: &Target) -> Result<String, DriverError> {
        self.live()?;
        self.first(target).map(|el| el.text)
    }

    async fn all_texts(&mut self, target: &Target) -> Result<Vec<String>, DriverError> {
        self.live()?;
        Ok(self.matches(target).into_iter().map(|el| el.text).collect())
    }

    async fn all_attributes(
        &mut self,
        target: &Target,
        attribute: &str,
        timeout: Duration,
    ) -> Result<Vec<Option<String>>, DriverError> {
        self.live()?;
        let found = self.matches(target);
        if found.is_empty() {
            return Err(DriverError::timeout(target, timeout));
        }
        Ok(found
            .into_iter()
            .map(|el| el.attrs.get(attribute).cloned())
            .collect())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        self.live()?;
        self.calls.push("scroll".to_string());
        if self.scroll_fails {
            return Err(DriverError::Script("javascript error: document.body is null".into()));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.live()?;
        self.closed = true;
        self.calls.push("close".to_string());
        if self.close_fails {
            return Err(DriverError::WebDriver("session not created".into()));
        }
        Ok(())
    }
}
