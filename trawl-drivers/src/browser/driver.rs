use crate::browser::{
    behavioral::BehavioralEngine,
    session::{BrowserSession, ClickWait, DriverError},
};
use async_trait::async_trait;
use fantoccini::{elements::Element, error::CmdError, Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;
use trawl_common::{By, Target};
use trawl_config::BrowserConfig;
use url::Url;
use webdriver::capabilities::Capabilities;

const CLICKABLE_POLL: Duration = Duration::from_millis(250);
/// WebDriver code point for the Return key.
const RETURN_KEY: &str = "\u{E007}";
const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Thin wrapper around a `fantoccini` WebDriver client.
pub struct TrawlDriver {
    client: Client,
    behavioral_engine: BehavioralEngine,
    human_typing: bool,
    closed: bool,
}

impl TrawlDriver {
    /// Create a new driver connected to a running WebDriver service
    /// (chromedriver at `http://localhost:9515` unless configured otherwise).
    pub async fn connect(config: &BrowserConfig) -> Result<Self, DriverError> {
        let mut caps = Capabilities::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": chrome_arguments(config.headless) }),
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| DriverError::Connect {
                url: config.webdriver_url.clone(),
                reason: e.to_string(),
            })?;

        debug!(
            target: "trawl.driver",
            url = %config.webdriver_url,
            headless = config.headless,
            "webdriver session started"
        );

        Ok(Self {
            client,
            behavioral_engine: BehavioralEngine::new(),
            human_typing: config.human_typing,
            closed: false,
        })
    }

    fn live(&self) -> Result<&Client, DriverError> {
        if self.closed {
            Err(DriverError::Closed)
        } else {
            Ok(&self.client)
        }
    }

    async fn find_now(&self, target: &Target) -> Result<Element, DriverError> {
        let query = Query::from_target(target);
        self.live()?
            .find(query.locator())
            .await
            .map_err(|e| classify(e, target, None))
    }

    async fn wait_present(&self, target: &Target, timeout: Duration) -> Result<Element, DriverError> {
        let query = Query::from_target(target);
        self.live()?
            .wait()
            .at_most(timeout)
            .for_element(query.locator())
            .await
            .map_err(|e| classify(e, target, Some(timeout)))
    }

    async fn wait_clickable(&self, target: &Target, timeout: Duration) -> Result<Element, DriverError> {
        let client = self.live()?;
        let query = Query::from_target(target);
        let deadline = Instant::now() + timeout;
        loop {
            match client.find(query.locator()).await {
                Ok(el) => {
                    let shown = el.is_displayed().await.unwrap_or(false);
                    let enabled = el.is_enabled().await.unwrap_or(false);
                    if shown && enabled {
                        return Ok(el);
                    }
                }
                Err(e) if e.is_no_such_element() => {}
                Err(e) => return Err(classify(e, target, None)),
            }
            if Instant::now() >= deadline {
                return Err(DriverError::timeout(target, timeout));
            }
            sleep(CLICKABLE_POLL).await;
        }
    }
}

#[async_trait]
impl BrowserSession for TrawlDriver {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        debug!(target: "trawl.driver", %url, "navigating");
        self.live()?
            .goto(url)
            .await
            .map_err(|e| DriverError::WebDriver(e.to_string()))
    }

    async fn current_url(&mut self) -> Result<Url, DriverError> {
        self.live()?
            .current_url()
            .await
            .map_err(|e| DriverError::WebDriver(e.to_string()))
    }

    async fn fill(
        &mut self,
        target: &Target,
        text: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let el = self.wait_present(target, timeout).await?;
        el.clear().await.map_err(|e| classify(e, target, None))?;
        let typed = if self.human_typing {
            self.behavioral_engine.type_text_human_like(&el, text).await
        } else {
            el.send_keys(text).await
        };
        typed.map_err(|e| classify(e, target, None))
    }

    async fn click(&mut self, target: &Target, wait: ClickWait) -> Result<(), DriverError> {
        let el = match wait {
            ClickWait::Immediate => self.find_now(target).await?,
            ClickWait::Clickable(timeout) => self.wait_clickable(target, timeout).await?,
        };
        el.click().await.map_err(|e| classify(e, target, None))
    }

    async fn press_enter(&mut self, target: &Target) -> Result<(), DriverError> {
        let el = self.find_now(target).await?;
        el.send_keys(RETURN_KEY)
            .await
            .map_err(|e| classify(e, target, None))
    }

    async fn first_text(&mut self, target: &Target) -> Result<String, DriverError> {
        let el = self.find_now(target).await?;
        el.text().await.map_err(|e| classify(e, target, None))
    }

    async fn all_texts(&mut self, target: &Target) -> Result<Vec<String>, DriverError> {
        let query = Query::from_target(target);
        let elements = self
            .live()?
            .find_all(query.locator())
            .await
            .map_err(|e| classify(e, target, None))?;

        let mut texts = Vec::with_capacity(elements.len());
        for el in elements {
            texts.push(el.text().await.map_err(|e| classify(e, target, None))?);
        }
        Ok(texts)
    }

    async fn all_attributes(
        &mut self,
        target: &Target,
        attribute: &str,
        timeout: Duration,
    ) -> Result<Vec<Option<String>>, DriverError> {
        self.wait_present(target, timeout).await?;

        let query = Query::from_target(target);
        let elements = self
            .live()?
            .find_all(query.locator())
            .await
            .map_err(|e| classify(e, target, None))?;

        let mut values = Vec::with_capacity(elements.len());
        for el in elements {
            values.push(
                el.attr(attribute)
                    .await
                    .map_err(|e| classify(e, target, None))?,
            );
        }
        Ok(values)
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        self.live()?
            .execute(SCROLL_TO_BOTTOM, vec![])
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    /// Close the underlying browser session.
    async fn close(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::Closed);
        }
        self.closed = true;
        self.client
            .clone()
            .close()
            .await
            .map_err(|e| DriverError::WebDriver(e.to_string()))?;
        debug!(target: "trawl.driver", "webdriver session closed");
        Ok(())
    }
}

/// Chrome command-line arguments for a scrape session.
pub fn chrome_arguments(headless: bool) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-extensions".to_string(),
        "--window-size=1920,1080".to_string(),
    ];
    if headless {
        args.push("--headless".to_string());
        args.push("--disable-gpu".to_string());
    }
    args
}

/// Owned form of a [`Target`] that fantoccini can borrow a [`Locator`] from.
/// Name and class lookups are expressed as CSS.
#[derive(Debug, PartialEq, Eq)]
enum Query {
    Css(String),
    XPath(String),
    Id(String),
    LinkText(String),
}

impl Query {
    fn from_target(target: &Target) -> Self {
        let v = &target.value;
        match target.by {
            By::Css => Self::Css(v.clone()),
            By::XPath => Self::XPath(v.clone()),
            By::Id => Self::Id(v.clone()),
            By::LinkText => Self::LinkText(v.clone()),
            By::Name => Self::Css(format!("[name=\"{v}\"]")),
            By::ClassName => Self::Css(format!(".{v}")),
        }
    }

    fn locator(&self) -> Locator<'_> {
        match self {
            Self::Css(s) => Locator::Css(s),
            Self::XPath(s) => Locator::XPath(s),
            Self::Id(s) => Locator::Id(s),
            Self::LinkText(s) => Locator::LinkText(s),
        }
    }
}

fn classify(err: CmdError, target: &Target, waited: Option<Duration>) -> DriverError {
    if let CmdError::WaitTimeout = err {
        return DriverError::timeout(target, waited.unwrap_or_default());
    }
    if err.is_no_such_element() {
        return DriverError::not_found(target);
    }
    DriverError::WebDriver(err.to_string())
}
