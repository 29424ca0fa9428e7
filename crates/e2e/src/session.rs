//! Browser session driving the application UI over WebDriver

use std::time::{Duration, Instant};

use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{E2eError, E2eResult};

static CSS_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^rgba?\((\d+),\s*(\d+),\s*(\d+)").unwrap());

/// A live browser session against the application under test
///
/// Every lookup is a bounded wait: the element must appear (and, where
/// relevant, become visible) within the configured wait window or the step
/// fails with a timeout.
pub struct Session {
    client: Client,
    app_url: String,
    wait_timeout: Duration,
    poll_interval: Duration,
}

impl Session {
    /// Open a fresh WebDriver session
    pub async fn connect(config: &SessionConfig) -> E2eResult<Self> {
        let mut capabilities = serde_json::Map::new();
        if config.headless {
            capabilities.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless=new", "--disable-gpu", "--window-size=1280,720"] }),
            );
        }

        let mut builder = ClientBuilder::native();
        builder.capabilities(capabilities);
        let client = builder.connect(&config.webdriver_url).await?;

        debug!("WebDriver session open at {}", config.webdriver_url);

        Ok(Self {
            client,
            app_url: config.app_url.clone(),
            wait_timeout: config.wait_timeout,
            poll_interval: config.poll_interval,
        })
    }

    /// Navigate to the application root
    pub async fn goto_root(&self) -> E2eResult<()> {
        debug!("Navigating to {}", self.app_url);
        self.client.goto(&self.app_url).await?;
        Ok(())
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait for an element to appear, with a description for timeout context
    pub async fn wait_for_element(
        &self,
        locator: Locator<'_>,
        what: &str,
    ) -> E2eResult<Element> {
        let found = self
            .client
            .wait()
            .at_most(self.wait_timeout)
            .every(self.poll_interval)
            .for_element(locator)
            .await;

        match found {
            Ok(element) => Ok(element),
            Err(CmdError::WaitTimeout) => Err(E2eError::Timeout(what.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Wait for the container carrying the given `data-testid`
    pub async fn wait_for_test_id(&self, test_id: &str) -> E2eResult<Element> {
        let selector = format!("[data-testid='{test_id}']");
        self.wait_for_element(Locator::Css(&selector), test_id).await
    }

    /// All containers currently rendered with the given `data-testid`, in DOM order
    pub async fn all_by_test_id(&self, test_id: &str) -> E2eResult<Vec<Element>> {
        let selector = format!("[data-testid='{test_id}']");
        Ok(self.client.find_all(Locator::Css(&selector)).await?)
    }

    /// Fill the labeled text input inside the container with the given test id
    ///
    /// Matches the input nested under the element whose own text carries the
    /// field label, per the application's UI contract.
    pub async fn fill_labeled_input(
        &self,
        form_test_id: &str,
        label: &str,
        value: &str,
    ) -> E2eResult<()> {
        let xpath = format!(
            "//*[@data-testid='{form_test_id}']//div[text()[contains(., '{label}')]]//input"
        );
        let what = format!("{label} input in {form_test_id}");
        let input = self.wait_for_element(Locator::XPath(&xpath), &what).await?;
        input.clear().await?;
        input.send_keys(value).await?;
        debug!("Filled {what}");
        Ok(())
    }

    /// Fill an input addressed by a CSS selector
    pub async fn fill_by_css(&self, selector: &str, value: &str) -> E2eResult<()> {
        let input = self.wait_for_element(Locator::Css(selector), selector).await?;
        input.clear().await?;
        input.send_keys(value).await?;
        debug!("Filled {selector}");
        Ok(())
    }

    /// Click the button whose accessible name is exactly `name`
    pub async fn click_button(&self, name: &str) -> E2eResult<()> {
        let xpath = button_xpath(name);
        let what = format!("button '{name}'");
        let button = self.wait_for_element(Locator::XPath(&xpath), &what).await?;
        button.click().await?;
        debug!("Clicked {what}");
        Ok(())
    }

    /// Wait until an element rendering the given text is visible, and return it
    pub async fn wait_for_text(&self, text: &str) -> E2eResult<Element> {
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            if let Some(element) = self.displayed_text(text).await? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(E2eError::Timeout(format!("text '{text}'")));
            }
            sleep(self.poll_interval).await;
        }
    }

    /// One-shot probe: is an element with the given text currently visible?
    pub async fn text_visible(&self, text: &str) -> E2eResult<bool> {
        Ok(self.displayed_text(text).await?.is_some())
    }

    async fn displayed_text(&self, text: &str) -> E2eResult<Option<Element>> {
        let xpath = text_xpath(text);
        let candidates = self.client.find_all(Locator::XPath(&xpath)).await?;
        for candidate in candidates {
            // Elements can go stale between render passes; skip and re-probe.
            match candidate.is_displayed().await {
                Ok(true) => return Ok(Some(candidate)),
                Ok(false) => continue,
                Err(_) => continue,
            }
        }
        Ok(None)
    }

    /// Computed `color` of an element as an (r, g, b) triple
    pub async fn css_color(&self, element: &Element) -> E2eResult<(u8, u8, u8)> {
        let raw = element.css_value("color").await?;
        parse_css_color(&raw).ok_or_else(|| {
            E2eError::AssertionFailed(format!("unparseable CSS color '{raw}'"))
        })
    }

    /// Accept the currently open confirmation dialog
    pub async fn accept_dialog(&self) -> E2eResult<()> {
        self.client.accept_alert().await?;
        debug!("Accepted confirmation dialog");
        Ok(())
    }

    /// End the session and close the browser window
    pub async fn close(self) -> E2eResult<()> {
        self.client.close().await?;
        Ok(())
    }
}

/// XPath for a button by its rendered name
pub(crate) fn button_xpath(name: &str) -> String {
    format!("//button[normalize-space(.)='{name}']")
}

/// XPath for elements whose own text nodes contain `text`
pub(crate) fn text_xpath(text: &str) -> String {
    format!("//*[text()[contains(., '{text}')]]")
}

/// Parse a computed CSS color such as `rgb(255, 0, 0)` or `rgba(255, 0, 0, 1)`
pub fn parse_css_color(raw: &str) -> Option<(u8, u8, u8)> {
    let captures = CSS_COLOR_RE.captures(raw.trim())?;
    let channel = |i: usize| captures.get(i)?.as_str().parse::<u8>().ok();
    Some((channel(1)?, channel(2)?, channel(3)?))
}

/// Configuration for opening browser sessions
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebDriver endpoint (chromedriver / geckodriver)
    pub webdriver_url: String,

    /// Application root URL
    pub app_url: String,

    /// Run the browser headless
    pub headless: bool,

    /// Wait window for every interaction and assertion
    pub wait_timeout: Duration,

    /// Poll interval for bounded waits
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            app_url: "http://localhost:5173".to_string(),
            headless: true,
            wait_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl SessionConfig {
    /// Default configuration with `BLOG_E2E_*` environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("BLOG_E2E_WEBDRIVER_URL") {
            config.webdriver_url = url;
        }
        if let Ok(url) = std::env::var("BLOG_E2E_APP_URL") {
            config.app_url = url;
        }
        if let Ok(headless) = std::env::var("BLOG_E2E_HEADLESS") {
            config.headless = headless != "0";
        }
        if let Some(timeout) = std::env::var("BLOG_E2E_TIMEOUT_MS")
            .ok()
            .and_then(|raw| parse_millis(&raw))
        {
            config.wait_timeout = timeout;
        }
        config
    }
}

fn parse_millis(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_millis)
}
