//! The slice of browser automation the scraper relies on.
//!
//! Everything is addressed by CSS selector so the scraper never holds on to
//! live element handles between page loads.

use std::time::Duration;

use thirtyfour::ChromiumLikeCapabilities;
use thirtyfour::prelude::*;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::config::Settings;
use crate::error::{Error, Result};

#[allow(async_fn_in_trait)]
pub trait Browser {
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Outer HTML of every element matching `selector`, in document order.
    async fn outer_html_all(&mut self, selector: &str) -> Result<Vec<String>>;

    /// Attribute `name` of the first element matching `selector`.
    async fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>>;

    /// Scroll the first match into view and click it from script, so overlays
    /// sitting on top of it cannot swallow the click.
    async fn click(&mut self, selector: &str) -> Result<()>;

    async fn quit(self) -> Result<()>
    where
        Self: Sized;

    /// Wait until at least one element matches `selector`.
    async fn wait_for(&mut self, selector: &str, timeout: Duration, poll: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.outer_html_all(selector).await?.is_empty() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(timeout, selector.to_string()));
            }
            sleep(poll).await;
        }
    }

    /// Wait until the first element matching `selector` is no longer `previous`.
    async fn wait_for_change(
        &mut self,
        selector: &str,
        previous: &str,
        timeout: Duration,
        poll: Duration,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.outer_html_all(selector).await {
                Ok(found) if found.first().is_some_and(|first| first != previous) => {
                    return Ok(());
                }
                Ok(_) => {}
                // Elements go stale while the next page renders.
                Err(e) => debug!(selector, error = %e, "page still changing"),
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(timeout, selector.to_string()));
            }
            sleep(poll).await;
        }
    }
}

/// [`Browser`] backed by a WebDriver session (chromedriver by default).
pub struct WebDriverBrowser {
    driver: WebDriver,
}

impl WebDriverBrowser {
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.set_headless()?;
        }
        let driver = WebDriver::new(&settings.webdriver_url, caps).await?;
        Ok(Self { driver })
    }
}

impl Browser for WebDriverBrowser {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn outer_html_all(&mut self, selector: &str) -> Result<Vec<String>> {
        let elements = self.driver.find_all(By::Css(selector)).await?;
        let mut html = Vec::with_capacity(elements.len());
        for element in elements {
            html.push(element.outer_html().await?);
        }
        Ok(html)
    }

    async fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>> {
        let element = self.driver.find(By::Css(selector)).await?;
        Ok(element.attr(name).await?)
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let element = self.driver.find(By::Css(selector)).await?;
        element.scroll_into_view().await?;
        self.driver
            .execute("arguments[0].click();", vec![element.to_json()?])
            .await?;
        Ok(())
    }

    async fn quit(self) -> Result<()> {
        self.driver.quit().await?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration, poll: Duration) -> Result<()> {
        self.driver
            .query(By::Css(selector))
            .wait(timeout, poll)
            .first()
            .await?;
        Ok(())
    }
}
