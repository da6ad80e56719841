//! Walks the search results pages and records every price change.

use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::browser::Browser;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::ledger::{PriceChange, PriceLedger, PriceObservation};

/// Why paging ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    PageLimit,
    LastPage,
    NoListings,
    NavigationFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeReport {
    pub pages_visited: u32,
    pub changes: Vec<PriceChange>,
    pub stop: StopReason,
}

enum Advance {
    Next,
    LastPage,
}

/// Name and price selectors, applied inside a single product card.
pub struct CardSelectors {
    name: Selector,
    price: Selector,
}

impl CardSelectors {
    pub fn new(name: &str, price: &str) -> Result<Self> {
        Ok(Self {
            name: parse_selector(name)?,
            price: parse_selector(price)?,
        })
    }

    /// Pull the listing out of one card's HTML. Cards missing either part yield `None`.
    pub fn extract(&self, card_html: &str) -> Option<PriceObservation> {
        let card = Html::parse_fragment(card_html);
        let name = text_of(&card, &self.name);
        let price = text_of(&card, &self.price);
        if name.is_empty() || price.is_empty() {
            return None;
        }
        Some(PriceObservation { name, price })
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn text_of(html: &Html, selector: &Selector) -> String {
    match html.select(selector).next() {
        Some(element) => element
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
        None => String::new(),
    }
}

pub struct Scraper {
    target_url: String,
    max_pages: u32,
    card_selector: String,
    next_selector: String,
    selectors: CardSelectors,
    load_timeout: Duration,
    page_timeout: Duration,
    poll_interval: Duration,
}

impl Scraper {
    pub fn new(settings: &Settings) -> Result<Self> {
        // The browser evaluates these two; catch typos before a session opens.
        parse_selector(&settings.card_selector)?;
        parse_selector(&settings.next_selector)?;

        Ok(Self {
            target_url: settings.target_url.clone(),
            max_pages: settings.max_pages,
            card_selector: settings.card_selector.clone(),
            next_selector: settings.next_selector.clone(),
            selectors: CardSelectors::new(&settings.name_selector, &settings.price_selector)?,
            load_timeout: settings.load_timeout(),
            page_timeout: settings.page_timeout(),
            poll_interval: settings.poll_interval(),
        })
    }

    /// Scrape up to `max_pages` pages into `ledger`, then close the browser
    /// however paging ended.
    pub async fn run<B: Browser>(&self, mut browser: B, ledger: &PriceLedger) -> Result<ScrapeReport> {
        let outcome = self.scrape_pages(&mut browser, ledger).await;
        if let Err(e) = browser.quit().await {
            warn!(error = %e, "failed to close the browser session");
        }

        let report = outcome?;
        if report.changes.is_empty() {
            info!("no prices have changed for now");
        }
        info!(
            pages = report.pages_visited,
            changes = report.changes.len(),
            stop = ?report.stop,
            "scrape finished"
        );
        Ok(report)
    }

    async fn scrape_pages<B: Browser>(
        &self,
        browser: &mut B,
        ledger: &PriceLedger,
    ) -> Result<ScrapeReport> {
        info!(url = %self.target_url, "opening results page");
        browser.goto(&self.target_url).await?;
        browser
            .wait_for(&self.card_selector, self.load_timeout, self.poll_interval)
            .await?;

        let mut prices = ledger.history()?.current();
        let mut changes = Vec::new();
        let mut page: u32 = 0;

        let stop = loop {
            page += 1;

            let cards = match browser.outer_html_all(&self.card_selector).await {
                Ok(cards) => cards,
                Err(e) => {
                    warn!(page, error = %e, "failed to read product cards");
                    break StopReason::NavigationFailed;
                }
            };
            let listings: Vec<PriceObservation> = cards
                .iter()
                .filter_map(|card| self.selectors.extract(card))
                .collect();
            if listings.is_empty() {
                warn!(page, "no products found on the page");
                break StopReason::NoListings;
            }
            debug!(page, cards = cards.len(), listings = listings.len(), "read results page");

            for listing in &listings {
                if let Some(change) = prices.observe(listing) {
                    ledger.append(listing)?;
                    log_change(&change);
                    changes.push(change);
                }
            }

            if page >= self.max_pages {
                info!(page, "reached the page limit");
                break StopReason::PageLimit;
            }

            match self.advance(browser, &cards[0]).await {
                Ok(Advance::Next) => {}
                Ok(Advance::LastPage) => {
                    info!(page, "reached the last page");
                    break StopReason::LastPage;
                }
                Err(e) => {
                    info!(page, error = %e, "no 'next' button found or reached the last page");
                    break StopReason::NavigationFailed;
                }
            }
        };

        Ok(ScrapeReport {
            pages_visited: page,
            changes,
            stop,
        })
    }

    async fn advance<B: Browser>(&self, browser: &mut B, first_card: &str) -> Result<Advance> {
        browser
            .wait_for(&self.next_selector, self.page_timeout, self.poll_interval)
            .await?;

        let disabled = browser
            .attribute(&self.next_selector, "aria-disabled")
            .await?;
        if disabled.as_deref() == Some("true") {
            return Ok(Advance::LastPage);
        }

        browser.click(&self.next_selector).await?;
        browser
            .wait_for_change(
                &self.card_selector,
                first_card,
                self.page_timeout,
                self.poll_interval,
            )
            .await?;
        Ok(Advance::Next)
    }
}

fn log_change(change: &PriceChange) {
    match change {
        PriceChange::NewItem(observation) => {
            info!(name = %observation.name, price = %observation.price, "new card detected");
        }
        PriceChange::Changed {
            observation,
            previous,
        } => {
            info!(
                name = %observation.name,
                from = %previous,
                to = %observation.price,
                "price change detected"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"<div class="product-card__product">
        <span class="product-card__title truncate">  Pikachu   V </span>
        <div><span class="product-card__market-price--value">$5.00</span></div>
    </div>"#;

    fn selectors() -> CardSelectors {
        let settings = Settings::default();
        CardSelectors::new(&settings.name_selector, &settings.price_selector).unwrap()
    }

    #[test]
    fn extracts_name_and_price_from_card() {
        assert_eq!(
            selectors().extract(CARD),
            Some(PriceObservation::new("Pikachu V", "$5.00"))
        );
    }

    #[test]
    fn split_text_nodes_are_joined_as_rendered() {
        let card = r#"<div class="product-card__product">
            <span class="product-card__title truncate">Galarian <b>Moltres</b> V</span>
            <span class="product-card__market-price--value">$<!-- -->5.00</span>
        </div>"#;
        assert_eq!(
            selectors().extract(card),
            Some(PriceObservation::new("Galarian Moltres V", "$5.00"))
        );
    }

    #[test]
    fn card_without_price_is_skipped() {
        let card = r#"<div class="product-card__product">
            <span class="product-card__title truncate">Zacian V</span>
        </div>"#;
        assert_eq!(selectors().extract(card), None);
    }

    #[test]
    fn bad_selector_is_reported() {
        let err = CardSelectors::new("span..broken", "span").err().unwrap();
        assert!(matches!(err, Error::Selector { .. }));
    }

    #[test]
    fn scraper_rejects_bad_next_selector() {
        let settings = Settings {
            next_selector: "a[aria-label=".to_string(),
            ..Settings::default()
        };
        assert!(Scraper::new(&settings).is_err());
    }
}
