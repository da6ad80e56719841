//! cardwatch: scrape card prices into an append-only ledger and track a
//! personal collection against the latest recorded prices.

pub mod app;
pub mod browser;
pub mod collection;
pub mod config;
pub mod error;
pub mod ledger;
pub mod manager;
pub mod scrape;

pub use browser::{Browser, WebDriverBrowser};
pub use collection::{Collection, CollectionStore};
pub use crate::config::{Settings, get_settings};
pub use error::{Error, Result};
pub use ledger::{CurrentPrices, PriceChange, PriceHistory, PriceLedger, PriceObservation};
pub use manager::{AddOutcome, CollectionManager, LineSource};
pub use scrape::{CardSelectors, ScrapeReport, Scraper, StopReason};
