use rustyline::DefaultEditor;
use tracing::{info, warn};

use crate::browser::WebDriverBrowser;
use crate::collection::CollectionStore;
use crate::config::Settings;
use crate::error::Result;
use crate::ledger::PriceLedger;
use crate::manager::CollectionManager;
use crate::scrape::{ScrapeReport, Scraper};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub skip_scrape: bool,
}

/// Connect to WebDriver and refresh the ledger from the results pages.
pub async fn refresh_prices(settings: &Settings, ledger: &PriceLedger) -> Result<ScrapeReport> {
    let scraper = Scraper::new(settings)?;
    info!(webdriver = %settings.webdriver_url, "connecting to WebDriver");
    let browser = WebDriverBrowser::connect(settings).await?;
    scraper.run(browser, ledger).await
}

/// Scrape once, then hand the terminal to the collection console.
pub async fn run(settings: &Settings, options: RunOptions) -> Result<()> {
    let ledger = PriceLedger::new(&settings.ledger_path);

    if options.skip_scrape {
        info!("skipping scrape; using recorded prices");
    } else if let Err(e) = refresh_prices(settings, &ledger).await {
        warn!(error = %e, "scrape aborted; using recorded prices");
    }

    let prices = ledger.load()?;
    let store = CollectionStore::new(&settings.collection_path);
    let collection = store.load()?;
    info!(
        prices = prices.len(),
        cards = collection.len(),
        "loaded ledger and collection"
    );

    let mut manager = CollectionManager::new(collection, prices, store);
    let mut editor = DefaultEditor::new()?;
    manager.run(&mut editor, &mut std::io::stdout())
}
