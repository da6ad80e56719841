use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_TARGET_URL: &str = "https://www.tcgplayer.com/search/pokemon/crown-zenith?productLineName=pokemon&setName=crown-zenith&page=1&view=grid";

/// Everything the scraper, the stores and the console need to know.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub target_url: String,
    pub webdriver_url: String,
    pub max_pages: u32,
    pub ledger_path: PathBuf,
    pub collection_path: PathBuf,
    pub load_timeout_secs: u64,
    pub page_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub headless: bool,
    pub card_selector: String,
    pub name_selector: String,
    pub price_selector: String,
    pub next_selector: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            webdriver_url: "http://localhost:4444".to_string(),
            max_pages: 7,
            ledger_path: "scraped_values.csv".into(),
            collection_path: "card_collection.bin".into(),
            load_timeout_secs: 20,
            page_timeout_secs: 10,
            poll_interval_ms: 250,
            headless: false,
            card_selector: "div.product-card__product".to_string(),
            name_selector: "span.product-card__title.truncate".to_string(),
            price_selector: "span.product-card__market-price--value".to_string(),
            next_selector: "a[aria-label='Next page']".to_string(),
        }
    }
}

impl Settings {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Coalesce defaults, an optional settings file and `CARDWATCH_*` env vars.
pub fn get_settings(file: Option<&Path>) -> Result<Settings, ConfigError> {
    let defaults = Settings::default();
    let mut builder = Config::builder()
        .set_default("target_url", defaults.target_url)?
        .set_default("webdriver_url", defaults.webdriver_url)?
        .set_default("max_pages", i64::from(defaults.max_pages))?
        .set_default("ledger_path", path_default(&defaults.ledger_path))?
        .set_default("collection_path", path_default(&defaults.collection_path))?
        .set_default("load_timeout_secs", defaults.load_timeout_secs as i64)?
        .set_default("page_timeout_secs", defaults.page_timeout_secs as i64)?
        .set_default("poll_interval_ms", defaults.poll_interval_ms as i64)?
        .set_default("headless", defaults.headless)?
        .set_default("card_selector", defaults.card_selector)?
        .set_default("name_selector", defaults.name_selector)?
        .set_default("price_selector", defaults.price_selector)?
        .set_default("next_selector", defaults.next_selector)?;

    if let Some(path) = file {
        builder = builder.add_source(File::from(path));
    }

    let settings: Settings = builder
        .add_source(Environment::with_prefix("CARDWATCH").try_parsing(true))
        .build()?
        .try_deserialize()?;

    if settings.max_pages == 0 {
        return Err(ConfigError::Message(
            "max_pages must be at least 1".to_string(),
        ));
    }
    Ok(settings)
}

fn path_default(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_file() {
        let settings = get_settings(None).unwrap();
        assert_eq!(settings.max_pages, 7);
        assert_eq!(settings.ledger_path, PathBuf::from("scraped_values.csv"));
        assert_eq!(settings.page_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_pages = 3\nledger_path = \"prices.csv\"").unwrap();

        let settings = get_settings(Some(file.path())).unwrap();
        assert_eq!(settings.max_pages, 3);
        assert_eq!(settings.ledger_path, PathBuf::from("prices.csv"));
        assert_eq!(settings.next_selector, "a[aria-label='Next page']");
    }

    #[test]
    fn zero_pages_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_pages = 0").unwrap();

        assert!(get_settings(Some(file.path())).is_err());
    }
}
