//! Append-only price ledger.
//!
//! The file on disk is a log of price observations, one CSV row each, under a
//! `NAMES,PRICES` header. A name appears again every time its price moves, so
//! the current price of a name is whatever its last row says.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

pub const HEADER: [&str; 2] = ["NAMES", "PRICES"];

/// One (name, price) pair as it was read off a results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceObservation {
    pub name: String,
    pub price: String,
}

impl PriceObservation {
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
        }
    }
}

/// What an observation means against the prices already recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceChange {
    NewItem(PriceObservation),
    Changed {
        observation: PriceObservation,
        previous: String,
    },
}

/// Every observation in the ledger, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceHistory {
    events: Vec<PriceObservation>,
}

impl PriceHistory {
    pub fn events(&self) -> &[PriceObservation] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Fold the log into a name -> latest price view.
    pub fn current(&self) -> CurrentPrices {
        let mut prices = CurrentPrices::default();
        for event in &self.events {
            prices
                .prices
                .insert(event.name.clone(), event.price.clone());
        }
        prices
    }
}

/// Latest recorded price per name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentPrices {
    prices: HashMap<String, String>,
}

impl CurrentPrices {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.prices.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.prices.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Classify `observation` and fold it into the view.
    ///
    /// Returns `None` when the recorded price already matches.
    pub fn observe(&mut self, observation: &PriceObservation) -> Option<PriceChange> {
        let previous = self
            .prices
            .insert(observation.name.clone(), observation.price.clone());
        match previous {
            None => Some(PriceChange::NewItem(observation.clone())),
            Some(previous) if previous != observation.price => Some(PriceChange::Changed {
                observation: observation.clone(),
                previous,
            }),
            Some(_) => None,
        }
    }
}

impl<N: Into<String>, P: Into<String>> FromIterator<(N, P)> for CurrentPrices {
    fn from_iter<I: IntoIterator<Item = (N, P)>>(iter: I) -> Self {
        Self {
            prices: iter
                .into_iter()
                .map(|(name, price)| (name.into(), price.into()))
                .collect(),
        }
    }
}

pub struct PriceLedger {
    path: PathBuf,
}

impl PriceLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the whole log. A missing file is an empty log.
    pub fn history(&self) -> Result<PriceHistory> {
        if !self.exists() {
            return Ok(PriceHistory::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let mut events = Vec::new();
        for record in reader.byte_records() {
            let record = record?;
            let fields = match (record.len(), record.get(0), record.get(1)) {
                (2, Some(name), Some(price)) => {
                    (std::str::from_utf8(name), std::str::from_utf8(price))
                }
                _ => {
                    debug!(row = ?record, "skipping malformed ledger row");
                    continue;
                }
            };
            match fields {
                (Ok(name), Ok(price)) => events.push(PriceObservation::new(name, price)),
                _ => debug!(row = ?record, "skipping ledger row that is not UTF-8"),
            }
        }
        Ok(PriceHistory { events })
    }

    /// Current price per name, later rows winning.
    pub fn load(&self) -> Result<CurrentPrices> {
        if !self.exists() {
            warn!(
                path = %self.path.display(),
                "price ledger not found; make sure the scraper has run successfully"
            );
            return Ok(CurrentPrices::default());
        }
        Ok(self.history()?.current())
    }

    /// Append one row, writing the header first if the file is new.
    pub fn append(&self, observation: &PriceObservation) -> Result<()> {
        let fresh = !self.exists();
        if fresh {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if fresh {
            writer.write_record(HEADER)?;
        }
        writer.write_record([observation.name.as_str(), observation.price.as_str()])?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_in(dir: &tempfile::TempDir) -> PriceLedger {
        PriceLedger::new(dir.path().join("scraped_values.csv"))
    }

    #[test]
    fn first_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir);

        ledger
            .append(&PriceObservation::new("Pikachu V", "$5.00"))
            .unwrap();
        let contents = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(contents, "NAMES,PRICES\nPikachu V,$5.00\n");

        ledger
            .append(&PriceObservation::new("Pikachu V", "$6.00"))
            .unwrap();
        let contents = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(contents, "NAMES,PRICES\nPikachu V,$5.00\nPikachu V,$6.00\n");
    }

    #[test]
    fn last_row_wins() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir);
        std::fs::write(
            ledger.path(),
            "NAMES,PRICES\nPikachu V,$5.00\nZacian V,$1.10\nPikachu V,$4.50\nPikachu V,$7.25\n",
        )
        .unwrap();

        let prices = ledger.load().unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices.get("Pikachu V"), Some("$7.25"));
        assert_eq!(prices.get("Zacian V"), Some("$1.10"));

        let history = ledger.history().unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history.events()[0], PriceObservation::new("Pikachu V", "$5.00"));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir);

        assert!(ledger.load().unwrap().is_empty());
        assert!(ledger.history().unwrap().is_empty());
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir);
        std::fs::write(
            ledger.path(),
            "NAMES,PRICES\nlonely\nPikachu V,$5.00\na,b,c\n",
        )
        .unwrap();

        let prices = ledger.load().unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices.get("Pikachu V"), Some("$5.00"));
    }

    #[test]
    fn non_utf8_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir);
        std::fs::write(
            ledger.path(),
            b"NAMES,PRICES\nPikachu V,$5.00\nbad\xff,$1\nZacian V,$1.10\n",
        )
        .unwrap();

        let prices = ledger.load().unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices.get("Pikachu V"), Some("$5.00"));
        assert_eq!(prices.get("Zacian V"), Some("$1.10"));
        assert_eq!(ledger.history().unwrap().len(), 2);
    }

    #[test]
    fn names_with_commas_survive() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir);
        ledger
            .append(&PriceObservation::new("Mew, Full Art", "$12.34"))
            .unwrap();

        assert_eq!(ledger.load().unwrap().get("Mew, Full Art"), Some("$12.34"));
    }

    #[test]
    fn observe_classifies_changes() {
        let mut prices: CurrentPrices = [("Pikachu V", "$5.00")].into_iter().collect();

        assert_eq!(
            prices.observe(&PriceObservation::new("Pikachu V", "$5.00")),
            None
        );
        assert_eq!(
            prices.observe(&PriceObservation::new("Pikachu V", "$6.00")),
            Some(PriceChange::Changed {
                observation: PriceObservation::new("Pikachu V", "$6.00"),
                previous: "$5.00".to_string(),
            })
        );
        assert_eq!(
            prices.observe(&PriceObservation::new("Galarian Moltres V", "$3.25")),
            Some(PriceChange::NewItem(PriceObservation::new(
                "Galarian Moltres V",
                "$3.25"
            )))
        );
        assert_eq!(prices.get("Pikachu V"), Some("$6.00"));
    }
}
