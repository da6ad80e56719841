//! Error type shared by the stores, the scraper and the interactive loop.

use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Collection codec error: {0}")]
    Codec(#[from] bitcode::Error),

    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Console error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("Timed out after {0:?} waiting for '{1}'")]
    Timeout(Duration, String),
}

pub type Result<T> = std::result::Result<T, Error>;
