//! Interactive console for the card collection.

use std::io::Write;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::collection::{Collection, CollectionStore};
use crate::error::Result;
use crate::ledger::CurrentPrices;

pub const PRICE_NOT_AVAILABLE: &str = "N/A";

/// Where the console reads its input lines from.
pub trait LineSource {
    /// Show `prompt` and read one line. `None` means input is closed.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Display,
    Add,
    Exit,
    Invalid,
}

impl MenuChoice {
    fn parse(input: &str) -> Self {
        match input.trim() {
            "1" => MenuChoice::Display,
            "2" => MenuChoice::Add,
            "3" => MenuChoice::Exit,
            _ => MenuChoice::Invalid,
        }
    }
}

/// Result of a single add attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added { name: String, quantity: u32, total: u32 },
    UnknownItem(String),
    Cancelled,
}

pub struct CollectionManager {
    collection: Collection,
    prices: CurrentPrices,
    store: CollectionStore,
}

impl CollectionManager {
    pub fn new(collection: Collection, prices: CurrentPrices, store: CollectionStore) -> Self {
        Self {
            collection,
            prices,
            store,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Run the menu until the user exits or input runs out.
    pub fn run<I: LineSource, W: Write>(&mut self, input: &mut I, out: &mut W) -> Result<()> {
        loop {
            writeln!(out, "\nOptions:")?;
            writeln!(out, "1. Display your card collection")?;
            writeln!(out, "2. Add a new card to your collection")?;
            writeln!(out, "3. Exit")?;
            out.flush()?;

            let Some(line) = input.read_line("Choose an option (1/2/3): ")? else {
                debug!("input closed at menu");
                writeln!(out, "Goodbye!")?;
                return Ok(());
            };

            match MenuChoice::parse(&line) {
                MenuChoice::Display => self.display(out)?,
                MenuChoice::Add => {
                    if self.add(input, out)? == AddOutcome::Cancelled {
                        writeln!(out, "Goodbye!")?;
                        return Ok(());
                    }
                }
                MenuChoice::Exit => {
                    writeln!(out, "Goodbye!")?;
                    return Ok(());
                }
                MenuChoice::Invalid => {
                    writeln!(out, "Invalid choice. Please select 1, 2, or 3.")?;
                }
            }
        }
    }

    /// Print every owned card with its latest recorded price.
    pub fn display<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "\nYour Card Collection with Current Prices:")?;
        if self.collection.is_empty() {
            writeln!(out, "(no cards yet)")?;
        }
        for (name, quantity) in self.collection.iter() {
            let price = self.prices.get(name).unwrap_or(PRICE_NOT_AVAILABLE);
            writeln!(out, "{name}: Quantity: {quantity}, Price: {price}")?;
        }
        Ok(())
    }

    /// Prompt for a card and a quantity, then persist the collection.
    pub fn add<I: LineSource, W: Write>(&mut self, input: &mut I, out: &mut W) -> Result<AddOutcome> {
        let Some(name) = input.read_line("Enter the name of the card to add: ")? else {
            return Ok(AddOutcome::Cancelled);
        };
        let name = name.trim().to_string();

        if !self.prices.contains(&name) {
            writeln!(
                out,
                "Card not found in the live prices. Please check the name and try again."
            )?;
            return Ok(AddOutcome::UnknownItem(name));
        }

        let prompt = format!("How many of '{name}' do you own? ");
        let quantity = loop {
            let Some(answer) = input.read_line(&prompt)? else {
                return Ok(AddOutcome::Cancelled);
            };
            match parse_quantity(&answer) {
                Some(quantity) => break quantity,
                None => writeln!(out, "Please enter a whole number greater than zero.")?,
            }
        };

        let total = self.collection.add(&name, quantity);
        self.store.save(&self.collection)?;
        writeln!(out, "Added {quantity} of '{name}' to your collection.")?;

        Ok(AddOutcome::Added {
            name,
            quantity,
            total,
        })
    }
}

fn parse_quantity(answer: &str) -> Option<u32> {
    answer.trim().parse::<u32>().ok().filter(|quantity| *quantity > 0)
}
