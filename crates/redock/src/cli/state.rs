//! `redock state ...`

use anyhow::{Context, Result};
use clap::Subcommand;
use redock_state::{encode, StateStore};

use super::error::HelpfulError;

#[derive(Subcommand, Debug)]
pub enum StateAction {
    /// Show the runtime state record
    Show {
        /// Print the record exactly as it would be stored
        #[arg(long)]
        json: bool,
    },
    /// Print the location of the state file
    Path,
}

pub fn run(store: &StateStore, action: StateAction) -> Result<()> {
    match action {
        StateAction::Show { json } => show(store, json),
        StateAction::Path => {
            println!("{}", store.path().display());
            Ok(())
        }
    }
}

fn show(store: &StateStore, json: bool) -> Result<()> {
    let record = store
        .snapshot()
        .map_err(|e| HelpfulError::store_failed(&e))?;

    if json {
        let text = String::from_utf8(encode(&record)).context("State is not valid UTF-8")?;
        print!("{}", text);
        return Ok(());
    }

    println!("State file:     {}", store.path().display());
    println!("Schema version: {}", record.schema_version());
    println!("Containers:     {}", record.containers.len());
    let fields: Vec<&str> = record.field_names().collect();
    if !fields.is_empty() {
        println!("Other fields:   {}", fields.join(", "));
    }
    Ok(())
}
