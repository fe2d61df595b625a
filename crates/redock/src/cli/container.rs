//! `redock container ...`: the managed container entries in the state.

use anyhow::{anyhow, Context, Result};
use clap::Subcommand;
use redock_host::summarize_id;
use redock_state::StateStore;
use serde_json::Value;
use tracing::info;

use super::error::HelpfulError;
use super::output::{preview_value, print_table};

#[derive(Subcommand, Debug)]
pub enum ContainerAction {
    /// List managed containers
    List {
        /// Output as JSON (full ids)
        #[arg(long)]
        json: bool,
    },
    /// Record a container, replacing any previous entry
    Set {
        /// Container id
        id: String,
        /// Entry value as JSON
        value: String,
    },
    /// Forget a container
    Remove {
        /// Container id
        id: String,
    },
    /// Forget all containers
    Clear,
}

pub fn run(store: &StateStore, action: ContainerAction) -> Result<()> {
    match action {
        ContainerAction::List { json } => list(store, json),
        ContainerAction::Set { id, value } => set(store, id, &value),
        ContainerAction::Remove { id } => remove(store, &id),
        ContainerAction::Clear => clear(store),
    }
}

fn list(store: &StateStore, json: bool) -> Result<()> {
    let record = store
        .snapshot()
        .map_err(|e| HelpfulError::store_failed(&e))?;

    if json {
        let text = serde_json::to_string_pretty(&record.containers)
            .context("Failed to serialize containers")?;
        println!("{}", text);
        return Ok(());
    }

    if record.containers.is_empty() {
        println!("No containers recorded.");
        return Ok(());
    }
    let rows = record
        .containers
        .iter()
        .map(|(id, value)| vec![summarize_id(id).to_string(), preview_value(value)])
        .collect();
    print_table(&["CONTAINER", "ENTRY"], rows);
    Ok(())
}

fn set(store: &StateStore, id: String, raw: &str) -> Result<()> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| HelpfulError::invalid_json(raw, &e.to_string()))?;

    let replaced = store
        .with_transaction(|record| Ok::<_, anyhow::Error>(record.containers.insert(id.clone(), value)))
        .map_err(HelpfulError::transaction_failed)?;

    info!(
        container = summarize_id(&id),
        replaced = replaced.is_some(),
        "Recorded container"
    );
    Ok(())
}

fn remove(store: &StateStore, id: &str) -> Result<()> {
    store
        .with_transaction(|record| {
            record
                .containers
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| anyhow!("No such container: {}", id))
        })
        .map_err(HelpfulError::transaction_failed)?;

    info!(container = summarize_id(id), "Forgot container");
    Ok(())
}

fn clear(store: &StateStore) -> Result<()> {
    let removed = store
        .with_transaction(|record| {
            let removed = record.containers.len();
            record.containers.clear();
            Ok::<_, anyhow::Error>(removed)
        })
        .map_err(HelpfulError::transaction_failed)?;

    println!("Forgot {} container{}.", removed, if removed == 1 { "" } else { "s" });
    Ok(())
}
