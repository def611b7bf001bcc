use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use safehold_core::{DataField, DataItem, DataStore, DataValue, save_data_store};

use crate::output::{create_table, display_bytes, join_values};
use crate::vault::{Vault, VaultError};

#[derive(Subcommand, Clone)]
pub enum Command {
    /// Add an item to the vault and write it to every site
    Add {
        /// Item name, unique within the vault
        name: String,

        /// Label to tag the item with (repeatable)
        #[arg(long = "label", value_name = "LABEL")]
        labels: Vec<String>,

        /// Location the item applies to, e.g. a URL (repeatable)
        #[arg(long = "location", value_name = "LOCATION")]
        locations: Vec<String>,

        /// Field as NAME=VALUE (repeatable)
        #[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// List the items in the vault
    List,

    /// Show one item's fields
    Show { name: String },
}

pub async fn execute(vault: &Vault, command: Command) -> Result<()> {
    match command {
        Command::Add {
            name,
            labels,
            locations,
            fields,
        } => add(vault, name, &labels, &locations, &fields).await,
        Command::List => {
            let store = vault.load_for_read().await?;
            list(&store);
            Ok(())
        }
        Command::Show { name } => {
            let store = vault.load_for_read().await?;
            let item = find(&store, &name).ok_or(VaultError::ItemNotFound(name))?;
            show(item);
            Ok(())
        }
    }
}

async fn add(
    vault: &Vault,
    name: String,
    labels: &[String],
    locations: &[String],
    fields: &[(String, String)],
) -> Result<()> {
    let mut store = vault.load_for_update().await?;
    if find(&store, &name).is_some() {
        return Err(VaultError::ItemExists(name).into());
    }

    let mut item = DataItem::new(name.as_bytes());
    for label in labels {
        item.labels_mut().add(DataValue::new(label.as_bytes()));
    }
    for location in locations {
        item.locations_mut().add(DataValue::new(location.as_bytes()));
    }
    for (field_name, value) in fields {
        item.fields_mut()
            .add(DataField::new(field_name.as_bytes(), value.as_bytes()));
    }
    store.items_mut().add(item);

    let result = save_data_store(&vault.manager, &store, &vault.ctx).await?;
    let total = result.outcomes.len();
    let failed = result.failed().count();
    if failed == total {
        return Err(VaultError::SitesFailed { failed, total }.into());
    }
    info!(item = %name, sites = total - failed, "Saved item");
    println!("Added item '{name}'");
    if failed > 0 {
        return Err(VaultError::SitesFailed { failed, total }.into());
    }
    Ok(())
}

fn find<'a>(store: &'a DataStore, name: &str) -> Option<&'a DataItem> {
    store.items().iter().find(|item| item.name() == name.as_bytes())
}

fn list(store: &DataStore) {
    if store.items().is_empty() {
        println!("Vault '{}' has no items", display_bytes(store.name()));
        return;
    }

    let mut table = create_table();
    table.set_header(vec!["Name", "Fields", "Labels", "Locations"]);
    for item in store.items() {
        table.add_row(vec![
            display_bytes(item.name()),
            join_values(item.fields().iter().map(DataField::name)),
            join_values(item.labels().iter().map(DataValue::value)),
            join_values(item.locations().iter().map(DataValue::value)),
        ]);
    }
    println!("{table}");
}

fn show(item: &DataItem) {
    println!("{}", display_bytes(item.name()));
    if !item.labels().is_empty() {
        println!("Labels: {}", join_values(item.labels().iter().map(DataValue::value)));
    }
    if !item.locations().is_empty() {
        println!("Locations: {}", join_values(item.locations().iter().map(DataValue::value)));
    }

    let mut table = create_table();
    table.set_header(vec!["Field", "Value"]);
    for field in item.fields() {
        table.add_row(vec![display_bytes(field.name()), display_bytes(field.value())]);
    }
    println!("{table}");
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err("field name cannot be empty".to_string());
    }
    Ok((name.to_string(), value.to_string()))
}
