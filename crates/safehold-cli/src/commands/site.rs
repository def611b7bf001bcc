use anyhow::{Context, Result, bail};
use clap::Subcommand;

use safehold_core::StorageSite;
use safehold_core::storage::{BrowserSyncSite, FileSystemSite, RemoteApiSite};

use crate::output::create_table;
use crate::vault::{Vault, VaultError};

#[derive(Subcommand, Clone)]
pub enum Command {
    /// Keep a copy of the vault in a local file
    AddFs {
        /// Unique site name
        name: String,
        /// File to store the encrypted vault in
        path: String,
    },

    /// Keep a copy of the vault in browser-synchronized storage
    AddBrowser {
        name: String,
        /// Storage key the vault is kept under
        key: String,
    },

    /// Keep a copy of the vault with a remote API
    AddApi {
        name: String,
        /// Base URL of the API
        url: String,
        /// 16-byte record id as hex (random if omitted)
        #[arg(long)]
        record_id: Option<String>,
        /// Secret authenticating the record
        #[arg(long, env = "SAFEHOLD_API_SECRET", hide_env_values = true)]
        secret: String,
    },

    /// List configured storage sites
    List,

    /// Forget a storage site (its stored copy is left in place)
    Remove { name: String },
}

pub fn execute(vault: &mut Vault, command: Command) -> Result<()> {
    match command {
        Command::AddFs { name, path } => add(vault, FileSystemSite::new(name, path)),
        Command::AddBrowser { name, key } => add(vault, BrowserSyncSite::new(name, &key)),
        Command::AddApi {
            name,
            url,
            record_id,
            secret,
        } => {
            let record_id = match record_id {
                Some(hex_id) => parse_record_id(&hex_id)?,
                None => rand::random(),
            };
            add(vault, RemoteApiSite::new(name, &url, record_id, secret.as_bytes()))
        }
        Command::List => {
            list(vault);
            Ok(())
        }
        Command::Remove { name } => {
            if vault.manager.remove_site(&name).is_none() {
                return Err(VaultError::SiteNotFound(name).into());
            }
            vault.persist_sites()?;
            println!("Removed storage site '{name}'");
            Ok(())
        }
    }
}

fn add(vault: &mut Vault, site: impl Into<StorageSite>) -> Result<()> {
    let site = site.into();
    let name = site.name().to_string();
    let kind = site.kind();
    vault.manager.add_site(site)?;
    vault.persist_sites()?;
    println!("Added {kind} storage site '{name}'");
    Ok(())
}

fn list(vault: &Vault) {
    if vault.manager.sites().is_empty() {
        println!("No storage sites configured");
        return;
    }

    let mut table = create_table();
    table.set_header(vec!["Name", "Type", "Target"]);
    for site in vault.manager.sites() {
        table.add_row(vec![site.name().to_string(), site.kind().to_string(), target(site)]);
    }
    println!("{table}");
}

fn target(site: &StorageSite) -> String {
    let target = match site {
        StorageSite::FileSystem(fs) => fs.location().map(|p| p.display().to_string()),
        StorageSite::BrowserSync(browser) => browser.key().map(str::to_string),
        StorageSite::RemoteApi(api) => api
            .location()
            .map(|url| format!("{url} ({})", hex::encode(api.record_id()))),
    };
    target.unwrap_or_else(|e| format!("<{e}>"))
}

fn parse_record_id(hex_id: &str) -> Result<[u8; 16]> {
    let bytes = hex::decode(hex_id).context("Record id must be hex")?;
    match <[u8; 16]>::try_from(bytes.as_slice()) {
        Ok(id) => Ok(id),
        Err(_) => bail!("Record id must be 16 bytes, got {}", bytes.len()),
    }
}
