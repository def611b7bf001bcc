use anyhow::Result;
use clap::Args as ClapArgs;

use safehold_core::StorageSite;
use safehold_core::sync::{SiteOutcome, SiteStatus, SyncResult};
use safehold_core::synchronize;

use crate::output::create_table;
use crate::vault::{Vault, VaultError};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Succeed as long as this many sites were written
    #[arg(long, value_name = "N")]
    pub quorum: Option<usize>,
}

/// Pull every site's copy, reconcile, and push the result back out.
pub async fn execute(vault: &Vault, args: Args, quiet: bool) -> Result<()> {
    if vault.manager.sites().is_empty() {
        return Err(VaultError::NoSites.into());
    }

    let result = synchronize(&vault.manager, &vault.ctx).await?;
    if !quiet {
        print_report(vault.manager.sites(), &result);
    }

    let total = vault.manager.sites().len();
    let Some(save) = &result.save else {
        let failed = result.load.failed().count();
        if failed > 0 {
            return Err(VaultError::SitesFailed { failed, total }.into());
        }
        if !quiet {
            println!("No site holds a vault yet; nothing to synchronize");
        }
        return Ok(());
    };

    let failed = result
        .load
        .failed()
        .map(|o| o.site_name.as_str())
        .chain(save.failed().map(|o| o.site_name.as_str()))
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    let required = args.quorum.unwrap_or(total);
    if failed > 0 && !save.has_quorum(required) {
        return Err(VaultError::SitesFailed { failed, total }.into());
    }
    Ok(())
}

fn print_report(sites: &[StorageSite], result: &SyncResult) {
    let mut table = create_table();
    table.set_header(vec!["Site", "Type", "Load", "Save"]);
    for (index, site) in sites.iter().enumerate() {
        let load = result.load.outcomes.get(index).map_or_else(String::new, describe);
        let save = result
            .save
            .as_ref()
            .and_then(|s| s.outcomes.get(index))
            .map_or_else(|| "-".to_string(), describe);
        table.add_row(vec![site.name().to_string(), site.kind().to_string(), load, save]);
    }
    println!("{table}");
}

fn describe(outcome: &SiteOutcome) -> String {
    match &outcome.status {
        SiteStatus::Loaded => "loaded".to_string(),
        SiteStatus::Empty => "empty".to_string(),
        SiteStatus::Saved => "saved".to_string(),
        SiteStatus::Skipped => "skipped (copy unreadable)".to_string(),
        SiteStatus::Failed(e) => format!("failed: {e}"),
    }
}
