//! Loading, reconciling and re-distributing a vault across storage sites.
//!
//! Every site is read or written concurrently. A failing site never aborts
//! the operation: its error is recorded in the result and the caller
//! decides whether enough sites succeeded. Only failures that affect every
//! site alike (no session, encryption failure) are returned as `Err`.
//!
//! Replicas are reconciled in site configuration order, which therefore
//! decides ties between records with equal versions.

mod result;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::data::DataStore;
use crate::storage::{SiteContext, StorageSite};
use crate::store::{StoreError, StoreManager};

pub use result::{DataStoreResult, SaveDataStoreResult, SiteOutcome, SiteStatus, SiteSyncError, SyncResult};

async fn load_one(
    manager: &StoreManager,
    site: &StorageSite,
    ctx: &SiteContext,
) -> (SiteOutcome, Option<DataStore>) {
    let loaded = match site.load(ctx).await {
        Ok(Some(ciphertext)) => manager
            .decrypt_data_store(&ciphertext)
            .map(Some)
            .map_err(SiteSyncError::from),
        Ok(None) => Ok(None),
        Err(e) => Err(SiteSyncError::from(e)),
    };

    let (status, store) = match loaded {
        Ok(Some(store)) => (SiteStatus::Loaded, Some(store)),
        Ok(None) => (SiteStatus::Empty, None),
        Err(e) => {
            warn!(site = %site.name(), error = %e, "Failed to load vault from site");
            (SiteStatus::Failed(e), None)
        }
    };
    let outcome = SiteOutcome {
        site_name: site.name().to_string(),
        kind: site.kind(),
        status,
    };
    (outcome, store)
}

/// Load the vault from every site and reconcile the copies.
#[instrument(level = "debug", skip(manager, ctx), fields(sites = manager.sites().len()))]
pub async fn load_data_store(manager: &StoreManager, ctx: &SiteContext) -> Result<DataStoreResult, StoreError> {
    manager.ensure_authenticated()?;

    let results = join_all(manager.sites().iter().map(|site| load_one(manager, site, ctx))).await;

    let mut outcomes = Vec::with_capacity(results.len());
    let mut replicas = Vec::new();
    for (outcome, store) in results {
        outcomes.push(outcome);
        replicas.extend(store);
    }

    debug!(replicas = replicas.len(), "Reconciling replicas");
    let store = DataStore::reconcile_by_item_name(replicas);
    Ok(DataStoreResult { store, outcomes })
}

/// Encrypt `store` once and write it to every site.
#[instrument(level = "debug", skip(manager, store, ctx), fields(sites = manager.sites().len()))]
pub async fn save_data_store(
    manager: &StoreManager,
    store: &DataStore,
    ctx: &SiteContext,
) -> Result<SaveDataStoreResult, StoreError> {
    save_to_sites(manager, store, ctx, &[]).await
}

/// Write `store` to every site except those at the `skip` positions.
async fn save_to_sites(
    manager: &StoreManager,
    store: &DataStore,
    ctx: &SiteContext,
    skip: &[usize],
) -> Result<SaveDataStoreResult, StoreError> {
    let ciphertext = manager.encrypt_data_store(store)?;

    let outcomes = join_all(manager.sites().iter().enumerate().map(|(index, site)| {
        let ciphertext = &ciphertext;
        async move {
            let status = if skip.contains(&index) {
                SiteStatus::Skipped
            } else {
                match site.save(ciphertext, ctx).await {
                    Ok(()) => SiteStatus::Saved,
                    Err(e) => SiteStatus::Failed(e.into()),
                }
            };
            SiteOutcome {
                site_name: site.name().to_string(),
                kind: site.kind(),
                status,
            }
        }
    }))
    .await;

    let result = SaveDataStoreResult { outcomes };
    if result.all_succeeded() {
        debug!("Saved to all sites");
    } else {
        warn!(
            failed = result.failed().count(),
            skipped = result.skipped().count(),
            total = result.outcomes.len(),
            "Save did not reach every site"
        );
    }
    Ok(result)
}

/// Load, reconcile and write the reconciled vault back.
///
/// Sites whose copy failed to load are not written: their records were not
/// part of the reconciliation and would otherwise be lost. They are
/// reported as [`SiteStatus::Skipped`].
#[instrument(level = "info", skip(manager, ctx))]
pub async fn synchronize(manager: &StoreManager, ctx: &SiteContext) -> Result<SyncResult, StoreError> {
    let load = load_data_store(manager, ctx).await?;
    let unread: Vec<usize> = load
        .outcomes
        .iter()
        .enumerate()
        .filter(|(_, outcome)| outcome.is_failure())
        .map(|(index, _)| index)
        .collect();

    let save = match load.store.as_ref() {
        Some(store) => Some(save_to_sites(manager, store, ctx, &unread).await?),
        None => {
            info!("No site holds a vault yet; nothing to write back");
            None
        }
    };
    if save.as_ref().is_some_and(SaveDataStoreResult::all_succeeded) {
        info!(loaded = load.loaded_count(), "Synchronized all sites");
    }
    Ok(SyncResult { load, save })
}
