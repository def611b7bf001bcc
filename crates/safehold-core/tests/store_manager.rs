//! StoreManager sessions, envelope encryption and site lists.

mod common;

use common::{PASSWORD, authenticated_manager};
use safehold_core::crypto::KdfParams;
use safehold_core::storage::{BrowserSyncSite, FileSystemSite, LOCATION_SETTING, RemoteApiSite};
use safehold_core::{DataItem, DataStore, StorageSite, StoreError, StoreManager};

fn fresh_manager() -> StoreManager {
    StoreManager::with_kdf(KdfParams::fast())
}

#[test]
fn test_same_password_recovers_same_store_key() {
    let mut manager = fresh_manager();
    manager.authenticate(PASSWORD).unwrap();
    let first = manager.plain_store_key().unwrap();
    manager.authenticate(PASSWORD).unwrap();
    let second = manager.plain_store_key().unwrap();
    assert_eq!(first, second);

    let mut other_device = fresh_manager();
    other_device.authenticate(PASSWORD).unwrap();
    assert_eq!(other_device.plain_store_key().unwrap(), first);
}

#[test]
fn test_different_password_different_store_key() {
    let a = authenticated_manager();
    let mut b = fresh_manager();
    b.authenticate(b"something else").unwrap();
    assert_ne!(a.plain_store_key().unwrap(), b.plain_store_key().unwrap());
}

#[test]
fn test_two_file_system_sites_round_trip() {
    let mut manager = authenticated_manager();
    manager.add_site(FileSystemSite::new("first", "abc")).unwrap();
    manager.add_site(FileSystemSite::new("second", "def")).unwrap();
    let blob = manager.save_storage_sites().unwrap();

    let mut reloaded = authenticated_manager();
    let report = reloaded.load_storage_sites(&blob).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.loaded, 2);

    let locations: Vec<&str> = reloaded
        .sites()
        .iter()
        .map(|site| site.settings().get_str(LOCATION_SETTING).unwrap())
        .collect();
    assert_eq!(locations, vec!["abc", "def"]);
}

#[test]
fn test_all_site_kinds_round_trip() {
    let mut manager = authenticated_manager();
    manager.add_site(FileSystemSite::new("fs", "/srv/vault.bin")).unwrap();
    manager.add_site(BrowserSyncSite::new("ext", "safehold-vault")).unwrap();
    manager
        .add_site(RemoteApiSite::new("api", "https://vault.example", [0x11; 16], b"record-secret"))
        .unwrap();
    let blob = manager.save_storage_sites().unwrap();

    let mut reloaded = authenticated_manager();
    reloaded.load_storage_sites(&blob).unwrap();
    assert_eq!(reloaded.sites(), manager.sites());
}

#[test]
fn test_wrong_password_is_invalid_authentication() {
    let mut manager = authenticated_manager();
    manager.add_site(FileSystemSite::new("fs", "abc")).unwrap();
    let blob = manager.save_storage_sites().unwrap();

    let mut intruder = fresh_manager();
    intruder.authenticate(b"wrong password").unwrap();
    assert!(matches!(
        intruder.load_storage_sites(&blob),
        Err(StoreError::InvalidAuthentication)
    ));
    assert!(intruder.sites().is_empty());
}

#[test]
fn test_truncated_blob_is_invalid_authentication() {
    let mut manager = authenticated_manager();
    manager.add_site(FileSystemSite::new("fs", "abc")).unwrap();
    let blob = manager.save_storage_sites().unwrap();

    assert!(matches!(
        manager.load_storage_sites(&blob[..blob.len() - 5]),
        Err(StoreError::InvalidAuthentication)
    ));
    assert!(matches!(
        manager.load_storage_sites(&[]),
        Err(StoreError::InvalidAuthentication)
    ));
}

#[test]
fn test_load_requires_session() {
    let mut manager = fresh_manager();
    assert!(matches!(
        manager.load_storage_sites(&[0; 32]),
        Err(StoreError::NotAuthenticated)
    ));
}

#[test]
fn test_empty_site_list() {
    let manager = authenticated_manager();
    let blob = manager.save_storage_sites().unwrap();

    let mut reloaded = authenticated_manager();
    reloaded.add_site(FileSystemSite::new("stale", "x")).unwrap();
    let report = reloaded.load_storage_sites(&blob).unwrap();
    assert_eq!(report.loaded, 0);
    assert!(reloaded.sites().is_empty());
}

#[test]
fn test_data_store_envelope() {
    let manager = authenticated_manager();
    let mut store = DataStore::new(b"personal");
    store.items_mut().add(DataItem::new(b"mail"));

    let ciphertext = manager.encrypt_data_store(&store).unwrap();
    let decrypted = manager.decrypt_data_store(&ciphertext).unwrap();
    assert_eq!(decrypted.name(), b"personal");
    assert_eq!(decrypted.items().len(), 1);

    let mut foreign = fresh_manager();
    foreign.authenticate(b"not the password").unwrap();
    assert!(matches!(
        foreign.decrypt_data_store(&ciphertext),
        Err(StoreError::InvalidAuthentication)
    ));
}

#[test]
fn test_remove_site_then_save() {
    let mut manager = authenticated_manager();
    manager.add_site(FileSystemSite::new("a", "1")).unwrap();
    manager.add_site(FileSystemSite::new("b", "2")).unwrap();
    let removed = manager.remove_site("a").unwrap();
    assert!(matches!(removed, StorageSite::FileSystem(_)));

    let blob = manager.save_storage_sites().unwrap();
    let mut reloaded = authenticated_manager();
    reloaded.load_storage_sites(&blob).unwrap();
    assert_eq!(reloaded.sites().len(), 1);
    assert_eq!(reloaded.sites()[0].name(), "b");
}
