//! Core of the safehold secrets vault.
//!
//! The crate is layered leaves-first:
//!
//! - [`memory`]: secret-holding buffers that are memory-locked and wiped on drop
//! - [`wire`]: the length-prefixed binary format shared by every persisted entity
//! - [`data`]: record identities, newest-wins reconciliation and the vault tree
//! - [`storage`]: storage-site settings, the site variants and their factory
//! - [`crypto`]: AES-CBC envelope encryption, PBKDF2 key derivation, session keys
//! - [`store`]: the [`StoreManager`] session/envelope state machine
//! - [`sync`]: loading, merging and re-distributing a vault across sites

#![deny(unsafe_code)]

pub mod crypto;
pub mod data;
pub mod error;
pub mod memory;
pub mod storage;
pub mod store;
pub mod sync;
pub mod wire;

// Re-export commonly used types at crate root
pub use data::{DataCollection, DataField, DataIdentity, DataItem, DataStore, DataValue, Identifiable};
pub use memory::{SecureBuffer, SecureByteArray, SecureByteList};
pub use storage::{SiteContext, StorageSettings, StorageSite, StorageSiteFactory, StorageSiteKind};
pub use store::{StoreError, StoreManager};
pub use sync::{DataStoreResult, SaveDataStoreResult, load_data_store, save_data_store, synchronize};
pub use wire::{WireFormat, WireReader, WireWriter};
