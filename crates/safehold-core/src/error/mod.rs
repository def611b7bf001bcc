//! Error types for the safehold core
//!
//! This module re-exports every error enum so callers can match on them
//! without knowing which layer raised them.

pub use crate::crypto::{CryptoError, KeyAccessError};
pub use crate::memory::SecureMemoryError;
pub use crate::storage::{FactoryError, SiteError};
pub use crate::store::StoreError;
pub use crate::sync::SiteSyncError;
pub use crate::wire::WireError;
