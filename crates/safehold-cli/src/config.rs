//! Configuration file support for the safehold CLI.
//!
//! Configuration is read from `$SAFEHOLD_CONFIG_DIR/config.toml` when that
//! variable is set, otherwise from `~/.config/safehold/config.toml`.
//!
//! # Example configuration
//!
//! ```toml
//! [vault]
//! name = "personal"
//! sites_file = "/home/user/.local/share/safehold/sites.bin"
//!
//! [kdf]
//! iterations = 600000
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use safehold_core::crypto::{HashAlgorithm, KdfParams};

/// Vault name used when the configuration names none.
pub const DEFAULT_VAULT_NAME: &str = "personal";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub vault: VaultSection,

    #[serde(default)]
    pub kdf: KdfSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VaultSection {
    /// Where the encrypted site list is kept
    pub sites_file: Option<PathBuf>,

    /// Name given to a newly created vault
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct KdfSection {
    /// PBKDF2 iteration count; `SAFEHOLD_FAST_KDF` still applies when unset
    pub iterations: Option<u32>,
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file at the default location yields the empty
    /// configuration; an explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (config_path()?, false),
        };

        if !explicit && !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn vault_name(&self) -> &str {
        self.vault.name.as_deref().unwrap_or(DEFAULT_VAULT_NAME)
    }

    /// The site list path: the command-line override, then the config, then
    /// the platform data directory.
    pub fn sites_file(&self, overridden: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = overridden {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = &self.vault.sites_file {
            return Ok(path.clone());
        }
        let base_dirs =
            directories::BaseDirs::new().ok_or_else(|| anyhow!("Could not determine home directory"))?;
        Ok(base_dirs.data_dir().join("safehold").join("sites.bin"))
    }

    pub fn kdf_params(&self) -> Result<KdfParams> {
        match self.kdf.iterations {
            Some(iterations) => KdfParams::new(HashAlgorithm::default(), iterations)
                .context("Invalid [kdf] section in config file"),
            None => Ok(KdfParams::default()),
        }
    }
}

/// Get the path to the configuration file.
pub fn config_path() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("SAFEHOLD_CONFIG_DIR") {
        return Ok(PathBuf::from(dir).join("config.toml"));
    }

    let base_dirs =
        directories::BaseDirs::new().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(base_dirs.config_dir().join("safehold").join("config.toml"))
}
