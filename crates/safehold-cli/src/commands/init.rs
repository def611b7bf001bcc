use std::path::Path;

use anyhow::Result;
use clap::Args as ClapArgs;

use crate::auth::{PasswordOptions, get_new_password};
use crate::config::Config;
use crate::vault::Vault;

#[derive(ClapArgs, Clone)]
pub struct Args {}

pub fn execute(config: &Config, sites_file: &Path, password: &PasswordOptions, _args: Args) -> Result<()> {
    let password = get_new_password(password)?;
    let vault = Vault::create(config, sites_file, &password)?;

    println!("Created new site list at: {}", vault.sites_file().display());
    Ok(())
}
