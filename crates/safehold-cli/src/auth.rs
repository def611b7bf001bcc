use std::io::{self, IsTerminal, Write};

use anyhow::{Result, bail};
use rpassword::read_password;

/// Where the master password comes from, in priority order.
#[derive(Clone, Default)]
pub struct PasswordOptions {
    pub password: Option<String>,
    pub password_stdin: bool,
}

/// Resolve the master password: stdin, then `--password` /
/// `SAFEHOLD_PASSWORD`, then an interactive prompt.
pub fn get_password(opts: &PasswordOptions) -> Result<String> {
    if opts.password_stdin {
        read_password_from_stdin()
    } else if let Some(password) = &opts.password {
        Ok(password.clone())
    } else {
        prompt_password()
    }
}

/// Like [`get_password`], but an interactive prompt asks twice.
pub fn get_new_password(opts: &PasswordOptions) -> Result<String> {
    if opts.password_stdin || opts.password.is_some() {
        return get_password(opts);
    }
    let first = prompt_password()?;
    eprint!("Confirm master password: ");
    io::stderr().flush()?;
    let second = read_password()?;
    if first != second {
        bail!("Passwords do not match");
    }
    Ok(first)
}

/// Prompt for the master password without echo.
fn prompt_password() -> Result<String> {
    eprint!("Master password: ");
    io::stderr().flush()?;

    let password = read_password()?;
    if password.is_empty() {
        bail!("Password cannot be empty");
    }
    Ok(password)
}

fn read_password_from_stdin() -> Result<String> {
    if io::stdin().is_terminal() {
        bail!(
            "--password-stdin requires the password to be piped in.\n\
             Example: echo \"$SECRET\" | safehold --password-stdin sync"
        );
    }

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;
    let password = password.trim_end_matches('\n').trim_end_matches('\r');
    if password.is_empty() {
        bail!("Password from stdin is empty");
    }
    Ok(password.to_string())
}
