//! Exit codes for the CLI.
//!
//! These follow common Unix conventions and provide meaningful
//! status information for scripting and automation.

/// Successful execution
pub const SUCCESS: u8 = 0;

/// General/unspecified error
pub const GENERAL_ERROR: u8 = 1;

/// Command-line usage error (bad arguments)
pub const USAGE_ERROR: u8 = 2;

/// Authentication failed (wrong master password, corrupted site list)
pub const AUTH_FAILED: u8 = 3;

/// One or more storage sites could not be read or written
pub const SITE_FAILED: u8 = 4;

/// Site list, site or item not found
pub const NOT_FOUND: u8 = 5;
