//! playall library
//!
//! Builds a single Spotify playlist out of a user's whole followed-artist
//! catalog: every album and single per artist, reissues collapsed, remixes
//! left out, appended in batches of fifty.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the local OAuth callback listener
//! - `catalog` - the traversal, deduplication, filtering and batched-write pipeline
//! - `cli` - command implementations behind the binary
//! - `config` - environment and `.env` configuration
//! - `error` - error taxonomy shared by every module
//! - `management` - cached OAuth token handling
//! - `server` - the callback listener itself
//! - `spotify` - Spotify Web API client and login flow
//! - `types` - domain references and API payloads
//! - `utils` - PKCE helpers, naming, terminal output helpers
//!
//! # Example
//!
//! ```
//! use playall::{catalog::CatalogWalker, config};
//!
//! #[tokio::main]
//! async fn main() -> playall::Result<()> {
//!     config::load_env().await?;
//!     let settings = config::Settings::from_env()?;
//!     // build a client, create a playlist, run a CatalogWalker...
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{Error, Result};

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("artist #{:03} ID: {}, Name: {}", n, artist.id, artist.name);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits with status 1.
///
/// Only meant for the top level of the binary; library code returns
/// [`Error`] instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Skipping chunk #{} ({} tracks): {}", index, len, err);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
