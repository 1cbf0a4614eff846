//! # CLI Module
//!
//! Command implementations behind the `playall` binary. Each command takes the
//! loaded [`crate::config::Settings`], returns a [`crate::Result`] and leaves
//! printing fatal errors and choosing the exit status to `main`.
//!
//! - [`auth`] - browser login; caches the token for later runs
//! - [`build`] - create a playlist and fill it from the followed-artist catalog
//!
//! ```bash
//! playall auth
//! playall build --saved-albums --flush collect
//! playall build --order api --on-write-failure skip --max-attempts 0
//! ```

mod auth;
mod build;

pub use auth::{auth, authenticated_client};
pub use build::{BuildOptions, build, create_playlist};
