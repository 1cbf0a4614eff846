//! # API Module
//!
//! HTTP endpoints of the short-lived local listener that receives the OAuth
//! redirect during `playall auth`.
//!
//! - [`callback`] - verifies the returned `state`, exchanges the authorization
//!   code and hands the result to the waiting login flow over a one-shot channel.
//! - [`health`] - liveness probe with the crate version.
//! - [`unhandled`] - fallback for every other path; logs the request, answers 404.
//!
//! ```rust,ignore
//! let app = playall::server::router(session, handoff);
//! ```

mod callback;
mod health;

pub use callback::{callback, unhandled};
pub use health::health;
