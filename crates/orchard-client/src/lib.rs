//! Networked shell around the Orchard engine.
//!
//! Talks to the game server over HTTP, keeps a signed-in cookie session,
//! and drives an [`orchard_core::Board`] from two periodic tasks: a sync
//! tick that pulls and reconciles snapshots, and a display tick that
//! refreshes countdowns between syncs.
//!
//! # Modules
//!
//! - [`config`] -- Environment configuration
//! - [`error`] -- Client error taxonomy
//! - [`transport`] -- Game server contract and its HTTP implementation
//! - [`session`] -- Sync and display scheduling with shared cancellation

pub mod config;
pub mod error;
pub mod session;
pub mod transport;

pub use config::ClientConfig;
pub use error::ClientError;
pub use session::{SessionControl, SessionEnd, SessionEvent, SessionHandle, SessionOptions};
pub use transport::{GameServer, HttpTransport};
