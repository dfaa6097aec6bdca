//! Client-side engine for the Orchard farming game.
//!
//! The server owns all game state and the client pulls a full snapshot every
//! few seconds. This crate keeps a live view between those pulls without
//! rebuilding it: snapshots are reconciled into a keyed view tree, growth
//! and buff countdowns are projected from timestamps once a second, fruit is
//! scattered on perennial plants under a separation constraint, and fruit
//! is priced from the catalog.
//!
//! Nothing here performs I/O. The `orchard-client` crate drives a [`Board`]
//! from its sync and display tasks.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with defaults
//! - [`clock`] -- Timestamp parsing, growth and buff projections, countdowns
//! - [`weather`] -- Effect-set to weather/combination resolution
//! - [`pricing`] -- Fruit values and sale quotes
//! - [`placement`] -- Fruit scatter registry
//! - [`profile`] -- Per-plant harvest model resolved from the catalog
//! - [`store`] -- Current snapshot holder
//! - [`view`] -- Keyed view tree and its operations
//! - [`reconcile`] -- Snapshot-to-view diffing
//! - [`display`] -- Per-tick countdown refresh
//! - [`inventory`] -- Inventory fruit descriptors
//! - [`board`] -- Facade tying the above together

pub mod board;
pub mod clock;
pub mod config;
pub mod display;
pub mod inventory;
pub mod placement;
pub mod pricing;
pub mod profile;
pub mod reconcile;
pub mod store;
pub mod view;
pub mod weather;

pub use board::{Board, SyncOutcome};
pub use clock::{DerivedClock, GrowthProjection, GrowthRule, TimestampError, parse_timestamp};
pub use config::{ConfigError, EngineConfig};
pub use placement::{PlacementAllocator, Position};
pub use pricing::{PricingEngine, PricingError, SaleQuote};
pub use reconcile::{IntegrityFault, ReconcileReport, Reconciler};
pub use store::StateStore;
pub use view::{NodeKey, NodeProps, ViewOp, ViewTree};
pub use weather::{WeatherDisplay, WeatherResolver};
