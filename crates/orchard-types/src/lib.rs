//! Shared type definitions for the Orchard client engine.
//!
//! This crate is the single source of truth for the shapes the game server
//! sends and accepts. Types flow downstream to `TypeScript` via `ts-rs` for
//! the browser renderer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for server-assigned integer ids
//! - [`enums`] -- Harvest model, inventory kinds, fertilizer effects
//! - [`catalog`] -- Static plant/fruit/fertilizer/weather definitions
//! - [`snapshot`] -- The authoritative state pulled on every sync
//! - [`actions`] -- Mutating player actions and the reply envelope

pub mod actions;
pub mod catalog;
pub mod enums;
pub mod ids;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use actions::{ActionResponse, Credentials, GameAction, SessionStatus};
pub use catalog::{
    FertilizerType, FruitType, GameCatalog, PlantType, WeatherCombination, WeatherType,
};
pub use enums::{EffectKind, HarvestType, ItemKind};
pub use ids::{
    FertilizerTypeId, FruitId, FruitTypeId, InventoryItemId, PlantTypeId, PlotId, WeatherComboId,
    WeatherTypeId,
};
pub use snapshot::{Fruit, InventoryItem, Plot, Snapshot, TimedBuff, UserProfile, WeatherStamp};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files to `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::PlotId::export_all();
        let _ = crate::ids::FruitId::export_all();
        let _ = crate::ids::PlantTypeId::export_all();
        let _ = crate::ids::FruitTypeId::export_all();
        let _ = crate::ids::FertilizerTypeId::export_all();
        let _ = crate::ids::WeatherTypeId::export_all();
        let _ = crate::ids::WeatherComboId::export_all();
        let _ = crate::ids::InventoryItemId::export_all();

        // Enums
        let _ = crate::enums::HarvestType::export_all();
        let _ = crate::enums::ItemKind::export_all();
        let _ = crate::enums::EffectKind::export_all();

        // Structs
        let _ = crate::catalog::GameCatalog::export_all();
        let _ = crate::snapshot::Snapshot::export_all();
        let _ = crate::actions::GameAction::export_all();
    }
}
