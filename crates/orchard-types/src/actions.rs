//! Mutating player actions and the server's reply envelope.
//!
//! Every action maps to one server endpoint and a JSON payload. The server
//! answers with an [`ActionResponse`]: either a fresh snapshot to apply
//! exactly like a sync, or a failure message to show the player.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ItemKind;
use crate::ids::{FruitId, InventoryItemId, PlotId};
use crate::snapshot::Snapshot;

/// A mutating request the player can make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum GameAction {
    /// Pick a fruit off a plot into the inventory.
    HarvestFruit {
        /// Fruit to pick.
        fruit_id: FruitId,
    },
    /// Sell inventory fruits.
    SellFruits {
        /// Fruits to sell.
        fruit_ids: Vec<FruitId>,
    },
    /// Remove the plant and every fruit on it.
    DigUpPlant {
        /// Plot to clear.
        plot_id: PlotId,
    },
    /// Buy one seed or fertilizer.
    BuyItem {
        /// Seed or fertilizer.
        item_type: ItemKind,
        /// Catalog id of the item.
        item_id: i64,
    },
    /// Buy the next locked plot.
    BuyPlot {
        /// Board position to buy.
        plot_number: u32,
    },
    /// Plant a seed from the inventory.
    PlantSeed {
        /// Seed stack to draw from.
        inventory_id: InventoryItemId,
        /// Target plot.
        plot_id: PlotId,
    },
    /// Apply a fertilizer from the inventory.
    UseFertilizer {
        /// Fertilizer stack to draw from.
        inventory_id: InventoryItemId,
        /// Target plot.
        plot_id: PlotId,
    },
}

impl GameAction {
    /// Server endpoint path for this action.
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Self::HarvestFruit { .. } => "/api/harvest_fruit",
            Self::SellFruits { .. } => "/api/sell_fruits",
            Self::DigUpPlant { .. } => "/api/dig_up_plant",
            Self::BuyItem { .. } => "/api/buy_item",
            Self::BuyPlot { .. } => "/api/buy_plot",
            Self::PlantSeed { .. } => "/api/plant_seed",
            Self::UseFertilizer { .. } => "/api/use_fertilizer",
        }
    }

    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::HarvestFruit { .. } => "harvest_fruit",
            Self::SellFruits { .. } => "sell_fruits",
            Self::DigUpPlant { .. } => "dig_up_plant",
            Self::BuyItem { .. } => "buy_item",
            Self::BuyPlot { .. } => "buy_plot",
            Self::PlantSeed { .. } => "plant_seed",
            Self::UseFertilizer { .. } => "use_fertilizer",
        }
    }

    /// JSON body the endpoint expects.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            Self::HarvestFruit { fruit_id } => serde_json::json!({ "fruit_id": fruit_id }),
            Self::SellFruits { fruit_ids } => serde_json::json!({ "fruit_ids": fruit_ids }),
            Self::DigUpPlant { plot_id } => serde_json::json!({ "plot_id": plot_id }),
            Self::BuyItem { item_type, item_id } => serde_json::json!({
                "item_type": item_type.as_str(),
                "item_id": item_id,
            }),
            Self::BuyPlot { plot_number } => serde_json::json!({ "plot_number": plot_number }),
            Self::PlantSeed {
                inventory_id,
                plot_id,
            }
            | Self::UseFertilizer {
                inventory_id,
                plot_id,
            } => serde_json::json!({
                "inventory_id": inventory_id,
                "plot_id": plot_id,
            }),
        }
    }
}

/// Reply envelope shared by every state-returning endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Whether the server accepted the request.
    pub success: bool,
    /// Updated state on success.
    #[serde(default)]
    pub state: Option<Snapshot>,
    /// Failure reason on rejection.
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply of the session probe endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Whether the cookie session is signed in.
    pub logged_in: bool,
}

/// Login or registration body.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Password in clear; only ever sent over the transport.
    pub password: String,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
