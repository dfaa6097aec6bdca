//! The authoritative game state as pulled from the server.
//!
//! A [`Snapshot`] is immutable once received and replaced wholesale on the
//! next sync. Entities live exactly as long as they appear in the current
//! snapshot; absence in a newer one means logical deletion.
//!
//! Timestamps are kept as the raw strings the server sent. The server mixes
//! HTTP-date and ISO-8601 renderings, and a malformed value has to surface as
//! an explicit "unavailable" display state, so parsing happens in the engine
//! where that decision is made.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::{GameCatalog, WeatherType};
use crate::enums::ItemKind;
use crate::ids::{FruitId, FruitTypeId, InventoryItemId, PlantTypeId, PlotId, WeatherTypeId};

/// Identity and balance of the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserProfile {
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Current balance.
    pub money: i64,
}

/// A weather effect recorded on a fruit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WeatherStamp {
    /// The weather that stuck to the fruit.
    pub weather_id: WeatherTypeId,
    /// When it was applied.
    #[serde(default)]
    pub applied_at: Option<String>,
    /// How long the server keeps it active.
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

/// A timed fertilizer buff recorded on a plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimedBuff {
    /// Expiry timestamp.
    pub expiry: String,
    /// Strength of the buff.
    #[serde(default)]
    pub value: f64,
}

/// A fruit, either hanging on a plot or sitting in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Fruit {
    /// Unique id.
    pub id: FruitId,
    /// Owning plot while attached; `None` once harvested into the inventory.
    #[serde(default)]
    pub plot_id: Option<PlotId>,
    /// Fruit variant.
    pub fruit_type_id: FruitTypeId,
    /// Weight in kilograms.
    pub weight: f64,
    /// Spawn timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Serialized JSON list of [`WeatherStamp`]s.
    #[serde(default)]
    pub weather_effects: Option<String>,
    /// Denormalised colour name (inventory fruits only).
    #[serde(default)]
    pub color_name: Option<String>,
    /// Denormalised image suffix (inventory fruits only).
    #[serde(default)]
    pub image_suffix: Option<String>,
    /// Denormalised plant image prefix (inventory fruits only).
    #[serde(default)]
    pub image_prefix: Option<String>,
    /// Denormalised plant name (inventory fruits only).
    #[serde(default)]
    pub plant_name: Option<String>,
}

impl Fruit {
    /// Decode the weather stamps recorded on this fruit.
    ///
    /// A missing or blank field is an empty list.
    pub fn weather_stamps(&self) -> Result<Vec<WeatherStamp>, serde_json::Error> {
        match self.weather_effects.as_deref().map(str::trim) {
            None | Some("") => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(raw),
        }
    }

    /// The ids of the weather effects recorded on this fruit.
    pub fn effect_ids(&self) -> Result<Vec<WeatherTypeId>, serde_json::Error> {
        Ok(self
            .weather_stamps()?
            .into_iter()
            .map(|stamp| stamp.weather_id)
            .collect())
    }
}

/// A single planting slot owned by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Plot {
    /// Unique id.
    pub id: PlotId,
    /// Position on the board, 1-based.
    pub plot_number: u32,
    /// Planted type, `None` when empty.
    #[serde(default)]
    pub plant_type_id: Option<PlantTypeId>,
    /// Last growth stage the server committed.
    #[serde(default)]
    pub growth_stage: u32,
    /// Planting timestamp.
    #[serde(default)]
    pub planted_at: Option<String>,
    /// Additive seconds credited by growth fertilizer.
    #[serde(default)]
    pub growth_boost_seconds: f64,
    /// Serialized JSON object of effect key to [`TimedBuff`].
    #[serde(default)]
    pub fertilizer_applied_effect: Option<String>,
    /// Unharvested fruits attached to this plot.
    #[serde(default)]
    pub fruits: Vec<Fruit>,
}

impl Plot {
    /// Decode the timed buffs on this plot, keyed by effect key.
    ///
    /// A missing or blank field is an empty map.
    pub fn timed_buffs(&self) -> Result<BTreeMap<String, TimedBuff>, serde_json::Error> {
        match self.fertilizer_applied_effect.as_deref().map(str::trim) {
            None | Some("") => Ok(BTreeMap::new()),
            Some(raw) => serde_json::from_str(raw),
        }
    }

    /// Whether a plant is growing here.
    pub const fn is_planted(&self) -> bool {
        self.plant_type_id.is_some()
    }
}

/// A stack of seeds or fertilizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InventoryItem {
    /// Unique id of the stack.
    pub id: InventoryItemId,
    /// Seed or fertilizer.
    pub item_type: ItemKind,
    /// Plant type id for seeds, fertilizer type id for fertilizers.
    pub item_id: i64,
    /// Count held.
    pub quantity: u32,
}

/// One authoritative, point-in-time copy of all server-owned game state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Signed-in user.
    pub user: UserProfile,
    /// Weather currently active across the world.
    #[serde(default)]
    pub global_weather: Vec<WeatherType>,
    /// Owned plots ordered by plot number.
    #[serde(default)]
    pub plots: Vec<Plot>,
    /// Seed and fertilizer stacks.
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    /// Harvested, sellable fruits.
    #[serde(default)]
    pub inventory_fruits: Vec<Fruit>,
    /// Static catalog.
    #[serde(default)]
    pub game_data: GameCatalog,
}

impl Snapshot {
    /// Find the owned plot at a board position.
    pub fn plot_at(&self, plot_number: u32) -> Option<&Plot> {
        self.plots.iter().find(|plot| plot.plot_number == plot_number)
    }

    /// Number of plots the user owns.
    pub fn owned_plot_count(&self) -> usize {
        self.plots.len()
    }

    /// Find an inventory fruit by id.
    pub fn inventory_fruit(&self, id: FruitId) -> Option<&Fruit> {
        self.inventory_fruits.iter().find(|fruit| fruit.id == id)
    }
}
