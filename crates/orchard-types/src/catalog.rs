//! Static game catalog shipped with every snapshot.
//!
//! The catalog is read-only reference data: plant, fruit, fertilizer and
//! weather definitions keyed by id, plus the price of each purchasable plot.
//! The engine never mutates it; it only looks things up.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EffectKind, HarvestType};
use crate::ids::{FertilizerTypeId, FruitTypeId, PlantTypeId, WeatherComboId, WeatherTypeId};

/// A plant that can be grown from a seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlantType {
    /// Catalog id.
    pub id: PlantTypeId,
    /// Display name, also used to pick the fruit scatter layout.
    pub name: String,
    /// Shop price of one seed.
    #[serde(default)]
    pub seed_price: i64,
    /// Sale price per kilogram before multipliers.
    pub base_price: f64,
    /// Terminal growth stage.
    pub max_growth_stage: u32,
    /// Seconds of effective growth per stage.
    pub growth_time_per_stage_seconds: f64,
    /// Harvest model.
    pub harvest_type: HarvestType,
    /// Prefix of the plant and fruit image files.
    #[serde(default)]
    pub image_prefix: String,
}

/// A colour variant of a plant's fruit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FruitType {
    /// Catalog id.
    pub id: FruitTypeId,
    /// Plant this fruit grows on.
    pub plant_type_id: PlantTypeId,
    /// Display colour name.
    #[serde(default)]
    pub color_name: String,
    /// Suffix of the fruit image file.
    #[serde(default)]
    pub image_suffix: String,
    /// Relative spawn weight.
    #[serde(default)]
    pub rarity_rate: f64,
    /// Per-variant sale multiplier.
    pub price_multiplier: f64,
}

/// A consumable applied to a planted plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FertilizerType {
    /// Catalog id.
    pub id: FertilizerTypeId,
    /// Display name.
    pub name: String,
    /// Shop price.
    #[serde(default)]
    pub price: i64,
    /// Raw effect key as stored by the server.
    pub effect_type: String,
    /// Strength of the effect (fraction for boosts).
    #[serde(default)]
    pub effect_value: f64,
}

impl FertilizerType {
    /// Typed effect kind, or `None` for keys this client does not know.
    pub fn effect_kind(&self) -> Option<EffectKind> {
        EffectKind::from_key(&self.effect_type)
    }
}

/// A single weather effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WeatherType {
    /// Catalog id.
    pub id: WeatherTypeId,
    /// Display name.
    pub name: String,
    /// Icon file shown on affected fruit.
    #[serde(default)]
    pub display_icon_filename: String,
    /// Sale multiplier; absent means 1.0.
    #[serde(default)]
    pub price_multiplier: Option<f64>,
    /// Chance per weather roll that this weather becomes active.
    #[serde(default)]
    pub spawn_rate: f64,
    /// Chance per update that an active weather sticks to a fruit.
    #[serde(default)]
    pub stick_rate: f64,
}

/// A named combination of two or more weather effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WeatherCombination {
    /// Catalog id.
    pub id: WeatherComboId,
    /// Display name.
    pub name: String,
    /// Member weather ids; matched as a set.
    pub weather_type_ids: Vec<WeatherTypeId>,
    /// Icon file shown on affected fruit.
    #[serde(default)]
    pub display_icon_filename: String,
    /// Sale multiplier; absent means 1.0.
    #[serde(default)]
    pub price_multiplier: Option<f64>,
}

/// All static definitions, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameCatalog {
    /// Plant definitions.
    #[serde(default)]
    pub plant_types: BTreeMap<PlantTypeId, PlantType>,
    /// Fertilizer definitions.
    #[serde(default)]
    pub fertilizer_types: BTreeMap<FertilizerTypeId, FertilizerType>,
    /// Fruit variant definitions.
    #[serde(default)]
    pub fruit_types: BTreeMap<FruitTypeId, FruitType>,
    /// Single weather definitions.
    #[serde(default)]
    pub weather_types: BTreeMap<WeatherTypeId, WeatherType>,
    /// Registered weather combinations.
    #[serde(default)]
    pub weather_combinations: BTreeMap<WeatherComboId, WeatherCombination>,
    /// Price of each purchasable plot, keyed by plot number.
    #[serde(default)]
    pub plot_costs: BTreeMap<u32, i64>,
}

impl GameCatalog {
    /// Look up a plant type.
    pub fn plant(&self, id: PlantTypeId) -> Option<&PlantType> {
        self.plant_types.get(&id)
    }

    /// Look up a fruit type.
    pub fn fruit(&self, id: FruitTypeId) -> Option<&FruitType> {
        self.fruit_types.get(&id)
    }

    /// Look up a weather type.
    pub fn weather(&self, id: WeatherTypeId) -> Option<&WeatherType> {
        self.weather_types.get(&id)
    }

    /// Look up a fertilizer type.
    pub fn fertilizer(&self, id: FertilizerTypeId) -> Option<&FertilizerType> {
        self.fertilizer_types.get(&id)
    }

    /// Price of a plot number, if it can be bought.
    pub fn plot_cost(&self, plot_number: u32) -> Option<i64> {
        self.plot_costs.get(&plot_number).copied()
    }
}
