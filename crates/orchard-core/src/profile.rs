//! Per-plant display profiles resolved once from the catalog.
//!
//! The reconciler never branches on raw catalog strings. Each sync resolves
//! every plant type into a [`PlantProfile`] whose [`HarvestModel`] carries
//! the parameters its branch needs.

use std::collections::BTreeMap;

use orchard_types::{GameCatalog, HarvestType, PlantType, PlantTypeId};

use crate::clock::GrowthRule;
use crate::config::{DisplayConfig, PlacementConfig, ScaleRule, ScatterRange};

/// How a plant yields fruit, with the parameters for drawing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HarvestModel {
    /// One ripening event; the fruit sits at a fixed anchor.
    SingleHarvest {
        /// Scale rule for the anchored fruit.
        scale: ScaleRule,
    },
    /// Continuous fruiting; each fruit is scattered on the plant.
    Perennial {
        /// Scatter region.
        range: ScatterRange,
        /// Scale rule for scattered fruit.
        scale: ScaleRule,
    },
}

impl HarvestModel {
    /// Scale rule of this model.
    pub const fn scale(&self) -> ScaleRule {
        match self {
            Self::SingleHarvest { scale } | Self::Perennial { scale, .. } => *scale,
        }
    }
}

/// Everything the reconciler needs to draw one plant type.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantProfile {
    /// Catalog id.
    pub id: PlantTypeId,
    /// Display name.
    pub name: String,
    /// Image file prefix.
    pub image_prefix: String,
    /// Growth parameters.
    pub rule: GrowthRule,
    /// Harvest model.
    pub model: HarvestModel,
}

impl PlantProfile {
    /// Resolve one catalog entry.
    pub fn resolve(plant: &PlantType, placement: &PlacementConfig, display: &DisplayConfig) -> Self {
        let model = match plant.harvest_type {
            HarvestType::SingleHarvest => HarvestModel::SingleHarvest {
                scale: display.single_harvest_scale,
            },
            HarvestType::Perennial => HarvestModel::Perennial {
                range: placement.range_for(&plant.name),
                scale: display.perennial_scale,
            },
        };
        Self {
            id: plant.id,
            name: plant.name.clone(),
            image_prefix: plant.image_prefix.clone(),
            rule: GrowthRule::for_plant(plant),
            model,
        }
    }

    /// Asset path of the plant sprite at a stage.
    pub fn plant_image(&self, stage: u32) -> String {
        format!("plants/{}_{stage:02}.png", self.image_prefix)
    }

    /// Asset path of a fruit sprite.
    pub fn fruit_image(&self, image_suffix: &str) -> String {
        format!("fruits/{}_{image_suffix}.png", self.image_prefix)
    }
}

/// Resolve every plant type in a catalog.
pub fn resolve_profiles(
    catalog: &GameCatalog,
    placement: &PlacementConfig,
    display: &DisplayConfig,
) -> BTreeMap<PlantTypeId, PlantProfile> {
    catalog
        .plant_types
        .values()
        .map(|plant| (plant.id, PlantProfile::resolve(plant, placement, display)))
        .collect()
}

/// Weight-driven sprite scale, rounded to two decimals.
///
/// `ratio = sqrt(weight / base_weight)`; the scale is `factor * ratio`
/// clamped to the rule's bounds.
pub fn fruit_scale(weight: f64, base_weight: f64, rule: ScaleRule) -> f64 {
    let ratio = (weight.max(0.0) / base_weight).sqrt();
    let scale = (rule.factor * ratio).clamp(rule.min, rule.max.max(rule.min));
    (scale * 100.0).round() / 100.0
}

/// Asset path of a weather badge.
pub fn weather_icon(icon: &str) -> String {
    format!("weather/{icon}")
}
