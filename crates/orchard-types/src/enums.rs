//! Enumeration types shared between the server payloads and the engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Harvest model
// ---------------------------------------------------------------------------

/// How a plant type yields fruit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum HarvestType {
    /// One ripening event; the plot becomes harvest-ready and resets on harvest.
    SingleHarvest,
    /// Keeps spawning independently ripening fruits once mature.
    Perennial,
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Classification of a non-fruit inventory stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ItemKind {
    /// A seed that can be planted on an empty plot.
    Seed,
    /// A fertilizer that can be applied to a planted plot.
    Fertilizer,
}

impl ItemKind {
    /// Wire name used in action payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Fertilizer => "fertilizer",
        }
    }
}

// ---------------------------------------------------------------------------
// Fertilizer effects
// ---------------------------------------------------------------------------

/// Effect a fertilizer applies to a plot.
///
/// `GrowthBoost` is applied instantly as boost seconds; every other kind is a
/// timed buff stored on the plot with an expiry timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EffectKind {
    /// Advances growth time by a fraction of the current stage.
    GrowthBoost,
    /// Heavier fruit for the buff duration.
    FruitSizeBoost,
    /// Higher odds of any special colour.
    FruitColorBoost,
    /// Higher odds of two-colour fruit.
    DualColorBoost,
    /// Higher odds of three-colour fruit.
    TriColorBoost,
}

impl EffectKind {
    /// Every known effect kind.
    pub const ALL: [Self; 5] = [
        Self::GrowthBoost,
        Self::FruitSizeBoost,
        Self::FruitColorBoost,
        Self::DualColorBoost,
        Self::TriColorBoost,
    ];

    /// Parse the key the server uses for this effect.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// The key the server uses for this effect.
    pub const fn key(self) -> &'static str {
        match self {
            Self::GrowthBoost => "growth_boost",
            Self::FruitSizeBoost => "fruit_size_boost",
            Self::FruitColorBoost => "fruit_color_boost",
            Self::DualColorBoost => "dual_color_boost",
            Self::TriColorBoost => "tri_color_boost",
        }
    }

    /// Short label shown next to a running buff countdown.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::GrowthBoost => "Growth Boost",
            Self::FruitSizeBoost => "Size Boost",
            Self::FruitColorBoost => "Color Boost",
            Self::DualColorBoost => "Dual-Color",
            Self::TriColorBoost => "Tri-Color",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harvest_type_wire_names() {
        let single: Result<HarvestType, _> = serde_json::from_str("\"single_harvest\"");
        let perennial: Result<HarvestType, _> = serde_json::from_str("\"perennial\"");
        assert!(matches!(single, Ok(HarvestType::SingleHarvest)));
        assert!(matches!(perennial, Ok(HarvestType::Perennial)));
    }

    #[test]
    fn effect_kind_keys_round_trip() {
        for kind in EffectKind::ALL {
            assert_eq!(EffectKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(EffectKind::from_key("moon_dust"), None);
    }

    #[test]
    fn item_kind_matches_serde_name() {
        let json = serde_json::to_string(&ItemKind::Fertilizer).unwrap_or_default();
        assert_eq!(json, format!("\"{}\"", ItemKind::Fertilizer.as_str()));
    }
}
