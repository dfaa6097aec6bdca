//! Type-safe identifier wrappers around server-assigned integers.
//!
//! Every entity the server hands us has a strongly-typed ID so a plot id can
//! never be passed where a fruit id is expected. The server owns id
//! allocation; the client only ever wraps values it received.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around an `i64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub i64);

        impl $name {
            /// Wrap a raw server-assigned identifier.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Return the inner integer value.
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a planting slot owned by the user.
    PlotId
}

define_id! {
    /// Unique identifier for a fruit, on a plot or in the inventory.
    FruitId
}

define_id! {
    /// Catalog identifier for a plant type.
    PlantTypeId
}

define_id! {
    /// Catalog identifier for a fruit variant of a plant type.
    FruitTypeId
}

define_id! {
    /// Catalog identifier for a fertilizer.
    FertilizerTypeId
}

define_id! {
    /// Catalog identifier for a single weather effect.
    WeatherTypeId
}

define_id! {
    /// Catalog identifier for a registered weather combination.
    WeatherComboId
}

define_id! {
    /// Unique identifier for a stack of seeds or fertilizer in the inventory.
    InventoryItemId
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&PlotId::new(7)).ok();
        assert_eq!(json.as_deref(), Some("7"));
    }

    #[test]
    fn ids_work_as_json_object_keys() {
        // Catalog maps arrive keyed by stringified ids.
        let raw = r#"{"3": "rain", "12": "sun"}"#;
        let map: BTreeMap<WeatherTypeId, String> =
            serde_json::from_str(raw).unwrap_or_default();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&WeatherTypeId(3)).map(String::as_str), Some("rain"));
    }

    #[test]
    fn id_display_matches_inner() {
        assert_eq!(FruitId::new(42).to_string(), "42");
        assert_eq!(i64::from(FruitId::from(42)), 42);
    }
}
