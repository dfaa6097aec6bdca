//! Sale value of harvested fruit.
//!
//! `value = round(base_price * weight * fruit_multiplier * weather_multiplier)`
//!
//! The product is formed in `f64`, exactly as the server forms it, and then
//! rounded half-to-even on its exact binary value through [`Decimal`]. An
//! aggregate sale sums the individually rounded values.

use orchard_types::{Fruit, FruitId, FruitTypeId, GameCatalog, PlantTypeId, Snapshot};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::weather::WeatherResolver;

/// Errors raised while pricing a fruit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// The fruit references a fruit type missing from the catalog.
    #[error("unknown fruit type {fruit_type_id}")]
    UnknownFruitType {
        /// The unresolved reference.
        fruit_type_id: FruitTypeId,
    },

    /// The fruit type references a plant type missing from the catalog.
    #[error("unknown plant type {plant_type_id}")]
    UnknownPlantType {
        /// The unresolved reference.
        plant_type_id: PlantTypeId,
    },

    /// The recorded weather effects could not be decoded.
    #[error("unreadable weather effects on fruit {fruit_id}: {reason}")]
    MalformedEffects {
        /// The fruit carrying them.
        fruit_id: FruitId,
        /// Decoder message.
        reason: String,
    },

    /// The product is not a finite number that fits a balance.
    #[error("price out of range: {product}")]
    OutOfRange {
        /// Rendered product.
        product: String,
    },
}

/// Round a raw price product half-to-even.
///
/// # Errors
///
/// Returns [`PricingError::OutOfRange`] for non-finite or huge products.
pub fn round_price(product: f64) -> Result<Decimal, PricingError> {
    Decimal::from_f64_retain(product)
        .map(|exact| exact.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven))
        .ok_or_else(|| PricingError::OutOfRange {
            product: product.to_string(),
        })
}

/// Aggregate price of a selection of inventory fruit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleQuote {
    /// Sum of the individually rounded values.
    pub total: i64,
    /// Each priced fruit with its value, in selection order.
    pub priced: Vec<(FruitId, i64)>,
    /// Fruits left out because they are unknown or unpriceable.
    pub skipped: Vec<FruitId>,
}

/// Prices fruit against a snapshot's catalog.
#[derive(Debug, Clone, Copy)]
pub struct PricingEngine<'a> {
    catalog: &'a GameCatalog,
}

impl<'a> PricingEngine<'a> {
    /// Engine backed by a catalog.
    pub const fn new(catalog: &'a GameCatalog) -> Self {
        Self { catalog }
    }

    /// Rounded value of one fruit as a decimal.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError`] when a catalog reference is unresolved, the
    /// weather effects are unreadable, or the value is out of range.
    pub fn exact_value(&self, fruit: &Fruit) -> Result<Decimal, PricingError> {
        let fruit_type =
            self.catalog
                .fruit(fruit.fruit_type_id)
                .ok_or(PricingError::UnknownFruitType {
                    fruit_type_id: fruit.fruit_type_id,
                })?;
        let plant = self
            .catalog
            .plant(fruit_type.plant_type_id)
            .ok_or(PricingError::UnknownPlantType {
                plant_type_id: fruit_type.plant_type_id,
            })?;
        let effects = fruit
            .effect_ids()
            .map_err(|e| PricingError::MalformedEffects {
                fruit_id: fruit.id,
                reason: e.to_string(),
            })?;
        let weather = WeatherResolver::new(self.catalog).multiplier(&effects);
        round_price(plant.base_price * fruit.weight * fruit_type.price_multiplier * weather)
    }

    /// Rounded value of one fruit.
    ///
    /// # Errors
    ///
    /// See [`PricingEngine::exact_value`].
    pub fn value(&self, fruit: &Fruit) -> Result<i64, PricingError> {
        let exact = self.exact_value(fruit)?;
        exact.to_i64().ok_or_else(|| PricingError::OutOfRange {
            product: exact.to_string(),
        })
    }

    /// Quote a sale of the given fruit.
    pub fn quote<'f>(&self, fruits: impl IntoIterator<Item = &'f Fruit>) -> SaleQuote {
        let mut quote = SaleQuote::default();
        for fruit in fruits {
            match self.value(fruit) {
                Ok(value) => {
                    quote.total = quote.total.saturating_add(value);
                    quote.priced.push((fruit.id, value));
                }
                Err(e) => {
                    tracing::warn!(fruit_id = %fruit.id, error = %e, "fruit left out of sale quote");
                    quote.skipped.push(fruit.id);
                }
            }
        }
        quote
    }

    /// Quote a sale of inventory fruit by id; ids not in the inventory are
    /// skipped.
    pub fn quote_selection(snapshot: &Snapshot, ids: &[FruitId]) -> SaleQuote {
        let engine = PricingEngine::new(&snapshot.game_data);
        let mut missing = Vec::new();
        let mut quote = engine.quote(ids.iter().filter_map(|id| {
            let found = snapshot.inventory_fruit(*id);
            if found.is_none() {
                missing.push(*id);
            }
            found
        }));
        quote.skipped.extend(missing);
        quote
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use orchard_types::{FruitType, HarvestType, PlantType, WeatherType, WeatherTypeId};
    use rust_decimal_macros::dec;

    use super::*;

    fn catalog() -> GameCatalog {
        let plant = PlantType {
            id: PlantTypeId(1),
            name: "Mango".to_owned(),
            seed_price: 100,
            base_price: 10.0,
            max_growth_stage: 20,
            growth_time_per_stage_seconds: 600.0,
            harvest_type: HarvestType::Perennial,
            image_prefix: "mango".to_owned(),
        };
        let fruit_type = FruitType {
            id: FruitTypeId(4),
            plant_type_id: PlantTypeId(1),
            color_name: "Golden".to_owned(),
            image_suffix: "gold".to_owned(),
            rarity_rate: 0.1,
            price_multiplier: 1.2,
        };
        let orphan = FruitType {
            id: FruitTypeId(5),
            plant_type_id: PlantTypeId(99),
            ..fruit_type.clone()
        };
        let rain = WeatherType {
            id: WeatherTypeId(3),
            name: "Rain".to_owned(),
            display_icon_filename: "rain.png".to_owned(),
            price_multiplier: Some(1.5),
            spawn_rate: 0.2,
            stick_rate: 0.5,
        };
        GameCatalog {
            plant_types: BTreeMap::from([(plant.id, plant)]),
            fruit_types: BTreeMap::from([(fruit_type.id, fruit_type), (orphan.id, orphan)]),
            weather_types: BTreeMap::from([(rain.id, rain)]),
            ..GameCatalog::default()
        }
    }

    fn fruit(id: i64, fruit_type: i64, weight: f64, effects: Option<&str>) -> Fruit {
        Fruit {
            id: FruitId(id),
            plot_id: None,
            fruit_type_id: FruitTypeId(fruit_type),
            weight,
            created_at: None,
            weather_effects: effects.map(str::to_owned),
            color_name: None,
            image_suffix: None,
            image_prefix: None,
            plant_name: None,
        }
    }

    #[test]
    fn value_combines_all_multipliers() {
        let catalog = catalog();
        let engine = PricingEngine::new(&catalog);
        let rainy = fruit(1, 4, 2.5, Some(r#"[{"weather_id": 3}]"#));
        assert_eq!(engine.exact_value(&rainy), Ok(dec!(45)));
        assert_eq!(engine.value(&rainy), Ok(45));
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round_price(2.5), Ok(dec!(2)));
        assert_eq!(round_price(3.5), Ok(dec!(4)));
        assert_eq!(round_price(44.6), Ok(dec!(45)));
        assert!(round_price(f64::INFINITY).is_err());
    }

    #[test]
    fn quote_rounds_per_fruit() {
        // 10 * 0.125 * 1.2 = 1.5 -> 2 each; rounding the sum would give 3.
        let catalog = catalog();
        let engine = PricingEngine::new(&catalog);
        let small = [fruit(1, 4, 0.125, None), fruit(2, 4, 0.125, None)];
        let quote = engine.quote(&small);
        assert_eq!(quote.total, 4);
        assert_eq!(quote.priced, vec![(FruitId(1), 2), (FruitId(2), 2)]);
    }

    #[test]
    fn unresolved_fruit_is_skipped() {
        let catalog = catalog();
        let engine = PricingEngine::new(&catalog);
        let fruits = [
            fruit(1, 4, 1.0, None),
            fruit(2, 77, 1.0, None),
            fruit(3, 5, 1.0, None),
            fruit(4, 4, 1.0, Some("[oops")),
        ];
        assert_eq!(
            engine.value(&fruits[1]),
            Err(PricingError::UnknownFruitType {
                fruit_type_id: FruitTypeId(77)
            })
        );
        assert_eq!(
            engine.value(&fruits[2]),
            Err(PricingError::UnknownPlantType {
                plant_type_id: PlantTypeId(99)
            })
        );
        let quote = engine.quote(&fruits);
        assert_eq!(quote.total, 12);
        assert_eq!(quote.skipped, vec![FruitId(2), FruitId(3), FruitId(4)]);
    }

    #[test]
    fn selection_skips_ids_not_in_inventory() {
        let snapshot = Snapshot {
            inventory_fruits: vec![fruit(8, 4, 1.0, None)],
            game_data: catalog(),
            ..Snapshot::default()
        };
        let quote = PricingEngine::quote_selection(&snapshot, &[FruitId(8), FruitId(9)]);
        assert_eq!(quote.total, 12);
        assert_eq!(quote.skipped, vec![FruitId(9)]);
    }
}
