//! Display descriptors for harvested fruit in the inventory.

use orchard_types::{Fruit, FruitId, Snapshot};

use crate::pricing::PricingEngine;
use crate::profile::weather_icon;
use crate::weather::WeatherResolver;

/// One sellable fruit as the inventory list shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryFruitView {
    /// Fruit id, used for sell selections.
    pub id: FruitId,
    /// `"<colour> <plant>"`, e.g. `"Golden Mango"`.
    pub label: String,
    /// Weight in kilograms.
    pub weight: f64,
    /// Sale value, `None` when the fruit cannot be priced.
    pub value: Option<i64>,
    /// Sprite asset path.
    pub image: Option<String>,
    /// Resolved weather name.
    pub weather: Option<String>,
    /// Weather badge asset path.
    pub weather_icon: Option<String>,
}

/// Describe every inventory fruit in snapshot order.
pub fn describe_inventory(snapshot: &Snapshot) -> Vec<InventoryFruitView> {
    let pricing = PricingEngine::new(&snapshot.game_data);
    let resolver = WeatherResolver::new(&snapshot.game_data);
    snapshot
        .inventory_fruits
        .iter()
        .map(|fruit| describe(fruit, snapshot, pricing, resolver))
        .collect()
}

fn describe(
    fruit: &Fruit,
    snapshot: &Snapshot,
    pricing: PricingEngine<'_>,
    resolver: WeatherResolver<'_>,
) -> InventoryFruitView {
    let fruit_type = snapshot.game_data.fruit(fruit.fruit_type_id);
    let plant = fruit_type.and_then(|ft| snapshot.game_data.plant(ft.plant_type_id));

    // The server joins these in; the catalog is the fallback.
    let color = fruit
        .color_name
        .clone()
        .or_else(|| fruit_type.map(|ft| ft.color_name.clone()))
        .unwrap_or_default();
    let plant_name = fruit
        .plant_name
        .clone()
        .or_else(|| plant.map(|p| p.name.clone()))
        .unwrap_or_default();
    let prefix = fruit
        .image_prefix
        .clone()
        .or_else(|| plant.map(|p| p.image_prefix.clone()));
    let suffix = fruit
        .image_suffix
        .clone()
        .or_else(|| fruit_type.map(|ft| ft.image_suffix.clone()));

    let resolved = fruit
        .effect_ids()
        .ok()
        .and_then(|ids| resolver.resolve(&ids));

    InventoryFruitView {
        id: fruit.id,
        label: format!("{color} {plant_name}").trim().to_owned(),
        weight: fruit.weight,
        value: pricing.value(fruit).ok(),
        image: prefix
            .zip(suffix)
            .map(|(prefix, suffix)| format!("fruits/{prefix}_{suffix}.png")),
        weather_icon: resolved.as_ref().map(|w| weather_icon(&w.icon)),
        weather: resolved.map(|w| w.name),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use orchard_types::{
        FruitType, FruitTypeId, GameCatalog, HarvestType, PlantType, PlantTypeId, WeatherType,
        WeatherTypeId,
    };

    use super::*;

    fn snapshot() -> Snapshot {
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
            price_multiplier: 1.0,
        };
        let rain = WeatherType {
            id: WeatherTypeId(3),
            name: "Rain".to_owned(),
            display_icon_filename: "rain.png".to_owned(),
            price_multiplier: Some(2.0),
            spawn_rate: 0.2,
            stick_rate: 0.5,
        };
        let fruit = Fruit {
            id: FruitId(7),
            plot_id: None,
            fruit_type_id: FruitTypeId(4),
            weight: 3.0,
            created_at: None,
            weather_effects: Some(r#"[{"weather_id": 3}]"#.to_owned()),
            color_name: None,
            image_suffix: None,
            image_prefix: None,
            plant_name: None,
        };
        Snapshot {
            inventory_fruits: vec![fruit],
            game_data: GameCatalog {
                plant_types: BTreeMap::from([(plant.id, plant)]),
                fruit_types: BTreeMap::from([(fruit_type.id, fruit_type)]),
                weather_types: BTreeMap::from([(rain.id, rain)]),
                ..GameCatalog::default()
            },
            ..Snapshot::default()
        }
    }

    #[test]
    fn describes_from_catalog_when_not_joined() {
        let views = describe_inventory(&snapshot());
        assert_eq!(views.len(), 1);
        let view = views.first();
        assert_eq!(view.map(|v| v.label.as_str()), Some("Golden Mango"));
        assert_eq!(view.and_then(|v| v.value), Some(60));
        assert_eq!(
            view.and_then(|v| v.image.as_deref()),
            Some("fruits/mango_gold.png")
        );
        assert_eq!(view.and_then(|v| v.weather.as_deref()), Some("Rain"));
    }
}
