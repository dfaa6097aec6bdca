//! Resolution of weather effect sets to a single display record.
//!
//! A fruit carries the set of weather ids that stuck to it at spawn time.
//! One id resolves to that weather type; two or more resolve only to a
//! registered combination whose member set is exactly equal to the input.
//! Anything else shows no weather. Lookups are pure and never fail.

use std::collections::BTreeSet;

use orchard_types::{GameCatalog, WeatherTypeId};

/// Display metadata for a resolved weather effect.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherDisplay {
    /// Weather or combination name.
    pub name: String,
    /// Icon file.
    pub icon: String,
    /// Sale multiplier, 1.0 when the catalog gives none.
    pub multiplier: f64,
}

/// Pure lookup from effect sets to [`WeatherDisplay`] records.
#[derive(Debug, Clone, Copy)]
pub struct WeatherResolver<'a> {
    catalog: &'a GameCatalog,
}

impl<'a> WeatherResolver<'a> {
    /// Resolver backed by a snapshot's catalog.
    pub const fn new(catalog: &'a GameCatalog) -> Self {
        Self { catalog }
    }

    /// Resolve an effect set. Order and duplicates are ignored.
    pub fn resolve(&self, ids: &[WeatherTypeId]) -> Option<WeatherDisplay> {
        let set: BTreeSet<WeatherTypeId> = ids.iter().copied().collect();
        let mut members = set.iter();
        match (members.next(), members.next()) {
            (None, _) => None,
            (Some(only), None) => self.catalog.weather(*only).map(|weather| WeatherDisplay {
                name: weather.name.clone(),
                icon: weather.display_icon_filename.clone(),
                multiplier: weather.price_multiplier.unwrap_or(1.0),
            }),
            (Some(_), Some(_)) => self
                .catalog
                .weather_combinations
                .values()
                .find(|combo| {
                    combo.weather_type_ids.iter().copied().collect::<BTreeSet<_>>() == set
                })
                .map(|combo| WeatherDisplay {
                    name: combo.name.clone(),
                    icon: combo.display_icon_filename.clone(),
                    multiplier: combo.price_multiplier.unwrap_or(1.0),
                }),
        }
    }

    /// Sale multiplier for an effect set; 1.0 when nothing resolves.
    pub fn multiplier(&self, ids: &[WeatherTypeId]) -> f64 {
        self.resolve(ids).map_or(1.0, |display| display.multiplier)
    }
}

/// Header label for the weather active across the world.
pub fn global_weather_label(active: &[orchard_types::WeatherType]) -> String {
    if active.is_empty() {
        return "Clear".to_owned();
    }
    active
        .iter()
        .map(|weather| weather.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use orchard_types::{WeatherComboId, WeatherCombination, WeatherType};

    use super::*;

    fn weather(id: i64, name: &str, multiplier: Option<f64>) -> WeatherType {
        WeatherType {
            id: WeatherTypeId(id),
            name: name.to_owned(),
            display_icon_filename: format!("{}.png", name.to_lowercase()),
            price_multiplier: multiplier,
            spawn_rate: 0.1,
            stick_rate: 0.1,
        }
    }

    fn catalog() -> GameCatalog {
        let weather_types = [
            weather(2, "Wind", Some(1.2)),
            weather(3, "Rain", Some(1.5)),
            weather(5, "Snow", None),
            weather(9, "Sun", Some(2.0)),
        ]
        .into_iter()
        .map(|w| (w.id, w))
        .collect();
        let combo = WeatherCombination {
            id: WeatherComboId(1),
            name: "Blizzard".to_owned(),
            weather_type_ids: vec![WeatherTypeId(9), WeatherTypeId(5), WeatherTypeId(2)],
            display_icon_filename: "blizzard.png".to_owned(),
            price_multiplier: Some(4.0),
        };
        GameCatalog {
            weather_types,
            weather_combinations: BTreeMap::from([(combo.id, combo)]),
            ..GameCatalog::default()
        }
    }

    fn ids(raw: &[i64]) -> Vec<WeatherTypeId> {
        raw.iter().copied().map(WeatherTypeId).collect()
    }

    #[test]
    fn empty_set_resolves_to_none() {
        let catalog = catalog();
        assert_eq!(WeatherResolver::new(&catalog).resolve(&[]), None);
    }

    #[test]
    fn singleton_resolves_to_weather_type() {
        let catalog = catalog();
        let resolved = WeatherResolver::new(&catalog).resolve(&ids(&[3]));
        assert_eq!(resolved.map(|d| d.name), Some("Rain".to_owned()));
    }

    #[test]
    fn unknown_singleton_resolves_to_none() {
        let catalog = catalog();
        assert_eq!(WeatherResolver::new(&catalog).resolve(&ids(&[77])), None);
    }

    #[test]
    fn pair_without_exact_combination_is_none() {
        // {2, 5} is a strict subset of the registered {2, 5, 9}.
        let catalog = catalog();
        assert_eq!(WeatherResolver::new(&catalog).resolve(&ids(&[2, 5])), None);
    }

    #[test]
    fn combination_matches_as_set() {
        let catalog = catalog();
        let resolver = WeatherResolver::new(&catalog);
        let resolved = resolver.resolve(&ids(&[5, 2, 9, 5]));
        assert_eq!(resolved.as_ref().map(|d| d.name.as_str()), Some("Blizzard"));
        assert!((resolver.multiplier(&ids(&[2, 9, 5])) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_multiplier_defaults_to_one() {
        let catalog = catalog();
        let resolver = WeatherResolver::new(&catalog);
        assert!((resolver.multiplier(&ids(&[5])) - 1.0).abs() < f64::EPSILON);
        assert!((resolver.multiplier(&[]) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn global_label() {
        assert_eq!(global_weather_label(&[]), "Clear");
        let active = [weather(3, "Rain", None), weather(2, "Wind", None)];
        assert_eq!(global_weather_label(&active), "Rain, Wind");
    }
}
