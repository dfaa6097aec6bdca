//! Configuration loading and typed config structures for the Orchard engine.
//!
//! The canonical configuration lives in `orchard-config.yaml` next to the
//! client binary. Every field has a default matching the live game, so an
//! absent file or an empty document yields a working engine.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but makes no sense for the engine.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Game server location.
    #[serde(default)]
    pub server: ServerConfig,

    /// Sync and display tick intervals.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Board dimensions.
    #[serde(default)]
    pub board: BoardConfig,

    /// Fruit scatter parameters.
    #[serde(default)]
    pub placement: PlacementConfig,

    /// Visual scale parameters.
    #[serde(default)]
    pub display: DisplayConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    ///
    /// Environment overrides are applied after parsing:
    /// - `ORCHARD_SERVER_URL` overrides `server.base_url`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.server.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.sync_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timing.sync_interval_ms",
                reason: "must be positive".to_owned(),
            });
        }
        if self.timing.display_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timing.display_interval_ms",
                reason: "must be positive".to_owned(),
            });
        }
        if self.placement.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "placement.max_attempts",
                reason: "at least one candidate must be sampled".to_owned(),
            });
        }
        if !self.placement.min_distance.is_finite() || self.placement.min_distance < 0.0 {
            return Err(ConfigError::Invalid {
                field: "placement.min_distance",
                reason: format!("{} is not a usable distance", self.placement.min_distance),
            });
        }
        if self.display.fruit_base_weight <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "display.fruit_base_weight",
                reason: "must be positive".to_owned(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Game server location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Base URL the API paths are joined onto.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl ServerConfig {
    /// Override the server URL with `ORCHARD_SERVER_URL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ORCHARD_SERVER_URL") {
            self.base_url = val;
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Tick intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Milliseconds between snapshot pulls.
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,

    /// Milliseconds between display-only refreshes.
    #[serde(default = "default_display_interval_ms")]
    pub display_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sync_interval_ms: default_sync_interval_ms(),
            display_interval_ms: default_display_interval_ms(),
        }
    }
}

/// Board dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BoardConfig {
    /// Number of plot positions shown, owned or locked.
    #[serde(default = "default_plot_count")]
    pub plot_count: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            plot_count: default_plot_count(),
        }
    }
}

/// A rectangular scatter region, in percent of the parent surface.
///
/// Candidates are drawn as `min + random * span` on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScatterRange {
    /// Lowest `top` value.
    pub top_min: f64,
    /// Width of the `top` interval.
    pub top_span: f64,
    /// Lowest `left` value.
    pub left_min: f64,
    /// Width of the `left` interval.
    pub left_span: f64,
}

impl ScatterRange {
    /// Build a range from its four bounds.
    pub const fn new(top_min: f64, top_span: f64, left_min: f64, left_span: f64) -> Self {
        Self {
            top_min,
            top_span,
            left_min,
            left_span,
        }
    }
}

/// Fruit scatter parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlacementConfig {
    /// Minimum distance between two fruits on the same plot, in percentage
    /// points.
    #[serde(default = "default_min_distance")]
    pub min_distance: f64,

    /// Candidates sampled before overlap is accepted.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed RNG seed for reproducible layouts; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Region used for plant types without an entry in `ranges`.
    #[serde(default = "default_scatter_range")]
    pub default_range: ScatterRange,

    /// Per plant name (lowercase) scatter regions.
    #[serde(default = "default_ranges")]
    pub ranges: BTreeMap<String, ScatterRange>,
}

impl PlacementConfig {
    /// Scatter region for a plant name, falling back to the default region.
    pub fn range_for(&self, plant_name: &str) -> ScatterRange {
        self.ranges
            .get(&plant_name.to_lowercase())
            .copied()
            .unwrap_or(self.default_range)
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            min_distance: default_min_distance(),
            max_attempts: default_max_attempts(),
            seed: None,
            default_range: default_scatter_range(),
            ranges: default_ranges(),
        }
    }
}

/// Linear scale with clamps applied to a weight ratio.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScaleRule {
    /// Multiplier applied to the ratio.
    pub factor: f64,
    /// Smallest scale.
    pub min: f64,
    /// Largest scale.
    pub max: f64,
}

/// Visual scale parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DisplayConfig {
    /// Weight that maps to a ratio of 1.0.
    #[serde(default = "default_fruit_base_weight")]
    pub fruit_base_weight: f64,

    /// Scale of the single anchored fruit on single-harvest plants.
    #[serde(default = "default_single_harvest_scale")]
    pub single_harvest_scale: ScaleRule,

    /// Scale of scattered fruit on perennial plants.
    #[serde(default = "default_perennial_scale")]
    pub perennial_scale: ScaleRule,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fruit_base_weight: default_fruit_base_weight(),
            single_harvest_scale: default_single_harvest_scale(),
            perennial_scale: default_perennial_scale(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_owned()
}

const fn default_sync_interval_ms() -> u64 {
    5000
}

const fn default_display_interval_ms() -> u64 {
    1000
}

const fn default_plot_count() -> u32 {
    4
}

const fn default_min_distance() -> f64 {
    15.0
}

const fn default_max_attempts() -> u32 {
    50
}

const fn default_scatter_range() -> ScatterRange {
    ScatterRange::new(20.0, 40.0, 15.0, 70.0)
}

fn default_ranges() -> BTreeMap<String, ScatterRange> {
    BTreeMap::from([
        ("mango".to_owned(), ScatterRange::new(15.0, 40.0, 20.0, 40.0)),
        ("coconut".to_owned(), ScatterRange::new(10.0, 20.0, 20.0, 40.0)),
        ("banana".to_owned(), ScatterRange::new(20.0, 20.0, 20.0, 40.0)),
    ])
}

const fn default_fruit_base_weight() -> f64 {
    25.0
}

const fn default_single_harvest_scale() -> ScaleRule {
    ScaleRule {
        factor: 1.2,
        min: 1.5,
        max: 4.5,
    }
}

const fn default_perennial_scale() -> ScaleRule {
    ScaleRule {
        factor: 0.6,
        min: 1.0,
        max: 3.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_live_game() {
        let config = EngineConfig::default();
        assert_eq!(config.timing.sync_interval_ms, 5000);
        assert_eq!(config.timing.display_interval_ms, 1000);
        assert_eq!(config.board.plot_count, 4);
        assert_eq!(config.placement.max_attempts, 50);
        assert!((config.placement.min_distance - 15.0).abs() < f64::EPSILON);
        assert_eq!(config.placement.ranges.len(), 3);
    }

    #[test]
    fn empty_document_is_default() {
        let config = EngineConfig::parse("   \n");
        assert!(config.is_ok_and(|c| c == EngineConfig::default()));
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
timing:
  sync_interval_ms: 2000
placement:
  seed: 7
  ranges:
    cherry:
      top_min: 5.0
      top_span: 10.0
      left_min: 5.0
      left_span: 10.0
";
        let config = EngineConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.unwrap_or_default();
        assert_eq!(config.timing.sync_interval_ms, 2000);
        assert_eq!(config.timing.display_interval_ms, 1000);
        assert_eq!(config.placement.seed, Some(7));
        assert_eq!(
            config.placement.range_for("Cherry"),
            ScatterRange::new(5.0, 10.0, 5.0, 10.0)
        );
        // Supplying `ranges` replaces the built-in table.
        assert_eq!(
            config.placement.range_for("Mango"),
            config.placement.default_range
        );
    }

    #[test]
    fn range_lookup_is_case_insensitive_with_fallback() {
        let placement = PlacementConfig::default();
        assert_eq!(
            placement.range_for("Coconut"),
            ScatterRange::new(10.0, 20.0, 20.0, 40.0)
        );
        assert_eq!(placement.range_for("Durian"), default_scatter_range());
    }

    #[test]
    fn zero_attempts_rejected() {
        let result = EngineConfig::parse("placement:\n  max_attempts: 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "placement.max_attempts",
                ..
            })
        ));
    }

    #[test]
    fn shipped_sample_matches_defaults() {
        let sample = include_str!("../../../orchard-config.yaml");
        assert_eq!(EngineConfig::parse(sample).unwrap(), EngineConfig::default());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = EngineConfig::parse("timing: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
