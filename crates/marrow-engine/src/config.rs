//! Engine configuration.
//!
//! Provides the grower, cycle choices, simulation and storage settings for
//! the headless runner. Configuration is loaded from and saved to a TOML
//! file; grow-cycle tuning lives in its `[grow]` table.

use marrow_gameplay::GrowConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "marrow.toml";

/// Speeds the session accepts.
const VALID_SPEEDS: [u32; 4] = [1, 2, 3, 10];

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Grower ===
    /// Grower name; records and lives are keyed by it
    pub grower: String,

    // === Cycle ===
    /// Seed key (None = first of the offered options)
    pub seed: Option<String>,
    /// Soil key
    pub soil: String,
    /// Watering frequency for every stage (0 = never water or feed)
    pub water_times: u32,
    /// Nutrient mix key for scheduled feedings (None = water only)
    pub nutrient_mix: Option<String>,

    // === Simulation ===
    /// RNG seed (None = random)
    pub rng_seed: Option<u64>,
    /// Game speed multiplier (1, 2, 3 or 10)
    pub speed: u32,
    /// Wait on the wall clock instead of fast-forwarding
    pub realtime: bool,
    /// Keep the light on the optimal level
    pub track_light: bool,
    /// Search for seeds after harvest
    pub look_for_seeds: bool,

    // === Storage ===
    /// Score book path (None = platform data directory)
    pub score_book: Option<PathBuf>,
    /// Rows printed per leaderboard
    pub leaderboard_size: usize,

    // === Tuning ===
    /// Grow-cycle tuning
    pub grow: GrowConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Grower
            grower: "Grower".to_string(),

            // Cycle
            seed: None,
            soil: "graveblend".to_string(),
            water_times: 2,
            nutrient_mix: Some("basic".to_string()),

            // Simulation
            rng_seed: None,
            speed: 1,
            realtime: false,
            track_light: true,
            look_for_seeds: true,

            // Storage
            score_book: None,
            leaderboard_size: 5,

            // Tuning
            grow: GrowConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from(CONFIG_FILE),
            |dir| dir.join("marrow").join(CONFIG_FILE),
        )
    }

    /// Score book location, falling back to the platform data directory.
    #[must_use]
    pub fn score_book_path(&self) -> PathBuf {
        self.score_book.clone().unwrap_or_else(|| {
            dirs::data_dir().map_or_else(
                || PathBuf::from("scores.json"),
                |dir| dir.join("marrow").join("scores.json"),
            )
        })
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        if !VALID_SPEEDS.contains(&self.speed) {
            warn!("Unsupported speed {}x, using 1x", self.speed);
            self.speed = 1;
        }
        self.water_times = self.water_times.min(10);
        self.leaderboard_size = self.leaderboard_size.clamp(1, 50);
        self.grow.validate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marrow_gameplay::HarvestPolicy;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.grower, "Grower");
        assert_eq!(config.speed, 1);
        assert!(!config.realtime);
        assert_eq!(config.grow, GrowConfig::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();
        config.speed = 4;
        config.leaderboard_size = 0;
        config.grow.pest_chance = 3.0;

        config.validate();

        assert_eq!(config.speed, 1);
        assert_eq!(config.leaderboard_size, 1);
        assert!((config.grow.pest_chance - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("marrow.toml");

        let mut config = EngineConfig::default();
        config.grower = "Morticia".to_string();
        config.rng_seed = Some(12345);
        config.grow.harvest_policy = HarvestPolicy::Window { hours: 12 };

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_grow_table() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("marrow.toml");
        fs::write(
            &config_path,
            "grower = \"Gomez\"\nspeed = 10\n\n[grow]\nbase_drain_rate = 3.0\n",
        )
        .expect("write config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.grower, "Gomez");
        assert_eq!(loaded.speed, 10);
        assert!((loaded.grow.base_drain_rate - 3.0).abs() < f64::EPSILON);
        assert_eq!(loaded.grow.starting_lives, 3);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = EngineConfig::load_from("/nonexistent/path/marrow.toml");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("marrow.toml");
        fs::write(&config_path, "speed = \"fast\"").expect("write config");
        assert_eq!(EngineConfig::load_from(&config_path), EngineConfig::default());
    }
}
