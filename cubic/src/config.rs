//! Server settings loaded from `cubic_config.json5`.
use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use cubic_core::WorldConfig;
use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../package-content/cubic_config.json5");

/// Where the server looks for its config.
pub const CONFIG_PATH: &str = "config/cubic_config.json5";

/// Settings of the cubic server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CubicConfig {
    /// Milliseconds between world ticks.
    pub tick_interval_ms: u64,
    /// Columns prepared around the origin at startup, in every direction.
    pub spawn_radius: i32,
    /// Lowest and highest cube Y prepared at startup.
    pub spawn_cube_range: [i32; 2],
    /// Ticks between saves. Zero saves only on shutdown.
    pub save_interval_ticks: u64,
    /// Settings of the world itself.
    pub world: WorldConfig,
}

impl Default for CubicConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            spawn_radius: 4,
            spawn_cube_range: [0, 6],
            save_interval_ticks: 600,
            world: WorldConfig::default(),
        }
    }
}

impl CubicConfig {
    /// Reads the config at `path`, writing the default one first if it is missing.
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        let config_str = if path.exists() {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(path, DEFAULT_CONFIG)
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("Wrote default config to {}", path.display());
            DEFAULT_CONFIG.to_owned()
        };

        let config: Self = serde_json5::from_str(&config_str)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.validate().map_err(|err| anyhow!(err))?;
        Ok(config)
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.tick_interval_ms == 0 {
            return Err("Tick interval must be at least 1ms");
        }
        if self.spawn_radius < 0 {
            return Err("Spawn radius cannot be negative");
        }
        if self.spawn_cube_range[0] > self.spawn_cube_range[1] {
            return Err("Spawn cube range must be [lowest, highest]");
        }
        self.world.validate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bundled_config_matches_defaults() {
        let config: CubicConfig = serde_json5::from_str(DEFAULT_CONFIG).expect("valid json5");
        assert_eq!(config, CubicConfig::default());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: CubicConfig =
            serde_json5::from_str("{ tick_interval_ms: 25, world: { sea_level: 10 } }")
                .expect("valid json5");
        assert_eq!(config.tick_interval_ms, 25);
        assert_eq!(config.world.sea_level, 10);
        assert_eq!(config.spawn_radius, 4);
        assert!(config.world.has_sky);
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let config = CubicConfig {
            tick_interval_ms: 0,
            ..CubicConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
