use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub server: ServerConfig,
    pub query: QueryConfig,
}

/// Snapshot locations
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub validation_snapshot: PathBuf,
    pub record_snapshot: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            validation_snapshot: PathBuf::from("data/pincodes.compressed.json"),
            record_snapshot: PathBuf::from("data/pincodes.csv"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueryConfig {
    pub default_radius_km: f64,
    pub max_nearby_results: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_radius_km: crate::engine::DEFAULT_RADIUS_KM,
            max_nearby_results: 100,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
