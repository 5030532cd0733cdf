//! Settings for the CLI, read from `~/.bizdash/config.toml` and `BIZDASH_*`
//! environment variables. Nested keys use `__` in the environment, e.g.
//! `BIZDASH_REPORT__LOW_MARGIN_THRESHOLD=20`.

use crate::services::{AggregatorOptions, OfflineOptions};
use crate::types::Result;
use directories::BaseDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "BIZDASH";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding transactions.json, services.json and clients.json
    pub data_dir: PathBuf,
    /// Offline cache directory; defaults to ~/.bizdash/offline
    pub cache_dir: Option<PathBuf>,
    /// Origin the offline cache fetches from
    pub origin: String,
    pub report: AggregatorOptions,
    pub offline: OfflineOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_dir: None,
            origin: "http://127.0.0.1:5173".to_string(),
            report: AggregatorOptions::default(),
            offline: OfflineOptions::default(),
        }
    }
}

impl Settings {
    /// Load settings. An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(p) => {
                builder = builder.add_source(config::File::from(p).required(true));
            }
            None => {
                if let Some(p) = default_config_path() {
                    builder = builder.add_source(config::File::from(p).required(false));
                }
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(".bizdash").join("config.toml"))
}
