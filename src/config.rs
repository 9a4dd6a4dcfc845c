//! Bridge configuration
//!
//! Defaults match the layout of the fuzzing lab checkout: the monitor and
//! its formula file live in `../ltl-parser`, monitor logs go to
//! `../monitor_logs`. A TOML file may override any field, and command line
//! flags override the file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_more::{Display, Error, From};
use serde_derive::Deserialize;

use crate::predicates::Mode;

#[derive(Debug, Display, From, Error)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
}

type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Results tree to read instead of the mode's default directory
    pub results_root: Option<PathBuf>,
    pub monitor_bin: PathBuf,
    /// Formula file passed as the monitor's only argument
    pub monitor_spec: PathBuf,
    pub log_dir: PathBuf,
    pub startup_wait_ms: u64,
    pub shutdown_grace_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> BridgeConfig {
        BridgeConfig {
            results_root: None,
            monitor_bin: PathBuf::from("../ltl-parser/formula_parser"),
            monitor_spec: PathBuf::from("../ltl-parser/dns-infra-spec.txt"),
            log_dir: PathBuf::from("../monitor_logs"),
            startup_wait_ms: 100,
            shutdown_grace_ms: 1000,
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(text: &str) -> Result<BridgeConfig> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<BridgeConfig> {
        let text = fs::read_to_string(path)?;
        let config = BridgeConfig::from_toml_str(&text)?;
        log::info!("loaded configuration from {}", path.display());

        Ok(config)
    }

    pub fn startup_wait(&self) -> Duration {
        Duration::from_millis(self.startup_wait_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Results tree for `mode`, honoring the override
    pub fn results_root_for(&self, mode: Mode) -> PathBuf {
        match self.results_root {
            Some(ref root) => root.clone(),
            None => PathBuf::from(mode.results_dir()),
        }
    }
}
