//! Configuration resolution: file, then command-line overrides, then validation.
//!
//! Validation runs once on the merged result, so an override can replace a
//! bad value from the file.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::DemoConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values given on the command line. They win over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub rpc_url: Option<String>,
    pub wallet_keypair: Option<String>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut DemoConfig) {
        if let Some(url) = &self.rpc_url {
            tracing::debug!(rpc_url = %url, "RPC endpoint overridden");
            config.ledger.rpc_url = url.clone();
        }
        if let Some(path) = &self.wallet_keypair {
            config.wallet.keypair_path = Some(path.clone());
        }
    }
}

/// Read and deserialize a TOML file. No semantic checks.
pub fn load_config(path: &Path) -> Result<DemoConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Build the effective configuration: defaults or `path`, then `overrides`,
/// then validation of the merged result.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<DemoConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => DemoConfig::default(),
    };
    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
