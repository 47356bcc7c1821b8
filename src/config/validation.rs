//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the RPC URL and commitment level
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DemoConfig → Result<(), Vec<ValidationError>>

use std::str::FromStr;

use solana_sdk::commitment_config::CommitmentConfig;
use thiserror::Error;

use crate::config::schema::DemoConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ledger.rpc_url '{0}' is not a valid http(s) URL")]
    InvalidRpcUrl(String),

    #[error("ledger.commitment '{0}' is not a known commitment level")]
    InvalidCommitment(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("wallet.install_url '{0}' is not a valid URL")]
    InvalidInstallUrl(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &DemoConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.ledger.rpc_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidRpcUrl(config.ledger.rpc_url.clone())),
    }

    if CommitmentConfig::from_str(&config.ledger.commitment).is_err() {
        errors.push(ValidationError::InvalidCommitment(
            config.ledger.commitment.clone(),
        ));
    }

    if config.ledger.rpc_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("ledger.rpc_timeout_secs"));
    }

    if config.ledger.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroValue("ledger.poll_interval_ms"));
    }

    if url::Url::parse(&config.wallet.install_url).is_err() {
        errors.push(ValidationError::InvalidInstallUrl(
            config.wallet.install_url.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
