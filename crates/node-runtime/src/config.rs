//! # Runtime Configuration
//!
//! Defaults for a development node, overridden from `QC_RELAY_*` environment
//! variables.
//!
//! | Variable | Format | Default |
//! |----------|--------|---------|
//! | `QC_RELAY_SIGNER_KEY` | 32 bytes hex | development key |
//! | `QC_RELAY_SIGNER` | 20 bytes hex | address of the signer key |
//! | `QC_RELAY_ADMIN` | 20 bytes hex | development admin |
//! | `QC_RELAY_SHARD_INTERVAL` | decimal | 6000 |
//! | `QC_RELAY_COMPENSATION_PERIOD` | decimal | 100 |
//! | `QC_RELAY_WITHDRAWAL_PERIOD` | decimal | 600 |

use qc_18_relay_accountability::{AccountabilityConfig, Address, ConfigError, Timestamp};
use shared_crypto::{CryptoError, Secp256k1KeyPair};
use thiserror::Error;
use tracing::{info, warn};

/// Secret key of the receipt signer.
pub const ENV_SIGNER_KEY: &str = "QC_RELAY_SIGNER_KEY";
/// Address receipts must recover to.
pub const ENV_SIGNER: &str = "QC_RELAY_SIGNER";
/// Escrow administrator.
pub const ENV_ADMIN: &str = "QC_RELAY_ADMIN";
/// Evidence shard interval.
pub const ENV_SHARD_INTERVAL: &str = "QC_RELAY_SHARD_INTERVAL";
/// Relayer grace period for pending claims.
pub const ENV_COMPENSATION_PERIOD: &str = "QC_RELAY_COMPENSATION_PERIOD";
/// Escrow withdrawal delay.
pub const ENV_WITHDRAWAL_PERIOD: &str = "QC_RELAY_WITHDRAWAL_PERIOD";

/// Signer key used when none is configured. Never use outside development.
pub const DEV_SIGNER_KEY: [u8; 32] = [0x5Eu8; 32];

/// Complete runtime configuration.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Subsystem parameters.
    pub accountability: AccountabilityConfig,
    /// Secret key of the receipt signer (32 bytes).
    pub signer_key: [u8; 32],
    /// Evidence registry address.
    pub registry_address: Address,
    /// Adjudicator address.
    pub adjudicator_address: Address,
    /// Escrow address.
    pub escrow_address: Address,
    /// Escrow administrator.
    pub admin: Address,
    /// Block height the node starts at.
    pub genesis_height: Timestamp,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            accountability: AccountabilityConfig::default(),
            signer_key: DEV_SIGNER_KEY,
            registry_address: [0xE1u8; 20],
            adjudicator_address: [0xAD; 20],
            escrow_address: [0xE5; 20],
            admin: [0xA1; 20],
            genesis_height: 1,
        }
    }
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("accountability", &self.accountability)
            .field("signer_key", &"<redacted>")
            .field("registry_address", &hex::encode(self.registry_address))
            .field("adjudicator_address", &hex::encode(self.adjudicator_address))
            .field("escrow_address", &hex::encode(self.escrow_address))
            .field("admin", &hex::encode(self.admin))
            .field("genesis_height", &self.genesis_height)
            .finish()
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum RuntimeConfigError {
    /// Value is not hex of the expected length.
    #[error("{var} must be {expected} bytes of hex")]
    InvalidHex {
        /// Variable name
        var: &'static str,
        /// Expected byte length
        expected: usize,
    },
    /// Value is not a decimal integer.
    #[error("{var} must be a decimal integer, got {value:?}")]
    InvalidNumber {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },
    /// Signer key is not a valid secp256k1 scalar.
    #[error("Invalid signer key: {0}")]
    InvalidKey(#[from] CryptoError),
    /// Resulting subsystem configuration is invalid.
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<RuntimeConfig, RuntimeConfigError> {
    load_config_from(|var| std::env::var(var).ok())
}

/// Load configuration, reading overrides through `lookup`.
pub fn load_config_from<F>(lookup: F) -> Result<RuntimeConfig, RuntimeConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = RuntimeConfig::default();

    match lookup(ENV_SIGNER_KEY) {
        Some(value) => {
            config.signer_key = parse_hex(ENV_SIGNER_KEY, &value)?;
            info!("Loaded receipt signer key from environment");
        }
        None => warn!("{} not set, using development signer key", ENV_SIGNER_KEY),
    }
    let key_address = Secp256k1KeyPair::from_bytes(config.signer_key)?.address();

    config.accountability.receipt_signer = match lookup(ENV_SIGNER) {
        Some(value) => parse_hex(ENV_SIGNER, &value)?,
        None => key_address,
    };
    if config.accountability.receipt_signer != key_address {
        warn!(
            "{} does not match {}; receipts signed by this node will be rejected",
            ENV_SIGNER, ENV_SIGNER_KEY
        );
    }

    if let Some(value) = lookup(ENV_ADMIN) {
        config.admin = parse_hex(ENV_ADMIN, &value)?;
    }
    if let Some(value) = lookup(ENV_SHARD_INTERVAL) {
        config.accountability.shard_interval = parse_number(ENV_SHARD_INTERVAL, value)?;
    }
    if let Some(value) = lookup(ENV_COMPENSATION_PERIOD) {
        config.accountability.compensation_period = parse_number(ENV_COMPENSATION_PERIOD, value)?;
    }
    if let Some(value) = lookup(ENV_WITHDRAWAL_PERIOD) {
        config.accountability.withdrawal_period = parse_number(ENV_WITHDRAWAL_PERIOD, value)?;
    }

    config.accountability.validate()?;
    Ok(config)
}

fn parse_hex<const N: usize>(var: &'static str, value: &str) -> Result<[u8; N], RuntimeConfigError> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(digits)
        .ok()
        .and_then(|bytes| <[u8; N]>::try_from(bytes).ok())
        .ok_or(RuntimeConfigError::InvalidHex { var, expected: N })
}

fn parse_number(var: &'static str, value: String) -> Result<Timestamp, RuntimeConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| RuntimeConfigError::InvalidNumber { var, value })
}
