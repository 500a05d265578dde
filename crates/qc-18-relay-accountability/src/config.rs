//! Configuration for the Relay Accountability Subsystem

use crate::domain::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accountability configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountabilityConfig {
    /// Age at which the current evidence shard is rotated out.
    pub shard_interval: Timestamp,
    /// Time the relayer has to pay a pending claim.
    pub compensation_period: Timestamp,
    /// Delay between requesting and completing an escrow withdrawal.
    pub withdrawal_period: Timestamp,
    /// Address of the key that signs receipts.
    pub receipt_signer: Address,
}

impl Default for AccountabilityConfig {
    fn default() -> Self {
        Self {
            shard_interval: 6000,
            compensation_period: 100,
            withdrawal_period: 600,
            receipt_signer: [0u8; 20],
        }
    }
}

impl AccountabilityConfig {
    /// Validate configuration before wiring components.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shard_interval < 2 {
            return Err(ConfigError::IntervalTooShort(self.shard_interval));
        }
        if self.compensation_period == 0 {
            return Err(ConfigError::ZeroPeriod("compensation_period"));
        }
        if self.withdrawal_period == 0 {
            return Err(ConfigError::ZeroPeriod("withdrawal_period"));
        }
        if self.receipt_signer == [0u8; 20] {
            return Err(ConfigError::MissingSigner);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Dispute window `interval / 2` would be empty.
    #[error("Shard interval {0} is too short, minimum is 2")]
    IntervalTooShort(Timestamp),
    /// A period is zero.
    #[error("{0} must be greater than zero")]
    ZeroPeriod(&'static str),
    /// Receipt signer is the zero address.
    #[error("Receipt signer is not set. Set QC_RELAY_SIGNER or provide it in config.")]
    MissingSigner,
}
