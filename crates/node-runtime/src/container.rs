//! # Relay Container
//!
//! Owns the wired relay accountability components. Construction order:
//!
//! 1. Evidence registry (initialized with the shard interval)
//! 2. Adjudicator bound to the registry
//! 3. Escrow guard following the adjudicator's lock

use crate::config::RuntimeConfig;
use anyhow::{Context, Result};
use qc_18_relay_accountability::{
    Adjudicator, EscrowGuard, EventPublisher, EvidenceRegistry, InMemoryLedger, ManualTimeSource,
};
use std::sync::Arc;
use tracing::info;

/// Wired relay accountability components sharing one clock and ledger.
pub struct RelayNode {
    clock: Arc<ManualTimeSource>,
    ledger: Arc<InMemoryLedger>,
    registry: Arc<EvidenceRegistry>,
    adjudicator: Arc<Adjudicator>,
    escrow: Arc<EscrowGuard>,
}

impl RelayNode {
    /// Build and wire every component.
    ///
    /// Block height starts at `config.genesis_height` and is advanced by the
    /// caller through [`RelayNode::clock`].
    pub fn new(config: &RuntimeConfig, publisher: Arc<dyn EventPublisher>) -> Result<Self> {
        let clock = Arc::new(ManualTimeSource::new(config.genesis_height));
        let ledger = Arc::new(InMemoryLedger::new());

        let registry = Arc::new(EvidenceRegistry::new(
            config.registry_address,
            clock.clone(),
            publisher.clone(),
        ));
        registry
            .initialize(config.accountability.shard_interval)
            .context("initializing evidence registry")?;

        let adjudicator = Arc::new(
            Adjudicator::new(
                config.adjudicator_address,
                config.accountability.clone(),
                registry.clone(),
                clock.clone(),
                ledger.clone(),
                publisher.clone(),
            )
            .context("creating adjudicator")?,
        );

        let escrow = Arc::new(EscrowGuard::new(
            config.escrow_address,
            config.admin,
            config.accountability.withdrawal_period,
            clock.clone(),
            ledger.clone(),
            publisher,
        ));
        escrow
            .add_dependency(config.admin, adjudicator.clone())
            .context("linking escrow to adjudicator")?;

        info!(
            "Relay node wired: registry=0x{}, adjudicator=0x{}, escrow=0x{}",
            hex::encode(config.registry_address),
            hex::encode(config.adjudicator_address),
            hex::encode(config.escrow_address)
        );

        Ok(Self {
            clock,
            ledger,
            registry,
            adjudicator,
            escrow,
        })
    }

    /// Block height source.
    pub fn clock(&self) -> &ManualTimeSource {
        &self.clock
    }

    /// Payout ledger.
    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    /// Evidence registry.
    pub fn registry(&self) -> &EvidenceRegistry {
        &self.registry
    }

    /// Adjudicator.
    pub fn adjudicator(&self) -> &Adjudicator {
        &self.adjudicator
    }

    /// Escrow guard.
    pub fn escrow(&self) -> &EscrowGuard {
        &self.escrow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_18_relay_accountability::{EvidenceStore, RecordingPublisher};

    #[test]
    fn test_node_wiring() {
        let config = crate::config::load_config_from(|_| None).unwrap();
        let node = RelayNode::new(&config, Arc::new(RecordingPublisher::new())).unwrap();

        assert!(node.registry().is_initialized());
        assert_eq!(node.registry().interval(), Some(6000));
        assert_eq!(
            node.adjudicator().registry_address(),
            config.registry_address
        );
        assert_eq!(
            node.escrow().dependency_addresses(),
            vec![config.adjudicator_address]
        );
        assert!(!node.escrow().is_locked());
    }
}
