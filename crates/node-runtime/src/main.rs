//! # Relay Accountability Node
//!
//! Entry point that wires an evidence registry, an adjudicator and an escrow
//! guard, then replays a dispute walkthrough against them.
//!
//! ## Startup Sequence
//!
//! 1. Install the tracing subscriber (`RUST_LOG`, default `info`)
//! 2. Load configuration from `QC_RELAY_*` environment variables
//! 3. Wire the components (registry -> adjudicator -> escrow)
//! 4. Run the walkthrough and report the outcome

use std::sync::Arc;

use anyhow::{Context, Result};
use node_runtime::{demo, load_config, RelayNode};
use qc_18_relay_accountability::TracingPublisher;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let config = load_config().context("loading relay configuration")?;
    info!("Starting relay node v{}", qc_18_relay_accountability::VERSION);

    let node = RelayNode::new(&config, Arc::new(TracingPublisher))?;
    let report = demo::run(&node, &config)?;

    info!(
        "Walkthrough complete: {} claim(s) refused, {} paid out ({} total), escrow locked: {}, escrow balance: {}",
        report.rejected_claims,
        report.resolved_claims,
        report.paid_to_users,
        report.escrow_locked,
        report.escrow_balance
    );
    Ok(())
}
