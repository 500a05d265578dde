//! # Adapters Module
//!
//! In-memory implementations of the outbound ports.

pub mod ledger;
pub mod publisher;

pub use ledger::{InMemoryLedger, Payout};
pub use publisher::{RecordingPublisher, TracingPublisher};
