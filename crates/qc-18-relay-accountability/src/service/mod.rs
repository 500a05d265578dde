//! # Service Layer
//!
//! Stateful components shared through `Arc`. Every operation is a synchronous,
//! all-or-nothing unit; fund-moving operations commit state before calling the
//! value transfer port.

pub mod adjudicator;
pub mod escrow;
pub mod registry;

pub use adjudicator::Adjudicator;
pub use escrow::EscrowGuard;
pub use registry::EvidenceRegistry;
