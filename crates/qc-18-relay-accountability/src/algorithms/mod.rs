//! # Algorithms Module
//!
//! Receipt identity and evidence lookup.

pub mod evidence;
pub mod receipt_codec;

pub use evidence::{find_qualifying_evidence, locate};
pub use receipt_codec::{encode_receipt, receipt_id, sign_receipt, verify_receipt_signature};
