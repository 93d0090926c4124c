//! Thinking-signature cache.
//!
//! Upstream providers attach an opaque integrity token to every "thinking"
//! block and require it to be echoed back verbatim on later turns. Clients
//! routinely drop those tokens, so the gateway remembers them keyed by model
//! group and a SHA-256 fingerprint of the thinking text.
//!
//! # Submodules
//!
//! - `validation`: fingerprinting, signature validity and model grouping.
//! - `cache`: the concurrent, TTL-bounded store.
//! - `sweeper`: optional background expiry sweep.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod cache;
pub mod sweeper;
pub mod validation;

pub use cache::{SignatureCache, SignatureCacheConfig, SignatureCacheStats};
pub use sweeper::spawn_sweeper;
pub use validation::{
    fingerprint, is_valid_signature, is_valid_signature_with, model_group, Fingerprint,
};

use std::time::Duration;

/// Signatures shorter than this are placeholders or truncated garbage.
pub const MIN_SIGNATURE_LEN: usize = 50;

/// Default lifetime of a cached signature.
pub const DEFAULT_SIGNATURE_TTL: Duration = Duration::from_secs(60 * 60);

/// Default number of live entries per model group.
pub const DEFAULT_MAX_ENTRIES_PER_GROUP: usize = 1000;

/// Value sent to the Gemini family when no signature can be recovered.
pub const SKIP_SIGNATURE_SENTINEL: &str = "skip_thought_signature_validator";
