//! In-memory usage statistics.
//!
//! Every completed request is folded into per (api key, model) counters and
//! a bounded window of the most recent request details. The reporting side
//! only ever sees [`UsageSnapshot`] copies.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod models;
pub mod store;

pub use models::{
    ApiSnapshot, MergeResult, ModelSnapshot, RequestDetail, RequestRecord, TokenUsage,
    UsageSnapshot,
};
pub use store::UsageStore;

/// Default cap of the recent-activity window per (api key, model).
pub const DEFAULT_RECENT_WINDOW: usize = 1000;

/// Tunables for [`UsageStore`].
#[derive(Debug, Clone)]
pub struct UsageConfig {
    /// Whether records are accepted at startup.
    pub enabled: bool,
    /// Maximum number of details kept in each recent-activity window.
    pub recent_window: usize,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recent_window: DEFAULT_RECENT_WINDOW,
        }
    }
}
