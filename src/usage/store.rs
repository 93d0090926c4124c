// Usage statistics store
// Author: kelexine (https://github.com/kelexine)

use super::models::{
    ApiSnapshot, MergeResult, ModelSnapshot, RequestDetail, RequestRecord, UsageSnapshot,
};
use super::UsageConfig;
use crate::metrics;
use crate::utils::logging::mask_secret;
use chrono::Timelike;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    requests: u64,
    tokens: u64,
}

impl Bucket {
    fn add(&mut self, other: Bucket) {
        self.requests = self.requests.saturating_add(other.requests);
        self.tokens = self.tokens.saturating_add(other.tokens);
    }
}

/// Counters and recent window for one (api key, model) pair.
#[derive(Debug)]
struct ModelNode {
    total_requests: u64,
    success_count: u64,
    failure_count: u64,
    total_input_tokens: u64,
    total_output_tokens: u64,
    total_tokens: u64,
    recent: VecDeque<RequestDetail>,
    by_day: BTreeMap<String, Bucket>,
    by_hour: [Bucket; 24],
}

impl ModelNode {
    fn new() -> Self {
        Self {
            total_requests: 0,
            success_count: 0,
            failure_count: 0,
            total_input_tokens: 0,
            total_output_tokens: 0,
            total_tokens: 0,
            recent: VecDeque::new(),
            by_day: BTreeMap::new(),
            by_hour: [Bucket::default(); 24],
        }
    }

    fn apply(&mut self, detail: RequestDetail, window: usize) {
        let tokens = detail.tokens;
        // Counters saturate so imported values can never wrap them.
        self.total_requests = self.total_requests.saturating_add(1);
        if detail.failed {
            self.failure_count = self.failure_count.saturating_add(1);
        } else {
            self.success_count = self.success_count.saturating_add(1);
        }
        self.total_input_tokens = self.total_input_tokens.saturating_add(tokens.input_tokens);
        self.total_output_tokens = self.total_output_tokens.saturating_add(tokens.output_tokens);
        self.total_tokens = self.total_tokens.saturating_add(tokens.total_tokens);

        let bucket = Bucket {
            requests: 1,
            tokens: tokens.total_tokens,
        };
        self.by_day
            .entry(detail.timestamp.format("%Y-%m-%d").to_string())
            .or_default()
            .add(bucket);
        self.by_hour[detail.timestamp.hour() as usize].add(bucket);

        self.recent.push_back(detail);
        if self.recent.len() > window {
            let excess = self.recent.len() - window;
            self.recent.drain(..excess);
        }
    }

    fn copy_out(&self) -> NodeCopy {
        NodeCopy {
            snapshot: ModelSnapshot {
                total_requests: self.total_requests,
                success_count: self.success_count,
                failure_count: self.failure_count,
                total_input_tokens: self.total_input_tokens,
                total_output_tokens: self.total_output_tokens,
                total_tokens: self.total_tokens,
                recent_details: self.recent.iter().cloned().collect(),
            },
            by_day: self.by_day.clone(),
            by_hour: self.by_hour,
        }
    }
}

struct NodeCopy {
    snapshot: ModelSnapshot,
    by_day: BTreeMap<String, Bucket>,
    by_hour: [Bucket; 24],
}

type ModelHandle = Arc<Mutex<ModelNode>>;

#[derive(Debug, Default)]
struct ApiNode {
    models: RwLock<HashMap<String, ModelHandle>>,
}

/// Concurrent aggregate store of per (api key, model) usage.
///
/// Every model node has its own lock, so records for different pairs never
/// wait on each other. Nodes are created on first use and live as long as
/// the store.
#[derive(Debug)]
pub struct UsageStore {
    recent_window: usize,
    enabled: AtomicBool,
    apis: RwLock<HashMap<String, Arc<ApiNode>>>,
}

impl Default for UsageStore {
    fn default() -> Self {
        Self::new(UsageConfig::default())
    }
}

impl UsageStore {
    /// Create an empty store. A zero window is raised to one.
    pub fn new(config: UsageConfig) -> Self {
        Self {
            recent_window: config.recent_window.max(1),
            enabled: AtomicBool::new(config.enabled),
            apis: RwLock::new(HashMap::new()),
        }
    }

    pub fn recent_window(&self) -> usize {
        self.recent_window
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        let previous = self.enabled.swap(enabled, Ordering::Relaxed);
        if previous != enabled {
            info!("Usage statistics {}", if enabled { "enabled" } else { "disabled" });
        }
    }

    /// Fold a completed request into the statistics.
    pub fn record(&self, record: RequestRecord) {
        if !self.is_enabled() {
            return;
        }

        let detail = record.to_detail();
        metrics::record_usage(
            &record.provider,
            record.model_name(),
            detail.failed,
            &detail.tokens,
        );
        trace!(
            "Recording usage: key={} model={} total_tokens={}",
            mask_secret(record.stats_key()),
            record.model_name(),
            detail.tokens.total_tokens
        );

        let node = self.node(record.stats_key(), record.model_name());
        node.lock().apply(detail, self.recent_window);
    }

    /// Copy out the whole tree.
    ///
    /// Each model node is locked only while it is copied, so the result is
    /// consistent per node but not across the tree.
    pub fn snapshot(&self) -> UsageSnapshot {
        let apis: Vec<(String, Arc<ApiNode>)> = self
            .apis
            .read()
            .iter()
            .map(|(key, api)| (key.clone(), api.clone()))
            .collect();

        let mut out = UsageSnapshot::default();
        let mut by_day: BTreeMap<String, Bucket> = BTreeMap::new();
        let mut by_hour = [Bucket::default(); 24];

        for (api_key, api) in apis {
            let models: Vec<(String, ModelHandle)> = api
                .models
                .read()
                .iter()
                .map(|(model, node)| (model.clone(), node.clone()))
                .collect();

            let mut api_snapshot = ApiSnapshot::default();
            for (model, node) in models {
                let copy = node.lock().copy_out();

                for (day, bucket) in copy.by_day {
                    by_day.entry(day).or_default().add(bucket);
                }
                for (total, bucket) in by_hour.iter_mut().zip(copy.by_hour) {
                    total.add(bucket);
                }

                let model_snapshot = copy.snapshot;
                api_snapshot.total_requests = api_snapshot
                    .total_requests
                    .saturating_add(model_snapshot.total_requests);
                api_snapshot.total_tokens = api_snapshot
                    .total_tokens
                    .saturating_add(model_snapshot.total_tokens);
                out.total_requests = out.total_requests.saturating_add(model_snapshot.total_requests);
                out.success_count = out.success_count.saturating_add(model_snapshot.success_count);
                out.failure_count = out.failure_count.saturating_add(model_snapshot.failure_count);
                out.total_tokens = out.total_tokens.saturating_add(model_snapshot.total_tokens);
                api_snapshot.models.insert(model, model_snapshot);
            }
            out.apis.insert(api_key, api_snapshot);
        }

        for (day, bucket) in by_day {
            out.requests_by_day.insert(day.clone(), bucket.requests);
            out.tokens_by_day.insert(day, bucket.tokens);
        }
        for (hour, bucket) in by_hour.iter().enumerate() {
            if bucket.requests == 0 {
                continue;
            }
            let hour = format!("{:02}", hour);
            out.requests_by_hour.insert(hour.clone(), bucket.requests);
            out.tokens_by_hour.insert(hour, bucket.tokens);
        }

        out
    }

    /// Import a previously exported snapshot by replaying its recent details.
    ///
    /// Details already present in the target window are skipped. Aggregate
    /// counters grow only by what was replayed.
    pub fn merge_snapshot(&self, snapshot: &UsageSnapshot) -> MergeResult {
        let mut result = MergeResult::default();

        for (api_key, api) in &snapshot.apis {
            for (model, model_snapshot) in &api.models {
                if model_snapshot.recent_details.is_empty() {
                    continue;
                }
                let node = self.node(api_key, model);
                let mut node = node.lock();
                let mut seen: HashSet<RequestDetail> = node.recent.iter().cloned().collect();

                for detail in &model_snapshot.recent_details {
                    // Compare in stored form, totals filled in.
                    let mut detail = detail.clone();
                    detail.tokens = detail.tokens.normalized();
                    if !seen.insert(detail.clone()) {
                        result.skipped += 1;
                        continue;
                    }
                    node.apply(detail, self.recent_window);
                    result.added += 1;
                }
            }
        }

        debug!(
            "Merged usage snapshot: {} added, {} skipped",
            result.added, result.skipped
        );
        result
    }

    /// Get or create the node for (api key, model).
    fn node(&self, api_key: &str, model: &str) -> ModelHandle {
        let api = self.api(api_key);
        if let Some(node) = api.models.read().get(model) {
            return node.clone();
        }
        let node = api
            .models
            .write()
            .entry(model.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ModelNode::new())))
            .clone();
        node
    }

    fn api(&self, api_key: &str) -> Arc<ApiNode> {
        if let Some(api) = self.apis.read().get(api_key) {
            return api.clone();
        }
        self.apis
            .write()
            .entry(api_key.to_string())
            .or_default()
            .clone()
    }
}
