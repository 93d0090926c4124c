//! Usage record and snapshot models.

// Author: kelexine (https://github.com/kelexine)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token breakdown of a single request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub reasoning_tokens: u64,
    #[serde(default)]
    pub cached_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            ..Default::default()
        }
    }

    /// Fill in `total_tokens` when the provider did not report it.
    pub fn normalized(mut self) -> Self {
        if self.total_tokens == 0 {
            self.total_tokens = self
                .input_tokens
                .saturating_add(self.output_tokens)
                .saturating_add(self.reasoning_tokens);
        }
        self
    }
}

/// A completed request as reported by the request pipeline.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    /// Upstream provider that served the request (`gemini`, `claude`, ...).
    pub provider: String,
    pub model: String,
    /// Client API key the request was made with.
    pub api_key: String,
    /// Identifier of the upstream credential used, if any.
    pub auth_index: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub failed: bool,
    pub tokens: TokenUsage,
}

impl RequestRecord {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        tokens: TokenUsage,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            api_key: api_key.into(),
            auth_index: None,
            requested_at: Utc::now(),
            failed: false,
            tokens,
        }
    }

    pub fn at(mut self, requested_at: DateTime<Utc>) -> Self {
        self.requested_at = requested_at;
        self
    }

    pub fn with_auth_index(mut self, auth_index: impl Into<String>) -> Self {
        self.auth_index = Some(auth_index.into());
        self
    }

    pub fn failed(mut self, failed: bool) -> Self {
        self.failed = failed;
        self
    }

    /// Key the record is filed under: the API key, else the provider.
    pub fn stats_key(&self) -> &str {
        if !self.api_key.is_empty() {
            &self.api_key
        } else if !self.provider.is_empty() {
            &self.provider
        } else {
            "unknown"
        }
    }

    pub fn model_name(&self) -> &str {
        if self.model.is_empty() {
            "unknown"
        } else {
            &self.model
        }
    }

    pub(crate) fn to_detail(&self) -> RequestDetail {
        RequestDetail {
            timestamp: self.requested_at,
            source: self.provider.clone(),
            auth_index: self.auth_index.clone(),
            tokens: self.tokens.normalized(),
            failed: self.failed,
        }
    }
}

/// One entry of a recent-activity window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestDetail {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_index: Option<String>,
    pub tokens: TokenUsage,
    #[serde(default)]
    pub failed: bool,
}

/// Copy of one (api key, model) node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSnapshot {
    pub total_requests: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    /// Oldest first.
    pub recent_details: Vec<RequestDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSnapshot {
    pub total_requests: u64,
    pub total_tokens: u64,
    pub models: BTreeMap<String, ModelSnapshot>,
}

/// Whole statistics tree, as handed to the reporting layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageSnapshot {
    pub total_requests: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub total_tokens: u64,
    pub apis: BTreeMap<String, ApiSnapshot>,
    /// `YYYY-MM-DD` → requests.
    pub requests_by_day: BTreeMap<String, u64>,
    /// Hour of day `00`..`23` → requests.
    pub requests_by_hour: BTreeMap<String, u64>,
    pub tokens_by_day: BTreeMap<String, u64>,
    pub tokens_by_hour: BTreeMap<String, u64>,
}

impl UsageSnapshot {
    pub fn model(&self, api_key: &str, model: &str) -> Option<&ModelSnapshot> {
        self.apis.get(api_key)?.models.get(model)
    }
}

/// Outcome of importing a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    pub added: u64,
    pub skipped: u64,
}
