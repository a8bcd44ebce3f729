//! Bounded cache of LLM assessments

use indexmap::IndexMap;
use parking_lot::RwLock;
use pgqa_core::LlmAssessment;
use ring::digest;
use serde::Serialize;
use serde_json::{Map, Value, json};

pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Cache key for a query and its root plan node
///
/// Only the query text and a few headline plan fields take part, so two
/// plans differing deeper in the tree share an entry.
pub fn cache_key(query: &str, plan_json: &Value) -> String {
    let field = |key: &str, default: Value| plan_json.get(key).cloned().unwrap_or(default);

    // Keys in alphabetical order
    let mut summary = Map::new();
    summary.insert("execution_time".into(), field("Actual Total Time", json!(0)));
    summary.insert("node_type".into(), field("Node Type", json!("")));
    summary.insert("rows".into(), field("Actual Rows", json!(0)));
    summary.insert("total_cost".into(), field("Total Cost", json!(0)));

    let material = format!("{}|{}", query, Value::Object(summary));
    hex::encode(digest::digest(&digest::SHA256, material.as_bytes()).as_ref())
}

/// Snapshot of the cache for the stats endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub cache_size: usize,
    pub cache_max_size: usize,
    /// First 8 characters of each key followed by "..."
    pub cache_keys: Vec<String>,
}

/// Insertion-ordered cache that evicts the oldest entry when full
pub struct AnalysisCache {
    entries: RwLock<IndexMap<String, LlmAssessment>>,
    capacity: usize,
}

impl AnalysisCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &str) -> Option<LlmAssessment> {
        let result = self.entries.read().get(key).cloned();
        if result.is_some() {
            tracing::info!(key = %short_key(key), "cache hit");
        } else {
            tracing::info!(key = %short_key(key), "cache miss");
        }
        result
    }

    pub fn insert(&self, key: String, assessment: LlmAssessment) {
        let mut entries = self.entries.write();
        if !entries.contains_key(&key)
            && entries.len() >= self.capacity
            && let Some((evicted, _)) = entries.shift_remove_index(0)
        {
            tracing::info!(key = %short_key(&evicted), "cache evicted oldest entry");
        }
        let short = short_key(&key);
        entries.insert(key, assessment);
        tracing::info!(key = %short, size = entries.len(), "cached analysis");
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        tracing::info!("cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        CacheStats {
            cache_size: entries.len(),
            cache_max_size: self.capacity,
            cache_keys: entries.keys().map(|k| short_key(k)).collect(),
        }
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

fn short_key(key: &str) -> String {
    let prefix: String = key.chars().take(8).collect();
    format!("{}...", prefix)
}
