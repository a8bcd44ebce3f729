//! LLM Analyzer - prompt, complete, parse, cache

use std::sync::Arc;

use pgqa_core::LlmAssessment;
use serde_json::Value;

use crate::cache::{AnalysisCache, CacheStats, cache_key};
use crate::error::Result;
use crate::prompt::{AnalysisContext, analysis_request, connection_test_request};
use crate::provider::{LlmProvider, ProviderMetadata};
use crate::response::parse_assessment;

/// Produces assessments for a query and its EXPLAIN plan
pub struct LlmAnalyzer {
    provider: Arc<dyn LlmProvider>,
    cache: AnalysisCache,
}

impl LlmAnalyzer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_cache(provider, AnalysisCache::default())
    }

    pub fn with_cache(provider: Arc<dyn LlmProvider>, cache: AnalysisCache) -> Self {
        Self { provider, cache }
    }

    /// Analyzes `query` given the root node of its plan
    ///
    /// Identical query/plan pairs are answered from the cache. Failed
    /// analyses are never cached.
    #[tracing::instrument(skip(self, query, plan_json), fields(model = %self.provider.metadata().model))]
    pub async fn analyze(&self, query: &str, plan_json: &Value) -> Result<LlmAssessment> {
        let key = cache_key(query, plan_json);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let context = AnalysisContext::new(query, plan_json);
        let content = self.provider.complete(analysis_request(&context)).await?;
        let assessment = parse_assessment(&content).inspect_err(|e| {
            tracing::error!(error = %e, "failed to parse LLM response");
        })?;

        tracing::debug!(
            recommendations = assessment.recommendations.len(),
            warnings = assessment.warnings.len(),
            "LLM analysis complete"
        );
        self.cache.insert(key, assessment.clone());
        Ok(assessment)
    }

    /// Returns true if the provider answers a one-token request
    pub async fn test_connection(&self) -> bool {
        match self.provider.complete(connection_test_request()).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "LLM connection test failed");
                false
            }
        }
    }

    pub fn metadata(&self) -> ProviderMetadata {
        self.provider.metadata()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
