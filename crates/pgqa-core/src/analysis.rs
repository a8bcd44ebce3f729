//! Analysis Result Model - the aggregate returned for one analyzed query
//!
//! An `AnalysisResult` combines the raw EXPLAIN plan with the LLM's
//! advisory output (resource estimates, recommendations, warnings). Nothing
//! here is measured locally; every number is either copied from PostgreSQL
//! or estimated by the LLM.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request to analyze a query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRequest {
    /// SQL text, possibly a `;`-separated chain of statements
    pub query: String,
    /// Database to explain against instead of the configured default
    #[serde(default)]
    pub database_url: Option<String>,
}

impl AnalysisRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            database_url: None,
        }
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Splits the query on `;` and returns the non-empty statements.
    pub fn statements(&self) -> Vec<&str> {
        split_statements(&self.query)
    }

    /// Returns true if the query is a chain of more than one statement
    pub fn is_chain(&self) -> bool {
        self.statements().len() > 1
    }
}

/// Non-empty, trimmed statements of a `;`-separated chain
pub fn split_statements(query: &str) -> Vec<&str> {
    query
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parses a priority, ignoring case and surrounding whitespace
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single optimization recommendation from the LLM
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    /// Free-form category tag (index, query_rewrite, config, ...)
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: PriorityLevel,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub potential_improvement: String,
    pub implementation: String,
    /// Expected speedup in percent
    #[serde(default)]
    pub estimated_speedup: Option<f64>,
}

/// Resource usage figures estimated by the LLM
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceMetrics {
    /// Expected CPU usage, 0-100
    pub cpu_usage: f64,
    /// Expected memory usage in MB
    pub memory_usage: f64,
    pub io_operations: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_hit_ratio: Option<f64>,
}

/// Headline numbers of an EXPLAIN plan plus the raw plan document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionPlanSummary {
    pub total_cost: f64,
    /// `Actual Total Time` in ms when present (0 for plain EXPLAIN)
    pub execution_time: f64,
    pub rows: u64,
    pub width: u64,
    #[serde(default)]
    pub io_operations: u64,
    /// Root plan node object exactly as PostgreSQL returned it
    pub plan_json: Value,
}

/// Everything the LLM contributes to an analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmAssessment {
    pub rewritten_query: Option<String>,
    pub resource_metrics: ResourceMetrics,
    pub recommendations: Vec<Recommendation>,
    pub warnings: Vec<String>,
}

/// Result of analyzing one query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub query: String,
    pub rewritten_query: Option<String>,
    pub execution_plan: ExecutionPlanSummary,
    pub resource_metrics: ResourceMetrics,
    pub recommendations: Vec<Recommendation>,
    pub warnings: Vec<String>,
    pub analysis_timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    /// Combines the plan and the LLM assessment, stamping the current time.
    ///
    /// Recommendations and warnings keep the order the LLM produced them in.
    pub fn assemble(
        query: impl Into<String>,
        execution_plan: ExecutionPlanSummary,
        assessment: LlmAssessment,
    ) -> Self {
        Self {
            query: query.into(),
            rewritten_query: assessment.rewritten_query,
            execution_plan,
            resource_metrics: assessment.resource_metrics,
            recommendations: assessment.recommendations,
            warnings: assessment.warnings,
            analysis_timestamp: Utc::now(),
        }
    }

    /// Counts recommendations per priority without reordering them
    pub fn priority_counts(&self) -> PriorityCounts {
        let mut counts = PriorityCounts::default();
        for rec in &self.recommendations {
            match rec.priority {
                PriorityLevel::High => counts.high += 1,
                PriorityLevel::Medium => counts.medium += 1,
                PriorityLevel::Low => counts.low += 1,
            }
        }
        counts
    }

    /// Recommendations with the given priority, in original order
    pub fn recommendations_with(&self, priority: PriorityLevel) -> Vec<&Recommendation> {
        self.recommendations
            .iter()
            .filter(|r| r.priority == priority)
            .collect()
    }

    /// Returns true if the plan document is present and is an object
    pub fn has_plan(&self) -> bool {
        self.execution_plan.plan_json.is_object()
    }
}

/// Recommendation counts grouped by priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityCounts {
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Service health status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthCheck {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub database_connected: bool,
    pub llm_available: bool,
}

impl HealthCheck {
    pub fn from_checks(database_connected: bool, llm_available: bool) -> Self {
        let status = if database_connected && llm_available {
            "healthy"
        } else {
            "unhealthy"
        };
        Self {
            status: status.to_string(),
            timestamp: Utc::now(),
            database_connected,
            llm_available,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
