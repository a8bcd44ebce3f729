//! Parsing of the model's JSON answer into an `LlmAssessment`
//!
//! Models are loose about types: speedups arrive as `35`, `"35"`, `"35%"`
//! or `"20-40"`, and metrics are sometimes `null`. Those are tolerated.
//! A missing `recommendations` array or an unknown priority is not.

use pgqa_core::{LlmAssessment, PriorityLevel, Recommendation, ResourceMetrics};
use serde_json::{Map, Value};

use crate::error::{LlmError, Result};

/// Parses a raw completion into an assessment
pub fn parse_assessment(content: &str) -> Result<LlmAssessment> {
    let body = strip_code_fence(content);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("LLM returned invalid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| LlmError::InvalidResponse("LLM response is not a JSON object".to_string()))?;

    let recommendations = object
        .get("recommendations")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            LlmError::InvalidResponse("LLM response has no recommendations array".to_string())
        })?
        .iter()
        .map(parse_recommendation)
        .collect::<Result<Vec<_>>>()?;

    let resource_metrics = object
        .get("resource_metrics")
        .and_then(Value::as_object)
        .map(parse_metrics)
        .unwrap_or_default();

    let warnings = object
        .get("warnings")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|w| w.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let rewritten_query = object
        .get("rewritten_query")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty() && !q.eq_ignore_ascii_case("null"))
        .map(str::to_string);

    Ok(LlmAssessment {
        rewritten_query,
        resource_metrics,
        recommendations,
        warnings,
    })
}

/// Removes a surrounding ```json fence if the model added one
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_recommendation(value: &Value) -> Result<Recommendation> {
    let required = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                LlmError::InvalidResponse(format!("Recommendation is missing '{}'", key))
            })
    };

    let raw_priority = value.get("priority").and_then(Value::as_str).unwrap_or_default();
    let priority = PriorityLevel::parse(raw_priority).ok_or_else(|| {
        LlmError::InvalidResponse(format!("Invalid recommendation priority '{}'", raw_priority))
    })?;

    Ok(Recommendation {
        kind: required("type")?,
        priority,
        title: required("title")?,
        description: required("description")?,
        potential_improvement: value
            .get("potential_improvement")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        implementation: required("implementation")?,
        estimated_speedup: value.get("estimated_speedup").and_then(parse_speedup),
    })
}

/// Accepts a number, a numeric string, a percentage or an `a-b` range (mean)
pub(crate) fn parse_speedup(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned = s.replace('%', "");
            let cleaned = cleaned.trim();
            if let Ok(n) = cleaned.parse::<f64>() {
                return Some(n);
            }
            let (low, high) = cleaned.split_once('-')?;
            let low = low.trim().parse::<f64>().ok()?;
            let high = high.trim().parse::<f64>().ok()?;
            Some((low + high) / 2.0)
        }
        _ => None,
    }
}

fn parse_metrics(object: &Map<String, Value>) -> ResourceMetrics {
    let float = |key: &str| object.get(key).and_then(Value::as_f64).unwrap_or(0.0);
    let count = |key: &str| {
        object
            .get(key)
            .and_then(|v| v.as_u64().or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)))
            .unwrap_or(0)
    };

    ResourceMetrics {
        cpu_usage: float("cpu_usage"),
        memory_usage: float("memory_usage"),
        io_operations: count("io_operations"),
        disk_reads: count("disk_reads"),
        disk_writes: count("disk_writes"),
        cache_hit_ratio: object.get("cache_hit_ratio").and_then(Value::as_f64),
    }
}
