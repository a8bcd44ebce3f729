//! Analysis Service - one request, one EXPLAIN, one LLM call
//!
//! The service owns the default explainer and builds a short-lived one when
//! a request names its own database. Nothing is retried: any upstream
//! failure becomes a single `ServiceError::Failed` string.

use std::sync::Arc;
use std::time::Duration;

use pgqa_analyzer::summarize_execution_plan;
use pgqa_core::{
    AnalysisRequest, AnalysisResult, DatabaseInfo, DatabaseUrlPolicy, HealthCheck, PgqaError, PlanExplainer,
    is_safe_query, sanitize_db_url_for_logging,
};
use pgqa_llm::LlmAnalyzer;
use pgqa_postgres::PostgresExplainer;
use pgqa_postgres::rewrite::statement_preview;
use pgqa_settings::Settings;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq)]
pub enum ServiceError {
    /// Rejected before any database or LLM work (HTTP 400)
    #[error("{0}")]
    InvalidRequest(String),

    /// Upstream failure while analyzing (HTTP 500)
    #[error("Analysis failed: {0}")]
    Failed(String),

    /// Default database could not describe itself (HTTP 500)
    #[error("Failed to get database info: {0}")]
    DatabaseInfo(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Creates explainers for database URLs supplied with a request
pub trait ExplainerFactory: Send + Sync {
    fn create(&self, database_url: &str) -> pgqa_core::Result<Arc<dyn PlanExplainer>>;
}

pub struct PostgresExplainerFactory {
    pub connect_timeout: Duration,
}

impl ExplainerFactory for PostgresExplainerFactory {
    fn create(&self, database_url: &str) -> pgqa_core::Result<Arc<dyn PlanExplainer>> {
        let explainer = PostgresExplainer::new(database_url, self.connect_timeout)?;
        Ok(Arc::new(explainer))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub max_query_length: usize,
    pub enable_sql_security_check: bool,
    /// Upper bound on the LLM round trip
    pub analysis_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_query_length: settings.analysis.max_query_length,
            enable_sql_security_check: settings.analysis.enable_sql_security_check,
            analysis_timeout: Duration::from_secs(settings.analysis.timeout),
        }
    }
}

/// Connection parameters for `POST /database/test`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseTestRequest {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

fn default_port() -> u16 {
    5432
}

impl DatabaseTestRequest {
    /// Connection URL with percent-encoded credentials
    pub fn database_url(&self) -> pgqa_core::Result<String> {
        let invalid = |what: &str| PgqaError::InvalidRequest(format!("Invalid {}", what));

        let mut url = Url::parse("postgresql://localhost").map_err(|_| invalid("URL"))?;
        url.set_host(Some(&self.host)).map_err(|_| invalid("host"))?;
        url.set_port(Some(self.port)).map_err(|_| invalid("port"))?;
        url.set_path(&self.database);
        url.set_username(&self.username)
            .map_err(|_| invalid("username"))?;
        url.set_password(Some(&self.password))
            .map_err(|_| invalid("password"))?;
        Ok(url.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseTestResponse {
    pub status: String,
    pub message: String,
}

impl DatabaseTestResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

pub struct AnalysisService {
    config: ServiceConfig,
    explainer: Arc<dyn PlanExplainer>,
    factory: Arc<dyn ExplainerFactory>,
    url_policy: DatabaseUrlPolicy,
    llm: Arc<LlmAnalyzer>,
}

impl AnalysisService {
    pub fn new(
        config: ServiceConfig,
        explainer: Arc<dyn PlanExplainer>,
        factory: Arc<dyn ExplainerFactory>,
        llm: Arc<LlmAnalyzer>,
    ) -> Self {
        Self {
            config,
            explainer,
            factory,
            url_policy: DatabaseUrlPolicy::default(),
            llm,
        }
    }

    pub fn with_url_policy(mut self, policy: DatabaseUrlPolicy) -> Self {
        self.url_policy = policy;
        self
    }

    pub fn llm(&self) -> &LlmAnalyzer {
        &self.llm
    }

    /// Runs the full analysis round trip for one request
    #[tracing::instrument(skip(self, request), fields(query_len = request.query.len()))]
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        self.validate(request)?;
        let explainer = self.explainer_for(request)?;

        let statements = request.statements();
        let main_query = if statements.len() > 1 {
            tracing::info!(statements = statements.len(), "analyzing query chain");
            statements[0]
        } else {
            tracing::info!(query = %statement_preview(&request.query), "analyzing single query");
            request.query.as_str()
        };

        let plan_json = explainer.explain(main_query).await.map_err(failed)?;

        // The LLM sees the whole chain; the plan covers the first statement only
        tracing::info!(database = %explainer.target(), "running LLM analysis");
        let assessment = tokio::time::timeout(
            self.config.analysis_timeout,
            self.llm.analyze(&request.query, &plan_json),
        )
        .await
        .map_err(|_| {
            ServiceError::Failed(format!(
                "LLM analysis timed out after {} seconds",
                self.config.analysis_timeout.as_secs()
            ))
        })?
        .map_err(|e| failed(PgqaError::from(e)))?;

        let result = AnalysisResult::assemble(
            request.query.clone(),
            summarize_execution_plan(plan_json),
            assessment,
        );
        tracing::info!(
            recommendations = result.recommendations.len(),
            warnings = result.warnings.len(),
            "analysis completed"
        );
        Ok(result)
    }

    fn validate(&self, request: &AnalysisRequest) -> Result<()> {
        if request.query.trim().is_empty() {
            return Err(ServiceError::InvalidRequest(
                "Query cannot be empty".to_string(),
            ));
        }

        if request.query.chars().count() > self.config.max_query_length {
            return Err(ServiceError::InvalidRequest(format!(
                "Query too long. Maximum length is {} characters",
                self.config.max_query_length
            )));
        }

        if self.config.enable_sql_security_check
            && let Err(err) = is_safe_query(&request.query)
        {
            return Err(ServiceError::InvalidRequest(format!(
                "Security check failed: {}",
                reason(err)
            )));
        }

        Ok(())
    }

    fn explainer_for(&self, request: &AnalysisRequest) -> Result<Arc<dyn PlanExplainer>> {
        let Some(url) = request.database_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Ok(self.explainer.clone());
        };

        self.url_policy.validate(url).map_err(|err| {
            ServiceError::InvalidRequest(format!("Invalid database URL: {}", reason(err)))
        })?;
        tracing::info!(url = %sanitize_db_url_for_logging(url), "using custom database");

        self.factory.create(url).map_err(|err| {
            ServiceError::InvalidRequest(format!("Invalid database URL: {}", reason(err)))
        })
    }

    /// Database and LLM reachability, checked concurrently
    pub async fn health(&self) -> HealthCheck {
        let (database_connected, llm_available) =
            tokio::join!(self.explainer.test_connection(), self.llm.test_connection());
        HealthCheck::from_checks(database_connected, llm_available)
    }

    /// Version and size figures of the configured database
    pub async fn database_info(&self) -> Result<DatabaseInfo> {
        self.explainer.database_info().await.map_err(|err| {
            tracing::error!(error = %err, "failed to get database info");
            ServiceError::DatabaseInfo(err.to_string())
        })
    }

    /// Checks that a database described by its parts is reachable
    pub async fn test_database(&self, request: &DatabaseTestRequest) -> DatabaseTestResponse {
        let url = match request.database_url() {
            Ok(url) => url,
            Err(err) => {
                return DatabaseTestResponse::error(format!(
                    "Invalid connection parameters: {}",
                    reason(err)
                ));
            }
        };
        if let Err(err) = self.url_policy.validate(&url) {
            return DatabaseTestResponse::error(format!(
                "Invalid connection parameters: {}",
                reason(err)
            ));
        }

        tracing::info!(url = %sanitize_db_url_for_logging(&url), "testing database connection");
        let explainer = match self.factory.create(&url) {
            Ok(explainer) => explainer,
            Err(err) => {
                return DatabaseTestResponse::error(format!(
                    "Invalid connection parameters: {}",
                    reason(err)
                ));
            }
        };

        if explainer.test_connection().await {
            DatabaseTestResponse::success("Database connection successful")
        } else {
            DatabaseTestResponse::error("Database connection failed")
        }
    }
}

/// Message without the error-kind prefix for errors the user caused
fn reason(err: PgqaError) -> String {
    match err {
        PgqaError::Security(msg)
        | PgqaError::InvalidRequest(msg)
        | PgqaError::Configuration(msg) => msg,
        other => other.to_string(),
    }
}

fn failed(err: PgqaError) -> ServiceError {
    tracing::error!(error = %err, "query analysis failed");
    ServiceError::Failed(err.to_string())
}

#[cfg(test)]
mod tests;
