//! Short-lived PostgreSQL connections
//!
//! Every EXPLAIN opens its own connection and drops it afterwards; there is
//! no pool.

use std::time::Duration;

use pgqa_core::sanitize_db_url_for_logging;
use tokio_postgres::{Client, Config, NoTls};

use crate::error::{PostgresError, Result};

/// Formats a tokio-postgres error with the server's detail, hint and code
pub fn format_postgres_error(error: &tokio_postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut message = db_error.message().to_string();

    if let Some(detail) = db_error.detail()
        && !detail.trim().is_empty()
    {
        message.push_str(&format!(" (detail: {})", detail));
    }

    if let Some(hint) = db_error.hint()
        && !hint.trim().is_empty()
    {
        message.push_str(&format!(" (hint: {})", hint));
    }

    match db_error.code().code() {
        "42P01" => format!("relation does not exist: {}", message),
        "42703" => format!("column does not exist: {}", message),
        "42601" => format!("syntax error: {}", message),
        "42501" => format!("permission denied: {}", message),
        code => format!("{} (code: {})", message, code),
    }
}

/// Parses a `postgresql://` URL into a connection config
pub(crate) fn parse_config(url: &str, connect_timeout: Duration) -> Result<Config> {
    let mut config: Config = url
        .parse()
        .map_err(|e: tokio_postgres::Error| PostgresError::InvalidUrl(e.to_string()))?;
    config.connect_timeout(connect_timeout);
    if config.get_application_name().is_none() {
        config.application_name("pgqa");
    }
    Ok(config)
}

/// Opens a connection and drives it on a background task
#[tracing::instrument(skip(config, url), fields(url = %sanitize_db_url_for_logging(url)))]
pub(crate) async fn connect(config: &Config, url: &str) -> Result<Client> {
    let timeout = config
        .get_connect_timeout()
        .copied()
        .unwrap_or(Duration::from_secs(30));

    let (client, connection) = tokio::time::timeout(timeout, config.connect(NoTls))
        .await
        .map_err(|_| PostgresError::Timeout(timeout.as_secs()))?
        .map_err(|e| PostgresError::Connect(format_postgres_error(&e)))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(error = %e, "PostgreSQL connection error");
        }
    });

    tracing::debug!("PostgreSQL connection established");
    Ok(client)
}
