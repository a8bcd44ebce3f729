//! Safety checks applied before a user-supplied query or database URL is used
//!
//! - `DatabaseUrlPolicy` - decides which PostgreSQL hosts/ports a request may target
//! - `sanitize_db_url_for_logging` - masks the password in a connection URL
//! - `is_safe_query` - keyword screen for statements that should never be explained

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use url::Url;

use crate::{PgqaError, Result};

/// IPv4 networks a request may never target (private, link-local, multicast,
/// reserved, loopback). Explicitly allowed hosts are checked first.
const BLOCKED_V4_NETWORKS: &[(Ipv4Addr, u8)] = &[
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
    (Ipv4Addr::new(169, 254, 0, 0), 16),
    (Ipv4Addr::new(224, 0, 0, 0), 4),
    (Ipv4Addr::new(240, 0, 0, 0), 4),
    (Ipv4Addr::new(127, 0, 0, 0), 8),
];

const DANGEROUS_COMMANDS: &[&str] = &[
    "drop", "delete", "truncate", "insert", "update", "create", "alter", "grant", "revoke",
    "copy",
];

const SUSPICIOUS_PATTERNS: &[&str] = &[
    "pg_sleep",
    "pg_terminate_backend",
    "pg_cancel_backend",
    "information_schema",
    "pg_catalog",
    "pg_stat_activity",
];

/// Which database targets a request is allowed to name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseUrlPolicy {
    /// Hosts that are always accepted, even inside blocked networks
    pub allowed_hosts: BTreeSet<String>,
    pub allowed_ports: BTreeSet<u16>,
}

impl Default for DatabaseUrlPolicy {
    fn default() -> Self {
        Self {
            allowed_hosts: ["localhost", "127.0.0.1"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_ports: [5432, 5433, 5434].into_iter().collect(),
        }
    }
}

impl DatabaseUrlPolicy {
    /// Adds extra trusted hosts on top of the defaults
    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_hosts
            .extend(hosts.into_iter().map(|h| h.into().to_lowercase()));
        self
    }

    /// Validates a PostgreSQL connection URL against the policy.
    ///
    /// Domain names must be listed explicitly; IP literals are accepted unless
    /// they fall into a blocked network.
    pub fn validate(&self, raw: &str) -> Result<()> {
        let outcome = self.check(raw);
        if let Err(err) = &outcome {
            tracing::warn!(
                url = %sanitize_db_url_for_logging(raw),
                error = %err,
                "database URL rejected"
            );
        }
        outcome
    }

    fn check(&self, raw: &str) -> Result<()> {
        let url = Url::parse(raw)
            .map_err(|e| PgqaError::Security(format!("Invalid database URL format: {}", e)))?;

        if !matches!(url.scheme(), "postgresql" | "postgres") {
            return Err(PgqaError::Security(
                "Only PostgreSQL connections are allowed".to_string(),
            ));
        }

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.trim_start_matches('[').trim_end_matches(']'),
            _ => {
                return Err(PgqaError::Security(
                    "Host is required in database URL".to_string(),
                ));
            }
        };

        let port = url.port().unwrap_or(5432);
        if !self.allowed_ports.contains(&port) {
            let allowed: Vec<String> = self.allowed_ports.iter().map(|p| p.to_string()).collect();
            return Err(PgqaError::Security(format!(
                "Port {} is not allowed. Allowed ports: [{}]",
                port,
                allowed.join(", ")
            )));
        }

        let host = host.to_lowercase();
        if self.allowed_hosts.contains(&host) {
            return Ok(());
        }

        match host.parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) => {
                if let Some((net, prefix)) = blocked_v4_network(ip) {
                    return Err(PgqaError::Security(format!(
                        "Access to private network {}/{} is not allowed",
                        net, prefix
                    )));
                }
                Ok(())
            }
            Ok(IpAddr::V6(ip)) => {
                if is_blocked_v6(ip) {
                    return Err(PgqaError::Security(format!(
                        "Access to private network address {} is not allowed",
                        ip
                    )));
                }
                Ok(())
            }
            Err(_) => Err(PgqaError::Security(format!(
                "Domain {} is not in allowed list",
                host
            ))),
        }
    }
}

fn blocked_v4_network(ip: Ipv4Addr) -> Option<(Ipv4Addr, u8)> {
    let addr = u32::from(ip);
    BLOCKED_V4_NETWORKS.iter().copied().find(|(net, prefix)| {
        let mask = u32::MAX << (32 - u32::from(*prefix));
        addr & mask == u32::from(*net) & mask
    })
}

fn is_blocked_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_multicast()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}

/// Replaces the password of a connection URL with `***`.
///
/// Returns `"invalid_url"` when the input cannot be parsed.
pub fn sanitize_db_url_for_logging(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return "invalid_url".to_string();
    };
    if url.password().is_some() && url.set_password(Some("***")).is_err() {
        return "invalid_url".to_string();
    }
    url.to_string()
}

/// Screens a query for statements and functions that must not be run.
///
/// This is a keyword check, not a parser. DML is rewritten to SELECT before
/// EXPLAIN, so the check is opt-in via settings.
pub fn is_safe_query(query: &str) -> Result<()> {
    let lowered = query.trim().to_lowercase();

    if let Some(first_word) = lowered.split_whitespace().next()
        && DANGEROUS_COMMANDS.contains(&first_word)
    {
        return Err(PgqaError::Security(format!(
            "Command '{}' is not allowed for security reasons",
            first_word.to_uppercase()
        )));
    }

    if let Some(pattern) = SUSPICIOUS_PATTERNS.iter().find(|p| lowered.contains(*p)) {
        return Err(PgqaError::Security(format!(
            "Pattern '{}' is potentially dangerous",
            pattern
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests;
