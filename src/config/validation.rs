//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Validate addresses, URLs and header names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: config → Result<(), Vec<ConfigIssue>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderName, HeaderValue};
use std::fmt;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use crate::config::schema::{ClientConfig, ServerConfig, TypepathConfig};

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Dotted key, e.g. `server.listener.bind_address`.
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a whole configuration file.
pub fn validate_config(config: &TypepathConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();
    check_server(&config.server, &mut issues);
    check_client(&config.client, &mut issues);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

pub fn validate_server(config: &ServerConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();
    check_server(config, &mut issues);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn check_server(config: &ServerConfig, issues: &mut Vec<ConfigIssue>) {
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        issues.push(ConfigIssue::new(
            "server.listener.bind_address",
            format!("invalid socket address `{}`", config.listener.bind_address),
        ));
    }
    if config.timeouts.request_secs == 0 {
        issues.push(ConfigIssue::new("server.timeouts.request_secs", "must be greater than 0"));
    }
    if config.limits.max_body_bytes == 0 {
        issues.push(ConfigIssue::new("server.limits.max_body_bytes", "must be greater than 0"));
    }
    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        issues.push(ConfigIssue::new(
            "server.observability.log_level",
            format!("invalid filter `{}`", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        issues.push(ConfigIssue::new(
            "server.observability.metrics_address",
            format!("invalid socket address `{}`", config.observability.metrics_address),
        ));
    }
}

fn check_client(config: &ClientConfig, issues: &mut Vec<ConfigIssue>) {
    match url::Url::parse(&config.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => issues.push(ConfigIssue::new(
            "client.base_url",
            format!("unsupported scheme `{}`", url.scheme()),
        )),
        Err(e) => issues.push(ConfigIssue::new(
            "client.base_url",
            format!("invalid URL `{}`: {}", config.base_url, e),
        )),
    }
    for (name, value) in &config.headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            issues.push(ConfigIssue::new("client.headers", format!("invalid header name `{}`", name)));
        } else if HeaderValue::from_str(value).is_err() {
            issues.push(ConfigIssue::new("client.headers", format!("invalid value for header `{}`", name)));
        }
    }
}
