//! Configuration management for CredHub Core

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Application name, used as the prefix of entity alert headers
    pub app_name: String,
    /// Deployment environment ("development", "production", ...)
    pub environment: String,
    /// Apply embedded migrations on startup
    pub run_migrations: bool,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Elasticsearch configuration
    pub elasticsearch: ElasticsearchConfig,
    /// Logging, tracing and metrics configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    /// Base URL of the cluster (e.g., http://localhost:9200)
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "text" or "json"
    pub log_format: String,
    pub metrics_enabled: bool,
    pub tracing_enabled: bool,
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            metrics_enabled: false,
            tracing_enabled: false,
            otlp_endpoint: None,
            service_name: "credhub-core".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "credhub".to_string()),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            run_migrations: parse_bool(env::var("RUN_MIGRATIONS").ok(), true),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            },
            elasticsearch: ElasticsearchConfig {
                url: env::var("ELASTICSEARCH_URL")
                    .unwrap_or_else(|_| "http://localhost:9200".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                username: env::var("ELASTICSEARCH_USERNAME")
                    .ok()
                    .filter(|v| !v.is_empty()),
                password: env::var("ELASTICSEARCH_PASSWORD")
                    .ok()
                    .filter(|v| !v.is_empty()),
                timeout_secs: env::var("ELASTICSEARCH_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
                metrics_enabled: parse_bool(env::var("METRICS_ENABLED").ok(), false),
                tracing_enabled: parse_bool(env::var("OTEL_TRACING_ENABLED").ok(), false),
                otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
                service_name: env::var("OTEL_SERVICE_NAME")
                    .unwrap_or_else(|_| "credhub-core".to_string()),
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
        _ => default,
    }
}
