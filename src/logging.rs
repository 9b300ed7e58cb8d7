//! Logging and tracing configuration
//!
//! Structured logging with JSON formatting in production and human-readable
//! output in development, plus payment-reference masking so transaction
//! identifiers never land in logs verbatim.

use std::env;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Environment types for logging configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Detect environment from ENV variable
    pub fn from_env() -> Self {
        match env::var("ENVIRONMENT")
            .or_else(|_| env::var("ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "prod" | "production" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        }
    }

    /// Get default log level for environment
    pub fn default_log_level(&self) -> Level {
        match self {
            Self::Development => Level::DEBUG,
            Self::Staging => Level::INFO,
            Self::Production => Level::INFO,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Initialize the tracing subscriber with appropriate formatting
///
/// # Environment Variables
/// - `ENVIRONMENT` or `ENV`: Set to "production", "staging", or "development"
/// - `RUST_LOG`: Override log level (e.g., "info", "debug", "warn")
/// - `LOG_FORMAT`: Force format to "json" or "pretty"
pub fn init_tracing() {
    let environment = Environment::from_env();

    let use_json = env::var("LOG_FORMAT")
        .map(|f| f.to_lowercase() == "json")
        .unwrap_or_else(|_| environment.is_production());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            // Default filter: configured level for our crate, warn for deps
            EnvFilter::try_new(format!(
                "{}={},hyper=warn,reqwest=warn",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                environment.default_log_level()
            ))
        })
        .unwrap();

    if use_json {
        let json_layer = fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_level(true)
            .with_filter(env_filter);

        tracing_subscriber::registry().with(json_layer).init();
    } else {
        let pretty_layer = fmt::layer()
            .pretty()
            .with_target(true)
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter);

        tracing_subscriber::registry().with(pretty_layer).init();
    }

    tracing::info!(
        environment = ?environment,
        format = if use_json { "json" } else { "pretty" },
        "Tracing initialized"
    );
}

/// Mask a payment reference for logging
///
/// Shows first 4 and last 4 characters, masks the rest. References are
/// customer-linked transaction identifiers and must not appear in full.
/// References are provider free text, so masking counts characters, not
/// bytes.
pub fn mask_reference(reference: &str) -> String {
    if reference.is_empty() {
        return "<none>".to_string();
    }
    let chars: Vec<char> = reference.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
