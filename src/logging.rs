// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Structured logging setup and planner event helpers
//!
//! Logs always go to stderr: stdout carries the JSON the CLI prints.

use anyhow::Result;
use chrono::NaiveDate;
use serde_json::json;
use std::env;
use std::io;
use tracing::{info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::constants::{env_config, service};
use crate::models::{SessionKind, SessionStatus};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include span enter/exit events
    pub include_spans: bool,
    pub service_name: String,
    pub service_version: String,
    /// Environment (development, production)
    pub environment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, for log shippers
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            include_spans: false,
            service_name: service::SERVICE_NAME.to_string(),
            service_version: service::SERVICE_VERSION.to_string(),
            environment: "development".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    pub fn from_env() -> Self {
        let level = env_config::log_level();

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") => LogFormat::Pretty,
            _ => LogFormat::Compact,
        };

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let is_production = environment == "production";

        Self {
            level,
            format,
            include_location: is_production || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| service::SERVICE_NAME.to_string()),
            service_version: service::SERVICE_VERSION.to_string(),
            environment,
        }
    }

    fn span_events(&self) -> FmtSpan {
        if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Initialize the global tracing subscriber
    pub fn init(&self) -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let registry = tracing_subscriber::registry().with(env_filter);

        match self.format {
            LogFormat::Json => {
                let json_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stderr)
                    .with_span_events(self.span_events())
                    .json();
                registry.with(json_layer).try_init()?;
            }
            LogFormat::Pretty => {
                let pretty_layer = fmt::layer()
                    .pretty()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_writer(io::stderr)
                    .with_span_events(self.span_events());
                registry.with(pretty_layer).try_init()?;
            }
            LogFormat::Compact => {
                let compact_layer = fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stderr)
                    .with_span_events(FmtSpan::NONE);
                registry.with(compact_layer).try_init()?;
            }
        }

        self.log_startup_info();
        Ok(())
    }

    fn log_startup_info(&self) {
        let summary = json!({
            "service": {
                "name": self.service_name,
                "version": self.service_version,
                "environment": self.environment
            },
            "logging": {
                "level": self.level,
                "format": format!("{:?}", self.format),
            }
        });
        tracing::debug!(service.name = %self.service_name, "Logging initialized: {}", summary);
    }
}

/// Initialize logging from environment
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Structured events emitted around planning and reconciliation
pub struct PlannerLogger;

impl PlannerLogger {
    pub fn log_cycle_generated(today: NaiveDate, sessions: usize, deload: bool, acwr: Option<f64>) {
        info!(
            cycle.today = %today,
            cycle.sessions = sessions,
            cycle.deload = deload,
            cycle.acwr = ?acwr,
            "Planning cycle generated"
        );
    }

    pub fn log_session_transition(session_id: &str, date: NaiveDate, status: SessionStatus, rule_ids: &[String]) {
        info!(
            session.id = %session_id,
            session.date = %date,
            session.status = %status,
            rule.ids = %rule_ids.join(","),
            "Session transitioned"
        );
    }

    pub fn log_guardrail_removal(kind: SessionKind, date: NaiveDate, rule_id: &str, reason: &str) {
        warn!(
            session.kind = %kind,
            session.date = %date,
            rule.id = %rule_id,
            reason = %reason,
            "Guardrail removed session"
        );
    }

    pub fn log_readiness_gate(score: f64, date: NaiveDate, from: SessionKind, to: SessionKind) {
        info!(
            readiness.score = score,
            session.date = %date,
            session.from = %from,
            session.to = %to,
            "Readiness gate downgraded session"
        );
    }

    pub fn log_placement_shortfall(kind: SessionKind, duration_minutes: u32) {
        warn!(
            session.kind = %kind,
            session.duration_minutes = duration_minutes,
            "No legal slot for session"
        );
    }
}
