//! Structured logging with correlation tracking for RPC calls
//!
//! Every call gets a context carrying a correlation id so the start, the
//! outgoing request and the outcome of one RPC can be tied together in logs.

use log::{debug, info, warn};
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::error::ShotgunError;

/// Monitoring and logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringConfig {
    pub correlation_ids: bool,
    pub request_logging: bool,
    pub performance_metrics: bool,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            correlation_ids: true,
            request_logging: true,
            performance_metrics: true,
            log_level: LogLevel::Debug,
        }
    }
}

impl MonitoringConfig {
    /// Only failures are logged
    pub fn quiet() -> Self {
        Self {
            correlation_ids: false,
            request_logging: false,
            performance_metrics: false,
            log_level: LogLevel::Warn,
        }
    }
}

/// Structured logger for RPC calls
#[derive(Debug, Clone, Default)]
pub struct ApiLogger {
    config: MonitoringConfig,
}

/// Context for a single RPC call
#[derive(Debug, Clone)]
pub struct RpcContext {
    pub correlation_id: Option<String>,
    pub method: String,
    pub start_time: Instant,
}

impl RpcContext {
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl ApiLogger {
    pub fn new(config: MonitoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MonitoringConfig {
        &self.config
    }

    pub fn start_rpc(&self, method: &str) -> RpcContext {
        let context = RpcContext {
            correlation_id: self.config.correlation_ids.then(|| Uuid::new_v4().to_string()),
            method: method.to_string(),
            start_time: Instant::now(),
        };

        if self.config.request_logging && self.should_log(LogLevel::Info) {
            let log_data = json!({
                "event": "rpc_started",
                "correlation_id": context.correlation_id,
                "method": context.method,
                "timestamp": chrono::Utc::now().to_rfc3339()
            });

            info!("RPC Started: {}", log_data);
        }

        context
    }

    /// Log the outgoing envelope; credentials must already be redacted
    pub fn log_request(&self, context: &RpcContext, url: &str, envelope: &Value) {
        if !self.config.request_logging || !self.should_log(LogLevel::Debug) {
            return;
        }

        let log_data = json!({
            "event": "rpc_request",
            "correlation_id": context.correlation_id,
            "method": context.method,
            "url": url,
            "body": envelope,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        debug!("RPC Request: {}", log_data);
    }

    pub fn complete_rpc(&self, context: &RpcContext, status: u16) {
        if !self.config.performance_metrics || !self.should_log(LogLevel::Info) {
            return;
        }

        let log_data = json!({
            "event": "rpc_completed",
            "correlation_id": context.correlation_id,
            "method": context.method,
            "status_code": status,
            "duration_ms": context.elapsed().as_millis(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        info!("RPC Completed: {}", log_data);
    }

    pub fn fail_rpc(&self, context: &RpcContext, error: &ShotgunError) {
        if !self.should_log(LogLevel::Warn) {
            return;
        }

        let log_data = json!({
            "event": "rpc_failed",
            "correlation_id": context.correlation_id,
            "method": context.method,
            "error": error.to_string(),
            "retryable": error.is_retryable(),
            "duration_ms": context.elapsed().as_millis(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        warn!("RPC Failed: {}", log_data);
    }

    fn should_log(&self, level: LogLevel) -> bool {
        level <= self.config.log_level
    }
}
