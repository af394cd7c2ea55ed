//! Audit events emitted by the token engine.
//!
//! Events are explicit values handed to a sink rather than logging calls
//! buried in business logic, so the core stays testable without a
//! logging backend. Emission is fire-and-forget: a sink must never block
//! or fail a token operation.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{error, info, warn};

/// Event type names.
pub mod event {
    /// A refresh token was rotated.
    pub const TOKEN_ROTATED: &str = "TOKEN_ROTATED";
    /// An already-consumed refresh token was presented again.
    pub const TOKEN_REUSE_DETECTED: &str = "TOKEN_REUSE_DETECTED";
    /// A single token was explicitly revoked.
    pub const TOKEN_REVOKED: &str = "TOKEN_REVOKED";
    /// All of a user's tokens were revoked.
    pub const USER_TOKENS_REVOKED: &str = "USER_TOKENS_REVOKED";
    /// A new token pair was issued at login.
    pub const TOKEN_PAIR_ISSUED: &str = "TOKEN_PAIR_ISSUED";
}

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditSeverity {
    /// Routine lifecycle activity.
    Info,
    /// Degraded or suspicious but contained.
    Warning,
    /// Active compromise indicator.
    Critical,
}

/// A structured audit event.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event type, one of the [`event`] constants.
    pub event_type: &'static str,
    /// Severity.
    pub severity: AuditSeverity,
    /// Structured context fields. Never contains raw secrets.
    pub context: HashMap<String, Value>,
}

impl AuditEvent {
    /// Create an event with empty context.
    #[must_use]
    pub fn new(event_type: &'static str, severity: AuditSeverity) -> Self {
        Self {
            event_type,
            severity,
            context: HashMap::new(),
        }
    }

    /// Attach a context field.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

/// Receives audit events from the engine.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record an event. Must not fail; failures are the sink's problem.
    async fn emit(&self, event: AuditEvent);
}

/// Sink that maps events onto `tracing` at severity-appropriate levels.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn emit(&self, event: AuditEvent) {
        let context = serde_json::to_string(&event.context).unwrap_or_default();
        match event.severity {
            AuditSeverity::Info => {
                info!(event_type = %event.event_type, %context, "audit event");
            }
            AuditSeverity::Warning => {
                warn!(event_type = %event.event_type, %context, "audit event");
            }
            AuditSeverity::Critical => {
                error!(event_type = %event.event_type, %context, "audit event");
            }
        }
    }
}

/// Sink that drops everything.
#[derive(Debug, Default)]
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn emit(&self, _event: AuditEvent) {}
}
