//! Audit events.
//!
//! Security-relevant actions (logins, token checks, account changes,
//! degraded identity resolution) are recorded as [`Event`]s and emitted
//! through `tracing` under the `audit` target, so any subscriber can route
//! them to a dedicated sink.
//!
//! All events include:
//! - Timestamp (UTC)
//! - Event type
//! - User identity (when available)
//! - Outcome (success/failure)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sparky_model::Realm;
use uuid::Uuid;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Authentication events
    /// Login attempt succeeded.
    Login,
    /// Login attempt failed.
    LoginError,
    /// Token verification.
    VerifyToken,
    /// Token verification failed.
    VerifyTokenError,

    // Account events
    /// User created.
    CreateUser,
    /// User edited.
    UpdateUser,
    /// Password changed.
    UpdatePassword,
    /// User deleted.
    DeleteUser,
    /// Directory user mirrored into the store.
    MirrorDirectoryUser,

    // Identity resolution events
    /// Identity resolved through the cross-realm fallback.
    CrossRealmFallback,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// A security event for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: EventType,
    /// Outcome of the event.
    pub outcome: EventOutcome,
    /// Username the event is about.
    pub username: Option<String>,
    /// Realm of that user.
    pub realm: Option<Realm>,
    /// Username of the acting user, when different from `username`.
    pub actor: Option<String>,
    /// Error message (for failure events).
    pub error: Option<String>,
    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl Event {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder::new(event_type)
    }

    /// Writes the event to the `audit` tracing target.
    pub fn emit(&self) {
        let payload = serde_json::to_string(self).unwrap_or_default();
        match self.outcome {
            EventOutcome::Success => tracing::info!(
                target: "audit",
                event_type = ?self.event_type,
                username = self.username.as_deref().unwrap_or("-"),
                event = %payload,
                "audit event"
            ),
            EventOutcome::Failure => tracing::warn!(
                target: "audit",
                event_type = ?self.event_type,
                username = self.username.as_deref().unwrap_or("-"),
                error = self.error.as_deref().unwrap_or("-"),
                event = %payload,
                "audit event"
            ),
        }
    }
}

/// Builder for creating events.
#[derive(Debug)]
pub struct EventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    username: Option<String>,
    realm: Option<Realm>,
    actor: Option<String>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl EventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            username: None,
            realm: None,
            actor: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to success.
    #[must_use]
    pub const fn success(mut self) -> Self {
        self.outcome = EventOutcome::Success;
        self
    }

    /// Sets the outcome to failure with an error message.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the user the event is about.
    #[must_use]
    pub fn user(mut self, username: impl Into<String>, realm: Realm) -> Self {
        self.username = Some(username.into());
        self.realm = Some(realm);
        self
    }

    /// Sets the username without a known realm.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the acting user.
    #[must_use]
    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            username: self.username,
            realm: self.realm,
            actor: self.actor,
            error: self.error,
            details: self.details,
        }
    }

    /// Builds and emits the event.
    pub fn emit(self) {
        self.build().emit();
    }
}
