//! Core types threaded through the intake stages.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::AssessmentType;

/// Identifier wrapper for resolved identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityId(pub i64);

/// Identifier wrapper for immutable submission documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub i64);

/// Identifier wrapper for append-only log rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogId(pub i64);

/// One submitted answer: either a plain value or a multi-choice list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(value) => value.trim().is_empty(),
            FieldValue::List(values) => values.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            FieldValue::List(_) => None,
        }
    }

    /// Flat rendering for notification bodies and log lines.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(value) => value.clone(),
            FieldValue::List(values) => values.join(", "),
        }
    }
}

/// Raw submission payload exactly as the endpoint receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_token: Option<String>,
    pub assessment_type: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

/// Request-scoped context threaded through every pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub source_ip: String,
    /// Identity of an authenticated session, when the host resolved one.
    pub session_identity: Option<IdentityId>,
}

impl ClientContext {
    pub fn anonymous(source_ip: impl Into<String>) -> Self {
        Self {
            source_ip: source_ip.into(),
            session_identity: None,
        }
    }

    pub fn authenticated(source_ip: impl Into<String>, identity: IdentityId) -> Self {
        Self {
            source_ip: source_ip.into(),
            session_identity: Some(identity),
        }
    }
}

/// Contact details extracted from the sanitized field map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A sanitized submission. Lives for the duration of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub assessment: AssessmentType,
    /// Every sanitized field, contact values included.
    pub fields: BTreeMap<String, FieldValue>,
    pub contact: ContactDetails,
    pub source_ip: String,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn field_text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(FieldValue::as_text)
    }

    /// Count of fields that survived sanitation with a substantive value.
    pub fn answered_fields(&self) -> usize {
        self.fields.values().filter(|value| !value.is_empty()).count()
    }
}

/// Completion state recorded on the per-identity latest summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    Completed,
}

impl CompletionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CompletionStatus::Completed => "completed",
        }
    }
}
