//! Field sanitation and schema validation for raw submissions.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{ClientContext, ContactDetails, FieldValue, Submission, SubmissionRequest};
use crate::catalog::{AssessmentCatalog, AssessmentType, FieldKind};

/// Free-text answers are capped at this many characters.
pub const FREE_TEXT_MAX_CHARS: usize = 200;

/// A submission must carry at least this many substantive answers.
pub const MIN_SUBSTANTIVE_ANSWERS: usize = 3;

const MIN_PHONE_DIGITS: usize = 10;

/// Transport-level keys stripped before validation.
const SYSTEM_FIELDS: &[&str] = &["action", "security_token", "nonce", "assessment_type"];

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown assessment type {0:?}")]
    UnknownAssessment(String),
    #[error("the field {field:?} is required")]
    MissingField { field: String },
    #[error("the field {field:?} is invalid: {reason}")]
    InvalidField { field: String, reason: &'static str },
    #[error("unknown field {0:?}")]
    UnknownField(String),
    #[error("{provided} answers provided, at least {minimum} required")]
    TooFewAnswers { provided: usize, minimum: usize },
}

/// Validates and normalizes raw requests into [`Submission`]s.
pub struct Sanitizer {
    catalog: Arc<AssessmentCatalog>,
}

impl Sanitizer {
    pub fn new(catalog: Arc<AssessmentCatalog>) -> Self {
        Self { catalog }
    }

    /// Apply per-kind sanitation to every submitted field, refuse unknown
    /// keys, then enforce the definition's required list and the minimum
    /// answer count. Fields that sanitize to empty are dropped rather than
    /// stored.
    pub fn sanitize(
        &self,
        request: SubmissionRequest,
        ctx: &ClientContext,
        now: DateTime<Utc>,
    ) -> Result<Submission, ValidationError> {
        let assessment = AssessmentType::parse(&request.assessment_type)
            .ok_or_else(|| ValidationError::UnknownAssessment(request.assessment_type.clone()))?;
        let definition = self.catalog.definition(assessment);

        let mut fields = BTreeMap::new();
        for (key, value) in &request.fields {
            if SYSTEM_FIELDS.contains(&key.as_str()) {
                continue;
            }
            let kind = definition
                .field_kind(key)
                .ok_or_else(|| ValidationError::UnknownField(key.clone()))?;
            let sanitized = if kind == FieldKind::MultiChoice {
                sanitize_list(value)
            } else {
                FieldValue::Text(sanitize_scalar(key, kind, value)?)
            };
            if !sanitized.is_empty() {
                fields.insert(key.clone(), sanitized);
            }
        }

        for key in &definition.required {
            if !fields.contains_key(*key) {
                return Err(ValidationError::MissingField {
                    field: (*key).to_string(),
                });
            }
        }

        let provided = fields.values().filter(|value| !value.is_empty()).count();
        if provided < MIN_SUBSTANTIVE_ANSWERS {
            return Err(ValidationError::TooFewAnswers {
                provided,
                minimum: MIN_SUBSTANTIVE_ANSWERS,
            });
        }

        let contact = ContactDetails {
            name: contact_text(&fields, "name"),
            email: contact_text(&fields, "email"),
            phone: contact_text(&fields, "phone"),
        };

        Ok(Submission {
            assessment,
            fields,
            contact,
            source_ip: ctx.source_ip.clone(),
            submitted_at: now,
        })
    }
}

fn contact_text(fields: &BTreeMap<String, FieldValue>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(FieldValue::as_text)
        .map(str::to_string)
}

fn sanitize_list(value: &FieldValue) -> FieldValue {
    let raw_items: Vec<&str> = match value {
        FieldValue::List(items) => items.iter().map(String::as_str).collect(),
        FieldValue::Text(text) => vec![text.as_str()],
    };

    let mut cleaned = Vec::new();
    for item in raw_items {
        let item = clean_text(item);
        if !item.is_empty() {
            cleaned.push(item);
        }
    }
    FieldValue::List(cleaned)
}

fn sanitize_scalar(
    key: &str,
    kind: FieldKind,
    value: &FieldValue,
) -> Result<String, ValidationError> {
    // A list submitted for a scalar key is flattened, not refused.
    let raw = match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::List(items) => items.join(", "),
    };

    match kind {
        FieldKind::Name => Ok(sanitize_name(&raw)),
        FieldKind::Email => sanitize_email(key, &raw),
        FieldKind::Phone => sanitize_phone(key, &raw),
        FieldKind::Number => sanitize_number(key, &raw),
        FieldKind::Date => sanitize_date(key, &raw),
        FieldKind::FreeText => Ok(free_text(&raw)),
        FieldKind::Choice | FieldKind::MultiChoice => Ok(clean_text(&raw)),
    }
}

/// Strip non-whitespace control characters and angle brackets, then
/// collapse whitespace runs to single spaces.
fn clean_text(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|ch| (!ch.is_control() || ch.is_whitespace()) && *ch != '<' && *ch != '>')
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn free_text(raw: &str) -> String {
    clean_text(raw).chars().take(FREE_TEXT_MAX_CHARS).collect()
}

fn sanitize_name(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|ch| ch.is_alphabetic() || matches!(ch, ' ' | '-' | '\'' | '.'))
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sanitize_email(key: &str, raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_ascii_lowercase();
    if email.is_empty() {
        return Ok(email);
    }

    let shape_ok = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.len() >= 3
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email
                    .chars()
                    .any(|ch| ch.is_whitespace() || matches!(ch, '<' | '>' | ','))
        }
        None => false,
    };

    if shape_ok {
        Ok(email)
    } else {
        Err(invalid(key, "not a valid email address"))
    }
}

fn sanitize_phone(key: &str, raw: &str) -> Result<String, ValidationError> {
    let kept: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, '+' | '-' | '(' | ')' | ' '))
        .collect();
    let kept = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    if kept.is_empty() {
        return Ok(kept);
    }

    let digits = kept.chars().filter(|ch| ch.is_ascii_digit()).count();
    if digits < MIN_PHONE_DIGITS {
        return Err(invalid(key, "expected at least 10 digits"));
    }
    Ok(kept)
}

fn sanitize_number(key: &str, raw: &str) -> Result<String, ValidationError> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return Ok(cleaned);
    }
    match lenient_number(&cleaned) {
        Some(_) => Ok(cleaned),
        None => Err(invalid(key, "not a number")),
    }
}

fn sanitize_date(key: &str, raw: &str) -> Result<String, ValidationError> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return Ok(cleaned);
    }
    NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d")
        .map(|_| cleaned)
        .map_err(|_| invalid(key, "expected an ISO date (YYYY-MM-DD)"))
}

fn invalid(key: &str, reason: &'static str) -> ValidationError {
    ValidationError::InvalidField {
        field: key.to_string(),
        reason,
    }
}

/// Read the leading numeric prefix of an answer, if any.
pub(crate) fn lenient_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '+' | '-' if idx == 0 => end = idx + 1,
            '.' if !seen_dot => {
                seen_dot = true;
                end = idx + 1;
            }
            '0'..='9' => {
                seen_digit = true;
                end = idx + 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return None;
    }
    trimmed[..end].parse::<f64>().ok()
}
