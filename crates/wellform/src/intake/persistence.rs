//! Durable sinks and the coordinator that fans a submission out to them.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{
    CompletionStatus, DocumentId, FieldValue, IdentityId, LogId, Submission,
};
use super::scoring::ScoreResult;
use crate::catalog::{AssessmentDefinition, AssessmentType};

/// Error shape shared by every storage sink.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence failures surfaced to the submitter.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to record the submission: {0}")]
    DocumentWrite(#[source] StoreError),
    #[error("identity directory unavailable: {0}")]
    Identity(#[source] StoreError),
}

/// One answer inside an immutable submission document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentField {
    pub value: FieldValue,
    pub label: String,
    pub recorded_at: DateTime<Utc>,
}

/// The authoritative record of one accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub assessment: AssessmentType,
    pub identity: Option<IdentityId>,
    pub fields: BTreeMap<String, DocumentField>,
    pub total_fields: usize,
    pub source_ip: String,
    pub completed_at: DateTime<Utc>,
    pub score: ScoreResult,
}

/// Insert payload for the document store; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub assessment: AssessmentType,
    pub identity: Option<IdentityId>,
    pub fields: BTreeMap<String, DocumentField>,
    pub total_fields: usize,
    pub source_ip: String,
    pub completed_at: DateTime<Utc>,
    pub score: ScoreResult,
}

pub trait DocumentStore: Send + Sync {
    fn insert(&self, document: NewDocument) -> Result<DocumentRecord, StoreError>;
    fn fetch(&self, id: DocumentId) -> Result<Option<DocumentRecord>, StoreError>;
    fn for_identity(&self, identity: IdentityId) -> Result<Vec<DocumentRecord>, StoreError>;
}

/// One reusable answer pinned to an identity's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileField {
    pub value: FieldValue,
    pub label: String,
    pub updated_at: DateTime<Utc>,
}

/// Latest-wins summary of an identity's most recent run of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestSubmission {
    pub answers: BTreeMap<String, FieldValue>,
    pub completion_score: u8,
    pub status: CompletionStatus,
    pub recorded_at: DateTime<Utc>,
}

pub trait ProfileStore: Send + Sync {
    fn upsert_field(
        &self,
        identity: IdentityId,
        assessment: AssessmentType,
        key: &str,
        field: ProfileField,
    ) -> Result<(), StoreError>;

    fn field(
        &self,
        identity: IdentityId,
        assessment: AssessmentType,
        key: &str,
    ) -> Result<Option<ProfileField>, StoreError>;

    fn record_latest(
        &self,
        identity: IdentityId,
        assessment: AssessmentType,
        latest: LatestSubmission,
    ) -> Result<(), StoreError>;

    fn latest(
        &self,
        identity: IdentityId,
        assessment: AssessmentType,
    ) -> Result<Option<LatestSubmission>, StoreError>;
}

/// Append payload for the submission log; the log assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogRow {
    pub identity: Option<IdentityId>,
    pub assessment: AssessmentType,
    pub answers_json: String,
    pub source_ip: String,
    pub document: DocumentId,
    pub created_at: DateTime<Utc>,
}

/// One append-only audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub id: LogId,
    pub identity: Option<IdentityId>,
    pub assessment: AssessmentType,
    pub answers_json: String,
    pub source_ip: String,
    pub document: DocumentId,
    pub created_at: DateTime<Utc>,
}

pub trait SubmissionLog: Send + Sync {
    fn append(&self, row: NewLogRow) -> Result<LogRow, StoreError>;
    fn recent(&self, limit: usize) -> Result<Vec<LogRow>, StoreError>;
}

/// Writes one sanitized submission to every sink. The document write is
/// authoritative; log and profile writes are best effort.
pub struct PersistenceCoordinator {
    documents: Arc<dyn DocumentStore>,
    profiles: Arc<dyn ProfileStore>,
    log: Arc<dyn SubmissionLog>,
}

impl PersistenceCoordinator {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        profiles: Arc<dyn ProfileStore>,
        log: Arc<dyn SubmissionLog>,
    ) -> Self {
        Self {
            documents,
            profiles,
            log,
        }
    }

    pub fn persist(
        &self,
        definition: &AssessmentDefinition,
        submission: &Submission,
        identity: Option<IdentityId>,
        score: &ScoreResult,
    ) -> Result<DocumentRecord, PersistenceError> {
        let mut fields = BTreeMap::new();
        for (key, value) in &submission.fields {
            fields.insert(
                key.clone(),
                DocumentField {
                    value: value.clone(),
                    label: field_label(definition, key),
                    recorded_at: submission.submitted_at,
                },
            );
        }

        let document = self
            .documents
            .insert(NewDocument {
                assessment: submission.assessment,
                identity,
                total_fields: fields.len(),
                fields,
                source_ip: submission.source_ip.clone(),
                completed_at: submission.submitted_at,
                score: score.clone(),
            })
            .map_err(PersistenceError::DocumentWrite)?;

        match serde_json::to_string(&submission.fields) {
            Ok(answers_json) => {
                let row = NewLogRow {
                    identity,
                    assessment: submission.assessment,
                    answers_json,
                    source_ip: submission.source_ip.clone(),
                    document: document.id,
                    created_at: submission.submitted_at,
                };
                if let Err(error) = self.log.append(row) {
                    warn!(%error, "submission log append failed");
                }
            }
            Err(error) => warn!(%error, "submission log skipped, answers not serializable"),
        }

        if let Some(identity) = identity {
            self.record_profile(identity, definition, submission, score);
        }

        Ok(document)
    }

    fn record_profile(
        &self,
        identity: IdentityId,
        definition: &AssessmentDefinition,
        submission: &Submission,
        score: &ScoreResult,
    ) {
        for (key, value) in &submission.fields {
            let field = ProfileField {
                value: value.clone(),
                label: field_label(definition, key),
                updated_at: submission.submitted_at,
            };
            if let Err(error) =
                self.profiles
                    .upsert_field(identity, submission.assessment, key, field)
            {
                warn!(%error, field = key.as_str(), "profile field upsert failed");
            }
        }

        let latest = LatestSubmission {
            answers: submission.fields.clone(),
            completion_score: score.completion_score,
            status: CompletionStatus::Completed,
            recorded_at: submission.submitted_at,
        };
        if let Err(error) = self
            .profiles
            .record_latest(identity, submission.assessment, latest)
        {
            warn!(%error, "latest submission summary write failed");
        }
    }
}

fn field_label(definition: &AssessmentDefinition, key: &str) -> String {
    definition
        .label_for(key)
        .map(str::to_string)
        .unwrap_or_else(|| humanize_key(key))
}

/// Title-case a snake_case key for display when no schema label exists.
fn humanize_key(key: &str) -> String {
    key.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::catalog::AssessmentCatalog;
    use crate::intake::domain::ContactDetails;
    use crate::intake::scoring::{AssessmentInsight, PriorityLevel};

    struct MemoryDocuments {
        records: Mutex<Vec<DocumentRecord>>,
    }

    impl DocumentStore for MemoryDocuments {
        fn insert(&self, document: NewDocument) -> Result<DocumentRecord, StoreError> {
            let mut records = self.records.lock().expect("documents mutex poisoned");
            let record = DocumentRecord {
                id: DocumentId(records.len() as i64 + 1),
                assessment: document.assessment,
                identity: document.identity,
                fields: document.fields,
                total_fields: document.total_fields,
                source_ip: document.source_ip,
                completed_at: document.completed_at,
                score: document.score,
            };
            records.push(record.clone());
            Ok(record)
        }

        fn fetch(&self, id: DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
            let records = self.records.lock().expect("documents mutex poisoned");
            Ok(records.iter().find(|record| record.id == id).cloned())
        }

        fn for_identity(&self, identity: IdentityId) -> Result<Vec<DocumentRecord>, StoreError> {
            let records = self.records.lock().expect("documents mutex poisoned");
            Ok(records
                .iter()
                .filter(|record| record.identity == Some(identity))
                .cloned()
                .collect())
        }
    }

    struct FailingDocuments;

    impl DocumentStore for FailingDocuments {
        fn insert(&self, _document: NewDocument) -> Result<DocumentRecord, StoreError> {
            Err(StoreError::Unavailable("disk full".to_string()))
        }

        fn fetch(&self, _id: DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
            Ok(None)
        }

        fn for_identity(&self, _identity: IdentityId) -> Result<Vec<DocumentRecord>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct MemoryProfiles {
        fields: Mutex<BTreeMap<(i64, AssessmentType, String), ProfileField>>,
        latest: Mutex<BTreeMap<(i64, AssessmentType), LatestSubmission>>,
        fail: bool,
    }

    impl ProfileStore for MemoryProfiles {
        fn upsert_field(
            &self,
            identity: IdentityId,
            assessment: AssessmentType,
            key: &str,
            field: ProfileField,
        ) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("profile store down".to_string()));
            }
            self.fields
                .lock()
                .expect("profiles mutex poisoned")
                .insert((identity.0, assessment, key.to_string()), field);
            Ok(())
        }

        fn field(
            &self,
            identity: IdentityId,
            assessment: AssessmentType,
            key: &str,
        ) -> Result<Option<ProfileField>, StoreError> {
            Ok(self
                .fields
                .lock()
                .expect("profiles mutex poisoned")
                .get(&(identity.0, assessment, key.to_string()))
                .cloned())
        }

        fn record_latest(
            &self,
            identity: IdentityId,
            assessment: AssessmentType,
            latest: LatestSubmission,
        ) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("profile store down".to_string()));
            }
            self.latest
                .lock()
                .expect("profiles mutex poisoned")
                .insert((identity.0, assessment), latest);
            Ok(())
        }

        fn latest(
            &self,
            identity: IdentityId,
            assessment: AssessmentType,
        ) -> Result<Option<LatestSubmission>, StoreError> {
            Ok(self
                .latest
                .lock()
                .expect("profiles mutex poisoned")
                .get(&(identity.0, assessment))
                .cloned())
        }
    }

    #[derive(Default)]
    struct MemoryLog {
        rows: Mutex<Vec<LogRow>>,
        fail: bool,
    }

    impl SubmissionLog for MemoryLog {
        fn append(&self, row: NewLogRow) -> Result<LogRow, StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("log store down".to_string()));
            }
            let mut rows = self.rows.lock().expect("log mutex poisoned");
            let stored = LogRow {
                id: LogId(rows.len() as i64 + 1),
                identity: row.identity,
                assessment: row.assessment,
                answers_json: row.answers_json,
                source_ip: row.source_ip,
                document: row.document,
                created_at: row.created_at,
            };
            rows.push(stored.clone());
            Ok(stored)
        }

        fn recent(&self, limit: usize) -> Result<Vec<LogRow>, StoreError> {
            let rows = self.rows.lock().expect("log mutex poisoned");
            Ok(rows.iter().rev().take(limit).cloned().collect())
        }
    }

    fn submission() -> Submission {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), FieldValue::text("Ada Lovelace"));
        fields.insert("email".to_string(), FieldValue::text("ada@example.com"));
        fields.insert("phone".to_string(), FieldValue::text("(555) 123-4567"));
        fields.insert("overall_health".to_string(), FieldValue::text("good"));
        Submission {
            assessment: AssessmentType::Health,
            fields,
            contact: ContactDetails {
                name: Some("Ada Lovelace".to_string()),
                email: Some("ada@example.com".to_string()),
                phone: Some("(555) 123-4567".to_string()),
            },
            source_ip: "203.0.113.5".to_string(),
            submitted_at: Utc::now(),
        }
    }

    fn score() -> ScoreResult {
        ScoreResult {
            completion_score: 40,
            body_mass: None,
            insight: AssessmentInsight::Consultation {
                priority: PriorityLevel::Standard,
            },
            recommendations: vec!["Complete assessment submitted successfully".to_string()],
            next_steps: "Schedule a consultation.".to_string(),
        }
    }

    fn definition() -> &'static AssessmentDefinition {
        static CATALOG: std::sync::OnceLock<AssessmentCatalog> = std::sync::OnceLock::new();
        CATALOG
            .get_or_init(|| AssessmentCatalog::builtin().expect("builtin catalog is valid"))
            .definition(AssessmentType::Health)
    }

    #[test]
    fn persists_document_log_and_profile() {
        let documents = Arc::new(MemoryDocuments {
            records: Mutex::new(Vec::new()),
        });
        let profiles = Arc::new(MemoryProfiles::default());
        let log = Arc::new(MemoryLog::default());
        let coordinator =
            PersistenceCoordinator::new(documents.clone(), profiles.clone(), log.clone());

        let document = coordinator
            .persist(definition(), &submission(), Some(IdentityId(4)), &score())
            .expect("persist succeeds");

        assert_eq!(document.total_fields, 4);
        assert_eq!(document.fields["overall_health"].label, "Overall Health");
        assert_eq!(document.fields["name"].label, "Full Name");

        let rows = log.recent(10).expect("log reads");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].document, document.id);
        assert!(rows[0].answers_json.contains("ada@example.com"));

        let stored = profiles
            .field(IdentityId(4), AssessmentType::Health, "overall_health")
            .expect("profile reads");
        assert_eq!(stored.map(|field| field.value), Some(FieldValue::text("good")));

        let latest = profiles
            .latest(IdentityId(4), AssessmentType::Health)
            .expect("latest reads")
            .expect("latest recorded");
        assert_eq!(latest.completion_score, 40);
        assert_eq!(latest.status, CompletionStatus::Completed);
    }

    #[test]
    fn document_write_failure_is_fatal() {
        let coordinator = PersistenceCoordinator::new(
            Arc::new(FailingDocuments),
            Arc::new(MemoryProfiles::default()),
            Arc::new(MemoryLog::default()),
        );
        let result = coordinator.persist(definition(), &submission(), None, &score());
        assert!(matches!(
            result,
            Err(PersistenceError::DocumentWrite(StoreError::Unavailable(_)))
        ));
    }

    #[test]
    fn log_and_profile_failures_do_not_fail_the_submission() {
        let documents = Arc::new(MemoryDocuments {
            records: Mutex::new(Vec::new()),
        });
        let coordinator = PersistenceCoordinator::new(
            documents.clone(),
            Arc::new(MemoryProfiles {
                fail: true,
                ..MemoryProfiles::default()
            }),
            Arc::new(MemoryLog {
                fail: true,
                ..MemoryLog::default()
            }),
        );

        let document = coordinator
            .persist(definition(), &submission(), Some(IdentityId(4)), &score())
            .expect("document write still succeeds");
        assert_eq!(
            documents.fetch(document.id).expect("fetch succeeds").map(|d| d.id),
            Some(document.id)
        );
    }

    #[test]
    fn anonymous_submissions_skip_the_profile() {
        let profiles = Arc::new(MemoryProfiles::default());
        let coordinator = PersistenceCoordinator::new(
            Arc::new(MemoryDocuments {
                records: Mutex::new(Vec::new()),
            }),
            profiles.clone(),
            Arc::new(MemoryLog::default()),
        );

        coordinator
            .persist(definition(), &submission(), None, &score())
            .expect("persist succeeds");
        assert!(profiles
            .field(IdentityId(4), AssessmentType::Health, "overall_health")
            .expect("profile reads")
            .is_none());
    }

    #[test]
    fn keys_without_labels_are_humanized() {
        assert_eq!(humanize_key("current_weight"), "Current Weight");
        assert_eq!(humanize_key("dob"), "Dob");
        assert_eq!(humanize_key("a__b"), "A B");
    }
}
