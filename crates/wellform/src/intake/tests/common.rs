use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::catalog::{AssessmentCatalog, AssessmentType};
use crate::config::IntakeConfig;
use crate::intake::domain::{DocumentId, FieldValue, IdentityId, LogId, SubmissionRequest};
use crate::intake::gateway::{derive_token, SUBMIT_ACTION};
use crate::intake::identity::{Identity, IdentityDirectory, NewIdentity};
use crate::intake::notify::{Mailer, NotifyError, OutboundMessage};
use crate::intake::persistence::{
    DocumentRecord, DocumentStore, LatestSubmission, LogRow, NewDocument, NewLogRow, ProfileField,
    ProfileStore, StoreError, SubmissionLog,
};
use crate::intake::rate_limit::{RateCounterStore, RateDecision};
use crate::intake::service::{IntakePipeline, IntakeSinks};

pub(super) const TEST_SECRET: &str = "test-secret";

pub(super) fn intake_config() -> IntakeConfig {
    IntakeConfig {
        secret: TEST_SECRET.to_string(),
        rate_limit_max: 10,
        rate_limit_window_secs: 3_600,
        base_url: "https://wellform.example".to_string(),
        operator_email: "care-team@wellform.example".to_string(),
    }
}

pub(super) fn submit_token() -> String {
    derive_token(TEST_SECRET, SUBMIT_ACTION)
}

pub(super) fn request_with_fields(
    assessment: &str,
    entries: &[(&str, FieldValue)],
) -> SubmissionRequest {
    SubmissionRequest {
        security_token: Some(submit_token()),
        assessment_type: assessment.to_string(),
        fields: entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.clone()))
            .collect(),
    }
}

pub(super) fn weight_loss_request() -> SubmissionRequest {
    request_with_fields(
        "weight_loss",
        &[
            ("name", FieldValue::text("Ada Lovelace")),
            ("email", FieldValue::text("ada@example.com")),
            ("current_weight", FieldValue::text("90")),
            ("goal_weight", FieldValue::text("75")),
            ("height", FieldValue::text("170")),
        ],
    )
}

pub(super) fn health_request() -> SubmissionRequest {
    request_with_fields(
        "health",
        &[
            ("name", FieldValue::text("Ada Lovelace")),
            ("email", FieldValue::text("ada@example.com")),
            ("phone", FieldValue::text("(555) 123-4567")),
            ("overall_health", FieldValue::text("good")),
            ("energy_level", FieldValue::text("medium")),
            ("sleep_quality", FieldValue::text("fair")),
            ("exercise_frequency", FieldValue::text("weekly")),
            ("dob", FieldValue::text("1991-03-14")),
        ],
    )
}

pub(super) struct Harness {
    pub(super) pipeline: Arc<IntakePipeline>,
    pub(super) documents: MemoryDocuments,
    pub(super) profiles: MemoryProfiles,
    pub(super) log: MemoryLog,
    pub(super) directory: MemoryDirectory,
    pub(super) mailer: MemoryMailer,
}

pub(super) fn harness() -> Harness {
    harness_with(intake_config())
}

pub(super) fn harness_with(config: IntakeConfig) -> Harness {
    let documents = MemoryDocuments::default();
    let profiles = MemoryProfiles::default();
    let log = MemoryLog::default();
    let directory = MemoryDirectory::default();
    let counters = MemoryCounters::default();
    let mailer = MemoryMailer::default();

    let catalog = Arc::new(AssessmentCatalog::builtin().expect("builtin catalog is valid"));
    let sinks = IntakeSinks {
        documents: Arc::new(documents.clone()),
        profiles: Arc::new(profiles.clone()),
        log: Arc::new(log.clone()),
        identities: Arc::new(directory.clone()),
        counters: Arc::new(counters),
        mailer: Arc::new(mailer.clone()),
    };

    Harness {
        pipeline: Arc::new(IntakePipeline::new(catalog, sinks, &config)),
        documents,
        profiles,
        log,
        directory,
        mailer,
    }
}

/// Harness wired to a document store that always fails.
pub(super) fn harness_with_broken_documents() -> Harness {
    let documents = MemoryDocuments::default();
    let profiles = MemoryProfiles::default();
    let log = MemoryLog::default();
    let directory = MemoryDirectory::default();
    let mailer = MemoryMailer::default();

    let catalog = Arc::new(AssessmentCatalog::builtin().expect("builtin catalog is valid"));
    let sinks = IntakeSinks {
        documents: Arc::new(UnavailableDocuments),
        profiles: Arc::new(profiles.clone()),
        log: Arc::new(log.clone()),
        identities: Arc::new(directory.clone()),
        counters: Arc::new(MemoryCounters::default()),
        mailer: Arc::new(mailer.clone()),
    };

    Harness {
        pipeline: Arc::new(IntakePipeline::new(catalog, sinks, &intake_config())),
        documents,
        profiles,
        log,
        directory,
        mailer,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDocuments {
    records: Arc<Mutex<Vec<DocumentRecord>>>,
}

impl MemoryDocuments {
    pub(super) fn all(&self) -> Vec<DocumentRecord> {
        self.records.lock().expect("documents mutex poisoned").clone()
    }
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

pub(super) struct UnavailableDocuments;

impl DocumentStore for UnavailableDocuments {
    fn insert(&self, _document: NewDocument) -> Result<DocumentRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn for_identity(&self, _identity: IdentityId) -> Result<Vec<DocumentRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryProfiles {
    fields: Arc<Mutex<HashMap<(i64, AssessmentType, String), ProfileField>>>,
    latest: Arc<Mutex<HashMap<(i64, AssessmentType), LatestSubmission>>>,
}

impl ProfileStore for MemoryProfiles {
    fn upsert_field(
        &self,
        identity: IdentityId,
        assessment: AssessmentType,
        key: &str,
        field: ProfileField,
    ) -> Result<(), StoreError> {
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

#[derive(Default, Clone)]
pub(super) struct MemoryLog {
    rows: Arc<Mutex<Vec<LogRow>>>,
}

impl MemoryLog {
    pub(super) fn rows(&self) -> Vec<LogRow> {
        self.rows.lock().expect("log mutex poisoned").clone()
    }
}

impl SubmissionLog for MemoryLog {
    fn append(&self, row: NewLogRow) -> Result<LogRow, StoreError> {
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

#[derive(Default, Clone)]
pub(super) struct MemoryDirectory {
    identities: Arc<Mutex<Vec<Identity>>>,
}

impl MemoryDirectory {
    pub(super) fn all(&self) -> Vec<Identity> {
        self.identities.lock().expect("directory mutex poisoned").clone()
    }

    pub(super) fn seed(&self, identity: Identity) {
        self.identities
            .lock()
            .expect("directory mutex poisoned")
            .push(identity);
    }
}

impl IdentityDirectory for MemoryDirectory {
    fn fetch(&self, id: IdentityId) -> Result<Option<Identity>, StoreError> {
        let identities = self.identities.lock().expect("directory mutex poisoned");
        Ok(identities.iter().find(|identity| identity.id == id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let identities = self.identities.lock().expect("directory mutex poisoned");
        Ok(identities
            .iter()
            .find(|identity| identity.email == email)
            .cloned())
    }

    fn create(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let mut identities = self.identities.lock().expect("directory mutex poisoned");
        if identities.iter().any(|known| known.email == identity.email) {
            return Err(StoreError::Conflict);
        }
        let created = Identity {
            id: IdentityId(identities.len() as i64 + 1),
            email: identity.email,
            name: identity.name,
            phone: identity.phone,
            created_at: identity.created_at,
        };
        identities.push(created.clone());
        Ok(created)
    }

    fn update(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut identities = self.identities.lock().expect("directory mutex poisoned");
        match identities.iter_mut().find(|known| known.id == identity.id) {
            Some(known) => {
                *known = identity.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

/// Counter with the real window semantics: the window starts at the first
/// counted attempt and refused attempts never refresh it.
#[derive(Default, Clone)]
pub(super) struct MemoryCounters {
    windows: Arc<Mutex<HashMap<String, (DateTime<Utc>, u32)>>>,
}

impl RateCounterStore for MemoryCounters {
    fn try_count(
        &self,
        key: &str,
        max: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, StoreError> {
        let mut windows = self.windows.lock().expect("counter mutex poisoned");
        let entry = windows.entry(key.to_string()).or_insert((now, 0));
        if now >= entry.0 + window {
            *entry = (now, 0);
        }
        if entry.1 >= max {
            return Ok(RateDecision::Limited);
        }
        entry.1 += 1;
        Ok(RateDecision::Admitted { count: entry.1 })
    }
}

pub(super) struct BrokenCounters;

impl RateCounterStore for BrokenCounters {
    fn try_count(
        &self,
        _key: &str,
        _max: u32,
        _window: Duration,
        _now: DateTime<Utc>,
    ) -> Result<RateDecision, StoreError> {
        Err(StoreError::Unavailable("counter store offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryMailer {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl MemoryMailer {
    pub(super) fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, message: OutboundMessage) -> Result<(), NotifyError> {
        self.sent.lock().expect("mailer mutex poisoned").push(message);
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
