use chrono::{DateTime, Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;
use wellform::catalog::AssessmentType;
use wellform::intake::{
    DocumentId, DocumentRecord, DocumentStore, Identity, IdentityDirectory, IdentityId,
    LatestSubmission, LogId, LogRow, Mailer, NewDocument, NewIdentity, NewLogRow, NotifyError,
    OutboundMessage, ProfileField, ProfileStore, RateCounterStore, RateDecision, StoreError,
    SubmissionLog,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryDocumentStore {
    records: Arc<Mutex<Vec<DocumentRecord>>>,
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert(&self, document: NewDocument) -> Result<DocumentRecord, StoreError> {
        let mut guard = self.records.lock().expect("document mutex poisoned");
        let record = DocumentRecord {
            id: DocumentId(guard.len() as i64 + 1),
            assessment: document.assessment,
            identity: document.identity,
            fields: document.fields,
            total_fields: document.total_fields,
            source_ip: document.source_ip,
            completed_at: document.completed_at,
            score: document.score,
        };
        guard.push(record.clone());
        Ok(record)
    }

    fn fetch(&self, id: DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        let guard = self.records.lock().expect("document mutex poisoned");
        Ok(guard.iter().find(|record| record.id == id).cloned())
    }

    fn for_identity(&self, identity: IdentityId) -> Result<Vec<DocumentRecord>, StoreError> {
        let guard = self.records.lock().expect("document mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| record.identity == Some(identity))
            .cloned()
            .collect())
    }
}

impl InMemoryDocumentStore {
    pub(crate) fn all(&self) -> Vec<DocumentRecord> {
        self.records.lock().expect("document mutex poisoned").clone()
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileStore {
    fields: Arc<Mutex<HashMap<(i64, AssessmentType, String), ProfileField>>>,
    latest: Arc<Mutex<HashMap<(i64, AssessmentType), LatestSubmission>>>,
}

impl ProfileStore for InMemoryProfileStore {
    fn upsert_field(
        &self,
        identity: IdentityId,
        assessment: AssessmentType,
        key: &str,
        field: ProfileField,
    ) -> Result<(), StoreError> {
        let mut guard = self.fields.lock().expect("profile mutex poisoned");
        guard.insert((identity.0, assessment, key.to_string()), field);
        Ok(())
    }

    fn field(
        &self,
        identity: IdentityId,
        assessment: AssessmentType,
        key: &str,
    ) -> Result<Option<ProfileField>, StoreError> {
        let guard = self.fields.lock().expect("profile mutex poisoned");
        Ok(guard.get(&(identity.0, assessment, key.to_string())).cloned())
    }

    fn record_latest(
        &self,
        identity: IdentityId,
        assessment: AssessmentType,
        latest: LatestSubmission,
    ) -> Result<(), StoreError> {
        let mut guard = self.latest.lock().expect("profile mutex poisoned");
        guard.insert((identity.0, assessment), latest);
        Ok(())
    }

    fn latest(
        &self,
        identity: IdentityId,
        assessment: AssessmentType,
    ) -> Result<Option<LatestSubmission>, StoreError> {
        let guard = self.latest.lock().expect("profile mutex poisoned");
        Ok(guard.get(&(identity.0, assessment)).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySubmissionLog {
    rows: Arc<Mutex<Vec<LogRow>>>,
}

impl SubmissionLog for InMemorySubmissionLog {
    fn append(&self, row: NewLogRow) -> Result<LogRow, StoreError> {
        let mut guard = self.rows.lock().expect("log mutex poisoned");
        let stored = LogRow {
            id: LogId(guard.len() as i64 + 1),
            identity: row.identity,
            assessment: row.assessment,
            answers_json: row.answers_json,
            source_ip: row.source_ip,
            document: row.document,
            created_at: row.created_at,
        };
        guard.push(stored.clone());
        Ok(stored)
    }

    fn recent(&self, limit: usize) -> Result<Vec<LogRow>, StoreError> {
        let guard = self.rows.lock().expect("log mutex poisoned");
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryIdentityDirectory {
    identities: Arc<Mutex<Vec<Identity>>>,
}

impl IdentityDirectory for InMemoryIdentityDirectory {
    fn fetch(&self, id: IdentityId) -> Result<Option<Identity>, StoreError> {
        let guard = self.identities.lock().expect("directory mutex poisoned");
        Ok(guard.iter().find(|identity| identity.id == id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let guard = self.identities.lock().expect("directory mutex poisoned");
        Ok(guard.iter().find(|identity| identity.email == email).cloned())
    }

    fn create(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let mut guard = self.identities.lock().expect("directory mutex poisoned");
        if guard.iter().any(|known| known.email == identity.email) {
            return Err(StoreError::Conflict);
        }
        let created = Identity {
            id: IdentityId(guard.len() as i64 + 1),
            email: identity.email,
            name: identity.name,
            phone: identity.phone,
            created_at: identity.created_at,
        };
        guard.push(created.clone());
        Ok(created)
    }

    fn update(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut guard = self.identities.lock().expect("directory mutex poisoned");
        match guard.iter_mut().find(|known| known.id == identity.id) {
            Some(known) => {
                *known = identity.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

impl InMemoryIdentityDirectory {
    pub(crate) fn all(&self) -> Vec<Identity> {
        self.identities.lock().expect("directory mutex poisoned").clone()
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryRateCounter {
    counters: Arc<Mutex<HashMap<String, (DateTime<Utc>, u32)>>>,
}

impl RateCounterStore for InMemoryRateCounter {
    fn try_count(
        &self,
        key: &str,
        max: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, StoreError> {
        let mut guard = self.counters.lock().expect("counter mutex poisoned");
        let entry = guard.entry(key.to_string()).or_insert((now, 0));
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryMailer {
    messages: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl Mailer for InMemoryMailer {
    fn send(&self, message: OutboundMessage) -> Result<(), NotifyError> {
        let mut guard = self.messages.lock().expect("mailer mutex poisoned");
        guard.push(message);
        Ok(())
    }
}

impl InMemoryMailer {
    pub(crate) fn sent(&self) -> Vec<OutboundMessage> {
        self.messages.lock().expect("mailer mutex poisoned").clone()
    }
}

/// Mailer used when serving without an SMTP relay: each message lands in the
/// log instead of a mailbox.
pub(crate) struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: OutboundMessage) -> Result<(), NotifyError> {
        info!(
            to = message.to.as_str(),
            subject = message.subject.as_str(),
            "outbound mail"
        );
        Ok(())
    }
}

pub(crate) fn parse_assessment(raw: &str) -> Result<AssessmentType, String> {
    AssessmentType::parse(raw.trim()).ok_or_else(|| {
        let known = AssessmentType::ALL
            .iter()
            .map(|kind| kind.slug())
            .collect::<Vec<_>>()
            .join(", ");
        format!("unknown assessment type '{raw}' (expected one of: {known})")
    })
}
