//! SQLite-backed sinks for durable serving.
//!
//! One connection is shared behind a mutex; every sink handle clones the
//! same connection, so the submit path keeps its write ordering. Timestamps
//! are stored as RFC 3339 text and structured values as JSON columns.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use wellform::catalog::AssessmentType;
use wellform::intake::{
    CompletionStatus, DocumentId, DocumentRecord, DocumentStore, Identity, IdentityDirectory,
    IdentityId, LatestSubmission, LogId, LogRow, NewDocument, NewIdentity, NewLogRow,
    ProfileField, ProfileStore, RateCounterStore, RateDecision, StoreError, SubmissionLog,
};

const CREATE_SCHEMA_MIGRATIONS: &str = "
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
";

const MIGRATION_001: &str = "
CREATE TABLE IF NOT EXISTS identities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    name TEXT,
    phone TEXT,
    credential TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assessment_documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    assessment TEXT NOT NULL,
    identity_id INTEGER REFERENCES identities(id),
    fields_json TEXT NOT NULL,
    total_fields INTEGER NOT NULL,
    source_ip TEXT NOT NULL,
    completed_at TEXT NOT NULL,
    score_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_identity
    ON assessment_documents(identity_id);

CREATE TABLE IF NOT EXISTS profile_fields (
    identity_id INTEGER NOT NULL,
    assessment TEXT NOT NULL,
    field_key TEXT NOT NULL,
    value_json TEXT NOT NULL,
    label TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (identity_id, assessment, field_key)
);

CREATE TABLE IF NOT EXISTS latest_submissions (
    identity_id INTEGER NOT NULL,
    assessment TEXT NOT NULL,
    answers_json TEXT NOT NULL,
    completion_score INTEGER NOT NULL,
    status TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    PRIMARY KEY (identity_id, assessment)
);

CREATE TABLE IF NOT EXISTS submission_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    identity_id INTEGER,
    assessment TEXT NOT NULL,
    answers_json TEXT NOT NULL,
    source_ip TEXT NOT NULL,
    document_id INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rate_counters (
    counter_key TEXT PRIMARY KEY,
    window_started_at TEXT NOT NULL,
    attempts INTEGER NOT NULL
);
";

const SCHEMA_MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_001)];

/// Owns the connection and hands out per-sink handles.
pub(crate) struct SqliteStores {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStores {
    pub(crate) fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(store_error)?;
        Self::initialize(conn)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(store_error)?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(store_error)?;
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn documents(&self) -> SqliteDocumentStore {
        SqliteDocumentStore {
            conn: Arc::clone(&self.conn),
        }
    }

    pub(crate) fn profiles(&self) -> SqliteProfileStore {
        SqliteProfileStore {
            conn: Arc::clone(&self.conn),
        }
    }

    pub(crate) fn log(&self) -> SqliteSubmissionLog {
        SqliteSubmissionLog {
            conn: Arc::clone(&self.conn),
        }
    }

    pub(crate) fn identities(&self) -> SqliteIdentityDirectory {
        SqliteIdentityDirectory {
            conn: Arc::clone(&self.conn),
        }
    }

    pub(crate) fn counters(&self) -> SqliteRateCounter {
        SqliteRateCounter {
            conn: Arc::clone(&self.conn),
        }
    }
}

fn migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(CREATE_SCHEMA_MIGRATIONS)
        .map_err(store_error)?;
    let current: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(store_error)?;

    for (version, sql) in SCHEMA_MIGRATIONS {
        if *version > current {
            conn.execute_batch(sql).map_err(store_error)?;
            conn.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                params![*version, Utc::now().to_rfc3339()],
            )
            .map_err(store_error)?;
        }
    }
    Ok(())
}

fn store_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict
        }
        other => StoreError::Unavailable(other.to_string()),
    }
}

fn json_error(err: serde_json::Error) -> StoreError {
    StoreError::Unavailable(format!("stored value not decodable: {err}"))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| StoreError::Unavailable(format!("bad timestamp '{raw}': {err}")))
}

fn parse_assessment_slug(raw: &str) -> Result<AssessmentType, StoreError> {
    AssessmentType::parse(raw)
        .ok_or_else(|| StoreError::Unavailable(format!("unknown assessment '{raw}' in store")))
}

fn parse_status(raw: &str) -> Result<CompletionStatus, StoreError> {
    match raw {
        "completed" => Ok(CompletionStatus::Completed),
        other => Err(StoreError::Unavailable(format!(
            "unknown completion status '{other}' in store"
        ))),
    }
}

#[derive(Clone)]
pub(crate) struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

struct DocumentRow {
    id: i64,
    assessment: String,
    identity: Option<i64>,
    fields_json: String,
    total_fields: i64,
    source_ip: String,
    completed_at: String,
    score_json: String,
}

fn document_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        assessment: row.get(1)?,
        identity: row.get(2)?,
        fields_json: row.get(3)?,
        total_fields: row.get(4)?,
        source_ip: row.get(5)?,
        completed_at: row.get(6)?,
        score_json: row.get(7)?,
    })
}

fn document_from_row(raw: DocumentRow) -> Result<DocumentRecord, StoreError> {
    Ok(DocumentRecord {
        id: DocumentId(raw.id),
        assessment: parse_assessment_slug(&raw.assessment)?,
        identity: raw.identity.map(IdentityId),
        fields: serde_json::from_str(&raw.fields_json).map_err(json_error)?,
        total_fields: raw.total_fields as usize,
        source_ip: raw.source_ip,
        completed_at: parse_timestamp(&raw.completed_at)?,
        score: serde_json::from_str(&raw.score_json).map_err(json_error)?,
    })
}

const DOCUMENT_COLUMNS: &str =
    "id, assessment, identity_id, fields_json, total_fields, source_ip, completed_at, score_json";

impl DocumentStore for SqliteDocumentStore {
    fn insert(&self, document: NewDocument) -> Result<DocumentRecord, StoreError> {
        let fields_json = serde_json::to_string(&document.fields).map_err(json_error)?;
        let score_json = serde_json::to_string(&document.score).map_err(json_error)?;
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        conn.execute(
            "INSERT INTO assessment_documents
                 (assessment, identity_id, fields_json, total_fields, source_ip, completed_at, score_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                document.assessment.slug(),
                document.identity.map(|id| id.0),
                fields_json,
                document.total_fields as i64,
                document.source_ip,
                document.completed_at.to_rfc3339(),
                score_json,
            ],
        )
        .map_err(store_error)?;

        Ok(DocumentRecord {
            id: DocumentId(conn.last_insert_rowid()),
            assessment: document.assessment,
            identity: document.identity,
            fields: document.fields,
            total_fields: document.total_fields,
            source_ip: document.source_ip,
            completed_at: document.completed_at,
            score: document.score,
        })
    }

    fn fetch(&self, id: DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let row = conn
            .query_row(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM assessment_documents WHERE id = ?1"),
                params![id.0],
                document_row,
            )
            .optional()
            .map_err(store_error)?;
        row.map(document_from_row).transpose()
    }

    fn for_identity(&self, identity: IdentityId) -> Result<Vec<DocumentRecord>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let mut statement = conn
            .prepare(&format!(
                "SELECT {DOCUMENT_COLUMNS} FROM assessment_documents
                 WHERE identity_id = ?1 ORDER BY id"
            ))
            .map_err(store_error)?;
        let rows = statement
            .query_map(params![identity.0], document_row)
            .map_err(store_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_error)?;
        rows.into_iter().map(document_from_row).collect()
    }
}

#[derive(Clone)]
pub(crate) struct SqliteProfileStore {
    conn: Arc<Mutex<Connection>>,
}

impl ProfileStore for SqliteProfileStore {
    fn upsert_field(
        &self,
        identity: IdentityId,
        assessment: AssessmentType,
        key: &str,
        field: ProfileField,
    ) -> Result<(), StoreError> {
        let value_json = serde_json::to_string(&field.value).map_err(json_error)?;
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        conn.execute(
            "INSERT INTO profile_fields
                 (identity_id, assessment, field_key, value_json, label, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(identity_id, assessment, field_key)
             DO UPDATE SET value_json = excluded.value_json,
                           label = excluded.label,
                           updated_at = excluded.updated_at",
            params![
                identity.0,
                assessment.slug(),
                key,
                value_json,
                field.label,
                field.updated_at.to_rfc3339(),
            ],
        )
        .map_err(store_error)?;
        Ok(())
    }

    fn field(
        &self,
        identity: IdentityId,
        assessment: AssessmentType,
        key: &str,
    ) -> Result<Option<ProfileField>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT value_json, label, updated_at FROM profile_fields
                 WHERE identity_id = ?1 AND assessment = ?2 AND field_key = ?3",
                params![identity.0, assessment.slug(), key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(store_error)?;

        row.map(|(value_json, label, updated_at)| {
            Ok(ProfileField {
                value: serde_json::from_str(&value_json).map_err(json_error)?,
                label,
                updated_at: parse_timestamp(&updated_at)?,
            })
        })
        .transpose()
    }

    fn record_latest(
        &self,
        identity: IdentityId,
        assessment: AssessmentType,
        latest: LatestSubmission,
    ) -> Result<(), StoreError> {
        let answers_json = serde_json::to_string(&latest.answers).map_err(json_error)?;
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        conn.execute(
            "INSERT INTO latest_submissions
                 (identity_id, assessment, answers_json, completion_score, status, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(identity_id, assessment)
             DO UPDATE SET answers_json = excluded.answers_json,
                           completion_score = excluded.completion_score,
                           status = excluded.status,
                           recorded_at = excluded.recorded_at",
            params![
                identity.0,
                assessment.slug(),
                answers_json,
                i64::from(latest.completion_score),
                latest.status.label(),
                latest.recorded_at.to_rfc3339(),
            ],
        )
        .map_err(store_error)?;
        Ok(())
    }

    fn latest(
        &self,
        identity: IdentityId,
        assessment: AssessmentType,
    ) -> Result<Option<LatestSubmission>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let row: Option<(String, i64, String, String)> = conn
            .query_row(
                "SELECT answers_json, completion_score, status, recorded_at
                 FROM latest_submissions WHERE identity_id = ?1 AND assessment = ?2",
                params![identity.0, assessment.slug()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()
            .map_err(store_error)?;

        row.map(|(answers_json, completion_score, status, recorded_at)| {
            Ok(LatestSubmission {
                answers: serde_json::from_str(&answers_json).map_err(json_error)?,
                completion_score: completion_score.clamp(0, 100) as u8,
                status: parse_status(&status)?,
                recorded_at: parse_timestamp(&recorded_at)?,
            })
        })
        .transpose()
    }
}

#[derive(Clone)]
pub(crate) struct SqliteSubmissionLog {
    conn: Arc<Mutex<Connection>>,
}

struct LogRowRaw {
    id: i64,
    identity: Option<i64>,
    assessment: String,
    answers_json: String,
    source_ip: String,
    document: i64,
    created_at: String,
}

fn log_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogRowRaw> {
    Ok(LogRowRaw {
        id: row.get(0)?,
        identity: row.get(1)?,
        assessment: row.get(2)?,
        answers_json: row.get(3)?,
        source_ip: row.get(4)?,
        document: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn log_from_row(raw: LogRowRaw) -> Result<LogRow, StoreError> {
    Ok(LogRow {
        id: LogId(raw.id),
        identity: raw.identity.map(IdentityId),
        assessment: parse_assessment_slug(&raw.assessment)?,
        answers_json: raw.answers_json,
        source_ip: raw.source_ip,
        document: DocumentId(raw.document),
        created_at: parse_timestamp(&raw.created_at)?,
    })
}

impl SubmissionLog for SqliteSubmissionLog {
    fn append(&self, row: NewLogRow) -> Result<LogRow, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        conn.execute(
            "INSERT INTO submission_log
                 (identity_id, assessment, answers_json, source_ip, document_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.identity.map(|id| id.0),
                row.assessment.slug(),
                row.answers_json,
                row.source_ip,
                row.document.0,
                row.created_at.to_rfc3339(),
            ],
        )
        .map_err(store_error)?;

        Ok(LogRow {
            id: LogId(conn.last_insert_rowid()),
            identity: row.identity,
            assessment: row.assessment,
            answers_json: row.answers_json,
            source_ip: row.source_ip,
            document: row.document,
            created_at: row.created_at,
        })
    }

    fn recent(&self, limit: usize) -> Result<Vec<LogRow>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let mut statement = conn
            .prepare(
                "SELECT id, identity_id, assessment, answers_json, source_ip, document_id, created_at
                 FROM submission_log ORDER BY id DESC LIMIT ?1",
            )
            .map_err(store_error)?;
        let rows = statement
            .query_map(params![limit as i64], log_row)
            .map_err(store_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_error)?;
        rows.into_iter().map(log_from_row).collect()
    }
}

#[derive(Clone)]
pub(crate) struct SqliteIdentityDirectory {
    conn: Arc<Mutex<Connection>>,
}

struct IdentityRow {
    id: i64,
    email: String,
    name: Option<String>,
    phone: Option<String>,
    created_at: String,
}

fn identity_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<IdentityRow> {
    Ok(IdentityRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn identity_from_row(raw: IdentityRow) -> Result<Identity, StoreError> {
    Ok(Identity {
        id: IdentityId(raw.id),
        email: raw.email,
        name: raw.name,
        phone: raw.phone,
        created_at: parse_timestamp(&raw.created_at)?,
    })
}

impl IdentityDirectory for SqliteIdentityDirectory {
    fn fetch(&self, id: IdentityId) -> Result<Option<Identity>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let row = conn
            .query_row(
                "SELECT id, email, name, phone, created_at FROM identities WHERE id = ?1",
                params![id.0],
                identity_row,
            )
            .optional()
            .map_err(store_error)?;
        row.map(identity_from_row).transpose()
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let row = conn
            .query_row(
                "SELECT id, email, name, phone, created_at FROM identities WHERE email = ?1",
                params![email],
                identity_row,
            )
            .optional()
            .map_err(store_error)?;
        row.map(identity_from_row).transpose()
    }

    fn create(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        conn.execute(
            "INSERT INTO identities (email, name, phone, credential, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                identity.email,
                identity.name,
                identity.phone,
                identity.credential,
                identity.created_at.to_rfc3339(),
            ],
        )
        .map_err(store_error)?;

        Ok(Identity {
            id: IdentityId(conn.last_insert_rowid()),
            email: identity.email,
            name: identity.name,
            phone: identity.phone,
            created_at: identity.created_at,
        })
    }

    fn update(&self, identity: &Identity) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let changed = conn
            .execute(
                "UPDATE identities SET email = ?2, name = ?3, phone = ?4 WHERE id = ?1",
                params![identity.id.0, identity.email, identity.name, identity.phone],
            )
            .map_err(store_error)?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) struct SqliteRateCounter {
    conn: Arc<Mutex<Connection>>,
}

impl RateCounterStore for SqliteRateCounter {
    fn try_count(
        &self,
        key: &str,
        max: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, StoreError> {
        // The connection mutex makes the read-check-write sequence atomic.
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let row: Option<(String, u32)> = conn
            .query_row(
                "SELECT window_started_at, attempts FROM rate_counters WHERE counter_key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(store_error)?;

        let (window_started_at, attempts) = match row {
            Some((started, attempts)) => {
                let started = parse_timestamp(&started)?;
                if now >= started + window {
                    (now, 0)
                } else {
                    (started, attempts)
                }
            }
            None => (now, 0),
        };

        if attempts >= max {
            return Ok(RateDecision::Limited);
        }

        let attempts = attempts + 1;
        conn.execute(
            "INSERT INTO rate_counters (counter_key, window_started_at, attempts)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(counter_key)
             DO UPDATE SET window_started_at = excluded.window_started_at,
                           attempts = excluded.attempts",
            params![key, window_started_at.to_rfc3339(), attempts],
        )
        .map_err(store_error)?;

        Ok(RateDecision::Admitted { count: attempts })
    }
}
