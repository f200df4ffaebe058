//! Server-side intake: gating, sanitation, identity, persistence, scoring,
//! and notifications for wizard submissions.

pub mod domain;
pub mod gateway;
pub mod identity;
pub mod notify;
pub mod persistence;
pub mod rate_limit;
pub mod router;
pub mod sanitize;
pub(crate) mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ClientContext, CompletionStatus, ContactDetails, DocumentId, FieldValue, IdentityId, LogId,
    Submission, SubmissionRequest,
};
pub use gateway::{derive_token, IntakeGateway, SecurityError, SUBMIT_ACTION};
pub use identity::{Identity, IdentityDirectory, IdentityResolver, NewIdentity, ResolvedIdentity};
pub use notify::{results_redirect, Mailer, NotifyError, OutboundMessage};
pub use persistence::{
    DocumentField, DocumentRecord, DocumentStore, LatestSubmission, LogRow, NewDocument, NewLogRow,
    PersistenceError, ProfileField, ProfileStore, StoreError, SubmissionLog,
};
pub use rate_limit::{RateCounterStore, RateDecision, RateLimiter};
pub use router::{intake_router, IDENTITY_HEADER};
pub use sanitize::{Sanitizer, ValidationError};
pub use scoring::{
    AssessmentInsight, BmiCategory, BodyMass, PriorityLevel, ScoreResult, ScoringEngine,
};
pub use service::{IntakeError, IntakePipeline, IntakeSinks, SubmissionReceipt};
