//! The submission pipeline: one entry point from raw request to receipt.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::domain::{ClientContext, IdentityId, SubmissionRequest};
use super::gateway::{IntakeGateway, SecurityError};
use super::identity::{IdentityDirectory, IdentityResolver};
use super::notify::{results_redirect, Mailer, NotificationDispatcher};
use super::persistence::{
    DocumentStore, PersistenceCoordinator, PersistenceError, ProfileStore, SubmissionLog,
};
use super::rate_limit::{RateCounterStore, RateLimiter};
use super::sanitize::{Sanitizer, ValidationError};
use super::scoring::ScoringEngine;
use crate::catalog::{AssessmentCatalog, AssessmentSummary, AssessmentType};
use crate::config::IntakeConfig;

const ACCEPTED_MESSAGE: &str = "Assessment submitted successfully!";

/// Any way a submission can fail, in pipeline order.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Security(#[from] SecurityError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// What the submitter gets back for an accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub message: String,
    pub redirect_url: String,
    pub assessment_type: AssessmentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<IdentityId>,
    pub fields_saved: usize,
}

/// Every sink the pipeline writes to or consults.
pub struct IntakeSinks {
    pub documents: Arc<dyn DocumentStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub log: Arc<dyn SubmissionLog>,
    pub identities: Arc<dyn IdentityDirectory>,
    pub counters: Arc<dyn RateCounterStore>,
    pub mailer: Arc<dyn Mailer>,
}

/// Server-side intake: gate, sanitize, resolve, score, persist, notify.
pub struct IntakePipeline {
    catalog: Arc<AssessmentCatalog>,
    gateway: IntakeGateway,
    sanitizer: Sanitizer,
    identities: IdentityResolver,
    scoring: ScoringEngine,
    persistence: PersistenceCoordinator,
    notifications: NotificationDispatcher,
    base_url: String,
}

impl IntakePipeline {
    pub fn new(catalog: Arc<AssessmentCatalog>, sinks: IntakeSinks, config: &IntakeConfig) -> Self {
        let limiter = RateLimiter::new(
            sinks.counters,
            config.rate_limit_max,
            config.rate_limit_window(),
        );
        Self {
            gateway: IntakeGateway::new(&config.secret, limiter),
            sanitizer: Sanitizer::new(Arc::clone(&catalog)),
            identities: IdentityResolver::new(sinks.identities),
            scoring: ScoringEngine::new(),
            persistence: PersistenceCoordinator::new(sinks.documents, sinks.profiles, sinks.log),
            notifications: NotificationDispatcher::new(
                sinks.mailer,
                config.operator_email.clone(),
                config.base_url.clone(),
            ),
            base_url: config.base_url.clone(),
            catalog,
        }
    }

    /// Token a hosting page embeds alongside the wizard.
    pub fn issue_token(&self) -> &str {
        self.gateway.issue_token()
    }

    /// Catalog entries for the listing endpoint.
    pub fn summaries(&self) -> Vec<AssessmentSummary> {
        self.catalog.summaries()
    }

    pub fn submit(
        &self,
        request: SubmissionRequest,
        ctx: &ClientContext,
    ) -> Result<SubmissionReceipt, IntakeError> {
        self.submit_at(request, ctx, Utc::now())
    }

    /// Run the full pipeline with an explicit clock.
    pub fn submit_at(
        &self,
        request: SubmissionRequest,
        ctx: &ClientContext,
        now: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, IntakeError> {
        self.gateway
            .admit(request.security_token.as_deref(), &ctx.source_ip, now)?;

        let submission = self.sanitizer.sanitize(request, ctx, now)?;
        let identity = self
            .identities
            .resolve(ctx, &submission, now)
            .map_err(PersistenceError::Identity)?;

        let definition = self.catalog.definition(submission.assessment);
        let score = self.scoring.score(definition, &submission);
        let document =
            self.persistence
                .persist(definition, &submission, identity.id(), &score)?;

        self.notifications
            .dispatch(definition, &submission, &identity, &document);

        info!(
            assessment = submission.assessment.slug(),
            document = document.id.0,
            fields = document.total_fields,
            completion = score.completion_score,
            "assessment submission accepted"
        );

        Ok(SubmissionReceipt {
            message: ACCEPTED_MESSAGE.to_string(),
            redirect_url: results_redirect(&self.base_url, submission.assessment),
            assessment_type: submission.assessment,
            identity_id: identity.id(),
            fields_saved: document.total_fields,
        })
    }
}
