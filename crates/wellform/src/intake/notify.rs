//! Outbound mail and the results redirect map.

use std::sync::Arc;

use tracing::warn;

use super::domain::Submission;
use super::identity::{Identity, ResolvedIdentity};
use super::persistence::DocumentRecord;
use crate::catalog::{AssessmentDefinition, AssessmentType};

const SERVICE_NAME: &str = "Wellform";

/// Fallback results page for types without a dedicated one.
pub const DEFAULT_RESULTS_PATH: &str = "/assessment-results/";

fn results_path(assessment: AssessmentType) -> Option<&'static str> {
    match assessment {
        AssessmentType::Hair => Some("/hair-assessment-results/"),
        AssessmentType::EdTreatment => Some("/ed-treatment-results/"),
        AssessmentType::WeightLoss => Some("/weight-loss-results/"),
        AssessmentType::Health => Some("/health-assessment-results/"),
        AssessmentType::Skin => Some("/skin-assessment-results/"),
        AssessmentType::Hormone => None,
    }
}

/// Absolute redirect target for a completed assessment.
pub fn results_redirect(base_url: &str, assessment: AssessmentType) -> String {
    let path = results_path(assessment).unwrap_or(DEFAULT_RESULTS_PATH);
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// One rendered email ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

pub trait Mailer: Send + Sync {
    fn send(&self, message: OutboundMessage) -> Result<(), NotifyError>;
}

/// Sends the post-submission mail. Every send is best effort; an accepted
/// submission never fails because a message did not go out.
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    operator_email: String,
    base_url: String,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, operator_email: String, base_url: String) -> Self {
        Self {
            mailer,
            operator_email,
            base_url,
        }
    }

    pub fn dispatch(
        &self,
        definition: &AssessmentDefinition,
        submission: &Submission,
        identity: &ResolvedIdentity,
        document: &DocumentRecord,
    ) {
        if let Some(email) = &submission.contact.email {
            self.send_logged(
                "confirmation",
                confirmation_message(email, definition, submission, document),
            );
        }

        self.send_logged(
            "operator alert",
            operator_alert(&self.operator_email, definition, document),
        );

        if let ResolvedIdentity::Created {
            identity,
            credential,
        } = identity
        {
            self.send_logged("welcome", welcome_message(&self.base_url, identity, credential));
        }
    }

    fn send_logged(&self, kind: &'static str, message: OutboundMessage) {
        if let Err(error) = self.mailer.send(message) {
            warn!(kind, %error, "notification send failed");
        }
    }
}

/// Receipt mail for the respondent.
pub fn confirmation_message(
    to: &str,
    definition: &AssessmentDefinition,
    submission: &Submission,
    document: &DocumentRecord,
) -> OutboundMessage {
    let salutation = submission.contact.name.as_deref().unwrap_or("there");
    let body = format!(
        "Dear {salutation},\n\n\
         Thank you for completing your {title} with {SERVICE_NAME}.\n\n\
         We have received your submission and our team will review it shortly.\n\n\
         Next steps: {next_steps}\n\n\
         If you have any questions, please don't hesitate to contact us.\n\n\
         Best regards,\n\
         The {SERVICE_NAME} Team\n",
        title = definition.title,
        next_steps = document.score.next_steps,
    );
    OutboundMessage {
        to: to.to_string(),
        subject: format!("Assessment Received - {SERVICE_NAME}"),
        body,
    }
}

/// Alert mail for the operator inbox, with every labeled answer.
pub fn operator_alert(
    to: &str,
    definition: &AssessmentDefinition,
    document: &DocumentRecord,
) -> OutboundMessage {
    let mut responses = String::new();
    for field in document.fields.values() {
        responses.push_str(&format!("  {}: {}\n", field.label, field.value.display()));
    }

    let body = format!(
        "New assessment submission received:\n\n\
         Assessment Type: {title}\n\
         Document: {document_id}\n\
         Date: {date}\n\
         Completion Score: {score}%\n\n\
         Responses:\n{responses}",
        title = definition.title,
        document_id = document.id.0,
        date = document.completed_at.format("%B %-d, %Y %-I:%M %p"),
        score = document.score.completion_score,
    );
    OutboundMessage {
        to: to.to_string(),
        subject: format!("New {} Submission - {SERVICE_NAME}", definition.title),
        body,
    }
}

/// Account-details mail for a freshly created identity.
pub fn welcome_message(base_url: &str, identity: &Identity, credential: &str) -> OutboundMessage {
    let salutation = identity.name.as_deref().unwrap_or("there");
    let login_url = format!("{}/login", base_url.trim_end_matches('/'));
    let body = format!(
        "Hello {salutation},\n\n\
         Thank you for completing your health assessment! We've created a secure \
         account for you to access your results and track your progress.\n\n\
         Your Account Details:\n\
         - Email: {email}\n\
         - Password: {credential}\n\
         - Login URL: {login_url}\n\n\
         What's Next:\n\
         1. Log in to your account using the credentials above\n\
         2. Review your personalized assessment results\n\
         3. Schedule a consultation with our healthcare professionals\n\
         4. Access your secure health dashboard anytime\n\n\
         For your security, we recommend changing your password after your first login.\n\n\
         If you have any questions, please don't hesitate to contact our support team.\n\n\
         Best regards,\n\
         The {SERVICE_NAME} Team\n",
        email = identity.email,
    );
    OutboundMessage {
        to: identity.email.clone(),
        subject: format!("Welcome to {SERVICE_NAME} - Your Account Details"),
        body,
    }
}
