//! Headless multi-step wizard engine.
//!
//! The machine owns every piece of wizard state: the active step, captured
//! answers, the date-of-birth parts, the cancellable auto-advance deadline,
//! and the transient inline error. Timers are data; nothing fires until the
//! host calls [`WizardMachine::tick`] with the current instant, which keeps
//! the whole flow deterministic under test.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::dob::{DobPart, DobState, DobUpdate};
use crate::catalog::{AssessmentCatalog, AssessmentDefinition, AssessmentType, QuestionKind};
use crate::intake::domain::{FieldValue, SubmissionRequest};

/// Delay between a single-choice selection and the automatic step advance.
pub const AUTO_ADVANCE_MS: i64 = 1_500;
/// How long a blocked-navigation message stays up before it expires.
pub const INLINE_ERROR_MS: i64 = 3_000;
/// Pause on the success screen before the redirect is issued.
pub const REDIRECT_DELAY_MS: i64 = 2_000;

/// Contact-field key the machine fills from a completed date of birth.
const DERIVED_AGE_KEY: &str = "age";

const SELECT_OPTION_MESSAGE: &str = "Please select an option to continue.";
const SELECT_ANY_OPTION_MESSAGE: &str = "Please select at least one option to continue.";
const COMPLETE_DOB_MESSAGE: &str = "Please select your full date of birth.";
const ANSWER_QUESTION_MESSAGE: &str = "Please answer this question to continue.";
const REQUIRED_FIELDS_MESSAGE: &str = "Please complete all required fields.";

/// Where the wizard currently is. Steps are 1-based; the step after the last
/// question is the contact step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardPhase {
    Step(usize),
    Submitting { from_step: usize },
    Success { redirect_url: String },
    Error { message: String, from_step: usize },
}

/// Navigation result handed back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum NavOutcome {
    /// The active step changed.
    Moved,
    /// Validation failed; an inline error was armed and the step kept.
    Blocked,
    /// A keyboard event selected an option instead of navigating.
    Selected,
    /// The final step validated; the host must POST the request.
    SubmitDispatched(SubmissionRequest),
    /// The event does not apply in the current phase.
    Ignored,
}

/// Keyboard events the wizard understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardKey {
    Left,
    Right,
    Enter,
}

/// Side effect the host must perform after a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardDirective {
    Redirect(String),
}

/// Server verdict on a dispatched submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionVerdict {
    Accepted { redirect_url: String },
    Rejected { kind: RejectionKind, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Token or rate-limit refusal; shown inline on the originating step.
    Security,
    /// Field-level refusal; shown inline on the originating step.
    Validation,
    /// Anything else; moves the wizard to the retryable error phase.
    Server,
}

/// Progress snapshot for a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardProgress {
    pub step: usize,
    pub total_steps: usize,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AnswerState {
    Single(String),
    Multiple(BTreeSet<String>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InlineError {
    message: String,
    expires_at: DateTime<Utc>,
}

/// Deterministic wizard state machine for one assessment.
pub struct WizardMachine {
    catalog: Arc<AssessmentCatalog>,
    assessment: AssessmentType,
    security_token: Option<String>,
    phase: WizardPhase,
    answers: BTreeMap<String, AnswerState>,
    contact: BTreeMap<String, String>,
    dob: DobState,
    auto_advance_at: Option<DateTime<Utc>>,
    inline_error: Option<InlineError>,
    redirect_at: Option<DateTime<Utc>>,
}

impl WizardMachine {
    pub fn new(catalog: Arc<AssessmentCatalog>, assessment: AssessmentType) -> Self {
        Self {
            catalog,
            assessment,
            security_token: None,
            phase: WizardPhase::Step(1),
            answers: BTreeMap::new(),
            contact: BTreeMap::new(),
            dob: DobState::new(),
            auto_advance_at: None,
            inline_error: None,
            redirect_at: None,
        }
    }

    /// Token the assembled submission will carry, usually embedded in the
    /// page that hosts the wizard.
    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = Some(token.into());
        self
    }

    pub fn assessment(&self) -> AssessmentType {
        self.assessment
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    pub fn definition(&self) -> &AssessmentDefinition {
        self.catalog.definition(self.assessment)
    }

    /// Question steps plus the final contact step.
    pub fn total_steps(&self) -> usize {
        self.definition().questions.len() + 1
    }

    pub fn current_step(&self) -> Option<usize> {
        match self.phase {
            WizardPhase::Step(step) => Some(step),
            _ => None,
        }
    }

    pub fn on_contact_step(&self) -> bool {
        self.current_step() == Some(self.total_steps())
    }

    /// The question shown on the active step, `None` on the contact step and
    /// outside the step phase.
    pub fn current_question_key(&self) -> Option<&'static str> {
        let step = self.current_step()?;
        self.definition()
            .questions
            .get(step.checked_sub(1)?)
            .map(|question| question.key)
    }

    pub fn progress(&self) -> WizardProgress {
        let total_steps = self.total_steps();
        let step = match &self.phase {
            WizardPhase::Step(step) => *step,
            WizardPhase::Error { from_step, .. } => *from_step,
            WizardPhase::Submitting { .. } | WizardPhase::Success { .. } => total_steps,
        };
        let percent = ((step as f64 / total_steps as f64) * 100.0).round() as u8;
        WizardProgress {
            step,
            total_steps,
            percent,
        }
    }

    pub fn inline_error(&self) -> Option<&str> {
        self.inline_error.as_ref().map(|error| error.message.as_str())
    }

    pub fn auto_advance_deadline(&self) -> Option<DateTime<Utc>> {
        self.auto_advance_at
    }

    pub fn dob(&self) -> &DobState {
        &self.dob
    }

    pub fn derived_age(&self, now: DateTime<Utc>) -> Option<u32> {
        self.dob.age_on(now.date_naive())
    }

    /// Replace the single-choice answer on the active step and arm the
    /// auto-advance timer. Re-selecting resets the timer.
    pub fn select_option(&mut self, value: &str, now: DateTime<Utc>) {
        let catalog = Arc::clone(&self.catalog);
        let definition = catalog.definition(self.assessment);
        let Some(step) = self.current_step() else {
            return;
        };
        let Some(question) = definition.questions.get(step - 1) else {
            return;
        };
        if question.kind != QuestionKind::Single {
            return;
        }
        if !question.options.iter().any(|option| option.value == value) {
            return;
        }

        self.answers
            .insert(question.key.to_string(), AnswerState::Single(value.to_string()));
        self.auto_advance_at = Some(now + Duration::milliseconds(AUTO_ADVANCE_MS));
    }

    /// Toggle membership of a multiple-choice option. Never arms the timer.
    pub fn toggle_option(&mut self, value: &str) {
        let catalog = Arc::clone(&self.catalog);
        let definition = catalog.definition(self.assessment);
        let Some(step) = self.current_step() else {
            return;
        };
        let Some(question) = definition.questions.get(step - 1) else {
            return;
        };
        if question.kind != QuestionKind::Multiple {
            return;
        }
        if !question.options.iter().any(|option| option.value == value) {
            return;
        }

        let entry = self
            .answers
            .entry(question.key.to_string())
            .or_insert_with(|| AnswerState::Multiple(BTreeSet::new()));
        let mut now_empty = false;
        if let AnswerState::Multiple(values) = entry {
            if !values.insert(value.to_string()) {
                values.remove(value);
            }
            now_empty = values.is_empty();
        }
        if now_empty {
            self.answers.remove(question.key);
        }
    }

    /// Free-text answer for a text question on the active step.
    pub fn set_text_answer(&mut self, text: &str) {
        let catalog = Arc::clone(&self.catalog);
        let definition = catalog.definition(self.assessment);
        let Some(step) = self.current_step() else {
            return;
        };
        let Some(question) = definition.questions.get(step - 1) else {
            return;
        };
        if question.kind != QuestionKind::Text {
            return;
        }

        self.answers
            .insert(question.key.to_string(), AnswerState::Text(text.to_string()));
    }

    /// Store one date-of-birth part on a date step. A completed date arms the
    /// auto-advance timer and fills the derived-age contact field; an update
    /// that breaks the date cancels the timer.
    pub fn set_dob_part(&mut self, part: DobPart, value: u32, now: DateTime<Utc>) {
        let catalog = Arc::clone(&self.catalog);
        let definition = catalog.definition(self.assessment);
        let Some(step) = self.current_step() else {
            return;
        };
        let on_date_step = definition
            .questions
            .get(step - 1)
            .map(|question| question.kind == QuestionKind::Date)
            .unwrap_or(false);
        if !on_date_step {
            return;
        }

        match self.dob.set_part(part, value) {
            DobUpdate::Completed => {
                if definition.contact_field(DERIVED_AGE_KEY).is_some() {
                    if let Some(age) = self.dob.age_on(now.date_naive()) {
                        self.contact
                            .insert(DERIVED_AGE_KEY.to_string(), age.to_string());
                    }
                }
                self.auto_advance_at = Some(now + Duration::milliseconds(AUTO_ADVANCE_MS));
            }
            DobUpdate::Incomplete | DobUpdate::DayCleared => {
                self.auto_advance_at = None;
            }
        }
    }

    /// Contact-step input. Unknown keys are ignored.
    pub fn set_contact_field(&mut self, key: &str, value: &str) {
        let catalog = Arc::clone(&self.catalog);
        let definition = catalog.definition(self.assessment);
        if !self.on_contact_step() {
            return;
        }
        if definition.contact_field(key).is_none() {
            return;
        }

        self.contact.insert(key.to_string(), value.to_string());
    }

    /// Advance past the active step, dispatching the submission from the
    /// final one. Navigation always cancels a pending auto-advance.
    pub fn next(&mut self, now: DateTime<Utc>) -> NavOutcome {
        let WizardPhase::Step(step) = self.phase else {
            return NavOutcome::Ignored;
        };
        self.auto_advance_at = None;

        if let Some(message) = self.step_violation(step) {
            return self.block(message, now);
        }

        if step < self.total_steps() {
            self.phase = WizardPhase::Step(step + 1);
            return NavOutcome::Moved;
        }

        let request = self.build_submission();
        self.phase = WizardPhase::Submitting { from_step: step };
        NavOutcome::SubmitDispatched(request)
    }

    /// Return to the previous step. Never guarded.
    pub fn prev(&mut self) -> NavOutcome {
        let WizardPhase::Step(step) = self.phase else {
            return NavOutcome::Ignored;
        };
        self.auto_advance_at = None;

        if step > 1 {
            self.phase = WizardPhase::Step(step - 1);
            NavOutcome::Moved
        } else {
            NavOutcome::Ignored
        }
    }

    /// Keyboard navigation: Left/Right map to prev/next, Enter selects the
    /// first unselected option of a choice step and advances otherwise.
    pub fn press_key(&mut self, key: WizardKey, now: DateTime<Utc>) -> NavOutcome {
        match key {
            WizardKey::Left => self.prev(),
            WizardKey::Right => self.next(now),
            WizardKey::Enter => self.enter_key(now),
        }
    }

    /// Drive timers: expire the inline error, fire a due auto-advance, and
    /// emit the redirect once the success pause has elapsed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<WizardDirective> {
        if let Some(error) = &self.inline_error {
            if now >= error.expires_at {
                self.inline_error = None;
            }
        }

        if let Some(deadline) = self.auto_advance_at {
            if now >= deadline && matches!(self.phase, WizardPhase::Step(_)) {
                self.auto_advance_at = None;
                self.next(now);
            }
        }

        if let WizardPhase::Success { redirect_url } = &self.phase {
            if let Some(due) = self.redirect_at {
                if now >= due {
                    let url = redirect_url.clone();
                    self.redirect_at = None;
                    return Some(WizardDirective::Redirect(url));
                }
            }
        }

        None
    }

    /// Feed the server verdict back after a dispatched submission.
    pub fn complete_submission(&mut self, verdict: SubmissionVerdict, now: DateTime<Utc>) {
        let WizardPhase::Submitting { from_step } = self.phase else {
            return;
        };

        match verdict {
            SubmissionVerdict::Accepted { redirect_url } => {
                self.phase = WizardPhase::Success { redirect_url };
                self.redirect_at = Some(now + Duration::milliseconds(REDIRECT_DELAY_MS));
            }
            SubmissionVerdict::Rejected { kind, message } => match kind {
                RejectionKind::Security | RejectionKind::Validation => {
                    self.phase = WizardPhase::Step(from_step);
                    self.block(&message, now);
                }
                RejectionKind::Server => {
                    self.phase = WizardPhase::Error { message, from_step };
                }
            },
        }
    }

    /// Leave the error phase and return to the originating step with all
    /// captured answers intact.
    pub fn dismiss_error(&mut self) {
        if let WizardPhase::Error { from_step, .. } = self.phase {
            self.phase = WizardPhase::Step(from_step);
        }
    }

    /// Every captured answer and contact value, shaped as submission fields.
    pub fn captured_fields(&self) -> BTreeMap<String, FieldValue> {
        let definition = self.definition();
        let mut fields = BTreeMap::new();

        for question in &definition.questions {
            match question.kind {
                QuestionKind::Single => {
                    if let Some(AnswerState::Single(value)) = self.answers.get(question.key) {
                        fields.insert(question.key.to_string(), FieldValue::Text(value.clone()));
                    }
                }
                QuestionKind::Multiple => {
                    if let Some(AnswerState::Multiple(values)) = self.answers.get(question.key) {
                        if !values.is_empty() {
                            fields.insert(
                                question.key.to_string(),
                                FieldValue::List(values.iter().cloned().collect()),
                            );
                        }
                    }
                }
                QuestionKind::Text => {
                    if let Some(AnswerState::Text(text)) = self.answers.get(question.key) {
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            fields.insert(
                                question.key.to_string(),
                                FieldValue::Text(trimmed.to_string()),
                            );
                        }
                    }
                }
                QuestionKind::Date => {
                    if let Some(value) = self.dob.iso_value() {
                        fields.insert(question.key.to_string(), FieldValue::Text(value));
                    }
                }
            }
        }

        for field in &definition.contact_fields {
            if let Some(value) = self.contact.get(field.key) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    fields.insert(field.key.to_string(), FieldValue::Text(trimmed.to_string()));
                }
            }
        }

        fields
    }

    fn build_submission(&self) -> SubmissionRequest {
        SubmissionRequest {
            security_token: self.security_token.clone(),
            assessment_type: self.assessment.slug().to_string(),
            fields: self.captured_fields(),
        }
    }

    fn enter_key(&mut self, now: DateTime<Utc>) -> NavOutcome {
        let catalog = Arc::clone(&self.catalog);
        let definition = catalog.definition(self.assessment);

        if let Some(step) = self.current_step() {
            if let Some(question) = definition.questions.get(step - 1) {
                if let Some(first) = question.options.first() {
                    let first_selected = match self.answers.get(question.key) {
                        Some(AnswerState::Single(value)) => value == first.value,
                        Some(AnswerState::Multiple(values)) => values.contains(first.value),
                        _ => false,
                    };
                    if !first_selected {
                        match question.kind {
                            QuestionKind::Single => {
                                self.select_option(first.value, now);
                                return NavOutcome::Selected;
                            }
                            QuestionKind::Multiple => {
                                self.toggle_option(first.value);
                                return NavOutcome::Selected;
                            }
                            QuestionKind::Text | QuestionKind::Date => {}
                        }
                    }
                }
            }
        }

        self.next(now)
    }

    /// Why the active step refuses to advance, if it does.
    fn step_violation(&self, step: usize) -> Option<&'static str> {
        let definition = self.definition();

        if let Some(question) = definition.questions.get(step - 1) {
            return match question.kind {
                QuestionKind::Single => match self.answers.get(question.key) {
                    Some(AnswerState::Single(_)) => None,
                    _ => Some(SELECT_OPTION_MESSAGE),
                },
                QuestionKind::Multiple => match self.answers.get(question.key) {
                    Some(AnswerState::Multiple(values)) if !values.is_empty() => None,
                    _ => Some(SELECT_ANY_OPTION_MESSAGE),
                },
                QuestionKind::Date => {
                    if self.dob.is_complete() {
                        None
                    } else {
                        Some(COMPLETE_DOB_MESSAGE)
                    }
                }
                QuestionKind::Text => {
                    if !definition.is_required(question.key) {
                        return None;
                    }
                    match self.answers.get(question.key) {
                        Some(AnswerState::Text(text)) if !text.trim().is_empty() => None,
                        _ => Some(ANSWER_QUESTION_MESSAGE),
                    }
                }
            };
        }

        let contact_complete = definition.required.iter().all(|key| {
            if definition.contact_field(key).is_none() {
                return true;
            }
            self.contact
                .get(*key)
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false)
        });
        if contact_complete {
            None
        } else {
            Some(REQUIRED_FIELDS_MESSAGE)
        }
    }

    fn block(&mut self, message: &str, now: DateTime<Utc>) -> NavOutcome {
        self.inline_error = Some(InlineError {
            message: message.to_string(),
            expires_at: now + Duration::milliseconds(INLINE_ERROR_MS),
        });
        NavOutcome::Blocked
    }
}
