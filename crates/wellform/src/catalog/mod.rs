//! Typed catalog of the built-in assessments.
//!
//! Every assessment the intake pipeline accepts is described here: its
//! ordered question list, the contact schema collected on the final step,
//! and the per-type required-field list. The catalog is constructed once at
//! process start and validated so the wizard and the sanitizer can treat
//! definition lookups as total.

mod definitions;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Assessment families the intake pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    Hair,
    EdTreatment,
    WeightLoss,
    Health,
    Skin,
    Hormone,
}

impl AssessmentType {
    pub const ALL: [AssessmentType; 6] = [
        AssessmentType::Hair,
        AssessmentType::EdTreatment,
        AssessmentType::WeightLoss,
        AssessmentType::Health,
        AssessmentType::Skin,
        AssessmentType::Hormone,
    ];

    /// Wire identifier used in payloads and stored records.
    pub const fn slug(self) -> &'static str {
        match self {
            AssessmentType::Hair => "hair",
            AssessmentType::EdTreatment => "ed_treatment",
            AssessmentType::WeightLoss => "weight_loss",
            AssessmentType::Health => "health",
            AssessmentType::Skin => "skin",
            AssessmentType::Hormone => "hormone",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.slug() == value)
    }
}

/// How a question collects its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Exactly one option; selection arms the auto-advance timer.
    Single,
    /// Any number of options; always advanced explicitly.
    Multiple,
    /// Free text.
    Text,
    /// Date of birth collected as month/day/year parts.
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// One wizard step before the contact step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub key: &'static str,
    /// Short label used when the answer is stored or listed.
    pub label: &'static str,
    /// Full prompt shown on the step.
    pub title: &'static str,
    pub kind: QuestionKind,
    pub options: Vec<QuestionOption>,
}

/// Input collected on the final contact step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Name,
    Email,
    Phone,
    Number,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactField {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ContactKind,
}

/// Sanitation rule class for a defined field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Name,
    Email,
    Phone,
    Number,
    FreeText,
    Choice,
    MultiChoice,
    Date,
}

/// Immutable description of one assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentDefinition {
    pub assessment: AssessmentType,
    pub title: &'static str,
    pub description: &'static str,
    pub theme_color: &'static str,
    pub questions: Vec<Question>,
    pub contact_fields: Vec<ContactField>,
    /// Keys that must be present and non-empty after sanitation.
    pub required: Vec<&'static str>,
}

impl AssessmentDefinition {
    /// Total number of defined fields, the completion-score denominator.
    pub fn field_count(&self) -> usize {
        self.questions.len() + self.contact_fields.len()
    }

    pub fn question(&self, key: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.key == key)
    }

    pub fn contact_field(&self, key: &str) -> Option<&ContactField> {
        self.contact_fields.iter().find(|field| field.key == key)
    }

    pub fn date_question(&self) -> Option<&Question> {
        self.questions
            .iter()
            .find(|question| question.kind == QuestionKind::Date)
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.required.iter().any(|required| *required == key)
    }

    /// Sanitation rule for a defined key, `None` for keys outside the schema.
    pub fn field_kind(&self, key: &str) -> Option<FieldKind> {
        if let Some(question) = self.question(key) {
            return Some(match question.kind {
                QuestionKind::Single => FieldKind::Choice,
                QuestionKind::Multiple => FieldKind::MultiChoice,
                QuestionKind::Text => FieldKind::FreeText,
                QuestionKind::Date => FieldKind::Date,
            });
        }

        self.contact_field(key).map(|field| match field.kind {
            ContactKind::Name => FieldKind::Name,
            ContactKind::Email => FieldKind::Email,
            ContactKind::Phone => FieldKind::Phone,
            ContactKind::Number => FieldKind::Number,
            ContactKind::Text => FieldKind::FreeText,
        })
    }

    /// Human-readable label for a defined key.
    pub fn label_for(&self, key: &str) -> Option<&'static str> {
        if let Some(question) = self.question(key) {
            return Some(question.label);
        }
        self.contact_field(key).map(|field| field.label)
    }
}

/// Listing entry for the catalog endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentSummary {
    pub assessment_type: AssessmentType,
    pub title: &'static str,
    pub description: &'static str,
    pub question_count: usize,
    pub theme_color: &'static str,
}

/// Catalog construction failures. All of these are programming errors in the
/// built-in definitions and abort startup.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is missing a definition for {assessment}")]
    MissingDefinition { assessment: &'static str },
    #[error("{assessment} defines no questions")]
    NoQuestions { assessment: &'static str },
    #[error("{assessment} defines the field key {key:?} more than once")]
    DuplicateFieldKey {
        assessment: &'static str,
        key: &'static str,
    },
    #[error("{assessment} choice question {key:?} has no options")]
    EmptyOptions {
        assessment: &'static str,
        key: &'static str,
    },
    #[error("{assessment} requires {key:?} which is not a defined field")]
    UnknownRequiredField {
        assessment: &'static str,
        key: &'static str,
    },
    #[error("{assessment} defines more than one date question")]
    MultipleDateQuestions { assessment: &'static str },
}

/// Validated, immutable set of assessment definitions.
#[derive(Debug)]
pub struct AssessmentCatalog {
    definitions: Vec<AssessmentDefinition>,
}

impl AssessmentCatalog {
    /// Build the built-in catalog, rejecting inconsistent definitions.
    pub fn builtin() -> Result<Self, CatalogError> {
        let definitions = definitions::builtin_definitions();

        for (index, assessment) in AssessmentType::ALL.iter().enumerate() {
            let matches = definitions
                .get(index)
                .map(|definition| definition.assessment == *assessment)
                .unwrap_or(false);
            if !matches {
                return Err(CatalogError::MissingDefinition {
                    assessment: assessment.slug(),
                });
            }
        }

        for definition in &definitions {
            validate_definition(definition)?;
        }

        Ok(Self { definitions })
    }

    /// Definition lookup. Total once the catalog validated: every
    /// `AssessmentType` has exactly one definition at its ordinal slot.
    pub fn definition(&self, assessment: AssessmentType) -> &AssessmentDefinition {
        &self.definitions[assessment as usize]
    }

    pub fn definitions(&self) -> &[AssessmentDefinition] {
        &self.definitions
    }

    pub fn summaries(&self) -> Vec<AssessmentSummary> {
        self.definitions
            .iter()
            .map(|definition| AssessmentSummary {
                assessment_type: definition.assessment,
                title: definition.title,
                description: definition.description,
                question_count: definition.questions.len(),
                theme_color: definition.theme_color,
            })
            .collect()
    }
}

fn validate_definition(definition: &AssessmentDefinition) -> Result<(), CatalogError> {
    let assessment = definition.assessment.slug();

    if definition.questions.is_empty() {
        return Err(CatalogError::NoQuestions { assessment });
    }

    let mut seen: BTreeSet<&'static str> = BTreeSet::new();
    let contact_keys = definition.contact_fields.iter().map(|field| field.key);
    for key in definition
        .questions
        .iter()
        .map(|question| question.key)
        .chain(contact_keys)
    {
        if !seen.insert(key) {
            return Err(CatalogError::DuplicateFieldKey { assessment, key });
        }
    }

    let mut date_questions = 0usize;
    for question in &definition.questions {
        match question.kind {
            QuestionKind::Single | QuestionKind::Multiple => {
                if question.options.is_empty() {
                    return Err(CatalogError::EmptyOptions {
                        assessment,
                        key: question.key,
                    });
                }
            }
            QuestionKind::Date => date_questions += 1,
            QuestionKind::Text => {}
        }
    }
    if date_questions > 1 {
        return Err(CatalogError::MultipleDateQuestions { assessment });
    }

    for key in &definition.required {
        if !seen.contains(key) {
            return Err(CatalogError::UnknownRequiredField { assessment, key });
        }
    }

    Ok(())
}
