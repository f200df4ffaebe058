//! Result summaries: completion score, body mass index, per-type insights.

use serde::{Deserialize, Serialize};

use super::domain::Submission;
use super::sanitize::lenient_number;
use crate::catalog::{AssessmentDefinition, AssessmentType};

const SEVERE_SEVERITY_POINTS: u32 = 3;
const HIGH_PRIORITY_POINTS: u32 = 5;
const MODERATE_PRIORITY_POINTS: u32 = 3;

/// Assumed sustainable loss per week, in the submitter's weight unit.
const WEEKLY_LOSS_RATE: f64 = 1.5;
const TIMELINE_SPREAD_WEEKS: i64 = 4;

const ESCALATION_RECOMMENDATION: &str = "Immediate consultation recommended";
const NEXT_STEPS: &str =
    "Schedule a consultation with our specialists to discuss your personalized treatment plan.";

pub(crate) const STANDARD_RECOMMENDATIONS: [&str; 3] = [
    "Complete assessment submitted successfully",
    "Our medical team will review your responses",
    "You will receive personalized recommendations within 24 hours",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    NormalWeight,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn for_value(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::NormalWeight
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::NormalWeight => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

/// Body mass index derived from height and weight answers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMass {
    /// Rounded to one decimal place; the category reflects the rounded value.
    pub bmi: f64,
    pub category: BmiCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    Low,
    Standard,
    Moderate,
    High,
}

impl PriorityLevel {
    pub const fn label(self) -> &'static str {
        match self {
            PriorityLevel::Low => "low",
            PriorityLevel::Standard => "standard",
            PriorityLevel::Moderate => "moderate",
            PriorityLevel::High => "high",
        }
    }
}

/// Assessment-specific reading of the answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentInsight {
    /// Severity-weighted triage for treatment questionnaires.
    Treatment {
        severity_points: u32,
        priority: PriorityLevel,
    },
    /// Weight delta and a rough timeline for reaching the goal.
    WeightPlan {
        weight_to_lose: f64,
        estimated_timeline: Option<String>,
    },
    /// A review with no specialized computation.
    Consultation { priority: PriorityLevel },
}

/// Everything scoring derives from one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Share of the definition's fields that were answered, 0 to 100.
    pub completion_score: u8,
    pub body_mass: Option<BodyMass>,
    pub insight: AssessmentInsight,
    pub recommendations: Vec<String>,
    pub next_steps: String,
}

#[derive(Debug, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, definition: &AssessmentDefinition, submission: &Submission) -> ScoreResult {
        let (insight, recommendations) = insight_for(submission);
        ScoreResult {
            completion_score: completion_score(definition, submission),
            body_mass: body_mass(submission),
            insight,
            recommendations,
            next_steps: NEXT_STEPS.to_string(),
        }
    }
}

/// Answered share of the definition's full field schema, as a percentage.
fn completion_score(definition: &AssessmentDefinition, submission: &Submission) -> u8 {
    let total = definition.field_count();
    if total == 0 {
        return 0;
    }
    let answered = submission.answered_fields();
    ((answered as f64 / total as f64) * 100.0).round() as u8
}

fn body_mass(submission: &Submission) -> Option<BodyMass> {
    let height_cm = numeric_field(submission, "height")?;
    let weight = numeric_field(submission, "weight")
        .or_else(|| numeric_field(submission, "current_weight"))?;
    if height_cm <= 0.0 || weight <= 0.0 {
        return None;
    }

    let height_m = height_cm / 100.0;
    let bmi = (weight / (height_m * height_m) * 10.0).round() / 10.0;
    Some(BodyMass {
        bmi,
        category: BmiCategory::for_value(bmi),
    })
}

fn insight_for(submission: &Submission) -> (AssessmentInsight, Vec<String>) {
    let standard = || {
        STANDARD_RECOMMENDATIONS
            .iter()
            .map(|line| (*line).to_string())
            .collect::<Vec<_>>()
    };

    match submission.assessment {
        AssessmentType::EdTreatment => {
            let severe = submission.field_text("severity") == Some("severe");
            let severity_points = if severe { SEVERE_SEVERITY_POINTS } else { 0 };
            let mut recommendations = standard();
            if severe {
                recommendations.push(ESCALATION_RECOMMENDATION.to_string());
            }
            (
                AssessmentInsight::Treatment {
                    severity_points,
                    priority: priority_for_points(severity_points),
                },
                recommendations,
            )
        }
        AssessmentType::WeightLoss => {
            let current = numeric_field(submission, "current_weight").unwrap_or(0.0);
            let goal = numeric_field(submission, "goal_weight").unwrap_or(0.0);
            let weight_to_lose = current - goal;
            let estimated_timeline = if weight_to_lose > 0.0 {
                let weeks = (weight_to_lose / WEEKLY_LOSS_RATE).ceil() as i64;
                Some(format!(
                    "{}-{} weeks",
                    weeks - TIMELINE_SPREAD_WEEKS,
                    weeks + TIMELINE_SPREAD_WEEKS
                ))
            } else {
                None
            };
            (
                AssessmentInsight::WeightPlan {
                    weight_to_lose,
                    estimated_timeline,
                },
                standard(),
            )
        }
        _ => (
            AssessmentInsight::Consultation {
                priority: PriorityLevel::Standard,
            },
            standard(),
        ),
    }
}

fn priority_for_points(points: u32) -> PriorityLevel {
    if points >= HIGH_PRIORITY_POINTS {
        PriorityLevel::High
    } else if points >= MODERATE_PRIORITY_POINTS {
        PriorityLevel::Moderate
    } else {
        PriorityLevel::Low
    }
}

fn numeric_field(submission: &Submission, key: &str) -> Option<f64> {
    submission.field_text(key).and_then(lenient_number)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::*;
    use crate::catalog::AssessmentCatalog;
    use crate::intake::domain::{ContactDetails, FieldValue};

    fn submission(assessment: AssessmentType, entries: &[(&str, &str)]) -> Submission {
        let fields: BTreeMap<String, FieldValue> = entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), FieldValue::text(*value)))
            .collect();
        Submission {
            assessment,
            fields,
            contact: ContactDetails::default(),
            source_ip: "203.0.113.5".to_string(),
            submitted_at: Utc::now(),
        }
    }

    fn score(assessment: AssessmentType, entries: &[(&str, &str)]) -> ScoreResult {
        let catalog = AssessmentCatalog::builtin().expect("builtin catalog is valid");
        ScoringEngine::new().score(
            catalog.definition(assessment),
            &submission(assessment, entries),
        )
    }

    #[test]
    fn completion_score_is_the_answered_share_of_the_schema() {
        // The health schema defines ten fields.
        let result = score(
            AssessmentType::Health,
            &[
                ("name", "Ada Lovelace"),
                ("email", "ada@example.com"),
                ("phone", "(555) 123-4567"),
                ("overall_health", "good"),
                ("energy_level", "medium"),
                ("sleep_quality", "fair"),
                ("exercise_frequency", "weekly"),
                ("dob", "1991-03-14"),
            ],
        );
        assert_eq!(result.completion_score, 80);
    }

    #[test]
    fn bmi_uses_height_and_current_weight() {
        let result = score(
            AssessmentType::WeightLoss,
            &[
                ("height", "170"),
                ("current_weight", "70"),
                ("goal_weight", "65"),
            ],
        );
        let body_mass = result.body_mass.expect("bmi computed");
        assert_eq!(body_mass.bmi, 24.2);
        assert_eq!(body_mass.category, BmiCategory::NormalWeight);
        assert_eq!(body_mass.category.label(), "Normal weight");
    }

    #[test]
    fn bmi_needs_both_height_and_weight() {
        let result = score(AssessmentType::WeightLoss, &[("current_weight", "70")]);
        assert!(result.body_mass.is_none());
    }

    #[test]
    fn category_boundaries_follow_the_rounded_value() {
        assert_eq!(BmiCategory::for_value(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::for_value(18.5), BmiCategory::NormalWeight);
        assert_eq!(BmiCategory::for_value(24.9), BmiCategory::NormalWeight);
        assert_eq!(BmiCategory::for_value(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::for_value(30.0), BmiCategory::Obese);
    }

    #[test]
    fn severe_severity_escalates_treatment_priority() {
        let result = score(AssessmentType::EdTreatment, &[("severity", "severe")]);
        assert_eq!(
            result.insight,
            AssessmentInsight::Treatment {
                severity_points: 3,
                priority: PriorityLevel::Moderate,
            }
        );
        assert_eq!(result.recommendations.len(), 4);
        assert_eq!(
            result.recommendations.last().map(String::as_str),
            Some(ESCALATION_RECOMMENDATION)
        );
    }

    #[test]
    fn mild_severity_stays_low_priority() {
        let result = score(AssessmentType::EdTreatment, &[("severity", "mild")]);
        assert_eq!(
            result.insight,
            AssessmentInsight::Treatment {
                severity_points: 0,
                priority: PriorityLevel::Low,
            }
        );
        assert_eq!(result.recommendations.len(), 3);
    }

    #[test]
    fn weight_plan_estimates_a_timeline_window() {
        let result = score(
            AssessmentType::WeightLoss,
            &[("current_weight", "90"), ("goal_weight", "75")],
        );
        assert_eq!(
            result.insight,
            AssessmentInsight::WeightPlan {
                weight_to_lose: 15.0,
                estimated_timeline: Some("6-14 weeks".to_string()),
            }
        );
    }

    #[test]
    fn goal_above_current_weight_gets_no_timeline() {
        let result = score(
            AssessmentType::WeightLoss,
            &[("current_weight", "70"), ("goal_weight", "75")],
        );
        assert_eq!(
            result.insight,
            AssessmentInsight::WeightPlan {
                weight_to_lose: -5.0,
                estimated_timeline: None,
            }
        );
    }

    #[test]
    fn other_assessments_read_as_standard_consultations() {
        let result = score(AssessmentType::Health, &[("overall_health", "good")]);
        assert_eq!(
            result.insight,
            AssessmentInsight::Consultation {
                priority: PriorityLevel::Standard,
            }
        );
        assert_eq!(result.recommendations, STANDARD_RECOMMENDATIONS.map(String::from));
        assert_eq!(result.next_steps, NEXT_STEPS);
    }
}
