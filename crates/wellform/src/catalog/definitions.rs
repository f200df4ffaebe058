use super::{
    AssessmentDefinition, AssessmentType, ContactField, ContactKind, Question, QuestionKind,
    QuestionOption,
};

const fn option(value: &'static str, label: &'static str) -> QuestionOption {
    QuestionOption { value, label }
}

/// Built-in definitions, one per `AssessmentType` in declaration order.
pub(super) fn builtin_definitions() -> Vec<AssessmentDefinition> {
    vec![
        hair_definition(),
        ed_treatment_definition(),
        weight_loss_definition(),
        health_definition(),
        skin_definition(),
        hormone_definition(),
    ]
}

fn hair_definition() -> AssessmentDefinition {
    AssessmentDefinition {
        assessment: AssessmentType::Hair,
        title: "Hair Assessment",
        description: "Comprehensive hair health evaluation",
        theme_color: "#667eea",
        questions: vec![
            Question {
                key: "age_range",
                label: "Age Range",
                title: "What's your age range?",
                kind: QuestionKind::Single,
                options: vec![
                    option("18-25", "18-25"),
                    option("26-35", "26-35"),
                    option("36-45", "36-45"),
                    option("46-55", "46-55"),
                    option("56+", "56+"),
                ],
            },
            Question {
                key: "gender",
                label: "Gender",
                title: "What's your gender?",
                kind: QuestionKind::Single,
                options: vec![
                    option("male", "Male"),
                    option("female", "Female"),
                    option("other", "Other"),
                ],
            },
            Question {
                key: "hair_concern",
                label: "Main Hair Concern",
                title: "What are your main hair concerns?",
                kind: QuestionKind::Single,
                options: vec![
                    option("thinning", "Thinning Hair"),
                    option("receding", "Receding Hairline"),
                    option("bald_spots", "Bald Spots"),
                    option("overall_loss", "Overall Hair Loss"),
                ],
            },
            Question {
                key: "duration",
                label: "Duration of Changes",
                title: "How long have you noticed hair changes?",
                kind: QuestionKind::Single,
                options: vec![
                    option("recent", "Less than 6 months"),
                    option("moderate", "6 months - 2 years"),
                    option("long", "2-5 years"),
                    option("very_long", "More than 5 years"),
                ],
            },
            Question {
                key: "loss_speed",
                label: "Speed of Loss",
                title: "How would you rate the speed of hair loss?",
                kind: QuestionKind::Single,
                options: vec![
                    option("slow", "Very Slow"),
                    option("moderate", "Moderate"),
                    option("fast", "Fast"),
                    option("very_fast", "Very Fast"),
                ],
            },
            Question {
                key: "family_history",
                label: "Family History",
                title: "Do you have a family history of hair loss?",
                kind: QuestionKind::Single,
                options: vec![
                    option("none", "No Family History"),
                    option("mother", "Mother's Side"),
                    option("father", "Father's Side"),
                    option("both", "Both Sides"),
                ],
            },
            Question {
                key: "stress_level",
                label: "Stress Level",
                title: "What's your current stress level?",
                kind: QuestionKind::Single,
                options: vec![
                    option("low", "Low Stress"),
                    option("moderate", "Moderate Stress"),
                    option("high", "High Stress"),
                    option("very_high", "Very High Stress"),
                ],
            },
            Question {
                key: "diet_quality",
                label: "Diet Quality",
                title: "How would you describe your diet quality?",
                kind: QuestionKind::Single,
                options: vec![
                    option("excellent", "Excellent"),
                    option("good", "Good"),
                    option("fair", "Fair"),
                    option("poor", "Poor"),
                ],
            },
            Question {
                key: "treatments_tried",
                label: "Treatments Tried",
                title: "Have you tried any hair loss treatments?",
                kind: QuestionKind::Multiple,
                options: vec![
                    option("none", "No Treatments"),
                    option("otc", "Over-the-Counter"),
                    option("prescription", "Prescription Meds"),
                    option("procedures", "Medical Procedures"),
                ],
            },
            Question {
                key: "restoration_goal",
                label: "Restoration Goal",
                title: "What are your hair restoration goals?",
                kind: QuestionKind::Single,
                options: vec![
                    option("stop_loss", "Stop Hair Loss"),
                    option("regrow", "Regrow Hair"),
                    option("thicken", "Thicken Hair"),
                    option("improve", "Overall Improvement"),
                ],
            },
        ],
        contact_fields: vec![
            ContactField {
                key: "name",
                label: "Full Name",
                kind: ContactKind::Name,
            },
            ContactField {
                key: "email",
                label: "Email Address",
                kind: ContactKind::Email,
            },
            ContactField {
                key: "phone",
                label: "Phone Number",
                kind: ContactKind::Phone,
            },
        ],
        required: vec!["name", "email", "phone"],
    }
}

fn ed_treatment_definition() -> AssessmentDefinition {
    AssessmentDefinition {
        assessment: AssessmentType::EdTreatment,
        title: "ED Treatment Assessment",
        description: "Confidential ED treatment evaluation",
        theme_color: "#f093fb",
        questions: vec![
            Question {
                key: "relationship_status",
                label: "Relationship Status",
                title: "What's your relationship status?",
                kind: QuestionKind::Single,
                options: vec![
                    option("single", "Single"),
                    option("dating", "Dating"),
                    option("married", "Married/Partnered"),
                    option("divorced", "Divorced/Separated"),
                ],
            },
            Question {
                key: "severity",
                label: "Severity",
                title: "How would you describe the severity of your symptoms?",
                kind: QuestionKind::Single,
                options: vec![
                    option("mild", "Mild"),
                    option("moderate", "Moderate"),
                    option("severe", "Severe"),
                    option("complete", "Complete"),
                ],
            },
            Question {
                key: "symptom_duration",
                label: "Symptom Duration",
                title: "How long have you been experiencing symptoms?",
                kind: QuestionKind::Single,
                options: vec![
                    option("recent", "Less than 6 months"),
                    option("moderate", "6 months - 2 years"),
                    option("long", "2-5 years"),
                    option("very_long", "More than 5 years"),
                ],
            },
            Question {
                key: "health_conditions",
                label: "Health Conditions",
                title: "Do you have any of these health conditions?",
                kind: QuestionKind::Multiple,
                options: vec![
                    option("none", "None of these"),
                    option("diabetes", "Diabetes"),
                    option("heart_disease", "Heart Disease"),
                    option("hypertension", "High Blood Pressure"),
                ],
            },
            Question {
                key: "treatments_tried",
                label: "Treatments Tried",
                title: "Have you tried any treatments before?",
                kind: QuestionKind::Multiple,
                options: vec![
                    option("none", "No previous treatments"),
                    option("oral", "Oral medications"),
                    option("injections", "Injections"),
                    option("devices", "Vacuum devices"),
                ],
            },
            Question {
                key: "tobacco_use",
                label: "Tobacco Use",
                title: "Do you smoke or use tobacco?",
                kind: QuestionKind::Single,
                options: vec![
                    option("never", "Never smoked"),
                    option("former", "Former smoker"),
                    option("occasional", "Occasional smoker"),
                    option("regular", "Regular smoker"),
                ],
            },
            Question {
                key: "dob",
                label: "Date of Birth",
                title: "What's your date of birth?",
                kind: QuestionKind::Date,
                options: vec![],
            },
        ],
        contact_fields: vec![
            ContactField {
                key: "name",
                label: "Full Name",
                kind: ContactKind::Name,
            },
            ContactField {
                key: "email",
                label: "Email Address",
                kind: ContactKind::Email,
            },
            ContactField {
                key: "age",
                label: "Age",
                kind: ContactKind::Number,
            },
            ContactField {
                key: "phone",
                label: "Phone Number",
                kind: ContactKind::Phone,
            },
        ],
        required: vec!["name", "email", "age"],
    }
}

fn weight_loss_definition() -> AssessmentDefinition {
    AssessmentDefinition {
        assessment: AssessmentType::WeightLoss,
        title: "Weight Loss Assessment",
        description: "Personalized weight management evaluation",
        theme_color: "#4facfe",
        questions: vec![
            Question {
                key: "primary_goal",
                label: "Primary Goal",
                title: "What's your primary weight loss goal?",
                kind: QuestionKind::Single,
                options: vec![
                    option("lose_under_10", "Lose under 10 kg"),
                    option("lose_10_25", "Lose 10-25 kg"),
                    option("lose_over_25", "Lose more than 25 kg"),
                    option("maintain", "Maintain current weight"),
                ],
            },
            Question {
                key: "activity_level",
                label: "Activity Level",
                title: "How active are you during a typical week?",
                kind: QuestionKind::Single,
                options: vec![
                    option("sedentary", "Mostly sedentary"),
                    option("light", "Lightly active"),
                    option("moderate", "Moderately active"),
                    option("very_active", "Very active"),
                ],
            },
            Question {
                key: "diet_type",
                label: "Current Diet",
                title: "How would you describe your current diet?",
                kind: QuestionKind::Single,
                options: vec![
                    option("balanced", "Balanced"),
                    option("low_carb", "Low carb"),
                    option("vegetarian", "Vegetarian/Vegan"),
                    option("no_plan", "No particular plan"),
                ],
            },
            Question {
                key: "eating_habits",
                label: "Eating Habits",
                title: "Which of these habits apply to you?",
                kind: QuestionKind::Multiple,
                options: vec![
                    option("late_night_snacking", "Late night snacking"),
                    option("emotional_eating", "Emotional eating"),
                    option("large_portions", "Large portions"),
                    option("sugary_drinks", "Sugary drinks"),
                ],
            },
            Question {
                key: "motivation",
                label: "Motivation",
                title: "What's motivating you to lose weight?",
                kind: QuestionKind::Single,
                options: vec![
                    option("health", "Overall health"),
                    option("appearance", "Appearance"),
                    option("energy", "More energy"),
                    option("medical_advice", "Medical advice"),
                ],
            },
            Question {
                key: "previous_programs",
                label: "Previous Programs",
                title: "Have you tried any weight loss programs before?",
                kind: QuestionKind::Multiple,
                options: vec![
                    option("none", "None"),
                    option("commercial_diet", "Commercial diet plan"),
                    option("personal_trainer", "Personal trainer"),
                    option("medical_program", "Medically supervised program"),
                ],
            },
        ],
        contact_fields: vec![
            ContactField {
                key: "name",
                label: "Full Name",
                kind: ContactKind::Name,
            },
            ContactField {
                key: "email",
                label: "Email Address",
                kind: ContactKind::Email,
            },
            ContactField {
                key: "phone",
                label: "Phone Number",
                kind: ContactKind::Phone,
            },
            ContactField {
                key: "current_weight",
                label: "Current Weight (kg)",
                kind: ContactKind::Number,
            },
            ContactField {
                key: "goal_weight",
                label: "Goal Weight (kg)",
                kind: ContactKind::Number,
            },
            ContactField {
                key: "height",
                label: "Height (cm)",
                kind: ContactKind::Number,
            },
        ],
        required: vec!["name", "email", "current_weight", "goal_weight"],
    }
}

fn health_definition() -> AssessmentDefinition {
    AssessmentDefinition {
        assessment: AssessmentType::Health,
        title: "Health Assessment",
        description: "Comprehensive health evaluation",
        theme_color: "#fa709a",
        questions: vec![
            Question {
                key: "overall_health",
                label: "Overall Health",
                title: "How would you rate your overall health?",
                kind: QuestionKind::Single,
                options: vec![
                    option("excellent", "Excellent"),
                    option("good", "Good"),
                    option("fair", "Fair"),
                    option("poor", "Poor"),
                ],
            },
            Question {
                key: "energy_level",
                label: "Energy Level",
                title: "How are your energy levels through the day?",
                kind: QuestionKind::Single,
                options: vec![
                    option("high", "Consistently high"),
                    option("steady", "Steady"),
                    option("afternoon_crash", "Afternoon crash"),
                    option("always_tired", "Always tired"),
                ],
            },
            Question {
                key: "sleep_quality",
                label: "Sleep Quality",
                title: "How well do you sleep?",
                kind: QuestionKind::Single,
                options: vec![
                    option("restful", "Restful"),
                    option("adequate", "Adequate"),
                    option("restless", "Restless"),
                    option("poor", "Poor"),
                ],
            },
            Question {
                key: "exercise_frequency",
                label: "Exercise Frequency",
                title: "How often do you exercise?",
                kind: QuestionKind::Single,
                options: vec![
                    option("daily", "Daily"),
                    option("few_times_week", "A few times a week"),
                    option("occasionally", "Occasionally"),
                    option("never", "Never"),
                ],
            },
            Question {
                key: "health_goals",
                label: "Health Goals",
                title: "What are your main health goals?",
                kind: QuestionKind::Multiple,
                options: vec![
                    option("more_energy", "More energy"),
                    option("better_sleep", "Better sleep"),
                    option("weight_management", "Weight management"),
                    option("preventive_care", "Preventive care"),
                ],
            },
            Question {
                key: "existing_conditions",
                label: "Existing Conditions",
                title: "Do you have any of these conditions?",
                kind: QuestionKind::Multiple,
                options: vec![
                    option("none", "None"),
                    option("diabetes", "Diabetes"),
                    option("hypertension", "High blood pressure"),
                    option("heart_disease", "Heart disease"),
                ],
            },
            Question {
                key: "dob",
                label: "Date of Birth",
                title: "What's your date of birth?",
                kind: QuestionKind::Date,
                options: vec![],
            },
        ],
        contact_fields: vec![
            ContactField {
                key: "name",
                label: "Full Name",
                kind: ContactKind::Name,
            },
            ContactField {
                key: "email",
                label: "Email Address",
                kind: ContactKind::Email,
            },
            ContactField {
                key: "phone",
                label: "Phone Number",
                kind: ContactKind::Phone,
            },
        ],
        required: vec!["name", "email", "phone"],
    }
}

fn skin_definition() -> AssessmentDefinition {
    AssessmentDefinition {
        assessment: AssessmentType::Skin,
        title: "Skin Assessment",
        description: "Detailed skin health analysis",
        theme_color: "#a8edea",
        questions: vec![
            Question {
                key: "skin_type",
                label: "Skin Type",
                title: "How would you describe your skin type?",
                kind: QuestionKind::Single,
                options: vec![
                    option("oily", "Oily"),
                    option("dry", "Dry"),
                    option("combination", "Combination"),
                    option("normal", "Normal"),
                ],
            },
            Question {
                key: "skin_concerns",
                label: "Skin Concerns",
                title: "What are your main skin concerns?",
                kind: QuestionKind::Multiple,
                options: vec![
                    option("acne", "Acne"),
                    option("aging", "Signs of aging"),
                    option("dark_spots", "Dark spots"),
                    option("redness", "Redness"),
                ],
            },
            Question {
                key: "sun_exposure",
                label: "Sun Exposure",
                title: "How much sun exposure do you get?",
                kind: QuestionKind::Single,
                options: vec![
                    option("minimal", "Minimal"),
                    option("moderate", "Moderate"),
                    option("frequent", "Frequent"),
                    option("constant", "Constant"),
                ],
            },
            Question {
                key: "current_routine",
                label: "Current Routine",
                title: "What's your current skincare routine?",
                kind: QuestionKind::Single,
                options: vec![
                    option("none", "None"),
                    option("basic", "Basic cleansing"),
                    option("moderate", "Cleanse and moisturize"),
                    option("extensive", "Multi-step routine"),
                ],
            },
            Question {
                key: "product_sensitivity",
                label: "Product Sensitivity",
                title: "How sensitive is your skin to new products?",
                kind: QuestionKind::Single,
                options: vec![
                    option("none", "Not sensitive"),
                    option("mild", "Mildly sensitive"),
                    option("moderate", "Moderately sensitive"),
                    option("severe", "Very sensitive"),
                ],
            },
        ],
        contact_fields: vec![
            ContactField {
                key: "name",
                label: "Full Name",
                kind: ContactKind::Name,
            },
            ContactField {
                key: "email",
                label: "Email Address",
                kind: ContactKind::Email,
            },
            ContactField {
                key: "phone",
                label: "Phone Number",
                kind: ContactKind::Phone,
            },
        ],
        required: vec!["name", "email"],
    }
}

fn hormone_definition() -> AssessmentDefinition {
    AssessmentDefinition {
        assessment: AssessmentType::Hormone,
        title: "Hormone Assessment",
        description: "Comprehensive hormone evaluation",
        theme_color: "#ffecd2",
        questions: vec![
            Question {
                key: "symptoms",
                label: "Symptoms",
                title: "Which symptoms have you been experiencing?",
                kind: QuestionKind::Multiple,
                options: vec![
                    option("fatigue", "Fatigue"),
                    option("weight_gain", "Weight gain"),
                    option("mood_changes", "Mood changes"),
                    option("low_libido", "Low libido"),
                    option("sleep_issues", "Sleep issues"),
                ],
            },
            Question {
                key: "symptom_duration",
                label: "Symptom Duration",
                title: "How long have these symptoms lasted?",
                kind: QuestionKind::Single,
                options: vec![
                    option("under_3_months", "Under 3 months"),
                    option("3_12_months", "3-12 months"),
                    option("1_3_years", "1-3 years"),
                    option("over_3_years", "Over 3 years"),
                ],
            },
            Question {
                key: "stress_level",
                label: "Stress Level",
                title: "What's your current stress level?",
                kind: QuestionKind::Single,
                options: vec![
                    option("low", "Low"),
                    option("moderate", "Moderate"),
                    option("high", "High"),
                    option("very_high", "Very High"),
                ],
            },
            Question {
                key: "energy_pattern",
                label: "Energy Pattern",
                title: "How does your energy shift during the day?",
                kind: QuestionKind::Single,
                options: vec![
                    option("steady", "Steady all day"),
                    option("morning_low", "Low in the morning"),
                    option("afternoon_crash", "Afternoon crash"),
                    option("always_low", "Always low"),
                ],
            },
            Question {
                key: "medication_notes",
                label: "Current Medications",
                title: "List any medications or supplements you take regularly",
                kind: QuestionKind::Text,
                options: vec![],
            },
            Question {
                key: "dob",
                label: "Date of Birth",
                title: "What's your date of birth?",
                kind: QuestionKind::Date,
                options: vec![],
            },
        ],
        contact_fields: vec![
            ContactField {
                key: "name",
                label: "Full Name",
                kind: ContactKind::Name,
            },
            ContactField {
                key: "email",
                label: "Email Address",
                kind: ContactKind::Email,
            },
            ContactField {
                key: "phone",
                label: "Phone Number",
                kind: ContactKind::Phone,
            },
        ],
        required: vec!["name", "email"],
    }
}
