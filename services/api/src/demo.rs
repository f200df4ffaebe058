use crate::infra::{
    InMemoryDocumentStore, InMemoryIdentityDirectory, InMemoryMailer, InMemoryProfileStore,
    InMemoryRateCounter, InMemorySubmissionLog,
};
use chrono::{Duration, Utc};
use clap::Args;
use std::sync::Arc;
use wellform::catalog::{AssessmentCatalog, AssessmentType, ContactField, ContactKind, QuestionKind};
use wellform::config::AppConfig;
use wellform::error::AppError;
use wellform::intake::{
    derive_token, AssessmentInsight, ClientContext, IntakePipeline, IntakeSinks, ProfileStore,
    SubmissionReceipt, SUBMIT_ACTION,
};
use wellform::wizard::{
    DobPart, NavOutcome, SubmissionVerdict, WizardDirective, WizardMachine, AUTO_ADVANCE_MS,
    REDIRECT_DELAY_MS,
};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Assessment to walk through (hair, ed_treatment, weight_loss, health, skin, hormone)
    #[arg(long, default_value = "weight_loss", value_parser = crate::infra::parse_assessment)]
    pub(crate) assessment: AssessmentType,
    /// Source address attributed to the submission
    #[arg(long, default_value = "203.0.113.5")]
    pub(crate) source_ip: String,
}

/// Print the action-scoped token a hosting page would embed with the wizard.
pub(crate) fn run_token() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    println!("{}", derive_token(&config.intake.secret, SUBMIT_ACTION));
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        assessment,
        source_ip,
    } = args;

    let config = AppConfig::load()?;
    let catalog = Arc::new(AssessmentCatalog::builtin()?);

    let documents = InMemoryDocumentStore::default();
    let profiles = InMemoryProfileStore::default();
    let directory = InMemoryIdentityDirectory::default();
    let mailer = InMemoryMailer::default();
    let sinks = IntakeSinks {
        documents: Arc::new(documents.clone()),
        profiles: Arc::new(profiles.clone()),
        log: Arc::new(InMemorySubmissionLog::default()),
        identities: Arc::new(directory.clone()),
        counters: Arc::new(InMemoryRateCounter::default()),
        mailer: Arc::new(mailer.clone()),
    };
    let pipeline = IntakePipeline::new(Arc::clone(&catalog), sinks, &config.intake);

    let definition = catalog.definition(assessment);
    println!("Assessment wizard demo: {}", definition.title);
    println!("{}", definition.description);
    println!();

    let mut machine = WizardMachine::new(Arc::clone(&catalog), assessment)
        .with_security_token(pipeline.issue_token());
    let mut now = Utc::now();

    // Walk every question step with the first plausible answer.
    while let Some(key) = machine.current_question_key() {
        let Some(question) = definition.question(key).cloned() else {
            break;
        };
        let step = machine.current_step().unwrap_or(0);

        match question.kind {
            QuestionKind::Single => {
                let Some(option) = question.options.first() else {
                    break;
                };
                machine.select_option(option.value, now);
                println!("Step {step}: {} -> {}", question.title, option.label);
                // Let the auto-advance timer fire instead of pressing next.
                now += Duration::milliseconds(AUTO_ADVANCE_MS);
                machine.tick(now);
            }
            QuestionKind::Multiple => {
                let chosen: Vec<&str> = question
                    .options
                    .iter()
                    .take(2)
                    .map(|option| {
                        machine.toggle_option(option.value);
                        option.label
                    })
                    .collect();
                println!("Step {step}: {} -> {}", question.title, chosen.join(", "));
                machine.next(now);
            }
            QuestionKind::Text => {
                machine.set_text_answer("None");
                println!("Step {step}: {} -> None", question.title);
                machine.next(now);
            }
            QuestionKind::Date => {
                machine.set_dob_part(DobPart::Month, 6, now);
                machine.set_dob_part(DobPart::Day, 15, now);
                machine.set_dob_part(DobPart::Year, 1992, now);
                println!("Step {step}: {} -> 1992-06-15", question.title);
                now += Duration::milliseconds(AUTO_ADVANCE_MS);
                machine.tick(now);
            }
        }
    }

    if !machine.on_contact_step() {
        println!("Wizard never reached the contact step; nothing to submit");
        return Ok(());
    }

    println!("Contact step:");
    let captured = machine.captured_fields();
    for field in definition.contact_fields.clone() {
        // Keep values the wizard already derived, like the age from the DOB.
        if captured.contains_key(field.key) {
            continue;
        }
        let value = demo_contact_value(&field);
        machine.set_contact_field(field.key, value);
        println!("  {} -> {}", field.label, value);
    }

    let request = match machine.next(now) {
        NavOutcome::SubmitDispatched(request) => request,
        other => {
            println!("Wizard refused to dispatch the submission: {other:?}");
            return Ok(());
        }
    };

    println!(
        "\nSubmitting {} fields to the intake pipeline",
        request.fields.len()
    );
    let receipt = match pipeline.submit(request, &ClientContext::anonymous(&source_ip)) {
        Ok(receipt) => receipt,
        Err(err) => {
            println!("  Submission rejected: {}", err);
            return Ok(());
        }
    };
    render_receipt(&receipt);

    machine.complete_submission(
        SubmissionVerdict::Accepted {
            redirect_url: receipt.redirect_url.clone(),
        },
        now,
    );
    now += Duration::milliseconds(REDIRECT_DELAY_MS);
    if let Some(WizardDirective::Redirect(url)) = machine.tick(now) {
        println!("  Wizard redirect: {}", url);
    }

    if let Some(document) = documents.all().first() {
        println!("\nStored document #{}", document.id.0);
        println!("- Completion score: {}%", document.score.completion_score);
        if let Some(body_mass) = document.score.body_mass {
            println!(
                "- BMI {:.1} ({})",
                body_mass.bmi,
                body_mass.category.label()
            );
        }
        match &document.score.insight {
            AssessmentInsight::WeightPlan {
                weight_to_lose,
                estimated_timeline,
            } => println!(
                "- Weight to lose: {} (timeline {})",
                weight_to_lose,
                estimated_timeline.as_deref().unwrap_or("open ended")
            ),
            AssessmentInsight::Treatment {
                severity_points,
                priority,
            } => println!(
                "- Severity points: {} (priority {})",
                severity_points,
                priority.label()
            ),
            AssessmentInsight::Consultation { priority } => {
                println!("- Consultation priority: {}", priority.label())
            }
        }
        println!("- Recommendations:");
        for recommendation in &document.score.recommendations {
            println!("    - {}", recommendation);
        }
    }

    let messages = mailer.sent();
    println!("\nOutbound mail ({} messages)", messages.len());
    for message in &messages {
        println!("- to {} | {}", message.to, message.subject);
    }

    if let Some(identity_id) = receipt.identity_id {
        match profiles.latest(identity_id, assessment) {
            Ok(Some(latest)) => match serde_json::to_string_pretty(&latest) {
                Ok(json) => println!("\nLatest profile snapshot:\n{}", json),
                Err(err) => println!("\nLatest profile snapshot unavailable: {}", err),
            },
            Ok(None) => println!("\nNo profile snapshot recorded"),
            Err(err) => println!("\nProfile store unavailable: {}", err),
        }

        if let Some(identity) = directory.all().into_iter().find(|identity| identity.id == identity_id) {
            println!(
                "Directory entry: #{} {} <{}>",
                identity.id.0,
                identity.name.as_deref().unwrap_or("(unnamed)"),
                identity.email
            );
        }
    }

    Ok(())
}

fn render_receipt(receipt: &SubmissionReceipt) {
    println!("  {}", receipt.message);
    println!(
        "- Saved {} fields as a {} submission",
        receipt.fields_saved,
        receipt.assessment_type.slug()
    );
    match receipt.identity_id {
        Some(identity) => println!("- Linked to identity #{}", identity.0),
        None => println!("- Stored anonymously"),
    }
    println!("- Results page: {}", receipt.redirect_url);
}

fn demo_contact_value(field: &ContactField) -> &'static str {
    match field.kind {
        ContactKind::Name => "Jordan Avery",
        ContactKind::Email => "jordan.avery@example.com",
        ContactKind::Phone => "(515) 555-0184",
        ContactKind::Number => match field.key {
            "current_weight" => "92",
            "goal_weight" => "78",
            "height" => "178",
            "age" => "35",
            _ => "1",
        },
        ContactKind::Text => "None",
    }
}
