//! Client-side assessment wizard: step sequencing, auto-advance, validation,
//! and submission payload assembly.

pub mod dob;
pub mod machine;

pub use dob::{DobPart, DobState, DobUpdate};
pub use machine::{
    NavOutcome, RejectionKind, SubmissionVerdict, WizardDirective, WizardKey, WizardMachine,
    WizardPhase, WizardProgress, AUTO_ADVANCE_MS, INLINE_ERROR_MS, REDIRECT_DELAY_MS,
};
