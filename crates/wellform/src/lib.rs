//! Assessment wizard engine and submission intake pipeline.
//!
//! The [`wizard`] module drives the step-by-step questionnaire flow a client
//! renders; the [`intake`] module takes what the wizard submits and gates,
//! sanitizes, resolves, scores, persists, and notifies. Both sides share the
//! assessment definitions in [`catalog`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod intake;
pub mod telemetry;
pub mod wizard;
