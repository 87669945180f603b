//! Validation engine for NACHAM payment files.
//!
//! The pipeline is `decode → preflight → scan`:
//!
//! - [`source`] turns raw bytes into the flat character stream the engine
//!   expects (BOM and line breaks removed).
//! - [`preflight`] runs the cheap whole-file checks (framing, signature,
//!   record-type tags) and detects return files, which skip validation.
//! - [`engine`] walks the records once, tracking the batch lifecycle and the
//!   running totals, and reconciles them against the declared control
//!   records.
//!
//! The result is a [`ValidationReport`]: per-line status, per-line marks and
//! global errors. [`worker`] runs the same computation on a background thread
//! with progress notifications.

pub mod engine;
#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
pub mod options;
pub mod preflight;
pub mod profile;
pub mod report;
pub mod source;
pub mod worker;

pub use engine::{validate_records, validate_text};
pub use options::ValidationOptions;
pub use preflight::{Preflight, preflight};
pub use profile::{BatchRule, Profile};
pub use report::ValidationReport;
pub use source::{compact_text, decode_source, serial_from_file_name};
pub use worker::{RequestToken, ValidationRequest, ValidationWorker, WorkerEvent};
