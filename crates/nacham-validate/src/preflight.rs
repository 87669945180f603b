//! Cheap whole-file checks that gate the scan.

use nacham_types::{FileHeader, Framing, RECORD_LEN, RecordType, frame};
use tracing::{info, warn};

use crate::profile::Profile;

/// Outcome of [`preflight`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight<'a> {
    /// The file is fit for the full scan.
    Proceed(Framing<'a>),
    /// The file cannot be evaluated; every failed check is listed.
    Abort {
        framing: Framing<'a>,
        global_errors: Vec<String>,
    },
    /// Return file: structural validation does not apply.
    Bypass(Framing<'a>),
}

impl<'a> Preflight<'a> {
    #[must_use]
    pub const fn framing(&self) -> &Framing<'a> {
        match self {
            Self::Proceed(framing) | Self::Bypass(framing) | Self::Abort { framing, .. } => framing,
        }
    }
}

/// Whether the header's origin field carries the profile's return marker.
///
/// Only the first record's header columns are consulted, so the answer does
/// not depend on anything else in the file.
#[must_use]
pub fn is_return_file(text: &str, profile: &Profile) -> bool {
    if profile.return_marker.is_empty() || !text.starts_with(RecordType::FileHeader.tag()) {
        return false;
    }
    let origin: String = text
        .chars()
        .skip(FileHeader::ORIGIN.start)
        .take(FileHeader::ORIGIN.len())
        .collect();
    origin.contains(profile.return_marker.as_str())
}

/// Run the framing, signature and type-tag checks.
///
/// The return-file test comes first and short-circuits everything else. The
/// three regular checks are independent: all of them run and every failure
/// is collected.
#[must_use]
pub fn preflight<'a>(text: &'a str, profile: &Profile) -> Preflight<'a> {
    let framing = frame(text);

    if is_return_file(text, profile) {
        info!(records = framing.len(), "return file detected, skipping validation");
        return Preflight::Bypass(framing);
    }

    let mut global_errors = Vec::new();

    if !framing.is_aligned() {
        global_errors.push(format!(
            "file length {} is not a multiple of {RECORD_LEN} characters",
            framing.char_len
        ));
    }

    match framing.records.first() {
        Some(first) => {
            let signed = first.kind() == Some(RecordType::FileHeader)
                && first.field(FileHeader::SIGNATURE) == profile.signature;
            if !signed {
                global_errors.push("file header does not carry the expected signature".to_owned());
            }
        }
        None => global_errors.push("file is too short to carry a file header".to_owned()),
    }

    let invalid = framing
        .records
        .iter()
        .filter(|record| record.kind().is_none())
        .count();
    if invalid > 0 {
        global_errors.push(format!(
            "{invalid} record(s) carry an invalid record type in column 1"
        ));
    }

    if global_errors.is_empty() {
        return Preflight::Proceed(framing);
    }
    for message in &global_errors {
        warn!(records = framing.len(), "preflight failed: {message}");
    }
    Preflight::Abort {
        framing,
        global_errors,
    }
}
