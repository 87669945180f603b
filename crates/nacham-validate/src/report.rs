//! The terminal result of a validation request.

use nacham_error::{NachamError, Result};
use nacham_types::{LineStatus, Mark, MarkKind, MarkList};
use serde::{Deserialize, Serialize};

/// Per-line status, per-line marks and file-level errors.
///
/// This is the read-only contract with the viewer; field names serialize in
/// camelCase (`lineStatus`, `lineMarks`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// `None` for lines that were not evaluated.
    pub line_status: Vec<Option<LineStatus>>,
    /// Summary of why a line failed, when there is one.
    pub line_reason: Vec<Option<String>>,
    /// File-level problems; non-empty after an aborted preflight.
    pub global_errors: Vec<String>,
    pub line_marks: Vec<MarkList>,
    /// Return file: validation was skipped on purpose.
    pub is_devolucion: bool,
    /// Line of the authoritative file control record.
    pub trailer_index: Option<usize>,
}

impl ValidationReport {
    /// Report for `records` lines with nothing evaluated.
    #[must_use]
    pub fn blank(records: usize) -> Self {
        Self {
            line_status: vec![None; records],
            line_reason: vec![None; records],
            global_errors: Vec::new(),
            line_marks: vec![MarkList::new(); records],
            is_devolucion: false,
            trailer_index: None,
        }
    }

    /// Early result of a failed preflight.
    #[must_use]
    pub fn aborted(records: usize, global_errors: Vec<String>) -> Self {
        Self {
            global_errors,
            ..Self::blank(records)
        }
    }

    /// Result for a return file.
    #[must_use]
    pub fn return_file(records: usize) -> Self {
        Self {
            is_devolucion: true,
            ..Self::blank(records)
        }
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.line_status.len()
    }

    #[must_use]
    pub fn status(&self, line: usize) -> Option<LineStatus> {
        self.line_status.get(line).copied().flatten()
    }

    /// Marks of `line`; empty for out-of-range lines.
    #[must_use]
    pub fn marks(&self, line: usize) -> &[Mark] {
        self.line_marks
            .get(line)
            .map(MarkList::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn error_line_count(&self) -> usize {
        self.count_status(LineStatus::Error)
    }

    #[must_use]
    pub fn ok_line_count(&self) -> usize {
        self.count_status(LineStatus::Ok)
    }

    fn count_status(&self, wanted: LineStatus) -> usize {
        self.line_status
            .iter()
            .filter(|s| **s == Some(wanted))
            .count()
    }

    /// Total marks of one kind across the file.
    #[must_use]
    pub fn mark_count(&self, kind: MarkKind) -> usize {
        self.line_marks.iter().map(|m| m.count(kind)).sum()
    }

    /// Export gate used by consumers: a return file, or a file with no global
    /// errors, no failed line and a reconciled trailer.
    #[must_use]
    pub fn permits_export(&self) -> bool {
        if self.is_devolucion {
            return true;
        }
        self.global_errors.is_empty()
            && self.error_line_count() == 0
            && self
                .trailer_index
                .is_some_and(|line| self.status(line) == Some(LineStatus::Ok))
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(|e| NachamError::internal(format!("report serialization failed: {e}")))
    }
}
