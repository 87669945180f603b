//! Diagnostic marks and per-line status.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::record::Span;

/// Severity of a [`Mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    Error,
    Ok,
    Info,
}

/// Aggregate outcome of one line.
///
/// Lines that were never evaluated carry no status (`None` in the report).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    Ok,
    Error,
}

impl LineStatus {
    #[must_use]
    pub const fn from_ok(ok: bool) -> Self {
        if ok { Self::Ok } else { Self::Error }
    }
}

/// A diagnostic over the half-open column range `[start, end)` of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: MarkKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Mark {
    pub fn new(span: Span, kind: MarkKind, note: impl Into<String>) -> Self {
        Self {
            start: span.start,
            end: span.end,
            kind,
            note: Some(note.into()),
        }
    }

    pub fn error(span: Span, note: impl Into<String>) -> Self {
        Self::new(span, MarkKind::Error, note)
    }

    pub fn ok(span: Span, note: impl Into<String>) -> Self {
        Self::new(span, MarkKind::Ok, note)
    }

    pub fn info(span: Span, note: impl Into<String>) -> Self {
        Self::new(span, MarkKind::Info, note)
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == MarkKind::Error
    }

    fn same_slot(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end && self.kind == other.kind
    }
}

/// Marks of one record. Records rarely carry more than a handful.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkList(SmallVec<[Mark; 6]>);

impl MarkList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `mark`, merging it into an existing mark with the same range and
    /// kind. Merged notes are joined with `" | "`; a note already present is
    /// not repeated.
    pub fn push_unique(&mut self, mark: Mark) {
        let Some(existing) = self.0.iter_mut().find(|m| m.same_slot(&mark)) else {
            self.0.push(mark);
            return;
        };
        let Some(note) = mark.note else {
            return;
        };
        match existing.note.as_mut() {
            None => existing.note = Some(note),
            Some(current) if !current.contains(note.as_str()) => {
                current.push_str(" | ");
                current.push_str(&note);
            }
            Some(_) => {}
        }
    }

    /// Drop the mark covering exactly `span` with the given kind.
    pub fn retract(&mut self, span: Span, kind: MarkKind) {
        self.0.retain(|m| !(m.span() == span && m.kind == kind));
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Mark::is_error)
    }

    #[must_use]
    pub fn count(&self, kind: MarkKind) -> usize {
        self.0.iter().filter(|m| m.kind == kind).count()
    }

    /// First mark covering exactly `span` with the given kind.
    #[must_use]
    pub fn find(&self, span: Span, kind: MarkKind) -> Option<&Mark> {
        self.0
            .iter()
            .find(|m| m.span() == span && m.kind == kind)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Mark] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mark> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Mark> {
        self.0.into_vec()
    }
}

impl<'a> IntoIterator for &'a MarkList {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
