//! Single-pass structural and arithmetic validator.
//!
//! [`Scan`] walks the records left to right exactly once. It owns every
//! accumulator of the pass (the open batch, file totals, cross-file
//! sequence baselines), so each call starts from fresh state and two runs
//! over the same input produce identical reports.
//!
//! Nothing in here aborts: every anomaly becomes a mark, the scan keeps
//! going, and sequence checks re-baseline on the observed value so one bad
//! counter produces one diagnostic instead of a cascade.

mod batch;
mod file;

use nacham_types::{
    Cents, FileControl, LineStatus, Mark, Record, RecordView, Span, group_thousands,
};
use tracing::{debug_span, info, warn};

use crate::options::ValidationOptions;
use crate::preflight::{Preflight, preflight};
use crate::profile::Profile;
use crate::report::ValidationReport;

use self::batch::OpenBatch;

/// Control totals are 10-digit fields; sums wrap at this modulus.
pub const CONTROL_MODULUS: u128 = 10_000_000_000;

/// Roughly how many progress notifications a scan emits.
const PROGRESS_STEPS: usize = 20;

/// Validate decoded, compacted text: preflight first, then the full scan.
///
/// `progress` receives percentages in `0..=100`; it is purely observational.
pub fn validate_text<P>(
    text: &str,
    options: &ValidationOptions,
    profile: &Profile,
    mut progress: P,
) -> ValidationReport
where
    P: FnMut(u8),
{
    match preflight(text, profile) {
        Preflight::Proceed(framing) => validate_records(&framing.records, options, profile, progress),
        Preflight::Abort {
            framing,
            global_errors,
        } => {
            progress(100);
            ValidationReport::aborted(framing.len(), global_errors)
        }
        Preflight::Bypass(framing) => {
            progress(100);
            ValidationReport::return_file(framing.len())
        }
    }
}

/// Run the scan over already framed records, without preflight.
pub fn validate_records<P>(
    records: &[Record<'_>],
    options: &ValidationOptions,
    profile: &Profile,
    progress: P,
) -> ValidationReport
where
    P: FnMut(u8),
{
    Scan::new(records, options, profile).run(progress)
}

/// Running totals across the whole file.
#[derive(Debug, Default)]
struct FileTotals {
    batches: u64,
    entries: u64,
    addenda: u64,
    /// Sum of the control totals declared by every batch control.
    control: u128,
    /// Sum of the debits declared by every batch control.
    debits: Cents,
    /// Sum of the credits declared by every batch control.
    credits: Cents,
}

/// Last observed value of each file-wide counter.
#[derive(Debug, Default)]
struct Sequences {
    batch_header: Option<u64>,
    batch_control: Option<u64>,
    entry: Option<u64>,
}

/// Record `observed` as the new baseline of `slot`.
///
/// Returns the value that was expected when `observed` does not follow the
/// previous baseline by exactly one. The first value seen sets the baseline.
fn advance(slot: &mut Option<u64>, observed: u64) -> Option<u64> {
    let expected = slot.map(|previous| previous + 1);
    *slot = Some(observed);
    expected.filter(|&e| e != observed)
}

/// Fixed-width, digits-only counter field.
fn parse_counter(field: &str, width: usize) -> Option<u64> {
    if field.len() != width || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// How a reconciled quantity is shown in notes.
#[derive(Debug, Clone, Copy)]
enum Render {
    Count,
    Hash,
    Money,
}

impl Render {
    fn apply(self, value: u128) -> String {
        match self {
            Self::Count => value.to_string(),
            Self::Hash => group_thousands(value),
            Self::Money => Cents(value).to_string(),
        }
    }
}

struct Scan<'a, 'p> {
    records: &'a [Record<'a>],
    options: &'p ValidationOptions,
    profile: &'p Profile,
    report: ValidationReport,
    batch: Option<OpenBatch<'a, 'p>>,
    totals: FileTotals,
    sequences: Sequences,
    trailer: Option<(usize, FileControl<'a>)>,
}

impl<'a, 'p> Scan<'a, 'p> {
    fn new(records: &'a [Record<'a>], options: &'p ValidationOptions, profile: &'p Profile) -> Self {
        Self {
            records,
            options,
            profile,
            report: ValidationReport::blank(records.len()),
            batch: None,
            totals: FileTotals::default(),
            sequences: Sequences::default(),
            trailer: None,
        }
    }

    fn run<P: FnMut(u8)>(mut self, mut progress: P) -> ValidationReport {
        let total = self.records.len();
        let _span = debug_span!("nacham_scan", records = total).entered();
        let step = (total / PROGRESS_STEPS).max(1);

        for line in 0..total {
            let record = self.records[line];
            self.visit(line, &record);
            if line % step == 0 {
                progress(u8::try_from(line * 100 / total).unwrap_or(100));
            }
        }

        self.finish();
        progress(100);
        self.report
    }

    fn visit(&mut self, line: usize, record: &Record<'a>) {
        match RecordView::read(record) {
            Some(RecordView::FileHeader(header)) => self.file_header(line, &header),
            Some(RecordView::BatchHeader(header)) => self.batch_header(line, &header),
            Some(RecordView::Entry(entry)) => self.entry(line, &entry),
            Some(RecordView::Addenda(addenda)) => self.addenda(line, &addenda),
            Some(RecordView::BatchControl(control)) => self.batch_control(line, &control),
            Some(RecordView::FileControl(control)) => self.file_control(line, control),
            None => {
                let note = format!("invalid record type {:?} in column 1", record.tag());
                self.reject(line, &note);
            }
        }
    }

    fn finish(&mut self) {
        if let Some(open) = self.batch.take() {
            self.abandon(open, "batch is never closed by a batch control record");
        }
        self.reconcile_trailer();

        info!(
            records = self.records.len(),
            batches = self.totals.batches,
            entries = self.totals.entries,
            addenda = self.totals.addenda,
            error_lines = self.report.error_line_count(),
            global_errors = self.report.global_errors.len(),
            "scan finished"
        );
    }

    // ── mark bookkeeping ────────────────────────────────────────────────

    fn mark(&mut self, line: usize, mark: Mark) {
        self.report.line_marks[line].push_unique(mark);
    }

    fn error(&mut self, line: usize, span: Span, note: impl Into<String>) {
        self.mark(line, Mark::error(span, note));
    }

    fn ok(&mut self, line: usize, span: Span, note: impl Into<String>) {
        self.mark(line, Mark::ok(span, note));
    }

    /// `ok` or `error` mark depending on `passed`; returns `passed`.
    fn check(
        &mut self,
        line: usize,
        span: Span,
        passed: bool,
        ok_note: impl Into<String>,
        error_note: impl Into<String>,
    ) -> bool {
        if passed {
            self.ok(line, span, ok_note);
        } else {
            self.error(line, span, error_note);
        }
        passed
    }

    fn set_status(&mut self, line: usize, status: LineStatus) {
        self.report.line_status[line] = Some(status);
    }

    fn paint(&mut self, first: usize, last: usize, status: LineStatus) {
        for line in first..=last {
            self.set_status(line, status);
        }
    }

    fn has_errors(&self, first: usize, last: usize) -> bool {
        (first..=last).any(|line| self.report.line_marks[line].has_errors())
    }

    /// Full-line error on a record that cannot take part in the structure.
    fn reject(&mut self, line: usize, note: &str) {
        warn!(line = line + 1, "{note}");
        self.error(line, Span::FULL, note);
        self.set_status(line, LineStatus::Error);
        self.report.line_reason[line] = Some(note.to_owned());
    }

    /// Compare a declared quantity with the computed one and mark the field.
    #[allow(clippy::too_many_arguments)]
    fn reconcile(
        &mut self,
        line: usize,
        span: Span,
        label: &str,
        declared: Option<u128>,
        computed: u128,
        render: Render,
        failures: &mut Vec<String>,
    ) {
        match declared {
            None => {
                let note = format!("{label} is not numeric");
                self.error(line, span, note.clone());
                failures.push(note);
            }
            Some(declared) if declared == computed => {
                self.ok(line, span, format!("{label} matches ({})", render.apply(declared)));
            }
            Some(declared) => {
                let note = format!(
                    "{label} mismatch: declared {}, computed {}",
                    render.apply(declared),
                    render.apply(computed)
                );
                self.error(line, span, note.clone());
                failures.push(note);
            }
        }
    }

    /// Close a line's evaluation: `ok` unless it carries an error mark.
    fn settle(&mut self, line: usize, failures: &[String]) {
        let ok = failures.is_empty() && !self.report.line_marks[line].has_errors();
        self.set_status(line, LineStatus::from_ok(ok));
        if !failures.is_empty() {
            self.report.line_reason[line] = Some(failures.join(" | "));
        }
    }
}
