//! End-to-end behavior of the record scan on fixture files.
//!
//! Every test starts from a file the builder guarantees to be clean and
//! damages one thing, then checks where the damage is reported and that it
//! stays contained.

use nacham_types::{
    Addenda, BatchControl, BatchHeader, Entry, FileControl, FileHeader, LineStatus, Mark,
    MarkKind, PaymentAddenda, ReturnAddenda, Span,
};
use nacham_validate::fixture::{
    BatchSpec, EntrySpec, FileBuilder, overwrite, overwrite_digits, render,
};
use nacham_validate::{Profile, ValidationOptions, ValidationReport, validate_text};

fn validate_with(records: &[String], options: &ValidationOptions) -> ValidationReport {
    validate_text(&render(records), options, &Profile::default(), |_| {})
}

fn validate(records: &[String]) -> ValidationReport {
    validate_with(records, &ValidationOptions::default())
}

fn errors(report: &ValidationReport, line: usize) -> Vec<&Mark> {
    report.marks(line).iter().filter(|m| m.is_error()).collect()
}

fn assert_ok(report: &ValidationReport, lines: std::ops::RangeInclusive<usize>) {
    for line in lines {
        assert_eq!(
            report.status(line),
            Some(LineStatus::Ok),
            "line {line}: {:?}",
            report.marks(line)
        );
    }
}

fn assert_error(report: &ValidationReport, lines: std::ops::RangeInclusive<usize>) {
    for line in lines {
        assert_eq!(report.status(line), Some(LineStatus::Error), "line {line}");
    }
}

/// Header, then payroll / collection / payroll batches of one entry each.
///
/// Lines: 0 header, 1..=3, 4..=6, 7..=9 batches, 10 trailer.
fn three_batches() -> Vec<String> {
    FileBuilder::new()
        .batch(BatchSpec::payroll().entry(EntrySpec::credit(150_000)))
        .batch(BatchSpec::collection().entry(EntrySpec::debit(80_000)))
        .batch(BatchSpec::payroll().entry(EntrySpec::credit(99)))
        .build()
}

#[test]
fn minimal_file_is_clean() {
    let report = validate(&FileBuilder::minimal().build());
    assert!(report.global_errors.is_empty(), "{:?}", report.global_errors);
    assert_ok(&report, 0..=4);
    assert_eq!(report.mark_count(MarkKind::Error), 0);
    assert_eq!(report.trailer_index, Some(4));
    assert!(report.permits_export());
}

#[test]
fn validation_is_idempotent() {
    let mut records = three_batches();
    overwrite_digits(&mut records[6], BatchControl::DEBITS, 1);
    let text = render(&records);
    let options = ValidationOptions::default();
    let profile = Profile::default();
    let first = validate_text(&text, &options, &profile, |_| {});
    let second = validate_text(&text, &options, &profile, |_| {});
    assert_eq!(first, second);
}

#[test]
fn one_cent_off_fails_only_its_batch() {
    let mut records = three_batches();
    overwrite_digits(&mut records[3], BatchControl::CREDITS, 150_001);
    let report = validate(&records);

    let marks = errors(&report, 3);
    assert_eq!(marks.len(), 1, "{marks:?}");
    assert_eq!(marks[0].span(), BatchControl::CREDITS);
    assert_error(&report, 1..=3);
    assert_ok(&report, 4..=9);
    assert_ok(&report, 0..=0);
    assert!(
        report.line_reason[3]
            .as_deref()
            .is_some_and(|r| r.contains("credit total mismatch"))
    );
    // The trailer sums declared batch totals, so it disagrees too.
    assert_eq!(report.status(10), Some(LineStatus::Error));
    assert!(!report.permits_export());
}

#[test]
fn addenda_without_entry_is_contained() {
    let with_addenda = FileBuilder::new()
        .batch(BatchSpec::payroll().entry(EntrySpec::credit(10).addenda("REF")))
        .build();
    let mut records = three_batches();
    records.insert(2, with_addenda[3].clone());
    let report = validate(&records);

    assert!(
        report.marks(2).iter().any(|m| m.is_error() && m.span() == Span::FULL),
        "{:?}",
        report.marks(2)
    );
    assert_error(&report, 1..=4);
    assert_ok(&report, 5..=10);
}

#[test]
fn records_outside_a_batch_are_rejected() {
    let mut records = three_batches();
    let entry = records[2].clone();
    records.insert(4, entry);
    let report = validate(&records);

    assert_eq!(report.status(4), Some(LineStatus::Error));
    assert_eq!(errors(&report, 4)[0].span(), Span::FULL);
    assert!(
        report.line_reason[4]
            .as_deref()
            .is_some_and(|r| r.contains("outside of an open batch"))
    );
    assert_ok(&report, 1..=3);
    assert_ok(&report, 5..=7);
}

#[test]
fn misplaced_file_header_is_rejected() {
    let mut records = FileBuilder::minimal().build();
    let header = records[0].clone();
    records.insert(4, header);
    let report = validate(&records);
    assert_eq!(report.status(4), Some(LineStatus::Error));
    assert_eq!(errors(&report, 4)[0].span(), Span::FULL);
    assert_ok(&report, 0..=3);
}

#[test]
fn return_file_skips_validation() {
    let mut records = FileBuilder::minimal().build();
    overwrite(&mut records[0], FileHeader::ORIGIN, "DEVOLUCION");
    overwrite_digits(&mut records[3], BatchControl::CREDITS, 1);
    let report = validate(&records);
    assert!(report.is_devolucion);
    assert!(report.line_status.iter().all(Option::is_none));
    assert!(report.global_errors.is_empty());
    assert!(report.permits_export());
}

#[test]
fn batch_number_regression_is_reported_once() {
    let batch = || BatchSpec::payroll().entry(EntrySpec::credit(500));
    let mut records = FileBuilder::new()
        .batch(batch())
        .batch(batch())
        .batch(batch())
        .batch(batch())
        .batch(batch())
        .build();
    // Batch four repeats number 2, batch five continues from there.
    overwrite(&mut records[10], BatchHeader::BATCH_NUMBER, "0000002");
    overwrite(&mut records[12], BatchControl::BATCH_NUMBER, "0000002");
    overwrite(&mut records[13], BatchHeader::BATCH_NUMBER, "0000003");
    overwrite(&mut records[15], BatchControl::BATCH_NUMBER, "0000003");
    let report = validate(&records);

    let marks = errors(&report, 10);
    assert_eq!(marks.len(), 1, "{marks:?}");
    assert_eq!(marks[0].span(), BatchHeader::BATCH_NUMBER);
    assert!(marks[0].note.as_deref().unwrap_or_default().contains("expected 0000004"));
    assert_eq!(errors(&report, 12).len(), 1);
    assert_ok(&report, 1..=9);
    assert_ok(&report, 13..=15);
}

#[test]
fn batch_control_number_must_match_header() {
    let mut records = FileBuilder::minimal().build();
    overwrite(&mut records[3], BatchControl::BATCH_NUMBER, "0000009");
    let report = validate(&records);
    let marks = errors(&report, 3);
    assert_eq!(marks.len(), 1);
    assert!(marks[0].note.as_deref().unwrap_or_default().contains("differs from 0000001"));
    assert_error(&report, 1..=3);
}

#[test]
fn entry_counter_runs_across_batches() {
    let mut records = three_batches();
    overwrite(&mut records[5], Entry::TRACE_COUNTER, "0000005");
    overwrite(&mut records[8], Entry::TRACE_COUNTER, "0000006");
    let report = validate(&records);
    let marks = errors(&report, 5);
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].span(), Entry::TRACE_COUNTER);
    assert_ok(&report, 7..=9);
}

#[test]
fn duplicate_references_mark_both_addenda() {
    let records = FileBuilder::new()
        .batch(
            BatchSpec::suppliers()
                .entry(EntrySpec::credit(700).addenda("FAC-001").addenda("FAC-001")),
        )
        .build();
    let report = validate(&records);
    for line in [3, 4] {
        assert!(
            report.marks(line).iter().any(|m| m.is_error() && m.span() == PaymentAddenda::REFERENCE),
            "line {line}: {:?}",
            report.marks(line)
        );
    }
    // The first occurrence loses its earlier ok mark on the same columns.
    assert!(report.marks(3).iter().all(|m| m.is_error() || m.span() != PaymentAddenda::REFERENCE));
    assert_error(&report, 1..=5);
}

#[test]
fn distinct_references_pass() {
    let records = FileBuilder::new()
        .batch(
            BatchSpec::suppliers()
                .entry(EntrySpec::credit(700).addenda("FAC-001").addenda("FAC-002"))
                .entry(EntrySpec::credit(300).addenda("FAC-001")),
        )
        .build();
    let report = validate(&records);
    assert_ok(&report, 0..=7);
    assert!(report.permits_export());
}

#[test]
fn references_are_required_in_supplier_batches() {
    let records = FileBuilder::new()
        .batch(BatchSpec::suppliers().entry(EntrySpec::credit(700).addenda("")))
        .build();
    let report = validate(&records);
    assert!(
        report.marks(3).iter().any(|m| m.is_error() && m.span() == PaymentAddenda::REFERENCE)
    );
}

#[test]
fn transaction_code_must_fit_the_batch() {
    let records = FileBuilder::new()
        .batch(BatchSpec::payroll().entry(EntrySpec::with_code("27", 10)))
        .build();
    let report = validate(&records);
    let marks = errors(&report, 2);
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].span(), Entry::TRANSACTION_CODE);
    assert_error(&report, 1..=3);
    assert_eq!(
        report.line_reason[3].as_deref(),
        Some("batch contains invalid records")
    );
}

#[test]
fn unmatched_batches_accept_any_code() {
    let records = FileBuilder::new()
        .batch(BatchSpec::new("CCD", "200", "VARIOS").entry(EntrySpec::with_code("27", 10)))
        .build();
    let report = validate(&records);
    assert_ok(&report, 0..=4);
}

#[test]
fn receiving_participant_is_fixed_per_batch() {
    let mut other = EntrySpec::credit(20);
    other.participant = "00000202".to_owned();
    let records = FileBuilder::new()
        .batch(BatchSpec::payroll().entry(EntrySpec::credit(10)).entry(other))
        .build();
    let report = validate(&records);
    let marks = errors(&report, 3);
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].span(), Entry::RECEIVING_ROUTING);
}

#[test]
fn debit_batches_declare_no_credits() {
    let mut records = FileBuilder::new()
        .batch(BatchSpec::collection().entry(EntrySpec::debit(4_200)))
        .build();
    overwrite_digits(&mut records[3], BatchControl::CREDITS, 4_200);
    let report = validate(&records);
    let marks = errors(&report, 3);
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].span(), BatchControl::CREDITS);
    assert!(marks[0].note.as_deref().unwrap_or_default().contains("debit batch"));
}

#[test]
fn announced_addenda_must_follow() {
    let mut records = FileBuilder::minimal().build();
    overwrite(&mut records[2], Entry::ADDENDA_FLAG, "1");
    let report = validate(&records);
    let marks = errors(&report, 2);
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].span(), Entry::ADDENDA_FLAG);
}

#[test]
fn unannounced_addenda_mark_both_records() {
    let mut records = FileBuilder::new()
        .batch(BatchSpec::payroll().entry(EntrySpec::credit(10).addenda("X")))
        .build();
    overwrite(&mut records[2], Entry::ADDENDA_FLAG, "0");
    let report = validate(&records);
    assert!(report.marks(2).iter().any(|m| m.is_error() && m.span() == Entry::ADDENDA_FLAG));
    assert!(report.marks(3).iter().any(|m| m.is_error() && m.span() == Span::TAG));
}

#[test]
fn addenda_must_point_at_its_entry() {
    let mut records = FileBuilder::new()
        .batch(BatchSpec::payroll().entry(EntrySpec::credit(10).addenda("X")))
        .build();
    overwrite(&mut records[3], PaymentAddenda::ENTRY_COUNTER, "0000042");
    overwrite(&mut records[3], PaymentAddenda::SEQUENCE, "0002");
    let report = validate(&records);
    let spans: Vec<Span> = errors(&report, 3).iter().map(|m| m.span()).collect();
    assert_eq!(spans, vec![PaymentAddenda::ENTRY_COUNTER, PaymentAddenda::SEQUENCE]);
}

#[test]
fn nested_batch_header_abandons_the_open_batch() {
    let mut records = FileBuilder::new()
        .batch(BatchSpec::payroll().entry(EntrySpec::credit(10)))
        .batch(BatchSpec::payroll().entry(EntrySpec::credit(20)))
        .build();
    records.remove(3);
    let report = validate(&records);
    assert_error(&report, 1..=2);
    assert!(report.marks(1).iter().any(|m| m.is_error() && m.span() == Span::TAG));
    assert!(report.marks(3).iter().any(|m| m.is_error() && m.span() == Span::TAG));
}

#[test]
fn unclosed_batch_at_end_of_file() {
    let mut records = FileBuilder::minimal().build();
    records.remove(3);
    let report = validate(&records);
    assert_error(&report, 1..=2);
    assert!(report.marks(1).iter().any(|m| m.is_error() && m.span() == Span::TAG));
}

#[test]
fn missing_trailer_is_a_global_error() {
    let mut records = FileBuilder::minimal().build();
    records.pop();
    let report = validate(&records);
    assert_eq!(report.global_errors, vec!["file control record (type 9) not found"]);
    assert_ok(&report, 0..=3);
    assert_eq!(report.trailer_index, None);
    assert!(!report.permits_export());
}

#[test]
fn only_the_first_trailer_counts() {
    let records = FileBuilder::minimal().fillers(5).build();
    let report = validate(&records);
    assert_eq!(report.trailer_index, Some(4));
    assert_ok(&report, 0..=4);
    for line in 5..10 {
        assert_eq!(report.status(line), None);
        assert_eq!(report.marks(line).len(), 1);
        assert_eq!(report.marks(line)[0].kind, MarkKind::Info);
    }
    assert!(report.permits_export());
}

#[test]
fn block_count_is_checked() {
    let mut records = FileBuilder::minimal().build();
    overwrite_digits(&mut records[4], FileControl::BLOCK_COUNT, 2);
    let report = validate(&records);
    let marks = errors(&report, 4);
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].span(), FileControl::BLOCK_COUNT);
    assert_eq!(report.status(4), Some(LineStatus::Error));
}

#[test]
fn disabled_checks_do_not_fail() {
    let mut records = three_batches();
    overwrite_digits(&mut records[3], BatchControl::CREDITS, 1);
    let options = ValidationOptions {
        check_credits: false,
        ..ValidationOptions::default()
    };
    let report = validate_with(&records, &options);
    assert_ok(&report, 0..=10);
    assert!(report.permits_export());
}

#[test]
fn addenda_can_be_left_out_of_counts() {
    let records = FileBuilder::new()
        .batch(BatchSpec::payroll().entry(EntrySpec::credit(10).addenda("X")))
        .build();
    let options = ValidationOptions {
        include_addenda_in_trans: false,
        ..ValidationOptions::default()
    };
    let report = validate_with(&records, &options);
    assert_eq!(errors(&report, 4)[0].span(), BatchControl::ENTRY_COUNT);
    assert_eq!(errors(&report, 5)[0].span(), FileControl::ENTRY_COUNT);
}

#[test]
fn file_identifier_follows_serial() {
    let records = FileBuilder::minimal().file_id('B').build();
    let report = validate_with(&records, &ValidationOptions::default().with_serial("2"));
    assert_ok(&report, 0..=0);
    assert!(report.marks(0).iter().any(|m| m.kind == MarkKind::Ok && m.span() == FileHeader::FILE_ID));

    let report = validate_with(&records, &ValidationOptions::default().with_serial("3"));
    assert_eq!(report.status(0), Some(LineStatus::Error));
    assert_eq!(errors(&report, 0)[0].span(), FileHeader::FILE_ID);
    // The identifier check stays independent of the batches.
    assert_ok(&report, 1..=4);
}

#[test]
fn header_checks_set_header_status() {
    let mut records = FileBuilder::minimal().build();
    overwrite(&mut records[0], FileHeader::CREATION_DATE, "20240230");
    overwrite(&mut records[0], FileHeader::BLOCKING_FACTOR, "20");
    let report = validate(&records);
    let spans: Vec<Span> = errors(&report, 0).iter().map(|m| m.span()).collect();
    assert_eq!(spans, vec![FileHeader::CREATION_DATE, FileHeader::BLOCKING_FACTOR]);
    assert_eq!(report.status(0), Some(LineStatus::Error));
    assert_ok(&report, 1..=4);
}

#[test]
fn julian_day_must_match_effective_date() {
    let mut records = FileBuilder::minimal().build();
    overwrite(&mut records[1], BatchHeader::JULIAN, "017");
    let report = validate(&records);
    assert_eq!(errors(&report, 1)[0].span(), BatchHeader::JULIAN);
    assert_error(&report, 1..=3);
}

#[test]
fn progress_is_monotonic_and_completes() {
    let batch = || BatchSpec::payroll().entry(EntrySpec::credit(1)).entry(EntrySpec::credit(2));
    let mut builder = FileBuilder::new();
    for _ in 0..30 {
        builder = builder.batch(batch());
    }
    let text = render(&builder.build());
    let mut seen = Vec::new();
    let report = validate_text(
        &text,
        &ValidationOptions::default(),
        &Profile::default(),
        |pct| seen.push(pct),
    );
    assert!(report.permits_export());
    assert!(seen.len() > 2);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last(), Some(&100));
}

#[test]
fn report_json_shape() {
    let mut records = FileBuilder::minimal().build();
    overwrite_digits(&mut records[3], BatchControl::DEBITS, 5);
    let report = validate(&records);
    let value: serde_json::Value = serde_json::from_str(&report.to_json(false).unwrap()).unwrap();
    assert_eq!(value["lineStatus"][3], "error");
    assert_eq!(value["trailerIndex"], 4);
    let marks = value["lineMarks"][3].as_array().unwrap();
    let debit = marks
        .iter()
        .find(|m| m["type"] == "error")
        .unwrap();
    assert_eq!(debit["start"], 20);
    assert_eq!(debit["end"], 38);
}

/// Reversal batch, one entry returned by a `99` addenda.
///
/// Lines: 0 header, 1 batch header, 2 entry, 3 return addenda, 4 control, 5 trailer.
fn reversal() -> FileBuilder {
    FileBuilder::new()
        .batch(BatchSpec::reversal().entry(EntrySpec::with_code("21", 500).returned("R01")))
}

#[test]
fn return_addenda_in_a_reversal_batch_pass() {
    let report = validate(&reversal().build());
    assert_ok(&report, 0..=5);
    assert!(
        report
            .marks(3)
            .iter()
            .any(|m| m.span() == ReturnAddenda::ENTRY_COUNTER && !m.is_error())
    );
}

#[test]
fn return_addenda_points_back_at_its_entry() {
    let mut records = reversal().build();
    overwrite(&mut records[3], ReturnAddenda::ENTRY_COUNTER, "0000009");
    let report = validate(&records);
    let marks = errors(&report, 3);
    assert_eq!(marks.len(), 1, "{marks:?}");
    assert_eq!(marks[0].span(), ReturnAddenda::ENTRY_COUNTER);
    assert_error(&report, 1..=4);
}

#[test]
fn return_addenda_must_come_first() {
    let records = FileBuilder::new()
        .batch(
            BatchSpec::reversal().entry(EntrySpec::with_code("21", 500).addenda("X").returned("R01")),
        )
        .build();
    let report = validate(&records);
    assert!(errors(&report, 3).is_empty());
    let marks = errors(&report, 4);
    assert_eq!(marks.len(), 1, "{marks:?}");
    assert_eq!(marks[0].span(), Addenda::SUB_CODE);
    assert!(marks[0].note.as_deref().unwrap_or_default().contains("first addenda"));
    assert!(report.marks(4).iter().all(|m| m.is_error() || m.span() != Addenda::SUB_CODE));
}

#[test]
fn return_addenda_only_in_reversal_batches() {
    let records = FileBuilder::new()
        .batch(BatchSpec::payroll().entry(EntrySpec::credit(500).returned("R01")))
        .build();
    let report = validate(&records);
    let marks = errors(&report, 3);
    assert_eq!(marks.len(), 1, "{marks:?}");
    assert_eq!(marks[0].span(), Addenda::SUB_CODE);
    assert!(marks[0].note.as_deref().unwrap_or_default().contains("\"99\""));
    assert_error(&report, 1..=4);
}

#[test]
fn addenda_sub_code_is_checked() {
    let mut records = FileBuilder::new()
        .batch(BatchSpec::payroll().entry(EntrySpec::credit(10).addenda("X")))
        .build();
    overwrite(&mut records[3], Addenda::SUB_CODE, "12");
    let report = validate(&records);
    let marks = errors(&report, 3);
    assert_eq!(marks.len(), 1, "{marks:?}");
    assert_eq!(marks[0].span(), Addenda::SUB_CODE);
    assert_error(&report, 1..=4);
    assert_ok(&report, 0..=0);
}

#[test]
fn batch_control_class_must_match_header() {
    let mut records = FileBuilder::minimal().build();
    overwrite(&mut records[3], BatchControl::CLASS_CODE, "225");
    let report = validate(&records);
    let marks = errors(&report, 3);
    assert_eq!(marks.len(), 1, "{marks:?}");
    assert_eq!(marks[0].span(), BatchControl::CLASS_CODE);
    assert!(
        report.line_reason[3]
            .as_deref()
            .is_some_and(|r| r.contains("batch class \"225\""))
    );
    assert_error(&report, 1..=3);
}

#[test]
fn batch_control_code_must_match_header() {
    let mut records = FileBuilder::minimal().build();
    overwrite(&mut records[3], BatchControl::BATCH_CODE, "00099999");
    let report = validate(&records);
    let marks = errors(&report, 3);
    assert_eq!(marks.len(), 1, "{marks:?}");
    assert_eq!(marks[0].span(), BatchControl::BATCH_CODE);
    assert_error(&report, 1..=3);
}

#[test]
fn unknown_batch_class_is_rejected() {
    let records = FileBuilder::new()
        .batch(BatchSpec::new("PPD", "300", "NOMINA").entry(EntrySpec::credit(10)))
        .build();
    let report = validate(&records);
    let marks = errors(&report, 1);
    assert_eq!(marks.len(), 1, "{marks:?}");
    assert_eq!(marks[0].span(), BatchHeader::CLASS_CODE);
    assert_error(&report, 1..=3);
    assert_ok(&report, 4..=4);
}

#[test]
fn impossible_effective_date_is_rejected() {
    let mut batch = BatchSpec::payroll().entry(EntrySpec::credit(10));
    batch.effective_date = "20240230".to_owned();
    let report = validate(&FileBuilder::new().batch(batch).build());
    let marks = errors(&report, 1);
    assert_eq!(marks.len(), 1, "{marks:?}");
    assert_eq!(marks[0].span(), BatchHeader::EFFECTIVE_DATE);
    assert!(report.marks(1).iter().all(|m| m.span() != BatchHeader::JULIAN));
    assert_error(&report, 1..=3);
}

#[test]
fn non_numeric_declared_totals_fail_reconciliation() {
    let mut records = FileBuilder::minimal().build();
    let garbled = format!("{}X", "0".repeat(BatchControl::DEBITS.len() - 1));
    overwrite(&mut records[3], BatchControl::DEBITS, &garbled);
    let report = validate(&records);
    let marks = errors(&report, 3);
    assert_eq!(marks.len(), 1, "{marks:?}");
    assert_eq!(marks[0].span(), BatchControl::DEBITS);
    assert_eq!(marks[0].note.as_deref(), Some("debit total is not numeric"));
    assert_error(&report, 1..=3);

    let mut records = FileBuilder::minimal().build();
    overwrite(&mut records[4], FileControl::ENTRY_COUNT, "0000000A");
    let report = validate(&records);
    let marks = errors(&report, 4);
    assert_eq!(marks.len(), 1, "{marks:?}");
    assert_eq!(marks[0].span(), FileControl::ENTRY_COUNT);
    assert_ok(&report, 0..=3);
}
