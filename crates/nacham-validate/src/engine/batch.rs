//! Batch-level handlers: headers (5), entries (6), addenda (7), controls (8).

use nacham_types::{
    Addenda, BatchControl, BatchHeader, CalendarDate, Cents, Entry, LineStatus, Mark,
    MarkKind, PaymentAddenda, RecordType, Span, parse_unsigned,
};
use tracing::{debug, warn};

use super::{CONTROL_MODULUS, Render, Scan, advance, parse_counter};
use crate::profile::BatchRule;

/// A batch between its header and its control record.
#[derive(Debug)]
pub(super) struct OpenBatch<'a, 'p> {
    /// Line of the batch header.
    pub(super) start: usize,
    /// Last line that belongs to the batch so far.
    pub(super) last: usize,
    class_code: &'a str,
    batch_code: &'a str,
    batch_number: &'a str,
    rule: Option<&'p BatchRule>,
    addenda_codes: &'p [String],
    entries: u64,
    addenda: u64,
    debits: Cents,
    credits: Cents,
    control: u128,
    has_debits: bool,
    /// Receiving participant and check digit of the first entry.
    routing: Option<(usize, &'a str, &'a str)>,
    entry: Option<EntryContext<'a>>,
}

/// The most recent entry detail, which following addenda attach to.
#[derive(Debug)]
struct EntryContext<'a> {
    line: usize,
    allows_addenda: bool,
    counter: &'a str,
    addenda_seen: u64,
    next_sequence: u64,
    references: Vec<(usize, &'a str)>,
}

impl<'a, 'p> Scan<'a, 'p> {
    pub(super) fn batch_header(&mut self, line: usize, header: &BatchHeader<'a>) {
        let profile = self.profile;
        self.totals.batches += 1;

        if let Some(open) = self.batch.take() {
            let opened_at = open.start;
            let reason = format!(
                "batch is still open when a new batch header appears at line {}",
                line + 1
            );
            self.abandon(open, &reason);
            self.error(
                line,
                Span::TAG,
                format!(
                    "batch header while the batch opened at line {} is still open",
                    opened_at + 1
                ),
            );
        }

        self.check(
            line,
            BatchHeader::CLASS_CODE,
            profile.is_batch_class(header.class_code),
            format!("batch class {}", header.class_code),
            format!(
                "batch class must be one of {}, found {:?}",
                profile.batch_classes.join(", "),
                header.class_code
            ),
        );

        match CalendarDate::parse_yyyymmdd(header.effective_date) {
            Some(date) => {
                self.ok(line, BatchHeader::EFFECTIVE_DATE, format!("effective date {date}"));
                let julian = date.julian();
                self.check(
                    line,
                    BatchHeader::JULIAN,
                    header.julian == julian,
                    format!("julian day {julian}"),
                    format!(
                        "julian day should be {julian} for {date}, found {:?}",
                        header.julian
                    ),
                );
            }
            None => self.error(
                line,
                BatchHeader::EFFECTIVE_DATE,
                format!(
                    "invalid effective date (YYYYMMDD = {:?})",
                    header.effective_date
                ),
            ),
        }

        self.check_originator(line, BatchHeader::BATCH_CODE, header.batch_code);
        match parse_counter(header.batch_number, 7) {
            Some(number) => match advance(&mut self.sequences.batch_header, number) {
                Some(expected) => self.error(
                    line,
                    BatchHeader::BATCH_NUMBER,
                    format!(
                        "batch number out of sequence: expected {expected:07}, found {number:07}"
                    ),
                ),
                None => self.ok(line, BatchHeader::BATCH_NUMBER, format!("batch {number:07}")),
            },
            None => self.error(
                line,
                BatchHeader::BATCH_NUMBER,
                format!("batch number must be 7 digits, found {:?}", header.batch_number),
            ),
        }

        let rule = profile.rule_for(header.service_type, header.class_code, header.description);
        if let Some(rule) = rule {
            let mut note = format!(
                "{} batch: transaction codes {}",
                rule.service_type,
                rule.allowed_codes.join(", ")
            );
            if rule.unique_references {
                note.push_str("; addenda references must be unique per entry");
            }
            self.mark(
                line,
                Mark::info(
                    Span::new(BatchHeader::SERVICE_TYPE.start, BatchHeader::DESCRIPTION.end),
                    note,
                ),
            );
        }
        let addenda_codes = rule
            .and_then(|r| r.addenda_codes.as_deref())
            .unwrap_or(profile.addenda_codes.as_slice());

        debug!(
            line = line + 1,
            service_type = header.service_type.trim(),
            class_code = header.class_code,
            rule = rule.is_some(),
            "batch opened"
        );

        self.batch = Some(OpenBatch {
            start: line,
            last: line,
            class_code: header.class_code,
            batch_code: header.batch_code,
            batch_number: header.batch_number,
            rule,
            addenda_codes,
            entries: 0,
            addenda: 0,
            debits: Cents::ZERO,
            credits: Cents::ZERO,
            control: 0,
            has_debits: false,
            routing: None,
            entry: None,
        });
    }

    pub(super) fn entry(&mut self, line: usize, entry: &Entry<'a>) {
        let profile = self.profile;
        let Some(mut batch) = self.batch.take() else {
            self.stray(line, RecordType::Entry);
            return;
        };
        self.close_entry(&mut batch);

        batch.last = line;
        batch.entries += 1;
        self.totals.entries += 1;

        if let Some(rule) = batch.rule {
            self.check(
                line,
                Entry::TRANSACTION_CODE,
                rule.allows(entry.transaction_code),
                format!("transaction code {}", entry.transaction_code),
                format!(
                    "transaction code {:?} is not allowed in {} batches; expected one of {}",
                    entry.transaction_code,
                    rule.service_type,
                    rule.allowed_codes.join(", ")
                ),
            );
        }

        let participant = entry.receiving_participant;
        let check_digit = entry.check_digit;
        match batch.routing {
            None => batch.routing = Some((line, participant, check_digit)),
            Some((first, p, d)) if p != participant || d != check_digit => self.error(
                line,
                Entry::RECEIVING_ROUTING,
                format!(
                    "receiving participant {participant}-{check_digit} differs from {p}-{d} set at line {}",
                    first + 1
                ),
            ),
            Some(_) => {}
        }

        let debit = profile.is_debit(entry.transaction_code);
        batch.has_debits |= debit;
        match Cents::parse(entry.amount) {
            Some(amount) if debit => batch.debits += amount,
            Some(amount) => batch.credits += amount,
            None => self.error(line, Entry::AMOUNT, "amount is not numeric"),
        }

        match parse_unsigned(participant) {
            Some(value) => batch.control = (batch.control + value) % CONTROL_MODULUS,
            None => self.error(
                line,
                Entry::RECEIVING_PARTICIPANT,
                "receiving participant is not numeric",
            ),
        }

        let allows_addenda = match entry.addenda_flag {
            "1" => true,
            "0" => false,
            other => {
                self.error(
                    line,
                    Entry::ADDENDA_FLAG,
                    format!("addenda indicator must be 0 or 1, found {other:?}"),
                );
                false
            }
        };

        self.check_originator(line, Entry::TRACE_CODE, entry.trace_code);
        match parse_counter(entry.trace_counter, 7) {
            Some(counter) => match advance(&mut self.sequences.entry, counter) {
                Some(expected) => self.error(
                    line,
                    Entry::TRACE_COUNTER,
                    format!(
                        "entry counter out of sequence: expected {expected:07}, found {counter:07}"
                    ),
                ),
                None => self.ok(line, Entry::TRACE_COUNTER, format!("entry {counter:07}")),
            },
            None => self.error(
                line,
                Entry::TRACE_COUNTER,
                format!("entry counter must be 7 digits, found {:?}", entry.trace_counter),
            ),
        }

        batch.entry = Some(EntryContext {
            line,
            allows_addenda,
            counter: entry.trace_counter,
            addenda_seen: 0,
            next_sequence: 1,
            references: Vec::new(),
        });
        self.batch = Some(batch);
    }

    pub(super) fn addenda(&mut self, line: usize, addenda: &Addenda<'a>) {
        let Some(mut batch) = self.batch.take() else {
            self.stray(line, RecordType::Addenda);
            return;
        };
        batch.last = line;
        batch.addenda += 1;
        self.totals.addenda += 1;

        let Some(mut entry) = batch.entry.take() else {
            let note = "addenda record without a preceding entry detail";
            warn!(line = line + 1, "{note}");
            self.error(line, Span::FULL, note);
            self.batch = Some(batch);
            return;
        };
        entry.addenda_seen += 1;

        if !entry.allows_addenda {
            self.error(
                line,
                Span::TAG,
                format!(
                    "entry detail at line {} does not announce addenda",
                    entry.line + 1
                ),
            );
            self.error(
                entry.line,
                Entry::ADDENDA_FLAG,
                format!("addenda indicator is 0 but an addenda follows at line {}", line + 1),
            );
        }

        let sub_code = addenda.sub_code();
        if !batch.addenda_codes.iter().any(|c| c == sub_code) {
            self.error(
                line,
                Addenda::SUB_CODE,
                format!(
                    "addenda type {sub_code:?} is not allowed here; expected one of {}",
                    batch.addenda_codes.join(", ")
                ),
            );
        } else if matches!(addenda, Addenda::Return(_)) && entry.addenda_seen != 1 {
            self.error(
                line,
                Addenda::SUB_CODE,
                "return addenda must be the first addenda of its entry",
            );
        } else {
            self.ok(line, Addenda::SUB_CODE, format!("addenda type {sub_code}"));
        }

        let counter = addenda.entry_counter();
        self.check(
            line,
            addenda.entry_counter_span(),
            counter == entry.counter,
            format!("belongs to entry {counter}"),
            format!(
                "addenda refers to entry {counter:?}, but the preceding entry is {}",
                entry.counter
            ),
        );

        match addenda {
            Addenda::Payment(payment) => {
                match parse_counter(payment.sequence, 4) {
                    Some(sequence) => {
                        let expected = entry.next_sequence;
                        entry.next_sequence = sequence + 1;
                        self.check(
                            line,
                            PaymentAddenda::SEQUENCE,
                            sequence == expected,
                            format!("addenda {sequence:04}"),
                            format!(
                                "addenda sequence out of order: expected {expected:04}, found {sequence:04}"
                            ),
                        );
                    }
                    None => self.error(
                        line,
                        PaymentAddenda::SEQUENCE,
                        format!("addenda sequence must be 4 digits, found {:?}", payment.sequence),
                    ),
                }
                if batch.rule.is_some_and(|r| r.unique_references) {
                    self.check_reference(line, &mut entry, payment.reference);
                }
            }
            Addenda::Return(_) => entry.next_sequence += 1,
        }

        batch.entry = Some(entry);
        self.batch = Some(batch);
    }

    pub(super) fn batch_control(&mut self, line: usize, control: &BatchControl<'a>) {
        let options = self.options;
        let Some(mut batch) = self.batch.take() else {
            self.stray(line, RecordType::BatchControl);
            return;
        };
        self.close_entry(&mut batch);

        let declared_count = parse_unsigned(control.entry_count);
        let declared_control = parse_unsigned(control.control_total);
        let declared_debits = parse_unsigned(control.debits);
        let declared_credits = parse_unsigned(control.credits);

        if let Some(value) = declared_control {
            self.totals.control = (self.totals.control + value) % CONTROL_MODULUS;
        }
        if let Some(value) = declared_debits {
            self.totals.debits += Cents(value);
        }
        if let Some(value) = declared_credits {
            self.totals.credits += Cents(value);
        }

        let mut failures = Vec::new();

        if options.check_trans_count {
            let mut computed = batch.entries;
            if options.include_addenda_in_trans {
                computed += batch.addenda;
            }
            self.reconcile(
                line,
                BatchControl::ENTRY_COUNT,
                "entry count",
                declared_count,
                u128::from(computed),
                Render::Count,
                &mut failures,
            );
        }
        if options.check_control_totals {
            self.reconcile(
                line,
                BatchControl::CONTROL_TOTAL,
                "control total",
                declared_control,
                batch.control,
                Render::Hash,
                &mut failures,
            );
        }
        if options.check_debits {
            self.reconcile(
                line,
                BatchControl::DEBITS,
                "debit total",
                declared_debits,
                batch.debits.0,
                Render::Money,
                &mut failures,
            );
        }
        if options.check_credits {
            let (label, computed) = if batch.has_debits {
                ("credit total of a debit batch", Cents::ZERO)
            } else {
                ("credit total", batch.credits)
            };
            self.reconcile(
                line,
                BatchControl::CREDITS,
                label,
                declared_credits,
                computed.0,
                Render::Money,
                &mut failures,
            );
        }

        if control.class_code != batch.class_code {
            let note = format!(
                "batch class {:?} differs from {:?} in the batch header at line {}",
                control.class_code,
                batch.class_code,
                batch.start + 1
            );
            self.error(line, BatchControl::CLASS_CODE, note.clone());
            failures.push(note);
        }

        if control.batch_code != batch.batch_code {
            let note = format!(
                "batch code {:?} differs from {:?} in the batch header",
                control.batch_code, batch.batch_code
            );
            self.error(line, BatchControl::BATCH_CODE, note.clone());
            failures.push(note);
        } else {
            self.check_originator(line, BatchControl::BATCH_CODE, control.batch_code);
        }
        self.check_control_number(line, control.batch_number, batch.batch_number, &mut failures);

        let ok = failures.is_empty() && !self.has_errors(batch.start, line);
        self.paint(batch.start, line, LineStatus::from_ok(ok));
        if !ok {
            let reason = if failures.is_empty() {
                "batch contains invalid records".to_owned()
            } else {
                failures.join(" | ")
            };
            self.report.line_reason[line] = Some(reason);
        }

        debug!(
            start = batch.start + 1,
            end = line + 1,
            entries = batch.entries,
            addenda = batch.addenda,
            ok,
            "batch closed"
        );
    }

    /// Mark a batch that never reached its control record.
    pub(super) fn abandon(&mut self, mut batch: OpenBatch<'a, 'p>, reason: &str) {
        self.close_entry(&mut batch);
        warn!(start = batch.start + 1, end = batch.last + 1, "{reason}");
        self.error(batch.start, Span::TAG, reason);
        self.paint(batch.start, batch.last, LineStatus::Error);
        self.report.line_reason[batch.start] = Some(reason.to_owned());
    }

    /// A 6, 7 or 8 with no open batch.
    fn stray(&mut self, line: usize, kind: RecordType) {
        let note = format!("{} outside of an open batch", kind.name());
        self.reject(line, &note);
    }

    /// Finish the pending entry: an announced addenda must have shown up.
    fn close_entry(&mut self, batch: &mut OpenBatch<'a, 'p>) {
        let Some(entry) = batch.entry.take() else {
            return;
        };
        if entry.allows_addenda && entry.addenda_seen == 0 {
            self.error(
                entry.line,
                Entry::ADDENDA_FLAG,
                "addenda indicator is 1 but no addenda record follows",
            );
        }
    }

    fn check_originator(&mut self, line: usize, span: Span, code: &str) {
        let profile = self.profile;
        let expected = profile.originator_code.as_str();
        if code != expected {
            self.error(
                line,
                span,
                format!("originator code should be {expected}, found {code:?}"),
            );
        }
    }

    /// The batch control number must repeat its header's and advance by one
    /// from the previous batch control.
    fn check_control_number(
        &mut self,
        line: usize,
        field: &str,
        header_number: &str,
        failures: &mut Vec<String>,
    ) {
        let Some(number) = parse_counter(field, 7) else {
            let note = format!("batch number must be 7 digits, found {field:?}");
            self.error(line, BatchControl::BATCH_NUMBER, note.clone());
            failures.push(note);
            return;
        };

        let mut passed = true;
        if let Some(header) = parse_counter(header_number, 7).filter(|&h| h != number) {
            let note = format!(
                "batch number {number:07} differs from {header:07} in the batch header"
            );
            self.error(line, BatchControl::BATCH_NUMBER, note.clone());
            failures.push(note);
            passed = false;
        }
        if let Some(expected) = advance(&mut self.sequences.batch_control, number) {
            let note = format!(
                "batch number out of sequence: expected {expected:07}, found {number:07}"
            );
            self.error(line, BatchControl::BATCH_NUMBER, note.clone());
            failures.push(note);
            passed = false;
        }
        if passed {
            self.ok(line, BatchControl::BATCH_NUMBER, format!("batch {number:07}"));
        }
    }

    /// Payment references must be present and distinct within one entry.
    fn check_reference(&mut self, line: usize, entry: &mut EntryContext<'a>, reference: &'a str) {
        let reference = reference.trim();
        if reference.is_empty() {
            self.error(line, PaymentAddenda::REFERENCE, "reference is required in this batch");
            return;
        }
        if let Some(&(first, _)) = entry.references.iter().find(|(_, r)| *r == reference) {
            self.error(
                line,
                PaymentAddenda::REFERENCE,
                format!(
                    "reference {reference:?} is already used at line {}",
                    first + 1
                ),
            );
            self.report.line_marks[first].retract(PaymentAddenda::REFERENCE, MarkKind::Ok);
            self.error(
                first,
                PaymentAddenda::REFERENCE,
                format!("reference {reference:?} is repeated at line {}", line + 1),
            );
        } else {
            self.ok(line, PaymentAddenda::REFERENCE, format!("reference {reference}"));
        }
        entry.references.push((line, reference));
    }
}
