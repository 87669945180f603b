//! Builder for well-formed NACHAM files.
//!
//! Tests start from a file that validates cleanly and then damage exactly
//! the field they care about, so every declared total here is computed the
//! same way the validator recomputes it.

use nacham_types::{
    Addenda, BLOCKING_FACTOR, BatchControl, BatchHeader, CalendarDate, Entry, FileControl,
    FileHeader, PaymentAddenda, RECORD_LEN, RETURN_ADDENDA_CODE, RecordType, ReturnAddenda, Span,
};

use crate::engine::CONTROL_MODULUS;
use crate::profile::Profile;

/// One type-7 addenda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddendaSpec {
    /// Payment layout with the given sub-code and reference.
    Payment { sub_code: String, reference: String },
    /// `99` return of the owning entry, with a 3-character reason code.
    Return { reason: String },
}

impl AddendaSpec {
    #[must_use]
    pub fn payment(reference: &str) -> Self {
        Self::Payment {
            sub_code: "05".to_owned(),
            reference: reference.to_owned(),
        }
    }

    #[must_use]
    pub fn returned(reason: &str) -> Self {
        Self::Return {
            reason: reason.to_owned(),
        }
    }
}

/// One type-6 entry detail and its addenda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySpec {
    pub transaction_code: String,
    /// Eight-digit receiving participant code.
    pub participant: String,
    pub check_digit: char,
    /// Amount in cents.
    pub amount: u128,
    pub receiver_name: String,
    pub addenda: Vec<AddendaSpec>,
}

impl EntrySpec {
    /// Checking-account credit (code 32).
    #[must_use]
    pub fn credit(amount: u128) -> Self {
        Self::with_code("32", amount)
    }

    /// Checking-account debit (code 27).
    #[must_use]
    pub fn debit(amount: u128) -> Self {
        Self::with_code("27", amount)
    }

    #[must_use]
    pub fn with_code(code: &str, amount: u128) -> Self {
        Self {
            transaction_code: code.to_owned(),
            participant: "00000101".to_owned(),
            check_digit: '7',
            amount,
            receiver_name: "JUAN PEREZ".to_owned(),
            addenda: Vec::new(),
        }
    }

    #[must_use]
    pub fn addenda(mut self, reference: &str) -> Self {
        self.addenda.push(AddendaSpec::payment(reference));
        self
    }

    /// Append a `99` return addenda.
    #[must_use]
    pub fn returned(mut self, reason: &str) -> Self {
        self.addenda.push(AddendaSpec::returned(reason));
        self
    }
}

/// One type-5 … type-8 batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSpec {
    pub service_type: String,
    pub class_code: String,
    pub description: String,
    /// `YYYYMMDD`; the julian field is derived from it when it is valid.
    pub effective_date: String,
    pub entries: Vec<EntrySpec>,
}

impl BatchSpec {
    #[must_use]
    pub fn new(service_type: &str, class_code: &str, description: &str) -> Self {
        Self {
            service_type: service_type.to_owned(),
            class_code: class_code.to_owned(),
            description: description.to_owned(),
            effective_date: "20240116".to_owned(),
            entries: Vec::new(),
        }
    }

    /// Payroll credits (`PPD` / `220` / `NOMINA`).
    #[must_use]
    pub fn payroll() -> Self {
        Self::new("PPD", "220", "NOMINA")
    }

    /// Collection debits (`PPD` / `225` / `RECAUDO`).
    #[must_use]
    pub fn collection() -> Self {
        Self::new("PPD", "225", "RECAUDO")
    }

    /// Reversals, the only batches accepting `99` addenda (`PPD` / `200` / `REVERSION`).
    #[must_use]
    pub fn reversal() -> Self {
        Self::new("PPD", "200", "REVERSION")
    }

    /// Supplier payments with unique references (`CCD` / `220` / `PROVEEDOR`).
    #[must_use]
    pub fn suppliers() -> Self {
        Self::new("CCD", "220", "PROVEEDOR")
    }

    #[must_use]
    pub fn entry(mut self, entry: EntrySpec) -> Self {
        self.entries.push(entry);
        self
    }
}

/// Whole-file builder.
#[derive(Debug, Clone)]
pub struct FileBuilder {
    profile: Profile,
    file_id: char,
    first_batch_number: u64,
    first_entry_counter: u64,
    batches: Vec<BatchSpec>,
    fillers: usize,
}

impl Default for FileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FileBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            profile: Profile::default(),
            file_id: 'A',
            first_batch_number: 1,
            first_entry_counter: 1,
            batches: Vec::new(),
            fillers: 0,
        }
    }

    /// Header, one payroll batch with a single credit entry, trailer.
    #[must_use]
    pub fn minimal() -> Self {
        Self::new().batch(BatchSpec::payroll().entry(EntrySpec::credit(150_000)))
    }

    #[must_use]
    pub fn batch(mut self, batch: BatchSpec) -> Self {
        self.batches.push(batch);
        self
    }

    #[must_use]
    pub const fn file_id(mut self, file_id: char) -> Self {
        self.file_id = file_id;
        self
    }

    #[must_use]
    pub const fn first_batch_number(mut self, number: u64) -> Self {
        self.first_batch_number = number;
        self
    }

    #[must_use]
    pub const fn first_entry_counter(mut self, counter: u64) -> Self {
        self.first_entry_counter = counter;
        self
    }

    /// Append `count` all-`9` filler records after the trailer.
    #[must_use]
    pub const fn fillers(mut self, count: usize) -> Self {
        self.fillers = count;
        self
    }

    /// The records, in order, without separators.
    #[must_use]
    pub fn build(&self) -> Vec<String> {
        let mut records = vec![self.file_header()];
        let mut batch_number = self.first_batch_number;
        let mut counter = self.first_entry_counter;
        let mut totals = Totals::default();

        for batch in &self.batches {
            records.push(self.batch_header(batch, batch_number));
            let mut sums = Totals::default();
            let mut has_debits = false;

            for entry in &batch.entries {
                records.push(self.entry(entry, counter));
                sums.entries += 1;
                sums.control =
                    (sums.control + entry.participant.parse::<u128>().unwrap_or(0)) % CONTROL_MODULUS;
                if self.profile.is_debit(&entry.transaction_code) {
                    has_debits = true;
                    sums.debits += entry.amount;
                } else {
                    sums.credits += entry.amount;
                }
                for (sequence, addenda) in (1..).zip(&entry.addenda) {
                    records.push(self.addenda(addenda, sequence, counter));
                    sums.entries += 1;
                }
                counter += 1;
            }
            if has_debits {
                sums.credits = 0;
            }

            records.push(self.batch_control(batch, batch_number, &sums));
            totals.entries += sums.entries;
            totals.control = (totals.control + sums.control) % CONTROL_MODULUS;
            totals.debits += sums.debits;
            totals.credits += sums.credits;
            batch_number += 1;
        }

        let record_count = records.len() + 1 + self.fillers;
        records.push(file_control(
            self.batches.len(),
            record_count.div_ceil(BLOCKING_FACTOR),
            &totals,
        ));
        records.extend(std::iter::repeat_n("9".repeat(RECORD_LEN), self.fillers));
        records
    }

    fn file_header(&self) -> String {
        let mut line = Line::new(RecordType::FileHeader);
        line.digits(FileHeader::PRIORITY, 1);
        line.text(FileHeader::DESTINATION, "0000000017");
        line.text(FileHeader::ORIGIN, &format!("0{}", self.profile.signature));
        line.text(FileHeader::CREATION_DATE, "20240115");
        line.text(FileHeader::CREATION_TIME, "1200");
        line.text(FileHeader::FILE_ID, &self.file_id.to_string());
        line.text(FileHeader::RECORD_SIZE, "106");
        line.text(FileHeader::BLOCKING_FACTOR, "10");
        line.text(FileHeader::FORMAT_CODE, "1");
        line.text(FileHeader::DESTINATION_NAME, "BANCO DE LA REPUBLICA");
        line.text(FileHeader::ORIGIN_NAME, "BANCO EJEMPLO");
        line.digits(FileHeader::REFERENCE, 1);
        line.finish()
    }

    fn batch_header(&self, batch: &BatchSpec, number: u64) -> String {
        let julian = CalendarDate::parse_yyyymmdd(&batch.effective_date)
            .map_or_else(|| "000".to_owned(), CalendarDate::julian);
        let mut line = Line::new(RecordType::BatchHeader);
        line.text(BatchHeader::CLASS_CODE, &batch.class_code);
        line.text(BatchHeader::ORIGINATOR_NAME, "EMPRESA EJEMPLO");
        line.text(BatchHeader::ORIGINATOR_ID, "8999990902");
        line.text(BatchHeader::SERVICE_TYPE, &batch.service_type);
        line.text(BatchHeader::DESCRIPTION, &batch.description);
        line.text(BatchHeader::DESCRIPTIVE_DATE, &batch.effective_date);
        line.text(BatchHeader::EFFECTIVE_DATE, &batch.effective_date);
        line.text(BatchHeader::JULIAN, &julian);
        line.text(BatchHeader::ORIGINATOR_STATUS, "1");
        line.text(BatchHeader::BATCH_CODE, &self.profile.originator_code);
        line.digits(BatchHeader::BATCH_NUMBER, u128::from(number));
        line.finish()
    }

    fn entry(&self, entry: &EntrySpec, counter: u64) -> String {
        let mut line = Line::new(RecordType::Entry);
        line.text(Entry::TRANSACTION_CODE, &entry.transaction_code);
        line.text(Entry::RECEIVING_PARTICIPANT, &entry.participant);
        line.text(Entry::CHECK_DIGIT, &entry.check_digit.to_string());
        line.text(Entry::ACCOUNT, "12345678901");
        line.digits(Entry::AMOUNT, entry.amount);
        line.text(Entry::RECEIVER_ID, "000001012345678");
        line.text(Entry::RECEIVER_NAME, &entry.receiver_name);
        line.text(
            Entry::ADDENDA_FLAG,
            if entry.addenda.is_empty() { "0" } else { "1" },
        );
        line.text(Entry::TRACE_CODE, &self.profile.originator_code);
        line.digits(Entry::TRACE_COUNTER, u128::from(counter));
        line.finish()
    }

    fn addenda(&self, addenda: &AddendaSpec, sequence: u128, counter: u64) -> String {
        let mut line = Line::new(RecordType::Addenda);
        match addenda {
            AddendaSpec::Payment {
                sub_code,
                reference,
            } => {
                line.text(Addenda::SUB_CODE, sub_code);
                line.text(PaymentAddenda::ORIGINATOR_ID, "000008999990902");
                line.text(PaymentAddenda::PURPOSE, "PAGO");
                line.text(PaymentAddenda::REFERENCE, reference);
                line.digits(PaymentAddenda::SEQUENCE, sequence);
                line.digits(PaymentAddenda::ENTRY_COUNTER, u128::from(counter));
            }
            AddendaSpec::Return { reason } => {
                line.text(Addenda::SUB_CODE, RETURN_ADDENDA_CODE);
                line.text(ReturnAddenda::REASON, reason);
                // Original trace: originator code, then the entry counter.
                line.text(ReturnAddenda::ORIGINAL_TRACE, &self.profile.originator_code);
                line.digits(ReturnAddenda::ENTRY_COUNTER, u128::from(counter));
                line.text(ReturnAddenda::DATE, "20240110");
                line.text(ReturnAddenda::ORIGINAL_PARTICIPANT, "00000101");
                line.text(ReturnAddenda::INFORMATION, "CUENTA CERRADA");
                line.text(ReturnAddenda::ADDENDA_TRACE, &self.profile.originator_code);
            }
        }
        line.finish()
    }

    fn batch_control(&self, batch: &BatchSpec, number: u64, sums: &Totals) -> String {
        let mut line = Line::new(RecordType::BatchControl);
        line.text(BatchControl::CLASS_CODE, &batch.class_code);
        line.digits(BatchControl::ENTRY_COUNT, sums.entries);
        line.digits(BatchControl::CONTROL_TOTAL, sums.control);
        line.digits(BatchControl::DEBITS, sums.debits);
        line.digits(BatchControl::CREDITS, sums.credits);
        line.text(BatchControl::BATCH_CODE, &self.profile.originator_code);
        line.digits(BatchControl::BATCH_NUMBER, u128::from(number));
        line.finish()
    }
}

#[derive(Debug, Default)]
struct Totals {
    entries: u128,
    control: u128,
    debits: u128,
    credits: u128,
}

fn file_control(batches: usize, blocks: usize, totals: &Totals) -> String {
    let mut line = Line::new(RecordType::FileControl);
    line.digits(FileControl::BATCH_COUNT, batches as u128);
    line.digits(FileControl::BLOCK_COUNT, blocks as u128);
    line.digits(FileControl::ENTRY_COUNT, totals.entries);
    line.digits(FileControl::CONTROL_TOTAL, totals.control);
    line.digits(FileControl::DEBITS, totals.debits);
    line.digits(FileControl::CREDITS, totals.credits);
    line.finish()
}

/// A blank record being filled field by field.
struct Line(Vec<u8>);

impl Line {
    fn new(kind: RecordType) -> Self {
        let mut bytes = vec![b' '; RECORD_LEN];
        bytes[0] = kind.tag() as u8;
        Self(bytes)
    }

    /// Left-aligned, space-padded text.
    fn text(&mut self, span: Span, value: &str) {
        assert!(
            value.len() <= span.len() && value.is_ascii(),
            "{value:?} does not fit {span:?}"
        );
        self.0[span.start..span.start + value.len()].copy_from_slice(value.as_bytes());
    }

    /// Right-aligned, zero-padded number.
    fn digits(&mut self, span: Span, value: u128) {
        let width = span.len();
        let text = format!("{value:0width$}");
        assert_eq!(text.len(), width, "{value} does not fit {span:?}");
        self.text(span, &text);
    }

    fn finish(self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

/// Concatenate records into the compacted stream the validator reads.
#[must_use]
pub fn render(records: &[String]) -> String {
    records.concat()
}

/// Records separated by CRLF, as they usually arrive on disk.
#[must_use]
pub fn render_lines(records: &[String]) -> String {
    let mut text = records.join("\r\n");
    text.push_str("\r\n");
    text
}

/// Replace the columns of `span` in an ASCII record with `value`.
///
/// # Panics
///
/// When `value` is not exactly as wide as `span`.
pub fn overwrite(record: &mut String, span: Span, value: &str) {
    assert_eq!(value.chars().count(), span.len(), "{value:?} does not fit {span:?}");
    record.replace_range(span.start..span.end, value);
}

/// [`overwrite`] with a zero-padded number.
pub fn overwrite_digits(record: &mut String, span: Span, value: u128) {
    let width = span.len();
    overwrite(record, span, &format!("{value:0width$}"));
}
