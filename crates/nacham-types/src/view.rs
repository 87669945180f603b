//! Typed, borrowed views over each record layout.
//!
//! Every layout exposes its column ranges as associated [`Span`] constants so
//! diagnostics can point at the exact field they talk about. Views never
//! interpret values; parsing and checking live in the validator.

use crate::record::{Record, RecordType, Span};

/// Sub-code of an addenda record that uses the return layout.
pub const RETURN_ADDENDA_CODE: &str = "99";

/// `1`: file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader<'a> {
    pub priority: &'a str,
    pub destination: &'a str,
    pub origin: &'a str,
    pub signature: &'a str,
    pub creation_date: &'a str,
    pub creation_time: &'a str,
    pub file_id: &'a str,
    pub record_size: &'a str,
    pub blocking_factor: &'a str,
    pub format_code: &'a str,
    pub destination_name: &'a str,
    pub origin_name: &'a str,
    pub reference: &'a str,
}

impl<'a> FileHeader<'a> {
    pub const PRIORITY: Span = Span::new(1, 3);
    pub const DESTINATION: Span = Span::new(3, 13);
    pub const ORIGIN: Span = Span::new(13, 23);
    pub const SIGNATURE: Span = Span::new(14, 23);
    pub const CREATION_DATE: Span = Span::new(23, 31);
    pub const CREATION_TIME: Span = Span::new(31, 35);
    pub const FILE_ID: Span = Span::new(35, 36);
    pub const RECORD_SIZE: Span = Span::new(36, 39);
    pub const BLOCKING_FACTOR: Span = Span::new(39, 41);
    pub const FORMAT_CODE: Span = Span::new(41, 42);
    pub const DESTINATION_NAME: Span = Span::new(42, 65);
    pub const ORIGIN_NAME: Span = Span::new(65, 88);
    pub const REFERENCE: Span = Span::new(88, 96);

    #[must_use]
    pub fn read(record: &Record<'a>) -> Self {
        Self {
            priority: record.field(Self::PRIORITY),
            destination: record.field(Self::DESTINATION),
            origin: record.field(Self::ORIGIN),
            signature: record.field(Self::SIGNATURE),
            creation_date: record.field(Self::CREATION_DATE),
            creation_time: record.field(Self::CREATION_TIME),
            file_id: record.field(Self::FILE_ID),
            record_size: record.field(Self::RECORD_SIZE),
            blocking_factor: record.field(Self::BLOCKING_FACTOR),
            format_code: record.field(Self::FORMAT_CODE),
            destination_name: record.field(Self::DESTINATION_NAME),
            origin_name: record.field(Self::ORIGIN_NAME),
            reference: record.field(Self::REFERENCE),
        }
    }
}

/// `5`: batch header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchHeader<'a> {
    pub class_code: &'a str,
    pub originator_name: &'a str,
    pub discretionary: &'a str,
    pub originator_id: &'a str,
    pub service_type: &'a str,
    pub description: &'a str,
    pub descriptive_date: &'a str,
    pub effective_date: &'a str,
    pub julian: &'a str,
    pub originator_status: &'a str,
    pub batch_code: &'a str,
    pub batch_number: &'a str,
}

impl<'a> BatchHeader<'a> {
    pub const CLASS_CODE: Span = Span::new(1, 4);
    pub const ORIGINATOR_NAME: Span = Span::new(4, 20);
    pub const DISCRETIONARY: Span = Span::new(20, 40);
    pub const ORIGINATOR_ID: Span = Span::new(40, 50);
    pub const SERVICE_TYPE: Span = Span::new(50, 53);
    pub const DESCRIPTION: Span = Span::new(53, 63);
    pub const DESCRIPTIVE_DATE: Span = Span::new(63, 71);
    pub const EFFECTIVE_DATE: Span = Span::new(71, 79);
    pub const JULIAN: Span = Span::new(79, 82);
    pub const ORIGINATOR_STATUS: Span = Span::new(82, 83);
    pub const BATCH_ID: Span = Span::new(83, 98);
    pub const BATCH_CODE: Span = Span::new(83, 91);
    pub const BATCH_NUMBER: Span = Span::new(91, 98);

    #[must_use]
    pub fn read(record: &Record<'a>) -> Self {
        Self {
            class_code: record.field(Self::CLASS_CODE),
            originator_name: record.field(Self::ORIGINATOR_NAME),
            discretionary: record.field(Self::DISCRETIONARY),
            originator_id: record.field(Self::ORIGINATOR_ID),
            service_type: record.field(Self::SERVICE_TYPE),
            description: record.field(Self::DESCRIPTION),
            descriptive_date: record.field(Self::DESCRIPTIVE_DATE),
            effective_date: record.field(Self::EFFECTIVE_DATE),
            julian: record.field(Self::JULIAN),
            originator_status: record.field(Self::ORIGINATOR_STATUS),
            batch_code: record.field(Self::BATCH_CODE),
            batch_number: record.field(Self::BATCH_NUMBER),
        }
    }
}

/// `6`: entry detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    pub transaction_code: &'a str,
    pub receiving_participant: &'a str,
    pub check_digit: &'a str,
    pub account: &'a str,
    pub amount: &'a str,
    pub receiver_id: &'a str,
    pub receiver_name: &'a str,
    pub discretionary: &'a str,
    pub addenda_flag: &'a str,
    pub trace_code: &'a str,
    pub trace_counter: &'a str,
}

impl<'a> Entry<'a> {
    pub const TRANSACTION_CODE: Span = Span::new(1, 3);
    pub const RECEIVING_PARTICIPANT: Span = Span::new(3, 11);
    pub const CHECK_DIGIT: Span = Span::new(11, 12);
    /// Participant code and check digit together.
    pub const RECEIVING_ROUTING: Span = Span::new(3, 12);
    pub const ACCOUNT: Span = Span::new(12, 29);
    pub const AMOUNT: Span = Span::new(29, 47);
    pub const RECEIVER_ID: Span = Span::new(47, 62);
    pub const RECEIVER_NAME: Span = Span::new(62, 84);
    pub const DISCRETIONARY: Span = Span::new(84, 86);
    pub const ADDENDA_FLAG: Span = Span::new(86, 87);
    pub const TRACE: Span = Span::new(87, 102);
    pub const TRACE_CODE: Span = Span::new(87, 95);
    pub const TRACE_COUNTER: Span = Span::new(95, 102);

    #[must_use]
    pub fn read(record: &Record<'a>) -> Self {
        Self {
            transaction_code: record.field(Self::TRANSACTION_CODE),
            receiving_participant: record.field(Self::RECEIVING_PARTICIPANT),
            check_digit: record.field(Self::CHECK_DIGIT),
            account: record.field(Self::ACCOUNT),
            amount: record.field(Self::AMOUNT),
            receiver_id: record.field(Self::RECEIVER_ID),
            receiver_name: record.field(Self::RECEIVER_NAME),
            discretionary: record.field(Self::DISCRETIONARY),
            addenda_flag: record.field(Self::ADDENDA_FLAG),
            trace_code: record.field(Self::TRACE_CODE),
            trace_counter: record.field(Self::TRACE_COUNTER),
        }
    }
}

/// Addenda with sub-code other than `99`: payment-related information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentAddenda<'a> {
    pub sub_code: &'a str,
    pub originator_id: &'a str,
    pub purpose: &'a str,
    pub reference: &'a str,
    pub sequence: &'a str,
    pub entry_counter: &'a str,
}

impl<'a> PaymentAddenda<'a> {
    pub const ORIGINATOR_ID: Span = Span::new(3, 18);
    pub const PURPOSE: Span = Span::new(20, 30);
    pub const REFERENCE: Span = Span::new(31, 51);
    pub const SEQUENCE: Span = Span::new(83, 87);
    pub const ENTRY_COUNTER: Span = Span::new(87, 94);

    fn read(record: &Record<'a>, sub_code: &'a str) -> Self {
        Self {
            sub_code,
            originator_id: record.field(Self::ORIGINATOR_ID),
            purpose: record.field(Self::PURPOSE),
            reference: record.field(Self::REFERENCE),
            sequence: record.field(Self::SEQUENCE),
            entry_counter: record.field(Self::ENTRY_COUNTER),
        }
    }
}

/// Addenda with sub-code `99`: return of an earlier entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnAddenda<'a> {
    pub reason: &'a str,
    pub original_trace: &'a str,
    pub entry_counter: &'a str,
    pub date: &'a str,
    pub original_participant: &'a str,
    pub information: &'a str,
    pub addenda_trace: &'a str,
}

impl<'a> ReturnAddenda<'a> {
    pub const REASON: Span = Span::new(3, 6);
    pub const ORIGINAL_TRACE: Span = Span::new(6, 21);
    pub const ENTRY_COUNTER: Span = Span::new(14, 21);
    pub const DATE: Span = Span::new(21, 29);
    pub const ORIGINAL_PARTICIPANT: Span = Span::new(29, 37);
    pub const INFORMATION: Span = Span::new(37, 81);
    pub const ADDENDA_TRACE: Span = Span::new(81, 96);

    fn read(record: &Record<'a>) -> Self {
        Self {
            reason: record.field(Self::REASON),
            original_trace: record.field(Self::ORIGINAL_TRACE),
            entry_counter: record.field(Self::ENTRY_COUNTER),
            date: record.field(Self::DATE),
            original_participant: record.field(Self::ORIGINAL_PARTICIPANT),
            information: record.field(Self::INFORMATION),
            addenda_trace: record.field(Self::ADDENDA_TRACE),
        }
    }
}

/// `7`: addenda, in one of two layouts selected by the sub-code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addenda<'a> {
    Payment(PaymentAddenda<'a>),
    Return(ReturnAddenda<'a>),
}

impl<'a> Addenda<'a> {
    pub const SUB_CODE: Span = Span::new(1, 3);

    #[must_use]
    pub fn read(record: &Record<'a>) -> Self {
        let sub_code = record.field(Self::SUB_CODE);
        if sub_code == RETURN_ADDENDA_CODE {
            Self::Return(ReturnAddenda::read(record))
        } else {
            Self::Payment(PaymentAddenda::read(record, sub_code))
        }
    }

    #[must_use]
    pub const fn sub_code(&self) -> &'a str {
        match self {
            Self::Payment(addenda) => addenda.sub_code,
            Self::Return(_) => RETURN_ADDENDA_CODE,
        }
    }

    /// The 7-digit counter of the entry this addenda claims to belong to.
    #[must_use]
    pub const fn entry_counter(&self) -> &'a str {
        match self {
            Self::Payment(addenda) => addenda.entry_counter,
            Self::Return(addenda) => addenda.entry_counter,
        }
    }

    #[must_use]
    pub const fn entry_counter_span(&self) -> Span {
        match self {
            Self::Payment(_) => PaymentAddenda::ENTRY_COUNTER,
            Self::Return(_) => ReturnAddenda::ENTRY_COUNTER,
        }
    }
}

/// `8`: batch control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchControl<'a> {
    pub class_code: &'a str,
    pub entry_count: &'a str,
    pub control_total: &'a str,
    pub debits: &'a str,
    pub credits: &'a str,
    pub batch_code: &'a str,
    pub batch_number: &'a str,
}

impl<'a> BatchControl<'a> {
    pub const CLASS_CODE: Span = Span::new(1, 4);
    pub const ENTRY_COUNT: Span = Span::new(4, 10);
    pub const CONTROL_TOTAL: Span = Span::new(10, 20);
    pub const DEBITS: Span = Span::new(20, 38);
    pub const CREDITS: Span = Span::new(38, 56);
    pub const BATCH_ID: Span = Span::new(83, 98);
    pub const BATCH_CODE: Span = Span::new(83, 91);
    pub const BATCH_NUMBER: Span = Span::new(91, 98);

    #[must_use]
    pub fn read(record: &Record<'a>) -> Self {
        Self {
            class_code: record.field(Self::CLASS_CODE),
            entry_count: record.field(Self::ENTRY_COUNT),
            control_total: record.field(Self::CONTROL_TOTAL),
            debits: record.field(Self::DEBITS),
            credits: record.field(Self::CREDITS),
            batch_code: record.field(Self::BATCH_CODE),
            batch_number: record.field(Self::BATCH_NUMBER),
        }
    }
}

/// `9`: file control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileControl<'a> {
    pub batch_count: &'a str,
    pub block_count: &'a str,
    pub entry_count: &'a str,
    pub control_total: &'a str,
    pub debits: &'a str,
    pub credits: &'a str,
}

impl<'a> FileControl<'a> {
    pub const BATCH_COUNT: Span = Span::new(1, 7);
    pub const BLOCK_COUNT: Span = Span::new(7, 13);
    pub const ENTRY_COUNT: Span = Span::new(13, 21);
    pub const CONTROL_TOTAL: Span = Span::new(21, 31);
    pub const DEBITS: Span = Span::new(31, 49);
    pub const CREDITS: Span = Span::new(49, 67);

    #[must_use]
    pub fn read(record: &Record<'a>) -> Self {
        Self {
            batch_count: record.field(Self::BATCH_COUNT),
            block_count: record.field(Self::BLOCK_COUNT),
            entry_count: record.field(Self::ENTRY_COUNT),
            control_total: record.field(Self::CONTROL_TOTAL),
            debits: record.field(Self::DEBITS),
            credits: record.field(Self::CREDITS),
        }
    }
}

/// A record read through the layout its type tag selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordView<'a> {
    FileHeader(FileHeader<'a>),
    BatchHeader(BatchHeader<'a>),
    Entry(Entry<'a>),
    Addenda(Addenda<'a>),
    BatchControl(BatchControl<'a>),
    FileControl(FileControl<'a>),
}

impl<'a> RecordView<'a> {
    /// `None` when the type tag is not one of `1 5 6 7 8 9`.
    #[must_use]
    pub fn read(record: &Record<'a>) -> Option<Self> {
        let view = match record.kind()? {
            RecordType::FileHeader => Self::FileHeader(FileHeader::read(record)),
            RecordType::BatchHeader => Self::BatchHeader(BatchHeader::read(record)),
            RecordType::Entry => Self::Entry(Entry::read(record)),
            RecordType::Addenda => Self::Addenda(Addenda::read(record)),
            RecordType::BatchControl => Self::BatchControl(BatchControl::read(record)),
            RecordType::FileControl => Self::FileControl(FileControl::read(record)),
        };
        Some(view)
    }

    #[must_use]
    pub const fn kind(&self) -> RecordType {
        match self {
            Self::FileHeader(_) => RecordType::FileHeader,
            Self::BatchHeader(_) => RecordType::BatchHeader,
            Self::Entry(_) => RecordType::Entry,
            Self::Addenda(_) => RecordType::Addenda,
            Self::BatchControl(_) => RecordType::BatchControl,
            Self::FileControl(_) => RecordType::FileControl,
        }
    }
}
