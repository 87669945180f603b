//! Core type definitions for NACHAM payment files.
//!
//! A NACHAM file is a flat stream of fixed 106-character records. The first
//! character of each record is a type tag (`1`, `5`, `6`, `7`, `8`, `9`) that
//! selects the column layout of the rest of the record. This crate owns the
//! framing of that stream, the typed per-record views, and the diagnostic
//! vocabulary (marks and line status) produced by the validator.

pub mod calendar;
pub mod mark;
pub mod numeric;
pub mod record;
pub mod view;

pub use calendar::CalendarDate;
pub use mark::{LineStatus, Mark, MarkKind, MarkList};
pub use numeric::{Cents, group_thousands, parse_unsigned};
pub use record::{Framing, Record, RecordType, Span, frame};
pub use view::{
    Addenda, BatchControl, BatchHeader, Entry, FileControl, FileHeader, PaymentAddenda,
    RETURN_ADDENDA_CODE, RecordView, ReturnAddenda,
};

/// Length of every record, in characters.
pub const RECORD_LEN: usize = 106;

/// Records per block; the file trailer declares `ceil(records / 10)` blocks.
pub const BLOCKING_FACTOR: usize = 10;
