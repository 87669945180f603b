//! File-level handlers: the header (1) and the trailer (9).

use nacham_types::{
    BLOCKING_FACTOR, CalendarDate, FileControl, FileHeader, LineStatus, Mark, RecordType, Span,
    parse_unsigned,
};
use tracing::{debug, warn};

use super::{Render, Scan};

/// Global error raised when the scan never meets a file control record.
const MISSING_TRAILER: &str = "file control record (type 9) not found";

impl<'a> Scan<'a, '_> {
    pub(super) fn file_header(&mut self, line: usize, header: &FileHeader<'a>) {
        if line != 0 {
            self.reject(
                line,
                &format!("{} must be the first record", RecordType::FileHeader.name()),
            );
            return;
        }

        match CalendarDate::parse_yyyymmdd(header.creation_date) {
            Some(date) => self.ok(line, FileHeader::CREATION_DATE, format!("created {date}")),
            None => self.error(
                line,
                FileHeader::CREATION_DATE,
                format!(
                    "invalid creation date (YYYYMMDD = {:?})",
                    header.creation_date
                ),
            ),
        }
        if !nacham_types::calendar::is_valid_hhmm(header.creation_time) {
            self.error(
                line,
                FileHeader::CREATION_TIME,
                format!("invalid creation time (HHMM = {:?})", header.creation_time),
            );
        }
        if header.record_size != "106" {
            self.error(
                line,
                FileHeader::RECORD_SIZE,
                format!("record size must be 106, found {:?}", header.record_size),
            );
        }
        if header.blocking_factor != "10" {
            self.error(
                line,
                FileHeader::BLOCKING_FACTOR,
                format!("blocking factor must be 10, found {:?}", header.blocking_factor),
            );
        }

        let options = self.options;
        if let Some(expected) = options.expected_file_id() {
            let serial = options.serial_from_name.trim();
            self.check(
                line,
                FileHeader::FILE_ID,
                header.file_id.chars().eq([expected]),
                format!("file identifier {expected} matches serial {serial}"),
                format!(
                    "file identifier should be {expected} for serial {serial}, found {:?}",
                    header.file_id
                ),
            );
        }

        let ok = !self.report.line_marks[line].has_errors();
        self.set_status(line, LineStatus::from_ok(ok));
        debug!(ok, "file header checked");
    }

    /// The first type 9 is the trailer; later ones are block filler.
    pub(super) fn file_control(&mut self, line: usize, control: FileControl<'a>) {
        if self.trailer.is_some() {
            self.mark(line, Mark::info(Span::FULL, "filler record"));
            return;
        }
        self.trailer = Some((line, control));
        self.report.trailer_index = Some(line);
    }

    pub(super) fn reconcile_trailer(&mut self) {
        let Some((line, control)) = self.trailer else {
            warn!(records = self.records.len(), "{MISSING_TRAILER}");
            self.report.global_errors.push(MISSING_TRAILER.to_owned());
            return;
        };
        let options = self.options;
        let totals = &self.totals;
        let batches = u128::from(totals.batches);
        let blocks = self.records.len().div_ceil(BLOCKING_FACTOR) as u128;
        let mut entries = totals.entries;
        if options.include_addenda_in_trans {
            entries += totals.addenda;
        }
        let entries = u128::from(entries);
        let (control_total, debits, credits) = (totals.control, totals.debits.0, totals.credits.0);

        let mut failures = Vec::new();
        self.reconcile(
            line,
            FileControl::BATCH_COUNT,
            "batch count",
            parse_unsigned(control.batch_count),
            batches,
            Render::Count,
            &mut failures,
        );
        self.reconcile(
            line,
            FileControl::BLOCK_COUNT,
            "block count",
            parse_unsigned(control.block_count),
            blocks,
            Render::Count,
            &mut failures,
        );
        if options.check_trans_count {
            self.reconcile(
                line,
                FileControl::ENTRY_COUNT,
                "entry count",
                parse_unsigned(control.entry_count),
                entries,
                Render::Count,
                &mut failures,
            );
        }
        if options.check_control_totals {
            self.reconcile(
                line,
                FileControl::CONTROL_TOTAL,
                "control total",
                parse_unsigned(control.control_total),
                control_total,
                Render::Hash,
                &mut failures,
            );
        }
        if options.check_debits {
            self.reconcile(
                line,
                FileControl::DEBITS,
                "debit total",
                parse_unsigned(control.debits),
                debits,
                Render::Money,
                &mut failures,
            );
        }
        if options.check_credits {
            self.reconcile(
                line,
                FileControl::CREDITS,
                "credit total",
                parse_unsigned(control.credits),
                credits,
                Render::Money,
                &mut failures,
            );
        }

        self.settle(line, &failures);
        debug!(line = line + 1, failures = failures.len(), "trailer reconciled");
    }
}
