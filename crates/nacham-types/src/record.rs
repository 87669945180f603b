//! Fixed-width framing of the record stream.

use std::fmt;

use crate::RECORD_LEN;

/// Record type tag carried in column 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    /// `1`: file header.
    FileHeader,
    /// `5`: batch header, opens a batch.
    BatchHeader,
    /// `6`: transaction detail.
    Entry,
    /// `7`: addenda attached to the preceding detail.
    Addenda,
    /// `8`: batch control, closes a batch.
    BatchControl,
    /// `9`: file control (trailer) or filler.
    FileControl,
}

impl RecordType {
    pub const ALL: [Self; 6] = [
        Self::FileHeader,
        Self::BatchHeader,
        Self::Entry,
        Self::Addenda,
        Self::BatchControl,
        Self::FileControl,
    ];

    #[must_use]
    pub const fn from_tag(tag: char) -> Option<Self> {
        match tag {
            '1' => Some(Self::FileHeader),
            '5' => Some(Self::BatchHeader),
            '6' => Some(Self::Entry),
            '7' => Some(Self::Addenda),
            '8' => Some(Self::BatchControl),
            '9' => Some(Self::FileControl),
            _ => None,
        }
    }

    #[must_use]
    pub const fn tag(self) -> char {
        match self {
            Self::FileHeader => '1',
            Self::BatchHeader => '5',
            Self::Entry => '6',
            Self::Addenda => '7',
            Self::BatchControl => '8',
            Self::FileControl => '9',
        }
    }

    /// Human-readable record name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FileHeader => "file header",
            Self::BatchHeader => "batch header",
            Self::Entry => "entry detail",
            Self::Addenda => "addenda",
            Self::BatchControl => "batch control",
            Self::FileControl => "file control",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.tag())
    }
}

/// Half-open column range `[start, end)` within one record, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The whole record.
    pub const FULL: Self = Self::new(0, RECORD_LEN);

    /// The type tag column.
    pub const TAG: Self = Self::new(0, 1);

    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start >= self.end
    }
}

/// One 106-character record borrowed from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    index: usize,
    text: &'a str,
    ascii: bool,
}

impl<'a> Record<'a> {
    /// 0-based position of the record in the file.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    /// First character of the record.
    #[must_use]
    pub fn tag(&self) -> char {
        self.text.chars().next().unwrap_or(' ')
    }

    #[must_use]
    pub fn kind(&self) -> Option<RecordType> {
        RecordType::from_tag(self.tag())
    }

    /// Characters in `span`. Columns count characters, not bytes.
    #[must_use]
    pub fn field(&self, span: Span) -> &'a str {
        if self.ascii {
            return &self.text[span.start..span.end];
        }
        let byte_at = |col: usize| {
            self.text
                .char_indices()
                .nth(col)
                .map_or(self.text.len(), |(offset, _)| offset)
        };
        &self.text[byte_at(span.start)..byte_at(span.end)]
    }
}

/// Result of cutting a text into records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framing<'a> {
    pub records: Vec<Record<'a>>,
    /// Length of the text in characters.
    pub char_len: usize,
    /// Characters left over after the last complete record.
    pub remainder: usize,
}

impl Framing<'_> {
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        self.remainder == 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Cut `text` into consecutive [`RECORD_LEN`]-character records.
///
/// A trailing partial record is not framed; its length is reported in
/// [`Framing::remainder`].
#[must_use]
pub fn frame(text: &str) -> Framing<'_> {
    if text.is_ascii() {
        let records = text
            .as_bytes()
            .chunks_exact(RECORD_LEN)
            .enumerate()
            .map(|(index, _)| Record {
                index,
                text: &text[index * RECORD_LEN..(index + 1) * RECORD_LEN],
                ascii: true,
            })
            .collect();
        return Framing {
            records,
            char_len: text.len(),
            remainder: text.len() % RECORD_LEN,
        };
    }

    let mut records = Vec::with_capacity(text.len() / RECORD_LEN);
    let mut start = 0;
    let mut in_record = 0;
    let mut char_len = 0;
    let mut ascii = true;
    for (offset, ch) in text.char_indices() {
        char_len += 1;
        in_record += 1;
        ascii &= ch.is_ascii();
        if in_record == RECORD_LEN {
            let end = offset + ch.len_utf8();
            records.push(Record {
                index: records.len(),
                text: &text[start..end],
                ascii,
            });
            start = end;
            in_record = 0;
            ascii = true;
        }
    }

    Framing {
        records,
        char_len,
        remainder: in_record,
    }
}
