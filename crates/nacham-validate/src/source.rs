//! Turning file bytes into the flat record stream.

use std::path::Path;

use nacham_error::Result;

const BOM: char = '\u{feff}';

/// Decode `bytes` as UTF-8 and compact it with [`compact_text`].
pub fn decode_source(bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes)?;
    Ok(compact_text(text))
}

/// Strip a leading byte-order mark and every `\n` / `\r\n` line break.
///
/// A lone `\r` is kept, so it shows up as a framing problem instead of being
/// silently absorbed.
#[must_use]
pub fn compact_text(text: &str) -> String {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut out = String::with_capacity(text.len());
    for line in text.split('\n') {
        out.push_str(line.strip_suffix('\r').unwrap_or(line));
    }
    out
}

/// Serial number embedded in a file name: the trailing run of digits of the
/// file stem (`NACHAM_20240115_007.txt` → `"007"`).
#[must_use]
pub fn serial_from_file_name(name: &str) -> Option<String> {
    let stem = Path::new(name).file_stem()?.to_str()?;
    let digits = stem
        .bytes()
        .rev()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    Some(stem[stem.len() - digits..].to_owned())
}
