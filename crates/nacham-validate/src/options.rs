//! Per-request validation switches.

use nacham_error::{NachamError, Result};
use serde::{Deserialize, Serialize};

/// Cyclic alphabet for the file identifier derived from the serial number.
const FILE_ID_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Switches accepted with every validation request.
///
/// Each reconciliation toggle removes its check entirely: a disabled check
/// emits no mark and cannot fail a batch or the trailer. The Spanish keys
/// sent by the viewer are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationOptions {
    /// Reconcile declared entry/addenda counts.
    pub check_trans_count: bool,
    /// Reconcile declared debit totals.
    #[serde(alias = "checkDebitos")]
    pub check_debits: bool,
    /// Reconcile declared credit totals.
    #[serde(alias = "checkCreditos")]
    pub check_credits: bool,
    /// Reconcile declared control (participant hash) totals.
    #[serde(alias = "checkTotalesControl")]
    pub check_control_totals: bool,
    /// Count addenda records together with entries.
    #[serde(alias = "includeAdendasInTrans")]
    pub include_addenda_in_trans: bool,
    /// Serial number taken from the file name; empty disables the
    /// file-identifier check.
    pub serial_from_name: String,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            check_trans_count: true,
            check_debits: true,
            check_credits: true,
            check_control_totals: true,
            include_addenda_in_trans: true,
            serial_from_name: String::new(),
        }
    }
}

impl ValidationOptions {
    /// Parse the JSON options payload sent by the viewer.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| NachamError::config(e.to_string()))
    }

    #[must_use]
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_from_name = serial.into();
        self
    }

    /// File identifier (header column 36) expected for the configured serial.
    ///
    /// Serial `n` maps to symbol `(n - 1) mod 36` of `A–Z0–9`; `None` when the
    /// serial is blank, not a number, or zero.
    #[must_use]
    pub fn expected_file_id(&self) -> Option<char> {
        let serial: u64 = self.serial_from_name.trim().parse().ok()?;
        let index = serial.checked_sub(1)? % FILE_ID_ALPHABET.len() as u64;
        Some(char::from(FILE_ID_ALPHABET[index as usize]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_every_check() {
        let options = ValidationOptions::default();
        assert!(options.check_trans_count);
        assert!(options.check_debits);
        assert!(options.check_credits);
        assert!(options.check_control_totals);
        assert!(options.include_addenda_in_trans);
        assert!(options.serial_from_name.is_empty());
    }

    #[test]
    fn file_id_cycles_through_alphabet() {
        let id = |serial: &str| ValidationOptions::default().with_serial(serial).expected_file_id();
        assert_eq!(id("1"), Some('A'));
        assert_eq!(id("007"), Some('G'));
        assert_eq!(id("26"), Some('Z'));
        assert_eq!(id("27"), Some('0'));
        assert_eq!(id("36"), Some('9'));
        assert_eq!(id("37"), Some('A'));
        assert_eq!(id("0"), None);
        assert_eq!(id(""), None);
        assert_eq!(id("abc"), None);
    }

    #[test]
    fn accepts_viewer_payload() {
        let options = ValidationOptions::from_json_str(
            r#"{"checkDebitos": false, "includeAdendasInTrans": false, "serialFromName": "12"}"#,
        )
        .unwrap();
        assert!(!options.check_debits);
        assert!(!options.include_addenda_in_trans);
        assert!(options.check_credits);
        assert_eq!(options.expected_file_id(), Some('L'));

        let english = ValidationOptions::from_json_str(r#"{"checkControlTotals": false}"#).unwrap();
        assert!(!english.check_control_totals);

        assert!(ValidationOptions::from_json_str("[1, 2]").is_err());
    }
}
