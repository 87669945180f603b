//! Institution profile: the file signature, fixed participant code and the
//! business code tables the validator enforces.
//!
//! The built-in [`Profile::default`] carries the production values. A TOML
//! document can replace any subset of them:
//!
//! ```toml
//! originator_code = "00016832"
//! debit_codes = ["27", "37"]
//!
//! [[batch_rules]]
//! service_type = "PPD"
//! class_code = "220"
//! description_prefix = "NOMINA"
//! allowed_codes = ["22", "32"]
//! ```

use std::path::Path;

use nacham_error::{NachamError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Restriction attached to batches whose header matches
/// `service_type` + `class_code` + description prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRule {
    pub service_type: String,
    pub class_code: String,
    /// Empty matches every description.
    #[serde(default)]
    pub description_prefix: String,
    /// Transaction codes permitted on the batch's entry records.
    pub allowed_codes: Vec<String>,
    /// Payment addenda of one entry must carry distinct, non-blank references.
    #[serde(default)]
    pub unique_references: bool,
    /// Addenda sub-codes permitted in the batch; the profile default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addenda_codes: Option<Vec<String>>,
}

impl BatchRule {
    fn new(service_type: &str, class_code: &str, description_prefix: &str, codes: &[&str]) -> Self {
        Self {
            service_type: service_type.to_owned(),
            class_code: class_code.to_owned(),
            description_prefix: description_prefix.to_owned(),
            allowed_codes: codes.iter().map(|&c| c.to_owned()).collect(),
            unique_references: false,
            addenda_codes: None,
        }
    }

    fn with_unique_references(mut self) -> Self {
        self.unique_references = true;
        self
    }

    fn with_addenda_codes(mut self, codes: &[&str]) -> Self {
        self.addenda_codes = Some(codes.iter().map(|&c| c.to_owned()).collect());
        self
    }

    /// Whether a batch header with these (untrimmed) fields falls under the rule.
    #[must_use]
    pub fn matches(&self, service_type: &str, class_code: &str, description: &str) -> bool {
        service_type.trim() == self.service_type
            && class_code.trim() == self.class_code
            && description.trim().starts_with(self.description_prefix.as_str())
    }

    #[must_use]
    pub fn allows(&self, transaction_code: &str) -> bool {
        self.allowed_codes.iter().any(|c| c == transaction_code)
    }
}

/// Institution-specific constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Expected content of header columns 15–23.
    pub signature: String,
    /// Header columns 14–23 containing this marks a return file.
    pub return_marker: String,
    /// 8-character code leading every batch identifier and entry trace number.
    pub originator_code: String,
    /// Accepted batch class codes (header and control columns 2–4).
    pub batch_classes: Vec<String>,
    /// Transaction codes that add to the debit total; all others are credits.
    pub debit_codes: Vec<String>,
    /// Addenda sub-codes accepted when no rule overrides them.
    pub addenda_codes: Vec<String>,
    /// Evaluated in order; first match wins.
    pub batch_rules: Vec<BatchRule>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            signature: "000016832".to_owned(),
            return_marker: "DEVOL".to_owned(),
            originator_code: "00016832".to_owned(),
            batch_classes: vec!["200".to_owned(), "220".to_owned(), "225".to_owned()],
            debit_codes: ["27", "28", "37", "38"].map(str::to_owned).to_vec(),
            addenda_codes: vec!["05".to_owned()],
            batch_rules: vec![
                BatchRule::new("PPD", "220", "NOMINA", &["22", "23", "32", "33"]),
                BatchRule::new("PPD", "225", "RECAUDO", &["27", "28", "37", "38"]),
                BatchRule::new("CCD", "220", "PROVEEDOR", &["22", "23", "32", "33"])
                    .with_unique_references(),
                BatchRule::new("CTX", "220", "", &["22", "32"]).with_unique_references(),
                BatchRule::new("CCD", "225", "", &["27", "37"]),
                BatchRule::new("PPD", "200", "REVERSION", &["21", "26", "31", "36"])
                    .with_addenda_codes(&["05", "99"]),
            ],
        }
    }
}

impl Profile {
    /// Parse a TOML profile; absent keys keep their built-in values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let profile: Self = toml::from_str(text).map_err(|e| NachamError::config(e.to_string()))?;
        profile.check()?;
        Ok(profile)
    }

    /// Load a TOML profile from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let profile = Self::from_toml_str(&text)?;
        debug!(
            path = %path.display(),
            rules = profile.batch_rules.len(),
            "loaded validation profile"
        );
        Ok(profile)
    }

    fn check(&self) -> Result<()> {
        if self.signature.is_empty() {
            return Err(NachamError::config("`signature` must not be empty"));
        }
        if self.originator_code.chars().count() != 8 {
            return Err(NachamError::config(format!(
                "`originator_code` must be 8 characters, got {:?}",
                self.originator_code
            )));
        }
        for (i, rule) in self.batch_rules.iter().enumerate() {
            if rule.allowed_codes.is_empty() {
                return Err(NachamError::config(format!(
                    "batch rule #{} ({} {}) allows no transaction codes",
                    i + 1,
                    rule.service_type,
                    rule.class_code
                )));
            }
        }
        Ok(())
    }

    /// First rule matching a batch header, if any.
    #[must_use]
    pub fn rule_for(
        &self,
        service_type: &str,
        class_code: &str,
        description: &str,
    ) -> Option<&BatchRule> {
        self.batch_rules
            .iter()
            .find(|rule| rule.matches(service_type, class_code, description))
    }

    #[must_use]
    pub fn is_debit(&self, transaction_code: &str) -> bool {
        self.debit_codes.iter().any(|c| c == transaction_code)
    }

    #[must_use]
    pub fn is_batch_class(&self, class_code: &str) -> bool {
        self.batch_classes.iter().any(|c| c == class_code)
    }
}
