//! Validation results across many securities.

use crate::validate::ValidationStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validation result for one security.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckEntry {
    /// Six digit security code.
    pub code: String,

    /// Display name.
    pub name: String,

    /// Validator outcome.
    pub status: ValidationStatus,
}

/// Collected validator outcomes, printable as a table or Markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    /// Report heading, usually the industry or "all".
    pub title: String,

    /// One entry per checked security, in insertion order.
    pub entries: Vec<CheckEntry>,
}

impl CheckReport {
    /// Create an empty report.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    /// Record the outcome for one security.
    pub fn push(&mut self, code: impl Into<String>, name: impl Into<String>, status: ValidationStatus) {
        self.entries.push(CheckEntry {
            code: code.into(),
            name: name.into(),
            status,
        });
    }

    /// Number of securities checked.
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Number of securities whose record passed.
    pub fn passed(&self) -> usize {
        self.entries.iter().filter(|e| e.status.is_ok()).count()
    }

    /// Entries that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &CheckEntry> {
        self.entries.iter().filter(|e| !e.status.is_ok())
    }

    /// Whether every checked record passed.
    pub fn all_passed(&self) -> bool {
        self.passed() == self.total()
    }

    /// Render as a fixed-width text table listing the failures.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nRecord Check: {}\n", self.title));
        output.push_str(&"=".repeat(60));
        output.push('\n');
        output.push_str(&format!("  Checked: {}\n", self.total()));
        output.push_str(&format!("  Passed:  {}\n", self.passed()));
        output.push_str(&format!("  Failed:  {}\n", self.total() - self.passed()));

        if !self.all_passed() {
            output.push('\n');
            output.push_str(&format!("{:<8} {:<20} {:<24} {:>5}\n", "Code", "Name", "Status", "Row"));
            output.push_str(&"-".repeat(60));
            output.push('\n');
            for entry in self.failures() {
                let row = entry.status.row().map(|r| r.to_string()).unwrap_or_default();
                output.push_str(&format!(
                    "{:<8} {:<20} {:<24} {:>5}\n",
                    entry.code,
                    entry.name,
                    entry.status.token(),
                    row
                ));
            }
        }

        output.push_str(&"=".repeat(60));
        output.push('\n');
        output
    }

    /// Render as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Record Check: {}\n\n", self.title));
        output.push_str(&format!(
            "**Passed:** {} of {}\n\n",
            self.passed(),
            self.total()
        ));

        if !self.all_passed() {
            output.push_str("## Failures\n\n");
            output.push_str("| Code | Name | Status | Row |\n");
            output.push_str("|------|------|--------|-----|\n");
            for entry in self.failures() {
                let row = entry.status.row().map(|r| r.to_string()).unwrap_or_default();
                output.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    entry.code,
                    entry.name,
                    entry.status.token(),
                    row
                ));
            }
        }

        output
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::RecordField;

    fn report() -> CheckReport {
        let mut report = CheckReport::new("Banking");
        report.push("000001", "Ping An Bank", ValidationStatus::Ok);
        report.push("600036", "China Merchants Bank", ValidationStatus::Empty(RecordField::Pe));
        report.push("601398", "ICBC", ValidationStatus::CodeFormatError { row: 12 });
        report
    }

    #[test]
    fn test_counts() {
        let r = report();
        assert_eq!(r.total(), 3);
        assert_eq!(r.passed(), 1);
        assert!(!r.all_passed());
        let failed: Vec<&str> = r.failures().map(|e| e.code.as_str()).collect();
        assert_eq!(failed, vec!["600036", "601398"]);
    }

    #[test]
    fn test_ascii_table() {
        let table = report().to_ascii_table();
        assert!(table.contains("Record Check: Banking"));
        assert!(table.contains("pe-empty"));
        assert!(table.contains("code-format-error"));
        assert!(table.contains("12"));
        assert!(!table.contains("Ping An Bank"));
    }

    #[test]
    fn test_markdown() {
        let md = report().to_markdown();
        assert!(md.contains("# Record Check: Banking"));
        assert!(md.contains("**Passed:** 1 of 3"));
        assert!(md.contains("| 601398 | ICBC | code-format-error | 12 |"));
    }

    #[test]
    fn test_clean_report_has_no_failure_table() {
        let mut r = CheckReport::new("all");
        r.push("000001", "Ping An Bank", ValidationStatus::Ok);
        assert!(r.all_passed());
        assert!(!r.to_markdown().contains("## Failures"));
        assert_eq!(r.to_string(), r.to_ascii_table());
    }
}
