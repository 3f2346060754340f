use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Category of a dataset consistency problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueCategory {
    /// File declares a different schema / task name
    TaskNameMismatch,
    /// File carries a different primary text than its siblings
    TextMismatch,
    /// File could not be parsed
    Unparseable,
}

impl IssueCategory {
    /// Get display name for category
    pub fn name(&self) -> &'static str {
        match self {
            IssueCategory::TaskNameMismatch => "Task Name Mismatch",
            IssueCategory::TextMismatch => "Text Mismatch",
            IssueCategory::Unparseable => "Unparseable",
        }
    }
}

/// A consistency problem found in one annotation file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Message describing what's wrong
    pub message: String,
    /// Offending file
    pub file: PathBuf,
    /// Document the file belongs to
    pub document: String,
    pub category: IssueCategory,
}

impl ValidationIssue {
    pub fn new(
        message: impl Into<String>,
        file: impl Into<PathBuf>,
        document: impl Into<String>,
        category: IssueCategory,
    ) -> Self {
        Self {
            message: message.into(),
            file: file.into(),
            document: document.into(),
            category,
        }
    }

    /// Format issue for display
    pub fn format(&self) -> String {
        format!(
            "[{}] {} ({}) - {}",
            self.category.name(),
            self.file.display(),
            self.document,
            self.message
        )
    }
}

/// Every consistency problem found in a dataset
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// True when no file is inconsistent
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Count issues by category
    pub fn count_by_category(&self, category: IssueCategory) -> usize {
        self.issues.iter().filter(|i| i.category == category).count()
    }

    /// Format all issues for display
    pub fn format_issues(&self) -> String {
        self.issues
            .iter()
            .map(|i| i.format())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_and_formats() {
        let report = ValidationReport::new(vec![
            ValidationIssue::new(
                "expected 'A', found 'B'",
                "doc1_X.xml",
                "doc1",
                IssueCategory::TaskNameMismatch,
            ),
            ValidationIssue::new("text differs", "doc2_Y.xml", "doc2", IssueCategory::TextMismatch),
        ]);

        assert!(!report.is_valid());
        assert_eq!(report.count_by_category(IssueCategory::TextMismatch), 1);
        let text = report.format_issues();
        assert!(text.contains("[Task Name Mismatch] doc1_X.xml (doc1)"));
        assert!(text.contains("doc2_Y.xml"));
    }

    #[test]
    fn test_empty_report_is_valid() {
        assert!(ValidationReport::default().is_valid());
    }
}
