//! Cross-File Consistency Validator
//!
//! Validates that all annotation files of a dataset describe the same task:
//! - Every file declares the loaded schema / task name
//! - Every file of a document carries the same primary text
//!
//! The first present file of a document (in slot order) is the reference for
//! that document's text. Validation also records each document's text length
//! in document order, which anchors the global offset line used by
//! unitizing studies.

use crate::models::{
    IaaError, IaaResult, IssueCategory, ParsedAnnotationFile, ValidationIssue, ValidationReport,
};
use crate::services::ParseCache;

/// Outcome of a successful validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDataset {
    /// Task name every file declares
    pub task_name: String,
    /// Primary-text length per document, in document order (0 when the
    /// document has no files)
    pub document_lengths: Vec<usize>,
}

impl ValidatedDataset {
    /// Length of the concatenated offset line
    pub fn total_length(&self) -> usize {
        self.document_lengths.iter().sum()
    }
}

/// Cross-file consistency validator
pub struct ConsistencyValidator<'a> {
    cache: &'a ParseCache,
    expected_task: Option<&'a str>,
}

impl<'a> ConsistencyValidator<'a> {
    /// Create a validator; without an expected task name the first present
    /// file's task name is used
    pub fn new(cache: &'a ParseCache, expected_task: Option<&'a str>) -> Self {
        Self {
            cache,
            expected_task,
        }
    }

    /// Fail-fast validation: the first inconsistent file aborts with its path
    pub fn validate(&self) -> IaaResult<ValidatedDataset> {
        let index = self.cache.index();
        let mut expected = self.expected_task.map(str::to_string);

        // Task name check over every file first
        for document in index.documents() {
            let parses = self.cache.get_parses(&document.id)?;
            for file in parses.iter().flatten() {
                let expected = expected.get_or_insert_with(|| file.task_name.clone());
                if &file.task_name != expected {
                    return Err(IaaError::TaskNameMismatch {
                        expected: expected.clone(),
                        found: file.task_name.clone(),
                        file: file.path.clone(),
                    });
                }
            }
        }

        // Then text sharing per document
        let mut document_lengths = Vec::with_capacity(index.documents().len());
        for document in index.documents() {
            let parses = self.cache.get_parses(&document.id)?;
            let mut present = parses.iter().flatten();

            let Some(reference) = present.next() else {
                document_lengths.push(0);
                continue;
            };

            if let Some(mismatch) = present.find(|file| file.text != reference.text) {
                return Err(IaaError::TextMismatch {
                    document: document.id.clone(),
                    file: mismatch.path.clone(),
                });
            }

            document_lengths.push(reference.text_len());
        }

        Ok(ValidatedDataset {
            task_name: expected.unwrap_or_default(),
            document_lengths,
        })
    }

    /// Collect every inconsistency instead of stopping at the first one
    ///
    /// Files that fail to parse are reported as issues too.
    pub fn validate_all(&self) -> ValidationReport {
        let index = self.cache.index();
        let mut issues = Vec::new();
        let mut expected = self.expected_task.map(str::to_string);

        for document in index.documents() {
            let parses = match self.cache.get_parses(&document.id) {
                Ok(parses) => parses,
                Err(e) => {
                    let file = e
                        .file()
                        .map(|p| p.to_path_buf())
                        .unwrap_or_else(|| index.root.clone());
                    issues.push(ValidationIssue::new(
                        e.to_string(),
                        file,
                        &document.id,
                        IssueCategory::Unparseable,
                    ));
                    continue;
                }
            };

            let files: Vec<&ParsedAnnotationFile> = parses.iter().flatten().collect();

            for file in &files {
                let expected = expected.get_or_insert_with(|| file.task_name.clone());
                if &file.task_name != expected {
                    issues.push(ValidationIssue::new(
                        format!("expected task '{}', found '{}'", expected, file.task_name),
                        &file.path,
                        &document.id,
                        IssueCategory::TaskNameMismatch,
                    ));
                }
            }

            if let Some((reference, rest)) = files.split_first() {
                for file in rest.iter().filter(|f| f.text != reference.text) {
                    issues.push(ValidationIssue::new(
                        format!(
                            "primary text differs from {}",
                            reference.path.display()
                        ),
                        &file.path,
                        &document.id,
                        IssueCategory::TextMismatch,
                    ));
                }
            }
        }

        ValidationReport::new(issues)
    }
}
