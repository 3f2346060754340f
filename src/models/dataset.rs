//! Dataset index: annotators, documents and the document x annotator file matrix

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Column index assigned to one annotator for the lifetime of a dataset load
pub type AnnotatorSlot = usize;

/// How the dataset root was laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetLayout {
    /// All annotation files directly under the root
    Flat,
    /// One subdirectory per annotator
    Directory,
}

/// One document and the file each annotator produced for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document identity (file name minus the `_<annotator>.xml` suffix)
    pub id: String,

    /// One entry per annotator slot; `None` when that annotator has no file
    pub files: Vec<Option<PathBuf>>,
}

impl Document {
    pub fn new(id: impl Into<String>, annotator_count: usize) -> Self {
        Self {
            id: id.into(),
            files: vec![None; annotator_count],
        }
    }

    /// File of one annotator
    pub fn file(&self, slot: AnnotatorSlot) -> Option<&Path> {
        self.files.get(slot).and_then(|f| f.as_deref())
    }

    /// Slots holding a file, with their paths, in slot order
    pub fn present(&self) -> impl Iterator<Item = (AnnotatorSlot, &Path)> {
        self.files
            .iter()
            .enumerate()
            .filter_map(|(slot, f)| f.as_deref().map(|p| (slot, p)))
    }

    /// Number of annotators without a file for this document
    pub fn missing_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_none()).count()
    }
}

/// Read-only result of indexing a dataset
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationIndex {
    /// Dataset root that was indexed
    pub root: PathBuf,

    /// Detected layout
    pub layout: DatasetLayout,

    /// Annotator symbols; position is the slot
    annotators: Vec<String>,

    /// Documents in indexing order
    documents: Vec<Document>,

    /// Files seen during indexing that do not follow the naming convention
    pub skipped: Vec<PathBuf>,

    #[serde(skip)]
    document_positions: HashMap<String, usize>,
}

impl AnnotationIndex {
    /// Assemble an index; every document row must have one entry per annotator
    pub fn new(
        root: impl Into<PathBuf>,
        layout: DatasetLayout,
        annotators: Vec<String>,
        documents: Vec<Document>,
    ) -> Self {
        debug_assert!(documents.iter().all(|d| d.files.len() == annotators.len()));

        let document_positions = documents
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();

        Self {
            root: root.into(),
            layout,
            annotators,
            documents,
            skipped: Vec::new(),
            document_positions,
        }
    }

    /// Record files that were passed over during indexing
    pub fn with_skipped(mut self, skipped: Vec<PathBuf>) -> Self {
        self.skipped = skipped;
        self
    }

    /// Annotator symbols in slot order
    pub fn annotators(&self) -> &[String] {
        &self.annotators
    }

    pub fn annotator_count(&self) -> usize {
        self.annotators.len()
    }

    /// Symbol of a slot
    pub fn annotator(&self, slot: AnnotatorSlot) -> Option<&str> {
        self.annotators.get(slot).map(String::as_str)
    }

    /// Slot of a symbol
    pub fn slot_of(&self, annotator: &str) -> Option<AnnotatorSlot> {
        self.annotators.iter().position(|a| a == annotator)
    }

    /// Documents in indexing order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.position_of(id).map(|i| &self.documents[i])
    }

    /// Position of a document in indexing order
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.document_positions.get(id).copied()
    }

    /// Total number of annotation files in the matrix
    pub fn file_count(&self) -> usize {
        self.documents.iter().map(|d| d.present().count()).sum()
    }
}
