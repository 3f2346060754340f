//! Annotation set indexer - discovers annotation files and builds the
//! document x annotator file matrix
//!
//! File names follow `<documentId>_<annotatorSymbol>.xml` (extension is
//! case-insensitive). Two layouts are supported:
//!
//! - **Flat**: every file sits directly in the dataset root; annotator symbols
//!   are discovered from the part after the last underscore.
//! - **Directory**: the root holds one subdirectory per annotator, named by
//!   the annotator symbol.

use crate::models::config::CONFIG_FILE_NAME;
use crate::models::{AnnotationIndex, DatasetLayout, Document, IaaError, IaaResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const ANNOTATION_EXTENSION: &str = "xml";

/// A file matched to its document and annotator
#[derive(Debug)]
struct Entry {
    document: String,
    annotator: String,
    path: PathBuf,
}

/// Builds an [`AnnotationIndex`] from a dataset root
#[derive(Debug, Clone)]
pub struct AnnotationSetIndexer {
    root: PathBuf,
}

impl AnnotationSetIndexer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Detect the layout and index the dataset
    pub fn index(&self) -> IaaResult<AnnotationIndex> {
        match self.detect_layout()? {
            DatasetLayout::Flat => self.index_flat(),
            DatasetLayout::Directory => self.index_directories(),
        }
    }

    /// Directory mode when every visible child of the root is a directory
    pub fn detect_layout(&self) -> IaaResult<DatasetLayout> {
        let children = list_children(&self.root)?;
        let relevant: Vec<_> = children
            .iter()
            .filter(|p| file_name(p) != CONFIG_FILE_NAME)
            .collect();

        if relevant.is_empty() {
            return Err(IaaError::NoAnnotationFiles(self.root.clone()));
        }

        if relevant.iter().all(|p| p.is_dir()) {
            Ok(DatasetLayout::Directory)
        } else {
            Ok(DatasetLayout::Flat)
        }
    }

    // =========================================================================
    // Flat Mode
    // =========================================================================

    /// Index a directory of files, discovering annotators from file names
    pub fn index_flat(&self) -> IaaResult<AnnotationIndex> {
        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        // Sorted listing keeps slot assignment stable across runs
        for path in list_children(&self.root)? {
            if !path.is_file() {
                continue;
            }
            match split_annotation_name(&path) {
                Some((document, annotator)) => entries.push(Entry {
                    document,
                    annotator,
                    path,
                }),
                None => {
                    if file_name(&path) != CONFIG_FILE_NAME {
                        skipped.push(path);
                    }
                }
            }
        }

        if entries.is_empty() {
            return Err(IaaError::NoAnnotationFiles(self.root.clone()));
        }

        let mut annotators: Vec<String> = Vec::new();
        for entry in &entries {
            if !annotators.contains(&entry.annotator) {
                annotators.push(entry.annotator.clone());
            }
        }

        let index = build_index(&self.root, DatasetLayout::Flat, annotators, entries)?;
        Ok(index.with_skipped(skipped))
    }

    // =========================================================================
    // Directory Mode
    // =========================================================================

    /// Index one subdirectory per annotator
    pub fn index_directories(&self) -> IaaResult<AnnotationIndex> {
        let mut annotators = Vec::new();
        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        for dir in list_children(&self.root)? {
            if !dir.is_dir() {
                continue;
            }
            let annotator = file_name(&dir);
            let suffix = format!("_{}", annotator);
            let mut matched = 0usize;

            for path in list_children(&dir)? {
                if !path.is_file() {
                    continue;
                }
                let document = annotation_stem(&path)
                    .and_then(|stem| stem.strip_suffix(suffix.as_str()).map(str::to_string))
                    .filter(|doc| !doc.is_empty());

                match document {
                    Some(document) => {
                        matched += 1;
                        entries.push(Entry {
                            document,
                            annotator: annotator.clone(),
                            path,
                        });
                    }
                    None => skipped.push(path),
                }
            }

            if matched == 0 {
                return Err(IaaError::EmptyAnnotatorSubset { annotator, dir });
            }
            annotators.push(annotator);
        }

        let index = build_index(&self.root, DatasetLayout::Directory, annotators, entries)?;
        Ok(index.with_skipped(skipped))
    }
}

/// Place every entry into its (document, slot) cell
///
/// Documents keep the order in which they are first seen.
fn build_index(
    root: &Path,
    layout: DatasetLayout,
    annotators: Vec<String>,
    entries: Vec<Entry>,
) -> IaaResult<AnnotationIndex> {
    let slots: HashMap<&str, usize> = annotators
        .iter()
        .enumerate()
        .map(|(slot, a)| (a.as_str(), slot))
        .collect();

    let mut documents: Vec<Document> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let Some(&slot) = slots.get(entry.annotator.as_str()) else {
            return Err(IaaError::UnknownAnnotator(entry.annotator));
        };

        let position = *positions.entry(entry.document.clone()).or_insert_with(|| {
            documents.push(Document::new(entry.document.clone(), annotators.len()));
            documents.len() - 1
        });

        let cell = &mut documents[position].files[slot];
        if cell.is_some() {
            return Err(IaaError::DuplicateAnnotationFile {
                document: entry.document,
                annotator: entry.annotator,
                file: entry.path,
            });
        }
        *cell = Some(entry.path);
    }

    Ok(AnnotationIndex::new(root, layout, annotators, documents))
}

/// Visible children of a directory, sorted by name
fn list_children(dir: &Path) -> IaaResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IaaError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut children = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            IaaError::io(path, e.into())
        })?;
        // Skip hidden entries
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        children.push(entry.into_path());
    }
    Ok(children)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// File stem when the extension is `.xml` (any case)
fn annotation_stem(path: &Path) -> Option<&str> {
    let ext = path.extension()?.to_str()?;
    if !ext.eq_ignore_ascii_case(ANNOTATION_EXTENSION) {
        return None;
    }
    path.file_stem()?.to_str()
}

/// Split `<doc>_<annotator>.xml` on the last underscore
pub fn split_annotation_name(path: &Path) -> Option<(String, String)> {
    let stem = annotation_stem(path)?;
    let (document, annotator) = stem.rsplit_once('_')?;
    if document.is_empty() || annotator.is_empty() {
        return None;
    }
    Some((document.to_string(), annotator.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "<Task><TEXT></TEXT><TAGS/></Task>").unwrap();
    }

    #[test]
    fn test_split_annotation_name() {
        assert_eq!(
            split_annotation_name(Path::new("news_01_AB.XML")),
            Some(("news_01".to_string(), "AB".to_string()))
        );
        assert_eq!(split_annotation_name(Path::new("news.xml")), None);
        assert_eq!(split_annotation_name(Path::new("news_A.txt")), None);
        assert_eq!(split_annotation_name(Path::new("_A.xml")), None);
    }

    #[test]
    fn test_flat_mode_builds_full_matrix() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["d1_B.xml", "d1_A.xml", "d2_A.xml", "d3_C.xml", "notes.txt"] {
            touch(&root.join(name));
        }

        let index = AnnotationSetIndexer::new(root).index().unwrap();
        assert_eq!(index.layout, DatasetLayout::Flat);
        // Sorted listing: d1_A, d1_B, d2_A, d3_C
        assert_eq!(index.annotators(), &["A", "B", "C"]);
        assert_eq!(index.documents().len(), 3);
        for doc in index.documents() {
            assert_eq!(doc.files.len(), 3);
        }
        assert_eq!(index.document("d2").unwrap().missing_count(), 2);
        assert_eq!(index.skipped, vec![root.join("notes.txt")]);
    }

    #[test]
    fn test_flat_mode_slot_assignment_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["z_Q.xml", "a_P.xml", "m_R.xml", "a_Q.xml"] {
            touch(&root.join(name));
        }

        let first = AnnotationSetIndexer::new(root).index().unwrap();
        let second = AnnotationSetIndexer::new(root).index().unwrap();
        assert_eq!(first.annotators(), second.annotators());
        assert_eq!(first.annotators(), &["P", "Q", "R"]);
        assert_eq!(first.documents(), second.documents());
    }

    #[test]
    fn test_flat_mode_duplicate_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("d1_A.xml"));
        touch(&root.join("d1_A.XML"));

        let err = AnnotationSetIndexer::new(root).index().unwrap_err();
        assert!(matches!(err, IaaError::DuplicateAnnotationFile { .. }));
    }

    #[test]
    fn test_flat_mode_without_matching_files() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("readme.xml"));

        let err = AnnotationSetIndexer::new(temp_dir.path()).index().unwrap_err();
        assert!(matches!(err, IaaError::NoAnnotationFiles(_)));
    }

    #[test]
    fn test_directory_mode() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("ann2/doc1_ann2.xml"));
        touch(&root.join("ann1/doc1_ann1.xml"));
        touch(&root.join("ann1/doc2_ann1.xml"));
        touch(&root.join("ann1/stray.xml"));

        let index = AnnotationSetIndexer::new(root).index().unwrap();
        assert_eq!(index.layout, DatasetLayout::Directory);
        assert_eq!(index.annotators(), &["ann1", "ann2"]);
        assert_eq!(index.documents().len(), 2);
        assert_eq!(index.document("doc2").unwrap().missing_count(), 1);
        assert_eq!(index.skipped, vec![root.join("ann1/stray.xml")]);
    }

    #[test]
    fn test_directory_mode_empty_subset_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("ann1/doc1_ann1.xml"));
        touch(&root.join("ann2/doc1_ann1.xml"));

        match AnnotationSetIndexer::new(root).index() {
            Err(IaaError::EmptyAnnotatorSubset { annotator, .. }) => assert_eq!(annotator, "ann2"),
            other => panic!("expected empty subset error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_file_does_not_change_layout() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("ann1/doc1_ann1.xml"));
        fs::write(root.join(CONFIG_FILE_NAME), "").unwrap();

        let indexer = AnnotationSetIndexer::new(root);
        assert_eq!(indexer.detect_layout().unwrap(), DatasetLayout::Directory);
    }

    #[test]
    fn test_empty_root() {
        let temp_dir = TempDir::new().unwrap();
        let err = AnnotationSetIndexer::new(temp_dir.path()).index().unwrap_err();
        assert!(matches!(err, IaaError::NoAnnotationFiles(_)));
    }
}
