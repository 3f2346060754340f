//! Parse cache - every annotation file is parsed at most once per session
//!
//! Entries are keyed by document id and hold one parse per annotator slot.
//! Concurrent requests for the same document wait for the first parse and
//! share its result. Nothing is evicted: a dataset is expected to fit in
//! memory for the length of one agreement run.

use crate::models::{AnnotationIndex, IaaError, IaaResult, ParsedAnnotationFile};
use crate::parser::parse_annotation_file;
use indicatif::ProgressBar;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;

/// Parses of one document, indexed by annotator slot
pub type DocumentParses = Vec<Option<ParsedAnnotationFile>>;

type Entry = Arc<Mutex<Option<Arc<DocumentParses>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Memoized document parses plus the warnings collected while parsing
pub struct ParseCache {
    index: Arc<AnnotationIndex>,
    entries: Mutex<HashMap<String, Entry>>,
    warnings: Mutex<BTreeMap<PathBuf, String>>,
    parsed_files: AtomicUsize,
}

impl ParseCache {
    pub fn new(index: Arc<AnnotationIndex>) -> Self {
        Self {
            index,
            entries: Mutex::new(HashMap::new()),
            warnings: Mutex::new(BTreeMap::new()),
            parsed_files: AtomicUsize::new(0),
        }
    }

    pub fn index(&self) -> &AnnotationIndex {
        &self.index
    }

    /// Parses for every annotator slot of a document, parsing on first access
    ///
    /// A file that fails to parse fails the whole document; nothing is cached
    /// in that case, so the error is raised again on the next request.
    pub fn get_parses(&self, document_id: &str) -> IaaResult<Arc<DocumentParses>> {
        let document = self
            .index
            .document(document_id)
            .ok_or_else(|| IaaError::UnknownDocument(document_id.to_string()))?;

        let entry = {
            let mut entries = lock(&self.entries);
            Arc::clone(entries.entry(document_id.to_string()).or_default())
        };

        // Held for the whole parse: one in-flight parse per document
        let mut slot = lock(&entry);
        if let Some(parses) = slot.as_ref() {
            return Ok(Arc::clone(parses));
        }

        let mut parses = Vec::with_capacity(document.files.len());
        for file in &document.files {
            let parsed = match file {
                Some(path) => Some(self.parse_file(path)?),
                None => None,
            };
            parses.push(parsed);
        }

        let parses = Arc::new(parses);
        *slot = Some(Arc::clone(&parses));
        Ok(parses)
    }

    fn parse_file(&self, path: &Path) -> IaaResult<ParsedAnnotationFile> {
        let outcome = parse_annotation_file(path)?;
        self.parsed_files.fetch_add(1, Ordering::Relaxed);

        if !outcome.warnings.is_empty() {
            lock(&self.warnings).insert(path.to_path_buf(), outcome.warnings.join("\n"));
        }

        Ok(outcome.file)
    }

    /// Parse every document of the index on a bounded pool of blocking workers
    ///
    /// Returns the first failure in document order after all workers finish.
    pub async fn prefetch(
        self: &Arc<Self>,
        workers: usize,
        progress: Option<ProgressBar>,
    ) -> IaaResult<()> {
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut handles = Vec::with_capacity(self.index.documents().len());

        for document in self.index.documents() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| IaaError::Worker(e.to_string()))?;
            let cache = Arc::clone(self);
            let document_id = document.id.clone();
            let progress = progress.clone();

            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let result = cache.get_parses(&document_id).map(|_| ());
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                result
            }));
        }

        let mut first_error = None;
        for handle in handles {
            let result = handle
                .await
                .unwrap_or_else(|e| Err(IaaError::Worker(e.to_string())));
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Non-fatal parse warnings keyed by file
    pub fn warnings(&self) -> BTreeMap<PathBuf, String> {
        lock(&self.warnings).clone()
    }

    /// Warning text recorded for one file
    pub fn warning_for(&self, path: &Path) -> Option<String> {
        lock(&self.warnings).get(path).cloned()
    }

    /// Number of files parsed so far
    pub fn parsed_file_count(&self) -> usize {
        self.parsed_files.load(Ordering::Relaxed)
    }

    /// Number of documents with a completed parse
    pub fn cached_document_count(&self) -> usize {
        lock(&self.entries)
            .values()
            .filter(|entry| lock(entry).is_some())
            .count()
    }
}
