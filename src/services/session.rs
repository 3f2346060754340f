//! Agreement session
//!
//! Owns one dataset load: the index, the parse cache, the validated document
//! lengths and which annotators take part. The index itself never changes
//! after loading; approval is session state layered on top of it.

use super::indexer::AnnotationSetIndexer;
use super::parse_cache::ParseCache;
use crate::agreement::{calculate_all, AgreementReport, CoefficientBackend};
use crate::models::{
    AnnotationIndex, AnnotatorSlot, IaaConfig, IaaError, IaaResult, MetricTargets,
    ValidationReport,
};
use crate::study::StudyContext;
use crate::validator::{ConsistencyValidator, ValidatedDataset};
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct IaaSession {
    index: Arc<AnnotationIndex>,
    cache: Arc<ParseCache>,
    config: IaaConfig,
    approved: Vec<bool>,
    validated: Option<ValidatedDataset>,
}

impl IaaSession {
    /// Index a dataset root and apply the configured ignore list
    pub fn open(root: &Path, config: IaaConfig) -> IaaResult<Self> {
        let index = AnnotationSetIndexer::new(root).index()?;
        Self::from_index(index, config)
    }

    pub fn from_index(index: AnnotationIndex, config: IaaConfig) -> IaaResult<Self> {
        let index = Arc::new(index);
        let cache = Arc::new(ParseCache::new(Arc::clone(&index)));
        let approved = vec![true; index.annotator_count()];

        let mut session = Self {
            index,
            cache,
            config,
            approved,
            validated: None,
        };
        for annotator in session.config.ignored_annotators.clone() {
            session.ignore_annotator(&annotator)?;
        }
        Ok(session)
    }

    pub fn index(&self) -> &AnnotationIndex {
        &self.index
    }

    pub fn cache(&self) -> &Arc<ParseCache> {
        &self.cache
    }

    pub fn config(&self) -> &IaaConfig {
        &self.config
    }

    /// Exclude an annotator from every study built from now on
    pub fn ignore_annotator(&mut self, annotator: &str) -> IaaResult<()> {
        self.set_approved(annotator, false)
    }

    /// Include a previously ignored annotator again
    pub fn approve_annotator(&mut self, annotator: &str) -> IaaResult<()> {
        self.set_approved(annotator, true)
    }

    fn set_approved(&mut self, annotator: &str, approved: bool) -> IaaResult<()> {
        let slot = self
            .index
            .slot_of(annotator)
            .ok_or_else(|| IaaError::UnknownAnnotator(annotator.to_string()))?;
        self.approved[slot] = approved;
        Ok(())
    }

    pub fn is_approved(&self, slot: AnnotatorSlot) -> bool {
        self.approved.get(slot).copied().unwrap_or(false)
    }

    /// Approved slots in slot order; these are the study columns
    pub fn approved_slots(&self) -> Vec<AnnotatorSlot> {
        (0..self.approved.len())
            .filter(|&slot| self.approved[slot])
            .collect()
    }

    /// Parse every file up front on the configured worker pool
    pub async fn prefetch(&self, progress: Option<ProgressBar>) -> IaaResult<()> {
        self.cache
            .prefetch(self.config.parse_workers, progress)
            .await
    }

    /// Fail-fast consistency check over every file, approved or not
    ///
    /// Runs once per session; later calls return the recorded outcome.
    pub fn validate(&mut self) -> IaaResult<&ValidatedDataset> {
        let validated = match self.validated.take() {
            Some(validated) => validated,
            None => ConsistencyValidator::new(&self.cache, self.config.task_name.as_deref())
                .validate()?,
        };
        Ok(self.validated.insert(validated))
    }

    /// Every consistency issue instead of the first one
    pub fn validate_all(&self) -> ValidationReport {
        ConsistencyValidator::new(&self.cache, self.config.task_name.as_deref()).validate_all()
    }

    /// Validated text lengths, once [`IaaSession::validate`] has succeeded
    pub fn document_lengths(&self) -> Option<&[usize]> {
        self.validated
            .as_ref()
            .map(|v| v.document_lengths.as_slice())
    }

    /// Run the requested metrics over the approved annotators
    ///
    /// Validates first when that has not happened yet; a consistency failure
    /// aborts the whole run.
    pub fn calculate(
        &mut self,
        requests: &BTreeMap<String, MetricTargets>,
        backend: &dyn CoefficientBackend,
    ) -> IaaResult<AgreementReport> {
        self.validate()?;
        let approved = self.approved_slots();
        let lengths = self.document_lengths().unwrap_or_default();
        let context = StudyContext::new(&self.cache, &approved, lengths);

        Ok(calculate_all(
            requests,
            context,
            self.config.multi_tag,
            backend,
        ))
    }

    /// Run the metrics listed in the config
    pub fn calculate_configured(
        &mut self,
        backend: &dyn CoefficientBackend,
    ) -> IaaResult<AgreementReport> {
        let requests = self.config.metrics.clone();
        self.calculate(&requests, backend)
    }

    /// Non-fatal parse warnings of every file parsed so far
    pub fn warnings(&self) -> BTreeMap<PathBuf, String> {
        self.cache.warnings()
    }
}
