//! Study builders
//!
//! Turn cached parses into the inputs of the coefficient backend. Both
//! builders only look at approved annotators, and study columns follow the
//! order of the approved slots.

pub mod coding;
pub mod unitizing;

pub use coding::CodingStudyBuilder;
pub use unitizing::UnitizingStudyBuilder;

use crate::models::AnnotatorSlot;
use crate::services::ParseCache;

/// Where a study takes its category from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySource {
    /// The tag type name
    TagType,
    /// The value of the named attribute
    Attribute(String),
}

/// Everything a builder reads: parses, approved columns and validated
/// document lengths
#[derive(Clone, Copy)]
pub struct StudyContext<'a> {
    pub cache: &'a ParseCache,
    pub approved: &'a [AnnotatorSlot],
    pub document_lengths: &'a [usize],
}

impl<'a> StudyContext<'a> {
    pub fn new(
        cache: &'a ParseCache,
        approved: &'a [AnnotatorSlot],
        document_lengths: &'a [usize],
    ) -> Self {
        Self {
            cache,
            approved,
            document_lengths,
        }
    }

    /// Symbol of the annotator in a study column
    pub(crate) fn annotator_name(&self, column: usize) -> String {
        self.approved
            .get(column)
            .and_then(|&slot| self.cache.index().annotator(slot))
            .unwrap_or_default()
            .to_string()
    }
}
