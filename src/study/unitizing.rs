//! Unitizing (segmentation) study builder
//!
//! All documents are laid end to end on one offset line, in index order,
//! using the validated text lengths. Every covered segment of a matching tag
//! becomes a unit at `document offset + local offset`.

use super::{CategorySource, StudyContext};
use crate::models::{IaaError, IaaResult, ParsedTag, UnitizingStudy};

/// Builds [`UnitizingStudy`] values
pub struct UnitizingStudyBuilder<'a> {
    context: StudyContext<'a>,
}

impl<'a> UnitizingStudyBuilder<'a> {
    pub fn new(context: StudyContext<'a>) -> Self {
        Self { context }
    }

    /// Build a study for the given tag types
    ///
    /// Tag types match case-insensitively. With [`CategorySource::TagType`]
    /// the unit category is the requested type name, so case variants of the
    /// same type agree; with an attribute source, tags lacking the attribute
    /// contribute no unit.
    pub fn build(
        &self,
        tag_types: &[String],
        category: &CategorySource,
    ) -> IaaResult<UnitizingStudy> {
        let index = self.context.cache.index();
        let lengths = self.context.document_lengths;
        if lengths.len() != index.documents().len() {
            return Err(IaaError::Config(format!(
                "expected {} document lengths, got {}",
                index.documents().len(),
                lengths.len()
            )));
        }

        let total: usize = lengths.iter().sum();
        let mut study = UnitizingStudy::new(self.context.approved.len(), total);
        let mut offset = 0;

        for (document, &length) in index.documents().iter().zip(lengths) {
            let parses = self.context.cache.get_parses(&document.id)?;

            for (column, &slot) in self.context.approved.iter().enumerate() {
                let Some(file) = parses.get(slot).and_then(Option::as_ref) else {
                    continue;
                };

                for tag in &file.tags {
                    let Some(requested) = matching_type(tag, tag_types) else {
                        continue;
                    };
                    let label = match category {
                        CategorySource::TagType => requested,
                        CategorySource::Attribute(name) => match tag.attribute(name) {
                            Some(value) => value,
                            None => continue,
                        },
                    };

                    for &(start, end) in tag.spans.clipped(length).segments() {
                        study.add_unit(offset + start, end - start, column, label);
                    }
                }
            }

            offset += length;
        }

        Ok(study)
    }
}

/// The requested type name a tag matches, ignoring case
fn matching_type<'t>(tag: &ParsedTag, tag_types: &'t [String]) -> Option<&'t str> {
    let tag_type = tag.tag_type.to_lowercase();
    tag_types
        .iter()
        .find(|ty| ty.to_lowercase() == tag_type)
        .map(String::as_str)
}
