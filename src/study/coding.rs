//! Coding (labeling) study builder
//!
//! One item per distinct non-empty span that any approved annotator tagged
//! with a target type. A document where nobody tagged anything still yields
//! one all-unmarked item.

use super::{CategorySource, StudyContext};
use crate::models::{
    CodingStudy, IaaError, IaaResult, MultiTagPolicy, ParsedAnnotationFile, ParsedTag, SpanSet,
    NO_VALUE, UNMARKED,
};
use std::collections::BTreeSet;

/// Builds [`CodingStudy`] values for one metric
pub struct CodingStudyBuilder<'a> {
    context: StudyContext<'a>,
    metric: String,
    policy: MultiTagPolicy,
}

impl<'a> CodingStudyBuilder<'a> {
    pub fn new(context: StudyContext<'a>, metric: impl Into<String>, policy: MultiTagPolicy) -> Self {
        Self {
            context,
            metric: metric.into(),
            policy,
        }
    }

    /// Build a study over every document for the given tag types
    pub fn build(&self, tag_types: &[String], category: &CategorySource) -> IaaResult<CodingStudy> {
        let columns = self.context.approved.len();
        let mut study = CodingStudy::new(columns);

        for document in self.context.cache.index().documents() {
            let parses = self.context.cache.get_parses(&document.id)?;
            let files: Vec<Option<&ParsedAnnotationFile>> = self
                .context
                .approved
                .iter()
                .map(|&slot| parses.get(slot).and_then(Option::as_ref))
                .collect();

            let spans: BTreeSet<&SpanSet> = files
                .iter()
                .flatten()
                .flat_map(|file| file.tags_of_types(tag_types))
                .filter(|tag| !tag.is_non_consuming())
                .map(|tag| &tag.spans)
                .collect();

            if spans.is_empty() {
                study.push_row(vec![UNMARKED.to_string(); columns]);
                continue;
            }

            for span in spans {
                let mut row = Vec::with_capacity(columns);
                for (column, file) in files.iter().enumerate() {
                    let matches: Vec<&ParsedTag> = file
                        .map(|f| {
                            f.tags_of_types(tag_types)
                                .filter(|tag| &tag.spans == span)
                                .collect()
                        })
                        .unwrap_or_default();

                    let chosen = self.choose(&matches).ok_or_else(|| {
                        IaaError::DuplicateSpanTagging {
                            metric: self.metric.clone(),
                            document: document.id.clone(),
                            annotator: self.context.annotator_name(column),
                            span: span.to_string(),
                        }
                    });
                    let cell = match chosen? {
                        Some(tag) => category_of(tag, category),
                        None => UNMARKED.to_string(),
                    };
                    row.push(cell);
                }
                study.push_row(row);
            }
        }

        Ok(study)
    }

    /// Pick the tag for a cell; `None` when the policy rejects the duplicates
    fn choose<'t>(&self, matches: &[&'t ParsedTag]) -> Option<Option<&'t ParsedTag>> {
        match matches {
            [] => Some(None),
            [only] => Some(Some(*only)),
            _ => match self.policy {
                MultiTagPolicy::Reject => None,
                MultiTagPolicy::FirstInFile => Some(matches.first().copied()),
                MultiTagPolicy::FirstByTypeName => Some(
                    matches
                        .iter()
                        .min_by(|a, b| a.tag_type.cmp(&b.tag_type).then_with(|| a.id.cmp(&b.id)))
                        .copied(),
                ),
            },
        }
    }
}

fn category_of(tag: &ParsedTag, source: &CategorySource) -> String {
    match source {
        CategorySource::TagType => tag.tag_type.clone(),
        CategorySource::Attribute(name) => tag.attribute(name).unwrap_or(NO_VALUE).to_string(),
    }
}
