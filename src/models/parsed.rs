//! In-memory form of one parsed annotation file

use super::span::SpanSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One tag instance from an annotation file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedTag {
    /// Tag type name (element name inside `<TAGS>`)
    pub tag_type: String,

    /// Tag id as written in the file (may be empty)
    pub id: String,

    /// Text coverage
    pub spans: SpanSet,

    /// Non-reserved attributes with a non-empty value
    pub attributes: BTreeMap<String, String>,
}

impl ParsedTag {
    /// Attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// True when the tag has no text extent
    pub fn is_non_consuming(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Immutable result of parsing one annotation file
#[derive(Debug, Clone, Serialize)]
pub struct ParsedAnnotationFile {
    /// Source file
    pub path: PathBuf,

    /// Schema / task name declared by the root element
    pub task_name: String,

    /// Primary text body
    pub text: String,

    /// Tags in file order
    pub tags: Vec<ParsedTag>,
}

impl ParsedAnnotationFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Primary text length in characters (span offsets count characters)
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Tags whose type is one of `types` (exact match)
    pub fn tags_of_types<'a>(
        &'a self,
        types: &'a [String],
    ) -> impl Iterator<Item = &'a ParsedTag> + 'a {
        self.tags
            .iter()
            .filter(move |t| types.iter().any(|ty| ty == &t.tag_type))
    }
}
