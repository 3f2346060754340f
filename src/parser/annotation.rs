//! Annotation file parser
//!
//! Reads one annotation document:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8" ?>
//! <NounVerbTask>
//! <TEXT><![CDATA[The cat sat.]]></TEXT>
//! <TAGS>
//! <NOUN id="N0" spans="4~7" text="cat" type="common" />
//! <VERB id="V0" spans="8~11" text="sat" tense="past" />
//! </TAGS>
//! </NounVerbTask>
//! ```
//!
//! The root element name is the task (schema) name. The whole file must be
//! well-formed XML; any markup error is fatal. Recoverable quirks are returned
//! as warnings next to the result.

use super::xml::{child_element, element_attributes, element_text, parse_document};
use crate::models::{IaaError, IaaResult, ParsedAnnotationFile, ParsedTag, SpanSet};
use roxmltree::Node;
use std::collections::BTreeMap;
use std::path::Path;

const TEXT_ELEMENT: &str = "TEXT";
const TAGS_ELEMENT: &str = "TAGS";

/// Attributes with a fixed meaning; everything else is a user attribute
const RESERVED_ATTRIBUTES: &[&str] = &["id", "spans", "text", "start", "end"];

/// Parsed file plus the non-fatal problems met while reading it
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub file: ParsedAnnotationFile,
    pub warnings: Vec<String>,
}

/// Read and parse an annotation file from disk
pub fn parse_annotation_file(path: &Path) -> IaaResult<ParseOutcome> {
    let content = std::fs::read_to_string(path).map_err(|e| IaaError::io(path, e))?;
    parse_annotation(&content, path)
}

/// Parse annotation markup; `path` is used for error reporting and recorded in the result
pub fn parse_annotation(content: &str, path: &Path) -> IaaResult<ParseOutcome> {
    let doc = parse_document(content, path)?;
    let root = doc.root_element();
    let task_name = root.tag_name().name().to_string();
    let mut warnings = Vec::new();

    let text_node = child_element(root, TEXT_ELEMENT)
        .ok_or_else(|| IaaError::parse(path, "no <TEXT> element found"))?;
    let text = element_text(text_node)
        .ok_or_else(|| IaaError::parse(path, "<TEXT> must not contain child elements"))?;
    let text_len = text.chars().count();

    let tags = match child_element(root, TAGS_ELEMENT) {
        Some(tags_node) => tags_node
            .children()
            .filter(|node| node.is_element())
            .map(|node| read_tag(node, text_len, path, &mut warnings))
            .collect::<IaaResult<Vec<_>>>()?,
        None => {
            warnings.push("no <TAGS> section; file treated as having no annotations".to_string());
            Vec::new()
        }
    };

    Ok(ParseOutcome {
        file: ParsedAnnotationFile {
            path: path.to_path_buf(),
            task_name,
            text,
            tags,
        },
        warnings,
    })
}

/// Turn one `<TAGS>` child into a tag
fn read_tag(
    node: Node,
    text_len: usize,
    path: &Path,
    warnings: &mut Vec<String>,
) -> IaaResult<ParsedTag> {
    let name = node.tag_name().name().to_string();
    let values: BTreeMap<String, String> = element_attributes(node).into_iter().collect();

    let id = values.get("id").cloned().unwrap_or_default();
    if id.is_empty() {
        warnings.push(format!("<{}> tag has no id", name));
    }
    let label = if id.is_empty() { name.clone() } else { id.clone() };

    let spans = match values.get("spans") {
        Some(raw) => SpanSet::parse(raw).map_err(|e| {
            IaaError::parse(path, format!("tag {} has invalid spans '{}': {}", label, raw, e))
        })?,
        None => match (values.get("start"), values.get("end")) {
            (Some(start), Some(end)) => {
                warnings.push(format!(
                    "tag {} uses legacy start/end attributes instead of spans",
                    label
                ));
                SpanSet::parse(&format!("{}~{}", start, end)).map_err(|e| {
                    IaaError::parse(path, format!("tag {} has invalid start/end: {}", label, e))
                })?
            }
            _ => SpanSet::empty(),
        },
    };

    if spans.end().map_or(false, |end| end > text_len) {
        warnings.push(format!(
            "tag {} spans {} past the end of the text ({} characters)",
            label, spans, text_len
        ));
    }

    let attributes = values
        .into_iter()
        .filter(|(key, value)| !RESERVED_ATTRIBUTES.contains(&key.as_str()) && !value.is_empty())
        .collect();

    Ok(ParsedTag {
        tag_type: name,
        id,
        spans,
        attributes,
    })
}
