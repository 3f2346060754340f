use crate::models::{IaaError, IaaResult};
use roxmltree::{Document, Node, ParsingOptions};
use std::path::Path;

/// Parse well-formed XML, attaching `path` to any error
///
/// DTDs are accepted so annotation tools that write a `<!DOCTYPE>` line
/// still load.
pub fn parse_document<'input>(content: &'input str, path: &Path) -> IaaResult<Document<'input>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    Document::parse_with_options(content, options).map_err(|e| IaaError::parse(path, e.to_string()))
}

/// First element child of `parent` named `name`
pub fn child_element<'a, 'input>(parent: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    parent
        .children()
        .find(|node| node.is_element() && node.tag_name().name() == name)
}

/// Character data of an element; CDATA and entities are already resolved
///
/// Returns `None` when the element contains child elements.
pub fn element_text(node: Node) -> Option<String> {
    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            return None;
        }
        if let Some(chunk) = child.text().filter(|_| child.is_text()) {
            text.push_str(chunk);
        }
    }
    Some(text)
}

/// Attributes of an element in document order
pub fn element_attributes(node: Node) -> Vec<(String, String)> {
    node.attributes()
        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("doc_A.xml")
    }

    #[test]
    fn test_parse_document_accepts_prolog_and_doctype() {
        let content = "\u{feff}<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<!DOCTYPE Task>\n<!-- note -->\n<Task></Task >";
        let doc = parse_document(content, &path()).unwrap();
        assert_eq!(doc.root_element().tag_name().name(), "Task");
    }

    #[test]
    fn test_parse_document_error_carries_path() {
        match parse_document("<Task><A></B></Task>", &path()) {
            Err(IaaError::Parse { file, .. }) => assert_eq!(file, path()),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_child_element_matches_exact_name() {
        let doc = parse_document("<T><TAGSET/><TAGS a=\"1\"/></T>", &path()).unwrap();
        let tags = child_element(doc.root_element(), "TAGS").unwrap();
        assert_eq!(element_attributes(tags), vec![("a".to_string(), "1".to_string())]);
        assert!(child_element(doc.root_element(), "TEXT").is_none());
    }

    #[test]
    fn test_element_text_joins_cdata_and_entities() {
        let doc = parse_document("<T><TEXT>a &amp; <![CDATA[<b>]]></TEXT></T>", &path()).unwrap();
        let text = child_element(doc.root_element(), "TEXT").unwrap();
        assert_eq!(element_text(text).as_deref(), Some("a & <b>"));
    }

    #[test]
    fn test_element_text_rejects_nested_elements() {
        let doc = parse_document("<T><TEXT>a<b/>c</TEXT></T>", &path()).unwrap();
        let text = child_element(doc.root_element(), "TEXT").unwrap();
        assert_eq!(element_text(text), None);
    }
}
