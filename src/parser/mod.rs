pub mod annotation;
pub mod xml;

pub use annotation::{parse_annotation, parse_annotation_file, ParseOutcome};
pub use xml::{child_element, element_attributes, element_text, parse_document};
