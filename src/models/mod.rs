pub mod config;
pub mod dataset;
pub mod error;
pub mod parsed;
pub mod span;
pub mod study;
pub mod validation;

pub use config::{parse_metric_arg, IaaConfig, MetricTargets, MultiTagPolicy};
pub use dataset::{AnnotationIndex, AnnotatorSlot, DatasetLayout, Document};
pub use error::{IaaError, IaaResult};
pub use parsed::{ParsedAnnotationFile, ParsedTag};
pub use span::{SpanParseError, SpanSet};
pub use study::{CodingStudy, Unit, UnitizingStudy, NO_VALUE, UNMARKED};
pub use validation::{IssueCategory, ValidationIssue, ValidationReport};
