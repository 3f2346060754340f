// iaa-calc - inter-annotator agreement for span annotation datasets
// Indexes per-annotator annotation files, checks their consistency and computes
// coding and unitizing agreement coefficients

pub mod agreement;
pub mod cli;
pub mod models;
pub mod parser;
pub mod services;
pub mod study;
pub mod validator;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use agreement::{AgreementReport, BuiltinBackend, CoefficientBackend, Metric};
pub use models::{AnnotationIndex, IaaConfig, IaaError, IaaResult, SpanSet};
pub use services::{AnnotationSetIndexer, IaaSession, ParseCache};
