//! Service layer
//!
//! Dataset discovery, memoized parsing and the session that ties them to an
//! agreement run. Shared by the CLI commands and the integration tests.

pub mod indexer;
pub mod parse_cache;
pub mod session;

// Re-export commonly used types
pub use indexer::{split_annotation_name, AnnotationSetIndexer};
pub use parse_cache::{DocumentParses, ParseCache};
pub use session::IaaSession;
