//! Error taxonomy for indexing, validation, parsing and study building

use std::path::PathBuf;

/// Result type for library operations
pub type IaaResult<T> = Result<T, IaaError>;

/// Errors raised while loading a dataset or computing agreement
#[derive(Debug, thiserror::Error)]
pub enum IaaError {
    // Indexing
    #[error("No annotation files found in {0}")]
    NoAnnotationFiles(PathBuf),

    #[error("Empty annotator subset: directory {dir} has no files ending in _{annotator}.xml")]
    EmptyAnnotatorSubset { annotator: String, dir: PathBuf },

    #[error("Document '{document}' has more than one file for annotator '{annotator}': {file}")]
    DuplicateAnnotationFile {
        document: String,
        annotator: String,
        file: PathBuf,
    },

    #[error("Unknown annotator: {0}")]
    UnknownAnnotator(String),

    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    #[error("Parse worker failed: {0}")]
    Worker(String),

    // Consistency
    #[error("Task name mismatch in {file}: expected '{expected}', found '{found}'")]
    TaskNameMismatch {
        expected: String,
        found: String,
        file: PathBuf,
    },

    #[error("Primary text of {file} differs from the other annotations of document '{document}'")]
    TextMismatch { document: String, file: PathBuf },

    // Parsing
    #[error("Failed to parse {file}: {message}")]
    Parse { file: PathBuf, message: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Study building
    #[error(
        "{metric}: annotator '{annotator}' tagged span {span} of document '{document}' more than once"
    )]
    DuplicateSpanTagging {
        metric: String,
        document: String,
        annotator: String,
        span: String,
    },

    #[error("{metric}: at least two approved annotators are required, found {found}")]
    NotEnoughAnnotators { metric: String, found: usize },

    #[error("{metric}: study has no observations")]
    EmptyStudy { metric: String },

    // Configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl IaaError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Parse failure for a specific file
    pub fn parse(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// File the error points at, when there is one
    pub fn file(&self) -> Option<&std::path::Path> {
        match self {
            IaaError::DuplicateAnnotationFile { file, .. }
            | IaaError::TaskNameMismatch { file, .. }
            | IaaError::TextMismatch { file, .. }
            | IaaError::Parse { file, .. } => Some(file),
            IaaError::Io { path, .. } => Some(path),
            IaaError::EmptyAnnotatorSubset { dir, .. } => Some(dir),
            IaaError::NoAnnotationFiles(dir) => Some(dir),
            _ => None,
        }
    }
}
