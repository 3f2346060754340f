pub mod consistency;

pub use consistency::{ConsistencyValidator, ValidatedDataset};
