pub mod calculator;
pub mod coefficient;
pub mod metric;
pub mod report;

pub use calculator::{block_title, calculate_all, AgreementCalculator, SPANS_KEY};
pub use coefficient::{BuiltinBackend, CoefficientBackend};
pub use metric::{Coefficient, Metric, Scope, StudyKind};
pub use report::{AgreementReport, BlockOutcome, ReportBlock, Score, METRIC_NOT_DEFINED};
