//! Agreement calculators
//!
//! A metric selects one of four calculators (local/global x coding/unitizing).
//! Each calculator turns the requested targets into studies, runs the
//! coefficient on every study and labels the result:
//!
//! | calculator        | keys                                        |
//! |-------------------|---------------------------------------------|
//! | local coding      | `TAG`, `TAG::attr`                          |
//! | local unitizing   | `TAG::(spans)`, `TAG::attr`                 |
//! | global (both)     | `cross-tag_<coefficient>`                   |

use super::coefficient::CoefficientBackend;
use super::metric::{Coefficient, Metric, Scope, StudyKind};
use super::report::{AgreementReport, BlockOutcome, ReportBlock, Score};
use crate::models::{IaaError, IaaResult, MetricTargets, MultiTagPolicy};
use crate::study::{CategorySource, CodingStudyBuilder, StudyContext, UnitizingStudyBuilder};
use std::collections::BTreeMap;

/// Key suffix of the implicit span-only unitizing study
pub const SPANS_KEY: &str = "(spans)";

/// Calculator variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgreementCalculator {
    LocalCoding(Coefficient),
    GlobalCoding(Coefficient),
    LocalUnitizing,
    GlobalUnitizing,
}

impl AgreementCalculator {
    pub fn for_metric(metric: Metric) -> Self {
        match (metric.scope, metric.kind()) {
            (Scope::Local, StudyKind::Coding) => Self::LocalCoding(metric.coefficient),
            (Scope::Global, StudyKind::Coding) => Self::GlobalCoding(metric.coefficient),
            (Scope::Local, StudyKind::Unitizing) => Self::LocalUnitizing,
            (Scope::Global, StudyKind::Unitizing) => Self::GlobalUnitizing,
        }
    }

    pub fn metric(&self) -> Metric {
        match *self {
            Self::LocalCoding(coefficient) => Metric::new(Scope::Local, coefficient),
            Self::GlobalCoding(coefficient) => Metric::new(Scope::Global, coefficient),
            Self::LocalUnitizing => Metric::new(Scope::Local, Coefficient::AlphaU),
            Self::GlobalUnitizing => Metric::new(Scope::Global, Coefficient::AlphaU),
        }
    }

    /// Compute every score for the targets; any study failure fails the call
    pub fn calculate(
        &self,
        context: StudyContext<'_>,
        targets: &MetricTargets,
        policy: MultiTagPolicy,
        backend: &dyn CoefficientBackend,
    ) -> IaaResult<Vec<Score>> {
        let metric = self.metric();
        let metric_id = metric.id();

        if targets.is_empty() {
            return Err(IaaError::Config(format!("{}: no tag types requested", metric_id)));
        }
        if matches!(self, Self::GlobalCoding(_) | Self::GlobalUnitizing) {
            // Cross-tag studies are categorized by tag type only
            if let Some((tag, attributes)) = targets.iter().find(|(_, a)| !a.is_empty()) {
                let names: Vec<&str> = attributes.iter().map(String::as_str).collect();
                return Err(IaaError::Config(format!(
                    "{}: attributes are not supported by cross-tag metrics ({}:{})",
                    metric_id,
                    tag,
                    names.join("|")
                )));
            }
        }
        if context.approved.len() < 2 {
            return Err(IaaError::NotEnoughAnnotators {
                metric: metric_id,
                found: context.approved.len(),
            });
        }

        let runner = Runner {
            context,
            metric_id: &metric_id,
            coefficient: metric.coefficient,
            policy,
            backend,
        };

        let mut scores = Vec::new();
        match self {
            Self::LocalCoding(_) => {
                for (tag, attributes) in targets {
                    let types = vec![tag.clone()];
                    scores.push(Score::new(tag, runner.coding(&types, &CategorySource::TagType)?));
                    for attribute in attributes {
                        let source = CategorySource::Attribute(attribute.clone());
                        scores.push(Score::new(
                            format!("{}::{}", tag, attribute),
                            runner.coding(&types, &source)?,
                        ));
                    }
                }
            }
            Self::GlobalCoding(coefficient) => {
                let types: Vec<String> = targets.keys().cloned().collect();
                scores.push(Score::new(
                    cross_tag_key(*coefficient),
                    runner.coding(&types, &CategorySource::TagType)?,
                ));
            }
            Self::LocalUnitizing => {
                for (tag, attributes) in targets {
                    let types = vec![tag.clone()];
                    scores.push(Score::new(
                        format!("{}::{}", tag, SPANS_KEY),
                        runner.unitizing(&types, &CategorySource::TagType)?,
                    ));
                    for attribute in attributes {
                        let source = CategorySource::Attribute(attribute.clone());
                        scores.push(Score::new(
                            format!("{}::{}", tag, attribute),
                            runner.unitizing(&types, &source)?,
                        ));
                    }
                }
            }
            Self::GlobalUnitizing => {
                let types: Vec<String> = targets.keys().cloned().collect();
                scores.push(Score::new(
                    cross_tag_key(Coefficient::AlphaU),
                    runner.unitizing(&types, &CategorySource::TagType)?,
                ));
            }
        }

        Ok(scores)
    }
}

fn cross_tag_key(coefficient: Coefficient) -> String {
    format!("cross-tag_{}", coefficient.name())
}

/// Block title: metric id plus the sorted requested tag types
pub fn block_title(metric_id: &str, targets: &MetricTargets) -> String {
    let tags: Vec<&str> = targets.keys().map(String::as_str).collect();
    format!("{} [{}]", metric_id, tags.join(", "))
}

/// Builds one study and hands it to the backend
struct Runner<'a> {
    context: StudyContext<'a>,
    metric_id: &'a str,
    coefficient: Coefficient,
    policy: MultiTagPolicy,
    backend: &'a dyn CoefficientBackend,
}

impl Runner<'_> {
    fn coding(&self, types: &[String], source: &CategorySource) -> IaaResult<f64> {
        let study = CodingStudyBuilder::new(self.context, self.metric_id, self.policy)
            .build(types, source)?;
        if study.item_count() == 0 {
            return Err(IaaError::EmptyStudy {
                metric: self.metric_id.to_string(),
            });
        }

        Ok(match self.coefficient {
            Coefficient::MultiKappa => self.backend.multi_kappa(&study),
            _ => self.backend.multi_pi(&study),
        })
    }

    fn unitizing(&self, types: &[String], source: &CategorySource) -> IaaResult<f64> {
        let study = UnitizingStudyBuilder::new(self.context).build(types, source)?;
        if study.continuum_length() == 0 {
            return Err(IaaError::EmptyStudy {
                metric: self.metric_id.to_string(),
            });
        }

        Ok(self.backend.alpha_u(&study))
    }
}

/// Run every requested metric into one report
///
/// Unknown metric ids become "metric not defined" blocks; a failing metric
/// becomes a failed block and does not affect the others.
pub fn calculate_all(
    requests: &BTreeMap<String, MetricTargets>,
    context: StudyContext<'_>,
    policy: MultiTagPolicy,
    backend: &dyn CoefficientBackend,
) -> AgreementReport {
    let mut report = AgreementReport::new();

    for (metric_id, targets) in requests {
        let title = block_title(metric_id, targets);
        let outcome = match Metric::from_id(metric_id) {
            None => BlockOutcome::Undefined,
            Some(metric) => {
                let calculator = AgreementCalculator::for_metric(metric);
                match calculator.calculate(context, targets, policy, backend) {
                    Ok(scores) => BlockOutcome::Scores { scores },
                    Err(e) => BlockOutcome::Failed {
                        error: e.to_string(),
                    },
                }
            }
        };
        report.push(ReportBlock::new(metric_id, title, outcome));
    }

    report
}
