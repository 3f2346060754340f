//! Agreement report: one block per requested metric

use serde::Serialize;
use std::collections::BTreeMap;

/// Marker rendered for metric ids without an implementation
pub const METRIC_NOT_DEFINED: &str = "metric not defined";

/// One labeled coefficient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Score {
    pub key: String,
    pub value: f64,
}

impl Score {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// What happened to one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BlockOutcome {
    Scores { scores: Vec<Score> },
    Undefined,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportBlock {
    pub metric: String,
    /// `<metric-id> [<sorted tag types>]`
    pub title: String,
    #[serde(flatten)]
    pub outcome: BlockOutcome,
}

impl ReportBlock {
    pub fn new(metric: impl Into<String>, title: impl Into<String>, outcome: BlockOutcome) -> Self {
        Self {
            metric: metric.into(),
            title: title.into(),
            outcome,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, BlockOutcome::Failed { .. })
    }

    /// Text lines of the block, title first
    pub fn render(&self, precision: usize) -> Vec<String> {
        let mut lines = vec![self.title.clone()];
        match &self.outcome {
            BlockOutcome::Scores { scores } => {
                for score in scores {
                    lines.push(format!(
                        "{:.prec$}\t{}\t{}",
                        score.value,
                        self.metric,
                        score.key,
                        prec = precision
                    ));
                }
            }
            BlockOutcome::Undefined => {
                lines.push(format!("{}\t{}", METRIC_NOT_DEFINED, self.metric));
            }
            BlockOutcome::Failed { error } => {
                lines.push(format!("failed: {}\t{}", error, self.metric));
            }
        }
        lines
    }
}

/// Result of one calculator pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgreementReport {
    pub blocks: Vec<ReportBlock>,
}

impl AgreementReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: ReportBlock) {
        self.blocks.push(block);
    }

    /// Human-readable report; blocks are separated by a blank line
    pub fn render_text(&self, precision: usize) -> String {
        self.blocks
            .iter()
            .map(|block| block.render(precision).join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Metric id -> key -> score, for programmatic consumers
    pub fn score_map(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        let mut map = BTreeMap::new();
        for block in &self.blocks {
            if let BlockOutcome::Scores { scores } = &block.outcome {
                let entry: &mut BTreeMap<String, f64> =
                    map.entry(block.metric.clone()).or_default();
                for score in scores {
                    entry.insert(score.key.clone(), score.value);
                }
            }
        }
        map
    }

    /// One score by metric id and key
    pub fn score(&self, metric: &str, key: &str) -> Option<f64> {
        self.blocks
            .iter()
            .filter(|block| block.metric == metric)
            .find_map(|block| match &block.outcome {
                BlockOutcome::Scores { scores } => {
                    scores.iter().find(|s| s.key == key).map(|s| s.value)
                }
                _ => None,
            })
    }

    pub fn failed_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_failed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AgreementReport {
        let mut report = AgreementReport::new();
        report.push(ReportBlock::new(
            "local_multi_pi",
            "local_multi_pi [NOUN]",
            BlockOutcome::Scores {
                scores: vec![Score::new("NOUN", 0.75), Score::new("NOUN::number", 1.0 / 3.0)],
            },
        ));
        report.push(ReportBlock::new(
            "local_cohen_kappa",
            "local_cohen_kappa [NOUN]",
            BlockOutcome::Undefined,
        ));
        report.push(ReportBlock::new(
            "global_multi_pi",
            "global_multi_pi [NOUN, VERB]",
            BlockOutcome::Failed {
                error: "duplicate".to_string(),
            },
        ));
        report
    }

    #[test]
    fn test_render_text_lines() {
        let text = sample().render_text(3);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "local_multi_pi [NOUN]");
        assert_eq!(lines[1], "0.750\tlocal_multi_pi\tNOUN");
        assert_eq!(lines[2], "0.333\tlocal_multi_pi\tNOUN::number");
        assert_eq!(lines[3], "");
        assert_eq!(lines[5], "metric not defined\tlocal_cohen_kappa");
        assert_eq!(lines[8], "failed: duplicate\tglobal_multi_pi");
    }

    #[test]
    fn test_score_lookup() {
        let report = sample();
        assert_eq!(report.score("local_multi_pi", "NOUN"), Some(0.75));
        assert_eq!(report.score("global_multi_pi", "cross-tag_multi_pi"), None);
        assert_eq!(report.score_map()["local_multi_pi"].len(), 2);
        assert_eq!(report.failed_count(), 1);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        let blocks = json["blocks"].as_array().unwrap();
        assert_eq!(blocks[0]["status"], "scores");
        assert_eq!(blocks[0]["scores"][0]["key"], "NOUN");
        assert_eq!(blocks[1]["status"], "undefined");
        assert_eq!(blocks[2]["error"], "duplicate");
    }
}
