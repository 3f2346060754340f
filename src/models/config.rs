//! Agreement run configuration (`iaa.toml`)

use super::error::{IaaError, IaaResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the dataset root
pub const CONFIG_FILE_NAME: &str = "iaa.toml";

/// Tag types to include, each with the attribute names to include
/// (an empty set means span-only)
pub type MetricTargets = BTreeMap<String, BTreeSet<String>>;

/// What to do when one annotator tags the exact same span more than once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultiTagPolicy {
    /// Abort the metric with a duplicate-tagging error
    #[default]
    Reject,
    /// Keep the tag whose type name sorts first (ties: lowest tag id)
    FirstByTypeName,
    /// Keep the tag that appears first in the file
    FirstInFile,
}

impl MultiTagPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            MultiTagPolicy::Reject => "reject",
            MultiTagPolicy::FirstByTypeName => "first-by-type-name",
            MultiTagPolicy::FirstInFile => "first-in-file",
        }
    }
}

impl std::str::FromStr for MultiTagPolicy {
    type Err = IaaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(MultiTagPolicy::Reject),
            "first-by-type-name" | "first-by-type" => Ok(MultiTagPolicy::FirstByTypeName),
            "first-in-file" => Ok(MultiTagPolicy::FirstInFile),
            _ => Err(IaaError::Config(format!("unknown multi-tag policy '{}'", s))),
        }
    }
}

fn default_parse_workers() -> usize {
    4
}

fn default_precision() -> usize {
    4
}

/// Settings for one agreement run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IaaConfig {
    /// Schema / task name every file must declare; taken from the first
    /// present file when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,

    #[serde(default)]
    pub multi_tag: MultiTagPolicy,

    /// Annotator symbols excluded from every study at session start
    #[serde(default)]
    pub ignored_annotators: Vec<String>,

    /// Upper bound on concurrent file parses during prefetch
    #[serde(default = "default_parse_workers")]
    pub parse_workers: usize,

    /// Digits after the decimal point in the text report
    #[serde(default = "default_precision")]
    pub precision: usize,

    /// Metric id -> targets
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricTargets>,
}

impl Default for IaaConfig {
    fn default() -> Self {
        Self {
            task_name: None,
            multi_tag: MultiTagPolicy::default(),
            ignored_annotators: Vec::new(),
            parse_workers: default_parse_workers(),
            precision: default_precision(),
            metrics: BTreeMap::new(),
        }
    }
}

impl IaaConfig {
    /// Default config location for a dataset
    pub fn default_path(dataset_root: &Path) -> PathBuf {
        dataset_root.join(CONFIG_FILE_NAME)
    }

    /// Load config from a file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> IaaResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| IaaError::io(path, e))?;
        Self::from_toml(&content)
            .map_err(|e| IaaError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse config from TOML text
    pub fn from_toml(content: &str) -> IaaResult<Self> {
        let config: IaaConfig =
            toml::from_str(content).map_err(|e| IaaError::Config(e.to_string()))?;
        if config.parse_workers == 0 {
            return Err(IaaError::Config("parse_workers must be at least 1".to_string()));
        }
        Ok(config)
    }

    /// Save config as TOML
    pub fn save(&self, path: &Path) -> IaaResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| IaaError::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| IaaError::io(path, e))
    }

    /// Add or extend targets for a metric
    pub fn add_targets(&mut self, metric: &str, targets: MetricTargets) {
        let entry = self.metrics.entry(metric.to_string()).or_default();
        for (tag, attrs) in targets {
            entry.entry(tag).or_default().extend(attrs);
        }
    }
}

/// Parse a `--metric` argument: `<metric>=<TAG>[:attr|attr][,<TAG>...]`
pub fn parse_metric_arg(arg: &str) -> IaaResult<(String, MetricTargets)> {
    let (metric, spec) = arg
        .split_once('=')
        .ok_or_else(|| IaaError::Config(format!("expected <metric>=<targets>, got '{}'", arg)))?;

    let metric = metric.trim();
    if metric.is_empty() {
        return Err(IaaError::Config(format!("missing metric name in '{}'", arg)));
    }

    let mut targets = MetricTargets::new();
    for target in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (tag, attrs) = match target.split_once(':') {
            Some((tag, attrs)) => (tag.trim(), attrs),
            None => (target, ""),
        };
        if tag.is_empty() {
            return Err(IaaError::Config(format!("missing tag type in '{}'", target)));
        }

        let attrs: BTreeSet<String> = attrs
            .split('|')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
        targets.entry(tag.to_string()).or_default().extend(attrs);
    }

    if targets.is_empty() {
        return Err(IaaError::Config(format!("no tag types given in '{}'", arg)));
    }

    Ok((metric.to_string(), targets))
}
