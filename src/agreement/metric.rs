//! Metric identifiers
//!
//! A metric id is `<scope>_<coefficient>`, e.g. `local_multi_pi` or
//! `global_alpha_u`.

use serde::Serialize;
use std::fmt;

/// Per-tag-type scores or one cross-tag score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Local,
    Global,
}

/// Agreement coefficient computed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Coefficient {
    MultiPi,
    MultiKappa,
    AlphaU,
}

impl Coefficient {
    pub fn name(&self) -> &'static str {
        match self {
            Coefficient::MultiPi => "multi_pi",
            Coefficient::MultiKappa => "multi_kappa",
            Coefficient::AlphaU => "alpha_u",
        }
    }

    /// What kind of study the coefficient consumes
    pub fn kind(&self) -> StudyKind {
        match self {
            Coefficient::MultiPi | Coefficient::MultiKappa => StudyKind::Coding,
            Coefficient::AlphaU => StudyKind::Unitizing,
        }
    }
}

/// Labeling of pre-identified items, or segmentation of a continuum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyKind {
    Coding,
    Unitizing,
}

/// A known metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Metric {
    pub scope: Scope,
    pub coefficient: Coefficient,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::new(Scope::Local, Coefficient::MultiPi),
        Metric::new(Scope::Global, Coefficient::MultiPi),
        Metric::new(Scope::Local, Coefficient::MultiKappa),
        Metric::new(Scope::Global, Coefficient::MultiKappa),
        Metric::new(Scope::Local, Coefficient::AlphaU),
        Metric::new(Scope::Global, Coefficient::AlphaU),
    ];

    pub const fn new(scope: Scope, coefficient: Coefficient) -> Self {
        Self { scope, coefficient }
    }

    /// Look up a metric by id; `None` for ids with no implementation
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.id() == id)
    }

    pub fn id(&self) -> String {
        let scope = match self.scope {
            Scope::Local => "local",
            Scope::Global => "global",
        };
        format!("{}_{}", scope, self.coefficient.name())
    }

    pub fn kind(&self) -> StudyKind {
        self.coefficient.kind()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}
