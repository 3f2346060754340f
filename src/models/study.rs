//! Study values handed to the coefficient backend
//!
//! Studies are built fresh for every calculation and never mutated afterwards.

use serde::Serialize;
use std::collections::BTreeSet;

/// Category placed in a coding cell when the annotator did not mark the span
pub const UNMARKED: &str = "(unmarked)";

/// Category used when a matched tag carries no value for the requested attribute
pub const NO_VALUE: &str = "(no value)";

/// Labeling study: one row per observed span, one column per approved annotator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodingStudy {
    annotator_count: usize,
    rows: Vec<Vec<String>>,
}

impl CodingStudy {
    pub fn new(annotator_count: usize) -> Self {
        Self {
            annotator_count,
            rows: Vec::new(),
        }
    }

    /// Append one item; the row must have one cell per annotator
    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.annotator_count);
        self.rows.push(row);
    }

    pub fn annotator_count(&self) -> usize {
        self.annotator_count
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn item_count(&self) -> usize {
        self.rows.len()
    }

    /// Every category that occurs in any cell
    pub fn categories(&self) -> BTreeSet<&str> {
        self.rows
            .iter()
            .flat_map(|row| row.iter().map(String::as_str))
            .collect()
    }
}

/// One annotator's segment on the global offset line
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Unit {
    /// Global start offset
    pub offset: usize,
    pub length: usize,
    /// Column of the annotator among the approved annotators
    pub annotator: usize,
    pub category: String,
}

impl Unit {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Segmentation study over the concatenated text of all documents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitizingStudy {
    annotator_count: usize,
    continuum_length: usize,
    units: Vec<Unit>,
}

impl UnitizingStudy {
    pub fn new(annotator_count: usize, continuum_length: usize) -> Self {
        Self {
            annotator_count,
            continuum_length,
            units: Vec::new(),
        }
    }

    /// Add a unit; zero-length units are ignored
    pub fn add_unit(
        &mut self,
        offset: usize,
        length: usize,
        annotator: usize,
        category: impl Into<String>,
    ) {
        debug_assert!(annotator < self.annotator_count);
        debug_assert!(offset + length <= self.continuum_length);
        if length == 0 {
            return;
        }
        self.units.push(Unit {
            offset,
            length,
            annotator,
            category: category.into(),
        });
    }

    pub fn annotator_count(&self) -> usize {
        self.annotator_count
    }

    /// Total length of the offset line
    pub fn continuum_length(&self) -> usize {
        self.continuum_length
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn categories(&self) -> BTreeSet<&str> {
        self.units.iter().map(|u| u.category.as_str()).collect()
    }
}
