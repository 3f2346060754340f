//! Agreement coefficients
//!
//! [`CoefficientBackend`] is the seam to the statistics: calculators build
//! studies and hand them over, the backend only does arithmetic. Callers
//! guarantee at least two annotators and a non-empty study.
//!
//! The built-in backend implements:
//! - multi-pi as Fleiss' generalization of Scott's pi
//! - multi-kappa as the Davies-Fleiss generalization of Cohen's kappa
//! - alpha-u as Krippendorff's nominal alpha over the offset line, with
//!   uncovered stretches counted as their own category

use crate::models::{CodingStudy, UnitizingStudy};
use std::collections::{BTreeMap, HashMap};

/// Chance-corrected agreement coefficients
pub trait CoefficientBackend: Send + Sync {
    fn multi_pi(&self, study: &CodingStudy) -> f64;

    fn multi_kappa(&self, study: &CodingStudy) -> f64;

    fn alpha_u(&self, study: &UnitizingStudy) -> f64;
}

/// Pure Rust coefficient implementations
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinBackend;

const EPSILON: f64 = 1e-12;

/// `(po - pe) / (1 - pe)`; all cells in one category count as perfect agreement
fn chance_corrected(observed: f64, expected: f64) -> f64 {
    if (1.0 - expected).abs() < EPSILON {
        return 1.0;
    }
    (observed - expected) / (1.0 - expected)
}

/// Mean pairwise agreement over items
fn observed_agreement(study: &CodingStudy) -> f64 {
    let raters = study.annotator_count() as f64;
    let pairs = raters * (raters - 1.0);

    let total: f64 = study
        .rows()
        .iter()
        .map(|row| {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for cell in row {
                *counts.entry(cell.as_str()).or_default() += 1;
            }
            let agreeing: f64 = counts
                .values()
                .map(|&n| (n * n.saturating_sub(1)) as f64)
                .sum();
            agreeing / pairs
        })
        .sum();

    total / study.item_count() as f64
}

/// Category counts per annotator column
fn column_distributions(study: &CodingStudy) -> Vec<HashMap<&str, usize>> {
    let mut columns = vec![HashMap::new(); study.annotator_count()];
    for row in study.rows() {
        for (column, cell) in row.iter().enumerate() {
            *columns[column].entry(cell.as_str()).or_default() += 1;
        }
    }
    columns
}

/// Pairwise disagreement of one stretch of the offset line, weighted by its
/// width; also adds the stretch to the label marginals
fn tally<'s>(
    active: &[BTreeMap<&'s str, usize>],
    width: usize,
    marginals: &mut HashMap<Option<&'s str>, f64>,
) -> f64 {
    if width == 0 {
        return 0.0;
    }
    let raters = active.len();
    let mut counts: HashMap<Option<&'s str>, usize> = HashMap::new();
    for labels in active {
        *counts.entry(labels.keys().next().copied()).or_default() += 1;
    }
    let same: usize = counts.values().map(|&n| n * n).sum();
    for (label, n) in counts {
        *marginals.entry(label).or_default() += (width * n) as f64;
    }
    width as f64 * (raters * raters - same) as f64 / (raters as f64 - 1.0)
}

impl CoefficientBackend for BuiltinBackend {
    fn multi_pi(&self, study: &CodingStudy) -> f64 {
        let observed = observed_agreement(study);
        let cells = (study.item_count() * study.annotator_count()) as f64;

        let mut totals: HashMap<&str, usize> = HashMap::new();
        for cell in study.rows().iter().flatten() {
            *totals.entry(cell.as_str()).or_default() += 1;
        }
        let expected: f64 = totals
            .values()
            .map(|&n| {
                let p = n as f64 / cells;
                p * p
            })
            .sum();

        chance_corrected(observed, expected)
    }

    fn multi_kappa(&self, study: &CodingStudy) -> f64 {
        let observed = observed_agreement(study);
        let items = study.item_count() as f64;
        let columns = column_distributions(study);

        let mut expected = 0.0;
        let mut pairs = 0usize;
        for (j, left) in columns.iter().enumerate() {
            for right in &columns[j + 1..] {
                expected += left
                    .iter()
                    .map(|(category, &n)| {
                        let m = right.get(category).copied().unwrap_or(0);
                        (n as f64 / items) * (m as f64 / items)
                    })
                    .sum::<f64>();
                pairs += 1;
            }
        }
        let expected = expected / pairs as f64;

        chance_corrected(observed, expected)
    }

    fn alpha_u(&self, study: &UnitizingStudy) -> f64 {
        let raters = study.annotator_count();
        let length = study.continuum_length();

        // Boundary sweep: each stretch between two boundaries has a fixed
        // label per annotator (smallest active category, or a gap)
        let mut events: Vec<(usize, bool, usize, &str)> =
            Vec::with_capacity(study.units().len() * 2);
        for unit in study.units() {
            events.push((unit.offset, true, unit.annotator, unit.category.as_str()));
            events.push((unit.end(), false, unit.annotator, unit.category.as_str()));
        }
        events.sort_by_key(|&(position, opens, ..)| (position, opens));

        let mut active: Vec<BTreeMap<&str, usize>> = vec![BTreeMap::new(); raters];
        let mut marginals: HashMap<Option<&str>, f64> = HashMap::new();
        let mut disagreement = 0.0;
        let mut position = 0;
        let mut pending = events.iter().peekable();

        while let Some(&&(next, ..)) = pending.peek() {
            disagreement += tally(&active, next.saturating_sub(position), &mut marginals);
            while let Some(&&(at, opens, annotator, category)) = pending.peek() {
                if at != next {
                    break;
                }
                let labels = &mut active[annotator];
                if opens {
                    *labels.entry(category).or_default() += 1;
                } else if let Some(n) = labels.get_mut(category) {
                    *n -= 1;
                    if *n == 0 {
                        labels.remove(category);
                    }
                }
                pending.next();
            }
            position = position.max(next);
        }
        disagreement += tally(&active, length.saturating_sub(position), &mut marginals);

        let values = (length * raters) as f64;
        let expected = values * values - marginals.values().map(|n| n * n).sum::<f64>();
        if expected.abs() < EPSILON {
            return 1.0;
        }
        1.0 - (values - 1.0) * disagreement / expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNMARKED;

    fn coding(rows: &[&[&str]]) -> CodingStudy {
        let mut study = CodingStudy::new(rows[0].len());
        for row in rows {
            study.push_row(row.iter().map(|s| s.to_string()).collect());
        }
        study
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_perfect_coding_agreement() {
        let study = coding(&[&["A", "A", "A"], &["B", "B", "B"], &["A", "A", "A"]]);
        assert_close(BuiltinBackend.multi_pi(&study), 1.0);
        assert_close(BuiltinBackend.multi_kappa(&study), 1.0);
    }

    #[test]
    fn test_single_category_counts_as_agreement() {
        let study = coding(&[&[UNMARKED, UNMARKED]]);
        assert_close(BuiltinBackend.multi_pi(&study), 1.0);
        assert_close(BuiltinBackend.multi_kappa(&study), 1.0);
    }

    #[test]
    fn test_chance_level_agreement() {
        let study = coding(&[&["A", "A"], &["B", "B"], &["A", "B"], &["B", "A"]]);
        assert_close(BuiltinBackend.multi_pi(&study), 0.0);
        assert_close(BuiltinBackend.multi_kappa(&study), 0.0);
    }

    #[test]
    fn test_pi_and_kappa_differ_on_skewed_raters() {
        // Po = 2/3; pooled Pe = 26/36; pairwise Pe = 2/3
        let study = coding(&[&["A", "A"], &["A", "A"], &["A", "B"]]);
        assert_close(BuiltinBackend.multi_pi(&study), -0.2);
        assert_close(BuiltinBackend.multi_kappa(&study), 0.0);
    }

    #[test]
    fn test_identical_units_agree_perfectly() {
        let mut study = UnitizingStudy::new(2, 20);
        for annotator in 0..2 {
            study.add_unit(2, 5, annotator, "NOUN");
            study.add_unit(10, 3, annotator, "VERB");
        }
        assert_close(BuiltinBackend.alpha_u(&study), 1.0);
    }

    #[test]
    fn test_one_sided_unit() {
        // Segment [0,5): X vs gap; [5,10): gap vs gap
        let mut study = UnitizingStudy::new(2, 10);
        study.add_unit(0, 5, 0, "X");
        assert_close(BuiltinBackend.alpha_u(&study), 1.0 - 19.0 * 10.0 / 150.0);
    }

    #[test]
    fn test_no_units_at_all() {
        let study = UnitizingStudy::new(3, 12);
        assert_close(BuiltinBackend.alpha_u(&study), 1.0);
    }

    #[test]
    fn test_partial_overlap_lowers_alpha() {
        let mut exact = UnitizingStudy::new(2, 20);
        exact.add_unit(4, 6, 0, "NOUN");
        exact.add_unit(4, 6, 1, "NOUN");

        let mut shifted = UnitizingStudy::new(2, 20);
        shifted.add_unit(4, 6, 0, "NOUN");
        shifted.add_unit(6, 6, 1, "NOUN");

        let shifted_alpha = BuiltinBackend.alpha_u(&shifted);
        assert!(shifted_alpha < BuiltinBackend.alpha_u(&exact));
        assert!(shifted_alpha > 0.0);
    }
}
