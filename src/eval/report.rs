//! Score aggregation and the final evaluation report.
//!
//! Per-example outcomes fold into an `Aggregator`; partially folded
//! aggregators from parallel workers merge associatively, so the report
//! never depends on evaluation order. `finalize` turns the counts into
//! a serializable report with overall and per-hardness-tier metrics.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::eval::hardness::Hardness;
use crate::eval::matcher::{Category, CategoryScore, MatchResult};

/// Presence/agreement tallies for one clause category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub correct: u64,
    pub gold_present: u64,
    pub pred_present: u64,
}

impl CategoryCounts {
    fn fold(&mut self, score: CategoryScore) {
        match score {
            CategoryScore::Skipped => {}
            CategoryScore::Match => {
                self.correct += 1;
                self.gold_present += 1;
                self.pred_present += 1;
            }
            CategoryScore::Miss {
                gold_present,
                pred_present,
            } => {
                if gold_present {
                    self.gold_present += 1;
                }
                if pred_present {
                    self.pred_present += 1;
                }
            }
        }
    }

    fn merge(&mut self, other: &CategoryCounts) {
        self.correct += other.correct;
        self.gold_present += other.gold_present;
        self.pred_present += other.pred_present;
    }

    pub fn precision(&self) -> Option<f64> {
        ratio(self.correct, self.pred_present)
    }

    pub fn recall(&self) -> Option<f64> {
        ratio(self.correct, self.gold_present)
    }

    /// Harmonic mean of precision and recall; `None` when the category
    /// never appeared on either side.
    pub fn f1(&self) -> Option<f64> {
        if self.gold_present == 0 && self.pred_present == 0 {
            return None;
        }
        let p = self.precision().unwrap_or(0.0);
        let r = self.recall().unwrap_or(0.0);
        if p + r == 0.0 {
            Some(0.0)
        } else {
            Some(2.0 * p * r / (p + r))
        }
    }
}

fn ratio(num: u64, den: u64) -> Option<f64> {
    if den == 0 {
        None
    } else {
        Some(num as f64 / den as f64)
    }
}

/// Running tallies for one hardness tier (or the overall pool).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierCounts {
    pub count: u64,
    pub exact_matches: u64,
    pub exec_attempted: u64,
    pub exec_matches: u64,
    categories: [CategoryCounts; Category::ALL.len()],
}

impl TierCounts {
    fn fold(&mut self, result: &MatchResult, exec_matched: Option<bool>) {
        self.count += 1;
        if result.exact {
            self.exact_matches += 1;
        }
        if let Some(matched) = exec_matched {
            self.exec_attempted += 1;
            if matched {
                self.exec_matches += 1;
            }
        }
        for (cat, score) in result.iter() {
            self.categories[cat as usize].fold(score);
        }
    }

    fn merge(&mut self, other: &TierCounts) {
        self.count += other.count;
        self.exact_matches += other.exact_matches;
        self.exec_attempted += other.exec_attempted;
        self.exec_matches += other.exec_matches;
        for (mine, theirs) in self.categories.iter_mut().zip(&other.categories) {
            mine.merge(theirs);
        }
    }

    pub fn category(&self, cat: Category) -> &CategoryCounts {
        &self.categories[cat as usize]
    }
}

/// Order-insensitive accumulator for evaluation outcomes.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    overall: TierCounts,
    tiers: [TierCounts; Hardness::ALL.len()],
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one evaluated example. `exec_matched` is `None` when
    /// execution verification was disabled or skipped for the example.
    pub fn fold(&mut self, hardness: Hardness, result: &MatchResult, exec_matched: Option<bool>) {
        self.overall.fold(result, exec_matched);
        self.tiers[hardness as usize].fold(result, exec_matched);
    }

    /// Combines the tallies of a partially folded aggregator into this
    /// one. Merging is commutative and associative.
    pub fn merge(&mut self, other: &Aggregator) {
        self.overall.merge(&other.overall);
        for (mine, theirs) in self.tiers.iter_mut().zip(&other.tiers) {
            mine.merge(theirs);
        }
    }

    pub fn total(&self) -> u64 {
        self.overall.count
    }

    pub fn finalize(&self) -> EvaluationReport {
        EvaluationReport {
            generated_at: Utc::now(),
            total: self.overall.count,
            overall: TierReport::from_counts("all", &self.overall),
            tiers: Hardness::ALL
                .iter()
                .map(|&h| TierReport::from_counts(h.name(), &self.tiers[h as usize]))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub generated_at: DateTime<Utc>,
    pub total: u64,
    pub overall: TierReport,
    pub tiers: Vec<TierReport>,
}

/// Metrics for one tier. Ratio fields are `None` (JSON `null`) when the
/// tier is empty or execution was never attempted, never a fake zero.
#[derive(Debug, Clone, Serialize)]
pub struct TierReport {
    pub tier: String,
    pub count: u64,
    pub exact_match: Option<f64>,
    pub execution_match: Option<f64>,
    pub partial_match_f1: Option<f64>,
    pub categories: Vec<CategoryReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub category: &'static str,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
}

impl TierReport {
    fn from_counts(tier: &str, counts: &TierCounts) -> Self {
        let categories: Vec<CategoryReport> = Category::ALL
            .iter()
            .map(|&cat| {
                let c = counts.category(cat);
                CategoryReport {
                    category: cat.name(),
                    precision: c.precision(),
                    recall: c.recall(),
                    f1: c.f1(),
                }
            })
            .collect();
        // Mean of the per-category F1 scores, over the categories that
        // appeared at least once on either side.
        let f1s: Vec<f64> = categories.iter().filter_map(|c| c.f1).collect();
        let partial_match_f1 = if f1s.is_empty() {
            None
        } else {
            Some(f1s.iter().sum::<f64>() / f1s.len() as f64)
        };
        TierReport {
            tier: tier.to_string(),
            count: counts.count,
            exact_match: ratio(counts.exact_matches, counts.count),
            execution_match: ratio(counts.exec_matches, counts.exec_attempted),
            partial_match_f1,
            categories,
        }
    }
}
