//! Difficulty classification of gold queries.
//!
//! Hardness is a pure function of the gold query's structure, so it is
//! a fixed per-example label independent of anything the model did.

use serde::Serialize;

use crate::sql::ast::{Condition, Expr, Operand, Query, TableSource};

/// Feature-count thresholds. A structural feature is one of: WHERE,
/// GROUP BY, ORDER BY, LIMIT, a join, OR, an aggregation, a nested
/// subquery, a set operator; each counts at most once.
const MEDIUM_FEATURES: usize = 2;
const HARD_FEATURES: usize = 3;
const EXTRA_HARD_FEATURES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hardness {
    Easy,
    Medium,
    Hard,
    ExtraHard,
}

impl Hardness {
    pub const ALL: [Hardness; 4] = [
        Hardness::Easy,
        Hardness::Medium,
        Hardness::Hard,
        Hardness::ExtraHard,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Hardness::Easy => "easy",
            Hardness::Medium => "medium",
            Hardness::Hard => "hard",
            Hardness::ExtraHard => "extra_hard",
        }
    }
}

impl std::fmt::Display for Hardness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Classifies a gold query. Set operators, nesting two or more levels
/// deep, or four or more structural features are extra-hard; three
/// features or any nesting is hard; two features medium; else easy.
pub fn classify<C>(query: &Query<C>) -> Hardness {
    let features = count_features(query);
    let depth = nesting_depth(query);
    if query.set_op.is_some() || depth >= 2 || features >= EXTRA_HARD_FEATURES {
        Hardness::ExtraHard
    } else if features >= HARD_FEATURES || depth >= 1 {
        Hardness::Hard
    } else if features >= MEDIUM_FEATURES {
        Hardness::Medium
    } else {
        Hardness::Easy
    }
}

fn count_features<C>(query: &Query<C>) -> usize {
    let conditions = [query.r#where.as_ref(), query.having.as_ref()];
    let features = [
        query.r#where.is_some(),
        !query.group_by.is_empty(),
        !query.order_by.is_empty(),
        query.limit.is_some(),
        query.from.sources.len() > 1,
        conditions.iter().flatten().any(|c| has_or(c)),
        has_aggregation(query),
        has_subquery(query),
        query.set_op.is_some(),
    ];
    features.iter().filter(|f| **f).count()
}

fn has_or<C>(condition: &Condition<C>) -> bool {
    match condition {
        Condition::Or(_, _) => true,
        Condition::And(lhs, rhs) => has_or(lhs) || has_or(rhs),
        Condition::Pred(_) => false,
    }
}

fn has_aggregation<C>(query: &Query<C>) -> bool {
    let in_expr = |expr: &Expr<C>| expr_has_agg(expr);
    query.select.items.iter().any(|item| in_expr(&item.expr))
        || query.order_by.iter().any(|(expr, _)| in_expr(expr))
        || query
            .having
            .as_ref()
            .is_some_and(|c| condition_exprs_any(c, &in_expr))
        || query
            .r#where
            .as_ref()
            .is_some_and(|c| condition_exprs_any(c, &in_expr))
}

fn expr_has_agg<C>(expr: &Expr<C>) -> bool {
    match expr {
        Expr::Agg { .. } => true,
        Expr::Binary { lhs, rhs, .. } => expr_has_agg(lhs) || expr_has_agg(rhs),
        _ => false,
    }
}

fn condition_exprs_any<C>(condition: &Condition<C>, pred: &impl Fn(&Expr<C>) -> bool) -> bool {
    match condition {
        Condition::And(lhs, rhs) | Condition::Or(lhs, rhs) => {
            condition_exprs_any(lhs, pred) || condition_exprs_any(rhs, pred)
        }
        Condition::Pred(p) => {
            pred(&p.lhs)
                || operand_expr_any(&p.rhs, pred)
                || p.rhs2.as_ref().is_some_and(|o| operand_expr_any(o, pred))
        }
    }
}

fn operand_expr_any<C>(operand: &Operand<C>, pred: &impl Fn(&Expr<C>) -> bool) -> bool {
    match operand {
        Operand::Expr(expr) => pred(expr),
        _ => false,
    }
}

fn has_subquery<C>(query: &Query<C>) -> bool {
    nesting_depth(query) > 0
}

/// Maximum subquery nesting depth. The right side of a set operator
/// stays at the same level as its left side.
fn nesting_depth<C>(query: &Query<C>) -> usize {
    let mut depth = 0;
    for source in &query.from.sources {
        if let TableSource::Subquery { query, .. } = source {
            depth = depth.max(1 + nesting_depth(query));
        }
    }
    let conditions = [query.r#where.as_ref(), query.having.as_ref()];
    for condition in conditions.into_iter().flatten() {
        depth = depth.max(condition_depth(condition));
    }
    if let Some((_, right)) = &query.set_op {
        depth = depth.max(nesting_depth(right));
    }
    depth
}

fn condition_depth<C>(condition: &Condition<C>) -> usize {
    match condition {
        Condition::And(lhs, rhs) | Condition::Or(lhs, rhs) => {
            condition_depth(lhs).max(condition_depth(rhs))
        }
        Condition::Pred(p) => {
            let operand = |o: &Operand<C>| match o {
                Operand::Subquery(q) => 1 + nesting_depth(q),
                _ => 0,
            };
            operand(&p.rhs).max(p.rhs2.as_ref().map(operand).unwrap_or(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parse;

    fn classify_sql(sql: &str) -> Hardness {
        classify(&parse(sql).unwrap())
    }

    #[test]
    fn trivial_query_is_easy() {
        assert_eq!(classify_sql("SELECT * FROM singer"), Hardness::Easy);
        assert_eq!(
            classify_sql("SELECT name FROM singer WHERE age > 20"),
            Hardness::Easy
        );
    }

    #[test]
    fn two_features_are_medium() {
        assert_eq!(
            classify_sql("SELECT name FROM singer WHERE age > 20 ORDER BY name"),
            Hardness::Medium
        );
    }

    #[test]
    fn three_features_are_hard() {
        assert_eq!(
            classify_sql("SELECT name FROM singer WHERE age > 20 ORDER BY name LIMIT 3"),
            Hardness::Hard
        );
    }

    #[test]
    fn one_nesting_level_is_hard() {
        assert_eq!(
            classify_sql("SELECT name FROM singer WHERE age > (SELECT AVG(age) FROM singer)"),
            Hardness::Hard
        );
    }

    #[test]
    fn set_operator_is_extra_hard() {
        assert_eq!(
            classify_sql("SELECT name FROM singer UNION SELECT name FROM alumni"),
            Hardness::ExtraHard
        );
    }

    #[test]
    fn nesting_aggregation_and_set_operator_are_extra_hard() {
        let sql = "SELECT COUNT(*) FROM singer WHERE age > (SELECT AVG(age) FROM singer) \
                   UNION SELECT COUNT(*) FROM concert";
        assert_eq!(classify_sql(sql), Hardness::ExtraHard);
    }

    #[test]
    fn four_features_without_nesting_are_extra_hard() {
        let sql = "SELECT COUNT(*) FROM singer WHERE age > 20 GROUP BY country ORDER BY COUNT(*)";
        assert_eq!(classify_sql(sql), Hardness::ExtraHard);
    }

    #[test]
    fn double_nesting_is_extra_hard() {
        let sql = "SELECT name FROM singer WHERE age IN \
                   (SELECT age FROM singer WHERE age > (SELECT AVG(age) FROM singer))";
        assert_eq!(classify_sql(sql), Hardness::ExtraHard);
    }

    #[test]
    fn aggregation_counts_once() {
        assert_eq!(
            classify_sql("SELECT COUNT(*), AVG(age) FROM singer"),
            Hardness::Easy
        );
    }
}
