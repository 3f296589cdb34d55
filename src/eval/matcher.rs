//! Per-category comparison of predicted vs. gold component sets.

use super::components::ComponentSet;

/// The scored clause categories. FROM is deliberately absent: join
/// structure feeds resolution and hardness, but is not scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Select,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    SetOp,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Select,
        Category::Where,
        Category::GroupBy,
        Category::Having,
        Category::OrderBy,
        Category::Limit,
        Category::SetOp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Select => "select",
            Category::Where => "where",
            Category::GroupBy => "group_by",
            Category::Having => "having",
            Category::OrderBy => "order_by",
            Category::Limit => "limit",
            Category::SetOp => "set_op",
        }
    }

    fn present(&self, cs: &ComponentSet) -> bool {
        match self {
            Category::Select => !cs.select.is_empty() || cs.select_distinct,
            Category::Where => !cs.where_cond.is_empty(),
            Category::GroupBy => !cs.group_by.is_empty(),
            Category::Having => !cs.having.is_empty(),
            Category::OrderBy => !cs.order_by.is_empty(),
            Category::Limit => cs.limit.is_some(),
            Category::SetOp => cs.set_op.is_some(),
        }
    }

    fn equal(&self, pred: &ComponentSet, gold: &ComponentSet) -> bool {
        match self {
            Category::Select => {
                pred.select_distinct == gold.select_distinct && pred.select == gold.select
            }
            Category::Where => pred.where_cond == gold.where_cond,
            Category::GroupBy => pred.group_by == gold.group_by,
            Category::Having => pred.having == gold.having,
            // Direction sequence is semantically meaningful, so ORDER BY
            // compares as an ordered sequence rather than a set.
            Category::OrderBy => pred.order_by == gold.order_by,
            Category::Limit => pred.limit == gold.limit,
            Category::SetOp => pred.set_op == gold.set_op,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryScore {
    /// Empty on both sides; excluded from partial-match denominators.
    Skipped,
    Match,
    Miss {
        gold_present: bool,
        pred_present: bool,
    },
}

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub exact: bool,
    scores: [CategoryScore; Category::ALL.len()],
}

impl MatchResult {
    pub fn score(&self, category: Category) -> CategoryScore {
        self.scores[category as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, CategoryScore)> + '_ {
        Category::ALL.iter().map(|c| (*c, self.scores[*c as usize]))
    }

    /// The result for a prediction that failed to parse or resolve:
    /// every gold-occupied category is a miss, nothing is a false
    /// positive, and the exact match is false.
    pub fn non_match(gold: &ComponentSet) -> Self {
        let mut scores = [CategoryScore::Skipped; Category::ALL.len()];
        for category in Category::ALL {
            if category.present(gold) {
                scores[category as usize] = CategoryScore::Miss {
                    gold_present: true,
                    pred_present: false,
                };
            }
        }
        Self {
            exact: false,
            scores,
        }
    }
}

/// Scores a predicted component set against gold.
pub fn score(pred: &ComponentSet, gold: &ComponentSet) -> MatchResult {
    let mut scores = [CategoryScore::Skipped; Category::ALL.len()];
    let mut exact = true;
    for category in Category::ALL {
        let gold_present = category.present(gold);
        let pred_present = category.present(pred);
        let score = if !gold_present && !pred_present {
            CategoryScore::Skipped
        } else if category.equal(pred, gold) {
            CategoryScore::Match
        } else {
            exact = false;
            CategoryScore::Miss {
                gold_present,
                pred_present,
            }
        };
        scores[category as usize] = score;
    }
    MatchResult { exact, scores }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::schema::test_fixtures::concert_schema;
    use crate::eval::components::extract;
    use crate::eval::resolve::resolve;
    use crate::sql::parse;

    fn components(sql: &str) -> ComponentSet {
        extract(&resolve(parse(sql).unwrap(), &concert_schema()).unwrap())
    }

    fn score_sql(pred: &str, gold: &str) -> MatchResult {
        score(&components(pred), &components(gold))
    }

    #[test]
    fn identical_queries_match_exactly() {
        let result = score_sql(
            "SELECT name FROM singer WHERE age>20",
            "SELECT name FROM singer WHERE age > 20",
        );
        assert!(result.exact);
        assert_eq!(result.score(Category::Where), CategoryScore::Match);
        assert_eq!(result.score(Category::GroupBy), CategoryScore::Skipped);
    }

    #[test]
    fn different_aggregation_target_misses_select() {
        let result = score_sql("SELECT COUNT(name) FROM singer", "SELECT COUNT(*) FROM singer");
        assert!(!result.exact);
        assert_eq!(
            result.score(Category::Select),
            CategoryScore::Miss {
                gold_present: true,
                pred_present: true
            }
        );
    }

    #[test]
    fn reordered_where_conditions_still_match() {
        let result = score_sql(
            "SELECT name FROM singer WHERE country = 'US' AND age > 20",
            "SELECT name FROM singer WHERE age > 20 AND country = 'US'",
        );
        assert!(result.exact);
    }

    #[test]
    fn implicit_asc_matches_explicit_asc() {
        let result = score_sql(
            "SELECT name FROM singer ORDER BY age ASC",
            "SELECT name FROM singer ORDER BY age",
        );
        assert!(result.exact);
    }

    #[test]
    fn reordered_order_by_is_a_miss() {
        let result = score_sql(
            "SELECT name FROM singer ORDER BY age, name",
            "SELECT name FROM singer ORDER BY name, age",
        );
        assert!(!result.exact);
        assert!(matches!(
            result.score(Category::OrderBy),
            CategoryScore::Miss { .. }
        ));
    }

    #[test]
    fn spurious_predicted_clause_is_a_false_positive_miss() {
        let result = score_sql(
            "SELECT name FROM singer LIMIT 5",
            "SELECT name FROM singer",
        );
        assert!(!result.exact);
        assert_eq!(
            result.score(Category::Limit),
            CategoryScore::Miss {
                gold_present: false,
                pred_present: true
            }
        );
    }

    #[test]
    fn non_match_marks_only_gold_categories() {
        let gold = components("SELECT name FROM singer WHERE age > 20");
        let result = MatchResult::non_match(&gold);
        assert!(!result.exact);
        assert!(matches!(
            result.score(Category::Where),
            CategoryScore::Miss {
                gold_present: true,
                pred_present: false
            }
        ));
        assert_eq!(result.score(Category::Limit), CategoryScore::Skipped);
    }

    #[test]
    fn set_operator_compares_recursively() {
        let result = score_sql(
            "SELECT name FROM singer UNION SELECT T1.name FROM singer AS T1 WHERE age > 20",
            "SELECT name FROM singer UNION SELECT name FROM singer WHERE age > 20.0",
        );
        assert!(result.exact);
    }
}
