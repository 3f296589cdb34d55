//! Canonical decomposition of a resolved query into per-clause
//! component sets.
//!
//! Each clause category becomes a set of strongly-typed tuples with
//! derived ordering and equality, so two queries match on a category
//! exactly when their canonical sets are equal. Sets make comparison
//! order-insensitive and collapse duplicates; ORDER BY is the one
//! category kept as a sequence because its order is meaningful.
//! Subqueries are replaced by their own recursively extracted
//! `ComponentSet`, so subquery equality is structural, never textual.

use std::collections::BTreeSet;

use crate::sql::ast::{
    AggFunc, ArithOp, CmpOp, Condition, Direction, Expr, Literal, Operand, Predicate, Query,
    ResolvedColumn, SetOperator,
};

/// A literal in canonical form. Numbers are normalized by value, so
/// `20`, `20.0` and `2e1` compare equal; strings stay verbatim because
/// SQL string literal case is significant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LitKey {
    Number(String),
    Text(String),
    Bool(bool),
    Null,
}

impl LitKey {
    fn from_literal(lit: &Literal) -> Self {
        match lit {
            Literal::Number(raw) => LitKey::Number(canon_number(raw)),
            Literal::String(s) => LitKey::Text(s.clone()),
            Literal::Boolean(b) => LitKey::Bool(*b),
            Literal::Null => LitKey::Null,
        }
    }
}

/// Canonical textual form of a numeric literal's value.
fn canon_number(raw: &str) -> String {
    match raw.parse::<f64>() {
        Ok(value) => value.to_string(),
        Err(_) => raw.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExprKey {
    Column {
        table: String,
        column: String,
    },
    Wildcard(Option<String>),
    Literal(LitKey),
    Agg {
        func: AggFunc,
        distinct: bool,
        arg: Box<ExprKey>,
    },
    Binary {
        op: ArithOp,
        lhs: Box<ExprKey>,
        rhs: Box<ExprKey>,
    },
}

impl ExprKey {
    fn from_expr(expr: &Expr<ResolvedColumn>) -> Self {
        match expr {
            Expr::Column(c) => ExprKey::Column {
                table: c.table.clone(),
                column: c.name.clone(),
            },
            Expr::Wildcard(qualifier) => ExprKey::Wildcard(qualifier.clone()),
            Expr::Literal(lit) => ExprKey::Literal(LitKey::from_literal(lit)),
            Expr::Agg {
                func,
                distinct,
                arg,
            } => ExprKey::Agg {
                func: *func,
                distinct: *distinct,
                arg: Box::new(ExprKey::from_expr(arg)),
            },
            Expr::Binary { op, lhs, rhs } => {
                let mut lhs = Box::new(ExprKey::from_expr(lhs));
                let mut rhs = Box::new(ExprKey::from_expr(rhs));
                // Commutative operators compare operand-order-free.
                if matches!(op, ArithOp::Add | ArithOp::Mul) && lhs > rhs {
                    std::mem::swap(&mut lhs, &mut rhs);
                }
                ExprKey::Binary { op: *op, lhs, rhs }
            }
        }
    }
}

/// One SELECT output in canonical form: `(aggregation, target, distinct)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SelectItemKey {
    pub agg: Option<AggFunc>,
    pub distinct: bool,
    pub target: ExprKey,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum OperandKey {
    Expr(ExprKey),
    Subquery(Box<ComponentSet>),
    /// IN lists compare as sets of literals.
    List(BTreeSet<LitKey>),
}

/// One comparison in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PredKey {
    pub negated: bool,
    pub lhs: ExprKey,
    pub op: CmpOp,
    pub rhs: OperandKey,
    pub rhs2: Option<OperandKey>,
}

/// A condition tree flattened into nested AND/OR sets. Associativity
/// and commutativity of both connectives fall out of set equality, and
/// duplicated conjuncts collapse.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum CondKey {
    Pred(PredKey),
    And(BTreeSet<CondKey>),
    Or(BTreeSet<CondKey>),
}

/// The full canonical decomposition of one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ComponentSet {
    pub select_distinct: bool,
    pub select: BTreeSet<SelectItemKey>,
    pub where_cond: BTreeSet<CondKey>,
    pub group_by: BTreeSet<(String, String)>,
    pub having: BTreeSet<CondKey>,
    pub order_by: Vec<(ExprKey, Direction)>,
    pub limit: Option<u64>,
    pub set_op: Option<(SetOperator, Box<ComponentSet>)>,
}

/// Extracts the canonical component sets from a resolved query.
pub fn extract(query: &Query<ResolvedColumn>) -> ComponentSet {
    ComponentSet {
        select_distinct: query.select.distinct,
        select: query
            .select
            .items
            .iter()
            .map(|item| select_key(&item.expr))
            .collect(),
        where_cond: condition_set(query.r#where.as_ref()),
        group_by: query
            .group_by
            .iter()
            .map(|c| (c.table.clone(), c.name.clone()))
            .collect(),
        having: condition_set(query.having.as_ref()),
        order_by: query
            .order_by
            .iter()
            .map(|(expr, dir)| (ExprKey::from_expr(expr), *dir))
            .collect(),
        limit: query.limit,
        set_op: query
            .set_op
            .as_ref()
            .map(|(op, right)| (*op, Box::new(extract(right)))),
    }
}

fn select_key(expr: &Expr<ResolvedColumn>) -> SelectItemKey {
    match expr {
        Expr::Agg {
            func,
            distinct,
            arg,
        } => SelectItemKey {
            agg: Some(*func),
            distinct: *distinct,
            target: ExprKey::from_expr(arg),
        },
        other => SelectItemKey {
            agg: None,
            distinct: false,
            target: ExprKey::from_expr(other),
        },
    }
}

fn condition_set(condition: Option<&Condition<ResolvedColumn>>) -> BTreeSet<CondKey> {
    let Some(condition) = condition else {
        return BTreeSet::new();
    };
    match cond_key(condition) {
        CondKey::And(set) => set,
        single => BTreeSet::from([single]),
    }
}

fn cond_key(condition: &Condition<ResolvedColumn>) -> CondKey {
    match condition {
        Condition::Pred(pred) => CondKey::Pred(pred_key(pred)),
        Condition::And(_, _) => {
            let mut set = BTreeSet::new();
            flatten(condition, true, &mut set);
            CondKey::And(set)
        }
        Condition::Or(_, _) => {
            let mut set = BTreeSet::new();
            flatten(condition, false, &mut set);
            CondKey::Or(set)
        }
    }
}

/// Collects a chain of the same connective into one set.
fn flatten(condition: &Condition<ResolvedColumn>, conjunction: bool, out: &mut BTreeSet<CondKey>) {
    match condition {
        Condition::And(lhs, rhs) if conjunction => {
            flatten(lhs, conjunction, out);
            flatten(rhs, conjunction, out);
        }
        Condition::Or(lhs, rhs) if !conjunction => {
            flatten(lhs, conjunction, out);
            flatten(rhs, conjunction, out);
        }
        other => {
            out.insert(cond_key(other));
        }
    }
}

fn pred_key(pred: &Predicate<ResolvedColumn>) -> PredKey {
    PredKey {
        negated: pred.negated,
        lhs: ExprKey::from_expr(&pred.lhs),
        op: pred.op,
        rhs: operand_key(&pred.rhs),
        rhs2: pred.rhs2.as_ref().map(operand_key),
    }
}

fn operand_key(operand: &Operand<ResolvedColumn>) -> OperandKey {
    match operand {
        Operand::Expr(expr) => OperandKey::Expr(ExprKey::from_expr(expr)),
        Operand::Subquery(query) => OperandKey::Subquery(Box::new(extract(query))),
        Operand::List(values) => {
            OperandKey::List(values.iter().map(LitKey::from_literal).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::schema::test_fixtures::concert_schema;
    use crate::eval::resolve::resolve;
    use crate::sql::parse;

    fn components(sql: &str) -> ComponentSet {
        extract(&resolve(parse(sql).unwrap(), &concert_schema()).unwrap())
    }

    #[test]
    fn extraction_is_idempotent() {
        let sql = "SELECT name FROM singer WHERE age > 20 ORDER BY name";
        assert_eq!(components(sql), components(sql));
    }

    #[test]
    fn and_conditions_compare_order_free() {
        let a = components("SELECT name FROM singer WHERE age > 20 AND country = 'US'");
        let b = components("SELECT name FROM singer WHERE country = 'US' AND age > 20");
        assert_eq!(a, b);
    }

    #[test]
    fn and_is_not_or() {
        let a = components("SELECT name FROM singer WHERE age > 20 AND country = 'US'");
        let b = components("SELECT name FROM singer WHERE age > 20 OR country = 'US'");
        assert_ne!(a, b);
    }

    #[test]
    fn duplicate_conjuncts_collapse() {
        let a = components("SELECT name FROM singer WHERE age > 20 AND age > 20");
        let b = components("SELECT name FROM singer WHERE age > 20");
        assert_eq!(a, b);
    }

    #[test]
    fn numeric_literals_compare_by_value() {
        let a = components("SELECT name FROM singer WHERE age > 20");
        let b = components("SELECT name FROM singer WHERE age > 20.0");
        let c = components("SELECT name FROM singer WHERE age > 2e1");
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn string_literal_case_is_significant() {
        let a = components("SELECT name FROM singer WHERE country = 'US'");
        let b = components("SELECT name FROM singer WHERE country = 'us'");
        assert_ne!(a, b);
    }

    #[test]
    fn select_items_compare_order_free() {
        let a = components("SELECT name, age FROM singer");
        let b = components("SELECT age, name FROM singer");
        assert_eq!(a.select, b.select);
    }

    #[test]
    fn aliases_do_not_affect_components() {
        let a = components("SELECT T1.name FROM singer AS T1");
        let b = components("SELECT name FROM singer");
        assert_eq!(a, b);
    }

    #[test]
    fn aggregation_target_matters() {
        let a = components("SELECT COUNT(*) FROM singer");
        let b = components("SELECT COUNT(name) FROM singer");
        assert_ne!(a.select, b.select);
    }

    #[test]
    fn subqueries_compare_structurally() {
        let a = components(
            "SELECT name FROM singer WHERE age > (SELECT AVG(age) FROM singer WHERE country = 'US' AND age > 20)",
        );
        let b = components(
            "SELECT name FROM singer WHERE age > (select avg(age) from singer where age > 20.0 and country = 'US')",
        );
        assert_eq!(a, b);
    }

    #[test]
    fn in_list_order_is_irrelevant() {
        let a = components("SELECT name FROM singer WHERE country IN ('US', 'UK')");
        let b = components("SELECT name FROM singer WHERE country IN ('UK', 'US')");
        assert_eq!(a, b);
    }

    #[test]
    fn addition_is_commutative() {
        let a = components("SELECT age + singer_id FROM singer");
        let b = components("SELECT singer_id + age FROM singer");
        assert_eq!(a, b);
    }

    #[test]
    fn equality_is_an_equivalence_relation() {
        let a = components("SELECT name FROM singer WHERE age > 20 AND country = 'US'");
        let b = components("SELECT name FROM singer WHERE country = 'US' AND age > 20");
        let c = components("SELECT name FROM singer WHERE country = 'US' AND age > 2e1");
        assert_eq!(a, a);
        assert_eq!(b, a);
        assert_eq!(b, c);
        assert_eq!(a, c);
    }
}
