//! Schema resolution: rewrites a parsed query so every column reference
//! carries its owning table, using the database's schema metadata.
//!
//! Table aliases shadow table names, unqualified columns are inferred
//! when unambiguous across the FROM scope, and operand subqueries may
//! reference the enclosing query's scope (correlation). Identifier
//! matching is case-insensitive; resolved references take the schema's
//! canonical spelling so that differently-cased queries compare equal.

use std::error::Error;
use std::fmt;

use crate::dataset::schema::Schema;
use crate::sql::ast::{
    Condition, Expr, FromClause, Operand, Predicate, Query, RawColumn, ResolvedColumn,
    SelectClause, SelectItem, TableSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveErrorKind {
    Ambiguous,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub reference: String,
}

impl ResolveError {
    fn ambiguous(reference: impl Into<String>) -> Self {
        Self {
            kind: ResolveErrorKind::Ambiguous,
            reference: reference.into(),
        }
    }

    fn unknown(reference: impl Into<String>) -> Self {
        Self {
            kind: ResolveErrorKind::Unknown,
            reference: reference.into(),
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ResolveErrorKind::Ambiguous => {
                write!(f, "ambiguous column reference: {}", self.reference)
            }
            ResolveErrorKind::Unknown => write!(f, "unknown reference: {}", self.reference),
        }
    }
}

impl Error for ResolveError {}

/// One table visible in a query's FROM scope.
struct ScopeEntry {
    alias: Option<String>,
    /// Canonical identity: schema table name, or the subquery alias.
    table: String,
    columns: Vec<String>,
    /// A FROM-subquery that selects `*` exposes columns we cannot
    /// enumerate; such an entry accepts any column name.
    open: bool,
}

impl ScopeEntry {
    fn matches_qualifier(&self, qualifier: &str) -> bool {
        match &self.alias {
            Some(alias) => alias.eq_ignore_ascii_case(qualifier),
            None => self.table.eq_ignore_ascii_case(qualifier),
        }
    }

    /// Canonical column spelling if this table has the column.
    fn column(&self, name: &str) -> Option<String> {
        if let Some(column) = self.columns.iter().find(|c| c.eq_ignore_ascii_case(name)) {
            return Some(column.clone());
        }
        if self.open {
            return Some(name.to_string());
        }
        None
    }
}

struct Scope<'a> {
    entries: Vec<ScopeEntry>,
    parent: Option<&'a Scope<'a>>,
}

impl Scope<'_> {
    fn resolve(&self, raw: &RawColumn) -> Result<ResolvedColumn, ResolveError> {
        if let Some(qualifier) = &raw.table {
            return self.resolve_qualified(qualifier, &raw.name);
        }
        self.resolve_unqualified(&raw.name)
    }

    fn resolve_qualified(
        &self,
        qualifier: &str,
        name: &str,
    ) -> Result<ResolvedColumn, ResolveError> {
        let reference = format!("{}.{}", qualifier, name);
        if let Some(entry) = self.entries.iter().find(|e| e.matches_qualifier(qualifier)) {
            let column = entry
                .column(name)
                .ok_or_else(|| ResolveError::unknown(&reference))?;
            return Ok(ResolvedColumn {
                table: entry.table.clone(),
                name: column,
            });
        }
        match self.parent {
            Some(parent) => parent.resolve_qualified(qualifier, name),
            None => Err(ResolveError::unknown(reference)),
        }
    }

    fn resolve_unqualified(&self, name: &str) -> Result<ResolvedColumn, ResolveError> {
        let mut matches = self
            .entries
            .iter()
            .filter_map(|e| e.column(name).map(|column| (e.table.clone(), column)));
        match (matches.next(), matches.next()) {
            (Some((table, column)), None) => Ok(ResolvedColumn {
                table,
                name: column,
            }),
            (Some(_), Some(_)) => Err(ResolveError::ambiguous(name)),
            (None, _) => match self.parent {
                Some(parent) => parent.resolve_unqualified(name),
                None => Err(ResolveError::unknown(name)),
            },
        }
    }

    /// Resolves a wildcard qualifier (`q.*`) to its canonical table.
    fn resolve_table(&self, qualifier: &str) -> Result<String, ResolveError> {
        if let Some(entry) = self.entries.iter().find(|e| e.matches_qualifier(qualifier)) {
            return Ok(entry.table.clone());
        }
        match self.parent {
            Some(parent) => parent.resolve_table(qualifier),
            None => Err(ResolveError::unknown(format!("{}.*", qualifier))),
        }
    }
}

/// Resolves every column reference in `query` against `schema`.
pub fn resolve(
    query: Query<RawColumn>,
    schema: &Schema,
) -> Result<Query<ResolvedColumn>, ResolveError> {
    resolve_query(query, schema, None)
}

fn resolve_query(
    query: Query<RawColumn>,
    schema: &Schema,
    outer: Option<&Scope<'_>>,
) -> Result<Query<ResolvedColumn>, ResolveError> {
    // Bind the FROM scope first; everything else resolves against it.
    let mut entries = Vec::new();
    let mut sources = Vec::new();
    for source in query.from.sources {
        match source {
            TableSource::Table { name, alias } => {
                let table = schema
                    .table(&name)
                    .ok_or_else(|| ResolveError::unknown(&name))?;
                entries.push(ScopeEntry {
                    alias: alias.clone(),
                    table: table.name.clone(),
                    columns: table.columns.iter().map(|c| c.name.clone()).collect(),
                    open: false,
                });
                sources.push(TableSource::Table {
                    name: table.name.clone(),
                    alias,
                });
            }
            TableSource::Subquery { query, alias } => {
                // FROM subqueries resolve in their own scope.
                let resolved = resolve_query(*query, schema, None)?;
                let (columns, open) = output_columns(&resolved);
                // Unaliased derived tables get a positional name so their
                // output columns still resolve unqualified.
                let name = alias
                    .clone()
                    .unwrap_or_else(|| format!("derived{}", entries.len() + 1));
                entries.push(ScopeEntry {
                    alias: alias.clone(),
                    table: name,
                    columns,
                    open,
                });
                sources.push(TableSource::Subquery {
                    query: Box::new(resolved),
                    alias,
                });
            }
        }
    }
    let scope = Scope {
        entries,
        parent: outer,
    };

    let on = query
        .from
        .on
        .into_iter()
        .map(|p| resolve_predicate(p, schema, &scope))
        .collect::<Result<Vec<_>, _>>()?;
    let items = query
        .select
        .items
        .into_iter()
        .map(|item| {
            Ok(SelectItem {
                expr: resolve_expr(item.expr, schema, &scope)?,
                alias: item.alias,
            })
        })
        .collect::<Result<Vec<_>, ResolveError>>()?;
    let r#where = query
        .r#where
        .map(|c| resolve_condition(c, schema, &scope))
        .transpose()?;
    let group_by = query
        .group_by
        .into_iter()
        .map(|c| scope.resolve(&c))
        .collect::<Result<Vec<_>, _>>()?;
    let having = query
        .having
        .map(|c| resolve_condition(c, schema, &scope))
        .transpose()?;
    let order_by = query
        .order_by
        .into_iter()
        .map(|(expr, dir)| Ok((resolve_expr(expr, schema, &scope)?, dir)))
        .collect::<Result<Vec<_>, ResolveError>>()?;
    let set_op = query
        .set_op
        .map(|(op, right)| {
            // The right side of a set operator is an independent query.
            Ok((op, Box::new(resolve_query(*right, schema, outer)?)))
        })
        .transpose()?;

    Ok(Query {
        select: SelectClause {
            distinct: query.select.distinct,
            items,
        },
        from: FromClause { sources, on },
        r#where,
        group_by,
        having,
        order_by,
        limit: query.limit,
        set_op,
    })
}

fn resolve_condition(
    condition: Condition<RawColumn>,
    schema: &Schema,
    scope: &Scope<'_>,
) -> Result<Condition<ResolvedColumn>, ResolveError> {
    Ok(match condition {
        Condition::And(lhs, rhs) => Condition::And(
            Box::new(resolve_condition(*lhs, schema, scope)?),
            Box::new(resolve_condition(*rhs, schema, scope)?),
        ),
        Condition::Or(lhs, rhs) => Condition::Or(
            Box::new(resolve_condition(*lhs, schema, scope)?),
            Box::new(resolve_condition(*rhs, schema, scope)?),
        ),
        Condition::Pred(pred) => Condition::Pred(resolve_predicate(pred, schema, scope)?),
    })
}

fn resolve_predicate(
    pred: Predicate<RawColumn>,
    schema: &Schema,
    scope: &Scope<'_>,
) -> Result<Predicate<ResolvedColumn>, ResolveError> {
    Ok(Predicate {
        negated: pred.negated,
        lhs: resolve_expr(pred.lhs, schema, scope)?,
        op: pred.op,
        rhs: resolve_operand(pred.rhs, schema, scope)?,
        rhs2: pred
            .rhs2
            .map(|o| resolve_operand(o, schema, scope))
            .transpose()?,
    })
}

fn resolve_operand(
    operand: Operand<RawColumn>,
    schema: &Schema,
    scope: &Scope<'_>,
) -> Result<Operand<ResolvedColumn>, ResolveError> {
    Ok(match operand {
        Operand::Expr(expr) => Operand::Expr(resolve_expr(expr, schema, scope)?),
        // Operand subqueries see the enclosing scope (correlation).
        Operand::Subquery(query) => {
            Operand::Subquery(Box::new(resolve_query(*query, schema, Some(scope))?))
        }
        Operand::List(values) => Operand::List(values),
    })
}

fn resolve_expr(
    expr: Expr<RawColumn>,
    schema: &Schema,
    scope: &Scope<'_>,
) -> Result<Expr<ResolvedColumn>, ResolveError> {
    Ok(match expr {
        Expr::Column(raw) => Expr::Column(scope.resolve(&raw)?),
        Expr::Wildcard(None) => Expr::Wildcard(None),
        Expr::Wildcard(Some(qualifier)) => Expr::Wildcard(Some(scope.resolve_table(&qualifier)?)),
        Expr::Literal(lit) => Expr::Literal(lit),
        Expr::Agg {
            func,
            distinct,
            arg,
        } => Expr::Agg {
            func,
            distinct,
            arg: Box::new(resolve_expr(*arg, schema, scope)?),
        },
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op,
            lhs: Box::new(resolve_expr(*lhs, schema, scope)?),
            rhs: Box::new(resolve_expr(*rhs, schema, scope)?),
        },
    })
}

/// The column names a FROM-subquery exposes to the outer scope, and
/// whether the set is open-ended because of a wildcard.
fn output_columns(query: &Query<ResolvedColumn>) -> (Vec<String>, bool) {
    let mut columns = Vec::new();
    let mut open = false;
    for item in &query.select.items {
        if let Some(alias) = &item.alias {
            columns.push(alias.clone());
            continue;
        }
        match &item.expr {
            Expr::Column(c) => columns.push(c.name.clone()),
            Expr::Wildcard(_) => open = true,
            // Unaliased computed outputs cannot be referenced by name.
            _ => {}
        }
    }
    (columns, open)
}
