//! Abstract syntax tree for the benchmark SQL subset.
//!
//! The AST is generic over the column reference type `C`: the parser
//! produces `Query<RawColumn>` (references as written, possibly
//! unqualified), and the schema resolver rewrites it into
//! `Query<ResolvedColumn>` where every reference carries its owning
//! table. Subqueries are owned by their parent slot, so the whole tree
//! is plain owned recursion with no back-pointers.

/// A column reference as written in the query text, before schema
/// resolution. `table` is the qualifier (table name or alias), if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub table: Option<String>,
    pub name: String,
}

/// A column reference bound to its owning table. Both fields use the
/// schema's canonical spelling.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResolvedColumn {
    pub table: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggFunc::Count => "COUNT",
            AggFunc::Sum => "SUM",
            AggFunc::Avg => "AVG",
            AggFunc::Min => "MIN",
            AggFunc::Max => "MAX",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Between,
    In,
    Like,
    Is,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SetOperator {
    Union,
    UnionAll,
    Intersect,
    Except,
}

/// A literal value, kept as written; numeric canonicalization happens
/// during component extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Number(String),
    String(String),
    Boolean(bool),
    Null,
}

/// A scalar expression. Aggregations only appear where the parser
/// allows them (SELECT items, ORDER BY targets, HAVING operands).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<C> {
    Column(C),
    /// `*` or `table.*`, kept symbolic rather than expanded.
    Wildcard(Option<String>),
    Literal(Literal),
    Agg {
        func: AggFunc,
        distinct: bool,
        arg: Box<Expr<C>>,
    },
    Binary {
        op: ArithOp,
        lhs: Box<Expr<C>>,
        rhs: Box<Expr<C>>,
    },
}

/// A comparison operand: a scalar expression, a nested subquery, or a
/// literal list (the right side of IN).
#[derive(Debug, Clone, PartialEq)]
pub enum Operand<C> {
    Expr(Expr<C>),
    Subquery(Box<Query<C>>),
    List(Vec<Literal>),
}

/// A single comparison. BETWEEN uses `rhs2` for the upper bound;
/// `negated` covers NOT IN / NOT LIKE / IS NOT NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate<C> {
    pub negated: bool,
    pub lhs: Expr<C>,
    pub op: CmpOp,
    pub rhs: Operand<C>,
    pub rhs2: Option<Operand<C>>,
}

/// WHERE/HAVING condition tree. AND binds tighter than OR; explicit
/// parentheses override.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition<C> {
    And(Box<Condition<C>>, Box<Condition<C>>),
    Or(Box<Condition<C>>, Box<Condition<C>>),
    Pred(Predicate<C>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableSource<C> {
    Table {
        name: String,
        alias: Option<String>,
    },
    Subquery {
        query: Box<Query<C>>,
        alias: Option<String>,
    },
}

/// FROM clause: the joined sources plus the predicates collected from
/// JOIN .. ON. ON predicates participate in scope resolution and
/// hardness, but are not a scored clause category.
#[derive(Debug, Clone, PartialEq)]
pub struct FromClause<C> {
    pub sources: Vec<TableSource<C>>,
    pub on: Vec<Predicate<C>>,
}

/// One SELECT output expression. The alias is syntax only as far as
/// structural comparison goes, but FROM-subquery outputs are named by
/// it, so the resolver needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem<C> {
    pub expr: Expr<C>,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectClause<C> {
    pub distinct: bool,
    pub items: Vec<SelectItem<C>>,
}

/// One SELECT query, possibly chained to another via a set operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Query<C> {
    pub select: SelectClause<C>,
    pub from: FromClause<C>,
    pub r#where: Option<Condition<C>>,
    pub group_by: Vec<C>,
    pub having: Option<Condition<C>>,
    pub order_by: Vec<(Expr<C>, Direction)>,
    pub limit: Option<u64>,
    pub set_op: Option<(SetOperator, Box<Query<C>>)>,
}

impl<C> Query<C> {
    /// Whether the query's own result is ordered. Used to decide between
    /// sequence and multiset comparison of execution results.
    pub fn is_ordered(&self) -> bool {
        !self.order_by.is_empty()
    }
}
