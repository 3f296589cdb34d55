//! Recursive-descent parser for the benchmark SQL subset.
//!
//! The parser only checks that the syntax is well-formed; it does not
//! know whether tables or columns exist. Binding references to the
//! schema is the resolver's job.

use std::iter::Peekable;

use super::ast::{
    AggFunc, ArithOp, CmpOp, Condition, Direction, Expr, FromClause, Literal, Operand, Predicate,
    Query, RawColumn, SelectClause, SelectItem, SetOperator, TableSource,
};
use super::lexer::{Keyword, Lexer, Token};
use super::ParseError;

pub struct Parser<'a> {
    lexer: Peekable<Lexer<'a>>,
    input_len: usize,
    last_pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let lexer = Lexer::new(input);
        let input_len = lexer.input_len();
        Self {
            lexer: lexer.peekable(),
            input_len,
            last_pos: 0,
        }
    }

    /// Parses the input as a single query, requiring all tokens to be
    /// consumed (a trailing semicolon is allowed).
    pub fn parse(mut self) -> Result<Query<RawColumn>, ParseError> {
        let query = self.parse_query()?;
        self.next_is(&Token::Semicolon);
        if let Some(token) = self.peek()? {
            return Err(ParseError::new(
                self.last_pos,
                "end of input",
                &token.to_string(),
            ));
        }
        Ok(query)
    }

    // Token plumbing ----------------------------------------------------

    fn next_or_eof(&mut self, expected: &str) -> Result<(usize, Token), ParseError> {
        match self.lexer.next() {
            Some(Ok((pos, token))) => {
                self.last_pos = pos;
                Ok((pos, token))
            }
            Some(Err(err)) => Err(err),
            None => Err(ParseError::new(self.input_len, expected, "end of input")),
        }
    }

    fn peek(&mut self) -> Result<Option<Token>, ParseError> {
        match self.lexer.peek() {
            Some(Ok((_, token))) => Ok(Some(token.clone())),
            Some(Err(err)) => Err(err.clone()),
            None => Ok(None),
        }
    }

    /// Consumes the next token if it equals `want`.
    fn next_is(&mut self, want: &Token) -> bool {
        if matches!(self.lexer.peek(), Some(Ok((_, token))) if token == want) {
            let _ = self.next_or_eof("");
            return true;
        }
        false
    }

    fn next_is_keyword(&mut self, keyword: Keyword) -> bool {
        self.next_is(&Token::Keyword(keyword))
    }

    fn expect(&mut self, want: Token) -> Result<(), ParseError> {
        let expected = want.to_string();
        match self.next_or_eof(&expected)? {
            (_, token) if token == want => Ok(()),
            (pos, token) => Err(ParseError::new(pos, &expected, &token.to_string())),
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        self.expect(Token::Keyword(keyword))
    }

    fn next_ident(&mut self) -> Result<String, ParseError> {
        match self.next_or_eof("an identifier")? {
            (_, Token::Ident(name)) => Ok(name),
            (pos, token) => Err(ParseError::new(pos, "an identifier", &token.to_string())),
        }
    }

    fn unexpected(&mut self, expected: &str) -> ParseError {
        match self.next_or_eof(expected) {
            Ok((pos, token)) => ParseError::new(pos, expected, &token.to_string()),
            Err(err) => err,
        }
    }

    // Query structure ---------------------------------------------------

    fn parse_query(&mut self) -> Result<Query<RawColumn>, ParseError> {
        let mut query = self.parse_query_body()?;
        if let Some(op) = self.parse_set_operator() {
            let right = self.parse_query()?;
            query.set_op = Some((op, Box::new(right)));
        }
        Ok(query)
    }

    fn parse_set_operator(&mut self) -> Option<SetOperator> {
        if self.next_is_keyword(Keyword::Union) {
            if self.next_is_keyword(Keyword::All) {
                return Some(SetOperator::UnionAll);
            }
            return Some(SetOperator::Union);
        }
        if self.next_is_keyword(Keyword::Intersect) {
            return Some(SetOperator::Intersect);
        }
        if self.next_is_keyword(Keyword::Except) {
            return Some(SetOperator::Except);
        }
        None
    }

    fn parse_query_body(&mut self) -> Result<Query<RawColumn>, ParseError> {
        self.expect_keyword(Keyword::Select)?;
        let distinct = self.next_is_keyword(Keyword::Distinct);
        let mut items = Vec::new();
        loop {
            items.push(self.parse_select_item()?);
            if !self.next_is(&Token::Comma) {
                break;
            }
        }
        let from = self.parse_from_clause()?;
        let r#where = self.parse_where_clause(Keyword::Where)?;
        let group_by = self.parse_group_by_clause()?;
        let having = self.parse_where_clause(Keyword::Having)?;
        let order_by = self.parse_order_by_clause()?;
        let limit = self.parse_limit_clause()?;
        Ok(Query {
            select: SelectClause { distinct, items },
            from,
            r#where,
            group_by,
            having,
            order_by,
            limit,
            set_op: None,
        })
    }

    fn parse_select_item(&mut self) -> Result<SelectItem<RawColumn>, ParseError> {
        let expr = self.parse_expr()?;
        let alias = if self.next_is_keyword(Keyword::As) {
            Some(self.next_ident()?)
        } else {
            None
        };
        Ok(SelectItem { expr, alias })
    }

    fn parse_from_clause(&mut self) -> Result<FromClause<RawColumn>, ParseError> {
        let mut from = FromClause {
            sources: Vec::new(),
            on: Vec::new(),
        };
        if !self.next_is_keyword(Keyword::From) {
            return Ok(from);
        }
        from.sources.push(self.parse_table_source()?);
        loop {
            if self.next_is(&Token::Comma) {
                from.sources.push(self.parse_table_source()?);
                continue;
            }
            let joined = if self.next_is_keyword(Keyword::Join) {
                true
            } else if self.next_is_keyword(Keyword::Inner) {
                self.expect_keyword(Keyword::Join)?;
                true
            } else {
                false
            };
            if !joined {
                break;
            }
            from.sources.push(self.parse_table_source()?);
            if self.next_is_keyword(Keyword::On) {
                loop {
                    from.on.push(self.parse_predicate()?);
                    if !self.next_is_keyword(Keyword::And) {
                        break;
                    }
                }
            }
        }
        Ok(from)
    }

    fn parse_table_source(&mut self) -> Result<TableSource<RawColumn>, ParseError> {
        if self.next_is(&Token::OpenParen) {
            let query = self.parse_query()?;
            self.expect(Token::CloseParen)?;
            let alias = if self.next_is_keyword(Keyword::As) {
                Some(self.next_ident()?)
            } else if matches!(self.peek()?, Some(Token::Ident(_))) {
                Some(self.next_ident()?)
            } else {
                None
            };
            return Ok(TableSource::Subquery {
                query: Box::new(query),
                alias,
            });
        }
        let name = self.next_ident()?;
        let alias = if self.next_is_keyword(Keyword::As) {
            Some(self.next_ident()?)
        } else if matches!(self.peek()?, Some(Token::Ident(_))) {
            Some(self.next_ident()?)
        } else {
            None
        };
        Ok(TableSource::Table { name, alias })
    }

    /// Parses a WHERE or HAVING clause, if present.
    fn parse_where_clause(
        &mut self,
        keyword: Keyword,
    ) -> Result<Option<Condition<RawColumn>>, ParseError> {
        if !self.next_is_keyword(keyword) {
            return Ok(None);
        }
        Ok(Some(self.parse_condition()?))
    }

    fn parse_group_by_clause(&mut self) -> Result<Vec<RawColumn>, ParseError> {
        if !self.next_is_keyword(Keyword::Group) {
            return Ok(Vec::new());
        }
        self.expect_keyword(Keyword::By)?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_ref()?);
            if !self.next_is(&Token::Comma) {
                break;
            }
        }
        Ok(columns)
    }

    fn parse_order_by_clause(
        &mut self,
    ) -> Result<Vec<(Expr<RawColumn>, Direction)>, ParseError> {
        if !self.next_is_keyword(Keyword::Order) {
            return Ok(Vec::new());
        }
        self.expect_keyword(Keyword::By)?;
        let mut order_by = Vec::new();
        loop {
            let expr = self.parse_expr()?;
            // ASC is the implicit default direction.
            let direction = if self.next_is_keyword(Keyword::Desc) {
                Direction::Desc
            } else {
                self.next_is_keyword(Keyword::Asc);
                Direction::Asc
            };
            order_by.push((expr, direction));
            if !self.next_is(&Token::Comma) {
                break;
            }
        }
        Ok(order_by)
    }

    fn parse_limit_clause(&mut self) -> Result<Option<u64>, ParseError> {
        if !self.next_is_keyword(Keyword::Limit) {
            return Ok(None);
        }
        match self.next_or_eof("an integer")? {
            (pos, Token::Number(value)) => value
                .parse::<u64>()
                .map(Some)
                .map_err(|_| ParseError::new(pos, "an integer", &value)),
            (pos, token) => Err(ParseError::new(pos, "an integer", &token.to_string())),
        }
    }

    // Conditions --------------------------------------------------------

    /// Parses a condition tree. AND binds tighter than OR.
    fn parse_condition(&mut self) -> Result<Condition<RawColumn>, ParseError> {
        let mut condition = self.parse_condition_and()?;
        while self.next_is_keyword(Keyword::Or) {
            let rhs = self.parse_condition_and()?;
            condition = Condition::Or(Box::new(condition), Box::new(rhs));
        }
        Ok(condition)
    }

    fn parse_condition_and(&mut self) -> Result<Condition<RawColumn>, ParseError> {
        let mut condition = self.parse_condition_atom()?;
        while self.next_is_keyword(Keyword::And) {
            let rhs = self.parse_condition_atom()?;
            condition = Condition::And(Box::new(condition), Box::new(rhs));
        }
        Ok(condition)
    }

    fn parse_condition_atom(&mut self) -> Result<Condition<RawColumn>, ParseError> {
        // An opening parenthesis here groups conditions; parenthesized
        // arithmetic on a predicate's left side is outside the subset.
        if matches!(self.peek()?, Some(Token::OpenParen)) {
            self.next_or_eof("(")?;
            let condition = self.parse_condition()?;
            self.expect(Token::CloseParen)?;
            return Ok(condition);
        }
        Ok(Condition::Pred(self.parse_predicate()?))
    }

    fn parse_predicate(&mut self) -> Result<Predicate<RawColumn>, ParseError> {
        let lhs = self.parse_expr()?;
        let mut negated = self.next_is_keyword(Keyword::Not);

        if self.next_is_keyword(Keyword::Between) {
            let low = Operand::Expr(self.parse_expr()?);
            self.expect_keyword(Keyword::And)?;
            let high = Operand::Expr(self.parse_expr()?);
            return Ok(Predicate {
                negated,
                lhs,
                op: CmpOp::Between,
                rhs: low,
                rhs2: Some(high),
            });
        }
        if self.next_is_keyword(Keyword::In) {
            self.expect(Token::OpenParen)?;
            let rhs = if matches!(self.peek()?, Some(Token::Keyword(Keyword::Select))) {
                Operand::Subquery(Box::new(self.parse_query()?))
            } else {
                let mut values = Vec::new();
                loop {
                    values.push(self.parse_literal()?);
                    if !self.next_is(&Token::Comma) {
                        break;
                    }
                }
                Operand::List(values)
            };
            self.expect(Token::CloseParen)?;
            return Ok(Predicate {
                negated,
                lhs,
                op: CmpOp::In,
                rhs,
                rhs2: None,
            });
        }
        if self.next_is_keyword(Keyword::Like) {
            let rhs = Operand::Expr(self.parse_expr()?);
            return Ok(Predicate {
                negated,
                lhs,
                op: CmpOp::Like,
                rhs,
                rhs2: None,
            });
        }
        if negated {
            // NOT only prefixes IN / LIKE / BETWEEN in this subset.
            return Err(self.unexpected("IN, LIKE or BETWEEN"));
        }
        if self.next_is_keyword(Keyword::Is) {
            negated = self.next_is_keyword(Keyword::Not);
            self.expect_keyword(Keyword::Null)?;
            return Ok(Predicate {
                negated,
                lhs,
                op: CmpOp::Is,
                rhs: Operand::Expr(Expr::Literal(Literal::Null)),
                rhs2: None,
            });
        }

        let op = match self.next_or_eof("a comparison operator")? {
            (_, Token::Equal) => CmpOp::Eq,
            (_, Token::NotEqual) => CmpOp::Ne,
            (_, Token::LessThan) => CmpOp::Lt,
            (_, Token::LessOrEqual) => CmpOp::Le,
            (_, Token::GreaterThan) => CmpOp::Gt,
            (_, Token::GreaterOrEqual) => CmpOp::Ge,
            (pos, token) => {
                return Err(ParseError::new(
                    pos,
                    "a comparison operator",
                    &token.to_string(),
                ));
            }
        };
        let rhs = self.parse_operand()?;
        Ok(Predicate {
            negated: false,
            lhs,
            op,
            rhs,
            rhs2: None,
        })
    }

    /// Parses a comparison right side: a parenthesized subquery, a
    /// parenthesized scalar, or a plain expression.
    fn parse_operand(&mut self) -> Result<Operand<RawColumn>, ParseError> {
        if self.next_is(&Token::OpenParen) {
            let operand = if matches!(self.peek()?, Some(Token::Keyword(Keyword::Select))) {
                Operand::Subquery(Box::new(self.parse_query()?))
            } else {
                Operand::Expr(self.parse_expr()?)
            };
            self.expect(Token::CloseParen)?;
            return Ok(operand);
        }
        Ok(Operand::Expr(self.parse_expr()?))
    }

    // Expressions -------------------------------------------------------

    fn parse_expr(&mut self) -> Result<Expr<RawColumn>, ParseError> {
        let mut expr = self.parse_term()?;
        loop {
            let op = if self.next_is(&Token::Plus) {
                ArithOp::Add
            } else if self.next_is(&Token::Minus) {
                ArithOp::Sub
            } else {
                break;
            };
            let rhs = self.parse_term()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr<RawColumn>, ParseError> {
        let mut expr = self.parse_factor()?;
        loop {
            let op = if self.next_is(&Token::Asterisk) {
                ArithOp::Mul
            } else if self.next_is(&Token::Slash) {
                ArithOp::Div
            } else {
                break;
            };
            let rhs = self.parse_factor()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Expr<RawColumn>, ParseError> {
        if self.next_is(&Token::Minus) {
            return match self.parse_factor()? {
                Expr::Literal(Literal::Number(n)) => {
                    Ok(Expr::Literal(Literal::Number(format!("-{}", n))))
                }
                _ => Err(ParseError::new(
                    self.last_pos,
                    "a numeric literal after -",
                    "an expression",
                )),
            };
        }
        match self.next_or_eof("an expression")? {
            (_, Token::Number(value)) => Ok(Expr::Literal(Literal::Number(value))),
            (_, Token::String(value)) => Ok(Expr::Literal(Literal::String(value))),
            (_, Token::Asterisk) => Ok(Expr::Wildcard(None)),
            (_, Token::Keyword(Keyword::Null)) => Ok(Expr::Literal(Literal::Null)),
            (_, Token::Keyword(Keyword::True)) => Ok(Expr::Literal(Literal::Boolean(true))),
            (_, Token::Keyword(Keyword::False)) => Ok(Expr::Literal(Literal::Boolean(false))),
            (_, Token::OpenParen) => {
                let expr = self.parse_expr()?;
                self.expect(Token::CloseParen)?;
                Ok(expr)
            }
            (_, Token::Keyword(keyword)) if agg_func(keyword).is_some() => {
                let func = agg_func(keyword).unwrap();
                self.expect(Token::OpenParen)?;
                let distinct = self.next_is_keyword(Keyword::Distinct);
                let arg = if self.next_is(&Token::Asterisk) {
                    Expr::Wildcard(None)
                } else {
                    self.parse_expr()?
                };
                self.expect(Token::CloseParen)?;
                Ok(Expr::Agg {
                    func,
                    distinct,
                    arg: Box::new(arg),
                })
            }
            (_, Token::Ident(name)) => {
                if self.next_is(&Token::Period) {
                    if self.next_is(&Token::Asterisk) {
                        return Ok(Expr::Wildcard(Some(name)));
                    }
                    let column = self.next_ident()?;
                    return Ok(Expr::Column(RawColumn {
                        table: Some(name),
                        name: column,
                    }));
                }
                Ok(Expr::Column(RawColumn { table: None, name }))
            }
            (pos, token) => Err(ParseError::new(pos, "an expression", &token.to_string())),
        }
    }

    fn parse_column_ref(&mut self) -> Result<RawColumn, ParseError> {
        let name = self.next_ident()?;
        if self.next_is(&Token::Period) {
            let column = self.next_ident()?;
            return Ok(RawColumn {
                table: Some(name),
                name: column,
            });
        }
        Ok(RawColumn { table: None, name })
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let negative = self.next_is(&Token::Minus);
        match self.next_or_eof("a literal")? {
            (_, Token::Number(value)) if negative => Ok(Literal::Number(format!("-{}", value))),
            (_, Token::Number(value)) => Ok(Literal::Number(value)),
            (pos, token) if negative => {
                Err(ParseError::new(pos, "a numeric literal", &token.to_string()))
            }
            (_, Token::String(value)) => Ok(Literal::String(value)),
            (_, Token::Keyword(Keyword::Null)) => Ok(Literal::Null),
            (_, Token::Keyword(Keyword::True)) => Ok(Literal::Boolean(true)),
            (_, Token::Keyword(Keyword::False)) => Ok(Literal::Boolean(false)),
            (pos, token) => Err(ParseError::new(pos, "a literal", &token.to_string())),
        }
    }
}

fn agg_func(keyword: Keyword) -> Option<AggFunc> {
    Some(match keyword {
        Keyword::Count => AggFunc::Count,
        Keyword::Sum => AggFunc::Sum,
        Keyword::Avg => AggFunc::Avg,
        Keyword::Min => AggFunc::Min,
        Keyword::Max => AggFunc::Max,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;

    #[test]
    fn parses_simple_select() {
        let query = parse("SELECT name FROM singer WHERE age > 20").unwrap();
        assert_eq!(query.select.items.len(), 1);
        assert_eq!(
            query.select.items[0].expr,
            Expr::Column(RawColumn {
                table: None,
                name: "name".into()
            })
        );
        assert!(query.r#where.is_some());
        assert!(query.set_op.is_none());
    }

    #[test]
    fn whitespace_and_keyword_case_do_not_matter() {
        let a = parse("SELECT name FROM singer WHERE age > 20").unwrap();
        let b = parse("select name from singer where age>20").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let query = parse("SELECT a FROM t WHERE x = 1 OR y = 2 AND z = 3").unwrap();
        match query.r#where.unwrap() {
            Condition::Or(lhs, rhs) => {
                assert!(matches!(*lhs, Condition::Pred(_)));
                assert!(matches!(*rhs, Condition::And(_, _)));
            }
            other => panic!("expected OR at the root, got {:?}", other),
        }
    }

    #[test]
    fn parentheses_override_precedence() {
        let query = parse("SELECT a FROM t WHERE (x = 1 OR y = 2) AND z = 3").unwrap();
        match query.r#where.unwrap() {
            Condition::And(lhs, _) => assert!(matches!(*lhs, Condition::Or(_, _))),
            other => panic!("expected AND at the root, got {:?}", other),
        }
    }

    #[test]
    fn parses_aggregations_and_distinct() {
        let query = parse("SELECT COUNT(DISTINCT name), avg(age) FROM singer").unwrap();
        assert!(matches!(
            &query.select.items[0].expr,
            Expr::Agg { func: AggFunc::Count, distinct: true, .. }
        ));
        assert!(matches!(
            &query.select.items[1].expr,
            Expr::Agg { func: AggFunc::Avg, distinct: false, .. }
        ));
    }

    #[test]
    fn parses_join_with_on_conditions() {
        let query = parse(
            "SELECT T1.name FROM singer AS T1 JOIN concert AS T2 ON T1.id = T2.singer_id",
        )
        .unwrap();
        assert_eq!(query.from.sources.len(), 2);
        assert_eq!(query.from.on.len(), 1);
    }

    #[test]
    fn parses_comma_join() {
        let query = parse("SELECT a.x FROM a, b WHERE a.id = b.id").unwrap();
        assert_eq!(query.from.sources.len(), 2);
    }

    #[test]
    fn parses_nested_subquery_operand() {
        let query =
            parse("SELECT name FROM singer WHERE age > (SELECT AVG(age) FROM singer)").unwrap();
        let Condition::Pred(pred) = query.r#where.unwrap() else {
            panic!("expected a predicate");
        };
        assert!(matches!(pred.rhs, Operand::Subquery(_)));
    }

    #[test]
    fn parses_deeply_nested_subqueries() {
        let sql = "SELECT a FROM t WHERE x IN (SELECT a FROM t WHERE x IN (SELECT a FROM t WHERE y = 1))";
        let query = parse(sql).unwrap();
        let Condition::Pred(pred) = query.r#where.unwrap() else {
            panic!("expected a predicate");
        };
        let Operand::Subquery(inner) = pred.rhs else {
            panic!("expected a subquery");
        };
        assert!(inner.r#where.is_some());
    }

    #[test]
    fn parses_in_list_between_and_like() {
        let query = parse(
            "SELECT a FROM t WHERE x IN (1, 2, 3) AND y BETWEEN 1 AND 10 AND z NOT LIKE '%a%'",
        )
        .unwrap();
        assert!(query.r#where.is_some());
    }

    #[test]
    fn parses_set_operator() {
        let query = parse("SELECT a FROM t UNION SELECT b FROM u").unwrap();
        let (op, right) = query.set_op.unwrap();
        assert_eq!(op, SetOperator::Union);
        assert!(right.set_op.is_none());
    }

    #[test]
    fn asc_is_the_implicit_order_direction() {
        let a = parse("SELECT name FROM singer ORDER BY age").unwrap();
        let b = parse("SELECT name FROM singer ORDER BY age ASC").unwrap();
        assert_eq!(a, b);
        let c = parse("SELECT name FROM singer ORDER BY age DESC").unwrap();
        assert_eq!(c.order_by[0].1, Direction::Desc);
    }

    #[test]
    fn parses_limit_and_subquery_in_from() {
        let query = parse(
            "SELECT sub.n FROM (SELECT COUNT(*) AS n FROM singer GROUP BY country) AS sub LIMIT 5",
        )
        .unwrap();
        assert_eq!(query.limit, Some(5));
        assert!(matches!(
            query.from.sources[0],
            TableSource::Subquery { .. }
        ));
    }

    #[test]
    fn from_subquery_alias_is_optional() {
        let query = parse(
            "SELECT count(*) FROM (SELECT city FROM station WHERE lat > 10 \
             INTERSECT SELECT city FROM station WHERE lat < 2)",
        )
        .unwrap();
        let TableSource::Subquery { query: inner, alias } = &query.from.sources[0] else {
            panic!("expected a derived table");
        };
        assert_eq!(*alias, None);
        assert!(inner.set_op.is_some());
    }

    #[test]
    fn truncated_query_is_a_parse_error() {
        let err = parse("SELECT name FROM").unwrap_err();
        assert_eq!(err.found, "end of input");
    }

    #[test]
    fn reports_position_of_unexpected_token() {
        let err = parse("SELECT FROM t").unwrap_err();
        assert_eq!(err.position, 7);
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("SELECT a FROM t extra nonsense here").is_err());
    }

    #[test]
    fn parses_wildcards_and_arithmetic() {
        let query = parse("SELECT *, T1.*, a + b * 2 FROM t AS T1").unwrap();
        assert_eq!(query.select.items[0].expr, Expr::Wildcard(None));
        assert_eq!(query.select.items[1].expr, Expr::Wildcard(Some("T1".into())));
        assert!(matches!(
            query.select.items[2].expr,
            Expr::Binary { op: ArithOp::Add, .. }
        ));
    }
}
