//! SQL tokenizer. Keywords are matched case-insensitively; identifiers
//! and string literals keep the case they were written with.

use std::iter::Peekable;
use std::str::CharIndices;

use super::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    From,
    Where,
    Group,
    By,
    Having,
    Order,
    Limit,
    Join,
    Inner,
    On,
    As,
    And,
    Or,
    Not,
    In,
    Like,
    Between,
    Distinct,
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Union,
    Intersect,
    Except,
    All,
    Asc,
    Desc,
    Is,
    Null,
    True,
    False,
}

impl Keyword {
    fn from_ident(ident: &str) -> Option<Keyword> {
        Some(match ident.to_ascii_uppercase().as_str() {
            "SELECT" => Keyword::Select,
            "FROM" => Keyword::From,
            "WHERE" => Keyword::Where,
            "GROUP" => Keyword::Group,
            "BY" => Keyword::By,
            "HAVING" => Keyword::Having,
            "ORDER" => Keyword::Order,
            "LIMIT" => Keyword::Limit,
            "JOIN" => Keyword::Join,
            "INNER" => Keyword::Inner,
            "ON" => Keyword::On,
            "AS" => Keyword::As,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "NOT" => Keyword::Not,
            "IN" => Keyword::In,
            "LIKE" => Keyword::Like,
            "BETWEEN" => Keyword::Between,
            "DISTINCT" => Keyword::Distinct,
            "COUNT" => Keyword::Count,
            "SUM" => Keyword::Sum,
            "AVG" => Keyword::Avg,
            "MIN" => Keyword::Min,
            "MAX" => Keyword::Max,
            "UNION" => Keyword::Union,
            "INTERSECT" => Keyword::Intersect,
            "EXCEPT" => Keyword::Except,
            "ALL" => Keyword::All,
            "ASC" => Keyword::Asc,
            "DESC" => Keyword::Desc,
            "IS" => Keyword::Is,
            "NULL" => Keyword::Null,
            "TRUE" => Keyword::True,
            "FALSE" => Keyword::False,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::Group => "GROUP",
            Keyword::By => "BY",
            Keyword::Having => "HAVING",
            Keyword::Order => "ORDER",
            Keyword::Limit => "LIMIT",
            Keyword::Join => "JOIN",
            Keyword::Inner => "INNER",
            Keyword::On => "ON",
            Keyword::As => "AS",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::In => "IN",
            Keyword::Like => "LIKE",
            Keyword::Between => "BETWEEN",
            Keyword::Distinct => "DISTINCT",
            Keyword::Count => "COUNT",
            Keyword::Sum => "SUM",
            Keyword::Avg => "AVG",
            Keyword::Min => "MIN",
            Keyword::Max => "MAX",
            Keyword::Union => "UNION",
            Keyword::Intersect => "INTERSECT",
            Keyword::Except => "EXCEPT",
            Keyword::All => "ALL",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::Is => "IS",
            Keyword::Null => "NULL",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Keyword(Keyword),
    Ident(String),
    Number(String),
    String(String),
    Period,
    Comma,
    OpenParen,
    CloseParen,
    Asterisk,
    Plus,
    Minus,
    Slash,
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    Semicolon,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Keyword(k) => write!(f, "{}", k.name()),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Number(s) => write!(f, "{}", s),
            Token::String(s) => write!(f, "'{}'", s),
            Token::Period => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::OpenParen => write!(f, "("),
            Token::CloseParen => write!(f, ")"),
            Token::Asterisk => write!(f, "*"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Slash => write!(f, "/"),
            Token::Equal => write!(f, "="),
            Token::NotEqual => write!(f, "!="),
            Token::LessThan => write!(f, "<"),
            Token::LessOrEqual => write!(f, "<="),
            Token::GreaterThan => write!(f, ">"),
            Token::GreaterOrEqual => write!(f, ">="),
            Token::Semicolon => write!(f, ";"),
        }
    }
}

/// Streaming tokenizer yielding `(byte_position, token)` pairs.
pub struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
    len: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            len: input.len(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    /// Consumes characters while the predicate holds, appending to `out`.
    fn take_while(&mut self, out: &mut String, pred: impl Fn(char) -> bool) {
        while let Some((_, c)) = self.chars.next_if(|(_, c)| pred(*c)) {
            out.push(c);
        }
    }

    fn scan_string(&mut self, pos: usize, quote: char) -> Result<Token, ParseError> {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => {
                    // Doubled quote is an escaped quote character.
                    if self.chars.next_if(|(_, c)| *c == quote).is_some() {
                        value.push(quote);
                    } else {
                        break;
                    }
                }
                Some((_, c)) => value.push(c),
                None => {
                    return Err(ParseError::new(pos, "closing quote", "end of input"));
                }
            }
        }
        // Double quotes delimit identifiers, single quotes string literals.
        if quote == '"' {
            Ok(Token::Ident(value))
        } else {
            Ok(Token::String(value))
        }
    }

    fn scan_number(&mut self, first: char) -> Token {
        let mut value = String::from(first);
        self.take_while(&mut value, |c| c.is_ascii_digit());
        if let Some((_, c)) = self.chars.next_if(|(_, c)| *c == '.') {
            value.push(c);
            self.take_while(&mut value, |c| c.is_ascii_digit());
        }
        if let Some((_, c)) = self.chars.next_if(|(_, c)| *c == 'e' || *c == 'E') {
            value.push(c);
            if let Some((_, c)) = self.chars.next_if(|(_, c)| *c == '+' || *c == '-') {
                value.push(c);
            }
            self.take_while(&mut value, |c| c.is_ascii_digit());
        }
        Token::Number(value)
    }

    fn scan_ident(&mut self, first: char) -> Token {
        let mut value = String::from(first);
        self.take_while(&mut value, |c| c.is_alphanumeric() || c == '_');
        match Keyword::from_ident(&value) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Ident(value),
        }
    }

    fn scan(&mut self) -> Option<Result<(usize, Token), ParseError>> {
        self.skip_whitespace();
        let (pos, c) = self.chars.next()?;
        let token = match c {
            '\'' | '"' => match self.scan_string(pos, c) {
                Ok(token) => token,
                Err(err) => return Some(Err(err)),
            },
            c if c.is_ascii_digit() => self.scan_number(c),
            c if c.is_alphabetic() || c == '_' => self.scan_ident(c),
            '.' => {
                // A leading dot may still start a number, e.g. `.5`.
                if self.chars.peek().is_some_and(|(_, c)| c.is_ascii_digit()) {
                    self.scan_number('.')
                } else {
                    Token::Period
                }
            }
            ',' => Token::Comma,
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            '*' => Token::Asterisk,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '/' => Token::Slash,
            ';' => Token::Semicolon,
            '=' => Token::Equal,
            '!' => {
                if self.chars.next_if(|(_, c)| *c == '=').is_some() {
                    Token::NotEqual
                } else {
                    return Some(Err(ParseError::new(pos, "=", "!")));
                }
            }
            '<' => {
                if self.chars.next_if(|(_, c)| *c == '=').is_some() {
                    Token::LessOrEqual
                } else if self.chars.next_if(|(_, c)| *c == '>').is_some() {
                    Token::NotEqual
                } else {
                    Token::LessThan
                }
            }
            '>' => {
                if self.chars.next_if(|(_, c)| *c == '=').is_some() {
                    Token::GreaterOrEqual
                } else {
                    Token::GreaterThan
                }
            }
            c => {
                return Some(Err(ParseError::new(
                    pos,
                    "a SQL token",
                    &format!("{:?}", c),
                )));
            }
        };
        Some(Ok((pos, token)))
    }

    /// Byte length of the input, used as the error position at EOF.
    pub fn input_len(&self) -> usize {
        self.len
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<(usize, Token), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .map(|r| r.expect("lex error").1)
            .collect()
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            lex("select FROM WhErE"),
            vec![
                Token::Keyword(Keyword::Select),
                Token::Keyword(Keyword::From),
                Token::Keyword(Keyword::Where),
            ]
        );
    }

    #[test]
    fn identifiers_keep_case() {
        assert_eq!(lex("Singer"), vec![Token::Ident("Singer".into())]);
    }

    #[test]
    fn string_literals_keep_case_and_escapes() {
        assert_eq!(lex("'It''s'"), vec![Token::String("It's".into())]);
    }

    #[test]
    fn numbers_and_operators() {
        assert_eq!(
            lex("age >= 20.5"),
            vec![
                Token::Ident("age".into()),
                Token::GreaterOrEqual,
                Token::Number("20.5".into()),
            ]
        );
        assert_eq!(lex("a <> b")[1], Token::NotEqual);
        assert_eq!(lex("a != b")[1], Token::NotEqual);
    }

    #[test]
    fn unterminated_string_reports_position() {
        let err = Lexer::new("x 'abc")
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        assert_eq!(err.position, 2);
    }

    #[test]
    fn rejects_unknown_character() {
        assert!(Lexer::new("a ? b").collect::<Result<Vec<_>, _>>().is_err());
    }
}
