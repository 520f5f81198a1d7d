// src/expression.rs
use itertools::Itertools;
use serde_json::Value;
use thiserror::Error;

use crate::comparison::{cmp_values, truthy};
use crate::context::Context;
use crate::parser::{ParseError, Parser};

/// Parentheses and `!` may nest at most this deep.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("`{0}` is not defined")]
    Unresolved(String),
    #[error("type error: {0}")]
    Type(String),
}

impl From<ParseError> for ExprError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::InvalidSyntax(msg) => ExprError::Syntax(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Path(Vec<String>),
    Not(Box<Expr>),
    /// Two or more operands joined by `&&`, kept flat so long chains stay shallow.
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
}

pub fn parse_expr(input: &str) -> Result<Expr, ExprError> {
    let mut p = EParser::new(input);
    let node = p.parse_or()?;
    p.parser.skip_ws();
    if !p.parser.eof() {
        return Err(ExprError::Syntax(format!(
            "unexpected `{}` at offset {}",
            p.parser.rest(),
            p.parser.pos()
        )));
    }
    Ok(node)
}

struct EParser<'a> {
    parser: Parser<'a>,
    depth: usize,
}

impl<'a> EParser<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            parser: Parser::new(s),
            depth: 0,
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut terms = vec![self.parse_and()?];
        loop {
            self.parser.skip_ws();
            if self.parser.consume_str("||") {
                terms.push(self.parse_and()?);
            } else {
                break;
            }
        }
        Ok(chain(terms, Expr::Or))
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut terms = vec![self.parse_compare()?];
        loop {
            self.parser.skip_ws();
            if self.parser.consume_str("&&") {
                terms.push(self.parse_compare()?);
            } else {
                break;
            }
        }
        Ok(chain(terms, Expr::And))
    }

    fn parse_compare(&mut self) -> Result<Expr, ExprError> {
        let left = self.parse_unary()?;
        self.parser.skip_ws();
        let op = self.parse_cmp_op();
        match op {
            Some(op) => {
                let right = self.parse_unary()?;
                Ok(Expr::Cmp(op, Box::new(left), Box::new(right)))
            }
            None => Ok(left),
        }
    }

    fn parse_cmp_op(&mut self) -> Option<CmpOp> {
        // longest spelling first
        let table = [
            ("===", CmpOp::Eq),
            ("!==", CmpOp::Ne),
            ("==", CmpOp::Eq),
            ("!=", CmpOp::Ne),
            ("<=", CmpOp::Lte),
            (">=", CmpOp::Gte),
            ("<", CmpOp::Lt),
            (">", CmpOp::Gt),
        ];
        table
            .into_iter()
            .find(|(lit, _)| self.parser.consume_str(lit))
            .map(|(_, op)| op)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        self.parser.skip_ws();
        if self.parser.consume_char('!') {
            self.enter()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        self.parser.skip_ws();
        let Some(c) = self.parser.peek_char() else {
            return Err(ExprError::Syntax("unexpected end of expression".into()));
        };
        if c == '(' {
            self.parser.consume_char('(');
            self.enter()?;
            let inner = self.parse_or()?;
            self.parser.skip_ws();
            self.parser.expect(')')?;
            self.depth -= 1;
            return Ok(inner);
        }
        if c == '"' || c == '\'' {
            return Ok(Expr::Literal(Value::String(self.parser.parse_quoted_string()?)));
        }
        if c == '-' || c.is_ascii_digit() {
            return Ok(Expr::Literal(self.parser.parse_number_literal()?));
        }
        if self.parser.consume_keyword("true") {
            return Ok(Expr::Literal(Value::Bool(true)));
        }
        if self.parser.consume_keyword("false") {
            return Ok(Expr::Literal(Value::Bool(false)));
        }
        if Parser::is_ident_start(c) {
            let mut segments = vec![self.parser.parse_identifier()?.to_string()];
            while self.parser.consume_char('.') {
                segments.push(self.parser.parse_identifier()?.to_string());
            }
            return Ok(Expr::Path(segments));
        }
        Err(ExprError::Syntax(format!(
            "unexpected `{c}` at offset {}",
            self.parser.pos()
        )))
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::Syntax(format!(
                "expression nests deeper than {MAX_DEPTH} levels"
            )));
        }
        Ok(())
    }
}

fn chain(mut terms: Vec<Expr>, join: fn(Vec<Expr>) -> Expr) -> Expr {
    match terms.len() {
        1 => terms.remove(0),
        _ => join(terms),
    }
}

/// Evaluate AST node → Value
pub fn eval_ast(node: &Expr, ctx: &Context) -> Result<Value, ExprError> {
    match node {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Path(segments) => ctx
            .resolve(segments.as_slice())
            .cloned()
            .ok_or_else(|| ExprError::Unresolved(segments.iter().join("."))),
        Expr::Not(inner) => Ok(Value::Bool(!truthy(&eval_ast(inner, ctx)?))),
        // && and || short-circuit: later operands are never looked up once one decides.
        Expr::And(terms) => {
            for term in terms {
                if !truthy(&eval_ast(term, ctx)?) {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        Expr::Or(terms) => {
            for term in terms {
                if truthy(&eval_ast(term, ctx)?) {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        Expr::Cmp(op, l, r) => {
            let a = eval_ast(l, ctx)?;
            let b = eval_ast(r, ctx)?;
            cmp_values(*op, &a, &b).map(Value::Bool)
        }
    }
}

/// Parse and evaluate `input` against `ctx`.
pub fn evaluate(input: &str, ctx: &Context) -> Result<Value, ExprError> {
    let ast = parse_expr(input)?;
    eval_ast(&ast, ctx)
}

/// Parse and evaluate `input`, coercing the result with truthiness.
pub fn evaluate_condition(input: &str, ctx: &Context) -> Result<bool, ExprError> {
    evaluate(input, ctx).map(|v| truthy(&v))
}
