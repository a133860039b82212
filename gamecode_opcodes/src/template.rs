// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Field templates for group specifications.
//!
//! A template is literal text with `{expr}` interpolations (`{{` and `}}`
//! produce literal braces). Expressions are deliberately small:
//!
//! - integer literals, `'string'` literals and parameter names
//! - `+`, `-`, `*` on integers; `+` also concatenates strings
//! - `==` and `!=`
//! - `cond ? a : b`
//! - indexing into lists and strings: `op_mode[mm]`, `cnv_types[xx][1-d]`
//! - `.upper()` and `.lower()`
//!
//! Names resolve against a [`Namespace`]: the slot's bound wildcard values
//! first, then the group's auxiliary values. Anything that does not resolve is
//! an error; nothing is defaulted.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use serde::Deserialize;

use crate::bitpattern::Param;

/// A value a template expression can produce or index into.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// An explicit hole (e.g. an opcode slot with no mnemonic).
    Null,
    /// An integer.
    Int(i64),
    /// A string.
    Str(String),
    /// A list of values.
    List(Vec<Value>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "integer",
            Self::Str(_) => "string",
            Self::List(_) => "list",
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Int(v) => *v != 0,
            Self::Str(s) => !s.is_empty(),
            Self::List(l) => !l.is_empty(),
        }
    }
}

/// Auxiliary values a group's templates may refer to.
pub type Args = HashMap<Box<str>, Value>;

/// The names visible to one slot's templates.
#[derive(Copy, Clone, Debug)]
pub struct Namespace<'a> {
    params: &'a [Param],
    args: &'a Args,
}

impl<'a> Namespace<'a> {
    /// Layers `params` (the slot's wildcard values) over `args`.
    #[must_use]
    pub fn new(params: &'a [Param], args: &'a Args) -> Self {
        Self { params, args }
    }

    /// Looks up `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Cow<'a, Value>> {
        if let Some(p) = self.params.iter().find(|p| &*p.name == name) {
            return Some(Cow::Owned(Value::Int(i64::from(p.value))));
        }
        self.args.get(name).map(Cow::Borrowed)
    }
}

/// Template parse or evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateError {
    /// The template text is malformed.
    Syntax {
        /// Template text.
        template: Box<str>,
        /// What was wrong.
        message: &'static str,
    },
    /// An expression names a parameter that is not bound.
    Unbound {
        /// Template text.
        template: Box<str>,
        /// The missing name.
        name: Box<str>,
    },
    /// A list or string index is out of range.
    IndexOutOfRange {
        /// Template text.
        template: Box<str>,
        /// Index value.
        index: i64,
        /// Length of the indexed value.
        len: usize,
    },
    /// An operation was applied to a value of the wrong kind.
    TypeMismatch {
        /// Template text.
        template: Box<str>,
        /// Operation.
        op: &'static str,
        /// Kind of the offending value.
        kind: &'static str,
    },
    /// Integer arithmetic overflowed.
    Overflow {
        /// Template text.
        template: Box<str>,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { template, message } => {
                write!(f, "bad template '{template}': {message}")
            }
            Self::Unbound { template, name } => {
                write!(f, "unbound parameter '{name}' in '{template}'")
            }
            Self::IndexOutOfRange {
                template,
                index,
                len,
            } => write!(
                f,
                "index {index} out of range (len {len}) in '{template}'"
            ),
            Self::TypeMismatch {
                template,
                op,
                kind,
            } => write!(f, "cannot apply {op} to a {kind} in '{template}'"),
            Self::Overflow { template } => write!(f, "integer overflow in '{template}'"),
        }
    }
}

impl core::error::Error for TemplateError {}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Eq,
    Ne,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Method {
    Upper,
    Lower,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Expr {
    Int(i64),
    Str(Box<str>),
    Name(Box<str>),
    Neg(Box<Expr>),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Method),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Cond(Box<Expr>, Box<Expr>, Box<Expr>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    Text(Box<str>),
    Expr(Expr),
}

/// A parsed template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    text: Box<str>,
    parts: Vec<Part>,
}

impl Template {
    /// Parses `text`.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let syntax = |message| TemplateError::Syntax {
            template: text.into(),
            message,
        };

        let mut parts = Vec::new();
        let mut lit = String::new();
        let mut rest = text;
        while let Some(ch) = rest.chars().next() {
            match ch {
                '{' if rest.starts_with("{{") => {
                    lit.push('{');
                    rest = &rest[2..];
                }
                '}' if rest.starts_with("}}") => {
                    lit.push('}');
                    rest = &rest[2..];
                }
                '{' => {
                    let end = interpolation_end(rest).ok_or_else(|| syntax("unclosed '{'"))?;
                    if !lit.is_empty() {
                        parts.push(Part::Text(core::mem::take(&mut lit).into_boxed_str()));
                    }
                    let tokens = lex(&rest[1..end]).map_err(syntax)?;
                    let mut p = Parser { tokens, pos: 0 };
                    let expr = p.cond().map_err(syntax)?;
                    if p.pos != p.tokens.len() {
                        return Err(syntax("trailing tokens in expression"));
                    }
                    parts.push(Part::Expr(expr));
                    rest = &rest[end + 1..];
                }
                '}' => return Err(syntax("unmatched '}'")),
                _ => {
                    lit.push(ch);
                    rest = &rest[ch.len_utf8()..];
                }
            }
        }
        if !lit.is_empty() {
            parts.push(Part::Text(lit.into_boxed_str()));
        }
        Ok(Self {
            text: text.into(),
            parts,
        })
    }

    /// The template as written.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Evaluates every interpolation against `ns` and concatenates the result.
    pub fn render(&self, ns: &Namespace<'_>) -> Result<String, TemplateError> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(t) => out.push_str(t),
                Part::Expr(e) => match &*self.eval(e, ns)? {
                    Value::Int(v) => out.push_str(&v.to_string()),
                    Value::Str(s) => out.push_str(s),
                    other => return Err(self.mismatch("interpolation", other)),
                },
            }
        }
        Ok(out)
    }

    fn mismatch(&self, op: &'static str, value: &Value) -> TemplateError {
        TemplateError::TypeMismatch {
            template: self.text.clone(),
            op,
            kind: value.kind(),
        }
    }

    fn int(&self, op: &'static str, value: &Value) -> Result<i64, TemplateError> {
        match value {
            Value::Int(v) => Ok(*v),
            other => Err(self.mismatch(op, other)),
        }
    }

    fn overflow(&self) -> TemplateError {
        TemplateError::Overflow {
            template: self.text.clone(),
        }
    }

    fn eval<'a>(&self, expr: &Expr, ns: &Namespace<'a>) -> Result<Cow<'a, Value>, TemplateError> {
        Ok(match expr {
            Expr::Int(v) => Cow::Owned(Value::Int(*v)),
            Expr::Str(s) => Cow::Owned(Value::Str(s.to_string())),
            Expr::Name(name) => ns.get(name).ok_or_else(|| TemplateError::Unbound {
                template: self.text.clone(),
                name: name.clone(),
            })?,
            Expr::Neg(e) => {
                let v = self.int("'-'", &*self.eval(e, ns)?)?;
                Cow::Owned(Value::Int(v.checked_neg().ok_or_else(|| self.overflow())?))
            }
            Expr::Index(base, index) => {
                let index_value = self.eval(index, ns)?;
                let idx = self.int("indexing", &index_value)?;
                let base = self.eval(base, ns)?;
                let out_of_range = |len| TemplateError::IndexOutOfRange {
                    template: self.text.clone(),
                    index: idx,
                    len,
                };
                match base {
                    Cow::Borrowed(Value::List(items)) => {
                        let i = usize::try_from(idx).map_err(|_| out_of_range(items.len()))?;
                        Cow::Borrowed(items.get(i).ok_or_else(|| out_of_range(items.len()))?)
                    }
                    Cow::Owned(Value::List(mut items)) => {
                        let len = items.len();
                        let i = usize::try_from(idx).map_err(|_| out_of_range(len))?;
                        if i >= len {
                            return Err(out_of_range(len));
                        }
                        Cow::Owned(items.swap_remove(i))
                    }
                    base => match &*base {
                        Value::Str(s) => {
                            let len = s.chars().count();
                            let i = usize::try_from(idx).map_err(|_| out_of_range(len))?;
                            let ch = s.chars().nth(i).ok_or_else(|| out_of_range(len))?;
                            Cow::Owned(Value::Str(ch.to_string()))
                        }
                        other => return Err(self.mismatch("indexing", other)),
                    },
                }
            }
            Expr::Call(e, method) => {
                let v = self.eval(e, ns)?;
                let Value::Str(s) = &*v else {
                    return Err(self.mismatch("a string method", &v));
                };
                Cow::Owned(Value::Str(match method {
                    Method::Upper => s.to_uppercase(),
                    Method::Lower => s.to_lowercase(),
                }))
            }
            Expr::Binary(op, lhs, rhs) => {
                let l = self.eval(lhs, ns)?;
                let r = self.eval(rhs, ns)?;
                Cow::Owned(match (op, &*l, &*r) {
                    (BinOp::Eq, a, b) => Value::Int(i64::from(a == b)),
                    (BinOp::Ne, a, b) => Value::Int(i64::from(a != b)),
                    (BinOp::Add, Value::Str(a), Value::Str(b)) => {
                        let mut s = a.clone();
                        s.push_str(b);
                        Value::Str(s)
                    }
                    (BinOp::Add, a, b) => {
                        let a = self.int("'+'", a)?;
                        let b = self.int("'+'", b)?;
                        Value::Int(a.checked_add(b).ok_or_else(|| self.overflow())?)
                    }
                    (BinOp::Sub, a, b) => {
                        let a = self.int("'-'", a)?;
                        let b = self.int("'-'", b)?;
                        Value::Int(a.checked_sub(b).ok_or_else(|| self.overflow())?)
                    }
                    (BinOp::Mul, a, b) => {
                        let a = self.int("'*'", a)?;
                        let b = self.int("'*'", b)?;
                        Value::Int(a.checked_mul(b).ok_or_else(|| self.overflow())?)
                    }
                })
            }
            Expr::Cond(c, a, b) => {
                if self.eval(c, ns)?.truthy() {
                    self.eval(a, ns)?
                } else {
                    self.eval(b, ns)?
                }
            }
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Tok {
    Int(i64),
    Str(Box<str>),
    Name(Box<str>),
    Punct(&'static str),
}

/// Byte offset of the `}` closing the interpolation that opens `text`.
/// Braces inside string literals do not count.
fn interpolation_end(text: &str) -> Option<usize> {
    let mut quoted = false;
    for (i, ch) in text.char_indices().skip(1) {
        match ch {
            '\'' => quoted = !quoted,
            '}' if !quoted => return Some(i),
            _ => {}
        }
    }
    None
}

fn lex(src: &str) -> Result<Vec<Tok>, &'static str> {
    const PUNCT: [&str; 12] = ["==", "!=", "+", "-", "*", "(", ")", "[", "]", ".", "?", ":"];

    let mut tokens = Vec::new();
    let mut rest = src;
    loop {
        rest = rest.trim_start();
        let Some(ch) = rest.chars().next() else {
            break;
        };
        if ch.is_ascii_digit() {
            let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            let v = rest[..end].parse().map_err(|_| "integer literal too large")?;
            tokens.push(Tok::Int(v));
            rest = &rest[end..];
        } else if ch == '_' || ch.is_ascii_alphabetic() {
            let end = rest
                .find(|c: char| !(c == '_' || c.is_ascii_alphanumeric()))
                .unwrap_or(rest.len());
            tokens.push(Tok::Name(rest[..end].into()));
            rest = &rest[end..];
        } else if ch == '\'' {
            let end = rest[1..].find('\'').ok_or("unterminated string literal")?;
            tokens.push(Tok::Str(rest[1..=end].into()));
            rest = &rest[end + 2..];
        } else if let Some(p) = PUNCT.into_iter().find(|p| rest.starts_with(p)) {
            tokens.push(Tok::Punct(p));
            rest = &rest[p.len()..];
        } else {
            return Err("unexpected character in expression");
        }
    }
    if tokens.is_empty() {
        return Err("empty expression");
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, punct: &str) -> bool {
        if matches!(self.peek(), Some(Tok::Punct(p)) if *p == punct) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, punct: &str, message: &'static str) -> Result<(), &'static str> {
        if self.eat(punct) { Ok(()) } else { Err(message) }
    }

    fn cond(&mut self) -> Result<Expr, &'static str> {
        let c = self.compare()?;
        if !self.eat("?") {
            return Ok(c);
        }
        let a = self.cond()?;
        self.expect(":", "expected ':' in conditional")?;
        let b = self.cond()?;
        Ok(Expr::Cond(Box::new(c), Box::new(a), Box::new(b)))
    }

    fn compare(&mut self) -> Result<Expr, &'static str> {
        let lhs = self.sum()?;
        let op = if self.eat("==") {
            BinOp::Eq
        } else if self.eat("!=") {
            BinOp::Ne
        } else {
            return Ok(lhs);
        };
        let rhs = self.sum()?;
        Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    fn sum(&mut self) -> Result<Expr, &'static str> {
        let mut lhs = self.product()?;
        loop {
            let op = if self.eat("+") {
                BinOp::Add
            } else if self.eat("-") {
                BinOp::Sub
            } else {
                return Ok(lhs);
            };
            let rhs = self.product()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn product(&mut self) -> Result<Expr, &'static str> {
        let mut lhs = self.unary()?;
        while self.eat("*") {
            let rhs = self.unary()?;
            lhs = Expr::Binary(BinOp::Mul, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, &'static str> {
        if self.eat("-") {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, &'static str> {
        let mut e = self.primary()?;
        loop {
            if self.eat("[") {
                let index = self.cond()?;
                self.expect("]", "expected ']'")?;
                e = Expr::Index(Box::new(e), Box::new(index));
            } else if self.eat(".") {
                let method = match self.tokens.get(self.pos) {
                    Some(Tok::Name(n)) if &**n == "upper" => Method::Upper,
                    Some(Tok::Name(n)) if &**n == "lower" => Method::Lower,
                    _ => return Err("unknown method"),
                };
                self.pos += 1;
                self.expect("(", "expected '(' after method name")?;
                self.expect(")", "methods take no arguments")?;
                e = Expr::Call(Box::new(e), method);
            } else {
                return Ok(e);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, &'static str> {
        let tok = self.peek().cloned().ok_or("unexpected end of expression")?;
        self.pos += 1;
        match tok {
            Tok::Int(v) => Ok(Expr::Int(v)),
            Tok::Str(s) => Ok(Expr::Str(s)),
            Tok::Name(n) => Ok(Expr::Name(n)),
            Tok::Punct("(") => {
                let e = self.cond()?;
                self.expect(")", "expected ')'")?;
                Ok(e)
            }
            Tok::Punct(_) => Err("unexpected operator"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::vec;

    fn args() -> Args {
        let mut a = Args::new();
        a.insert("op_mode".into(), Value::Str("ABCD".into()));
        a.insert(
            "op_conv".into(),
            Value::List(vec![
                Value::Str("IF".into()),
                Value::Str("LD".into()),
                Value::Null,
                Value::Str("UD".into()),
            ]),
        );
        a.insert(
            "cnv_types".into(),
            Value::List(vec![
                Value::List(vec![
                    Value::Str("ev_integer".into()),
                    Value::Str("ev_float".into()),
                ]),
                Value::List(vec![
                    Value::Str("ev_long".into()),
                    Value::Str("ev_double".into()),
                ]),
            ]),
        );
        a
    }

    fn params(bound: &[(&str, u32)]) -> Vec<Param> {
        bound
            .iter()
            .map(|(name, value)| Param {
                name: (*name).into(),
                value: *value,
            })
            .collect()
    }

    fn render(text: &str, bound: &[(&str, u32)]) -> Result<String, TemplateError> {
        let a = args();
        let p = params(bound);
        Template::parse(text)?.render(&Namespace::new(&p, &a))
    }

    #[test]
    fn arithmetic_on_bound_values() {
        assert_eq!(render("0, 0, {ss+1}", &[("ss", 0)]).unwrap(), "0, 0, 1");
        assert_eq!(render("{u*2+r}", &[("u", 1), ("r", 1)]).unwrap(), "3");
        assert_eq!(render("{(ss + 1) * 2 - 3}", &[("ss", 3)]).unwrap(), "5");
    }

    #[test]
    fn indexing_and_case() {
        assert_eq!(
            render("OP_LOAD_{op_mode[mm]}_{ss+1}", &[("mm", 2), ("ss", 3)]).unwrap(),
            "OP_LOAD_C_4"
        );
        assert_eq!(
            render("{cnv_types[xx][1-d]}", &[("xx", 1), ("d", 0)]).unwrap(),
            "ev_double"
        );
        assert_eq!(
            render("OP_{op_conv[d*2+x].lower().upper()}", &[("d", 0), ("x", 1)]).unwrap(),
            "OP_LD"
        );
    }

    #[test]
    fn conditional_and_concat() {
        assert_eq!(
            render("{t == 0 ? 'ft' : 'ft' + 't'}", &[("t", 1)]).unwrap(),
            "ftt"
        );
        assert_eq!(render("{t ? 'y' : 'n'}", &[("t", 0)]).unwrap(), "n");
    }

    #[test]
    fn unary_minus() {
        assert_eq!(render("{-ss}", &[("ss", 2)]).unwrap(), "-2");
        assert_eq!(render("{1 - -ss}", &[("ss", 2)]).unwrap(), "3");
    }

    #[test]
    fn braces_inside_string_literals() {
        assert_eq!(render("{t == 0 ? '}' : 'b'}", &[("t", 0)]).unwrap(), "}");
        assert_eq!(render("<{t ? '{' : 'b'}>", &[("t", 0)]).unwrap(), "<b>");
        assert!(matches!(
            Template::parse("{'}"),
            Err(TemplateError::Syntax { .. })
        ));
    }

    #[test]
    fn escaped_braces_are_literal() {
        assert_eq!(render("{{{ss}}}", &[("ss", 2)]).unwrap(), "{2}");
    }

    #[test]
    fn slot_values_shadow_args() {
        assert_eq!(render("{op_mode}", &[("op_mode", 7)]).unwrap(), "7");
    }

    #[test]
    fn unbound_name_is_fatal() {
        assert_eq!(
            render("OP_{ss+1}", &[]).unwrap_err(),
            TemplateError::Unbound {
                template: "OP_{ss+1}".into(),
                name: "ss".into()
            }
        );
    }

    #[test]
    fn out_of_range_index_is_fatal() {
        assert!(matches!(
            render("{op_mode[mm]}", &[("mm", 4)]).unwrap_err(),
            TemplateError::IndexOutOfRange { index: 4, len: 4, .. }
        ));
        assert!(matches!(
            render("{op_conv[0-1]}", &[]).unwrap_err(),
            TemplateError::IndexOutOfRange { index: -1, .. }
        ));
    }

    #[test]
    fn null_entries_do_not_render() {
        assert!(matches!(
            render("{op_conv[2]}", &[]).unwrap_err(),
            TemplateError::TypeMismatch { kind: "null", .. }
        ));
        assert!(matches!(
            render("{op_conv[2].upper()}", &[]).unwrap_err(),
            TemplateError::TypeMismatch { kind: "null", .. }
        ));
    }

    #[test]
    fn syntax_errors() {
        for bad in ["{ss", "ss}", "{}", "{ss +}", "{a.b()}", "{a ? b}", "{a b}"] {
            assert!(
                matches!(Template::parse(bad), Err(TemplateError::Syntax { .. })),
                "{bad}"
            );
        }
    }
}
