//! JSONPath-style queries over parsed documents.
//!
//! Supported syntax:
//! - `$` root (optional; `spec.containers` is read as `$.spec.containers`)
//! - `.name`, `['name']`, `["name"]` member access
//! - `[0]`, `[-1]`, `[0,2]`, `[1:3]`, `[::2]` index, union and slice
//! - `.*`, `[*]` every mapping value / sequence element
//! - `..name`, `..*`, `..[...]` recursive descent (node first, then children)
//! - `[?(<expr>)]` filters with `@`/`$` paths, literals, `== != < <= > >= =~`,
//!   `&&` (or `&`), `||`, `!` and parentheses
//!
//! Results come back in document order. Evaluation never fails: anything that
//! does not fit (a name on a sequence, an index on a mapping) selects
//! nothing. Only malformed expressions produce `QueryOutcome::Error`.

use regex::Regex;
use serde_json::{Number, Value as Json};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("empty path expression")]
    Empty,
    #[error("syntax error at offset {pos}: {msg}")]
    Syntax { pos: usize, msg: String },
    #[error("invalid regex in filter: {0}")]
    Regex(String),
}

/// Result of running a query, keeping failures visible to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Matched(Vec<Json>),
    Unmatched,
    Error(String),
}

impl QueryOutcome {
    /// Collapse to the plain value list; `Unmatched` and `Error` are empty.
    pub fn into_values(self) -> Vec<Json> {
        match self {
            QueryOutcome::Matched(values) => values,
            QueryOutcome::Unmatched | QueryOutcome::Error(_) => Vec::new(),
        }
    }
}

/// Run `expr` against `doc`.
pub fn query(doc: &Json, expr: &str) -> QueryOutcome {
    match expr.parse::<JsonPath>() {
        Ok(path) => {
            let found = path.select(doc);
            if found.is_empty() {
                QueryOutcome::Unmatched
            } else {
                QueryOutcome::Matched(found.into_iter().cloned().collect())
            }
        }
        Err(e) => QueryOutcome::Error(e.to_string()),
    }
}

/// Matched values for `expr`, or an empty list on any failure.
pub fn matches(doc: &Json, expr: &str) -> Vec<Json> {
    query(doc, expr).into_values()
}

/// Deep equality where numbers compare by value (`1 == 1.0`) and values of
/// different types are never equal.
pub fn values_equal(a: &Json, b: &Json) -> bool {
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => numbers_equal(x, y),
        (Json::Array(xs), Json::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Json::Object(xm), Json::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, xv)| ym.get(k).is_some_and(|yv| values_equal(xv, yv)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// A compiled path expression.
#[derive(Debug, Clone)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    Child(Vec<Selector>),
    Descendant(Vec<Selector>),
}

#[derive(Debug, Clone)]
enum Selector {
    Name(String),
    Wildcard,
    Index(i64),
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
    Filter(Box<Expr>),
}

#[derive(Debug, Clone)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare(Operand, CmpOp, Operand),
    Regex(Operand, Regex),
    Exists(Operand),
}

#[derive(Debug, Clone)]
enum Operand {
    Current(Vec<Segment>),
    Root(Vec<Segment>),
    Literal(Json),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl FromStr for JsonPath {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(QueryError::Empty);
        }
        let mut p = Parser::new(trimmed);
        let segments = p.parse_root_path()?;
        p.skip_ws();
        if !p.at_end() {
            return Err(p.error("unexpected trailing input"));
        }
        Ok(JsonPath { segments })
    }
}

impl JsonPath {
    /// Select matching nodes from `doc`, in document order.
    pub fn select<'a>(&self, doc: &'a Json) -> Vec<&'a Json> {
        select_segments(&self.segments, doc, doc)
    }
}

fn select_segments<'a>(segments: &[Segment], start: &'a Json, root: &'a Json) -> Vec<&'a Json> {
    let mut nodes: Vec<&'a Json> = vec![start];
    for seg in segments {
        let mut next = Vec::new();
        for node in nodes {
            match seg {
                Segment::Child(selectors) => apply_selectors(selectors, node, root, &mut next),
                Segment::Descendant(selectors) => descend(selectors, node, root, &mut next),
            }
        }
        if next.is_empty() {
            return next;
        }
        nodes = next;
    }
    nodes
}

fn descend<'a>(selectors: &[Selector], node: &'a Json, root: &'a Json, out: &mut Vec<&'a Json>) {
    apply_selectors(selectors, node, root, out);
    for child in children(node) {
        descend(selectors, child, root, out);
    }
}

fn children(node: &Json) -> Box<dyn Iterator<Item = &Json> + '_> {
    match node {
        Json::Object(obj) => Box::new(obj.values()),
        Json::Array(arr) => Box::new(arr.iter()),
        _ => Box::new(std::iter::empty()),
    }
}

fn apply_selectors<'a>(selectors: &[Selector], node: &'a Json, root: &'a Json, out: &mut Vec<&'a Json>) {
    for sel in selectors {
        match sel {
            Selector::Name(name) => {
                if let Some(v) = node.as_object().and_then(|o| o.get(name)) {
                    out.push(v);
                }
            }
            Selector::Wildcard => out.extend(children(node)),
            Selector::Index(i) => {
                if let Json::Array(arr) = node {
                    if let Some(idx) = normalize_index(*i, arr.len()) {
                        out.push(&arr[idx]);
                    }
                }
            }
            Selector::Slice { start, end, step } => {
                if let Json::Array(arr) = node {
                    for idx in slice_indices(arr.len(), *start, *end, *step) {
                        out.push(&arr[idx]);
                    }
                }
            }
            Selector::Filter(expr) => {
                for child in children(node) {
                    if eval_expr(expr, child, root) {
                        out.push(child);
                    }
                }
            }
        }
    }
}

fn normalize_index(i: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let idx = if i < 0 { len + i } else { i };
    if (0..len).contains(&idx) {
        Some(idx as usize)
    } else {
        None
    }
}

fn slice_indices(len: usize, start: Option<i64>, end: Option<i64>, step: Option<i64>) -> Vec<usize> {
    let len = len as i64;
    let step = step.unwrap_or(1);
    if step == 0 {
        return Vec::new();
    }
    let norm = |v: i64| if v < 0 { len + v } else { v };
    let mut out = Vec::new();
    if step > 0 {
        let lo = norm(start.unwrap_or(0)).clamp(0, len);
        let hi = norm(end.unwrap_or(len)).clamp(0, len);
        let mut i = lo;
        while i < hi {
            out.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    } else {
        let hi = norm(start.unwrap_or(len - 1)).clamp(-1, len - 1);
        let lo = end.map(norm).unwrap_or(-1).clamp(-1, len - 1);
        let mut i = hi;
        while i > lo {
            out.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    }
    out
}

fn eval_expr(expr: &Expr, current: &Json, root: &Json) -> bool {
    match expr {
        Expr::Or(a, b) => eval_expr(a, current, root) || eval_expr(b, current, root),
        Expr::And(a, b) => eval_expr(a, current, root) && eval_expr(b, current, root),
        Expr::Not(inner) => !eval_expr(inner, current, root),
        Expr::Exists(Operand::Literal(v)) => !matches!(v, Json::Null | Json::Bool(false)),
        Expr::Exists(op) => resolve(op, current, root).is_some(),
        Expr::Regex(op, re) => match resolve(op, current, root) {
            Some(Json::String(s)) => re.is_match(&s),
            _ => false,
        },
        Expr::Compare(lhs, op, rhs) => {
            let l = resolve(lhs, current, root);
            let r = resolve(rhs, current, root);
            match (l, r) {
                (Some(a), Some(b)) => compare(&a, *op, &b),
                (None, None) => matches!(op, CmpOp::Eq | CmpOp::Le | CmpOp::Ge),
                _ => *op == CmpOp::Ne,
            }
        }
    }
}

fn resolve(op: &Operand, current: &Json, root: &Json) -> Option<Json> {
    match op {
        Operand::Literal(v) => Some(v.clone()),
        Operand::Current(segs) => select_segments(segs, current, root).first().map(|v| (*v).clone()),
        Operand::Root(segs) => select_segments(segs, root, root).first().map(|v| (*v).clone()),
    }
}

fn compare(a: &Json, op: CmpOp, b: &Json) -> bool {
    let ordering = || match (a, b) {
        (Json::Number(x), Json::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Json::String(x), Json::String(y)) => Some(x.cmp(y)),
        _ => None,
    };
    match op {
        CmpOp::Eq => values_equal(a, b),
        CmpOp::Ne => !values_equal(a, b),
        CmpOp::Lt => ordering().is_some_and(|o| o.is_lt()),
        CmpOp::Le => ordering().is_some_and(|o| o.is_le()),
        CmpOp::Gt => ordering().is_some_and(|o| o.is_gt()),
        CmpOp::Ge => ordering().is_some_and(|o| o.is_ge()),
    }
}

/// Upper bound on filter terms (operands, `!`, parentheses) per path.
const MAX_FILTER_TERMS: usize = 256;

struct Parser<'s> {
    src: &'s str,
    chars: Vec<char>,
    pos: usize,
    terms: usize,
}

impl<'s> Parser<'s> {
    fn new(src: &'s str) -> Self {
        Self {
            src,
            chars: src.chars().collect(),
            pos: 0,
            terms: 0,
        }
    }

    fn error(&self, msg: &str) -> QueryError {
        QueryError::Syntax {
            pos: self.pos,
            msg: format!("{} in '{}'", msg, self.src),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let n = s.chars().count();
        if self.chars[self.pos..].iter().take(n).copied().eq(s.chars()) {
            self.pos += n;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), QueryError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c)))
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse_root_path(&mut self) -> Result<Vec<Segment>, QueryError> {
        let mut segments = Vec::new();
        if !self.eat('$') {
            // Bare relative form: leading member name without a dot.
            if self.peek().is_some_and(is_name_char) {
                let name = self.parse_name()?;
                segments.push(Segment::Child(vec![Selector::Name(name)]));
            } else if self.eat('*') {
                segments.push(Segment::Child(vec![Selector::Wildcard]));
            } else if self.peek() != Some('[') && self.peek() != Some('.') {
                return Err(self.error("expected '$'"));
            }
        }
        segments.extend(self.parse_segments()?);
        Ok(segments)
    }

    /// Segments following `$` or `@`. Stops at the first character that
    /// cannot continue a path (used inside filter expressions).
    fn parse_segments(&mut self) -> Result<Vec<Segment>, QueryError> {
        let mut segments = Vec::new();
        loop {
            if self.eat_str("..") {
                if self.eat('*') {
                    segments.push(Segment::Descendant(vec![Selector::Wildcard]));
                } else if self.peek() == Some('[') {
                    let sels = self.parse_bracket()?;
                    segments.push(Segment::Descendant(sels));
                } else {
                    let name = self.parse_name()?;
                    segments.push(Segment::Descendant(vec![Selector::Name(name)]));
                }
            } else if self.eat('.') {
                if self.eat('*') {
                    segments.push(Segment::Child(vec![Selector::Wildcard]));
                } else if self.peek() == Some('[') {
                    // Tolerate `a.[0]`.
                    let sels = self.parse_bracket()?;
                    segments.push(Segment::Child(sels));
                } else {
                    let name = self.parse_name()?;
                    segments.push(Segment::Child(vec![Selector::Name(name)]));
                }
            } else if self.peek() == Some('[') {
                let sels = self.parse_bracket()?;
                segments.push(Segment::Child(sels));
            } else {
                return Ok(segments);
            }
        }
    }

    fn parse_name(&mut self) -> Result<String, QueryError> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a member name"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_bracket(&mut self) -> Result<Vec<Selector>, QueryError> {
        self.expect('[')?;
        let mut selectors = Vec::new();
        loop {
            self.skip_ws();
            selectors.push(self.parse_selector()?);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            self.expect(']')?;
            return Ok(selectors);
        }
    }

    fn parse_selector(&mut self) -> Result<Selector, QueryError> {
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                Ok(Selector::Wildcard)
            }
            Some('\'') | Some('"') => Ok(Selector::Name(self.parse_quoted()?)),
            Some('?') => {
                self.pos += 1;
                self.skip_ws();
                let expr = self.parse_or()?;
                Ok(Selector::Filter(Box::new(expr)))
            }
            Some(c) if c == '-' || c == ':' || c.is_ascii_digit() => self.parse_index_or_slice(),
            _ => Err(self.error("expected a selector")),
        }
    }

    fn parse_index_or_slice(&mut self) -> Result<Selector, QueryError> {
        let first = self.parse_opt_int()?;
        self.skip_ws();
        if !self.eat(':') {
            return first
                .map(Selector::Index)
                .ok_or_else(|| self.error("expected an index"));
        }
        self.skip_ws();
        let end = self.parse_opt_int()?;
        self.skip_ws();
        let step = if self.eat(':') {
            self.skip_ws();
            self.parse_opt_int()?
        } else {
            None
        };
        Ok(Selector::Slice {
            start: first,
            end,
            step,
        })
    }

    fn parse_opt_int(&mut self) -> Result<Option<i64>, QueryError> {
        let start = self.pos;
        self.eat('-');
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<i64>()
            .map(Some)
            .map_err(|_| self.error("invalid integer"))
    }

    fn parse_quoted(&mut self) -> Result<String, QueryError> {
        let quote = self.peek().ok_or_else(|| self.error("expected a quote"))?;
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => {
                    self.pos += 1;
                    let c = self.peek().ok_or_else(|| self.error("unterminated escape"))?;
                    out.push(match c {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                    self.pos += 1;
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn parse_or(&mut self) -> Result<Expr, QueryError> {
        let mut lhs = self.parse_and()?;
        loop {
            self.skip_ws();
            if self.eat_str("||") {
                let rhs = self.parse_and()?;
                lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_and(&mut self) -> Result<Expr, QueryError> {
        let mut lhs = self.parse_unary()?;
        loop {
            self.skip_ws();
            if self.eat_str("&&") || self.eat('&') {
                let rhs = self.parse_unary()?;
                lhs = Expr::And(Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, QueryError> {
        self.terms += 1;
        if self.terms > MAX_FILTER_TERMS {
            return Err(self.error("filter expression too complex"));
        }
        self.skip_ws();
        if self.peek() == Some('!') && self.peek_at(1) != Some('=') {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        if self.eat('(') {
            let inner = self.parse_or()?;
            self.skip_ws();
            self.expect(')')?;
            return Ok(inner);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, QueryError> {
        let lhs = self.parse_operand()?;
        self.skip_ws();
        if self.eat_str("=~") {
            self.skip_ws();
            let pattern = match self.peek() {
                Some('/') => self.parse_regex_literal()?,
                Some('\'') | Some('"') => self.parse_quoted()?,
                _ => return Err(self.error("expected a regex literal")),
            };
            let re = Regex::new(&pattern).map_err(|e| QueryError::Regex(e.to_string()))?;
            return Ok(Expr::Regex(lhs, re));
        }
        let op = if self.eat_str("==") {
            Some(CmpOp::Eq)
        } else if self.eat_str("!=") {
            Some(CmpOp::Ne)
        } else if self.eat_str("<=") {
            Some(CmpOp::Le)
        } else if self.eat_str(">=") {
            Some(CmpOp::Ge)
        } else if self.eat('<') {
            Some(CmpOp::Lt)
        } else if self.eat('>') {
            Some(CmpOp::Gt)
        } else if self.peek() == Some('=') && self.peek_at(1) != Some('=') {
            // jsonpath-ng accepts a single '='.
            self.pos += 1;
            Some(CmpOp::Eq)
        } else {
            None
        };
        match op {
            Some(op) => {
                self.skip_ws();
                let rhs = self.parse_operand()?;
                Ok(Expr::Compare(lhs, op, rhs))
            }
            None => Ok(Expr::Exists(lhs)),
        }
    }

    fn parse_regex_literal(&mut self) -> Result<String, QueryError> {
        self.expect('/')?;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated regex")),
                Some('\\') if self.peek_at(1) == Some('/') => {
                    out.push('/');
                    self.pos += 2;
                }
                Some('/') => {
                    self.pos += 1;
                    break;
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
        if self.eat('i') {
            out = format!("(?i){}", out);
        }
        Ok(out)
    }

    fn parse_operand(&mut self) -> Result<Operand, QueryError> {
        self.skip_ws();
        match self.peek() {
            Some('@') => {
                self.pos += 1;
                Ok(Operand::Current(self.parse_segments()?))
            }
            Some('$') => {
                self.pos += 1;
                Ok(Operand::Root(self.parse_segments()?))
            }
            Some('\'') | Some('"') => Ok(Operand::Literal(Json::String(self.parse_quoted()?))),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            _ => {
                for (word, value) in [
                    ("true", Json::Bool(true)),
                    ("false", Json::Bool(false)),
                    ("null", Json::Null),
                ] {
                    if self.eat_str(word) {
                        return Ok(Operand::Literal(value));
                    }
                }
                Err(self.error("expected an operand"))
            }
        }
    }

    fn parse_number(&mut self) -> Result<Operand, QueryError> {
        let start = self.pos;
        self.eat('-');
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+'))
        {
            if matches!(self.peek(), Some('+')) && !matches!(self.chars[self.pos - 1], 'e' | 'E') {
                break;
            }
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Operand::Literal(Json::Number(i.into())));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(|n| Operand::Literal(Json::Number(n)))
            .ok_or_else(|| self.error("invalid number"))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pod() -> Json {
        json!({
            "kind": "Pod",
            "metadata": {"name": "web", "labels": {"app": "web"}},
            "spec": {
                "containers": [
                    {"name": "app", "image": "nginx:latest", "ports": [{"containerPort": 80}]},
                    {"name": "sidecar", "image": "envoy:1.29", "ports": [{"containerPort": 9901}]}
                ]
            }
        })
    }

    #[test]
    fn test_member_and_wildcard_array() {
        assert_eq!(
            matches(&pod(), "$.spec.containers[*].image"),
            vec![json!("nginx:latest"), json!("envoy:1.29")]
        );
        assert_eq!(matches(&pod(), "$.metadata.name"), vec![json!("web")]);
        assert_eq!(matches(&pod(), "spec.containers[1].name"), vec![json!("sidecar")]);
        assert_eq!(matches(&pod(), "$['metadata'][\"labels\"].app"), vec![json!("web")]);
    }

    #[test]
    fn test_index_slice_and_union() {
        let doc = json!({"xs": [0, 1, 2, 3, 4]});
        assert_eq!(matches(&doc, "$.xs[-1]"), vec![json!(4)]);
        assert_eq!(matches(&doc, "$.xs[1:3]"), vec![json!(1), json!(2)]);
        assert_eq!(matches(&doc, "$.xs[::2]"), vec![json!(0), json!(2), json!(4)]);
        assert_eq!(matches(&doc, "$.xs[::-2]"), vec![json!(4), json!(2), json!(0)]);
        assert_eq!(matches(&doc, "$.xs[0,3]"), vec![json!(0), json!(3)]);
        assert!(matches(&doc, "$.xs[9]").is_empty());
    }

    #[test]
    fn test_recursive_descent_document_order() {
        let doc = json!({"env": {"TOKEN": "ghp_x", "nested": {"TOKEN": "ghp_y"}}});
        assert_eq!(matches(&doc, "$..TOKEN"), vec![json!("ghp_x"), json!("ghp_y")]);
        let all = matches(&doc, "$..*");
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], json!({"TOKEN": "ghp_x", "nested": {"TOKEN": "ghp_y"}}));
        assert_eq!(all[1], json!("ghp_x"));
        assert_eq!(all[2], json!({"TOKEN": "ghp_y"}));
        assert_eq!(all[3], json!("ghp_y"));
        assert_eq!(
            matches(&pod(), "$..containerPort"),
            vec![json!(80), json!(9901)]
        );
    }

    #[test]
    fn test_filters() {
        assert_eq!(
            matches(&pod(), "$.spec.containers[?(@.name == 'sidecar')].image"),
            vec![json!("envoy:1.29")]
        );
        assert_eq!(
            matches(&pod(), "$.spec.containers[?(@.image =~ /:latest$/)].name"),
            vec![json!("app")]
        );
        assert_eq!(
            matches(&pod(), "$.spec.containers[?(@.ports[0].containerPort > 100)].name"),
            vec![json!("sidecar")]
        );
        assert_eq!(
            matches(&pod(), "$.spec.containers[?(@.name && !(@.name = 'app'))].name"),
            vec![json!("sidecar")]
        );
        assert_eq!(matches(&pod(), "$.spec.containers[?(@.resources)]").len(), 0);
        assert_eq!(
            matches(&pod(), "$.spec.containers[?(@.name == $.metadata.name || @.name == 'app')].name"),
            vec![json!("app")]
        );
    }

    #[test]
    fn test_type_mismatch_selects_nothing() {
        let outcome = query(&pod(), "$.kind[0].x");
        assert_eq!(outcome, QueryOutcome::Unmatched);
        assert!(matches(&pod(), "$.spec.containers.image").is_empty());
    }

    #[test]
    fn test_malformed_expression_is_error_not_panic() {
        for bad in ["", "$.spec[", "$.[?(@.a ==)]", "$..", "$.a[?(@.b =~ /(/)]", "$ $"] {
            assert!(
                matches!(query(&pod(), bad), QueryOutcome::Error(_)),
                "expected error for {:?}",
                bad
            );
            assert!(matches(&pod(), bad).is_empty());
        }
    }

    #[test]
    fn test_extreme_slice_bounds_and_steps() {
        let doc = json!({"xs": [0, 1, 2]});
        assert_eq!(matches(&doc, "$.xs[1::9223372036854775807]"), vec![json!(1)]);
        assert_eq!(matches(&doc, "$.xs[::-9223372036854775808]"), vec![json!(2)]);
        assert_eq!(
            matches(&doc, "$.xs[-9223372036854775808:9223372036854775807]"),
            vec![json!(0), json!(1), json!(2)]
        );
        assert_eq!(
            matches(&doc, "$.xs[9223372036854775807:-9223372036854775808:-1]"),
            vec![json!(2), json!(1), json!(0)]
        );
        assert!(matches(&doc, "$.xs[9223372036854775807]").is_empty());
        assert!(matches(&doc, "$.xs[-9223372036854775808]").is_empty());
        assert!(matches!(
            query(&doc, "$.xs[99999999999999999999]"),
            QueryOutcome::Error(_)
        ));
    }

    #[test]
    fn test_filter_nesting_is_bounded() {
        let doc = json!({"xs": [{"a": 1}, {"b": 2}]});
        assert_eq!(matches(&doc, "$.xs[?(!!@.a)]"), vec![json!({"a": 1})]);
        assert_eq!(matches(&doc, "$.xs[?(((@.a == 1)))]"), vec![json!({"a": 1})]);

        let nots = format!("$.xs[?({}@.a)]", "!".repeat(200_000));
        let parens = format!("$.xs[?({}@.a{})]", "(".repeat(100_000), ")".repeat(100_000));
        let ors = format!("$.xs[?({})]", vec!["@.a"; 10_000].join(" || "));
        let nested = format!("${}", "[?(@".repeat(50_000));
        for expr in [nots, parens, ors, nested] {
            assert!(matches!(query(&doc, &expr), QueryOutcome::Error(_)));
        }
    }

    #[test]
    fn test_generated_expressions_never_panic() {
        const TOKENS: [&str; 32] = [
            "$", ".", "..", "*", "[", "]", "?(", ")", "(", "@", "a", "xs", "0", "-1", ":",
            ",", "'a'", "\"", "==", "=~", "/x/", "!", "&&", "||", "<=", " ",
            "9223372036854775807", "-9223372036854775808", "1.5e3", "true", "null", "\\",
        ];
        let doc = json!({"a": {"a": [1, "x", {"a": null}]}, "xs": [0, -1, "a", [1, 2]]});
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..5_000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let len = (seed >> 59) as usize + 1;
            let mut expr = String::new();
            let mut state = seed;
            for _ in 0..len {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                expr.push_str(TOKENS[(state >> 33) as usize % TOKENS.len()]);
            }
            match query(&doc, &expr) {
                QueryOutcome::Matched(values) => assert!(!values.is_empty()),
                QueryOutcome::Unmatched | QueryOutcome::Error(_) => {}
            }
        }
    }

    #[test]
    fn test_values_equal_numeric_but_type_strict() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(values_equal(&json!({"a": [1, "x"]}), &json!({"a": [1.0, "x"]})));
        assert!(!values_equal(&json!(1), &json!("1")));
        assert!(!values_equal(&json!(true), &json!(1)));
        assert!(!values_equal(&json!(null), &json!(false)));
    }
}
