//! XPath 1.0 values and the coercion rules between them.
//!
//! Every expression evaluates to one of four types: node-set, boolean,
//! number (IEEE 754 double) or string. The conversions here are the
//! `boolean()`, `number()` and `string()` core functions; the evaluator
//! and the function library both route through them.

use std::fmt;

use crate::model::{XPathNode, document_order};
use crate::runtime::Error;

/// An XPath value. Node-sets carry their nodes in the order the producing
/// expression generated them; ordering guarantees are documented on the
/// producing operations, not here.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<N: XPathNode> {
    NodeSet(Vec<N>),
    Boolean(bool),
    Number(f64),
    String(String),
}

impl<N: XPathNode> Value<N> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::NodeSet(_) => "node-set",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }

    /// `boolean()`: a node-set is true when non-empty, a number when
    /// neither zero nor NaN, a string when non-empty.
    pub fn boolean(&self) -> bool {
        match self {
            Value::NodeSet(nodes) => !nodes.is_empty(),
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    /// `number()`: strings go through the restricted XPath number
    /// grammar, node-sets through their string-value first.
    pub fn number(&self) -> f64 {
        match self {
            Value::NodeSet(_) => parse_number(&self.string()),
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
        }
    }

    /// `string()`: an empty node-set is the empty string, a non-empty one
    /// the string-value of its first node in document order.
    pub fn string(&self) -> String {
        match self {
            Value::NodeSet(nodes) => first_in_document_order(nodes)
                .map(|n| n.string_value())
                .unwrap_or_default(),
            Value::Boolean(b) => {
                if *b {
                    "true".to_string()
                } else {
                    "false".to_string()
                }
            }
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
        }
    }

    /// The nodes of a node-set value; any other type is a type error.
    pub fn into_node_set(self) -> Result<Vec<N>, Error> {
        match self {
            Value::NodeSet(nodes) => Ok(nodes),
            other => Err(Error::TypeError {
                expected: "node-set",
                actual: other.type_name(),
            }),
        }
    }

    pub fn node_set(&self) -> Result<&[N], Error> {
        match self {
            Value::NodeSet(nodes) => Ok(nodes),
            other => Err(Error::TypeError {
                expected: "node-set",
                actual: other.type_name(),
            }),
        }
    }
}

impl<N: XPathNode> From<bool> for Value<N> {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<N: XPathNode> From<f64> for Value<N> {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl<N: XPathNode> From<String> for Value<N> {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<N: XPathNode> From<&str> for Value<N> {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<N: XPathNode> From<Vec<N>> for Value<N> {
    fn from(nodes: Vec<N>) -> Self {
        Value::NodeSet(nodes)
    }
}

impl<N: XPathNode> fmt::Display for Value<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string())
    }
}

/// The first node of a set in document order, ignoring the set's own
/// order. Linear scan; the set is not sorted.
pub fn first_in_document_order<N: XPathNode>(nodes: &[N]) -> Option<N> {
    let mut iter = nodes.iter();
    let mut best = iter.next()?.clone();
    for node in iter {
        if document_order(node, &best) == std::cmp::Ordering::Less {
            best = node.clone();
        }
    }
    Some(best)
}

/// The four XML whitespace characters. XPath never treats any other
/// Unicode whitespace as a separator.
pub(crate) const XML_WHITESPACE: [char; 4] = [' ', '\t', '\r', '\n'];

/// Parse per the XPath `Number` production: optional leading/trailing
/// whitespace, optional single minus, digits with at most one decimal
/// point. No exponents, no `+`, no hex, no "Infinity". Anything else is
/// NaN.
pub fn parse_number(s: &str) -> f64 {
    let t = s.trim_matches(XML_WHITESPACE);
    let (negative, t) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t),
    };
    if t.is_empty() {
        return f64::NAN;
    }
    let mut dot_seen = false;
    let mut digit_seen = false;
    for c in t.chars() {
        match c {
            '0'..='9' => digit_seen = true,
            '.' if !dot_seen => dot_seen = true,
            _ => return f64::NAN,
        }
    }
    if !digit_seen {
        return f64::NAN;
    }
    match t.parse::<f64>() {
        Ok(n) if negative => -n,
        Ok(n) => n,
        Err(_) => f64::NAN,
    }
}

/// Format per `string(number)`: NaN is `"NaN"`, both zeros are `"0"`,
/// infinities are `"Infinity"`/`"-Infinity"`, integers print without a
/// decimal point, everything else in plain decimal notation.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    // f64's Display is shortest-roundtrip decimal and never switches to
    // exponent notation, which is exactly the XPath format.
    n.to_string()
}

/// `round()`: half-way cases toward positive infinity, so `round(-0.5)`
/// is negative zero, not `-1`.
pub fn round_half_up(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        return n;
    }
    let r = (n + 0.5).floor();
    // keep the sign for results in [-0.5, -0.0]
    if r == 0.0 && n < 0.0 { -0.0 } else { r }
}
