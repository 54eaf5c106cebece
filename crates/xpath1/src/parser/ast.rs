//! AST for XPath 1.0 expressions.
//!
//! Nodes are immutable after construction and never hold a back-reference
//! to their parent. `Display` prints a fully parenthesized normalized form
//! that re-parses to an identical tree.

use core::fmt;

/// Lexical QName as written in the expression. Prefixes are resolved to
/// namespace URIs at evaluation time through the context's namespace
/// bindings, not at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    pub fn local(local: impl Into<String>) -> Self {
        Self { prefix: None, local: local.into() }
    }

    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()), local: local.into() }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{p}:{}", self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualityOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOp {
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditiveOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplicativeOp {
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Equality {
        op: EqualityOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Relational {
        op: RelationalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Additive {
        op: AdditiveOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Multiplicative {
        op: MultiplicativeOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Negate(Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    Path(LocationPath),
    /// A primary expression with predicates and/or a trailing relative
    /// path (`FilterExpr` / `PathExpr` of the grammar). A bare primary is
    /// never wrapped here; the parser unwraps the degenerate case.
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
        path: Option<LocationPath>,
    },
    FunctionCall {
        name: QName,
        args: Vec<Expr>,
    },
    VariableRef(QName),
    Number(f64),
    Literal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    /// The `//` abbreviation: `descendant-or-self::node()`.
    pub fn descendant_or_self_node() -> Self {
        Self {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::Kind(KindTest::Node),
            predicates: Vec::new(),
        }
    }
}

/// The 13 axes of XPath 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Ancestor,
    AncestorOrSelf,
    Attribute,
    Child,
    Descendant,
    DescendantOrSelf,
    Following,
    FollowingSibling,
    Namespace,
    Parent,
    Preceding,
    PrecedingSibling,
    SelfAxis,
}

impl Axis {
    pub fn as_str(self) -> &'static str {
        match self {
            Axis::Ancestor => "ancestor",
            Axis::AncestorOrSelf => "ancestor-or-self",
            Axis::Attribute => "attribute",
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::Following => "following",
            Axis::FollowingSibling => "following-sibling",
            Axis::Namespace => "namespace",
            Axis::Parent => "parent",
            Axis::Preceding => "preceding",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::SelfAxis => "self",
        }
    }

    /// True for axes whose natural iteration order is reverse document
    /// order (nearest node first).
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling
        )
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    Name(NameTest),
    Kind(KindTest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NameTest {
    /// `*` — any node of the axis's principal type.
    Any,
    /// `p:*` — any local name in the namespace bound to `p`.
    NamespaceAny(String),
    /// `p:local` or `local`.
    Named(QName),
}

#[derive(Debug, Clone, PartialEq)]
pub enum KindTest {
    Node,
    Text,
    Comment,
    ProcessingInstruction(Option<String>),
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeTest::Name(NameTest::Any) => f.write_str("*"),
            NodeTest::Name(NameTest::NamespaceAny(p)) => write!(f, "{p}:*"),
            NodeTest::Name(NameTest::Named(q)) => write!(f, "{q}"),
            NodeTest::Kind(KindTest::Node) => f.write_str("node()"),
            NodeTest::Kind(KindTest::Text) => f.write_str("text()"),
            NodeTest::Kind(KindTest::Comment) => f.write_str("comment()"),
            NodeTest::Kind(KindTest::ProcessingInstruction(None)) => {
                f.write_str("processing-instruction()")
            }
            NodeTest::Kind(KindTest::ProcessingInstruction(Some(t))) => {
                write!(f, "processing-instruction('{t}')")
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.axis, self.test)?;
        for p in &self.predicates {
            write!(f, "[{p}]")?;
        }
        Ok(())
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        }
        let mut first = true;
        for step in &self.steps {
            if !first {
                f.write_str("/")?;
            }
            write!(f, "{step}")?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Or(l, r) => write!(f, "({l} or {r})"),
            Expr::And(l, r) => write!(f, "({l} and {r})"),
            Expr::Equality { op, left, right } => {
                let op = match op {
                    EqualityOp::Eq => "=",
                    EqualityOp::Ne => "!=",
                };
                write!(f, "({left} {op} {right})")
            }
            Expr::Relational { op, left, right } => {
                let op = match op {
                    RelationalOp::Lt => "<",
                    RelationalOp::Gt => ">",
                    RelationalOp::Le => "<=",
                    RelationalOp::Ge => ">=",
                };
                write!(f, "({left} {op} {right})")
            }
            Expr::Additive { op, left, right } => {
                let op = match op {
                    AdditiveOp::Add => "+",
                    AdditiveOp::Sub => "-",
                };
                write!(f, "({left} {op} {right})")
            }
            Expr::Multiplicative { op, left, right } => {
                let op = match op {
                    MultiplicativeOp::Mul => "*",
                    MultiplicativeOp::Div => "div",
                    MultiplicativeOp::Mod => "mod",
                };
                write!(f, "({left} {op} {right})")
            }
            Expr::Negate(e) => write!(f, "-{e}"),
            Expr::Union(l, r) => write!(f, "({l} | {r})"),
            Expr::Path(p) => write!(f, "{p}"),
            Expr::Filter { primary, predicates, path } => {
                write!(f, "({primary})")?;
                for p in predicates {
                    write!(f, "[{p}]")?;
                }
                if let Some(lp) = path {
                    write!(f, "/{lp}")?;
                }
                Ok(())
            }
            Expr::FunctionCall { name, args } => {
                write!(f, "{name}(")?;
                let mut first = true;
                for a in args {
                    if !first {
                        f.write_str(", ")?;
                    }
                    write!(f, "{a}")?;
                    first = false;
                }
                f.write_str(")")
            }
            Expr::VariableRef(q) => write!(f, "${q}"),
            Expr::Number(n) => f.write_str(&crate::value::format_number(*n)),
            Expr::Literal(s) => {
                if s.contains('"') {
                    write!(f, "'{s}'")
                } else {
                    write!(f, "\"{s}\"")
                }
            }
        }
    }
}
