//! XPath 1.0 parser: a pest grammar front-end plus a builder that folds
//! the grammar pairs bottom-up into [`ast::Expr`].
//!
//! Two edge cases from the grammar are handled here rather than in the
//! AST: a filter expression that is a bare primary (no predicates, no
//! trailing path) is returned as the primary itself, and chain folds only
//! construct a binary node when an operator token was actually consumed.

use pest::Parser as _;
use pest::iterators::Pair;

use crate::runtime::Error;

pub mod ast;

use ast::{
    AdditiveOp, Axis, EqualityOp, Expr, KindTest, LocationPath, MultiplicativeOp, NameTest,
    NodeTest, QName, RelationalOp, Step,
};

#[derive(pest_derive::Parser)]
#[grammar = "xpath1.pest"]
struct Grammar;

/// Parse an XPath 1.0 expression into its AST.
///
/// Malformed input yields [`Error::Syntax`] with the 0-based byte offset
/// of the failure; no partial tree is ever returned.
pub fn parse(input: &str) -> Result<Expr, Error> {
    tracing::trace!(expr = input, "parsing xpath expression");
    let mut pairs = Grammar::parse(Rule::xpath, input).map_err(syntax_error)?;
    let root = pairs.next().expect("grammar: xpath rule produces one pair");
    let expr = root
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .expect("grammar: xpath contains expr");
    Ok(build_expr(expr))
}

fn syntax_error(e: pest::error::Error<Rule>) -> Error {
    let position = match e.location {
        pest::error::InputLocation::Pos(p) => p,
        pest::error::InputLocation::Span((start, _)) => start,
    };
    let message = match &e.variant {
        pest::error::ErrorVariant::ParsingError { .. } => "unexpected token".to_string(),
        pest::error::ErrorVariant::CustomError { message } => message.clone(),
    };
    Error::Syntax { position, message }
}

fn only(pair: Pair<Rule>) -> Pair<Rule> {
    pair.into_inner()
        .next()
        .expect("grammar: rule has exactly one child")
}

fn build_expr(pair: Pair<Rule>) -> Expr {
    match pair.as_rule() {
        Rule::expr => build_expr(only(pair)),
        Rule::or_expr => fold_chain(pair, |_, l, r| Expr::Or(Box::new(l), Box::new(r))),
        Rule::and_expr => fold_chain(pair, |_, l, r| Expr::And(Box::new(l), Box::new(r))),
        Rule::equality_expr => fold_chain(pair, |op, l, r| {
            let op = match op {
                Rule::OP_EQ => EqualityOp::Eq,
                _ => EqualityOp::Ne,
            };
            Expr::Equality { op, left: Box::new(l), right: Box::new(r) }
        }),
        Rule::relational_expr => fold_chain(pair, |op, l, r| {
            let op = match op {
                Rule::OP_LT => RelationalOp::Lt,
                Rule::OP_GT => RelationalOp::Gt,
                Rule::OP_LE => RelationalOp::Le,
                _ => RelationalOp::Ge,
            };
            Expr::Relational { op, left: Box::new(l), right: Box::new(r) }
        }),
        Rule::additive_expr => fold_chain(pair, |op, l, r| {
            let op = match op {
                Rule::OP_PLUS => AdditiveOp::Add,
                _ => AdditiveOp::Sub,
            };
            Expr::Additive { op, left: Box::new(l), right: Box::new(r) }
        }),
        Rule::multiplicative_expr => fold_chain(pair, |op, l, r| {
            let op = match op {
                Rule::OP_STAR => MultiplicativeOp::Mul,
                Rule::K_DIV => MultiplicativeOp::Div,
                _ => MultiplicativeOp::Mod,
            };
            Expr::Multiplicative { op, left: Box::new(l), right: Box::new(r) }
        }),
        Rule::unary_expr => {
            let mut negations = 0usize;
            let mut operand = None;
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::OP_MINUS => negations += 1,
                    _ => operand = Some(build_expr(p)),
                }
            }
            let mut expr = operand.expect("grammar: unary_expr has an operand");
            for _ in 0..negations {
                expr = Expr::Negate(Box::new(expr));
            }
            expr
        }
        Rule::union_expr => fold_chain(pair, |_, l, r| Expr::Union(Box::new(l), Box::new(r))),
        Rule::path_expr => build_path_expr(only(pair)),
        Rule::primary_expr => build_primary(only(pair)),
        _ => unreachable!("grammar: unexpected rule {:?}", pair.as_rule()),
    }
}

/// Fold `operand (op operand)*` left-associatively. With a single operand
/// no operator token is present and no binary node is synthesized.
fn fold_chain(pair: Pair<Rule>, combine: impl Fn(Rule, Expr, Expr) -> Expr) -> Expr {
    let mut inner = pair.into_inner();
    let mut expr = build_expr(inner.next().expect("grammar: chain has a first operand"));
    while let Some(op) = inner.next() {
        let right = build_expr(inner.next().expect("grammar: operator is followed by operand"));
        expr = combine(op.as_rule(), expr, right);
    }
    expr
}

fn build_path_expr(pair: Pair<Rule>) -> Expr {
    match pair.as_rule() {
        Rule::absolute_path => {
            let mut steps = Vec::new();
            let mut inner = pair.into_inner();
            let slash = inner.next().expect("grammar: absolute path starts with a slash");
            if slash.as_rule() == Rule::OP_DSLASH {
                steps.push(Step::descendant_or_self_node());
            }
            if let Some(rel) = inner.next() {
                collect_steps(rel, &mut steps);
            }
            Expr::Path(LocationPath { absolute: true, steps })
        }
        Rule::relative_path => {
            let mut steps = Vec::new();
            collect_steps(pair, &mut steps);
            Expr::Path(LocationPath { absolute: false, steps })
        }
        Rule::filter_path => build_filter_path(pair),
        _ => unreachable!("grammar: unexpected path alternative {:?}", pair.as_rule()),
    }
}

fn build_filter_path(pair: Pair<Rule>) -> Expr {
    let mut inner = pair.into_inner();
    let filter = inner.next().expect("grammar: filter_path starts with filter_expr");
    let mut filter_inner = filter.into_inner();
    let primary = build_primary(only(
        filter_inner.next().expect("grammar: filter_expr starts with primary"),
    ));
    let predicates: Vec<Expr> =
        filter_inner.map(|p| build_expr(only(p))).collect();

    let path = inner.next().map(|slash| {
        let mut steps = Vec::new();
        if slash.as_rule() == Rule::OP_DSLASH {
            steps.push(Step::descendant_or_self_node());
        }
        let rel = inner.next().expect("grammar: trailing path has steps");
        collect_steps(rel, &mut steps);
        LocationPath { absolute: false, steps }
    });

    // A lone primary is not wrapped in a degenerate filter node.
    if predicates.is_empty() && path.is_none() {
        return primary;
    }
    Expr::Filter { primary: Box::new(primary), predicates, path }
}

fn build_primary(pair: Pair<Rule>) -> Expr {
    match pair.as_rule() {
        Rule::var_ref => Expr::VariableRef(qname_from_str(&pair.as_str()[1..])),
        Rule::string_literal => Expr::Literal(strip_quotes(pair.as_str())),
        Rule::number => {
            let n = pair
                .as_str()
                .parse::<f64>()
                .expect("grammar: number literals are valid f64");
            Expr::Number(n)
        }
        Rule::paren_expr => build_expr(only(pair)),
        Rule::function_call => {
            let mut inner = pair.into_inner();
            let name = qname_from_str(
                inner.next().expect("grammar: function call starts with qname").as_str(),
            );
            let args = inner.map(build_expr).collect();
            Expr::FunctionCall { name, args }
        }
        _ => unreachable!("grammar: unexpected primary {:?}", pair.as_rule()),
    }
}

fn collect_steps(rel: Pair<Rule>, out: &mut Vec<Step>) {
    debug_assert_eq!(rel.as_rule(), Rule::relative_path);
    for p in rel.into_inner() {
        match p.as_rule() {
            Rule::step => out.push(build_step(p)),
            Rule::OP_DSLASH => out.push(Step::descendant_or_self_node()),
            Rule::OP_SLASH => {}
            _ => unreachable!("grammar: unexpected relative path part {:?}", p.as_rule()),
        }
    }
}

fn build_step(pair: Pair<Rule>) -> Step {
    let inner = only(pair);
    match inner.as_rule() {
        Rule::abbrev_step => {
            let axis = match only(inner).as_rule() {
                Rule::DOT => Axis::SelfAxis,
                _ => Axis::Parent,
            };
            Step { axis, test: NodeTest::Kind(KindTest::Node), predicates: Vec::new() }
        }
        Rule::axis_step => {
            let mut axis = Axis::Child;
            let mut test = None;
            let mut predicates = Vec::new();
            for p in inner.into_inner() {
                match p.as_rule() {
                    Rule::axis_spec => axis = build_axis(p),
                    Rule::node_test => test = Some(build_node_test(p)),
                    Rule::predicate => predicates.push(build_expr(only(p))),
                    _ => unreachable!("grammar: unexpected step part {:?}", p.as_rule()),
                }
            }
            Step {
                axis,
                test: test.expect("grammar: axis_step contains a node test"),
                predicates,
            }
        }
        _ => unreachable!("grammar: unexpected step alternative {:?}", inner.as_rule()),
    }
}

fn build_axis(pair: Pair<Rule>) -> Axis {
    let inner = only(pair);
    match inner.as_rule() {
        Rule::OP_AT => Axis::Attribute,
        Rule::axis_name => match inner.as_str() {
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "attribute" => Axis::Attribute,
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "following" => Axis::Following,
            "following-sibling" => Axis::FollowingSibling,
            "namespace" => Axis::Namespace,
            "parent" => Axis::Parent,
            "preceding" => Axis::Preceding,
            "preceding-sibling" => Axis::PrecedingSibling,
            "self" => Axis::SelfAxis,
            other => unreachable!("grammar: unknown axis name {other}"),
        },
        _ => unreachable!("grammar: unexpected axis specifier {:?}", inner.as_rule()),
    }
}

fn build_node_test(pair: Pair<Rule>) -> NodeTest {
    let inner = only(pair);
    match inner.as_rule() {
        Rule::name_test => {
            let nt = only(inner);
            match nt.as_rule() {
                Rule::wildcard => NodeTest::Name(NameTest::Any),
                Rule::prefixed_wildcard => {
                    let s = nt.as_str();
                    let prefix = s[..s.len() - 2].to_string();
                    NodeTest::Name(NameTest::NamespaceAny(prefix))
                }
                Rule::qname => NodeTest::Name(NameTest::Named(qname_from_str(nt.as_str()))),
                _ => unreachable!("grammar: unexpected name test {:?}", nt.as_rule()),
            }
        }
        Rule::kind_test => {
            let kt = only(inner);
            match kt.as_rule() {
                Rule::text_test => NodeTest::Kind(KindTest::Text),
                Rule::comment_test => NodeTest::Kind(KindTest::Comment),
                Rule::node_type_test => NodeTest::Kind(KindTest::Node),
                Rule::pi_test => {
                    let target = kt
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::string_literal)
                        .map(|p| strip_quotes(p.as_str()));
                    NodeTest::Kind(KindTest::ProcessingInstruction(target))
                }
                _ => unreachable!("grammar: unexpected kind test {:?}", kt.as_rule()),
            }
        }
        _ => unreachable!("grammar: unexpected node test {:?}", inner.as_rule()),
    }
}

fn qname_from_str(s: &str) -> QName {
    match s.split_once(':') {
        Some((prefix, local)) => QName::prefixed(prefix, local),
        None => QName::local(s),
    }
}

fn strip_quotes(s: &str) -> String {
    s[1..s.len() - 1].to_string()
}
