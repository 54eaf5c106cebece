//! AST-walking evaluator.
//!
//! Location path semantics follow XPath 1.0 closely: each step maps every
//! context node through its axis in axis order, filters by the node test,
//! then applies the predicates one at a time with position and size
//! recomputed per predicate. Step results are concatenated per context
//! node without deduplication; only unions sort and deduplicate.

use smallvec::SmallVec;

use crate::model::{NodeKind, XPathNode, sort_document_order};
use crate::parser::ast::{
    AdditiveOp, Axis, EqualityOp, Expr, KindTest, LocationPath, MultiplicativeOp, NameTest,
    NodeTest, RelationalOp, Step,
};
use crate::runtime::{Context, Error};
use crate::value::{Value, round_half_up};

/// Evaluate an expression against a context.
pub fn evaluate<N: XPathNode>(expr: &Expr, context: &Context<N>) -> Result<Value<N>, Error> {
    match expr {
        Expr::Or(l, r) => {
            if evaluate(l, context)?.boolean() {
                Ok(Value::Boolean(true))
            } else {
                Ok(Value::Boolean(evaluate(r, context)?.boolean()))
            }
        }
        Expr::And(l, r) => {
            if evaluate(l, context)?.boolean() {
                Ok(Value::Boolean(evaluate(r, context)?.boolean()))
            } else {
                Ok(Value::Boolean(false))
            }
        }
        Expr::Equality { op, left, right } => {
            let l = evaluate(left, context)?;
            let r = evaluate(right, context)?;
            Ok(Value::Boolean(compare_equality(*op, &l, &r)))
        }
        Expr::Relational { op, left, right } => {
            let l = evaluate(left, context)?;
            let r = evaluate(right, context)?;
            Ok(Value::Boolean(compare_relational(*op, &l, &r)))
        }
        Expr::Additive { op, left, right } => {
            let l = evaluate(left, context)?.number();
            let r = evaluate(right, context)?.number();
            Ok(Value::Number(match op {
                AdditiveOp::Add => l + r,
                AdditiveOp::Sub => l - r,
            }))
        }
        Expr::Multiplicative { op, left, right } => {
            let l = evaluate(left, context)?.number();
            let r = evaluate(right, context)?.number();
            // div and mod are IEEE 754: division by zero yields an
            // infinity or NaN, mod keeps the sign of the dividend.
            Ok(Value::Number(match op {
                MultiplicativeOp::Mul => l * r,
                MultiplicativeOp::Div => l / r,
                MultiplicativeOp::Mod => l % r,
            }))
        }
        Expr::Negate(e) => Ok(Value::Number(-evaluate(e, context)?.number())),
        Expr::Union(l, r) => {
            let mut nodes = evaluate(l, context)?.into_node_set()?;
            nodes.extend(evaluate(r, context)?.into_node_set()?);
            sort_document_order(&mut nodes);
            Ok(Value::NodeSet(nodes))
        }
        Expr::Path(path) => {
            let nodes = eval_location_path(path, context)?;
            Ok(Value::NodeSet(nodes))
        }
        Expr::Filter { primary, predicates, path } => {
            let mut nodes = evaluate(primary, context)?.into_node_set()?;
            for predicate in predicates {
                nodes = filter_predicate(nodes, predicate, context)?;
            }
            if let Some(lp) = path {
                let mut out = Vec::new();
                for node in nodes {
                    let sub = context.with_focus(node, 1, 1);
                    out.extend(eval_steps(&lp.steps, &sub)?);
                }
                nodes = out;
            }
            Ok(Value::NodeSet(nodes))
        }
        Expr::FunctionCall { name, args } => {
            let expanded = context.namespaces().expand(name)?;
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate(arg, context)?);
            }
            tracing::trace!(function = %name, args = values.len(), "calling function");
            context.functions().call(&expanded, context, values)
        }
        Expr::VariableRef(name) => {
            let expanded = context.namespaces().expand(name)?;
            context
                .variable(&expanded)
                .cloned()
                .ok_or_else(|| Error::unbound_variable(name.to_string()))
        }
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Literal(s) => Ok(Value::String(s.clone())),
    }
}

fn eval_location_path<N: XPathNode>(
    path: &LocationPath,
    context: &Context<N>,
) -> Result<Vec<N>, Error> {
    let start = if path.absolute { context.node.root() } else { context.node.clone() };
    let sub = context.with_focus(start, 1, 1);
    eval_steps(&path.steps, &sub)
}

fn eval_steps<N: XPathNode>(steps: &[Step], context: &Context<N>) -> Result<Vec<N>, Error> {
    let mut current = vec![context.node.clone()];
    for step in steps {
        let mut next = Vec::new();
        for node in &current {
            let candidates = apply_axis(node, step.axis)?;
            let mut survivors = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                if matches_test(&candidate, &step.test, step.axis, context)? {
                    survivors.push(candidate);
                }
            }
            for predicate in &step.predicates {
                survivors = filter_predicate(survivors, predicate, context)?;
            }
            next.extend(survivors);
        }
        current = next;
    }
    Ok(current)
}

/// Keep the nodes for which the predicate holds. Position and size are
/// the proximity positions within `nodes`; for reverse axes the list is
/// already nearest-first, which is exactly proximity order.
fn filter_predicate<N: XPathNode>(
    nodes: Vec<N>,
    predicate: &Expr,
    context: &Context<N>,
) -> Result<Vec<N>, Error> {
    let size = nodes.len();
    let mut kept = Vec::with_capacity(size);
    for (i, node) in nodes.into_iter().enumerate() {
        let position = i + 1;
        let sub = context.with_focus(node.clone(), position, size);
        let value = evaluate(predicate, &sub)?;
        if predicate_truth(&value, position) {
            kept.push(node);
        }
    }
    Ok(kept)
}

/// A numeric predicate selects by position; everything else goes through
/// the boolean coercion.
fn predicate_truth<N: XPathNode>(value: &Value<N>, position: usize) -> bool {
    match value {
        #[allow(clippy::cast_precision_loss)]
        Value::Number(n) => round_half_up(*n) == position as f64,
        other => other.boolean(),
    }
}

type Candidates<N> = SmallVec<[N; 8]>;

/// All nodes on `axis` from `node`, in axis order: document order for
/// forward axes, nearest-first for reverse axes.
fn apply_axis<N: XPathNode>(node: &N, axis: Axis) -> Result<Candidates<N>, Error> {
    let mut out = Candidates::new();
    match axis {
        Axis::SelfAxis => out.push(node.clone()),
        Axis::Child => out.extend(node.children()),
        Axis::Parent => out.extend(node.parent()),
        Axis::Attribute => out.extend(node.attributes()),
        Axis::Namespace => {
            if node.kind() == NodeKind::Element {
                out.extend(node.namespaces()?);
            }
        }
        Axis::Descendant => {
            for child in node.children() {
                push_subtree(&child, &mut out);
            }
        }
        Axis::DescendantOrSelf => push_subtree(node, &mut out),
        Axis::Ancestor => {
            let mut current = node.parent();
            while let Some(n) = current {
                current = n.parent();
                out.push(n);
            }
        }
        Axis::AncestorOrSelf => {
            out.push(node.clone());
            let mut current = node.parent();
            while let Some(n) = current {
                current = n.parent();
                out.push(n);
            }
        }
        Axis::FollowingSibling => {
            if !is_attached(node) {
                if let Some(parent) = node.parent() {
                    let siblings = parent.children();
                    let skip = siblings.iter().position(|s| s == node).map_or(0, |i| i + 1);
                    out.extend(siblings.into_iter().skip(skip));
                }
            }
        }
        Axis::PrecedingSibling => {
            if !is_attached(node) {
                if let Some(parent) = node.parent() {
                    let siblings = parent.children();
                    let end = siblings.iter().position(|s| s == node).unwrap_or(0);
                    out.extend(siblings.into_iter().take(end).rev());
                }
            }
        }
        Axis::Following => {
            // Attribute and namespace nodes come before their element's
            // children, so those children are part of the following axis.
            let mut current = node.clone();
            if is_attached(node) {
                if let Some(element) = node.parent() {
                    for child in element.children() {
                        push_subtree(&child, &mut out);
                    }
                    current = element;
                }
            }
            while let Some(parent) = current.parent() {
                let siblings = parent.children();
                let skip =
                    siblings.iter().position(|s| s == &current).map_or(0, |i| i + 1);
                for sibling in siblings.into_iter().skip(skip) {
                    push_subtree(&sibling, &mut out);
                }
                current = parent;
            }
        }
        Axis::Preceding => {
            let mut current =
                if is_attached(node) { node.parent() } else { Some(node.clone()) };
            while let Some(n) = current {
                let parent = n.parent();
                if let Some(p) = &parent {
                    let siblings = p.children();
                    let end = siblings.iter().position(|s| s == &n).unwrap_or(0);
                    for sibling in siblings[..end].iter().rev() {
                        let mut subtree = Candidates::new();
                        push_subtree(sibling, &mut subtree);
                        out.extend(subtree.into_iter().rev());
                    }
                }
                current = parent;
            }
        }
    }
    Ok(out)
}

/// Preorder (document order) traversal of `node` and its descendants.
/// Attributes and namespace nodes are not descendants.
fn push_subtree<N: XPathNode>(node: &N, out: &mut Candidates<N>) {
    out.push(node.clone());
    for child in node.children() {
        push_subtree(&child, out);
    }
}

/// Attribute and namespace nodes have an element parent but are not
/// children of it; the sibling axes are empty for them.
fn is_attached<N: XPathNode>(node: &N) -> bool {
    matches!(node.kind(), NodeKind::Attribute | NodeKind::Namespace)
}

/// The principal node type of an axis: attributes for the attribute
/// axis, namespace nodes for the namespace axis, elements otherwise.
fn principal_kind(axis: Axis) -> NodeKind {
    match axis {
        Axis::Attribute => NodeKind::Attribute,
        Axis::Namespace => NodeKind::Namespace,
        _ => NodeKind::Element,
    }
}

fn matches_test<N: XPathNode>(
    node: &N,
    test: &NodeTest,
    axis: Axis,
    context: &Context<N>,
) -> Result<bool, Error> {
    match test {
        NodeTest::Kind(KindTest::Node) => Ok(true),
        NodeTest::Kind(KindTest::Text) => Ok(node.kind() == NodeKind::Text),
        NodeTest::Kind(KindTest::Comment) => Ok(node.kind() == NodeKind::Comment),
        NodeTest::Kind(KindTest::ProcessingInstruction(target)) => {
            if node.kind() != NodeKind::ProcessingInstruction {
                return Ok(false);
            }
            match target {
                None => Ok(true),
                Some(t) => Ok(node.name().is_some_and(|n| n.local == *t)),
            }
        }
        NodeTest::Name(name_test) => {
            if node.kind() != principal_kind(axis) {
                return Ok(false);
            }
            match name_test {
                NameTest::Any => Ok(true),
                NameTest::NamespaceAny(prefix) => {
                    let uri = context
                        .namespaces()
                        .resolve(prefix)
                        .ok_or_else(|| Error::unknown_prefix(prefix.clone()))?;
                    Ok(node
                        .name()
                        .is_some_and(|n| n.namespace_uri.as_deref() == Some(uri)))
                }
                NameTest::Named(qname) => {
                    let expected = context.namespaces().expand(qname)?;
                    Ok(node.name().is_some_and(|n| n == expected))
                }
            }
        }
    }
}

fn compare_equality<N: XPathNode>(op: EqualityOp, left: &Value<N>, right: &Value<N>) -> bool {
    let string_cmp = |a: &str, b: &str| match op {
        EqualityOp::Eq => a == b,
        EqualityOp::Ne => a != b,
    };
    let number_cmp = |a: f64, b: f64| match op {
        EqualityOp::Eq => a == b,
        EqualityOp::Ne => a != b,
    };
    match (left, right) {
        // Node-set comparisons are existential over string-values.
        (Value::NodeSet(l), Value::NodeSet(r)) => {
            let rs: Vec<String> = r.iter().map(XPathNode::string_value).collect();
            l.iter()
                .any(|a| rs.iter().any(|b| string_cmp(&a.string_value(), b)))
        }
        (Value::NodeSet(nodes), Value::Number(n))
        | (Value::Number(n), Value::NodeSet(nodes)) => nodes
            .iter()
            .any(|a| number_cmp(crate::value::parse_number(&a.string_value()), *n)),
        (Value::NodeSet(nodes), Value::String(s))
        | (Value::String(s), Value::NodeSet(nodes)) => {
            nodes.iter().any(|a| string_cmp(&a.string_value(), s))
        }
        (Value::NodeSet(_), Value::Boolean(b)) => match op {
            EqualityOp::Eq => left.boolean() == *b,
            EqualityOp::Ne => left.boolean() != *b,
        },
        (Value::Boolean(b), Value::NodeSet(_)) => match op {
            EqualityOp::Eq => *b == right.boolean(),
            EqualityOp::Ne => *b != right.boolean(),
        },
        // Neither side a node-set: booleans win, then numbers, then strings.
        (Value::Boolean(_), _) | (_, Value::Boolean(_)) => match op {
            EqualityOp::Eq => left.boolean() == right.boolean(),
            EqualityOp::Ne => left.boolean() != right.boolean(),
        },
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            number_cmp(left.number(), right.number())
        }
        _ => string_cmp(&left.string(), &right.string()),
    }
}

fn compare_relational<N: XPathNode>(
    op: RelationalOp,
    left: &Value<N>,
    right: &Value<N>,
) -> bool {
    let cmp = |a: f64, b: f64| match op {
        RelationalOp::Lt => a < b,
        RelationalOp::Gt => a > b,
        RelationalOp::Le => a <= b,
        RelationalOp::Ge => a >= b,
    };
    // Relational comparison is numeric; node-sets are existential.
    match (left, right) {
        (Value::NodeSet(l), Value::NodeSet(r)) => {
            let rs: Vec<f64> = r
                .iter()
                .map(|n| crate::value::parse_number(&n.string_value()))
                .collect();
            l.iter().any(|a| {
                let an = crate::value::parse_number(&a.string_value());
                rs.iter().any(|&bn| cmp(an, bn))
            })
        }
        (Value::NodeSet(nodes), other) => {
            let b = other.number();
            nodes
                .iter()
                .any(|a| cmp(crate::value::parse_number(&a.string_value()), b))
        }
        (other, Value::NodeSet(nodes)) => {
            let a = other.number();
            nodes
                .iter()
                .any(|b| cmp(a, crate::value::parse_number(&b.string_value())))
        }
        _ => cmp(left.number(), right.number()),
    }
}

/// A parsed, reusable expression.
#[derive(Debug, Clone)]
pub struct XPath {
    expr: Expr,
}

impl XPath {
    pub fn new(expression: &str) -> Result<Self, Error> {
        Ok(Self { expr: crate::parser::parse(expression)? })
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn evaluate<N: XPathNode>(&self, context: &Context<N>) -> Result<Value<N>, Error> {
        tracing::debug!(expr = %self.expr, "evaluating");
        evaluate(&self.expr, context)
    }

    /// The result as a node-set, sorted into document order. A non-node
    /// result is a type error.
    pub fn select_nodes<N: XPathNode>(&self, context: &Context<N>) -> Result<Vec<N>, Error> {
        let mut nodes = self.evaluate(context)?.into_node_set()?;
        sort_document_order(&mut nodes);
        Ok(nodes)
    }

    /// The first selected node in document order, if any.
    pub fn select_single_node<N: XPathNode>(
        &self,
        context: &Context<N>,
    ) -> Result<Option<N>, Error> {
        let nodes = self.evaluate(context)?.into_node_set()?;
        Ok(crate::value::first_in_document_order(&nodes))
    }

    pub fn string_value_of<N: XPathNode>(&self, context: &Context<N>) -> Result<String, Error> {
        Ok(self.evaluate(context)?.string())
    }

    pub fn boolean_value_of<N: XPathNode>(&self, context: &Context<N>) -> Result<bool, Error> {
        Ok(self.evaluate(context)?.boolean())
    }

    pub fn number_value_of<N: XPathNode>(&self, context: &Context<N>) -> Result<f64, Error> {
        Ok(self.evaluate(context)?.number())
    }
}

impl std::str::FromStr for XPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
