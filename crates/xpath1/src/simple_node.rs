//! In-memory tree implementing [`XPathNode`], used by the tests and the
//! examples and available to users who need a quick ad-hoc tree.
//!
//! Nodes are `Arc`-backed; identity is pointer identity. Every handle
//! produced by `build()` or by a tree accessor also owns the document it
//! came from, so query results stay usable after the original document
//! handle is dropped. Parent links are weak internally, which keeps the
//! tree cycle-free. The builder wires parent links at `build()` time,
//! which keeps construction order-free:
//!
//! ```
//! use xpath1::simple_node::{doc, elem, attr, text};
//! use xpath1::XPathNode;
//!
//! // <root id="r"><child>Hello</child></root>
//! let document = doc()
//!     .child(elem("root").attr(attr("id", "r")).child(elem("child").child(text("Hello"))))
//!     .build();
//! assert_eq!(document.string_value(), "Hello");
//! ```

use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use crate::model::{NodeKind, QName, XPathNode};
use crate::runtime::Error;

#[derive(Debug)]
struct Inner {
    kind: NodeKind,
    name: Option<QName>,
    // lexical prefix as written, reported by name() only
    prefix: Option<String>,
    // text / attribute / comment / PI / namespace content
    value: RwLock<Option<String>>,
    parent: RwLock<Option<Weak<Inner>>>,
    namespaces: RwLock<Vec<Arc<Inner>>>,
    attributes: RwLock<Vec<Arc<Inner>>>,
    children: RwLock<Vec<Arc<Inner>>>,
}

fn adopt(parent: &Arc<Inner>, child: &Arc<Inner>) {
    *child.parent.write().unwrap() = Some(Arc::downgrade(parent));
}

/// An `Arc`-backed node. Cloning is cheap; equality is node identity.
///
/// Besides the node itself, a handle holds the document root it was
/// obtained from, so the whole tree lives for as long as any handle into
/// it exists. A leaf handle kept from before its adoption into a builder
/// only owns itself; re-obtain it through the built document when the
/// document handle is going away.
#[derive(Clone)]
pub struct SimpleNode {
    node: Arc<Inner>,
    document: Arc<Inner>,
}

impl PartialEq for SimpleNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for SimpleNode {}

impl std::hash::Hash for SimpleNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.node), state);
    }
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNode")
            .field("kind", &self.node.kind)
            .field("name", &self.node.name)
            .field("value", &self.node.value)
            .finish_non_exhaustive()
    }
}

impl SimpleNode {
    fn standalone(
        kind: NodeKind,
        name: Option<QName>,
        prefix: Option<String>,
        value: Option<String>,
    ) -> Self {
        let node = Arc::new(Inner {
            kind,
            name,
            prefix,
            value: RwLock::new(value),
            parent: RwLock::new(None),
            namespaces: RwLock::new(Vec::new()),
            attributes: RwLock::new(Vec::new()),
            children: RwLock::new(Vec::new()),
        });
        SimpleNode { document: Arc::clone(&node), node }
    }

    /// A handle to `node` sharing this handle's document ownership.
    fn handle(&self, node: Arc<Inner>) -> SimpleNode {
        SimpleNode { node, document: Arc::clone(&self.document) }
    }

    /// Resolve a prefix against the in-scope declarations of this node's
    /// nearest element (the node itself when it is one).
    pub fn lookup_namespace_uri(&self, prefix: &str) -> Option<String> {
        let start = match self.kind() {
            NodeKind::Element => Some(self.clone()),
            _ => self.parent(),
        };
        let declarations = start?.namespaces().ok()?;
        declarations
            .iter()
            .find(|n| n.name().is_some_and(|q| q.local == prefix))
            .map(|n| n.string_value())
    }
}

/// Builder for a node and its subtree. Attribute and namespace arguments
/// are leaf nodes; children may be leaves or nested builders.
pub struct SimpleNodeBuilder {
    node: Arc<Inner>,
    pending_namespaces: Vec<Arc<Inner>>,
    pending_attributes: Vec<Arc<Inner>>,
    pending_children: Vec<Arc<Inner>>,
}

impl SimpleNodeBuilder {
    fn new(kind: NodeKind, name: Option<QName>, prefix: Option<String>) -> Self {
        Self {
            node: Arc::new(Inner {
                kind,
                name,
                prefix,
                value: RwLock::new(None),
                parent: RwLock::new(None),
                namespaces: RwLock::new(Vec::new()),
                attributes: RwLock::new(Vec::new()),
                children: RwLock::new(Vec::new()),
            }),
            pending_namespaces: Vec::new(),
            pending_attributes: Vec::new(),
            pending_children: Vec::new(),
        }
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<SimpleNodeOrBuilder>) -> Self {
        self.pending_children.push(child.into().into_inner());
        self
    }

    #[must_use]
    pub fn attr(mut self, attribute: SimpleNode) -> Self {
        debug_assert!(attribute.kind() == NodeKind::Attribute);
        self.pending_attributes.push(attribute.node);
        self
    }

    #[must_use]
    pub fn namespace(mut self, declaration: SimpleNode) -> Self {
        debug_assert!(declaration.kind() == NodeKind::Namespace);
        self.pending_namespaces.push(declaration.node);
        self
    }

    fn into_inner(self) -> Arc<Inner> {
        for ns in &self.pending_namespaces {
            adopt(&self.node, ns);
        }
        *self.node.namespaces.write().unwrap() = self.pending_namespaces;
        for attribute in &self.pending_attributes {
            adopt(&self.node, attribute);
        }
        *self.node.attributes.write().unwrap() = self.pending_attributes;
        for child in &self.pending_children {
            adopt(&self.node, child);
        }
        *self.node.children.write().unwrap() = self.pending_children;
        self.node
    }

    pub fn build(self) -> SimpleNode {
        let node = self.into_inner();
        SimpleNode { document: Arc::clone(&node), node }
    }
}

pub enum SimpleNodeOrBuilder {
    Built(SimpleNode),
    Builder(SimpleNodeBuilder),
}

impl SimpleNodeOrBuilder {
    fn into_inner(self) -> Arc<Inner> {
        match self {
            SimpleNodeOrBuilder::Built(n) => n.node,
            SimpleNodeOrBuilder::Builder(b) => b.into_inner(),
        }
    }
}

impl From<SimpleNode> for SimpleNodeOrBuilder {
    fn from(n: SimpleNode) -> Self {
        SimpleNodeOrBuilder::Built(n)
    }
}

impl From<SimpleNodeBuilder> for SimpleNodeOrBuilder {
    fn from(b: SimpleNodeBuilder) -> Self {
        SimpleNodeOrBuilder::Builder(b)
    }
}

/// Split a possibly prefixed lexical name into prefix and local part.
fn split_qualified(name: &str) -> (Option<String>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local),
        None => (None, name),
    }
}

pub fn doc() -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Root, None, None)
}

pub fn elem(name: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Element, Some(QName::local(name)), None)
}

/// A namespaced element. The name may carry a lexical prefix
/// (`"svg:rect"`); only the local part and the URI take part in
/// matching, the prefix is reported by `name()`.
pub fn elem_ns(uri: &str, name: &str) -> SimpleNodeBuilder {
    let (prefix, local) = split_qualified(name);
    SimpleNodeBuilder::new(NodeKind::Element, Some(QName::new(Some(uri), local)), prefix)
}

pub fn attr(name: &str, value: &str) -> SimpleNode {
    SimpleNode::standalone(
        NodeKind::Attribute,
        Some(QName::local(name)),
        None,
        Some(value.to_string()),
    )
}

/// A namespaced attribute; like [`elem_ns`] the name may carry a prefix.
pub fn attr_ns(uri: &str, name: &str, value: &str) -> SimpleNode {
    let (prefix, local) = split_qualified(name);
    SimpleNode::standalone(
        NodeKind::Attribute,
        Some(QName::new(Some(uri), local)),
        prefix,
        Some(value.to_string()),
    )
}

pub fn text(value: &str) -> SimpleNode {
    SimpleNode::standalone(NodeKind::Text, None, None, Some(value.to_string()))
}

pub fn comment(value: &str) -> SimpleNode {
    SimpleNode::standalone(NodeKind::Comment, None, None, Some(value.to_string()))
}

pub fn pi(target: &str, data: &str) -> SimpleNode {
    SimpleNode::standalone(
        NodeKind::ProcessingInstruction,
        Some(QName::local(target)),
        None,
        Some(data.to_string()),
    )
}

/// A namespace declaration node. The node's name is the prefix (empty
/// for the default namespace), its string-value is the URI.
pub fn ns(prefix: &str, uri: &str) -> SimpleNode {
    SimpleNode::standalone(
        NodeKind::Namespace,
        Some(QName::local(prefix)),
        None,
        Some(uri.to_string()),
    )
}

impl XPathNode for SimpleNode {
    fn kind(&self) -> NodeKind {
        self.node.kind
    }

    fn name(&self) -> Option<QName> {
        self.node.name.clone()
    }

    fn prefix(&self) -> Option<String> {
        self.node.prefix.clone()
    }

    fn string_value(&self) -> String {
        match self.node.kind {
            NodeKind::Root | NodeKind::Element => {
                fn collect(node: &Arc<Inner>, out: &mut String) {
                    if node.kind == NodeKind::Text {
                        if let Some(v) = &*node.value.read().unwrap() {
                            out.push_str(v);
                        }
                    }
                    for child in node.children.read().unwrap().iter() {
                        collect(child, out);
                    }
                }
                let mut out = String::new();
                collect(&self.node, &mut out);
                out
            }
            _ => self.node.value.read().unwrap().clone().unwrap_or_default(),
        }
    }

    fn parent(&self) -> Option<Self> {
        self.node
            .parent
            .read()
            .unwrap()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|p| self.handle(p))
    }

    fn children(&self) -> Vec<Self> {
        self.node
            .children
            .read()
            .unwrap()
            .iter()
            .map(|c| self.handle(Arc::clone(c)))
            .collect()
    }

    fn attributes(&self) -> Vec<Self> {
        self.node
            .attributes
            .read()
            .unwrap()
            .iter()
            .map(|a| self.handle(Arc::clone(a)))
            .collect()
    }

    /// In-scope declarations: this element's own plus the inherited
    /// ones, nearest declaration winning per prefix.
    fn namespaces(&self) -> Result<Vec<Self>, Error> {
        let mut in_scope: Vec<SimpleNode> = Vec::new();
        let mut current = Some(self.clone());
        while let Some(node) = current {
            for declaration in node.node.namespaces.read().unwrap().iter() {
                let prefix = declaration.name.as_ref().map(|q| q.local.clone());
                let seen = in_scope
                    .iter()
                    .any(|d| d.name().map(|q| q.local) == prefix);
                if !seen {
                    in_scope.push(self.handle(Arc::clone(declaration)));
                }
            }
            current = node.parent();
        }
        Ok(in_scope)
    }

    /// Elements are addressable through their `id` attribute.
    fn element_by_id(&self, id: &str) -> Option<Self> {
        fn search(node: &SimpleNode, id: &str) -> Option<SimpleNode> {
            if node.kind() == NodeKind::Element {
                let hit = node.attributes().iter().any(|a| {
                    a.name().is_some_and(|q| q.local == "id" && q.namespace_uri.is_none())
                        && a.string_value() == id
                });
                if hit {
                    return Some(node.clone());
                }
            }
            node.children().iter().find_map(|c| search(c, id))
        }
        search(&self.root(), id)
    }
}
