//! The node model the evaluator runs against.
//!
//! Anything that can answer the [`XPathNode`] questions can be queried:
//! an XML DOM, a UI widget tree, a filesystem. The engine never assumes a
//! concrete tree type; it only walks handles.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use smallvec::SmallVec;

use crate::runtime::Error;

/// Node classification. `Namespace` nodes only ever appear on the
/// namespace axis; `Attribute` nodes only on the attribute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

/// Expanded node name: resolved namespace URI plus local part. The lexical
/// prefix is irrelevant for matching and is not stored here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QName {
    pub namespace_uri: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace_uri: Option<impl Into<String>>, local: impl Into<String>) -> Self {
        Self { namespace_uri: namespace_uri.map(Into::into), local: local.into() }
    }

    pub fn local(local: impl Into<String>) -> Self {
        Self { namespace_uri: None, local: local.into() }
    }
}

/// A handle into some tree. Handles are cheap to clone and compare equal
/// exactly when they designate the same node.
///
/// Default implementations cover the optional surface: trees without
/// namespace support keep the default [`namespaces`](Self::namespaces)
/// (the namespace axis then reports [`Error::UnsupportedAxis`]), and
/// trees without ID semantics keep [`element_by_id`](Self::element_by_id)
/// returning `None`, which makes `id()` select nothing.
pub trait XPathNode: Debug + Clone + PartialEq + Eq + Hash {
    fn kind(&self) -> NodeKind;

    /// Expanded name. `None` for root, text and comment nodes. For
    /// processing instructions the local part is the target; for
    /// namespace nodes it is the declared prefix (empty for the default
    /// namespace declaration).
    fn name(&self) -> Option<QName>;

    /// The lexical namespace prefix as written in the document, when the
    /// tree retains it. Only `name()` reports it; matching never looks at
    /// prefixes.
    fn prefix(&self) -> Option<String> {
        None
    }

    /// String-value per the XPath data model: concatenated descendant
    /// text for root and element nodes, the literal content otherwise.
    fn string_value(&self) -> String;

    fn parent(&self) -> Option<Self>;

    fn children(&self) -> Vec<Self>;

    /// Attribute nodes of an element, in a stable order. Empty for
    /// non-elements. Namespace declarations are not attributes.
    fn attributes(&self) -> Vec<Self>;

    /// In-scope namespace nodes of an element (own declarations plus
    /// inherited ones, nearest declaration winning per prefix).
    fn namespaces(&self) -> Result<Vec<Self>, Error> {
        Err(Error::UnsupportedAxis("namespace"))
    }

    /// The element carrying the given ID, if the tree models IDs.
    fn element_by_id(&self, _id: &str) -> Option<Self> {
        None
    }

    /// The root of the tree this node belongs to.
    fn root(&self) -> Self {
        let mut node = self.clone();
        while let Some(p) = node.parent() {
            node = p;
        }
        node
    }
}

/// Position of a child among its parent's children, with attributes and
/// namespace nodes slotted before child nodes so that document order is
/// total within one tree.
fn sibling_index<N: XPathNode>(node: &N, parent: &N) -> usize {
    // attribute/namespace nodes order: namespaces, then attributes, then children
    match node.kind() {
        NodeKind::Namespace => {
            if let Ok(ns) = parent.namespaces() {
                if let Some(i) = ns.iter().position(|n| n == node) {
                    return i;
                }
            }
            0
        }
        NodeKind::Attribute => {
            let ns_count = parent.namespaces().map(|v| v.len()).unwrap_or(0);
            ns_count + parent.attributes().iter().position(|n| n == node).unwrap_or(0)
        }
        _ => {
            let ns_count = parent.namespaces().map(|v| v.len()).unwrap_or(0);
            let attr_count = parent.attributes().len();
            ns_count
                + attr_count
                + parent.children().iter().position(|n| n == node).unwrap_or(0)
        }
    }
}

/// Compare two nodes by document order. Nodes from different trees have
/// no document order; they compare [`Equal`](std::cmp::Ordering::Equal)
/// so that sorting is total and stable sorts keep their input order.
pub fn document_order<N: XPathNode>(a: &N, b: &N) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    if a == b {
        return Ordering::Equal;
    }

    let path_a = ancestry(a);
    let path_b = ancestry(b);
    if path_a.last() != path_b.last() {
        // different trees
        return Ordering::Equal;
    }

    // Walk down from the shared root until the paths diverge.
    let mut ia = path_a.iter().rev();
    let mut ib = path_b.iter().rev();
    loop {
        match (ia.next(), ib.next()) {
            (Some(na), Some(nb)) if na == nb => {}
            (Some(na), Some(nb)) => {
                let parent = na.parent().expect("diverging nodes share a parent");
                return sibling_index(na, &parent).cmp(&sibling_index(nb, &parent));
            }
            // One path is a prefix of the other: the ancestor comes first.
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        }
    }
}

/// Self-to-root path. Most trees are shallow; sixteen hops covers the
/// common case without a heap allocation.
fn ancestry<N: XPathNode>(node: &N) -> SmallVec<[N; 16]> {
    let mut path = SmallVec::new();
    let mut current = node.clone();
    loop {
        let parent = current.parent();
        path.push(current);
        match parent {
            Some(p) => current = p,
            None => return path,
        }
    }
}

/// Sort into document order and drop duplicates. Used after unions and
/// for the multi-step result merging of location paths.
///
/// Duplicates are removed by node identity before sorting, so the result
/// is unique even when the input spans trees. Nodes are grouped per tree
/// (trees keep their first-appearance order) and sorted within each
/// group, where [`document_order`] is a total order.
pub fn sort_document_order<N: XPathNode>(nodes: &mut Vec<N>) {
    if nodes.len() < 2 {
        return;
    }
    let mut seen: HashSet<N> = HashSet::with_capacity(nodes.len());
    let mut trees: Vec<(N, Vec<N>)> = Vec::new();
    for node in nodes.drain(..) {
        if !seen.insert(node.clone()) {
            continue;
        }
        let root = node.root();
        match trees.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(node),
            None => trees.push((root, vec![node])),
        }
    }
    for (_, members) in &mut trees {
        members.sort_by(document_order);
        nodes.append(members);
    }
}
