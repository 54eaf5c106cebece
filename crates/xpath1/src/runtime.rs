//! Evaluation runtime: the error taxonomy, namespace and variable
//! bindings, the function registry and the evaluation [`Context`].
//!
//! A `Context` is cheap to refocus: the bindings and the registry live in
//! a shared support block behind an `Arc`, so predicate evaluation can
//! derive a fresh focus (node, position, size) per candidate without
//! copying any tables.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{QName, XPathNode};
use crate::value::Value;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Everything that can go wrong while parsing or evaluating. Errors are
/// final; no call ever retries or returns a partial result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("syntax error at offset {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("function {name}(): {message}")]
    FunctionCall { name: String, message: String },

    /// An unbound variable, an unknown function or an unresolvable
    /// namespace prefix.
    #[error("unresolved {kind} '{name}'")]
    Unresolvable { kind: &'static str, name: String },

    /// The node model does not provide the data this axis needs.
    #[error("axis '{0}' is not supported by this node model")]
    UnsupportedAxis(&'static str),

    #[error("type error: expected {expected}, got {actual}")]
    TypeError {
        expected: &'static str,
        actual: &'static str,
    },
}

impl Error {
    pub fn unknown_function(name: impl Into<String>) -> Self {
        Error::Unresolvable { kind: "function", name: name.into() }
    }

    pub fn unbound_variable(name: impl Into<String>) -> Self {
        Error::Unresolvable { kind: "variable", name: name.into() }
    }

    pub fn unknown_prefix(name: impl Into<String>) -> Self {
        Error::Unresolvable { kind: "namespace prefix", name: name.into() }
    }
}

/// Prefix to namespace-URI bindings for the expression. The `xml` prefix
/// is always bound to the XML namespace and cannot be rebound.
#[derive(Debug, Clone, Default)]
pub struct NamespaceBindings {
    by_prefix: HashMap<String, String>,
}

impl NamespaceBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix` to `uri`. Rebinding `xml` is ignored.
    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        if prefix == "xml" {
            return;
        }
        self.by_prefix.insert(prefix, uri.into());
    }

    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.by_prefix.get(prefix).map(String::as_str)
    }

    /// Expand a lexical name from the expression into a model name.
    /// A missing prefix means "no namespace"; an unbound prefix is an
    /// error, never a silent no-match.
    pub fn expand(&self, name: &crate::parser::ast::QName) -> Result<QName, Error> {
        match &name.prefix {
            None => Ok(QName::local(name.local.clone())),
            Some(p) => {
                let uri = self
                    .resolve(p)
                    .ok_or_else(|| Error::unknown_prefix(p.clone()))?;
                Ok(QName::new(Some(uri), name.local.clone()))
            }
        }
    }
}

/// A registered function. Implementations receive the call-site context
/// and the already-evaluated arguments.
pub type FunctionImpl<N> =
    dyn Fn(&Context<N>, Vec<Value<N>>) -> Result<Value<N>, Error> + Send + Sync;

struct FunctionEntry<N: XPathNode> {
    min_args: usize,
    max_args: Option<usize>,
    body: Arc<FunctionImpl<N>>,
}

/// Function registry keyed by expanded name. The core library lives in
/// no namespace; extension libraries register under their own URIs.
/// There is no global registry; every context carries its own `Arc` to
/// one of these.
pub struct FunctionLibrary<N: XPathNode> {
    entries: HashMap<QName, FunctionEntry<N>>,
}

impl<N: XPathNode> Default for FunctionLibrary<N> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<N: XPathNode> FunctionLibrary<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function accepting between `min_args` and `max_args`
    /// arguments; `None` for `max_args` means variadic.
    pub fn register<F>(
        &mut self,
        name: QName,
        min_args: usize,
        max_args: Option<usize>,
        body: F,
    ) where
        F: Fn(&Context<N>, Vec<Value<N>>) -> Result<Value<N>, Error> + Send + Sync + 'static,
    {
        self.entries
            .insert(name, FunctionEntry { min_args, max_args, body: Arc::new(body) });
    }

    pub fn contains(&self, name: &QName) -> bool {
        self.entries.contains_key(name)
    }

    /// Arity-check and invoke. The argument count is checked against the
    /// registered range before the body runs.
    pub fn call(
        &self,
        name: &QName,
        context: &Context<N>,
        args: Vec<Value<N>>,
    ) -> Result<Value<N>, Error> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| Error::unknown_function(name.local.clone()))?;
        let n = args.len();
        let max_ok = entry.max_args.is_none_or(|max| n <= max);
        if n < entry.min_args || !max_ok {
            let expected = match entry.max_args {
                Some(max) if max == entry.min_args => format!("{max}"),
                Some(max) => format!("{} to {max}", entry.min_args),
                None => format!("at least {}", entry.min_args),
            };
            return Err(Error::FunctionCall {
                name: name.local.clone(),
                message: format!("expected {expected} argument(s), got {n}"),
            });
        }
        (entry.body)(context, args)
    }
}

/// Shared, immutable part of a context: everything except the focus.
pub struct ContextSupport<N: XPathNode> {
    pub namespaces: NamespaceBindings,
    pub variables: HashMap<QName, Value<N>>,
    pub functions: Arc<FunctionLibrary<N>>,
}

/// An evaluation context: the focus triple (context node, 1-based
/// position, size) plus the shared bindings.
pub struct Context<N: XPathNode> {
    pub node: N,
    pub position: usize,
    pub size: usize,
    support: Arc<ContextSupport<N>>,
}

impl<N: XPathNode> Clone for Context<N> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            position: self.position,
            size: self.size,
            support: Arc::clone(&self.support),
        }
    }
}

impl<N: XPathNode> Context<N> {
    /// A context on `node` with position 1 of 1, the core function
    /// library and no extra bindings.
    pub fn new(node: N) -> Self {
        ContextBuilder::new(node).build()
    }

    /// The same bindings focused on a different node.
    pub fn with_focus(&self, node: N, position: usize, size: usize) -> Self {
        Self { node, position, size, support: Arc::clone(&self.support) }
    }

    pub fn namespaces(&self) -> &NamespaceBindings {
        &self.support.namespaces
    }

    pub fn variable(&self, name: &QName) -> Option<&Value<N>> {
        self.support.variables.get(name)
    }

    pub fn functions(&self) -> &FunctionLibrary<N> {
        &self.support.functions
    }
}

/// Builder for [`Context`]. The function registry defaults to
/// [`crate::functions::core_function_library`].
pub struct ContextBuilder<N: XPathNode> {
    node: N,
    position: usize,
    size: usize,
    namespaces: NamespaceBindings,
    variables: HashMap<QName, Value<N>>,
    functions: Option<Arc<FunctionLibrary<N>>>,
}

impl<N: XPathNode> ContextBuilder<N> {
    pub fn new(node: N) -> Self {
        Self {
            node,
            position: 1,
            size: 1,
            namespaces: NamespaceBindings::new(),
            variables: HashMap::new(),
            functions: None,
        }
    }

    #[must_use]
    pub fn focus(mut self, position: usize, size: usize) -> Self {
        self.position = position;
        self.size = size;
        self
    }

    #[must_use]
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.bind(prefix, uri);
        self
    }

    /// Bind a variable in no namespace.
    #[must_use]
    pub fn variable(mut self, local: impl Into<String>, value: impl Into<Value<N>>) -> Self {
        self.variables.insert(QName::local(local), value.into());
        self
    }

    /// Bind a variable in a namespace.
    #[must_use]
    pub fn variable_ns(
        mut self,
        uri: impl Into<String>,
        local: impl Into<String>,
        value: impl Into<Value<N>>,
    ) -> Self {
        self.variables.insert(QName::new(Some(uri), local), value.into());
        self
    }

    /// Replace the function registry. The replacement registry must
    /// register the core functions itself if they should stay available.
    #[must_use]
    pub fn functions(mut self, functions: Arc<FunctionLibrary<N>>) -> Self {
        self.functions = Some(functions);
        self
    }

    pub fn build(self) -> Context<N> {
        let functions = self
            .functions
            .unwrap_or_else(|| Arc::new(crate::functions::core_function_library()));
        Context {
            node: self.node,
            position: self.position,
            size: self.size,
            support: Arc::new(ContextSupport {
                namespaces: self.namespaces,
                variables: self.variables,
                functions,
            }),
        }
    }
}
