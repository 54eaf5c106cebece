//! An XPath 1.0 expression engine over a pluggable node model.
//!
//! The engine never parses XML; it evaluates expressions against any tree
//! whose nodes implement [`XPathNode`]. Parsing and evaluation are
//! separate: [`parse`] yields an AST, [`XPath`] wraps one for repeated
//! evaluation against different contexts.
//!
//! ```
//! use xpath1::simple_node::{doc, elem, text};
//! use xpath1::{Context, XPath};
//!
//! let document = doc()
//!     .child(
//!         elem("library")
//!             .child(elem("book").child(text("Dune")))
//!             .child(elem("book").child(text("Hyperion"))),
//!     )
//!     .build();
//!
//! let query = XPath::new("/library/book[2]").unwrap();
//! let context = Context::new(document);
//! assert_eq!(query.string_value_of(&context).unwrap(), "Hyperion");
//! ```

pub mod evaluator;
pub mod functions;
pub mod model;
pub mod parser;
pub mod runtime;
pub mod simple_node;
pub mod value;

pub use evaluator::{XPath, evaluate};
pub use model::{NodeKind, XPathNode};
pub use parser::parse;
pub use runtime::{Context, ContextBuilder, Error, FunctionLibrary, NamespaceBindings};
pub use value::Value;
