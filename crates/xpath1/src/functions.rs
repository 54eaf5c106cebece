//! The XPath 1.0 core function library.
//!
//! Every function is a stateless callable over (context, argument list).
//! Arity is enforced by the registry before a body runs, so bodies only
//! distinguish "argument present" from "defaulted to the context node".
//! Character positions and lengths are counted in `char`s, never code
//! units.

use crate::model::{QName, XPathNode};
use crate::runtime::{Context, Error, FunctionLibrary, XML_NAMESPACE};
use crate::value::{Value, XML_WHITESPACE, first_in_document_order, parse_number, round_half_up};

/// Build a registry holding the 27 core functions. Contexts built by
/// [`crate::runtime::ContextBuilder`] use this library unless another
/// one is supplied.
pub fn core_function_library<N: XPathNode>() -> FunctionLibrary<N> {
    let mut lib = FunctionLibrary::new();
    register_node_set_functions(&mut lib);
    register_string_functions(&mut lib);
    register_boolean_functions(&mut lib);
    register_number_functions(&mut lib);
    lib
}

/// The argument when present, otherwise the context node as a singleton
/// node-set. Backs the 0-or-1-argument functions.
fn arg_or_context<N: XPathNode>(
    context: &Context<N>,
    args: Vec<Value<N>>,
) -> Value<N> {
    args.into_iter()
        .next()
        .unwrap_or_else(|| Value::NodeSet(vec![context.node.clone()]))
}

/// The first node (in document order) of an optional node-set argument.
fn optional_node_arg<N: XPathNode>(
    context: &Context<N>,
    args: Vec<Value<N>>,
) -> Result<Option<N>, Error> {
    match args.into_iter().next() {
        None => Ok(Some(context.node.clone())),
        Some(v) => {
            let nodes = v.into_node_set()?;
            Ok(first_in_document_order(&nodes))
        }
    }
}

fn register_node_set_functions<N: XPathNode>(lib: &mut FunctionLibrary<N>) {
    #[allow(clippy::cast_precision_loss)]
    lib.register(QName::local("last"), 0, Some(0), |ctx, _| {
        Ok(Value::Number(ctx.size as f64))
    });

    #[allow(clippy::cast_precision_loss)]
    lib.register(QName::local("position"), 0, Some(0), |ctx, _| {
        Ok(Value::Number(ctx.position as f64))
    });

    #[allow(clippy::cast_precision_loss)]
    lib.register(QName::local("count"), 1, Some(1), |_, args| {
        let nodes = take_one(args).into_node_set()?;
        Ok(Value::Number(nodes.len() as f64))
    });

    // Tokenize on whitespace and resolve each token through the model.
    // Unresolvable IDs are skipped; discovery order is preserved and
    // repeated hits are dropped.
    lib.register(QName::local("id"), 1, Some(1), |ctx, args| {
        let arg = take_one(args);
        let tokens: Vec<String> = match &arg {
            Value::NodeSet(nodes) => nodes
                .iter()
                .flat_map(|n| {
                    n.string_value()
                        .split(XML_WHITESPACE)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .collect(),
            other => other
                .string()
                .split(XML_WHITESPACE)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        };
        let mut found: Vec<N> = Vec::new();
        for token in tokens {
            if let Some(element) = ctx.node.element_by_id(&token) {
                if !found.contains(&element) {
                    found.push(element);
                }
            }
        }
        Ok(Value::NodeSet(found))
    });

    lib.register(QName::local("local-name"), 0, Some(1), |ctx, args| {
        let node = optional_node_arg(ctx, args)?;
        let name = node.and_then(|n| n.name()).map(|q| q.local).unwrap_or_default();
        Ok(Value::String(name))
    });

    lib.register(QName::local("namespace-uri"), 0, Some(1), |ctx, args| {
        let node = optional_node_arg(ctx, args)?;
        let uri = node
            .and_then(|n| n.name())
            .and_then(|q| q.namespace_uri)
            .unwrap_or_default();
        Ok(Value::String(uri))
    });

    // Qualified name as written in the document: prefix:local when the
    // model retains a prefix, the local part alone otherwise.
    lib.register(QName::local("name"), 0, Some(1), |ctx, args| {
        let name = match optional_node_arg(ctx, args)? {
            Some(node) => {
                let local = node.name().map(|q| q.local).unwrap_or_default();
                match node.prefix() {
                    Some(p) if !p.is_empty() && !local.is_empty() => format!("{p}:{local}"),
                    _ => local,
                }
            }
            None => String::new(),
        };
        Ok(Value::String(name))
    });
}

fn register_string_functions<N: XPathNode>(lib: &mut FunctionLibrary<N>) {
    lib.register(QName::local("string"), 0, Some(1), |ctx, args| {
        Ok(Value::String(arg_or_context(ctx, args).string()))
    });

    lib.register(QName::local("concat"), 2, None, |_, args| {
        let mut out = String::new();
        for arg in args {
            out.push_str(&arg.string());
        }
        Ok(Value::String(out))
    });

    lib.register(QName::local("starts-with"), 2, Some(2), |_, args| {
        let [a, b] = take_two(args);
        Ok(Value::Boolean(a.string().starts_with(&b.string())))
    });

    lib.register(QName::local("contains"), 2, Some(2), |_, args| {
        let [a, b] = take_two(args);
        Ok(Value::Boolean(a.string().contains(&b.string())))
    });

    lib.register(QName::local("substring-before"), 2, Some(2), |_, args| {
        let [a, b] = take_two(args);
        let haystack = a.string();
        let result = haystack
            .find(&b.string())
            .map(|i| haystack[..i].to_string())
            .unwrap_or_default();
        Ok(Value::String(result))
    });

    lib.register(QName::local("substring-after"), 2, Some(2), |_, args| {
        let [a, b] = take_two(args);
        let haystack = a.string();
        let needle = b.string();
        let result = haystack
            .find(&needle)
            .map(|i| haystack[i + needle.len()..].to_string())
            .unwrap_or_default();
        Ok(Value::String(result))
    });

    // substring("12345", 1.5, 2.6) is "234": positions are rounded and
    // the window test runs in floating point, so NaN bounds select
    // nothing and an infinite length selects the rest of the string.
    lib.register(QName::local("substring"), 2, Some(3), |_, args| {
        let mut it = args.into_iter();
        let s = it.next().map(|v| v.string()).unwrap_or_default();
        let start = round_half_up(it.next().map_or(f64::NAN, |v| v.number()));
        let end = match it.next() {
            Some(len) => start + round_half_up(len.number()),
            None => f64::INFINITY,
        };
        #[allow(clippy::cast_precision_loss)]
        let out: String = s
            .chars()
            .enumerate()
            .filter(|(i, _)| {
                let p = (i + 1) as f64;
                p >= start && p < end
            })
            .map(|(_, c)| c)
            .collect();
        Ok(Value::String(out))
    });

    #[allow(clippy::cast_precision_loss)]
    lib.register(QName::local("string-length"), 0, Some(1), |ctx, args| {
        let s = arg_or_context(ctx, args).string();
        Ok(Value::Number(s.chars().count() as f64))
    });

    lib.register(QName::local("normalize-space"), 0, Some(1), |ctx, args| {
        let s = arg_or_context(ctx, args).string();
        let normalized = s
            .split(XML_WHITESPACE)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(Value::String(normalized))
    });

    // Character mapping with first-occurrence-wins on duplicates in the
    // source alphabet; a source char without a replacement is deleted.
    lib.register(QName::local("translate"), 3, Some(3), |_, args| {
        let mut it = args.into_iter();
        let s = it.next().map(|v| v.string()).unwrap_or_default();
        let from: Vec<char> =
            it.next().map(|v| v.string()).unwrap_or_default().chars().collect();
        let to: Vec<char> =
            it.next().map(|v| v.string()).unwrap_or_default().chars().collect();
        let out: String = s
            .chars()
            .filter_map(|c| match from.iter().position(|&f| f == c) {
                Some(i) => to.get(i).copied(),
                None => Some(c),
            })
            .collect();
        Ok(Value::String(out))
    });
}

fn register_boolean_functions<N: XPathNode>(lib: &mut FunctionLibrary<N>) {
    lib.register(QName::local("boolean"), 1, Some(1), |_, args| {
        Ok(Value::Boolean(take_one(args).boolean()))
    });

    lib.register(QName::local("not"), 1, Some(1), |_, args| {
        Ok(Value::Boolean(!take_one(args).boolean()))
    });

    lib.register(QName::local("true"), 0, Some(0), |_, _| Ok(Value::Boolean(true)));

    lib.register(QName::local("false"), 0, Some(0), |_, _| Ok(Value::Boolean(false)));

    // Nearest xml:lang on the ancestor-or-self chain, compared case
    // insensitively; "en" matches both "en" and "en-US".
    lib.register(QName::local("lang"), 1, Some(1), |ctx, args| {
        let target = take_one(args).string().to_ascii_lowercase();
        let mut current = Some(ctx.node.clone());
        while let Some(node) = current {
            let lang = node.attributes().into_iter().find(|a| {
                a.name().is_some_and(|q| {
                    q.local == "lang" && q.namespace_uri.as_deref() == Some(XML_NAMESPACE)
                })
            });
            if let Some(attr) = lang {
                let declared = attr.string_value().to_ascii_lowercase();
                let matched = declared == target
                    || declared
                        .strip_prefix(&target)
                        .is_some_and(|rest| rest.starts_with('-'));
                return Ok(Value::Boolean(matched));
            }
            current = node.parent();
        }
        Ok(Value::Boolean(false))
    });
}

fn register_number_functions<N: XPathNode>(lib: &mut FunctionLibrary<N>) {
    lib.register(QName::local("number"), 0, Some(1), |ctx, args| {
        Ok(Value::Number(arg_or_context(ctx, args).number()))
    });

    lib.register(QName::local("sum"), 1, Some(1), |_, args| {
        let nodes = take_one(args).into_node_set()?;
        let total = nodes
            .iter()
            .map(|n| parse_number(&n.string_value()))
            .sum();
        Ok(Value::Number(total))
    });

    lib.register(QName::local("floor"), 1, Some(1), |_, args| {
        Ok(Value::Number(take_one(args).number().floor()))
    });

    lib.register(QName::local("ceiling"), 1, Some(1), |_, args| {
        Ok(Value::Number(take_one(args).number().ceil()))
    });

    lib.register(QName::local("round"), 1, Some(1), |_, args| {
        Ok(Value::Number(round_half_up(take_one(args).number())))
    });
}

/// The registry checked arity already; these unwrap by construction.
fn take_one<N: XPathNode>(args: Vec<Value<N>>) -> Value<N> {
    args.into_iter().next().expect("arity checked by the registry")
}

fn take_two<N: XPathNode>(args: Vec<Value<N>>) -> [Value<N>; 2] {
    let mut it = args.into_iter();
    let a = it.next().expect("arity checked by the registry");
    let b = it.next().expect("arity checked by the registry");
    [a, b]
}
