use rstest::rstest;
use xpath1::simple_node::{SimpleNode, doc, elem};
use xpath1::{Context, ContextBuilder, Error, Value, XPath};

fn base() -> SimpleNode {
    doc().child(elem("root")).build()
}

#[rstest]
fn bound_variables_resolve() {
    let context = ContextBuilder::new(base())
        .variable("answer", 42.0)
        .variable("greeting", "hello")
        .variable("flag", true)
        .build();
    let v = XPath::new("$answer + 1").unwrap().evaluate(&context).unwrap();
    assert_eq!(v, Value::Number(43.0));
    let v = XPath::new("concat($greeting, '!')").unwrap().evaluate(&context).unwrap();
    assert_eq!(v, Value::String("hello!".into()));
    let v = XPath::new("$flag and true()").unwrap().evaluate(&context).unwrap();
    assert_eq!(v, Value::Boolean(true));
}

#[rstest]
fn unbound_variable_is_an_error_not_empty() {
    let context = Context::new(base());
    let err = XPath::new("$missing").unwrap().evaluate(&context).unwrap_err();
    assert!(
        matches!(&err, Error::Unresolvable { kind, .. } if *kind == "variable"),
        "unexpected error: {err}"
    );
}

#[rstest]
fn binding_to_an_empty_node_set_is_legal() {
    let context = ContextBuilder::new(base())
        .variable("empty", Vec::<SimpleNode>::new())
        .build();
    let v = XPath::new("count($empty)").unwrap().evaluate(&context).unwrap();
    assert_eq!(v, Value::Number(0.0));
}

#[rstest]
fn prefixed_variables_resolve_through_namespace_bindings() {
    let context = ContextBuilder::new(base())
        .namespace("my", "urn:my")
        .variable_ns("urn:my", "x", 7.0)
        .build();
    let v = XPath::new("$my:x").unwrap().evaluate(&context).unwrap();
    assert_eq!(v, Value::Number(7.0));
}

#[rstest]
fn variable_with_unknown_prefix_is_an_error() {
    let context = Context::new(base());
    let err = XPath::new("$nope:x").unwrap().evaluate(&context).unwrap_err();
    assert!(
        matches!(&err, Error::Unresolvable { kind, .. } if *kind == "namespace prefix"),
        "unexpected error: {err}"
    );
}
