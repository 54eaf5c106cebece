use rstest::rstest;
use xpath1::simple_node::{SimpleNode, attr, doc, elem, text};
use xpath1::{Context, ContextBuilder, Value, XPath, XPathNode};

// <catalog>
//   <item n="1">alpha</item>
//   <item n="2">beta</item>
//   <group><item n="3">gamma</item></group>
//   <item n="4">delta</item>
//   <item n="5">epsilon</item>
// </catalog>
fn catalog() -> SimpleNode {
    doc()
        .child(
            elem("catalog")
                .child(elem("item").attr(attr("n", "1")).child(text("alpha")))
                .child(elem("item").attr(attr("n", "2")).child(text("beta")))
                .child(elem("group").child(elem("item").attr(attr("n", "3")).child(text("gamma"))))
                .child(elem("item").attr(attr("n", "4")).child(text("delta")))
                .child(elem("item").attr(attr("n", "5")).child(text("epsilon"))),
        )
        .build()
}

fn select(expr: &str, node: SimpleNode) -> Vec<SimpleNode> {
    XPath::new(expr).unwrap().select_nodes(&Context::new(node)).unwrap()
}

fn values(nodes: &[SimpleNode]) -> Vec<String> {
    nodes.iter().map(XPathNode::string_value).collect()
}

#[rstest]
fn absolute_path_starts_at_the_root_regardless_of_context() {
    let root = catalog();
    let deep = select("//item[@n = '3']", root.clone()).remove(0);
    let from_deep = select("/catalog/item", deep);
    assert_eq!(values(&from_deep), ["alpha", "beta", "delta", "epsilon"]);
}

#[rstest]
fn double_slash_finds_nested_items() {
    let root = catalog();
    let all = select("//item", root);
    assert_eq!(values(&all), ["alpha", "beta", "gamma", "delta", "epsilon"]);
}

#[rstest]
fn numeric_predicate_selects_by_position() {
    let root = catalog();
    let second = select("/catalog/item[2]", root.clone());
    assert_eq!(values(&second), ["beta"]);
    let by_position = select("/catalog/item[position() = 2]", root);
    assert_eq!(values(&by_position), ["beta"]);
}

#[rstest]
fn numeric_predicate_and_position_agree_under_double_slash() {
    // //item[2] means: second item among each parent's children, so both
    // the top-level and the nested parents contribute.
    let root = catalog();
    let numeric = select("//item[2]", root.clone());
    let explicit = select("//item[position() = 2]", root);
    assert_eq!(values(&numeric), values(&explicit));
    assert_eq!(values(&numeric), ["beta"]);
}

#[rstest]
fn last_predicate() {
    let root = catalog();
    assert_eq!(values(&select("/catalog/item[last()]", root)), ["epsilon"]);
}

#[rstest]
fn predicates_apply_in_sequence_with_recomputed_positions() {
    // First predicate keeps items after the first; the second then sees
    // positions 1..3 over the survivors.
    let root = catalog();
    let picked = select("/catalog/item[position() > 1][2]", root);
    assert_eq!(values(&picked), ["delta"]);
}

#[rstest]
fn reverse_axis_positions_are_nearest_first() {
    let root = catalog();
    let fourth = select("/catalog/item[@n = '4']", root).remove(0);
    let one_back = XPath::new("preceding-sibling::item[1]")
        .unwrap()
        .evaluate(&Context::new(fourth))
        .unwrap();
    match one_back {
        Value::NodeSet(nodes) => assert_eq!(values(&nodes), ["beta"]),
        other => panic!("unexpected {other:?}"),
    }
}

#[rstest]
fn union_deduplicates_by_identity() {
    let root = catalog();
    let doubled = select("//item | //item", root.clone());
    assert_eq!(doubled.len(), 5);
    // while a plain multi-step traversal may produce duplicates, union
    // output is document-ordered and unique
    let mixed = select("//item | /catalog/group/item", root);
    assert_eq!(values(&mixed), ["alpha", "beta", "gamma", "delta", "epsilon"]);
}

#[rstest]
fn union_deduplicates_across_trees() {
    // The same node in both operands plus a node from another tree: the
    // duplicate must go even though the two trees have no mutual order.
    let first = catalog();
    let second = catalog();
    let shared = select("//item[@n = '1']", first.clone()).remove(0);
    let foreign = select("//item[@n = '2']", second).remove(0);
    let context = ContextBuilder::new(first)
        .variable("x", vec![shared.clone(), foreign])
        .variable("y", vec![shared])
        .build();
    let merged = XPath::new("$x | $y").unwrap().select_nodes(&context).unwrap();
    assert_eq!(merged.len(), 2);
}

#[rstest]
fn union_of_non_node_sets_is_a_type_error() {
    let root = catalog();
    let err = XPath::new("1 | //item")
        .unwrap()
        .evaluate(&Context::new(root))
        .unwrap_err();
    assert!(matches!(err, xpath1::Error::TypeError { .. }));
}

#[rstest]
fn filter_expression_with_trailing_path() {
    let root = catalog();
    let items = select("//item", root.clone());
    let context = ContextBuilder::new(root).variable("items", items).build();
    let picked = XPath::new("$items[3]/parent::*")
        .unwrap()
        .select_nodes(&context)
        .unwrap();
    assert_eq!(
        picked[0].name().map(|q| q.local),
        Some("group".to_string())
    );
}

#[rstest]
fn lone_slash_selects_the_root() {
    let root = catalog();
    let deep = select("//item", root.clone()).remove(0);
    let selected = select("/", deep);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0], root);
}

#[rstest]
fn text_nodes_are_reachable() {
    let root = catalog();
    let texts = select("/catalog/item/text()", root);
    assert_eq!(values(&texts), ["alpha", "beta", "delta", "epsilon"]);
}
