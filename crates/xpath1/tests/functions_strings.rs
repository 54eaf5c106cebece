use rstest::rstest;
use xpath1::simple_node::{doc, elem, text};
use xpath1::{Context, XPath};

fn string_of(expr: &str) -> String {
    let context = Context::new(doc().build());
    XPath::new(expr).unwrap().string_value_of(&context).unwrap()
}

#[rstest]
fn string_defaults_to_the_context_node() {
    let t = doc().child(elem("a").child(text("  hi  "))).build();
    let context = Context::new(t);
    assert_eq!(XPath::new("string()").unwrap().string_value_of(&context).unwrap(), "  hi  ");
}

#[rstest]
fn concat_joins_all_arguments() {
    assert_eq!(string_of("concat('a', 'b')"), "ab");
    assert_eq!(string_of("concat('n=', 1 + 1, '!')"), "n=2!");
}

#[rstest]
fn starts_with_and_contains() {
    assert_eq!(string_of("starts-with('banana', 'ban')"), "true");
    assert_eq!(string_of("starts-with('banana', 'nan')"), "false");
    assert_eq!(string_of("contains('banana', 'nan')"), "true");
    assert_eq!(string_of("contains('banana', 'x')"), "false");
    assert_eq!(string_of("contains('banana', '')"), "true");
}

#[rstest]
fn substring_before_and_after() {
    assert_eq!(string_of("substring-before('1999/04/01', '/')"), "1999");
    assert_eq!(string_of("substring-after('1999/04/01', '/')"), "04/01");
    assert_eq!(string_of("substring-before('abc', 'x')"), "");
    assert_eq!(string_of("substring-after('abc', 'x')"), "");
}

// The three literal cases from the XPath recommendation. They depend on
// round-half-up argument rounding and IEEE infinity from div.
#[rstest]
#[case("substring('12345', 1.5, 2.6)", "234")]
#[case("substring('12345', 0, 3)", "12")]
#[case("substring('12345', -42, 1 div 0)", "12345")]
#[case("substring('12345', 0 div 0, 3)", "")]
#[case("substring('12345', 1, 0 div 0)", "")]
#[case("substring('12345', 2)", "2345")]
fn substring_recommendation_cases(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(string_of(expr), expected);
}

#[rstest]
fn substring_counts_characters_not_bytes() {
    assert_eq!(string_of("substring('héllo', 2, 3)"), "éll");
    assert_eq!(string_of("string-length('héllo')"), "5");
    assert_eq!(string_of("substring('𝄞music', 1, 2)"), "𝄞m");
}

#[rstest]
fn string_length_of_context_node() {
    let t = doc().child(elem("a").child(text("four"))).build();
    let context = Context::new(t);
    assert_eq!(
        XPath::new("string-length()").unwrap().string_value_of(&context).unwrap(),
        "4"
    );
}

#[rstest]
fn normalize_space_collapses_runs() {
    assert_eq!(string_of("normalize-space('  a \t b \n c ')"), "a b c");
    assert_eq!(string_of("normalize-space('')"), "");
}

#[rstest]
fn normalize_space_splits_only_on_xml_whitespace() {
    // U+00A0 is Unicode whitespace but not XML whitespace; it must
    // survive untouched.
    assert_eq!(string_of("normalize-space('a\u{a0}b \t c')"), "a\u{a0}b c");
}

#[rstest]
#[case("translate('bar', 'abc', 'ABC')", "BAr")]
#[case("translate('--aaa--', 'abc-', 'ABC')", "AAA")]
#[case("translate('aab', 'aa', 'xy')", "xxb")]
#[case("translate('abc', '', '')", "abc")]
fn translate_cases(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(string_of(expr), expected);
}

#[rstest]
fn string_of_node_set_is_the_first_node_in_document_order() {
    let t = doc()
        .child(
            elem("r")
                .child(elem("x").child(text("first")))
                .child(elem("x").child(text("second"))),
        )
        .build();
    let context = Context::new(t);
    assert_eq!(
        XPath::new("string(//x)").unwrap().string_value_of(&context).unwrap(),
        "first"
    );
}
