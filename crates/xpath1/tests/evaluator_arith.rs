use rstest::rstest;
use xpath1::simple_node::{SimpleNode, doc};
use xpath1::{Context, Value, XPath};

fn eval(expr: &str) -> Value<SimpleNode> {
    let context = Context::new(doc().build());
    XPath::new(expr).unwrap().evaluate(&context).unwrap()
}

fn num(expr: &str) -> f64 {
    match eval(expr) {
        Value::Number(n) => n,
        other => panic!("{expr} produced {other:?}"),
    }
}

#[rstest]
fn one_plus_one() {
    assert_eq!(eval("1+1"), Value::Number(2.0));
}

#[rstest]
#[case("2 * 3 + 4", 10.0)]
#[case("2 + 3 * 4", 14.0)]
#[case("(2 + 3) * 4", 20.0)]
#[case("7 - 3 - 2", 2.0)]
#[case("-3 + 5", 2.0)]
#[case("--4", 4.0)]
fn precedence_and_negation(#[case] expr: &str, #[case] expected: f64) {
    assert_eq!(num(expr), expected);
}

#[rstest]
fn division_is_ieee() {
    assert_eq!(num("1 div 0"), f64::INFINITY);
    assert_eq!(num("-1 div 0"), f64::NEG_INFINITY);
    assert!(num("0 div 0").is_nan());
    assert_eq!(num("7 div 2"), 3.5);
}

#[rstest]
#[case("5 mod 2", 1.0)]
#[case("5 mod -2", 1.0)]
#[case("-5 mod 2", -1.0)]
#[case("-5 mod -2", -1.0)]
#[case("5.5 mod 2", 1.5)]
fn modulo_keeps_dividend_sign(#[case] expr: &str, #[case] expected: f64) {
    assert_eq!(num(expr), expected);
}

#[rstest]
fn strings_coerce_through_the_restricted_grammar() {
    assert_eq!(num("'3' + '4.5'"), 7.5);
    assert!(num("'1e3' + 0").is_nan());
    assert!(num("'+1' + 0").is_nan());
    assert_eq!(num("' -2 ' + 0"), -2.0);
}

#[rstest]
fn booleans_coerce_to_zero_or_one() {
    assert_eq!(num("true() + true()"), 2.0);
    assert_eq!(num("false() * 9"), 0.0);
}

#[rstest]
fn negating_a_nan_stays_nan() {
    assert!(num("-'x'").is_nan());
}
