use rstest::rstest;
use xpath1::parse;
use xpath1::parser::ast::{
    AdditiveOp, Axis, Expr, KindTest, MultiplicativeOp, NameTest, NodeTest, QName,
};

#[rstest]
fn literals_and_numbers() {
    assert_eq!(parse("'hi'").unwrap(), Expr::Literal("hi".into()));
    assert_eq!(parse("\"hi\"").unwrap(), Expr::Literal("hi".into()));
    assert_eq!(parse("3.25").unwrap(), Expr::Number(3.25));
    assert_eq!(parse(".5").unwrap(), Expr::Number(0.5));
    assert_eq!(parse("42").unwrap(), Expr::Number(42.0));
}

#[rstest]
fn additive_is_left_associative() {
    // (1 - 2) - 3, not 1 - (2 - 3)
    let Expr::Additive { op: AdditiveOp::Sub, left, right } = parse("1 - 2 - 3").unwrap()
    else {
        panic!("expected additive expression");
    };
    assert_eq!(*right, Expr::Number(3.0));
    assert!(matches!(*left, Expr::Additive { op: AdditiveOp::Sub, .. }));
}

#[rstest]
fn multiplicative_binds_tighter_than_additive() {
    let Expr::Additive { op: AdditiveOp::Add, left, right } = parse("1 + 2 * 3").unwrap()
    else {
        panic!("expected additive at the top");
    };
    assert_eq!(*left, Expr::Number(1.0));
    assert!(matches!(*right, Expr::Multiplicative { op: MultiplicativeOp::Mul, .. }));
}

#[rstest]
fn div_and_mod_are_keywords_not_names() {
    assert!(matches!(
        parse("6 div 3").unwrap(),
        Expr::Multiplicative { op: MultiplicativeOp::Div, .. }
    ));
    assert!(matches!(
        parse("6 mod 3").unwrap(),
        Expr::Multiplicative { op: MultiplicativeOp::Mod, .. }
    ));
    // As step names they are just element tests.
    let Expr::Path(p) = parse("div/mod").unwrap() else {
        panic!("expected a path");
    };
    assert_eq!(p.steps.len(), 2);
    assert_eq!(
        p.steps[0].test,
        NodeTest::Name(NameTest::Named(QName::local("div")))
    );
}

#[rstest]
fn unary_minus_stacks() {
    let e = parse("--1").unwrap();
    assert_eq!(
        e,
        Expr::Negate(Box::new(Expr::Negate(Box::new(Expr::Number(1.0)))))
    );
}

#[rstest]
fn abbreviations_expand() {
    let Expr::Path(p) = parse("//a/.././@b").unwrap() else {
        panic!("expected a path");
    };
    assert!(p.absolute);
    let axes: Vec<Axis> = p.steps.iter().map(|s| s.axis).collect();
    assert_eq!(
        axes,
        vec![
            Axis::DescendantOrSelf,
            Axis::Child,
            Axis::Parent,
            Axis::SelfAxis,
            Axis::Attribute
        ]
    );
    assert_eq!(p.steps[0].test, NodeTest::Kind(KindTest::Node));
}

#[rstest]
fn kind_tests_are_not_function_calls() {
    let Expr::Path(p) = parse("text()").unwrap() else {
        panic!("text() must parse as a step");
    };
    assert_eq!(p.steps[0].test, NodeTest::Kind(KindTest::Text));

    let Expr::Path(p) = parse("processing-instruction('style')").unwrap() else {
        panic!("pi test must parse as a step");
    };
    assert_eq!(
        p.steps[0].test,
        NodeTest::Kind(KindTest::ProcessingInstruction(Some("style".into())))
    );
}

#[rstest]
fn prefixed_wildcard_before_qname() {
    let Expr::Path(p) = parse("svg:*").unwrap() else {
        panic!("expected a path");
    };
    assert_eq!(p.steps[0].test, NodeTest::Name(NameTest::NamespaceAny("svg".into())));
}

#[rstest]
fn bare_primary_is_not_wrapped_in_filter() {
    assert_eq!(parse("(1)").unwrap(), Expr::Number(1.0));
    assert_eq!(parse("$x").unwrap(), Expr::VariableRef(QName::local("x")));
}

#[rstest]
fn filter_with_predicate_and_trailing_path() {
    let Expr::Filter { primary, predicates, path } = parse("$set[1]/child::a").unwrap()
    else {
        panic!("expected a filter expression");
    };
    assert_eq!(*primary, Expr::VariableRef(QName::local("set")));
    assert_eq!(predicates, vec![Expr::Number(1.0)]);
    assert_eq!(path.unwrap().steps.len(), 1);
}

#[rstest]
fn function_call_with_arguments() {
    let Expr::FunctionCall { name, args } = parse("concat('a', 'b', 'c')").unwrap() else {
        panic!("expected a function call");
    };
    assert_eq!(name, QName::local("concat"));
    assert_eq!(args.len(), 3);
}

#[rstest]
fn or_and_precedence() {
    // and binds tighter than or
    let Expr::Or(_, r) = parse("1 or 1 and 0").unwrap() else {
        panic!("expected or at the top");
    };
    assert!(matches!(*r, Expr::And(_, _)));
}
