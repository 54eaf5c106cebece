//! Parse a few expressions and evaluate them against an in-memory tree.
//!
//! Run with: `cargo run --example xpath1_simple`

use xpath1::simple_node::{attr, doc, elem, text};
use xpath1::{Context, Error, XPath, XPathNode};

fn main() -> Result<(), Error> {
    // <library>
    //   <book year="1965">Dune</book>
    //   <book year="1989">Hyperion</book>
    //   <book year="1984">Neuromancer</book>
    // </library>
    let document = doc()
        .child(
            elem("library")
                .child(elem("book").attr(attr("year", "1965")).child(text("Dune")))
                .child(elem("book").attr(attr("year", "1989")).child(text("Hyperion")))
                .child(elem("book").attr(attr("year", "1984")).child(text("Neuromancer"))),
        )
        .build();
    let context = Context::new(document);

    let queries = [
        "count(/library/book)",
        "/library/book[1]",
        "//book[@year > 1980]",
        "string(//book[last()])",
        "sum(//book/@year) div count(//book)",
    ];

    for query in queries {
        let xpath = XPath::new(query)?;
        let value = xpath.evaluate(&context)?;
        match &value {
            xpath1::Value::NodeSet(nodes) => {
                let titles: Vec<String> =
                    nodes.iter().map(XPathNode::string_value).collect();
                println!("{query}  ->  {titles:?}");
            }
            other => println!("{query}  ->  {other}"),
        }
    }

    Ok(())
}
