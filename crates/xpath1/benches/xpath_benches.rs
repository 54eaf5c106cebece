use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use xpath1::simple_node::{SimpleNode, attr, doc, elem, text};
use xpath1::{Context, XPath, parse};

fn build_catalog(sections: usize, items_per_section: usize) -> SimpleNode {
    let mut catalog = elem("catalog");
    for s in 0..sections {
        let mut section = elem("section").attr(attr("id", &format!("s{s}")));
        for i in 0..items_per_section {
            section = section.child(
                elem("item")
                    .attr(attr("n", &i.to_string()))
                    .child(elem("name").child(text(&format!("item {i} of section {s}")))),
            );
        }
        catalog = catalog.child(section);
    }
    doc().child(catalog).build()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    let cases = [
        ("arith", "1 + 2 * 3 - 4 div 5"),
        ("path", "/catalog/section[@id = 's3']/item[position() > 2]/name"),
        ("union", "//item | //section | //name[starts-with(., 'item')]"),
    ];
    for (label, expr) in cases {
        group.bench_function(label, |b| b.iter(|| parse(black_box(expr)).unwrap()));
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let document = build_catalog(50, 20);
    let context = Context::new(document);

    let mut group = c.benchmark_group("evaluate");
    let cases = [
        ("descendants", "//item"),
        ("predicate_attr", "//item[@n = '7']"),
        ("predicate_position", "/catalog/section/item[last()]"),
        ("string_function", "count(//name[contains(., 'section 25')])"),
        ("union_dedup", "//item | //item"),
    ];
    for (label, expr) in cases {
        let compiled = XPath::new(expr).unwrap();
        group.bench_function(label, |b| {
            b.iter(|| compiled.evaluate(black_box(&context)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_evaluate);
criterion_main!(benches);
