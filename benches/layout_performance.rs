//! Layout engine micro-benchmarks
//!
//! Measures pagination cost for text, nested blocks and tables without drawing.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use vellum::{Document, DocumentConfig, Element, ElementPropertyContainer, UnitValue};

fn words(count: usize) -> String {
    (0..count).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
}

fn nested(depth: usize, text: &str) -> Element {
    (0..depth).fold(Element::paragraph_with(text), |inner, _| Element::div().set_padding(2.0).add(inner))
}

fn table(rows: usize) -> Element {
    (0..rows * 3).fold(Element::table(3), |table, i| {
        table.add(Element::cell().add(Element::paragraph_with(&format!("Cell {i}"))))
    })
}

fn layout(elements: impl IntoIterator<Item = Element>) -> usize {
    let mut document = Document::new(DocumentConfig::default());
    for element in elements {
        document.add(element);
    }
    document.layout().expect("layout failed").len()
}

fn benchmark_text_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_layout");
    for word_count in [100, 1_000, 10_000] {
        let text = words(word_count);
        group.bench_with_input(BenchmarkId::new("words", word_count), &text, |b, text| {
            b.iter(|| layout([Element::paragraph_with(black_box(text))]));
        });
    }
    group.finish();
}

fn benchmark_nested_blocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_blocks");
    for depth in [1, 8, 32] {
        let text = words(200);
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, depth| {
            b.iter(|| layout((0..20).map(|_| nested(*depth, &text))));
        });
    }
    group.finish();
}

fn benchmark_table_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_layout");
    for rows in [10, 100, 500] {
        group.bench_with_input(BenchmarkId::new("rows", rows), &rows, |b, rows| {
            b.iter(|| layout([table(*rows)]));
        });
    }
    group.finish();
}

fn benchmark_positioned(c: &mut Criterion) {
    c.bench_function("positioned_children", |b| {
        b.iter(|| {
            let container = (0..50).fold(Element::div().set_height(500.0), |container, i| {
                container.add(
                    Element::div()
                        .set_position(vellum::Position::Absolute)
                        .set_top(i as f32 * 10.0)
                        .set_left(i as f32 * 5.0)
                        .set_width(UnitValue::Point(80.0))
                        .add(Element::paragraph_with("positioned")),
                )
            });
            layout([container.set_position(vellum::Position::Relative)])
        });
    });
}

criterion_group!(
    benches,
    benchmark_text_layout,
    benchmark_nested_blocks,
    benchmark_table_layout,
    benchmark_positioned
);
criterion_main!(benches);
