mod common;

use common::fixtures::*;
use common::pdf_assertions::page_text;
use common::{TestResult, render};

#[test]
fn test_table_cells_are_drawn_row_by_row() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let pdf = render(vec![table(2, &["north", "east", "south", "west"])])?;
    assert_pdf_page_count!(pdf, 1);
    let words: Vec<String> = page_text(&pdf, 1).split_whitespace().map(str::to_string).collect();
    assert_eq!(words, ["north", "east", "south", "west"]);
    Ok(())
}

#[test]
fn test_long_table_splits_between_rows() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let labels: Vec<String> = (1..=100).map(|i| format!("cell{i}")).collect();
    let cells: Vec<&str> = labels.iter().map(String::as_str).collect();
    let pdf = render(vec![table(2, &cells)])?;
    assert_pdf_min_pages!(pdf, 3);

    let mut words = Vec::new();
    for page in 1..=pdf.page_count() {
        let text = page_text(&pdf, page);
        let on_page: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        // rows are never torn apart
        assert_eq!(on_page.len() % 2, 0, "page {page}: {text}");
        words.extend(on_page);
    }
    assert_eq!(words, labels);
    Ok(())
}
