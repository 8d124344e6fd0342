mod common;

use common::fixtures::*;
use common::pdf_assertions::page_text;
use common::{TestResult, render};
use vellum::{Element, ElementPropertyContainer, FloatProperty, Position, UnitValue};

#[test]
fn test_fixed_element_lands_on_its_page() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let note = Element::div()
        .set_fixed_position(2, 36.0, 10.0, UnitValue::Point(200.0))
        .add(paragraph("fixed note"));
    let pdf = render(vec![paragraph(&numbered_words(800)), note])?;

    assert_pdf_min_pages!(pdf, 2);
    assert!(!page_text(&pdf, 1).contains("fixed note"));
    assert!(page_text(&pdf, 2).contains("fixed note"));
    Ok(())
}

#[test]
fn test_fixed_element_for_a_missing_page_is_dropped() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let note = Element::div()
        .set_fixed_position(9, 0.0, 0.0, UnitValue::Point(100.0))
        .add(paragraph("lost note"));
    let pdf = render(vec![paragraph("body"), note])?;
    assert_pdf_page_count!(pdf, 1);
    assert_pdf_not_contains_text!(pdf, "lost note");
    Ok(())
}

#[test]
fn test_absolute_child_is_drawn_with_its_parent() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let container = Element::div()
        .set_position(Position::Relative)
        .set_height(100.0)
        .add(paragraph("in flow"))
        .add(
            Element::div()
                .set_position(Position::Absolute)
                .set_top(60.0)
                .set_left(100.0)
                .set_width(UnitValue::Point(120.0))
                .add(paragraph("positioned")),
        );
    let pdf = render(vec![container])?;

    // the positioned box is drawn after the flow, below it on the page
    assert_eq!(page_text(&pdf, 1).trim(), "in flow\npositioned");
    Ok(())
}

#[test]
fn test_floats_are_drawn_after_the_rest_of_the_page() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let pdf = render(vec![
        Element::div().set_float(FloatProperty::Left).add(paragraph("floating")),
        paragraph("regular"),
    ])?;
    assert_eq!(page_text(&pdf, 1).trim(), "regular\nfloating");
    Ok(())
}

#[test]
fn test_relative_offset_does_not_move_following_content() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let pdf = render(vec![
        paragraph("shifted").set_relative_position(20.0, 10.0, 0.0, 0.0),
        paragraph("next"),
    ])?;
    assert_pdf_contains_text!(pdf, "shifted");
    assert_pdf_contains_text!(pdf, "next");
    Ok(())
}
