#![allow(dead_code)]

use super::GeneratedPdf;
use lopdf::content::Content;
use lopdf::{Document as LopdfDocument, Object};
use vellum::kernel::parser::extract_page_text;

/// Extract all text content, one page after another
pub fn extract_text(pdf: &GeneratedPdf) -> String {
    let mut text = String::new();
    for page_number in 1..=pdf.pdf.page_count() {
        if let Ok(page_text) = extract_page_text(&pdf.pdf, page_number) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }
    text
}

pub fn page_text(pdf: &GeneratedPdf, page_number: usize) -> String {
    extract_page_text(&pdf.pdf, page_number).unwrap_or_default()
}

/// Operators of a page's content stream, in order.
pub fn page_operators(doc: &LopdfDocument, page_num: u32) -> Vec<String> {
    let Some(page_id) = doc.get_pages().get(&page_num).copied() else {
        return Vec::new();
    };
    doc.get_page_content(page_id)
        .ok()
        .and_then(|content| Content::decode(&content).ok())
        .map(|content| content.operations.into_iter().map(|op| op.operator).collect())
        .unwrap_or_default()
}

pub fn count_operator(doc: &LopdfDocument, page_num: u32, operator: &str) -> usize {
    page_operators(doc, page_num).iter().filter(|op| *op == operator).count()
}

#[derive(Debug)]
pub struct LinkAnnotation {
    pub rect: [f32; 4],
    pub is_internal: bool,
    pub target: String,
}

fn resolve<'a>(doc: &'a LopdfDocument, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn string_value(object: &Object) -> String {
    match object {
        Object::String(bytes, _) => String::from_utf8_lossy(bytes).to_string(),
        Object::Name(name) => String::from_utf8_lossy(name).to_string(),
        other => format!("{:?}", other),
    }
}

/// Extract link annotations from one page
pub fn extract_link_annotations(doc: &LopdfDocument, page_num: u32) -> Vec<LinkAnnotation> {
    let Some(page_id) = doc.get_pages().get(&page_num).copied() else {
        return Vec::new();
    };
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    let Some(annots) = page.get(b"Annots").ok().and_then(|a| resolve(doc, a)).and_then(|a| a.as_array().ok()) else {
        return Vec::new();
    };

    annots
        .iter()
        .filter_map(|annot| resolve(doc, annot)?.as_dict().ok())
        .filter(|annot| annot.get(b"Subtype").and_then(Object::as_name).ok() == Some(b"Link".as_slice()))
        .map(|annot| {
            let rect = annot
                .get(b"Rect")
                .and_then(Object::as_array)
                .map(|values| {
                    let mut rect = [0.0; 4];
                    for (slot, value) in rect.iter_mut().zip(values) {
                        *slot = value.as_float().unwrap_or(0.0);
                    }
                    rect
                })
                .unwrap_or_default();
            let action = annot.get(b"A").ok().and_then(|a| resolve(doc, a)).and_then(|a| a.as_dict().ok());
            let kind = action.and_then(|a| a.get(b"S").and_then(Object::as_name).ok());
            let is_internal = kind == Some(b"GoTo".as_slice());
            let target = action
                .and_then(|a| a.get(b"URI").or_else(|_| a.get(b"D")).ok())
                .map(string_value)
                .unwrap_or_default();
            LinkAnnotation { rect, is_internal, target }
        })
        .collect()
}

/// Names registered in the catalog's `/Dests` dictionary
pub fn named_destinations(doc: &LopdfDocument) -> Vec<String> {
    let Ok(catalog) = doc.catalog() else {
        return Vec::new();
    };
    catalog
        .get(b"Dests")
        .ok()
        .and_then(|dests| resolve(doc, dests))
        .and_then(|dests| dests.as_dict().ok())
        .map(|dests| dests.iter().map(|(name, _)| String::from_utf8_lossy(name).to_string()).collect())
        .unwrap_or_default()
}

/// Get page dimensions (width, height) in points
pub fn get_page_dimensions(doc: &LopdfDocument, page_num: u32) -> Option<(f32, f32)> {
    let page_id = doc.get_pages().get(&page_num).copied()?;
    let media_box = doc.get_dictionary(page_id).ok()?.get(b"MediaBox").ok()?.as_array().ok()?;
    if media_box.len() < 4 {
        return None;
    }
    let value = |i: usize| media_box[i].as_float().ok();
    Some((value(2)? - value(0)?, value(3)? - value(1)?))
}

// ============================================================================
// Fluent Assertion Macros
// ============================================================================

/// Assert that PDF contains specific text
#[macro_export]
macro_rules! assert_pdf_contains_text {
    ($pdf:expr, $text:expr) => {
        let extracted = $crate::common::pdf_assertions::extract_text(&$pdf);
        assert!(
            extracted.contains($text),
            "PDF should contain '{}', but extracted text was:\n{}",
            $text,
            extracted
        );
    };
}

/// Assert that PDF does NOT contain specific text
#[macro_export]
macro_rules! assert_pdf_not_contains_text {
    ($pdf:expr, $text:expr) => {
        let extracted = $crate::common::pdf_assertions::extract_text(&$pdf);
        assert!(
            !extracted.contains($text),
            "PDF should NOT contain '{}', but it was found in:\n{}",
            $text,
            extracted
        );
    };
}

/// Assert the number of pages in a PDF
#[macro_export]
macro_rules! assert_pdf_page_count {
    ($pdf:expr, $count:expr) => {
        assert_eq!(
            $pdf.page_count(),
            $count,
            "Expected {} pages, got {}",
            $count,
            $pdf.page_count()
        );
    };
}

/// Assert minimum number of pages
#[macro_export]
macro_rules! assert_pdf_min_pages {
    ($pdf:expr, $min:expr) => {
        assert!(
            $pdf.page_count() >= $min,
            "Expected at least {} pages, got {}",
            $min,
            $pdf.page_count()
        );
    };
}
