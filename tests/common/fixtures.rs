#![allow(dead_code)]

use std::rc::Rc;
use vellum::{Border, Color, Element, ElementPropertyContainer, ImageData};

pub fn paragraph(text: &str) -> Element {
    Element::paragraph_with(text)
}

/// A block of fixed height with a visible background.
pub fn filled_block(height: f32) -> Element {
    Element::div().set_height(height).set_background_color(Color::gray(0.8))
}

pub fn bordered_block(height: f32) -> Element {
    Element::div().set_height(height).set_border(Border::solid(1.0, Color::BLACK))
}

/// `count` numbered words, so tests can tell which ones made it onto a page.
pub fn numbered_words(count: usize) -> String {
    (1..=count).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
}

pub fn red_image(width: u32, height: u32) -> Rc<ImageData> {
    Rc::new(ImageData::filled(width, height, Color::rgb(255, 0, 0)))
}

pub fn table(columns: usize, cells: &[&str]) -> Element {
    cells
        .iter()
        .fold(Element::table(columns), |table, text| table.add(Element::cell().add(paragraph(text))))
}
