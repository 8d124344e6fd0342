//! A content-stream writer collecting drawing operators for one page.

use crate::document::{FontHandle, PdfDocument};
use crate::KernelError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use vellum_types::{Color, Rectangle};

/// Accumulates operators and the resources they name. Nothing touches the
/// document until [`PdfCanvas::finish`].
#[derive(Debug, Default)]
pub struct PdfCanvas {
    operations: Vec<Operation>,
    ext_gstates: BTreeMap<String, ObjectId>,
    xobjects: BTreeMap<String, ObjectId>,
    fonts: BTreeMap<String, ObjectId>,
    state_depth: usize,
}

impl PdfCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) -> &mut Self {
        self.operations.push(Operation::new(operator, operands));
        self
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    // --- Graphics state ---

    pub fn save_state(&mut self) -> &mut Self {
        self.state_depth += 1;
        self.push("q", vec![])
    }

    pub fn restore_state(&mut self) -> &mut Self {
        if self.state_depth == 0 {
            log::warn!("restore_state called without a matching save_state");
        } else {
            self.state_depth -= 1;
        }
        self.push("Q", vec![])
    }

    pub fn concat_matrix(&mut self, m: [f32; 6]) -> &mut Self {
        self.push("cm", m.iter().map(|v| Object::Real(*v)).collect())
    }

    /// Uses an ExtGState object, naming it in the page resources.
    pub fn set_ext_gstate(&mut self, id: ObjectId) -> &mut Self {
        let name = resource_name(&mut self.ext_gstates, "Gs", id);
        self.push("gs", vec![Object::Name(name.into_bytes())])
    }

    pub fn set_line_width(&mut self, width: f32) -> &mut Self {
        self.push("w", vec![width.into()])
    }

    pub fn set_line_cap(&mut self, cap: i64) -> &mut Self {
        self.push("J", vec![cap.into()])
    }

    pub fn set_line_dash(&mut self, pattern: &[f32], phase: f32) -> &mut Self {
        let array: Vec<Object> = pattern.iter().map(|v| (*v).into()).collect();
        self.push("d", vec![Object::Array(array), phase.into()])
    }

    pub fn set_fill_color(&mut self, color: &Color) -> &mut Self {
        let operands = color.components().into_iter().map(Object::Real).collect();
        self.push(color.fill_operator(), operands)
    }

    pub fn set_stroke_color(&mut self, color: &Color) -> &mut Self {
        let operands = color.components().into_iter().map(Object::Real).collect();
        self.push(color.stroke_operator(), operands)
    }

    // --- Paths ---

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.push("m", vec![x.into(), y.into()])
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.push("l", vec![x.into(), y.into()])
    }

    pub fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) -> &mut Self {
        self.push(
            "c",
            vec![x1.into(), y1.into(), x2.into(), y2.into(), x3.into(), y3.into()],
        )
    }

    pub fn rectangle(&mut self, rect: &Rectangle) -> &mut Self {
        self.push(
            "re",
            vec![rect.x.into(), rect.y.into(), rect.width.into(), rect.height.into()],
        )
    }

    pub fn close_path(&mut self) -> &mut Self {
        self.push("h", vec![])
    }

    pub fn fill(&mut self) -> &mut Self {
        self.push("f", vec![])
    }

    pub fn stroke(&mut self) -> &mut Self {
        self.push("S", vec![])
    }

    /// Intersects the clip with the current path and ends the path.
    pub fn clip(&mut self) -> &mut Self {
        self.push("W", vec![]);
        self.end_path()
    }

    pub fn end_path(&mut self) -> &mut Self {
        self.push("n", vec![])
    }

    // --- XObjects ---

    /// Paints an XObject scaled into `rect`.
    pub fn add_xobject(&mut self, id: ObjectId, rect: &Rectangle) -> &mut Self {
        let name = resource_name(&mut self.xobjects, "Im", id);
        self.save_state();
        self.concat_matrix([rect.width, 0.0, 0.0, rect.height, rect.x, rect.y]);
        self.push("Do", vec![Object::Name(name.into_bytes())]);
        self.restore_state()
    }

    // --- Text ---

    pub fn begin_text(&mut self) -> &mut Self {
        self.push("BT", vec![])
    }

    pub fn end_text(&mut self) -> &mut Self {
        self.push("ET", vec![])
    }

    pub fn set_font_and_size(&mut self, font: &FontHandle, size: f32) -> &mut Self {
        self.fonts.insert(font.resource_name.clone(), font.id);
        self.push(
            "Tf",
            vec![Object::Name(font.resource_name.clone().into_bytes()), size.into()],
        )
    }

    pub fn move_text(&mut self, x: f32, y: f32) -> &mut Self {
        self.push("Td", vec![x.into(), y.into()])
    }

    /// Shows already encoded bytes.
    pub fn show_text(&mut self, bytes: Vec<u8>) -> &mut Self {
        self.push("Tj", vec![Object::String(bytes, StringFormat::Hexadecimal)])
    }

    // --- Marked content ---

    pub fn begin_marked_content(&mut self, tag: &str, mcid: Option<i64>) -> &mut Self {
        match mcid {
            Some(mcid) => self.push(
                "BDC",
                vec![Object::Name(tag.as_bytes().to_vec()), dictionary! { "MCID" => mcid }.into()],
            ),
            None => self.push("BMC", vec![Object::Name(tag.as_bytes().to_vec())]),
        }
    }

    pub fn end_marked_content(&mut self) -> &mut Self {
        self.push("EMC", vec![])
    }

    // --- Output ---

    pub fn encode(&self) -> Result<Vec<u8>, KernelError> {
        let content = Content { operations: self.operations.clone() };
        Ok(content.encode()?)
    }

    /// Writes the content stream and merges the named resources into the
    /// page.
    pub fn finish(self, doc: &mut PdfDocument, page_id: ObjectId) -> Result<(), KernelError> {
        if self.state_depth != 0 {
            log::warn!("Canvas finished with {} unbalanced save_state calls", self.state_depth);
        }
        let bytes = self.encode()?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), bytes));

        let page = doc.dictionary_mut(page_id)?;
        let contents = match page.get(b"Contents") {
            Ok(Object::Array(arr)) => {
                let mut arr = arr.clone();
                arr.push(Object::Reference(content_id));
                Object::Array(arr)
            }
            Ok(existing) => Object::Array(vec![existing.clone(), Object::Reference(content_id)]),
            Err(_) => Object::Reference(content_id),
        };
        page.set("Contents", contents);

        let resources_ref = match page.get(b"Resources") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };
        match resources_ref {
            Some(id) => self.merge_resources(doc.dictionary_mut(id)?)?,
            None => {
                if !matches!(page.get(b"Resources"), Ok(Object::Dictionary(_))) {
                    page.set("Resources", Dictionary::new());
                }
                self.merge_resources(page.get_mut(b"Resources")?.as_dict_mut()?)?;
            }
        }
        Ok(())
    }
}

impl PdfCanvas {
    fn merge_resources(&self, resources: &mut Dictionary) -> Result<(), KernelError> {
        merge_category(resources, b"ExtGState", &self.ext_gstates)?;
        merge_category(resources, b"XObject", &self.xobjects)?;
        merge_category(resources, b"Font", &self.fonts)
    }
}

fn resource_name(names: &mut BTreeMap<String, ObjectId>, prefix: &str, id: ObjectId) -> String {
    if let Some((name, _)) = names.iter().find(|(_, v)| **v == id) {
        return name.clone();
    }
    let name = format!("{}{}", prefix, names.len() + 1);
    names.insert(name.clone(), id);
    name
}

fn merge_category(
    resources: &mut Dictionary,
    category: &[u8],
    entries: &BTreeMap<String, ObjectId>,
) -> Result<(), KernelError> {
    if entries.is_empty() {
        return Ok(());
    }
    if !matches!(resources.get(category), Ok(Object::Dictionary(_))) {
        resources.set(category.to_vec(), Dictionary::new());
    }
    let dict = resources.get_mut(category)?.as_dict_mut()?;
    for (name, id) in entries {
        dict.set(name.as_bytes().to_vec(), Object::Reference(*id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{SharedFont, SimpleFont};
    use std::rc::Rc;

    fn operators(canvas: &PdfCanvas) -> Vec<&str> {
        canvas.operations().iter().map(|op| op.operator.as_str()).collect()
    }

    #[test]
    fn paths_emit_operators_in_order() {
        let mut canvas = PdfCanvas::new();
        canvas
            .save_state()
            .set_fill_color(&Color::rgb(255, 0, 0))
            .rectangle(&Rectangle::new(10.0, 20.0, 30.0, 40.0))
            .fill()
            .move_to(0.0, 0.0)
            .curve_to(1.0, 1.0, 2.0, 2.0, 3.0, 3.0)
            .clip()
            .restore_state();

        assert_eq!(operators(&canvas), vec!["q", "rg", "re", "f", "m", "c", "W", "n", "Q"]);
        assert_eq!(canvas.operations()[1].operands.len(), 3);
    }

    #[test]
    fn finish_writes_content_and_resources() {
        let mut doc = PdfDocument::new("1.7");
        let page = doc.add_page(200.0, 200.0).unwrap();
        let gs = doc.ext_gstate_for_opacity(0.5);
        let font: SharedFont = Rc::new(SimpleFont::helvetica());
        let handle = doc.register_font(font.clone());

        let mut canvas = PdfCanvas::new();
        canvas.set_ext_gstate(gs).set_ext_gstate(gs);
        canvas
            .begin_text()
            .set_font_and_size(&handle, 12.0)
            .move_text(10.0, 10.0)
            .show_text(font.convert_to_bytes("Hi"))
            .end_text();
        canvas.finish(&mut doc, page).unwrap();

        let page_dict = doc.dictionary(page).unwrap();
        let content_id = page_dict.get(b"Contents").unwrap().as_reference().unwrap();
        let stream = doc.object(content_id).unwrap().as_stream().unwrap();
        let decoded = Content::decode(&stream.content).unwrap();
        assert_eq!(decoded.operations[0].operator, "gs");
        assert_eq!(decoded.operations.len(), 7);

        let resources = page_dict.get(b"Resources").unwrap().as_dict().unwrap();
        let gstates = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
        assert_eq!(gstates.len(), 1);
        assert_eq!(gstates.get(b"Gs1").unwrap().as_reference().unwrap(), gs);
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert_eq!(fonts.get(b"F1").unwrap().as_reference().unwrap(), handle.id);
    }

    #[test]
    fn second_canvas_appends_to_contents() {
        let mut doc = PdfDocument::new("1.7");
        let page = doc.add_page(200.0, 200.0).unwrap();
        let mut first = PdfCanvas::new();
        first.rectangle(&Rectangle::new(0.0, 0.0, 1.0, 1.0)).fill();
        first.finish(&mut doc, page).unwrap();
        let mut second = PdfCanvas::new();
        second.rectangle(&Rectangle::new(0.0, 0.0, 2.0, 2.0)).stroke();
        second.finish(&mut doc, page).unwrap();

        let contents = doc.dictionary(page).unwrap().get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 2);
    }

    #[test]
    fn xobjects_are_wrapped_in_their_own_state() {
        let mut doc = PdfDocument::new("1.7");
        let image = doc.add_object(Stream::new(dictionary! { "Subtype" => "Image" }, vec![]));
        let mut canvas = PdfCanvas::new();
        canvas.add_xobject(image, &Rectangle::new(5.0, 5.0, 50.0, 25.0));
        assert_eq!(operators(&canvas), vec!["q", "cm", "Do", "Q"]);
        assert_eq!(canvas.operations()[1].operands[3].as_float().unwrap(), 25.0);
    }
}
