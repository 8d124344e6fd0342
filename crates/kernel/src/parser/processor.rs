use super::graphics_state::{CanvasTag, GraphicsState};
use super::listener::{EventListener, ParserEvent};
use super::text_render_info::TextRenderInfo;
use crate::document::PdfDocument;
use crate::font::{SharedFont, SimpleFont};
use crate::KernelError;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId};
use std::collections::HashMap;
use std::rc::Rc;
use vellum_types::{Color, Matrix};

/// Walks a content stream, tracking graphics and text state, and reports
/// every shown string to an [`EventListener`].
pub struct PdfCanvasProcessor<L> {
    listener: L,
    gs: GraphicsState,
    gs_stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    text_line_matrix: Matrix,
    /// Outermost first.
    marked_content: Vec<CanvasTag>,
    font_cache: HashMap<Vec<u8>, SharedFont>,
}

impl<L: EventListener> PdfCanvasProcessor<L> {
    pub fn new(listener: L) -> Self {
        Self {
            listener,
            gs: GraphicsState::default(),
            gs_stack: Vec::new(),
            text_matrix: Matrix::identity(),
            text_line_matrix: Matrix::identity(),
            marked_content: Vec::new(),
            font_cache: HashMap::new(),
        }
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    /// Clears all state so the processor can run over another stream.
    pub fn reset(&mut self) {
        self.gs = GraphicsState::default();
        self.gs_stack.clear();
        self.text_matrix = Matrix::identity();
        self.text_line_matrix = Matrix::identity();
        self.marked_content.clear();
        self.font_cache.clear();
    }

    /// Processes all content streams of a page.
    pub fn process_page_content(&mut self, doc: &PdfDocument, page_id: ObjectId) -> Result<(), KernelError> {
        let resources = page_resources(doc, page_id)?;
        let content = doc.lopdf().get_page_content(page_id)?;
        self.process_content(doc, &content, &resources)
    }

    /// Processes raw content bytes against a resource dictionary.
    pub fn process_content(
        &mut self,
        doc: &PdfDocument,
        content: &[u8],
        resources: &Dictionary,
    ) -> Result<(), KernelError> {
        self.reset();
        let content = Content::decode(content)?;
        for operation in &content.operations {
            self.invoke_operator(doc, resources, operation)?;
        }
        if !self.marked_content.is_empty() {
            log::warn!("Content stream ended inside {} marked-content sequences", self.marked_content.len());
        }
        Ok(())
    }

    fn invoke_operator(
        &mut self,
        doc: &PdfDocument,
        resources: &Dictionary,
        operation: &Operation,
    ) -> Result<(), KernelError> {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            // --- Graphics state ---
            "q" => self.gs_stack.push(self.gs.clone()),
            "Q" => match self.gs_stack.pop() {
                Some(gs) => self.gs = gs,
                None => log::warn!("Unbalanced restore state operator in content stream"),
            },
            "cm" => {
                let [a, b, c, d, e, f] = numbers::<6>(operands)?;
                self.gs.update_ctm(&Matrix::new(a, b, c, d, e, f));
            }
            "w" => self.gs.line_width = number(operands, 0)?,

            // --- Text objects and state ---
            "BT" => {
                self.text_matrix = Matrix::identity();
                self.text_line_matrix = Matrix::identity();
                self.listener.event_occurred(ParserEvent::BeginText)?;
            }
            "ET" => self.listener.event_occurred(ParserEvent::EndText)?,
            "Tf" => {
                let name = operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .ok_or_else(|| operand_error(operation))?;
                let font = self.resolve_font(doc, resources, name)?;
                self.gs.font = Some(font);
                self.gs.font_size = number(operands, 1)?;
            }
            "Tc" => self.gs.char_spacing = number(operands, 0)?,
            "Tw" => self.gs.word_spacing = number(operands, 0)?,
            "Tz" => self.gs.horizontal_scaling = number(operands, 0)?,
            "TL" => self.gs.leading = number(operands, 0)?,
            "Ts" => self.gs.text_rise = number(operands, 0)?,
            "Tr" => self.gs.text_render_mode = number(operands, 0)? as i32,

            // --- Text positioning ---
            "Td" => {
                let [tx, ty] = numbers::<2>(operands)?;
                self.move_text(tx, ty);
            }
            "TD" => {
                let [tx, ty] = numbers::<2>(operands)?;
                self.gs.leading = -ty;
                self.move_text(tx, ty);
            }
            "Tm" => {
                let [a, b, c, d, e, f] = numbers::<6>(operands)?;
                self.text_line_matrix = Matrix::new(a, b, c, d, e, f);
                self.text_matrix = self.text_line_matrix;
            }
            "T*" => self.next_line(),

            // --- Text showing ---
            "Tj" => {
                let string = string_operand(operands, 0).ok_or_else(|| operand_error(operation))?;
                self.display_pdf_string(string.to_vec())?;
            }
            "'" => {
                let string = string_operand(operands, 0).ok_or_else(|| operand_error(operation))?;
                self.next_line();
                self.display_pdf_string(string.to_vec())?;
            }
            "\"" => {
                self.gs.word_spacing = number(operands, 0)?;
                self.gs.char_spacing = number(operands, 1)?;
                let string = string_operand(operands, 2).ok_or_else(|| operand_error(operation))?;
                self.next_line();
                self.display_pdf_string(string.to_vec())?;
            }
            "TJ" => {
                let array = operands
                    .first()
                    .and_then(|o| o.as_array().ok())
                    .ok_or_else(|| operand_error(operation))?;
                for entry in array {
                    match entry {
                        Object::String(bytes, _) => self.display_pdf_string(bytes.clone())?,
                        other => {
                            if let Ok(adjustment) = other.as_float() {
                                self.apply_text_adjust(adjustment);
                            }
                        }
                    }
                }
            }

            // --- Marked content ---
            "BMC" => {
                let tag = operands.first().and_then(|o| o.as_name().ok()).unwrap_or(b"Span".as_slice());
                self.marked_content.push(CanvasTag::new(tag, None));
            }
            "BDC" => {
                let tag = operands.first().and_then(|o| o.as_name().ok()).unwrap_or(b"Span".as_slice());
                let properties = operands.get(1).and_then(|o| marked_content_properties(doc, resources, o));
                self.marked_content.push(CanvasTag::new(tag, properties));
            }
            "EMC" => {
                if self.marked_content.pop().is_none() {
                    log::warn!("EMC without a matching BMC/BDC");
                }
            }

            // --- Colour ---
            "g" => self.gs.fill_color = Color::gray(number(operands, 0)?),
            "G" => self.gs.stroke_color = Color::gray(number(operands, 0)?),
            "rg" => {
                let [r, g, b] = numbers::<3>(operands)?;
                self.gs.fill_color = Color::Rgb { r, g, b };
            }
            "RG" => {
                let [r, g, b] = numbers::<3>(operands)?;
                self.gs.stroke_color = Color::Rgb { r, g, b };
            }
            "k" => {
                let [c, m, y, k] = numbers::<4>(operands)?;
                self.gs.fill_color = Color::Cmyk { c, m, y, k };
            }
            "K" => {
                let [c, m, y, k] = numbers::<4>(operands)?;
                self.gs.stroke_color = Color::Cmyk { c, m, y, k };
            }
            _ => {}
        }
        Ok(())
    }

    fn move_text(&mut self, tx: f32, ty: f32) {
        self.text_line_matrix = Matrix::translation(tx, ty).multiply(&self.text_line_matrix);
        self.text_matrix = self.text_line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.gs.leading;
        self.move_text(0.0, -leading);
    }

    /// A `TJ` number moves the text matrix left by thousandths of a text
    /// space unit.
    fn apply_text_adjust(&mut self, adjustment: f32) {
        let adjust_by = -adjustment / 1000.0 * self.gs.font_size * (self.gs.horizontal_scaling / 100.0);
        self.text_matrix = Matrix::translation(adjust_by, 0.0).multiply(&self.text_matrix);
    }

    fn display_pdf_string(&mut self, string: Vec<u8>) -> Result<(), KernelError> {
        if self.gs.font.is_none() {
            return Err(KernelError::Other("Text shown without a font being set".to_string()));
        }
        let tags: Vec<CanvasTag> = self.marked_content.iter().rev().cloned().collect();
        let mut info = TextRenderInfo::new(string, self.gs.clone(), &self.text_matrix, tags)?;
        let width = info.unscaled_width()?;
        self.listener.event_occurred(ParserEvent::RenderText(&mut info))?;
        info.release_graphics_state();
        self.text_matrix = Matrix::translation(width, 0.0).multiply(&self.text_matrix);
        Ok(())
    }

    fn resolve_font(
        &mut self,
        doc: &PdfDocument,
        resources: &Dictionary,
        name: &[u8],
    ) -> Result<SharedFont, KernelError> {
        if let Some(font) = self.font_cache.get(name) {
            return Ok(font.clone());
        }
        let font = load_font(doc, resources, name)?;
        self.font_cache.insert(name.to_vec(), font.clone());
        Ok(font)
    }
}

fn load_font(doc: &PdfDocument, resources: &Dictionary, name: &[u8]) -> Result<SharedFont, KernelError> {
    let resource_name = String::from_utf8_lossy(name);
    let entry = resources
        .get(b"Font")
        .ok()
        .and_then(|fonts| deref_dict(doc, fonts))
        .and_then(|fonts| fonts.get(name).ok());

    if let Some(Object::Reference(id)) = entry {
        if let Some(font) = doc.font_by_id(*id) {
            return Ok(font);
        }
    }
    if let Some(font) = doc.font_by_resource_name(&resource_name) {
        return Ok(font);
    }

    let dict = entry
        .and_then(|e| deref_dict(doc, e))
        .ok_or_else(|| KernelError::Other(format!("Font resource /{} not found", resource_name)))?;
    if dict.get(b"Subtype").and_then(Object::as_name).is_ok_and(|s| s == b"Type0") {
        return Err(KernelError::UnsupportedOperation(format!(
            "Reading unregistered Type0 font /{} from a document",
            resource_name
        )));
    }
    Ok(Rc::new(SimpleFont::from_dictionary(doc.lopdf(), dict)?))
}

/// The page's `/Resources`, inherited from the page tree when absent.
fn page_resources(doc: &PdfDocument, page_id: ObjectId) -> Result<Dictionary, KernelError> {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        let node = doc.dictionary(id)?;
        if let Some(resources) = node.get(b"Resources").ok().and_then(|r| deref_dict(doc, r)) {
            return Ok(resources.clone());
        }
        current = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
        if depth > 64 {
            break;
        }
    }
    Ok(Dictionary::new())
}

fn marked_content_properties(doc: &PdfDocument, resources: &Dictionary, operand: &Object) -> Option<Dictionary> {
    match operand {
        Object::Dictionary(dict) => Some(dict.clone()),
        Object::Name(name) => resources
            .get(b"Properties")
            .ok()
            .and_then(|props| deref_dict(doc, props))
            .and_then(|props| props.get(name).ok())
            .and_then(|p| deref_dict(doc, p))
            .cloned(),
        other => deref_dict(doc, other).cloned(),
    }
}

fn deref_dict<'a>(doc: &'a PdfDocument, object: &'a Object) -> Option<&'a Dictionary> {
    match object {
        Object::Reference(id) => doc.dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn string_operand(operands: &[Object], index: usize) -> Option<&[u8]> {
    match operands.get(index)? {
        Object::String(bytes, _) => Some(bytes),
        _ => None,
    }
}

fn number(operands: &[Object], index: usize) -> Result<f32, KernelError> {
    operands
        .get(index)
        .ok_or_else(|| KernelError::Other(format!("Missing operand {}", index)))?
        .as_float()
        .map_err(KernelError::from)
}

fn numbers<const N: usize>(operands: &[Object]) -> Result<[f32; N], KernelError> {
    let mut result = [0.0; N];
    for (i, slot) in result.iter_mut().enumerate() {
        *slot = number(operands, i)?;
    }
    Ok(result)
}

fn operand_error(operation: &Operation) -> KernelError {
    KernelError::Other(format!("Invalid operands for operator {}", operation.operator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PdfCanvas;
    use crate::font::{PdfFont, TrueTypeProgram, Type0Font};
    use crate::parser::SimpleTextExtractionListener;
    use crate::test_utils::{build_test_font, TestFontOptions};
    use lopdf::{dictionary, Stream, StringFormat};

    /// Keeps a preserved copy of every text event.
    #[derive(Default)]
    struct Collecting {
        infos: Vec<TextRenderInfo>,
        begins: usize,
        ends: usize,
    }

    impl EventListener for Collecting {
        fn event_occurred(&mut self, event: ParserEvent<'_>) -> Result<(), KernelError> {
            match event {
                ParserEvent::BeginText => self.begins += 1,
                ParserEvent::EndText => self.ends += 1,
                ParserEvent::RenderText(info) => {
                    info.preserve_graphics_state()?;
                    self.infos.push(info.clone());
                }
            }
            Ok(())
        }
    }

    fn page_with_content(ops: Vec<Operation>) -> (PdfDocument, ObjectId) {
        let mut doc = PdfDocument::new("1.7");
        let page = doc.add_page(300.0, 300.0).unwrap();
        let font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bytes = Content { operations: ops }.encode().unwrap();
        let content = doc.add_object(Stream::new(Dictionary::new(), bytes));
        let page_dict = doc.dictionary_mut(page).unwrap();
        page_dict.set("Contents", content);
        page_dict.set("Resources", dictionary! { "Font" => dictionary! { "F1" => font } });
        (doc, page)
    }

    fn text(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    }

    #[test]
    fn tracks_text_matrix_across_shows_and_adjustments() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (doc, page) = page_with_content(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![100.into(), 200.into()]),
            Operation::new("Tj", vec![text("H")]),
            Operation::new("TJ", vec![Object::Array(vec![(-1000).into(), text("H")])]),
            Operation::new("ET", vec![]),
        ]);

        let mut processor = PdfCanvasProcessor::new(Collecting::default());
        processor.process_page_content(&doc, page).unwrap();
        let listener = processor.into_listener();
        assert_eq!((listener.begins, listener.ends), (1, 1));
        assert_eq!(listener.infos.len(), 2);

        let first = listener.infos[0].baseline().unwrap();
        assert!((first.start.x - 100.0).abs() < 1e-3);
        assert!((first.start.y - 200.0).abs() < 1e-3);
        // H is 722 wide; the -1000 adjustment moves right by one em.
        let second = listener.infos[1].baseline().unwrap();
        assert!((second.start.x - (100.0 + 7.22 + 10.0)).abs() < 1e-3);
    }

    #[test]
    fn marked_content_and_state_reach_the_listener() {
        let (doc, page) = page_with_content(vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![1.into(), 0.into(), 0.into(), 1.into(), 0.into(), 50.into()]),
            Operation::new("rg", vec![1.into(), 0.into(), 0.into()]),
            Operation::new("BDC", vec!["P".into(), dictionary! { "MCID" => 3 }.into()]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Ts", vec![2.into()]),
            Operation::new("Tj", vec![text("x")]),
            Operation::new("ET", vec![]),
            Operation::new("EMC", vec![]),
            Operation::new("Q", vec![]),
        ]);
        let mut processor = PdfCanvasProcessor::new(Collecting::default());
        processor.process_page_content(&doc, page).unwrap();
        let info = &processor.listener().infos[0];
        assert_eq!(info.mcid(), 3);
        assert_eq!(info.fill_color().unwrap(), Color::Rgb { r: 1.0, g: 0.0, b: 0.0 });
        assert_eq!(info.font_size().unwrap(), 12.0);
        assert!((info.baseline().unwrap().start.y - 52.0).abs() < 1e-3);
    }

    #[test]
    fn text_matrix_advances_when_the_listener_releases_early() {
        struct Keeping(Vec<TextRenderInfo>);
        impl EventListener for Keeping {
            fn event_occurred(&mut self, event: ParserEvent<'_>) -> Result<(), KernelError> {
                if let ParserEvent::RenderText(info) = event {
                    self.0.push(info.clone());
                    info.release_graphics_state();
                }
                Ok(())
            }
        }
        let (doc, page) = page_with_content(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Tj", vec![text("ab")]),
            Operation::new("Tj", vec![text("c")]),
            Operation::new("ET", vec![]),
        ]);
        let mut processor = PdfCanvasProcessor::new(Keeping(Vec::new()));
        processor.process_page_content(&doc, page).unwrap();
        // The text matrix still advanced past "ab".
        let infos = &processor.listener().0;
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[1].text().unwrap(), "c");
        let second_start = infos[1].baseline().unwrap().start.x;
        assert!((second_start - (5.56 + 5.56) * 1.2).abs() < 1e-3);
    }

    #[test]
    fn text_without_font_is_an_error() {
        let (doc, page) = page_with_content(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tj", vec![text("x")]),
            Operation::new("ET", vec![]),
        ]);
        let mut processor = PdfCanvasProcessor::new(Collecting::default());
        assert!(processor.process_page_content(&doc, page).is_err());
    }

    #[test]
    fn reads_back_text_written_with_a_registered_type0_font() {
        let data = build_test_font(&[('H', 700), ('i', 300), (' ', 250)], TestFontOptions::default());
        let program = TrueTypeProgram::from_bytes(data).unwrap();
        let font: SharedFont = Rc::new(Type0Font::identity_h(Rc::new(program)).unwrap());

        let mut doc = PdfDocument::new("1.7");
        let page = doc.add_page(300.0, 300.0).unwrap();
        let handle = doc.register_font(font.clone());
        let mut canvas = PdfCanvas::new();
        canvas
            .begin_text()
            .set_font_and_size(&handle, 10.0)
            .move_text(10.0, 100.0)
            .show_text(font.convert_to_bytes("Hi Hi"))
            .move_text(0.0, -20.0)
            .show_text(font.convert_to_bytes("iH"))
            .end_text();
        canvas.finish(&mut doc, page).unwrap();

        let mut processor = PdfCanvasProcessor::new(SimpleTextExtractionListener::new());
        processor.process_page_content(&doc, page).unwrap();
        assert_eq!(processor.listener().result_text(), "Hi Hi\niH");
    }
}
