use super::text_render_info::TextRenderInfo;
use crate::document::PdfDocument;
use crate::KernelError;
use vellum_types::Vector;

/// What the processor reports while walking a content stream.
#[derive(Debug)]
pub enum ParserEvent<'a> {
    BeginText,
    /// A shown string. The graphics state is released right after the
    /// listener returns unless it calls `preserve_graphics_state`.
    RenderText(&'a mut TextRenderInfo),
    EndText,
}

pub trait EventListener {
    fn event_occurred(&mut self, event: ParserEvent<'_>) -> Result<(), KernelError>;
}

/// Concatenates text in stream order, inserting a line break when the
/// baseline changes and a space when the gap between strings is wider than
/// half a space.
#[derive(Debug, Default)]
pub struct SimpleTextExtractionListener {
    result: String,
    last_start: Option<Vector>,
    last_end: Option<Vector>,
}

impl SimpleTextExtractionListener {
    /// Baselines further apart than this are on different lines.
    const SAME_LINE_THRESHOLD: f32 = 1.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn result_text(&self) -> &str {
        &self.result
    }

    fn render_text(&mut self, info: &TextRenderInfo) -> Result<(), KernelError> {
        let segment = info.baseline()?;
        let (start, end) = (segment.start, segment.end);
        let text = info.text()?;

        if let (Some(last_start), Some(last_end)) = (self.last_start, self.last_end) {
            if distance_squared_to_line(&last_start, &last_end, &start) > Self::SAME_LINE_THRESHOLD {
                self.result.push('\n');
            } else if !self.result.ends_with(' ') && !text.is_empty() && !text.starts_with(' ') {
                let spacing = last_end.subtract(&start).length();
                if spacing > info.single_space_width()? / 2.0 {
                    self.result.push(' ');
                }
            }
        }

        self.result.push_str(&text);
        self.last_start = Some(start);
        self.last_end = Some(end);
        Ok(())
    }
}

impl EventListener for SimpleTextExtractionListener {
    fn event_occurred(&mut self, event: ParserEvent<'_>) -> Result<(), KernelError> {
        match event {
            ParserEvent::RenderText(info) => self.render_text(info),
            ParserEvent::BeginText | ParserEvent::EndText => Ok(()),
        }
    }
}

/// Squared distance of `point` from the line through `a` and `b`. A
/// degenerate line measures the distance to `a`.
fn distance_squared_to_line(a: &Vector, b: &Vector, point: &Vector) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let (vx, vy) = (a.x - point.x, a.y - point.y);
    let length_squared = dx * dx + dy * dy;
    if length_squared == 0.0 {
        return vx * vx + vy * vy;
    }
    let cross = dx * vy - dy * vx;
    cross * cross / length_squared
}

/// Extracts the text of one page (1-based) with [`SimpleTextExtractionListener`].
pub fn extract_page_text(doc: &PdfDocument, page_number: usize) -> Result<String, KernelError> {
    let page_id = doc
        .page_id(page_number)
        .ok_or_else(|| KernelError::Other(format!("Page {} does not exist", page_number)))?;
    let mut processor = super::PdfCanvasProcessor::new(SimpleTextExtractionListener::new());
    processor.process_page_content(doc, page_id)?;
    Ok(processor.into_listener().result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PdfCanvas;
    use crate::font::{PdfFont, SharedFont, SimpleFont};
    use std::rc::Rc;

    #[test]
    fn distance_to_line() {
        let a = Vector::point(0.0, 0.0);
        let b = Vector::point(10.0, 0.0);
        assert_eq!(distance_squared_to_line(&a, &b, &Vector::point(5.0, 3.0)), 9.0);
        assert_eq!(distance_squared_to_line(&a, &a, &Vector::point(3.0, 4.0)), 25.0);
    }

    #[test]
    fn joins_words_and_lines() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut doc = PdfDocument::new("1.7");
        let page = doc.add_page(300.0, 300.0).unwrap();
        let font: SharedFont = Rc::new(SimpleFont::helvetica());
        let handle = doc.register_font(font.clone());

        let mut canvas = PdfCanvas::new();
        canvas
            .begin_text()
            .set_font_and_size(&handle, 10.0)
            .move_text(10.0, 200.0)
            .show_text(font.convert_to_bytes("Hello"))
            // A gap of 20 on the same baseline.
            .move_text(font.width_point("Hello", 10.0) + 20.0, 0.0)
            .show_text(font.convert_to_bytes("world"))
            .end_text()
            .begin_text()
            .set_font_and_size(&handle, 10.0)
            .move_text(10.0, 180.0)
            .show_text(font.convert_to_bytes("next"))
            .end_text();
        canvas.finish(&mut doc, page).unwrap();

        assert_eq!(extract_page_text(&doc, 1).unwrap(), "Hello world\nnext");
        assert!(extract_page_text(&doc, 2).is_err());
    }
}
