//! Geometry and text of one shown string, reconstructed from the graphics
//! state in effect when it was shown.

use super::graphics_state::{CanvasTag, GraphicsState};
use crate::font::SharedFont;
use crate::KernelError;
use once_cell::unsync::OnceCell;
use std::rc::Rc;
use vellum_types::{Color, LineSegment, Matrix, Vector};

/// Everything known about a string shown by `Tj`, `TJ`, `'` or `"`.
///
/// The graphics state is only valid while the event is dispatched; after
/// [`TextRenderInfo::release_graphics_state`] every accessor that needs it
/// returns [`KernelError::GraphicsStateReleased`]. Call
/// [`TextRenderInfo::preserve_graphics_state`] to keep it.
#[derive(Debug, Clone)]
pub struct TextRenderInfo {
    string: Vec<u8>,
    text: OnceCell<String>,
    text_to_user_space: Matrix,
    gs: Option<Rc<GraphicsState>>,
    unscaled_width: OnceCell<f32>,
    font_matrix: [f64; 6],
    preserved: bool,
    /// Innermost tag first.
    canvas_tags: Rc<[CanvasTag]>,
}

impl TextRenderInfo {
    pub fn new(
        string: Vec<u8>,
        gs: GraphicsState,
        text_matrix: &Matrix,
        canvas_tags: Vec<CanvasTag>,
    ) -> Result<Self, KernelError> {
        let font = gs
            .font
            .as_ref()
            .ok_or_else(|| KernelError::Other("Text shown without a font".to_string()))?;
        let font_matrix = font.font_matrix();
        Ok(Self {
            string,
            text: OnceCell::new(),
            text_to_user_space: text_matrix.multiply(&gs.ctm),
            gs: Some(Rc::new(gs)),
            unscaled_width: OnceCell::new(),
            font_matrix,
            preserved: false,
            canvas_tags: canvas_tags.into(),
        })
    }

    fn sub_info(&self, string: Vec<u8>, horizontal_offset: f32) -> Self {
        Self {
            string,
            text: OnceCell::new(),
            text_to_user_space: Matrix::translation(horizontal_offset, 0.0).multiply(&self.text_to_user_space),
            gs: self.gs.clone(),
            unscaled_width: OnceCell::new(),
            font_matrix: self.font_matrix,
            preserved: self.preserved,
            canvas_tags: self.canvas_tags.clone(),
        }
    }

    fn gs(&self) -> Result<&GraphicsState, KernelError> {
        self.gs.as_deref().ok_or(KernelError::GraphicsStateReleased)
    }

    fn font_ref(&self) -> Result<&SharedFont, KernelError> {
        self.gs()?
            .font
            .as_ref()
            .ok_or_else(|| KernelError::Other("Text shown without a font".to_string()))
    }

    /// The decoded text, reversed inside `/ReversedChars` marked content.
    pub fn text(&self) -> Result<String, KernelError> {
        if let Some(text) = self.text.get() {
            return Ok(text.clone());
        }
        let font = self.font_ref()?;
        let decoded = font.decode(&self.string);
        let text = if self.is_reversed_chars() {
            decoded.chars().rev().collect()
        } else {
            decoded
        };
        Ok(self.text.get_or_init(|| text).clone())
    }

    /// The raw string operand.
    pub fn pdf_string(&self) -> &[u8] {
        &self.string
    }

    pub fn has_mcid(&self, mcid: i64, check_the_topmost_level_only: bool) -> bool {
        if check_the_topmost_level_only {
            let info_mcid = self.mcid();
            info_mcid != -1 && info_mcid == mcid
        } else {
            self.canvas_tags.iter().any(|tag| tag.mcid() == Some(mcid))
        }
    }

    /// The MCID of the innermost tag carrying one, or -1.
    pub fn mcid(&self) -> i64 {
        self.canvas_tags.iter().find_map(CanvasTag::mcid).unwrap_or(-1)
    }

    /// The baseline in user space, shifted by the text rise.
    pub fn baseline(&self) -> Result<LineSegment, KernelError> {
        let rise = self.gs()?.text_rise;
        Ok(self.unscaled_baseline_with_offset(rise)?.transform_by(&self.text_to_user_space))
    }

    /// The baseline in text space.
    pub fn unscaled_baseline(&self) -> Result<LineSegment, KernelError> {
        self.unscaled_baseline_with_offset(self.gs()?.text_rise)
    }

    pub fn ascent_line(&self) -> Result<LineSegment, KernelError> {
        let (ascent, _) = self.ascent_descent()?;
        let offset = ascent + self.gs()?.text_rise;
        Ok(self.unscaled_baseline_with_offset(offset)?.transform_by(&self.text_to_user_space))
    }

    pub fn descent_line(&self) -> Result<LineSegment, KernelError> {
        let (_, descent) = self.ascent_descent()?;
        let offset = descent + self.gs()?.text_rise;
        Ok(self.unscaled_baseline_with_offset(offset)?.transform_by(&self.text_to_user_space))
    }

    pub fn font(&self) -> Result<SharedFont, KernelError> {
        self.font_ref().cloned()
    }

    /// The text rise converted to user space.
    pub fn rise(&self) -> Result<f32, KernelError> {
        let rise = self.gs()?.text_rise;
        if rise == 0.0 {
            return Ok(0.0);
        }
        Ok(self.convert_height_to_user_space(rise))
    }

    /// One info per glyph, each offset by the advance of the glyphs before
    /// it.
    pub fn character_render_infos(&self) -> Result<Vec<TextRenderInfo>, KernelError> {
        let gs = self.gs()?;
        let mut result = Vec::new();
        let mut total_width = 0.0;
        for part in self.split_string(&self.string)? {
            let (width, word_spacing) = self.width_and_word_spacing(&part)?;
            let sub = self.sub_info(part, total_width);
            total_width += (width * gs.font_size + gs.char_spacing + word_spacing) * (gs.horizontal_scaling / 100.0);
            result.push(sub);
        }
        for info in &result {
            info.unscaled_width()?;
        }
        Ok(result)
    }

    /// Width of a space in user space, falling back to the font's average
    /// width when it has no space glyph.
    pub fn single_space_width(&self) -> Result<f32, KernelError> {
        let width = self.unscaled_font_space_width()?;
        Ok(self.convert_width_to_user_space(width))
    }

    pub fn text_render_mode(&self) -> Result<i32, KernelError> {
        Ok(self.gs()?.text_render_mode)
    }

    pub fn fill_color(&self) -> Result<Color, KernelError> {
        Ok(self.gs()?.fill_color)
    }

    pub fn stroke_color(&self) -> Result<Color, KernelError> {
        Ok(self.gs()?.stroke_color)
    }

    pub fn font_size(&self) -> Result<f32, KernelError> {
        Ok(self.gs()?.font_size)
    }

    pub fn horizontal_scaling(&self) -> Result<f32, KernelError> {
        Ok(self.gs()?.horizontal_scaling)
    }

    pub fn char_spacing(&self) -> Result<f32, KernelError> {
        Ok(self.gs()?.char_spacing)
    }

    pub fn word_spacing(&self) -> Result<f32, KernelError> {
        Ok(self.gs()?.word_spacing)
    }

    pub fn leading(&self) -> Result<f32, KernelError> {
        Ok(self.gs()?.leading)
    }

    pub fn actual_text(&self) -> Option<String> {
        self.canvas_tags.iter().find_map(CanvasTag::actual_text)
    }

    pub fn expansion_text(&self) -> Option<String> {
        self.canvas_tags.iter().find_map(CanvasTag::expansion_text)
    }

    pub fn is_reversed_chars(&self) -> bool {
        self.canvas_tags.iter().any(|tag| tag.role() == b"ReversedChars")
    }

    pub fn canvas_tag_hierarchy(&self) -> &[CanvasTag] {
        &self.canvas_tags
    }

    /// Advance of the whole string in text space, spacing included.
    pub fn unscaled_width(&self) -> Result<f32, KernelError> {
        if let Some(width) = self.unscaled_width.get() {
            return Ok(*width);
        }
        let width = self.pdf_string_width(&self.string, false)?;
        Ok(*self.unscaled_width.get_or_init(|| width))
    }

    pub fn is_graphics_state_preserved(&self) -> bool {
        self.preserved
    }

    /// Keeps a private copy of the graphics state past event dispatch.
    pub fn preserve_graphics_state(&mut self) -> Result<(), KernelError> {
        let copy = self.gs()?.clone();
        self.gs = Some(Rc::new(copy));
        self.preserved = true;
        Ok(())
    }

    pub fn release_graphics_state(&mut self) {
        if !self.preserved {
            self.gs = None;
        }
    }

    // --- Text space math ---

    fn unscaled_baseline_with_offset(&self, y_offset: f32) -> Result<LineSegment, KernelError> {
        let gs = self.gs()?;
        // The trailing char and word spacing only matter for positioning the
        // next string.
        // Word spacing only ever applies to the single-byte code 32.
        let trailing_word_spacing = match self.split_string(&self.string)?.last() {
            Some(code) if code.as_slice() == b" " => gs.word_spacing,
            _ => 0.0,
        };
        let corrected_width = self.unscaled_width()?
            - (gs.char_spacing + trailing_word_spacing) * (gs.horizontal_scaling / 100.0);
        Ok(LineSegment::new(
            Vector::new(0.0, y_offset, 1.0),
            Vector::new(corrected_width, y_offset, 1.0),
        ))
    }

    fn convert_width_to_user_space(&self, width: f32) -> f32 {
        LineSegment::new(Vector::point(0.0, 0.0), Vector::point(width, 0.0))
            .transform_by(&self.text_to_user_space)
            .length()
    }

    fn convert_height_to_user_space(&self, height: f32) -> f32 {
        LineSegment::new(Vector::point(0.0, 0.0), Vector::point(0.0, height))
            .transform_by(&self.text_to_user_space)
            .length()
    }

    fn unscaled_font_space_width(&self) -> Result<f32, KernelError> {
        let font = self.font_ref()?;
        if font.width(' ' as u32) == 0 {
            Ok(font.avg_width() as f32 / 1000.0)
        } else {
            self.string_width(" ")
        }
    }

    fn string_width(&self, text: &str) -> Result<f32, KernelError> {
        let gs = self.gs()?;
        let font = self.font_ref()?;
        let mut total = 0.0;
        for c in text.chars() {
            let w = (font.width(c as u32) as f64 * self.font_matrix[0]) as f32;
            let word_spacing = if c == ' ' { gs.word_spacing } else { 0.0 };
            total += (w * gs.font_size + gs.char_spacing + word_spacing) * gs.horizontal_scaling / 100.0;
        }
        Ok(total)
    }

    fn pdf_string_width(&self, string: &[u8], single_char_string: bool) -> Result<f32, KernelError> {
        let gs = self.gs()?;
        if single_char_string {
            let (width, word_spacing) = self.width_and_word_spacing(string)?;
            Ok((width * gs.font_size + gs.char_spacing + word_spacing) * gs.horizontal_scaling / 100.0)
        } else {
            let mut total = 0.0;
            for part in self.split_string(string)? {
                total += self.pdf_string_width(&part, true)?;
            }
            Ok(total)
        }
    }

    fn width_and_word_spacing(&self, string: &[u8]) -> Result<(f32, f32), KernelError> {
        let gs = self.gs()?;
        let font = self.font_ref()?;
        let width = (font.content_width(string) as f64 * self.font_matrix[0]) as f32;
        let word_spacing = if string == b" " { gs.word_spacing } else { 0.0 };
        Ok((width, word_spacing))
    }

    /// Splits a string into per-glyph codes: one byte, or two when the
    /// single byte decodes to nothing.
    fn split_string(&self, string: &[u8]) -> Result<Vec<Vec<u8>>, KernelError> {
        let font = self.font_ref()?;
        let mut parts = Vec::with_capacity(string.len());
        let mut i = 0;
        while i < string.len() {
            let mut part = vec![string[i]];
            if font.decode(&part).is_empty() && i < string.len() - 1 {
                part.push(string[i + 1]);
                i += 1;
            }
            parts.push(part);
            i += 1;
        }
        Ok(parts)
    }

    /// Font ascent and descent scaled to the font size. A positive descent
    /// is treated as a sign error.
    fn ascent_descent(&self) -> Result<(f32, f32), KernelError> {
        let gs = self.gs()?;
        let font = self.font_ref()?;
        let ascent = font.ascent();
        let mut descent = font.descent();
        if descent > 0.0 {
            descent = -descent;
        }
        let scale = if ascent - descent < 700.0 { ascent - descent } else { 1000.0 };
        Ok((ascent / scale * gs.font_size, descent / scale * gs.font_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{SimpleFont, TrueTypeProgram, Type0Font};
    use crate::test_utils::{build_test_font, TestFontOptions};
    use lopdf::dictionary;

    const EPS: f32 = 1e-4;

    fn type0(glyphs: &[(char, u16)]) -> SharedFont {
        let data = build_test_font(glyphs, TestFontOptions::default());
        let program = TrueTypeProgram::from_bytes(data).unwrap();
        Rc::new(Type0Font::identity_h(Rc::new(program)).unwrap())
    }

    fn state(font: SharedFont, size: f32) -> GraphicsState {
        GraphicsState { font: Some(font), font_size: size, ..GraphicsState::default() }
    }

    #[test]
    fn width_of_two_glyphs_and_character_offsets() {
        let font = type0(&[('A', 500), ('B', 1000)]);
        let bytes = font.convert_to_bytes("AB");
        let info = TextRenderInfo::new(bytes, state(font, 12.0), &Matrix::identity(), vec![]).unwrap();

        let expected = 500.0 * 0.001 * 12.0 + 1000.0 * 0.001 * 12.0;
        assert!((info.unscaled_width().unwrap() - expected).abs() < EPS);
        assert_eq!(info.text().unwrap(), "AB");

        let chars = info.character_render_infos().unwrap();
        assert_eq!(chars.len(), 2);
        let offsets: Vec<f32> = chars.iter().map(|c| c.baseline().unwrap().start.x).collect();
        assert!(offsets[0].abs() < EPS);
        assert!((offsets[1] - 6.0).abs() < EPS);
        assert_eq!(chars[1].text().unwrap(), "B");
        assert!((chars[1].unscaled_width().unwrap() - 12.0).abs() < EPS);
    }

    #[test]
    fn spacing_and_scaling_enter_the_width() {
        let font: SharedFont = Rc::new(SimpleFont::helvetica());
        let mut gs = state(font, 10.0);
        gs.char_spacing = 1.0;
        gs.word_spacing = 2.0;
        gs.horizontal_scaling = 50.0;
        let info = TextRenderInfo::new(b"a ".to_vec(), gs, &Matrix::identity(), vec![]).unwrap();

        // a: 556, space: 278
        let a = (5.56 + 1.0) * 0.5;
        let space = (2.78 + 1.0 + 2.0) * 0.5;
        assert!((info.unscaled_width().unwrap() - (a + space)).abs() < EPS);

        // The baseline drops the trailing char and word spacing.
        let baseline = info.unscaled_baseline().unwrap();
        assert!((baseline.end.x - (a + space - 1.5)).abs() < EPS);
    }

    #[test]
    fn two_byte_code_ending_in_0x20_keeps_its_word_spacing_out_of_the_baseline() {
        let glyphs: Vec<(char, u16)> = ('A'..='`').map(|c| (c, 500)).collect();
        assert_eq!(glyphs.len(), 32);
        let font = type0(&glyphs);
        let bytes = font.convert_to_bytes("`");
        assert_eq!(bytes, vec![0x00, 0x20]);

        let mut gs = state(font, 10.0);
        gs.word_spacing = 2.0;
        let info = TextRenderInfo::new(bytes, gs, &Matrix::identity(), vec![]).unwrap();
        assert!((info.unscaled_width().unwrap() - 5.0).abs() < EPS);
        assert!((info.unscaled_baseline().unwrap().end.x - 5.0).abs() < EPS);
    }

    #[test]
    fn baseline_follows_text_matrix_and_rise() {
        let font: SharedFont = Rc::new(SimpleFont::helvetica());
        let mut gs = state(font, 10.0);
        gs.text_rise = 3.0;
        gs.ctm = Matrix::translation(0.0, 100.0);
        let info = TextRenderInfo::new(b"H".to_vec(), gs, &Matrix::translation(50.0, 0.0), vec![]).unwrap();

        let baseline = info.baseline().unwrap();
        assert!((baseline.start.x - 50.0).abs() < EPS);
        assert!((baseline.start.y - 103.0).abs() < EPS);
        assert!((baseline.end.x - 57.22).abs() < EPS);
        assert!((info.rise().unwrap() - 3.0).abs() < EPS);

        // Helvetica: 718 - (-207) >= 700, so the scale is 1000.
        let ascent = info.ascent_line().unwrap();
        assert!((ascent.start.y - (100.0 + 3.0 + 7.18)).abs() < EPS);
        let descent = info.descent_line().unwrap();
        assert!((descent.start.y - (100.0 + 3.0 - 2.07)).abs() < EPS);
    }

    #[test]
    fn reversed_chars_and_mcids() {
        let font: SharedFont = Rc::new(SimpleFont::helvetica());
        let span = CanvasTag::new(b"Span", Some(lopdf::dictionary! { "MCID" => 4 }));
        let reversed = CanvasTag::new(b"ReversedChars", None);
        let info = TextRenderInfo::new(b"abc".to_vec(), state(font, 10.0), &Matrix::identity(), vec![reversed, span])
            .unwrap();
        assert!(info.is_reversed_chars());
        assert_eq!(info.text().unwrap(), "cba");
        assert_eq!(info.mcid(), 4);
        assert!(info.has_mcid(4, false));
        assert!(info.has_mcid(4, true));
        assert!(!info.has_mcid(5, false));

        let untagged =
            TextRenderInfo::new(b"x".to_vec(), state(Rc::new(SimpleFont::helvetica()), 10.0), &Matrix::identity(), vec![])
                .unwrap();
        assert_eq!(untagged.mcid(), -1);
        assert!(!untagged.has_mcid(-1, true));
    }

    #[test]
    fn released_state_is_an_error_unless_preserved() {
        let font: SharedFont = Rc::new(SimpleFont::helvetica());
        let mut released = TextRenderInfo::new(b"x".to_vec(), state(font.clone(), 10.0), &Matrix::identity(), vec![])
            .unwrap();
        released.release_graphics_state();
        assert!(matches!(released.baseline(), Err(KernelError::GraphicsStateReleased)));
        assert!(matches!(released.font_size(), Err(KernelError::GraphicsStateReleased)));
        assert!(matches!(released.preserve_graphics_state(), Err(KernelError::GraphicsStateReleased)));

        let mut kept = TextRenderInfo::new(b"x".to_vec(), state(font, 10.0), &Matrix::identity(), vec![]).unwrap();
        kept.preserve_graphics_state().unwrap();
        kept.release_graphics_state();
        assert!(kept.is_graphics_state_preserved());
        assert_eq!(kept.font_size().unwrap(), 10.0);
    }

    #[test]
    fn single_space_width_uses_the_space_glyph_or_average() {
        let helvetica: SharedFont = Rc::new(SimpleFont::helvetica());
        let info = TextRenderInfo::new(b"x".to_vec(), state(helvetica, 10.0), &Matrix::identity(), vec![]).unwrap();
        assert!((info.single_space_width().unwrap() - 2.78).abs() < EPS);

        // No space width: falls back to avg width / 1000, not scaled by size.
        let doc = lopdf::Document::with_version("1.7");
        let dict = lopdf::dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "Custom",
            "FirstChar" => 65,
            "Widths" => vec![lopdf::Object::Integer(400), lopdf::Object::Integer(600)],
        };
        let font: SharedFont = Rc::new(SimpleFont::from_dictionary(&doc, &dict).unwrap());
        let info = TextRenderInfo::new(b"A".to_vec(), state(font, 10.0), &Matrix::identity(), vec![]).unwrap();
        assert!((info.single_space_width().unwrap() - 0.5).abs() < EPS);
    }
}
