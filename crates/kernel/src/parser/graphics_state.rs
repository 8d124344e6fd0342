use crate::font::SharedFont;
use lopdf::{Dictionary, Object};
use vellum_types::{Color, Matrix};

/// The part of the graphics state that matters for reading text back.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    pub ctm: Matrix,
    pub font: Option<SharedFont>,
    pub font_size: f32,
    pub char_spacing: f32,
    pub word_spacing: f32,
    /// Percent; 100 is unscaled.
    pub horizontal_scaling: f32,
    pub leading: f32,
    pub text_rise: f32,
    pub text_render_mode: i32,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub line_width: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::identity(),
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            text_rise: 0.0,
            text_render_mode: 0,
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: 1.0,
        }
    }
}

impl GraphicsState {
    /// Pre-multiplies the CTM, as `cm` does.
    pub fn update_ctm(&mut self, m: &Matrix) {
        self.ctm = m.multiply(&self.ctm);
    }
}

/// A marked-content sequence the current content sits in, innermost first
/// when collected from the processor.
#[derive(Debug, Clone)]
pub struct CanvasTag {
    role: Vec<u8>,
    properties: Option<Dictionary>,
}

impl CanvasTag {
    pub fn new(role: &[u8], properties: Option<Dictionary>) -> Self {
        Self { role: role.to_vec(), properties }
    }

    pub fn role(&self) -> &[u8] {
        &self.role
    }

    pub fn properties(&self) -> Option<&Dictionary> {
        self.properties.as_ref()
    }

    pub fn mcid(&self) -> Option<i64> {
        self.properties.as_ref()?.get(b"MCID").and_then(Object::as_i64).ok()
    }

    pub fn has_mcid(&self) -> bool {
        self.mcid().is_some()
    }

    pub fn actual_text(&self) -> Option<String> {
        self.text_property(b"ActualText")
    }

    pub fn expansion_text(&self) -> Option<String> {
        self.text_property(b"E")
    }

    fn text_property(&self, key: &[u8]) -> Option<String> {
        match self.properties.as_ref()?.get(key).ok()? {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            _ => None,
        }
    }
}

/// Decodes a PDF text string: UTF-16BE with a byte order mark, otherwise
/// one byte per character.
pub fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|b| *b as char).collect(),
    }
}
