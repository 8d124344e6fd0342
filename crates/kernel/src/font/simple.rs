//! Single-byte fonts: the standard Helvetica used as a built-in default, and
//! simple fonts read back from existing font dictionaries.

use super::PdfFont;
use crate::KernelError;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

/// Helvetica advance widths for codes 32..=126.
const HELVETICA_WIDTHS: [i32; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32..47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48..63
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64..79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80..95
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96..111
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112..126
];

/// Code points of WinAnsiEncoding bytes 0x80..=0x9F. Zero marks an unused
/// code.
const WIN_ANSI_HIGH: [u32; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039,
    0x0152, 0, 0x017D, 0, 0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC,
    0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178,
];

fn win_ansi_to_unicode(byte: u8) -> Option<char> {
    match byte {
        0x80..=0x9F => char::from_u32(WIN_ANSI_HIGH[(byte - 0x80) as usize]).filter(|c| *c != '\0'),
        _ => Some(byte as char),
    }
}

fn unicode_to_win_ansi(c: char) -> Option<u8> {
    let cp = c as u32;
    match cp {
        0..=0x7F | 0xA0..=0xFF => Some(cp as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .position(|u| *u == cp && cp != 0)
            .map(|i| 0x80 + i as u8),
    }
}

/// A single-byte font with a `FirstChar`/`Widths` table and WinAnsi text
/// mapping.
#[derive(Debug, Clone)]
pub struct SimpleFont {
    base_font: String,
    first_char: u8,
    widths: Vec<i32>,
    missing_width: i32,
    ascent: f32,
    descent: f32,
    /// Written as `/Type1` on flush; fonts read from a document are not
    /// rewritten.
    standard: bool,
}

impl SimpleFont {
    /// The standard 14 Helvetica, needing no embedded program.
    pub fn helvetica() -> Self {
        Self {
            base_font: "Helvetica".to_string(),
            first_char: 32,
            widths: HELVETICA_WIDTHS.to_vec(),
            missing_width: 278,
            ascent: 718.0,
            descent: -207.0,
            standard: true,
        }
    }

    /// Reads a simple font dictionary (`/Type1`, `/TrueType`, ...).
    pub fn from_dictionary(doc: &Document, dict: &Dictionary) -> Result<Self, KernelError> {
        let base_font = dict
            .get(b"BaseFont")
            .and_then(Object::as_name)
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_else(|_| "Unknown".to_string());
        let base_name = base_font.split('+').next_back().unwrap_or(&base_font).to_string();

        let first_char = dict.get(b"FirstChar").and_then(Object::as_i64).unwrap_or(0) as u8;
        let widths: Vec<i32> = match dict.get(b"Widths") {
            Ok(obj) => deref(doc, obj)?
                .as_array()?
                .iter()
                .map(|w| number(w).unwrap_or(0.0) as i32)
                .collect(),
            Err(_) => Vec::new(),
        };

        let descriptor = dict
            .get(b"FontDescriptor")
            .ok()
            .and_then(|d| deref(doc, d).ok())
            .and_then(|d| d.as_dict().ok());
        let descriptor_value = |key: &[u8]| {
            descriptor
                .and_then(|d| d.get(key).ok())
                .and_then(number)
        };

        if widths.is_empty() && base_name.starts_with("Helvetica") {
            let mut font = Self::helvetica();
            font.base_font = base_name;
            font.standard = false;
            return Ok(font);
        }

        Ok(Self {
            base_font: base_name,
            first_char,
            widths,
            missing_width: descriptor_value(b"MissingWidth").unwrap_or(0.0) as i32,
            ascent: descriptor_value(b"Ascent").unwrap_or(718.0),
            descent: descriptor_value(b"Descent").unwrap_or(-207.0),
            standard: false,
        })
    }

    fn code_width(&self, code: u8) -> i32 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .unwrap_or(self.missing_width)
    }
}

fn deref<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object, KernelError> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

impl PdfFont for SimpleFont {
    fn font_name(&self) -> String {
        self.base_font.clone()
    }

    fn ascent(&self) -> f32 {
        self.ascent
    }

    fn descent(&self) -> f32 {
        self.descent
    }

    fn avg_width(&self) -> i32 {
        let nonzero: Vec<i32> = self.widths.iter().copied().filter(|w| *w > 0).collect();
        if nonzero.is_empty() {
            self.missing_width
        } else {
            nonzero.iter().sum::<i32>() / nonzero.len() as i32
        }
    }

    fn width(&self, unicode: u32) -> i32 {
        char::from_u32(unicode)
            .and_then(unicode_to_win_ansi)
            .map(|code| self.code_width(code))
            .unwrap_or(0)
    }

    fn convert_to_bytes(&self, text: &str) -> Vec<u8> {
        text.chars().map(|c| unicode_to_win_ansi(c).unwrap_or(b'?')).collect()
    }

    fn decode(&self, bytes: &[u8]) -> String {
        bytes.iter().filter_map(|b| win_ansi_to_unicode(*b)).collect()
    }

    fn content_width(&self, bytes: &[u8]) -> f32 {
        bytes.iter().map(|b| self.code_width(*b) as f32).sum()
    }

    fn flush(&self, doc: &mut Document, font_id: ObjectId) -> Result<(), KernelError> {
        if !self.standard {
            return Ok(());
        }
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => Object::Name(self.base_font.clone().into_bytes()),
            "Encoding" => "WinAnsiEncoding",
        };
        doc.objects.insert(font_id, Object::Dictionary(dict));
        Ok(())
    }
}
