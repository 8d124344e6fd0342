//! Composite (Type0) fonts with a single CID-keyed descendant.

use super::cmap::{to_unicode_cmap, CMapEncoding};
use super::program::FontProgram;
use super::subset::subset_true_type;
use super::{Glyph, PdfFont, DEFAULT_WIDTH};
use crate::KernelError;
use itertools::Itertools;
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::rc::Rc;

/// How glyphs of the descendant font are identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CidFontType {
    /// CFF outlines, `/CIDFontType0`.
    Type0,
    /// TrueType outlines addressed by glyph id, `/CIDFontType2`.
    Type2,
}

impl CidFontType {
    pub fn subtype(self) -> &'static str {
        match self {
            CidFontType::Type0 => "CIDFontType0",
            CidFontType::Type2 => "CIDFontType2",
        }
    }

    pub fn from_subtype(name: &[u8]) -> Result<Self, KernelError> {
        match name {
            b"CIDFontType0" => Ok(CidFontType::Type0),
            b"CIDFontType2" => Ok(CidFontType::Type2),
            other => Err(KernelError::UnsupportedOperation(format!(
                "Unknown CID font type: {}",
                String::from_utf8_lossy(other)
            ))),
        }
    }
}

/// A used glyph as recorded while encoding: `(code, width, unicode)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UsedGlyph {
    code: u32,
    width: i32,
    unicode: u32,
}

/// A Type0 font over an embedded font program.
#[derive(Debug)]
pub struct Type0Font {
    program: Rc<dyn FontProgram>,
    cmap: CMapEncoding,
    cid_font_type: CidFontType,
    vertical: bool,
    subset: bool,
    /// Glyphs used so far, keyed by code.
    long_tag: RefCell<BTreeMap<u32, UsedGlyph>>,
    notdef_glyphs: RefCell<HashMap<u32, Glyph>>,
}

impl Type0Font {
    /// Creates a font encoded with `cmap`, which must be `Identity-H` or
    /// `Identity-V`.
    pub fn new(program: Rc<dyn FontProgram>, cmap: &str) -> Result<Self, KernelError> {
        let cmap = CMapEncoding::new(cmap);
        if !cmap.is_direct() {
            return Err(KernelError::UnsupportedOperation(format!(
                "Only Identity CMaps are supported with embedded fonts, got {}",
                cmap.name()
            )));
        }
        if !program.is_embedding_allowed() {
            return Err(KernelError::EmbeddingNotAllowed(program.names().font_name.clone()));
        }
        if !program.is_font_specific() && !program.has_unicode_cmap() {
            return Err(KernelError::NoSuitableCmap);
        }
        let cid_font_type = if program.is_cff() { CidFontType::Type0 } else { CidFontType::Type2 };
        let vertical = cmap.is_vertical();
        let subset = program.is_subsetting_allowed();
        Ok(Self {
            program,
            cmap,
            cid_font_type,
            vertical,
            subset,
            long_tag: RefCell::new(BTreeMap::new()),
            notdef_glyphs: RefCell::new(HashMap::new()),
        })
    }

    /// Creates an `Identity-H` font.
    pub fn identity_h(program: Rc<dyn FontProgram>) -> Result<Self, KernelError> {
        Self::new(program, super::cmap::IDENTITY_H)
    }

    pub fn program(&self) -> &Rc<dyn FontProgram> {
        &self.program
    }

    pub fn cmap(&self) -> &CMapEncoding {
        &self.cmap
    }

    pub fn cid_font_type(&self) -> CidFontType {
        self.cid_font_type
    }

    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    pub fn set_subset(&mut self, subset: bool) {
        self.subset = subset;
    }

    /// The glyph for `unicode`, or a cached `.notdef` standing in for it.
    pub fn glyph(&self, unicode: u32) -> Glyph {
        if let Some(glyph) = self.program.glyph(unicode) {
            return glyph;
        }
        self.notdef_glyphs
            .borrow_mut()
            .entry(unicode)
            .or_insert_with(|| match self.program.glyph_by_code(0) {
                Some(notdef) => Glyph::with_unicode(&notdef, unicode),
                None => Glyph::new(-1, 0, Some(unicode)),
            })
            .clone()
    }

    /// Codes of all glyphs encoded so far.
    pub fn used_codes(&self) -> Vec<u32> {
        self.long_tag.borrow().keys().copied().collect()
    }

    fn record_glyph(&self, glyph: &Glyph, out: &mut Vec<u8>) {
        let code = glyph.code.max(0) as u32;
        let unicode = if glyph.has_valid_unicode() { glyph.unicode.unwrap_or(0) } else { 0 };
        self.long_tag
            .borrow_mut()
            .insert(code, UsedGlyph { code, width: glyph.width, unicode });
        self.cmap.fill_cmap_bytes(code, out);
    }

    /// The `W` array: used glyphs whose width differs from the default, with
    /// runs of consecutive codes grouped as `c [w1 w2 ...]`.
    pub fn glyph_widths(&self) -> Option<Object> {
        let widths: Vec<(i64, i64)> = self
            .long_tag
            .borrow()
            .values()
            .map(|used| {
                let width = self
                    .program
                    .glyph_by_code(used.code)
                    .map(|g| g.width)
                    .unwrap_or(used.width);
                (used.code as i64, width as i64)
            })
            .filter(|(_, width)| *width != DEFAULT_WIDTH as i64)
            .collect();

        let mut result: Vec<Object> = Vec::new();
        let runs = widths.iter().enumerate().chunk_by(|(index, (code, _))| code - *index as i64);
        for (_, run) in &runs {
            let run: Vec<&(i64, i64)> = run.map(|(_, entry)| entry).collect();
            result.push(Object::Integer(run[0].0));
            result.push(Object::Array(run.iter().map(|(_, width)| Object::Integer(*width)).collect()));
        }
        (!result.is_empty()).then_some(Object::Array(result))
    }

    /// Bitset of used CIDs for `/CIDSet`.
    fn cid_set(&self) -> Vec<u8> {
        let tag = self.long_tag.borrow();
        let max = tag.keys().next_back().copied().unwrap_or(0);
        let mut bytes = vec![0u8; max as usize / 8 + 1];
        for code in tag.keys() {
            bytes[*code as usize / 8] |= 0x80 >> (code % 8);
        }
        bytes
    }

    /// Six uppercase letters derived from the used glyph set.
    fn subset_prefix(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.program.names().font_name.hash(&mut hasher);
        for code in self.long_tag.borrow().keys() {
            code.hash(&mut hasher);
        }
        let mut value = hasher.finish();
        (0..6)
            .map(|_| {
                let c = (b'A' + (value % 26) as u8) as char;
                value /= 26;
                c
            })
            .collect()
    }

    fn to_unicode(&self) -> Vec<u8> {
        let entries: Vec<(u32, u32)> = self
            .long_tag
            .borrow()
            .values()
            .filter(|g| g.unicode > 0)
            .map(|g| (g.code, g.unicode))
            .collect();
        to_unicode_cmap(&entries)
    }

    fn font_file(&self, doc: &mut Document) -> Result<(&'static str, ObjectId), KernelError> {
        match self.cid_font_type {
            CidFontType::Type2 => {
                let data = if self.subset {
                    let used: BTreeSet<u16> =
                        self.long_tag.borrow().keys().map(|c| *c as u16).collect();
                    subset_true_type(self.program.font_data(), &used)?
                } else {
                    self.program.font_data().to_vec()
                };
                let length = data.len() as i64;
                let stream = Stream::new(dictionary! { "Length1" => length }, data);
                Ok(("FontFile2", doc.add_object(stream)))
            }
            CidFontType::Type0 => {
                let data = self.program.cff_data().ok_or_else(|| {
                    KernelError::FontProgram("CFF font program without a CFF table".to_string())
                })?;
                let stream = Stream::new(dictionary! { "Subtype" => "CIDFontType0C" }, data);
                Ok(("FontFile3", doc.add_object(stream)))
            }
        }
    }
}

impl PdfFont for Type0Font {
    fn font_name(&self) -> String {
        self.program.names().font_name.clone()
    }

    fn ascent(&self) -> f32 {
        self.program.metrics().ascender as f32
    }

    fn descent(&self) -> f32 {
        self.program.metrics().descender as f32
    }

    fn avg_width(&self) -> i32 {
        self.program.avg_width()
    }

    fn width(&self, unicode: u32) -> i32 {
        self.glyph(unicode).width
    }

    fn convert_to_bytes(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            let glyph = self.glyph(c as u32);
            if glyph.code > 0 {
                self.record_glyph(&glyph, &mut out);
            } else {
                self.cmap.fill_cmap_bytes(0, &mut out);
            }
        }
        out
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let mut text = String::new();
        for code in self.cmap.codes(bytes) {
            match self
                .program
                .glyph_by_code(self.cmap.cid_code(code))
                .and_then(|g| g.chars)
            {
                Some(chars) => text.push_str(&chars),
                None => text.push(char::REPLACEMENT_CHARACTER),
            }
        }
        text
    }

    fn content_width(&self, bytes: &[u8]) -> f32 {
        let mut width = 0.0;
        for code in self.cmap.codes(bytes) {
            match self.program.glyph_by_code(self.cmap.cid_code(code)) {
                Some(glyph) => width += glyph.width as f32,
                None => log::warn!("Could not find glyph with the following code: {}", code),
            }
        }
        width
    }

    fn flush(&self, doc: &mut Document, font_id: ObjectId) -> Result<(), KernelError> {
        if self.vertical {
            return Err(KernelError::UnsupportedOperation(
                "Vertical writing has not implemented yet".to_string(),
            ));
        }

        let names = self.program.names();
        let metrics = self.program.metrics();
        let mut base_font = names.font_name.clone();
        if self.subset && self.cid_font_type == CidFontType::Type2 {
            base_font = format!("{}+{}", self.subset_prefix(), base_font);
        }

        let (file_key, file_id) = self.font_file(doc)?;
        let mut descriptor = dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(base_font.clone().into_bytes()),
            "Flags" => 4,
            "FontBBox" => metrics.bbox.iter().map(|v| Object::Integer(*v as i64)).collect::<Vec<_>>(),
            "ItalicAngle" => metrics.italic_angle,
            "Ascent" => metrics.ascender as i64,
            "Descent" => metrics.descender as i64,
            "CapHeight" => metrics.cap_height as i64,
            "StemV" => metrics.stem_v as i64,
        };
        descriptor.set(file_key, Object::Reference(file_id));
        if self.subset {
            let cid_set = doc.add_object(Stream::new(dictionary! {}, self.cid_set()));
            descriptor.set("CIDSet", Object::Reference(cid_set));
        }
        let descriptor_id = doc.add_object(descriptor);

        let mut cid_font = dictionary! {
            "Type" => "Font",
            "Subtype" => self.cid_font_type.subtype(),
            "BaseFont" => Object::Name(base_font.clone().into_bytes()),
            "FontDescriptor" => descriptor_id,
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::String(b"Adobe".to_vec(), StringFormat::Literal),
                "Ordering" => Object::String(self.cmap.ordering().as_bytes().to_vec(), StringFormat::Literal),
                "Supplement" => 0,
            },
            "DW" => DEFAULT_WIDTH as i64,
        };
        if let Some(widths) = self.glyph_widths() {
            cid_font.set("W", widths);
        }
        if self.cid_font_type == CidFontType::Type2 {
            cid_font.set("CIDToGIDMap", "Identity");
        }
        let cid_font_id = doc.add_object(cid_font);

        let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, self.to_unicode()));

        let type0_base = match self.cid_font_type {
            CidFontType::Type0 => format!("{}-{}", base_font, self.cmap.name()),
            CidFontType::Type2 => base_font,
        };
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => Object::Name(type0_base.into_bytes()),
            "Encoding" => Object::Name(self.cmap.name().as_bytes().to_vec()),
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        };
        doc.objects.insert(font_id, Object::Dictionary(font));
        log::debug!(
            "Flushed Type0 font '{}' with {} used glyphs",
            names.font_name,
            self.long_tag.borrow().len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::TrueTypeProgram;
    use crate::test_utils::{build_test_font, TestFontOptions};

    fn test_font(glyphs: &[(char, u16)]) -> Type0Font {
        let data = build_test_font(glyphs, TestFontOptions::default());
        let program = TrueTypeProgram::from_bytes(data).unwrap();
        Type0Font::identity_h(Rc::new(program)).unwrap()
    }

    #[test]
    fn encode_then_decode_recovers_text() {
        let font = test_font(&[('H', 700), ('i', 300), ('!', 1000)]);
        assert_eq!(font.cid_font_type(), CidFontType::Type2);

        let bytes = font.convert_to_bytes("Hi!");
        assert_eq!(bytes, vec![0, 1, 0, 2, 0, 3]);
        assert_eq!(font.decode(&bytes), "Hi!");
        assert_eq!(font.content_width(&bytes), 2000.0);
        assert_eq!(font.used_codes(), vec![1, 2, 3]);
    }

    #[test]
    fn missing_characters_become_notdef() {
        let font = test_font(&[('a', 500)]);
        let glyph = font.glyph('z' as u32);
        assert_eq!(glyph.code, 0);
        assert_eq!(glyph.width, 500);
        assert_eq!(glyph.unicode, Some('z' as u32));

        let bytes = font.convert_to_bytes("az");
        assert_eq!(bytes, vec![0, 1, 0, 0]);
        assert_eq!(font.used_codes(), vec![1]);
        // Astral characters are single scalar values, not surrogate halves.
        assert_eq!(font.convert_to_bytes("\u{1F600}").len(), 2);
    }

    #[test]
    fn decode_ignores_half_codes_and_marks_unknown_glyphs() {
        let font = test_font(&[('a', 500)]);
        assert_eq!(font.decode(&[0]), "");
        assert_eq!(font.decode(&[0, 9]), "\u{FFFD}");
    }

    #[test]
    fn widths_are_grouped_by_consecutive_codes() {
        let font = test_font(&[('a', 500), ('b', 600), ('c', 1000), ('d', 400)]);
        font.convert_to_bytes("abcd");
        let widths = font.glyph_widths().unwrap();
        assert_eq!(
            widths,
            Object::Array(vec![
                Object::Integer(1),
                Object::Array(vec![Object::Integer(500), Object::Integer(600)]),
                Object::Integer(4),
                Object::Array(vec![Object::Integer(400)]),
            ])
        );
    }

    #[test]
    fn cid_set_marks_used_codes() {
        let font = test_font(&[('a', 500), ('b', 600)]);
        font.convert_to_bytes("b");
        assert_eq!(font.cid_set(), vec![0b0010_0000]);
    }

    #[test]
    fn restricted_font_cannot_be_embedded() {
        let options = TestFontOptions { fs_type: 0x0002, ..TestFontOptions::default() };
        let program = TrueTypeProgram::from_bytes(build_test_font(&[('a', 500)], options)).unwrap();
        assert!(matches!(
            Type0Font::identity_h(Rc::new(program)),
            Err(KernelError::EmbeddingNotAllowed(_))
        ));
    }

    #[test]
    fn only_identity_cmaps_are_accepted_and_vertical_cannot_flush() {
        let data = build_test_font(&[('a', 500)], TestFontOptions::default());
        let program: Rc<dyn FontProgram> = Rc::new(TrueTypeProgram::from_bytes(data).unwrap());
        assert!(matches!(
            Type0Font::new(program.clone(), "UniJIS-UTF16-H"),
            Err(KernelError::UnsupportedOperation(_))
        ));

        let vertical = Type0Font::new(program, "Identity-V").unwrap();
        assert!(vertical.is_vertical());
        let mut doc = Document::with_version("1.7");
        let id = doc.new_object_id();
        assert!(matches!(
            vertical.flush(&mut doc, id),
            Err(KernelError::UnsupportedOperation(msg)) if msg.contains("Vertical")
        ));
    }

    #[test]
    fn flush_writes_descendant_font_and_subset_file() {
        let font = test_font(&[('a', 500), ('b', 600)]);
        font.convert_to_bytes("a");
        let mut doc = Document::with_version("1.7");
        let id = doc.new_object_id();
        font.flush(&mut doc, id).unwrap();

        let dict = doc.get_dictionary(id).unwrap();
        assert_eq!(dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Type0");
        assert_eq!(dict.get(b"Encoding").unwrap().as_name().unwrap(), b"Identity-H");
        let base = dict.get(b"BaseFont").unwrap().as_name().unwrap();
        assert!(String::from_utf8_lossy(base).ends_with("+VellumTest-Regular"));

        let descendants = dict.get(b"DescendantFonts").unwrap().as_array().unwrap();
        let cid_font = doc.get_dictionary(descendants[0].as_reference().unwrap()).unwrap();
        assert_eq!(cid_font.get(b"Subtype").unwrap().as_name().unwrap(), b"CIDFontType2");
        assert_eq!(cid_font.get(b"CIDToGIDMap").unwrap().as_name().unwrap(), b"Identity");
        assert_eq!(cid_font.get(b"DW").unwrap().as_i64().unwrap(), 1000);

        let descriptor =
            doc.get_dictionary(cid_font.get(b"FontDescriptor").unwrap().as_reference().unwrap()).unwrap();
        assert!(descriptor.has(b"FontFile2"));
        assert!(descriptor.has(b"CIDSet"));

        let to_unicode = doc.get_object(dict.get(b"ToUnicode").unwrap().as_reference().unwrap()).unwrap();
        let content = String::from_utf8_lossy(&to_unicode.as_stream().unwrap().content).to_string();
        assert!(content.contains("<0001><0001><0061>"));
    }
}
