use super::Glyph;
use crate::KernelError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use ttf_parser::{name_id, GlyphId, Tag};

/// Metrics of a font program, scaled to 1000 units per em.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascender: i32,
    pub descender: i32,
    pub line_gap: i32,
    pub cap_height: i32,
    pub bbox: [i32; 4],
    pub italic_angle: f32,
    pub is_fixed_pitch: bool,
    pub stem_v: i32,
    pub avg_width: i32,
}

/// Naming information of a font program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontNames {
    /// PostScript name, used for `/BaseFont`.
    pub font_name: String,
    pub family_name: String,
    pub full_name: String,
    /// CSS-like weight class, 100 to 900.
    pub weight: u16,
    pub italic: bool,
}

impl FontNames {
    /// Weight class from a style name such as "Bold" or "ExtraLight".
    /// Unknown names map to regular (400).
    pub fn weight_from_name(name: &str) -> u16 {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "thin" | "hairline" => 100,
            "extralight" | "ultralight" => 200,
            "light" => 300,
            "regular" | "normal" | "book" | "roman" => 400,
            "medium" => 500,
            "semibold" | "demibold" => 600,
            "bold" => 700,
            "extrabold" | "ultrabold" => 800,
            "black" | "heavy" => 900,
            other => other.parse::<u16>().ok().filter(|w| (100..=900).contains(w)).unwrap_or(400),
        }
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= 700
    }
}

/// A parsed font file.
pub trait FontProgram: fmt::Debug {
    fn names(&self) -> &FontNames;

    fn metrics(&self) -> &FontMetrics;

    /// The glyph mapped to a Unicode scalar value by the active cmap.
    fn glyph(&self, unicode: u32) -> Option<Glyph>;

    /// The glyph with the given glyph index or CID.
    fn glyph_by_code(&self, code: u32) -> Option<Glyph>;

    fn glyph_count(&self) -> u16;

    /// True if the font only has a symbol cmap.
    fn is_font_specific(&self) -> bool;

    /// True if text can be mapped to glyphs through a Unicode cmap.
    fn has_unicode_cmap(&self) -> bool;

    /// True for OpenType fonts with CFF outlines.
    fn is_cff(&self) -> bool;

    fn is_embedding_allowed(&self) -> bool;

    fn is_subsetting_allowed(&self) -> bool;

    /// The raw font file.
    fn font_data(&self) -> &[u8];

    /// The bare `CFF ` table for CFF-flavoured programs.
    fn cff_data(&self) -> Option<Vec<u8>>;

    fn avg_width(&self) -> i32 {
        self.metrics().avg_width
    }
}

/// A TrueType or OpenType program read with `ttf-parser`.
///
/// Everything needed at encoding time is extracted on construction, so the
/// program does not keep a borrowed `Face` around.
pub struct TrueTypeProgram {
    data: Arc<Vec<u8>>,
    names: FontNames,
    metrics: FontMetrics,
    by_unicode: HashMap<u32, Glyph>,
    by_code: HashMap<u32, Glyph>,
    glyph_count: u16,
    font_specific: bool,
    cff: bool,
    embedding_allowed: bool,
    subsetting_allowed: bool,
}

impl fmt::Debug for TrueTypeProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueTypeProgram")
            .field("font_name", &self.names.font_name)
            .field("glyphs", &self.glyph_count)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl TrueTypeProgram {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, KernelError> {
        Self::from_shared(Arc::new(data))
    }

    pub fn from_shared(data: Arc<Vec<u8>>) -> Result<Self, KernelError> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| KernelError::FontProgram(format!("Failed to parse font: {}", e)))?;

        let units_per_em = face.units_per_em();
        let scale = |v: f32| (v * 1000.0 / units_per_em as f32).round() as i32;

        let glyph_count = face.number_of_glyphs();
        let mut widths = Vec::with_capacity(glyph_count as usize);
        for gid in 0..glyph_count {
            let advance = face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0);
            widths.push(scale(advance as f32));
        }

        let mut by_unicode = HashMap::new();
        let mut by_code: HashMap<u32, Glyph> = HashMap::new();
        let mut font_specific = false;
        if let Some(cmap) = face.tables().cmap {
            let mut has_unicode = false;
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    if subtable.platform_id == ttf_parser::PlatformId::Windows
                        && subtable.encoding_id == 0
                    {
                        font_specific = true;
                    }
                    continue;
                }
                has_unicode = true;
                subtable.codepoints(|cp| {
                    if by_unicode.contains_key(&cp) {
                        return;
                    }
                    if let Some(gid) = subtable.glyph_index(cp) {
                        let width = widths.get(gid.0 as usize).copied().unwrap_or(0);
                        let glyph = Glyph::new(gid.0 as i32, width, Some(cp));
                        by_code.entry(gid.0 as u32).or_insert_with(|| glyph.clone());
                        by_unicode.insert(cp, glyph);
                    }
                });
            }
            if has_unicode {
                font_specific = false;
            }
        }
        for (gid, width) in widths.iter().enumerate() {
            by_code
                .entry(gid as u32)
                .or_insert_with(|| Glyph::new(gid as i32, *width, None));
        }

        let mapped: Vec<i32> = by_unicode.values().map(|g| g.width).filter(|w| *w > 0).collect();
        let avg_width = if mapped.is_empty() {
            0
        } else {
            mapped.iter().sum::<i32>() / mapped.len() as i32
        };

        let bbox = face.global_bounding_box();
        let ascender = face.typographic_ascender().unwrap_or(face.ascender());
        let descender = face.typographic_descender().unwrap_or(face.descender());
        let weight = face.weight().to_number();
        let metrics = FontMetrics {
            units_per_em,
            ascender: scale(ascender as f32),
            descender: scale(descender as f32),
            line_gap: scale(face.line_gap() as f32),
            cap_height: scale(face.capital_height().unwrap_or(ascender) as f32),
            bbox: [
                scale(bbox.x_min as f32),
                scale(bbox.y_min as f32),
                scale(bbox.x_max as f32),
                scale(bbox.y_max as f32),
            ],
            italic_angle: face.italic_angle(),
            is_fixed_pitch: face.is_monospaced(),
            stem_v: if weight >= 700 { 120 } else { 80 },
            avg_width,
        };

        let name = |id: u16| {
            face.names()
                .into_iter()
                .filter(|n| n.name_id == id)
                .find_map(|n| n.to_string())
        };
        let family_name = name(name_id::FAMILY).unwrap_or_default();
        let full_name = name(name_id::FULL_NAME).unwrap_or_else(|| family_name.clone());
        let font_name = name(name_id::POST_SCRIPT_NAME)
            .unwrap_or_else(|| full_name.replace(' ', ""));
        let names = FontNames {
            font_name,
            family_name,
            full_name,
            weight,
            italic: face.is_italic(),
        };

        let embedding_allowed =
            !matches!(face.permissions(), Some(ttf_parser::Permissions::Restricted));
        let subsetting_allowed = face.is_subsetting_allowed();
        let cff = face.raw_face().table(Tag::from_bytes(b"CFF ")).is_some();

        log::debug!(
            "Parsed font program '{}' ({} glyphs, {} mapped)",
            names.font_name,
            glyph_count,
            by_unicode.len()
        );

        Ok(Self {
            data,
            names,
            metrics,
            by_unicode,
            by_code,
            glyph_count,
            font_specific,
            cff,
            embedding_allowed,
            subsetting_allowed,
        })
    }
}

impl FontProgram for TrueTypeProgram {
    fn names(&self) -> &FontNames {
        &self.names
    }

    fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    fn glyph(&self, unicode: u32) -> Option<Glyph> {
        self.by_unicode.get(&unicode).cloned()
    }

    fn glyph_by_code(&self, code: u32) -> Option<Glyph> {
        self.by_code.get(&code).cloned()
    }

    fn glyph_count(&self) -> u16 {
        self.glyph_count
    }

    fn is_font_specific(&self) -> bool {
        self.font_specific
    }

    fn has_unicode_cmap(&self) -> bool {
        !self.by_unicode.is_empty()
    }

    fn is_cff(&self) -> bool {
        self.cff
    }

    fn is_embedding_allowed(&self) -> bool {
        self.embedding_allowed
    }

    fn is_subsetting_allowed(&self) -> bool {
        self.subsetting_allowed
    }

    fn font_data(&self) -> &[u8] {
        &self.data
    }

    fn cff_data(&self) -> Option<Vec<u8>> {
        let face = ttf_parser::Face::parse(&self.data, 0).ok()?;
        face.raw_face().table(Tag::from_bytes(b"CFF ")).map(|t| t.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{build_test_font, TestFontOptions};

    #[test]
    fn weight_names_map_to_classes() {
        assert_eq!(FontNames::weight_from_name("Bold"), 700);
        assert_eq!(FontNames::weight_from_name("Extra-Light"), 200);
        assert_eq!(FontNames::weight_from_name("semi bold"), 600);
        assert_eq!(FontNames::weight_from_name("650"), 650);
        assert_eq!(FontNames::weight_from_name("wobbly"), 400);
    }

    #[test]
    fn reads_names_metrics_and_glyphs() {
        let data = build_test_font(&[('A', 500), ('B', 600)], TestFontOptions::default());
        let program = TrueTypeProgram::from_bytes(data).unwrap();

        assert_eq!(program.names().font_name, "VellumTest-Regular");
        assert_eq!(program.names().family_name, "VellumTest");
        assert_eq!(program.metrics().ascender, 800);
        assert_eq!(program.metrics().descender, -200);
        assert_eq!(program.glyph_count(), 3);

        let a = program.glyph('A' as u32).unwrap();
        assert_eq!(a.code, 1);
        assert_eq!(a.width, 500);
        assert_eq!(a.chars.as_deref(), Some("A"));
        assert_eq!(program.glyph_by_code(2).unwrap().unicode, Some('B' as u32));
        assert!(program.glyph('Z' as u32).is_none());
        assert_eq!(program.avg_width(), 550);
        assert!(program.is_embedding_allowed());
        assert!(!program.is_cff());
    }

    #[test]
    fn restricted_fonts_forbid_embedding() {
        let options = TestFontOptions { fs_type: 0x0002, ..TestFontOptions::default() };
        let data = build_test_font(&[('A', 500)], options);
        let program = TrueTypeProgram::from_bytes(data).unwrap();
        assert!(!program.is_embedding_allowed());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            TrueTypeProgram::from_bytes(vec![0, 1, 2]),
            Err(KernelError::FontProgram(_))
        ));
    }
}
