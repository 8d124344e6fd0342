//! Fixtures shared by the kernel unit tests: a tiny synthetic TrueType font
//! and small lopdf documents.

use crate::font::sfnt::write_font;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

#[derive(Debug, Clone, Copy)]
pub struct TestFontOptions {
    /// OS/2 `fsType` embedding bits.
    pub fs_type: u16,
}

impl Default for TestFontOptions {
    fn default() -> Self {
        Self { fs_type: 0 }
    }
}

fn be16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn be32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

/// A triangle outline; the exact shape is irrelevant, only its presence.
fn triangle_glyph() -> Vec<u8> {
    let mut g = Vec::new();
    be16(&mut g, 1); // numberOfContours
    for v in [0i16, 0, 500, 700] {
        g.extend_from_slice(&v.to_be_bytes());
    }
    be16(&mut g, 2); // endPtsOfContours
    be16(&mut g, 0); // instructionLength
    g.extend_from_slice(&[0x01, 0x01, 0x01]);
    for dx in [0i16, 250, 250] {
        g.extend_from_slice(&dx.to_be_bytes());
    }
    for dy in [0i16, 700, -700] {
        g.extend_from_slice(&dy.to_be_bytes());
    }
    g.resize(g.len().next_multiple_of(4), 0);
    g
}

fn cmap_format4(mapping: &[(u16, u16)]) -> Vec<u8> {
    let mut segments: Vec<(u16, u16, i16)> = mapping
        .iter()
        .map(|(c, g)| (*c, *c, (*g as i32 - *c as i32) as i16))
        .collect();
    segments.push((0xFFFF, 0xFFFF, 1));
    let seg_count = segments.len() as u16;
    let mut sub = Vec::new();
    be16(&mut sub, 4);
    be16(&mut sub, 16 + seg_count * 8);
    be16(&mut sub, 0);
    be16(&mut sub, seg_count * 2);
    let entry_selector = 15 - seg_count.leading_zeros() as u16;
    let search_range = 2 * (1u16 << entry_selector);
    be16(&mut sub, search_range);
    be16(&mut sub, entry_selector);
    be16(&mut sub, seg_count * 2 - search_range);
    for (_, end, _) in &segments {
        be16(&mut sub, *end);
    }
    be16(&mut sub, 0);
    for (start, _, _) in &segments {
        be16(&mut sub, *start);
    }
    for (_, _, delta) in &segments {
        sub.extend_from_slice(&delta.to_be_bytes());
    }
    for _ in &segments {
        be16(&mut sub, 0);
    }

    let mut cmap = Vec::new();
    be16(&mut cmap, 0);
    be16(&mut cmap, 1);
    be16(&mut cmap, 3);
    be16(&mut cmap, 1);
    be32(&mut cmap, 12);
    cmap.extend_from_slice(&sub);
    cmap
}

fn name_table(records: &[(u16, &str)]) -> Vec<u8> {
    let mut strings = Vec::new();
    let mut out = Vec::new();
    be16(&mut out, 0);
    be16(&mut out, records.len() as u16);
    be16(&mut out, 6 + 12 * records.len() as u16);
    for (id, value) in records {
        let encoded: Vec<u8> = value.encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
        be16(&mut out, 3);
        be16(&mut out, 1);
        be16(&mut out, 0x0409);
        be16(&mut out, *id);
        be16(&mut out, encoded.len() as u16);
        be16(&mut out, strings.len() as u16);
        strings.extend_from_slice(&encoded);
    }
    out.extend_from_slice(&strings);
    out
}

/// Builds a 1000 units-per-em TrueType font. Glyph 0 is `.notdef` (advance
/// 500); the given characters get glyph ids 1, 2, ... in order.
pub fn build_test_font(glyphs: &[(char, u16)], options: TestFontOptions) -> Vec<u8> {
    let num_glyphs = glyphs.len() as u16 + 1;

    let mut head = vec![0u8; 54];
    head[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    head[12..16].copy_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
    head[18..20].copy_from_slice(&1000u16.to_be_bytes());
    head[36..38].copy_from_slice(&0i16.to_be_bytes());
    head[38..40].copy_from_slice(&(-200i16).to_be_bytes());
    head[40..42].copy_from_slice(&1000i16.to_be_bytes());
    head[42..44].copy_from_slice(&800i16.to_be_bytes());
    head[50..52].copy_from_slice(&1i16.to_be_bytes());

    let mut hhea = vec![0u8; 36];
    hhea[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    hhea[4..6].copy_from_slice(&800i16.to_be_bytes());
    hhea[6..8].copy_from_slice(&(-200i16).to_be_bytes());
    hhea[10..12].copy_from_slice(&1000u16.to_be_bytes());
    hhea[34..36].copy_from_slice(&num_glyphs.to_be_bytes());

    let mut maxp = vec![0u8; 32];
    maxp[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    maxp[4..6].copy_from_slice(&num_glyphs.to_be_bytes());

    let mut hmtx = Vec::new();
    be16(&mut hmtx, 500);
    be16(&mut hmtx, 0);
    for (_, advance) in glyphs {
        be16(&mut hmtx, *advance);
        be16(&mut hmtx, 0);
    }

    let outline = triangle_glyph();
    let mut glyf = Vec::new();
    let mut loca = Vec::new();
    for _ in 0..num_glyphs {
        be32(&mut loca, glyf.len() as u32);
        glyf.extend_from_slice(&outline);
    }
    be32(&mut loca, glyf.len() as u32);

    let mut mapping: Vec<(u16, u16)> = glyphs
        .iter()
        .enumerate()
        .map(|(i, (c, _))| (*c as u16, i as u16 + 1))
        .collect();
    // Format 4 segments must be sorted by code.
    mapping.sort_by_key(|(c, _)| *c);

    let mut os2 = vec![0u8; 78];
    os2[2..4].copy_from_slice(&500i16.to_be_bytes());
    os2[4..6].copy_from_slice(&400u16.to_be_bytes());
    os2[6..8].copy_from_slice(&5u16.to_be_bytes());
    os2[8..10].copy_from_slice(&options.fs_type.to_be_bytes());
    os2[62..64].copy_from_slice(&0x0040u16.to_be_bytes());
    os2[68..70].copy_from_slice(&800i16.to_be_bytes());
    os2[70..72].copy_from_slice(&(-200i16).to_be_bytes());
    os2[74..76].copy_from_slice(&800u16.to_be_bytes());
    os2[76..78].copy_from_slice(&200u16.to_be_bytes());

    let mut post = vec![0u8; 32];
    post[0..4].copy_from_slice(&0x0003_0000u32.to_be_bytes());

    let name = name_table(&[
        (1, "VellumTest"),
        (2, "Regular"),
        (4, "VellumTest Regular"),
        (6, "VellumTest-Regular"),
    ]);

    write_font(vec![
        (*b"head", head),
        (*b"hhea", hhea),
        (*b"maxp", maxp),
        (*b"hmtx", hmtx),
        (*b"glyf", glyf),
        (*b"loca", loca),
        (*b"cmap", cmap_format4(&mapping)),
        (*b"OS/2", os2),
        (*b"post", post),
        (*b"name", name),
    ])
}

/// Creates a simple document with `num_pages` pages, each showing
/// "`text_prefix` N" in Helvetica.
pub fn create_dummy_pdf(num_pages: u32, text_prefix: &str) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids: Vec<Object> = vec![];
    for i in 1..=num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("{} {}", text_prefix, i).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        page_ids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids,
        "Count" => num_pages as i64,
    };
    doc.objects.insert(pages_id, pages_dict.into());

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}
