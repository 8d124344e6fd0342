//! CMap encodings for CID-keyed fonts and `/ToUnicode` generation.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::Write as _;

pub const IDENTITY_H: &str = "Identity-H";
pub const IDENTITY_V: &str = "Identity-V";

/// The Unicode CMap used for each CJK character collection.
static UNI_MAP_BY_ORDERING: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("CNS1", "UniCNS-UTF16-H"),
        ("Japan1", "UniJIS-UTF16-H"),
        ("Korea1", "UniKS-UTF16-H"),
        ("GB1", "UniGB-UTF16-H"),
        ("Identity", IDENTITY_H),
    ])
});

pub fn uni_map_for_ordering(ordering: &str) -> Option<&'static str> {
    UNI_MAP_BY_ORDERING.get(ordering).copied()
}

/// Maps CIDs to the byte codes written into content streams.
///
/// Only the identity CMaps are produced by this crate: each CID is written
/// as a two-byte big-endian code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CMapEncoding {
    name: String,
    ordering: String,
}

impl CMapEncoding {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), ordering: "Identity".to_string() }
    }

    pub fn identity_h() -> Self {
        Self::new(IDENTITY_H)
    }

    pub fn identity_v() -> Self {
        Self::new(IDENTITY_V)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ordering(&self) -> &str {
        &self.ordering
    }

    pub fn is_direct(&self) -> bool {
        self.name == IDENTITY_H || self.name == IDENTITY_V
    }

    pub fn is_vertical(&self) -> bool {
        self.name.ends_with('V')
    }

    pub fn fill_cmap_bytes(&self, cid: u32, out: &mut Vec<u8>) {
        out.extend_from_slice(&(cid as u16).to_be_bytes());
    }

    pub fn cmap_bytes(&self, cid: u32) -> Vec<u8> {
        let mut out = Vec::with_capacity(2);
        self.fill_cmap_bytes(cid, &mut out);
        out
    }

    /// Splits content-stream bytes into codes. A trailing odd byte is not a
    /// complete code and is dropped.
    pub fn codes<'a>(&self, bytes: &'a [u8]) -> impl Iterator<Item = u32> + 'a {
        bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]) as u32)
    }

    pub fn cid_code(&self, code: u32) -> u32 {
        code
    }
}

/// Builds a `/ToUnicode` CMap for two-byte codes. Entries are written in
/// `bfrange` blocks of at most 100 lines.
pub fn to_unicode_cmap(entries: &[(u32, u32)]) -> Vec<u8> {
    let mut buf = String::new();
    buf.push_str("/CIDInit /ProcSet findresource begin\n");
    buf.push_str("12 dict begin\n");
    buf.push_str("begincmap\n");
    buf.push_str("/CIDSystemInfo\n<< /Registry (Adobe)\n/Ordering (UCS)\n/Supplement 0\n>> def\n");
    buf.push_str("/CMapName /Adobe-Identity-UCS def\n");
    buf.push_str("/CMapType 2 def\n");
    buf.push_str("1 begincodespacerange\n<0000><FFFF>\nendcodespacerange\n");

    for block in entries.chunks(100) {
        let _ = writeln!(buf, "{} beginbfrange", block.len());
        for (code, unicode) in block {
            let _ = writeln!(buf, "<{:04X}><{:04X}><{}>", code, code, utf16_hex(*unicode));
        }
        buf.push_str("endbfrange\n");
    }

    buf.push_str("endcmap\n");
    buf.push_str("CMapName currentdict /CMap defineresource pop\n");
    buf.push_str("end end\n");
    buf.into_bytes()
}

fn utf16_hex(unicode: u32) -> String {
    let Some(c) = char::from_u32(unicode) else {
        return "FFFD".to_string();
    };
    let mut units = [0u16; 2];
    c.encode_utf16(&mut units)
        .iter()
        .map(|u| format!("{:04X}", u))
        .collect()
}
