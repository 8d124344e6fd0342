//! GID-preserving TrueType subsetting.
//!
//! Glyph ids are kept as they are so that `CIDToGIDMap /Identity` and the
//! codes already written into content streams stay valid. Outlines of
//! glyphs that are not used are emptied; everything else is copied.

use super::sfnt::{self, find_table, read_i16, read_u16, read_u32, table_records, write_u16};
use crate::KernelError;
use std::collections::BTreeSet;

/// Tables carried over into the subset. Anything else (DSIG, GSUB, kern, ...)
/// is dropped.
const KEPT_TABLES: [&[u8; 4]; 10] = [
    b"cmap", b"cvt ", b"fpgm", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post",
];

/// Subsets `data` to `used` glyph ids (plus `.notdef` and composite
/// components). The result always uses the long `loca` format.
pub fn subset_true_type(data: &[u8], used: &BTreeSet<u16>) -> Result<Vec<u8>, KernelError> {
    let glyf = find_table(data, b"glyf")
        .ok_or_else(|| KernelError::FontProgram("Missing glyf table".to_string()))?;
    let loca = find_table(data, b"loca")
        .ok_or_else(|| KernelError::FontProgram("Missing loca table".to_string()))?;
    let head = find_table(data, b"head")
        .ok_or_else(|| KernelError::FontProgram("Missing head table".to_string()))?;
    let maxp = find_table(data, b"maxp")
        .ok_or_else(|| KernelError::FontProgram("Missing maxp table".to_string()))?;
    if head.len() < 54 || maxp.len() < 6 {
        return Err(KernelError::FontProgram("Truncated head or maxp table".to_string()));
    }

    let num_glyphs = read_u16(maxp, 4);
    let offsets = parse_loca(loca, read_i16(head, 50), num_glyphs);

    let mut needed: BTreeSet<u16> = BTreeSet::new();
    needed.insert(0);
    needed.extend(used.iter().copied().filter(|gid| *gid < num_glyphs));
    let initial: Vec<u16> = needed.iter().copied().collect();
    for gid in initial {
        collect_composite_deps(glyf, &offsets, gid, &mut needed);
    }

    let mut new_glyf = Vec::new();
    let mut new_loca = Vec::with_capacity((num_glyphs as usize + 1) * 4);
    for gid in 0..num_glyphs {
        new_loca.extend_from_slice(&(new_glyf.len() as u32).to_be_bytes());
        if !needed.contains(&gid) {
            continue;
        }
        let (start, end) = (offsets[gid as usize] as usize, offsets[gid as usize + 1] as usize);
        if start < end && end <= glyf.len() {
            new_glyf.extend_from_slice(&glyf[start..end]);
            new_glyf.resize(new_glyf.len().next_multiple_of(4), 0);
        }
    }
    new_loca.extend_from_slice(&(new_glyf.len() as u32).to_be_bytes());

    let mut tables: Vec<([u8; 4], Vec<u8>)> = vec![(*b"glyf", new_glyf), (*b"loca", new_loca)];
    for record in table_records(data) {
        if !KEPT_TABLES.contains(&&record.tag) {
            continue;
        }
        let mut table = data[record.offset..record.offset + record.length].to_vec();
        if &record.tag == b"head" {
            write_u16(&mut table, 50, 1);
        }
        tables.push((record.tag, table));
    }

    log::debug!(
        "Subset TrueType font: kept {} of {} glyph outlines",
        needed.len(),
        num_glyphs
    );
    Ok(sfnt::write_font(tables))
}

fn parse_loca(loca: &[u8], format: i16, num_glyphs: u16) -> Vec<u32> {
    let count = num_glyphs as usize + 1;
    let mut offsets = Vec::with_capacity(count);
    for i in 0..count {
        let offset = if format == 0 {
            let pos = i * 2;
            (pos + 2 <= loca.len()).then(|| read_u16(loca, pos) as u32 * 2)
        } else {
            let pos = i * 4;
            (pos + 4 <= loca.len()).then(|| read_u32(loca, pos))
        };
        let fallback = offsets.last().copied().unwrap_or(0);
        offsets.push(offset.unwrap_or(fallback));
    }
    offsets
}

/// Adds the components of composite glyph `gid` (recursively) to `needed`.
fn collect_composite_deps(glyf: &[u8], offsets: &[u32], gid: u16, needed: &mut BTreeSet<u16>) {
    let idx = gid as usize;
    if idx + 1 >= offsets.len() {
        return;
    }
    let (start, end) = (offsets[idx] as usize, offsets[idx + 1] as usize);
    if start >= end || start + 10 > glyf.len() || read_i16(glyf, start) >= 0 {
        return;
    }

    let mut pos = start + 10;
    loop {
        if pos + 4 > glyf.len() {
            break;
        }
        let flags = read_u16(glyf, pos);
        let component = read_u16(glyf, pos + 2);
        pos += 4;
        if needed.insert(component) {
            collect_composite_deps(glyf, offsets, component, needed);
        }
        // ARG_1_AND_2_ARE_WORDS
        pos += if flags & 0x0001 != 0 { 4 } else { 2 };
        if flags & 0x0008 != 0 {
            pos += 2;
        } else if flags & 0x0040 != 0 {
            pos += 4;
        } else if flags & 0x0080 != 0 {
            pos += 8;
        }
        // MORE_COMPONENTS
        if flags & 0x0020 == 0 {
            break;
        }
    }
}
