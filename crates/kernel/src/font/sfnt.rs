//! Reading and writing the sfnt table directory shared by TrueType and
//! OpenType files.

pub(crate) fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

pub(crate) fn read_i16(data: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([data[offset], data[offset + 1]])
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

pub(crate) fn write_u16(data: &mut [u8], offset: usize, val: u16) {
    data[offset..offset + 2].copy_from_slice(&val.to_be_bytes());
}

pub(crate) fn write_u32(data: &mut [u8], offset: usize, val: u32) {
    data[offset..offset + 4].copy_from_slice(&val.to_be_bytes());
}

/// One entry of the table directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: [u8; 4],
    pub offset: usize,
    pub length: usize,
}

/// Lists the table records of a font file. Records pointing outside the
/// file are dropped.
pub fn table_records(data: &[u8]) -> Vec<TableRecord> {
    if data.len() < 12 {
        return Vec::new();
    }
    let num_tables = read_u16(data, 4) as usize;
    let mut records = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let entry = 12 + i * 16;
        if entry + 16 > data.len() {
            break;
        }
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&data[entry..entry + 4]);
        let offset = read_u32(data, entry + 8) as usize;
        let length = read_u32(data, entry + 12) as usize;
        if offset + length <= data.len() {
            records.push(TableRecord { tag, offset, length });
        }
    }
    records
}

pub fn find_table<'a>(data: &'a [u8], tag: &[u8; 4]) -> Option<&'a [u8]> {
    table_records(data)
        .into_iter()
        .find(|r| &r.tag == tag)
        .map(|r| &data[r.offset..r.offset + r.length])
}

pub(crate) fn checksum(data: &[u8]) -> u32 {
    let mut sum: u32 = 0;
    for chunk in data.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum = sum.wrapping_add(u32::from_be_bytes(word));
    }
    sum
}

/// Assembles a TrueType file from `(tag, data)` pairs. Tables are sorted by
/// tag, padded to four bytes, and `head.checkSumAdjustment` is recomputed.
pub fn write_font(mut tables: Vec<([u8; 4], Vec<u8>)>) -> Vec<u8> {
    tables.sort_by_key(|(tag, _)| *tag);

    let num_tables = tables.len() as u16;
    let entry_selector = if num_tables > 0 { 15 - num_tables.leading_zeros() as u16 } else { 0 };
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = (num_tables * 16).saturating_sub(search_range);

    let mut output = Vec::new();
    output.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    output.extend_from_slice(&num_tables.to_be_bytes());
    output.extend_from_slice(&search_range.to_be_bytes());
    output.extend_from_slice(&entry_selector.to_be_bytes());
    output.extend_from_slice(&range_shift.to_be_bytes());

    let mut offset = 12 + tables.len() * 16;
    let mut head_offset = None;
    for (tag, data) in tables.iter_mut() {
        if tag == b"head" && data.len() >= 12 {
            write_u32(data, 8, 0);
            head_offset = Some(offset);
        }
        output.extend_from_slice(tag);
        output.extend_from_slice(&checksum(data).to_be_bytes());
        output.extend_from_slice(&(offset as u32).to_be_bytes());
        output.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += data.len().next_multiple_of(4);
    }

    for (_, data) in &tables {
        output.extend_from_slice(data);
        output.resize(output.len().next_multiple_of(4), 0);
    }

    if let Some(head_offset) = head_offset {
        let adjustment = 0xB1B0_AFBAu32.wrapping_sub(checksum(&output));
        write_u32(&mut output, head_offset + 8, adjustment);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_tables_can_be_found_again() {
        let font = write_font(vec![
            (*b"maxp", vec![0, 1, 0, 0, 0, 3]),
            (*b"cmap", vec![1, 2, 3]),
        ]);
        let records = table_records(&font);
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0].tag, b"cmap");
        assert_eq!(find_table(&font, b"cmap"), Some(&[1u8, 2, 3][..]));
        assert_eq!(find_table(&font, b"maxp").map(|t| read_u16(t, 4)), Some(3));
        assert!(find_table(&font, b"glyf").is_none());
    }

    #[test]
    fn checksum_pads_trailing_bytes() {
        assert_eq!(checksum(&[0, 0, 0, 1, 0x80]), 1 + 0x8000_0000);
    }
}
