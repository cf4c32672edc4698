use byteorder::ByteOrder;

use crate::IndexedBitmap;

const FILE_MAGIC: u16 = 0x4D42;
const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: usize = 40;

/// Read an uncompressed 8-bit indexed BMP, keeping the palette order
/// intact. The masked transparency convention reserves source palette
/// slot 0, so re-indexing through an RGBA round trip would lose it.
///
/// Returns `None` for anything that is not such a BMP; the caller falls
/// back to full RGBA decoding.
pub(crate) fn read_indexed(bytes: &[u8]) -> Option<IndexedBitmap> {
    if bytes.len() < FILE_HEADER_SIZE + INFO_HEADER_SIZE {
        return None;
    }
    if byteorder::LittleEndian::read_u16(&bytes[0..2]) != FILE_MAGIC {
        return None;
    }

    let data_offset = usize::try_from(byteorder::LittleEndian::read_u32(&bytes[10..14])).ok()?;
    let info_size = usize::try_from(byteorder::LittleEndian::read_u32(&bytes[14..18])).ok()?;
    if info_size < INFO_HEADER_SIZE {
        return None;
    }

    let width_raw = byteorder::LittleEndian::read_i32(&bytes[18..22]);
    let height_raw = byteorder::LittleEndian::read_i32(&bytes[22..26]);
    let bit_count = byteorder::LittleEndian::read_u16(&bytes[28..30]);
    let compression = byteorder::LittleEndian::read_u32(&bytes[30..34]);
    if bit_count != 8 || compression != 0 {
        return None;
    }

    let colors_used = byteorder::LittleEndian::read_u32(&bytes[46..50]);
    let palette_len = if colors_used == 0 {
        256
    } else {
        usize::try_from(colors_used).ok()?
    };
    if palette_len > 256 {
        return None;
    }

    let width = u32::try_from(width_raw).ok()?;
    let top_down = height_raw < 0;
    let height = height_raw.unsigned_abs();
    if width == 0 || height == 0 {
        return None;
    }

    let palette_offset = FILE_HEADER_SIZE.checked_add(info_size)?;
    let palette_end = palette_offset.checked_add(palette_len.checked_mul(4)?)?;
    let palette_bytes = bytes.get(palette_offset..palette_end)?;
    let mut palette = Vec::with_capacity(palette_len);
    for quad in palette_bytes.chunks_exact(4) {
        // Stored as BGRX quads; the reserved byte is not an alpha channel.
        palette.push([quad[2], quad[1], quad[0], 255]);
    }

    let width_usize = usize::try_from(width).ok()?;
    let height_usize = usize::try_from(height).ok()?;
    // Rows are padded to four bytes and stored bottom-up unless the
    // height is negative.
    let row_stride = width_usize.checked_add(3)? & !3;

    let mut indices = Vec::with_capacity(width_usize.checked_mul(height_usize)?);
    for row in 0..height_usize {
        let source_row = if top_down {
            row
        } else {
            height_usize - 1 - row
        };
        let start = data_offset.checked_add(source_row.checked_mul(row_stride)?)?;
        let line = bytes.get(start..start.checked_add(width_usize)?)?;
        indices.extend_from_slice(line);
    }

    if indices.iter().any(|&index| usize::from(index) >= palette_len) {
        return None;
    }

    Some(IndexedBitmap {
        width,
        height,
        palette,
        indices,
    })
}
