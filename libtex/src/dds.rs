use byteorder::ByteOrder;

use crate::error::TextureError;
use crate::{CanonicalFormat, PixelBuffer, TextureStream};

/// Container magic ("DDS " characters in numeric)
pub const DDS_MAGIC: u32 = 0x2053_4444;
/// Size of the container header including the magic (in bytes)
pub const HEADER_SIZE: usize = 128;

const PIXEL_FORMAT_OFFSET: usize = 76;
const FLAG_ALPHA_PIXELS: u32 = 0x1;
const FLAG_FOURCC: u32 = 0x4;
const FLAG_RGB: u32 = 0x40;

/// Raw pixel-format block of a recognized container.
#[derive(Copy, Clone, Debug)]
pub struct PixelFormat {
    pub flags: u32,
    pub fourcc: u32,
    pub bit_count: u32,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
    pub alpha_mask: u32,
}

/// Classify a raw texture byte stream.
///
/// Bytes without the container magic are handed back unmodified as
/// [`TextureStream::Passthrough`]. A recognized container either decodes
/// to the canonical layout or fails for this texture only.
pub fn classify(bytes: &[u8]) -> Result<TextureStream<'_>, TextureError> {
    if bytes.len() < 4 || byteorder::LittleEndian::read_u32(&bytes[0..4]) != DDS_MAGIC {
        log::debug!("no container magic, passing {} bytes through", bytes.len());
        return Ok(TextureStream::Passthrough(bytes));
    }

    if bytes.len() < HEADER_SIZE {
        return Err(TextureError::TruncatedContainer {
            expected: HEADER_SIZE,
            received: bytes.len(),
        });
    }

    let height = byteorder::LittleEndian::read_u32(&bytes[12..16]);
    let width = byteorder::LittleEndian::read_u32(&bytes[16..20]);
    if width == 0 || height == 0 {
        return Err(TextureError::InvalidDimensions { width, height });
    }

    let pixel_format = read_pixel_format(bytes);
    let format = canonical_format(&pixel_format)?;

    let stride = width.checked_mul(4).ok_or(TextureError::IntegerOverflow)?;
    let length = usize::try_from(stride)
        .ok()
        .and_then(|stride| {
            usize::try_from(height)
                .ok()
                .and_then(|height| stride.checked_mul(height))
        })
        .ok_or(TextureError::IntegerOverflow)?;

    let end = HEADER_SIZE
        .checked_add(length)
        .ok_or(TextureError::IntegerOverflow)?;
    let Some(payload) = bytes.get(HEADER_SIZE..end) else {
        return Err(TextureError::TruncatedPixelData {
            expected: length,
            received: bytes.len() - HEADER_SIZE,
        });
    };

    let buffer = PixelBuffer::new(width, height, stride, format, payload.to_vec())?;
    log::debug!("recognized {width}x{height} uncompressed container");
    Ok(TextureStream::Decoded(buffer))
}

/// Map a container pixel-format block to the canonical layout.
///
/// Exactly one layout is accepted: uncompressed 32-bit straight alpha with
/// the A8R8G8B8 channel masks. Everything else is an explicit extension
/// point, reported as unsupported rather than silently accepted.
pub fn canonical_format(format: &PixelFormat) -> Result<CanonicalFormat, TextureError> {
    if format.flags & FLAG_FOURCC != 0 {
        return Err(TextureError::UnsupportedPixelFormat {
            format: describe_fourcc(format.fourcc),
        });
    }

    if format.flags & FLAG_RGB != 0
        && format.flags & FLAG_ALPHA_PIXELS != 0
        && format.bit_count == 32
        && format.alpha_mask == 0xFF00_0000
        && format.red_mask == 0x00FF_0000
        && format.green_mask == 0x0000_FF00
        && format.blue_mask == 0x0000_00FF
    {
        return Ok(CanonicalFormat::Argb8888);
    }

    Err(TextureError::UnsupportedPixelFormat {
        format: format!(
            "{}-bit masks a={:#010X} r={:#010X} g={:#010X} b={:#010X}",
            format.bit_count,
            format.alpha_mask,
            format.red_mask,
            format.green_mask,
            format.blue_mask
        ),
    })
}

fn read_pixel_format(bytes: &[u8]) -> PixelFormat {
    let base = PIXEL_FORMAT_OFFSET;
    PixelFormat {
        flags: byteorder::LittleEndian::read_u32(&bytes[base + 4..base + 8]),
        fourcc: byteorder::LittleEndian::read_u32(&bytes[base + 8..base + 12]),
        bit_count: byteorder::LittleEndian::read_u32(&bytes[base + 12..base + 16]),
        red_mask: byteorder::LittleEndian::read_u32(&bytes[base + 16..base + 20]),
        green_mask: byteorder::LittleEndian::read_u32(&bytes[base + 20..base + 24]),
        blue_mask: byteorder::LittleEndian::read_u32(&bytes[base + 24..base + 28]),
        alpha_mask: byteorder::LittleEndian::read_u32(&bytes[base + 28..base + 32]),
    }
}

fn describe_fourcc(fourcc: u32) -> String {
    let raw = fourcc.to_le_bytes();
    if raw.iter().all(|byte| byte.is_ascii_graphic()) {
        let name: String = raw.iter().map(|byte| char::from(*byte)).collect();
        format!("compressed '{name}'")
    } else {
        format!("compressed {fourcc:#010X}")
    }
}
