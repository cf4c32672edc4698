pub mod dds;
pub mod error;
pub mod writer;

mod bmp;

use core::fmt;

use image::RgbaImage;

use crate::error::TextureError;

/// Shader classification attached to a texture by the model description.
///
/// Only `TransparentMasked` changes how a texture is materialized; every
/// other variant takes the 32-bit path with channel values preserved.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderType {
    Diffuse,
    Transparent25,
    Transparent50,
    Transparent75,
    TransparentAdditive,
    TransparentAdditiveUnlit,
    TransparentMasked,
    Invisible,
    Boundary,
}

impl ShaderType {
    /// Parse a classification name from sidecar metadata.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "diffuse" => Some(Self::Diffuse),
            "transparent25" => Some(Self::Transparent25),
            "transparent50" => Some(Self::Transparent50),
            "transparent75" => Some(Self::Transparent75),
            "transparentadditive" => Some(Self::TransparentAdditive),
            "transparentadditiveunlit" => Some(Self::TransparentAdditiveUnlit),
            "transparentmasked" => Some(Self::TransparentMasked),
            "invisible" => Some(Self::Invisible),
            "boundary" => Some(Self::Boundary),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Diffuse => "Diffuse",
            Self::Transparent25 => "Transparent25",
            Self::Transparent50 => "Transparent50",
            Self::Transparent75 => "Transparent75",
            Self::TransparentAdditive => "TransparentAdditive",
            Self::TransparentAdditiveUnlit => "TransparentAdditiveUnlit",
            Self::TransparentMasked => "TransparentMasked",
            Self::Invisible => "Invisible",
            Self::Boundary => "Boundary",
        }
    }
}

impl fmt::Display for ShaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical in-memory pixel layout produced by the decoder.
///
/// Adding a variant here must be matched by the normalizer in `dds` and by
/// `PixelBuffer::into_rgba`; both matches are exhaustive on purpose.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CanonicalFormat {
    /// 32-bit straight alpha, stored as BGRA bytes in memory.
    Argb8888,
}

/// Decoded pixel data with exclusive ownership of the underlying buffer.
///
/// `stride * height == data.len()` holds for every constructed value.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: CanonicalFormat,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(
        width: u32,
        height: u32,
        stride: u32,
        format: CanonicalFormat,
        data: Vec<u8>,
    ) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidDimensions { width, height });
        }

        let row = usize::try_from(width)
            .ok()
            .and_then(|w| w.checked_mul(4))
            .ok_or(TextureError::IntegerOverflow)?;
        let stride_usize = usize::try_from(stride).map_err(|_| TextureError::IntegerOverflow)?;
        if stride_usize < row {
            return Err(TextureError::BufferSizeMismatch {
                expected: row,
                received: stride_usize,
            });
        }

        let expected = stride_usize
            .checked_mul(usize::try_from(height).map_err(|_| TextureError::IntegerOverflow)?)
            .ok_or(TextureError::IntegerOverflow)?;
        if expected != data.len() {
            return Err(TextureError::BufferSizeMismatch {
                expected,
                received: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
        })
    }

    /// Convert into an RGBA bitmap, consuming the buffer.
    ///
    /// The pixel data is owned by this value alone, so the source bytes are
    /// released as soon as the conversion returns on any path.
    pub fn into_rgba(self) -> Result<RgbaImage, TextureError> {
        let row = usize::try_from(self.width)
            .ok()
            .and_then(|w| w.checked_mul(4))
            .ok_or(TextureError::IntegerOverflow)?;
        let stride = usize::try_from(self.stride).map_err(|_| TextureError::IntegerOverflow)?;

        let mut pixels = Vec::with_capacity(
            row.checked_mul(usize::try_from(self.height).map_err(|_| TextureError::IntegerOverflow)?)
                .ok_or(TextureError::IntegerOverflow)?,
        );
        match self.format {
            CanonicalFormat::Argb8888 => {
                for line in self.data.chunks_exact(stride) {
                    for px in line[..row].chunks_exact(4) {
                        pixels.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                    }
                }
            }
        }

        let expected = pixels.len();
        RgbaImage::from_raw(self.width, self.height, pixels).ok_or(
            TextureError::BufferSizeMismatch {
                expected,
                received: 0,
            },
        )
    }
}

/// Classification result for a raw texture byte stream.
///
/// `Passthrough` is not an error: the bytes are assumed to already be a
/// directly loadable encoded image (legacy Targa and friends).
#[derive(Debug)]
pub enum TextureStream<'a> {
    Decoded(PixelBuffer),
    Passthrough(&'a [u8]),
}

impl TextureStream<'_> {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Decoded(buffer) => buffer.data.is_empty(),
            Self::Passthrough(bytes) => bytes.is_empty(),
        }
    }
}

/// 8-bit bitmap with an explicit palette, ready for indexed PNG encoding.
#[derive(Clone, Debug)]
pub struct IndexedBitmap {
    pub width: u32,
    pub height: u32,
    /// RGBA palette entries, at most 256.
    pub palette: Vec<[u8; 4]>,
    /// Row-major palette indices, `width * height` entries.
    pub indices: Vec<u8>,
}
