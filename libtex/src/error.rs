use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum TextureError {
    #[error("recognized container is truncated (expected {expected:?} bytes, received {received:?} bytes)")]
    #[diagnostic(code(libtex::truncated_container))]
    TruncatedContainer { expected: usize, received: usize },

    #[error("invalid texture dimensions ({width:?}x{height:?})")]
    #[diagnostic(code(libtex::invalid_dimensions))]
    InvalidDimensions { width: u32, height: u32 },

    #[error("unsupported pixel layout: {format}")]
    #[diagnostic(code(libtex::unsupported_pixel_format))]
    UnsupportedPixelFormat { format: String },

    #[error("pixel data is truncated (expected {expected:?} bytes, received {received:?} bytes)")]
    #[diagnostic(code(libtex::truncated_pixel_data))]
    TruncatedPixelData { expected: usize, received: usize },

    #[error("pixel buffer size mismatch (expected {expected:?} bytes, received {received:?} bytes)")]
    #[diagnostic(code(libtex::buffer_size_mismatch))]
    BufferSizeMismatch { expected: usize, received: usize },

    #[error("image has more than 256 distinct colors")]
    #[diagnostic(code(libtex::palette_overflow))]
    PaletteOverflow,

    #[error("arithmetic overflow while sizing pixel data")]
    #[diagnostic(code(libtex::integer_overflow))]
    IntegerOverflow,

    #[error(transparent)]
    #[diagnostic(code(libtex::image_error))]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    #[diagnostic(code(libtex::png_error))]
    EncodePng(#[from] png::EncodingError),

    #[error("texture output error")]
    #[diagnostic(code(libtex::io_error))]
    WriteFile(#[from] std::io::Error),
}
