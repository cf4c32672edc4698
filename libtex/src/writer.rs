use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::bmp;
use crate::error::TextureError;
use crate::{IndexedBitmap, ShaderType, TextureStream};

/// Materialize a texture stream as a PNG at `<dir>/<file_name>`.
///
/// An empty destination directory or an empty stream is an intentional
/// skip, not an error. The destination directory tree is created when
/// absent. `TransparentMasked` textures become 8-bit indexed PNGs with
/// palette index 0 forced invisible; every other shader type becomes a
/// 32-bit PNG with channel values preserved exactly.
pub fn write_image(
    stream: TextureStream<'_>,
    dir: &Path,
    file_name: &str,
    shader: ShaderType,
) -> Result<(), TextureError> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    if stream.is_empty() {
        return Ok(());
    }

    fs::create_dir_all(dir)?;
    let target = dir.join(file_name);

    if shader == ShaderType::TransparentMasked {
        let mut bitmap = clone_indexed(stream)?;
        // The first palette slot is the mask slot. Render it invisible,
        // whatever color the source stored there. Other slots stay as-is.
        if let Some(mask) = bitmap.palette.first_mut() {
            *mask = [0, 0, 0, 0];
        }
        write_indexed_png(&target, &bitmap)
    } else {
        let image = clone_rgba(stream)?;
        write_rgba_png(&target, &image)
    }
}

fn clone_rgba(stream: TextureStream<'_>) -> Result<RgbaImage, TextureError> {
    match stream {
        TextureStream::Decoded(buffer) => buffer.into_rgba(),
        TextureStream::Passthrough(bytes) => Ok(image::load_from_memory(bytes)?.to_rgba8()),
    }
}

fn clone_indexed(stream: TextureStream<'_>) -> Result<IndexedBitmap, TextureError> {
    if let TextureStream::Passthrough(bytes) = &stream {
        if let Some(bitmap) = bmp::read_indexed(bytes) {
            return Ok(bitmap);
        }
    }

    build_indexed(&clone_rgba(stream)?)
}

/// Re-index an RGBA bitmap, assigning palette slots in first-appearance
/// order over the full image bounds.
fn build_indexed(image: &RgbaImage) -> Result<IndexedBitmap, TextureError> {
    let mut palette: Vec<[u8; 4]> = Vec::new();
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::new();
    let mut indices = Vec::with_capacity(image.as_raw().len() / 4);

    for pixel in image.pixels() {
        let color = pixel.0;
        let index = match lookup.get(&color) {
            Some(&index) => index,
            None => {
                if palette.len() == 256 {
                    return Err(TextureError::PaletteOverflow);
                }
                let index = palette.len() as u8;
                palette.push(color);
                lookup.insert(color, index);
                index
            }
        };
        indices.push(index);
    }

    Ok(IndexedBitmap {
        width: image.width(),
        height: image.height(),
        palette,
        indices,
    })
}

fn write_indexed_png(target: &Path, bitmap: &IndexedBitmap) -> Result<(), TextureError> {
    let mut rgb = Vec::with_capacity(bitmap.palette.len() * 3);
    let mut alpha = Vec::with_capacity(bitmap.palette.len());
    for entry in &bitmap.palette {
        rgb.extend_from_slice(&entry[0..3]);
        alpha.push(entry[3]);
    }

    let file = File::create(target)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), bitmap.width, bitmap.height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(rgb);
    encoder.set_trns(alpha);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&bitmap.indices)?;
    Ok(())
}

fn write_rgba_png(target: &Path, image: &RgbaImage) -> Result<(), TextureError> {
    let file = File::create(target)?;
    PngEncoder::new(BufWriter::new(file)).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(())
}
