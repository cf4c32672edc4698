mod logger;

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use clap::Parser;
use console::style;
use indicatif::ProgressBar;
use libpfs::reader::ArchiveEntry;
use libtex::{dds, writer, ShaderType};
use miette::{miette, IntoDiagnostic, Result};

const TEXTURE_EXTENSIONS: [&str; 3] = ["bmp", "dds", "tga"];

#[derive(Parser)]
#[command(name = "pfs-cli")]
#[command(about = "Extract textures and resources from PFS archives", version)]
struct Args {
    /// Archive files to extract
    #[arg(value_name = "ARCHIVE", required = true)]
    archives: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    output: PathBuf,

    /// JSON file mapping texture names to shader types
    #[arg(short, long, value_name = "FILE")]
    materials: Option<PathBuf>,

    /// Write entries as-is, without texture conversion
    #[arg(long)]
    raw: bool,

    /// Log debug details
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    fs::create_dir_all(&args.output).into_diagnostic()?;
    logger::init(&args.output.join("log.txt"), args.verbose).into_diagnostic()?;

    let materials = load_materials(args.materials.as_deref())?;

    let mut extracted = 0usize;
    let mut failed_textures = 0usize;
    let mut failed_archives = 0usize;

    for archive_path in &args.archives {
        match extract_archive(archive_path, &args, &materials) {
            Ok((written, failed)) => {
                extracted += written;
                failed_textures += failed;
            }
            Err(error) => {
                failed_archives += 1;
                log::error!("failed to extract {}: {error}", archive_path.display());
            }
        }
    }

    println!(
        "{} {extracted} files extracted, {failed_textures} failed",
        style("done:").green().bold()
    );

    if failed_archives > 0 {
        return Err(miette!("{failed_archives} archive(s) could not be read"));
    }
    Ok(())
}

fn extract_archive(
    archive_path: &Path,
    args: &Args,
    materials: &HashMap<String, String>,
) -> Result<(usize, usize)> {
    let file = File::open(archive_path).into_diagnostic()?;
    let entries = libpfs::reader::get_list(&file).into_diagnostic()?;

    let stem = archive_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| String::from("archive"));
    let target_dir = args.output.join(stem);

    log::info!(
        "extracting {} ({} entries)",
        archive_path.display(),
        entries.len()
    );

    let progress = ProgressBar::new(entries.len() as u64);
    let mut extracted = 0usize;
    let mut failed = 0usize;

    for entry in &entries {
        progress.inc(1);
        match extract_entry(&file, entry, &target_dir, args, materials) {
            Ok(()) => extracted += 1,
            Err(error) => {
                // One broken texture must not stop the rest of the batch.
                failed += 1;
                log::error!(
                    "failed to extract '{}' (shader {}) from {}: {error}",
                    entry.name,
                    shader_for(materials, &entry.name),
                    archive_path.display()
                );
            }
        }
    }

    progress.finish_and_clear();
    Ok((extracted, failed))
}

fn extract_entry(
    file: &File,
    entry: &ArchiveEntry,
    target_dir: &Path,
    args: &Args,
    materials: &HashMap<String, String>,
) -> Result<()> {
    let data = libpfs::reader::get_file(file, entry).into_diagnostic()?;

    if !args.raw && is_texture(entry) {
        let shader = shader_for(materials, &entry.name);
        let stream = dds::classify(&data).into_diagnostic()?;
        let file_name = Path::new(&entry.name)
            .with_extension("png")
            .to_string_lossy()
            .to_string();
        writer::write_image(stream, target_dir, &file_name, shader).into_diagnostic()?;
        log::debug!("materialized '{}' as '{file_name}'", entry.name);
    } else {
        fs::create_dir_all(target_dir).into_diagnostic()?;
        fs::write(target_dir.join(&entry.name), &data).into_diagnostic()?;
        log::debug!("wrote '{}' untouched", entry.name);
    }

    Ok(())
}

fn is_texture(entry: &ArchiveEntry) -> bool {
    entry
        .extension()
        .map(|extension| {
            TEXTURE_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn shader_for(materials: &HashMap<String, String>, name: &str) -> ShaderType {
    let Some(value) = materials
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
    else {
        return ShaderType::Diffuse;
    };

    match ShaderType::from_name(value) {
        Some(shader) => shader,
        None => {
            log::warn!("unknown shader type '{value}' for '{name}', using diffuse");
            ShaderType::Diffuse
        }
    }
}

fn load_materials(path: Option<&Path>) -> Result<HashMap<String, String>> {
    let Some(path) = path else {
        return Ok(HashMap::new());
    };

    let data = fs::read_to_string(path).into_diagnostic()?;
    serde_json::from_str(&data).into_diagnostic()
}
