use crate::errors::CliError;
use crate::println_pad;
use crate::utils::human_size;
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use miette::Result;
use std::fs;
use x3_catalog::{compression, CatalogPair};
use x3_mod_core::routing::{is_compressed_form, plain_form};
use x3_mod_core::VirtualPath;

pub struct UnpackArgs {
    pub cat_path: String,
    pub output_dir: Option<String>,
    pub decompress: bool,
    pub folder: Option<String>,
}

#[derive(Debug, Default)]
pub struct UnpackSummary {
    pub extracted: usize,
    pub decompressed: usize,
    pub skipped: usize,
    pub bytes: u64,
}

/// Compute the default output directory: parent folder + file stem
fn default_output_dir(cat_path: &Utf8Path) -> Utf8PathBuf {
    let file_stem = cat_path.file_stem().unwrap_or("extracted");
    match cat_path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.join(file_stem),
        _ => Utf8PathBuf::from(file_stem),
    }
}

pub fn unpack_catalog(args: UnpackArgs) -> Result<()> {
    let cat_path = Utf8PathBuf::from(&args.cat_path);
    if !cat_path.is_file() {
        return Err(CliError::file_not_found(cat_path).into());
    }

    let output_dir = args
        .output_dir
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| default_output_dir(&cat_path));

    println_pad!(
        "{} {}",
        "📦 Unpacking catalog:".bright_blue().bold(),
        cat_path.as_str().bright_cyan().bold()
    );
    println_pad!(
        "{} {}",
        "📁 Extracting to:".bright_yellow(),
        output_dir.as_str().bright_white().bold()
    );

    let mut pair = CatalogPair::open(cat_path);
    let summary = unpack_pair(
        &mut pair,
        &output_dir,
        args.decompress,
        args.folder.as_deref(),
    )?;

    println_pad!(
        "{} {} files ({}), {} decompressed, {} skipped",
        "✅ Extraction complete:".bright_green().bold(),
        summary.extracted,
        human_size(summary.bytes),
        summary.decompressed,
        summary.skipped
    );
    Ok(())
}

/// Writes the entries of `pair` below `output_dir`, optionally only those
/// under `folder`. With `decompress`, compressed-form entries are written
/// decoded under their plain name.
pub fn unpack_pair(
    pair: &mut CatalogPair,
    output_dir: &Utf8Path,
    decompress: bool,
    folder: Option<&str>,
) -> Result<UnpackSummary, CliError> {
    let entries = pair.entries()?.to_vec();
    fs::create_dir_all(output_dir)
        .map_err(|e| CliError::directory_creation_failed(output_dir, e))?;

    let mut summary = UnpackSummary::default();
    for entry in &entries {
        let path = VirtualPath::new(&entry.path);
        if folder.is_some_and(|folder| !path.is_in_folder(folder)) {
            continue;
        }
        if path.as_str().split('/').any(|segment| segment == "..") {
            tracing::warn!("Skipping entry with unsafe path '{}'", entry.path);
            summary.skipped += 1;
            continue;
        }

        let mut bytes = pair.read_entry(entry)?;
        let mut name = path.clone();
        if decompress && is_compressed_form(&path) {
            match compression::decompress(&bytes) {
                Ok(plain) => {
                    bytes = plain;
                    name = plain_form(&path);
                    summary.decompressed += 1;
                }
                Err(e) => {
                    tracing::warn!("Keeping '{}' compressed: {}", path, e);
                }
            }
        }

        let target = output_dir.join(name.as_str());
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| CliError::directory_creation_failed(parent, e))?;
        }
        fs::write(&target, &bytes)?;
        tracing::debug!("Extracted {} ({} bytes)", target, bytes.len());

        summary.extracted += 1;
        summary.bytes += bytes.len() as u64;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use x3_catalog::CatalogWriter;

    #[test]
    fn test_unpack_with_decompression() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let mut writer = CatalogWriter::new();
        writer.add(
            "types/TShips.pck",
            compression::compress(b"// TShips\n").unwrap(),
        );
        writer.add("maps/x3_universe.pck", compression::compress(b"<universe/>").unwrap());
        writer.add("objects/ships/argon.pbd", b"not gzip at all".to_vec());
        let cat = writer.write_pair(&root, 1).unwrap();

        let out = root.join("out");
        let summary = unpack_pair(&mut CatalogPair::open(cat), &out, true, None).unwrap();

        assert_eq!(summary.extracted, 3);
        assert_eq!(summary.decompressed, 2);
        assert_eq!(fs::read(out.join("types/TShips.txt")).unwrap(), b"// TShips\n");
        assert_eq!(fs::read(out.join("maps/x3_universe.xml")).unwrap(), b"<universe/>");
        // Undecodable payloads stay under their stored name.
        assert_eq!(
            fs::read(out.join("objects/ships/argon.pbd")).unwrap(),
            b"not gzip at all"
        );
    }

    #[test]
    fn test_unpack_folder_filter_keeps_stored_form() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let packed = compression::compress(b"data").unwrap();
        let mut writer = CatalogWriter::new();
        writer.add("types/TLaser.pck", packed.clone());
        writer.add("t/0001-L044.xml", b"<language/>".to_vec());
        let cat = writer.write_pair(&root, 1).unwrap();

        let out = root.join("out");
        let summary = unpack_pair(&mut CatalogPair::open(cat), &out, false, Some("TYPES")).unwrap();

        assert_eq!(summary.extracted, 1);
        assert_eq!(fs::read(out.join("types/TLaser.pck")).unwrap(), packed);
        assert!(!out.join("t").exists());
    }

    #[test]
    fn test_default_output_dir() {
        assert_eq!(
            default_output_dir(Utf8Path::new("/game/addon/03.cat")),
            Utf8PathBuf::from("/game/addon/03")
        );
        assert_eq!(
            default_output_dir(Utf8Path::new("01.cat")),
            Utf8PathBuf::from("01")
        );
    }
}
