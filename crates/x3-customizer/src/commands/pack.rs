use crate::errors::CliError;
use crate::println_pad;
use crate::utils::human_size;
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use miette::Result;
use std::fs;
use walkdir::WalkDir;
use x3_catalog::{compression, next_pair_number, pair_file_name, CatalogWriter};
use x3_mod_core::routing::compressed_form;
use x3_mod_core::VirtualPath;

#[derive(Debug)]
pub struct PackCatalogArgs {
    pub input_dir: String,
    pub output_dir: String,
    pub number: Option<u32>,
    pub compress: bool,
    pub force: bool,
}

pub fn pack_catalog(args: PackCatalogArgs) -> Result<()> {
    let input_dir = Utf8PathBuf::from(&args.input_dir);
    if !input_dir.is_dir() {
        return Err(CliError::file_not_found(input_dir).into());
    }

    let output_dir = Utf8PathBuf::from(&args.output_dir);
    if !output_dir.exists() {
        println!("Creating output directory: {}", output_dir);
        fs::create_dir_all(&output_dir)
            .map_err(|e| CliError::directory_creation_failed(output_dir.clone(), e))?;
    }

    let number = args
        .number
        .unwrap_or_else(|| next_pair_number(&output_dir));
    let cat_path = output_dir.join(pair_file_name(number));
    if cat_path.exists() && !args.force {
        return Err(CliError::PairExists { path: cat_path }.into());
    }

    println_pad!(
        "{} {}",
        "📦 Packing folder:".bright_blue().bold(),
        input_dir.as_str().bright_cyan().bold()
    );

    let (writer, bytes) = collect_files(&input_dir, args.compress)?;
    if writer.is_empty() {
        println_pad!("{}", "No files to pack".bright_yellow());
        return Ok(());
    }

    let cat_path = writer.write_pair(&output_dir, number).map_err(CliError::from)?;

    println_pad!(
        "{} {} ({} files, {})",
        "✅ Created".bright_green().bold(),
        cat_path.as_str().bright_white().bold(),
        writer.len(),
        human_size(bytes)
    );
    Ok(())
}

/// Adds every file below `input_dir` to a catalog writer under its relative
/// path. With `compress`, files that have a compressed form are gzipped and
/// stored under that name. Returns the writer and the payload total.
pub fn collect_files(input_dir: &Utf8Path, compress: bool) -> Result<(CatalogWriter, u64), CliError> {
    let mut writer = CatalogWriter::new();
    let mut total = 0u64;

    for entry in WalkDir::new(input_dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(full) = Utf8Path::from_path(entry.path()) else {
            tracing::warn!("Skipping non UTF-8 path {}", entry.path().display());
            continue;
        };
        let Ok(relative) = full.strip_prefix(input_dir) else {
            continue;
        };

        let mut path = VirtualPath::new(relative.as_str());
        let mut bytes = fs::read(full)?;
        if compress {
            if let Some(packed) = compressed_form(&path) {
                bytes = compression::compress(&bytes)?;
                path = packed;
            }
        }

        tracing::debug!("Adding {} ({} bytes)", path, bytes.len());
        total += bytes.len() as u64;
        writer.add(path.as_str(), bytes);
    }

    Ok((writer, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use x3_catalog::CatalogPair;

    fn setup() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::create_dir_all(root.join("src/types")).unwrap();
        fs::create_dir_all(root.join("src/objects")).unwrap();
        fs::write(root.join("src/types/TShips.txt"), b"// TShips\n").unwrap();
        fs::write(root.join("src/objects/cockpit.bin"), [1u8, 2, 3]).unwrap();
        (dir, root)
    }

    #[test]
    fn test_pack_plain() {
        let (_dir, root) = setup();
        let (writer, total) = collect_files(&root.join("src"), false).unwrap();
        assert_eq!(writer.len(), 2);
        assert_eq!(total, 13);

        let cat = writer.write_pair(&root, 1).unwrap();
        let mut pair = CatalogPair::open(cat);
        assert_eq!(pair.read("types/TShips.txt").unwrap().unwrap(), b"// TShips\n");
        assert_eq!(pair.read("objects/cockpit.bin").unwrap().unwrap(), vec![1u8, 2, 3]);
    }

    #[test]
    fn test_pack_compressed() {
        let (_dir, root) = setup();
        let (writer, _) = collect_files(&root.join("src"), true).unwrap();
        let cat = writer.write_pair(&root, 1).unwrap();

        let mut pair = CatalogPair::open(cat);
        assert!(pair.read("types/TShips.txt").unwrap().is_none());
        let packed = pair.read("types/TShips.pck").unwrap().unwrap();
        assert_eq!(compression::decompress(&packed).unwrap(), b"// TShips\n");
        // No compressed form for .bin
        assert!(pair.read("objects/cockpit.bin").unwrap().is_some());
    }
}
