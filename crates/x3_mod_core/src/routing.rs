//! Mapping virtual paths to physical locations.
//!
//! Two concerns live here:
//!
//! - **Compressed forms.** Text and model files may be stored gzip-compressed
//!   under a different extension (`.txt`/`.xml` as `.pck`, `.bod` as `.pbd`,
//!   `.bob` as `.pbb`). Lookups try the compressed name first.
//! - **Output tiers.** Files under a fixed set of top-level folders are read by
//!   the game from the primary (addon) folder; everything else from the game
//!   directory itself. Writing to the wrong tier leaves the edit invisible.

use crate::settings::Settings;
use crate::virtual_path::VirtualPath;
use camino::{Utf8Path, Utf8PathBuf};

/// Top-level folders whose files belong in the primary tier.
pub const PRIMARY_TIER_FOLDERS: &[&str] = &["director", "maps", "mov", "scripts", "t", "types"];

/// Compressed-form extension pairs: (plain, compressed).
const COMPRESSED_FORMS: &[(&str, &str)] = &[("txt", "pck"), ("xml", "pck"), ("bod", "pbd"), ("bob", "pbb")];

/// Whether `path` routes to the primary tier.
pub fn is_primary_tier(path: &VirtualPath) -> bool {
    PRIMARY_TIER_FOLDERS
        .iter()
        .any(|folder| path.is_in_folder(folder))
}

/// Where the game expects to find a loose copy of `path`.
pub fn output_path(settings: &Settings, path: &VirtualPath) -> Utf8PathBuf {
    let root = if is_primary_tier(path) {
        settings.primary_dir()
    } else {
        settings.secondary_dir().to_path_buf()
    };
    root.join(path.as_str())
}

/// Compressed-form name of `path`, if its extension has one.
pub fn compressed_form(path: &VirtualPath) -> Option<VirtualPath> {
    let ext = path.extension()?;
    COMPRESSED_FORMS
        .iter()
        .find(|(plain, _)| *plain == ext)
        .map(|(_, packed)| path.with_extension(packed))
}

/// Compressed-form name of a file on disk, if its extension has one.
pub fn compressed_sibling(path: &Utf8Path) -> Option<Utf8PathBuf> {
    let ext = path.extension()?.to_ascii_lowercase();
    COMPRESSED_FORMS
        .iter()
        .find(|(plain, _)| *plain == ext)
        .map(|(_, packed)| path.with_extension(packed))
}

/// Whether `path` is itself a compressed-form name.
pub fn is_compressed_form(path: &VirtualPath) -> bool {
    path.extension()
        .is_some_and(|ext| COMPRESSED_FORMS.iter().any(|(_, packed)| *packed == ext))
}

/// Plain name for a compressed-form `path`; other paths are returned unchanged.
///
/// `.pck` is ambiguous: under `types/` it stands for `.txt`, elsewhere `.xml`.
pub fn plain_form(path: &VirtualPath) -> VirtualPath {
    match path.extension().as_deref() {
        Some("pck") if path.is_in_folder("types") => path.with_extension("txt"),
        Some("pck") => path.with_extension("xml"),
        Some("pbd") => path.with_extension("bod"),
        Some("pbb") => path.with_extension("bob"),
        _ => path.clone(),
    }
}

/// Names to try for `path`, compressed form first, with a flag marking it.
pub fn lookup_candidates(path: &VirtualPath) -> Vec<(VirtualPath, bool)> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(packed) = compressed_form(path) {
        candidates.push((packed, true));
    }
    candidates.push((path.clone(), false));
    candidates
}
