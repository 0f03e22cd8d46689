//! Fingerprints and path keys shared by the resolver, ledger and writer.

use camino::{Utf8Path, Utf8PathBuf};
use xxhash_rust::xxh3::xxh3_64;

/// Content fingerprint stored in the provenance ledger (xxHash3, 16 hex digits).
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:016x}", xxh3_64(bytes))
}

/// Fingerprint of a file on disk, or `None` if it cannot be read.
pub fn fingerprint_file(path: &Utf8Path) -> Option<String> {
    std::fs::read(path.as_std_path())
        .ok()
        .map(|bytes| fingerprint(&bytes))
}

/// Case-insensitive comparison key for a filesystem path.
pub fn path_key(path: &Utf8Path) -> String {
    path.as_str().replace('\\', "/").to_ascii_lowercase()
}

/// Express `path` relative to `root` with forward slashes.
///
/// Paths outside `root` are returned whole.
pub fn relative_to(path: &Utf8Path, root: &Utf8Path) -> String {
    path.strip_prefix(root)
        .map(|rel| rel.as_str())
        .unwrap_or(path.as_str())
        .replace('\\', "/")
}

/// Inverse of [`relative_to`].
pub fn absolute_from(stored: &str, root: &Utf8Path) -> Utf8PathBuf {
    let path = Utf8Path::new(stored);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Name a backup of `path` is stored under.
pub fn backup_path(path: &Utf8Path, suffix: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{}{}", path, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_stable() {
        assert_eq!(fingerprint(b"abc"), fingerprint(b"abc"));
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
        assert_eq!(fingerprint(b"").len(), 16);
    }

    #[test]
    fn test_relative_roundtrip() {
        let root = Utf8Path::new("/game");
        let path = Utf8Path::new("/game/addon/types/TShips.txt");
        let rel = relative_to(path, root);
        assert_eq!(rel, "addon/types/TShips.txt");
        assert_eq!(absolute_from(&rel, root), path);
    }

    #[test]
    fn test_relative_outside_root() {
        let rel = relative_to(Utf8Path::new("/elsewhere/log.json"), Utf8Path::new("/game"));
        assert_eq!(rel, "/elsewhere/log.json");
        assert_eq!(
            absolute_from(&rel, Utf8Path::new("/game")),
            Utf8PathBuf::from("/elsewhere/log.json")
        );
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Utf8Path::new("/game/addon/types/TShips.pck"), ".x3c.bak"),
            Utf8PathBuf::from("/game/addon/types/TShips.pck.x3c.bak")
        );
    }

    #[test]
    fn test_path_key() {
        assert_eq!(path_key(Utf8Path::new("C:\\Game\\Types")), "c:/game/types");
    }
}
