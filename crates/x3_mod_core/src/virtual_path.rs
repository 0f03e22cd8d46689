//! Installation-relative asset identifiers.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A slash-separated, case-insensitively compared path naming one asset
/// regardless of where it is physically stored.
///
/// The original spelling is kept for display and for computing output paths;
/// equality, hashing and ordering use an ASCII-lowercased key.
///
/// ```
/// use x3_mod_core::VirtualPath;
///
/// let a = VirtualPath::new("types\\TShips.txt");
/// let b = VirtualPath::new("TYPES/tships.txt");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "types/TShips.txt");
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct VirtualPath {
    path: String,
    key: String,
}

impl VirtualPath {
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = normalize(path.as_ref());
        let key = path.to_ascii_lowercase();
        Self { path, key }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Lowercased comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// First path segment, if the path has more than one.
    pub fn top_folder(&self) -> Option<&str> {
        self.path.split_once('/').map(|(first, _)| first)
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Extension of the file name, lowercased, without the dot.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        name.rsplit_once('.')
            .filter(|(stem, _)| !stem.is_empty())
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }

    /// Same path with the extension replaced (or added).
    pub fn with_extension(&self, ext: &str) -> Self {
        let name = self.file_name();
        let stem_len = match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => self.path.len() - name.len() + stem.len(),
            _ => self.path.len(),
        };
        Self::new(format!("{}.{}", &self.path[..stem_len], ext))
    }

    /// Whether the path lives under `folder` (case-insensitive).
    pub fn is_in_folder(&self, folder: &str) -> bool {
        self.top_folder()
            .is_some_and(|top| top.eq_ignore_ascii_case(folder))
    }
}

fn normalize(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    unified
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

impl PartialEq for VirtualPath {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for VirtualPath {}

impl Hash for VirtualPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for VirtualPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VirtualPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl fmt::Debug for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtualPath({:?})", self.path)
    }
}

impl From<&str> for VirtualPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for VirtualPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&String> for VirtualPath {
    fn from(s: &String) -> Self {
        Self::new(s)
    }
}

impl From<&VirtualPath> for VirtualPath {
    fn from(p: &VirtualPath) -> Self {
        p.clone()
    }
}

impl From<VirtualPath> for String {
    fn from(p: VirtualPath) -> Self {
        p.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_normalization() {
        assert_eq!(VirtualPath::new("/types//TShips.txt").as_str(), "types/TShips.txt");
        assert_eq!(VirtualPath::new("./L\\x3story.obj").as_str(), "L/x3story.obj");
    }

    #[test]
    fn test_case_insensitive_identity() {
        let mut set = HashSet::new();
        set.insert(VirtualPath::new("director/3.01 Generic Missions.xml"));
        assert!(set.contains(&VirtualPath::new("DIRECTOR/3.01 generic missions.XML")));
    }

    #[test]
    fn test_extension_and_folder() {
        let p = VirtualPath::new("types/TShips.txt");
        assert_eq!(p.extension().as_deref(), Some("txt"));
        assert_eq!(p.top_folder(), Some("types"));
        assert!(p.is_in_folder("TYPES"));
        assert_eq!(p.file_name(), "TShips.txt");
        assert_eq!(VirtualPath::new("readme").extension(), None);
        assert_eq!(VirtualPath::new("readme").top_folder(), None);
    }

    #[test]
    fn test_with_extension() {
        let p = VirtualPath::new("director/3.01 Generic Missions.xml");
        assert_eq!(
            p.with_extension("pck").as_str(),
            "director/3.01 Generic Missions.pck"
        );
        assert_eq!(VirtualPath::new("t/readme").with_extension("pck").as_str(), "t/readme.pck");
    }
}
