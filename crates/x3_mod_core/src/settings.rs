//! Run settings: where the installation lives and how to treat it.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Default name of the primary (addon) folder inside the installation.
pub const DEFAULT_PRIMARY_FOLDER: &str = "addon";

/// Default file name of the provenance ledger, placed in the game directory.
pub const DEFAULT_LOG_FILE: &str = "x3_customizer_log.json";

fn default_primary_folder() -> String {
    DEFAULT_PRIMARY_FOLDER.to_string()
}

/// Settings for one run.
///
/// Deserializable so front ends can read them from a config file.
///
/// ```
/// use x3_mod_core::Settings;
///
/// let settings = Settings::new("C:/Games/X3 Terran Conflict")
///     .with_override_dir("C:/Games/x3_source")
///     .ignore_loose_files(true);
/// assert_eq!(settings.primary_dir().as_str(), "C:/Games/X3 Terran Conflict/addon");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Installation root (the secondary tier).
    pub game_dir: Utf8PathBuf,

    /// Optional user folder mirroring the installation layout.
    #[serde(default)]
    pub override_dir: Option<Utf8PathBuf>,

    /// Name of the primary tier folder under `game_dir`.
    #[serde(default = "default_primary_folder")]
    pub primary_folder: String,

    /// Skip loose installation files during resolution.
    #[serde(default)]
    pub ignore_loose_files: bool,

    /// Ledger location; defaults to [`DEFAULT_LOG_FILE`] in `game_dir`.
    #[serde(default)]
    pub log_file: Option<Utf8PathBuf>,
}

impl Settings {
    pub fn new(game_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            game_dir: game_dir.into(),
            override_dir: None,
            primary_folder: default_primary_folder(),
            ignore_loose_files: false,
            log_file: None,
        }
    }

    pub fn with_override_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.override_dir = Some(dir.into());
        self
    }

    pub fn with_primary_folder(mut self, name: impl Into<String>) -> Self {
        self.primary_folder = name.into();
        self
    }

    pub fn with_log_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn ignore_loose_files(mut self, ignore: bool) -> Self {
        self.ignore_loose_files = ignore;
        self
    }

    /// Primary tier root (`<game>/addon`).
    pub fn primary_dir(&self) -> Utf8PathBuf {
        self.game_dir.join(&self.primary_folder)
    }

    /// Secondary tier root (the game directory itself).
    pub fn secondary_dir(&self) -> &Utf8Path {
        &self.game_dir
    }

    pub fn log_path(&self) -> Utf8PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.game_dir.join(DEFAULT_LOG_FILE))
    }

    /// Check that the paths point at something that looks like an installation.
    ///
    /// The game directory must exist and hold either a first catalog pair or
    /// the primary folder. An override folder, when set, must be a directory.
    pub fn validate(&self) -> Result<()> {
        if self.game_dir.as_str().trim().is_empty() {
            return Err(Error::Configuration("game directory is not set".into()));
        }
        if !self.game_dir.as_std_path().is_dir() {
            return Err(Error::Configuration(format!(
                "game directory '{}' does not exist",
                self.game_dir
            )));
        }

        let has_catalog = self
            .game_dir
            .join(x3_catalog::pair_file_name(1))
            .as_std_path()
            .is_file();
        if !has_catalog && !self.primary_dir().as_std_path().is_dir() {
            return Err(Error::Configuration(format!(
                "'{}' contains neither {} nor a '{}' folder; is this an X3 installation?",
                self.game_dir,
                x3_catalog::pair_file_name(1),
                self.primary_folder
            )));
        }

        if let Some(dir) = &self.override_dir {
            if !dir.as_std_path().is_dir() {
                return Err(Error::Configuration(format!(
                    "override folder '{}' does not exist",
                    dir
                )));
            }
        }

        Ok(())
    }
}
