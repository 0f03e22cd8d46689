//! Application configuration management utilities.

use crate::errors::CliError;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::env;
use std::fs;
use x3_mod_core::Settings;

pub const CONFIG_FILE_NAME: &str = "x3_customizer.toml";

/// Application-wide configuration stored in x3_customizer.toml.
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub game_dir: Option<Utf8PathBuf>,
    pub override_dir: Option<Utf8PathBuf>,
    pub primary_folder: Option<String>,
    pub ignore_loose_files: Option<bool>,
    pub log_file: Option<Utf8PathBuf>,
}

/// Installation flags shared by every command that touches the game.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct InstallArgs {
    /// X3 installation directory
    #[arg(long, global = true)]
    pub game_dir: Option<String>,

    /// Folder mirroring the installation layout whose files take top priority
    #[arg(long, global = true)]
    pub override_dir: Option<String>,

    /// Name of the primary tier folder inside the installation
    #[arg(long, global = true)]
    pub primary_folder: Option<String>,

    /// Ignore loose files in the installation when resolving
    #[arg(long, global = true)]
    pub ignore_loose_files: bool,

    /// Location of the run ledger
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    /// Configuration file to use instead of the one next to the executable
    #[arg(long, global = true)]
    pub config: Option<String>,
}

impl AppConfig {
    /// Overlay command-line flags on top of the file values.
    pub fn merge(mut self, args: &InstallArgs) -> Self {
        if let Some(dir) = &args.game_dir {
            self.game_dir = Some(dir.into());
        }
        if let Some(dir) = &args.override_dir {
            self.override_dir = Some(dir.into());
        }
        if let Some(folder) = &args.primary_folder {
            self.primary_folder = Some(folder.clone());
        }
        if args.ignore_loose_files {
            self.ignore_loose_files = Some(true);
        }
        if let Some(path) = &args.log_file {
            self.log_file = Some(path.into());
        }
        self
    }

    pub fn into_settings(self) -> Result<Settings, CliError> {
        let game_dir = self
            .game_dir
            .filter(|dir| !dir.as_str().trim().is_empty())
            .ok_or(CliError::GameDirNotSet)?;

        let mut settings =
            Settings::new(game_dir).ignore_loose_files(self.ignore_loose_files.unwrap_or(false));
        if let Some(dir) = self.override_dir {
            settings = settings.with_override_dir(dir);
        }
        if let Some(folder) = self.primary_folder {
            settings = settings.with_primary_folder(folder);
        }
        if let Some(path) = self.log_file {
            settings = settings.with_log_file(path);
        }
        Ok(settings)
    }
}

/// Returns the directory where the current executable resides.
pub fn install_dir() -> Option<Utf8PathBuf> {
    let exe = env::current_exe().ok()?;
    let parent = exe.parent()?;
    Utf8PathBuf::from_path_buf(parent.to_path_buf()).ok()
}

/// Returns a config file path located next to the executable.
pub fn config_path(file_name: &str) -> Option<Utf8PathBuf> {
    install_dir().map(|dir| dir.join(file_name))
}

/// Returns the default configuration file path (x3_customizer.toml).
pub fn default_config_path() -> Option<Utf8PathBuf> {
    config_path(CONFIG_FILE_NAME)
}

/// Loads the configuration file at `path`.
/// A missing file yields the default configuration; a malformed one is an error.
pub fn load_config_from(path: &Utf8Path) -> Result<AppConfig, CliError> {
    if !path.is_file() {
        tracing::debug!("No configuration file at {}", path);
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| CliError::config_parse_error(path.to_path_buf(), e))
}

/// Loads the configuration the flags point at, or the one next to the executable.
pub fn load_config(args: &InstallArgs) -> Result<(AppConfig, Option<Utf8PathBuf>), CliError> {
    let path = match &args.config {
        Some(path) => {
            let path = Utf8PathBuf::from(path);
            if !path.is_file() {
                return Err(CliError::file_not_found(path));
            }
            Some(path)
        }
        None => default_config_path(),
    };

    let cfg = match &path {
        Some(path) => load_config_from(path)?,
        None => AppConfig::default(),
    };
    Ok((cfg, path))
}

/// Builds run settings from the configuration file merged with the flags.
pub fn resolve_settings(args: &InstallArgs) -> Result<Settings, CliError> {
    let (cfg, _) = load_config(args)?;
    cfg.merge(args).into_settings()
}
