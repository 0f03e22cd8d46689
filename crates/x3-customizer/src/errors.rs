use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Game directory is not set")]
    #[diagnostic(
        code(config::game_dir_missing),
        help("Pass --game-dir or set game_dir in x3_customizer.toml next to the executable")
    )]
    GameDirNotSet,

    #[error("Configuration file error in {path}")]
    #[diagnostic(
        code(config::parse_error),
        help("Check x3_customizer.toml for syntax errors")
    )]
    ConfigParseError {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{message}")]
    #[diagnostic(
        code(install::invalid),
        help("game_dir must point at an X3 installation (the folder holding 01.cat or addon/)")
    )]
    InvalidInstallation { message: String },

    #[error("{count} file(s) could not be written")]
    #[diagnostic(
        code(write::failures),
        help("Files that failed were left untouched; fix the cause and run again")
    )]
    WriteFailures { count: usize },

    #[error("Catalog pair already exists: {path}")]
    #[diagnostic(
        code(catalog::exists),
        help("Pick another --number or pass --force to replace it")
    )]
    PairExists { path: Utf8PathBuf },

    #[error("Asset not found: {path}")]
    #[diagnostic(
        code(asset::not_found),
        help("Virtual paths are relative to the installation, e.g. types/TShips.txt")
    )]
    AssetNotFound { path: String },

    #[error("File not found: {path}")]
    #[diagnostic(
        code(file::not_found),
        help("Make sure the file exists and the path is correct")
    )]
    FileNotFound { path: Utf8PathBuf },

    #[error("Directory creation failed")]
    #[diagnostic(
        code(fs::create_dir_failed),
        help("Check file permissions and available disk space")
    )]
    DirectoryCreationFailed {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(catalog::error))]
    Catalog(#[from] x3_catalog::CatalogError),

    #[error(transparent)]
    #[diagnostic(code(core::error))]
    Core(x3_mod_core::Error),

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl From<x3_mod_core::Error> for CliError {
    fn from(error: x3_mod_core::Error) -> Self {
        match error {
            x3_mod_core::Error::MissingAsset(path) => Self::AssetNotFound { path },
            error if error.is_configuration() => Self::InvalidInstallation {
                message: error.to_string(),
            },
            error => Self::Core(error),
        }
    }
}

impl CliError {
    pub fn config_parse_error(path: Utf8PathBuf, source: toml::de::Error) -> Self {
        Self::ConfigParseError { path, source }
    }

    pub fn file_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn directory_creation_failed(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreationFailed {
            path: path.into(),
            source,
        }
    }
}
