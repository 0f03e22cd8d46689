//! Asset resolution and safe writeback for X3 game data.
//!
//! This crate loads game files from wherever the game would read them, lets
//! callers edit them through typed models, and writes the edits back as loose
//! files without ever losing a file the user put in the installation:
//!
//! - **Layered resolution**: override folder, loose files (primary then
//!   secondary tier), then catalog pairs, highest number first
//! - **Typed content**: `;`-delimited record tables with named fields, text
//!   files with their original encoding, raw bytes for everything else
//! - **Tier routing**: outputs land where the game looks for them
//! - **Provenance ledger**: every write and rename is recorded and flushed
//!   immediately, so later runs can clean up or restore after themselves
//!
//! # Example
//!
//! ```no_run
//! use x3_mod_core::{FileManager, Settings};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::new("C:/Games/X3 Terran Conflict")
//!     .with_override_dir("C:/Games/x3_source");
//!
//! let mut manager = FileManager::new(settings)?.with_progress(|progress| {
//!     println!("{:?} {}/{}", progress.stage, progress.current, progress.total);
//! });
//!
//! let globals = manager.load("types/Globals.txt")?;
//! if let Some(table) = globals.records_mut() {
//!     table.set_global("SG_MAX_JUMP_RANGE", "20");
//! }
//! if let Some(lasers) = manager.try_load("types/TLaser.txt")? {
//!     println!("{} lasers", lasers.records().map_or(0, |t| t.len()));
//! }
//!
//! let report = manager.write_all()?;
//! println!("Wrote {} files, restored {}", report.written.len(), report.restored.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod file_manager;
pub mod game_file;
pub mod provenance;
pub mod resolver;
pub mod routing;
pub mod settings;
pub mod utils;
pub mod virtual_path;
pub mod writeback;

// Re-export main types
pub use error::{Error, Result};
pub use file_manager::{
    FileManager, LoadFailure, WriteFailure, WriteProgress, WriteReport, WriteStage, TOOL_VERSION,
};
pub use game_file::{
    Field, FreeformText, GameFile, GameFileKind, Record, RecordTable, SourceInfo, SourceTier,
    TableFormat,
};
pub use provenance::{ProvenanceLog, BACKUP_SUFFIX};
pub use resolver::{Resolution, ResolvedSource, Resolver};
pub use settings::Settings;
pub use virtual_path::VirtualPath;
