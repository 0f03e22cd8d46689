use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::{resolve_settings, InstallArgs};
use crate::utils::{display_relative, human_size};
use camino::Utf8PathBuf;
use colored::Colorize;
use miette::Result;
use std::fs;
use x3_mod_core::{FileManager, GameFileKind, SourceTier};

pub struct ResolveArgs {
    pub path: String,
    pub output: Option<String>,
    pub install: InstallArgs,
}

/// Shows where the game would read a file from and what it decodes to.
///
/// Nothing in the installation is written; with `output` the decoded content
/// is saved to that file.
pub fn resolve_asset(args: ResolveArgs) -> Result<()> {
    let settings = resolve_settings(&args.install)?;
    let game_dir = settings.game_dir.clone();
    let mut manager = FileManager::new(settings).map_err(CliError::from)?;

    let file = manager.load(args.path.as_str()).map_err(CliError::from)?;

    println_pad!(
        "{} {}",
        "🔎 Asset:".bright_blue().bold(),
        file.virtual_path().as_str().bright_cyan().bold()
    );

    if let Some(source) = file.source() {
        let tier = match source.tier {
            SourceTier::Override => "override folder",
            SourceTier::Loose => "loose file",
            SourceTier::Catalog => "catalog",
        };
        println_pad!("{} {}", "📍 Source:".bright_green(), tier.bright_white().bold());
        println_pad!(
            "{} {}",
            "📁 Location:".bright_green(),
            display_relative(&source.physical_path, &game_dir)
        );
        println_pad!(
            "{} {}{}",
            "🏷️ Stored as:".bright_green(),
            source.stored_as.as_str().bright_white(),
            if source.compressed { " (compressed)" } else { "" }
        );
    }

    match file.kind() {
        GameFileKind::RecordTable(table) => println_pad!(
            "{} {:?} table, {} records{}",
            "📝 Content:".bright_yellow(),
            table.format(),
            table.len(),
            table
                .layout_name()
                .map(|name| format!(", layout {}", name))
                .unwrap_or_default()
        ),
        GameFileKind::FreeformText(text) => println_pad!(
            "{} text, {}, {} characters",
            "📝 Content:".bright_yellow(),
            text.encoding_name(),
            text.text().chars().count()
        ),
        GameFileKind::RawBinary(bytes) => println_pad!(
            "{} binary, {}",
            "📝 Content:".bright_yellow(),
            human_size(bytes.len() as u64)
        ),
    }

    if let Some(output) = args.output {
        let output = Utf8PathBuf::from(output);
        let bytes = file.serialize().map_err(CliError::from)?;
        if let Some(parent) = output.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CliError::directory_creation_failed(parent, e))?;
        }
        fs::write(&output, &bytes).map_err(CliError::from)?;
        println_pad!(
            "{} {}",
            "✅ Saved to".bright_green().bold(),
            output.as_str().bright_white().bold()
        );
    }

    Ok(())
}
