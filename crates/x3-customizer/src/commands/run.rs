use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::{resolve_settings, InstallArgs};
use crate::utils::display_relative;
use camino::Utf8Path;
use colored::Colorize;
use miette::Result;
use x3_mod_core::{FileManager, LoadFailure, Settings, WriteProgress, WriteReport, WriteStage};

pub struct RunArgs {
    pub install: InstallArgs,
}

/// Applies the override folder to the installation, cleaning up whatever a
/// previous run left behind that is no longer produced.
pub fn run(args: RunArgs) -> Result<()> {
    let settings = resolve_settings(&args.install)?;

    println_pad!(
        "{} {}",
        "🛠️  Customizing:".bright_blue().bold(),
        settings.game_dir.as_str().bright_cyan().bold()
    );
    match &settings.override_dir {
        Some(dir) => println_pad!(
            "{} {}",
            "📁 Override folder:".bright_yellow(),
            dir.as_str().bright_white().bold()
        ),
        None => println_pad!(
            "{}",
            "No override folder set; only cleanup of earlier runs will happen".dimmed()
        ),
    }

    apply(settings)
}

/// Writes everything the manager produces and prints the outcome.
pub(crate) fn apply(settings: Settings) -> Result<()> {
    let game_dir = settings.game_dir.clone();
    let mut manager = FileManager::new(settings)
        .map_err(CliError::from)?
        .with_progress(print_progress);

    let report = manager.write_all().map_err(CliError::from)?;

    print_load_failures(manager.failures());
    print_report(&report, &game_dir);

    if let Some(failure) = manager.failures().iter().find(|f| f.configuration) {
        return Err(CliError::InvalidInstallation {
            message: failure.reason.clone(),
        }
        .into());
    }
    if !report.is_success() {
        return Err(CliError::WriteFailures {
            count: report.failed.len(),
        }
        .into());
    }

    println_pad!("{}", "✅ Done!".bright_green().bold());
    Ok(())
}

fn print_progress(progress: WriteProgress) {
    match progress.stage {
        WriteStage::CopyingOverrides => println_pad!(
            "{} {} files",
            "📥 Copying overrides:".bright_yellow(),
            progress.total
        ),
        WriteStage::Cleanup => {
            println_pad!("{}", "🧹 Cleaning up previous run...".bright_yellow())
        }
        WriteStage::Writing => {
            tracing::debug!(
                "[{}/{}] {}",
                progress.current,
                progress.total,
                progress.current_file.unwrap_or_default()
            );
        }
        WriteStage::Complete => {}
    }
}

fn print_load_failures(failures: &[LoadFailure]) {
    if failures.is_empty() {
        return;
    }

    println_pad!("\n{}", "⚠️  Load failures:".bright_red().bold());
    for failure in failures {
        println_pad!(
            "   {} {} {}",
            "•".bright_red(),
            failure.path.as_str().bright_white(),
            format!("({})", failure.reason).dimmed()
        );
    }
}

pub(crate) fn print_report(report: &WriteReport, game_dir: &Utf8Path) {
    let sections = [
        ("📝 Written:", &report.written),
        ("📦 Moved aside:", &report.renamed),
        ("🗑️  Removed:", &report.removed),
        ("♻️  Restored:", &report.restored),
    ];

    for (title, paths) in sections {
        if paths.is_empty() {
            continue;
        }
        println_pad!(
            "\n{} {}",
            title.bright_magenta().bold(),
            paths.len().to_string().bright_white().bold()
        );
        for path in paths {
            println_pad!(
                "   {} {}",
                "•".bright_cyan(),
                display_relative(path, game_dir)
            );
        }
    }

    if !report.failed.is_empty() {
        println_pad!("\n{}", "❌ Failed:".bright_red().bold());
        for failure in &report.failed {
            println_pad!(
                "   {} {} {}",
                "•".bright_red(),
                display_relative(&failure.path, game_dir),
                format!("({})", failure.reason).dimmed()
            );
        }
    }

    let nothing_happened = report.written.is_empty()
        && report.removed.is_empty()
        && report.restored.is_empty()
        && report.failed.is_empty();
    if nothing_happened {
        println_pad!("\n{}", "Nothing to do".dimmed());
    }
}
