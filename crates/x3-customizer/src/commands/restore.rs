use super::run::apply;
use crate::println_pad;
use crate::utils::config::{resolve_settings, InstallArgs};
use colored::Colorize;
use miette::Result;

pub struct RestoreArgs {
    pub install: InstallArgs,
}

/// Removes every file earlier runs wrote and puts the user's originals back.
pub fn restore(args: RestoreArgs) -> Result<()> {
    let mut settings = resolve_settings(&args.install)?;
    // Without overrides nothing is claimed, so every prior output is undone.
    settings.override_dir = None;

    println_pad!(
        "{} {}",
        "♻️  Restoring:".bright_blue().bold(),
        settings.game_dir.as_str().bright_cyan().bold()
    );

    apply(settings)
}
