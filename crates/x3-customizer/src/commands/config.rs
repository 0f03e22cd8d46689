use crate::utils::config::{self, InstallArgs};
use camino::Utf8Path;
use colored::Colorize;
use miette::Result;

/// Print a config path entry with status indicator
fn print_path_config(name: &str, path: Option<&Utf8Path>, validator: impl Fn(&Utf8Path) -> bool) {
    match path {
        Some(p) => {
            let status = if validator(p) {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            println!("  {} {} {}", format!("{}:", name).bright_white(), p, status);
        }
        None => {
            println!(
                "  {} {}",
                format!("{}:", name).bright_white(),
                "(not set)".bright_yellow()
            );
        }
    }
}

/// Shows the configuration file in use and the settings a run would get.
pub fn show_config(args: &InstallArgs) -> Result<()> {
    let (cfg, config_path) = config::load_config(args)?;
    let config_path = config_path
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let cfg = cfg.merge(args);

    println!();
    println!("  {} {}", "config_file:".bright_white(), config_path);

    let settings = match cfg.into_settings() {
        Ok(settings) => settings,
        Err(_) => {
            print_path_config("game_dir", None, |_| false);
            println!();
            return Ok(());
        }
    };

    let install_ok = settings.validate().is_ok();
    print_path_config("game_dir", Some(settings.game_dir.as_path()), |_| install_ok);
    print_path_config("override_dir", settings.override_dir.as_deref(), |p| {
        p.is_dir()
    });
    print_path_config("primary_folder", Some(settings.primary_dir().as_path()), |p| {
        p.is_dir()
    });
    println!(
        "  {} {}",
        "ignore_loose_files:".bright_white(),
        settings.ignore_loose_files
    );
    print_path_config("log_file", Some(settings.log_path().as_path()), |p| p.is_file());

    println!();
    Ok(())
}
