use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::{resolve_settings, InstallArgs};
use crate::utils::{display_relative, human_size};
use camino::Utf8PathBuf;
use colored::Colorize;
use miette::Result;
use x3_catalog::{discover_pairs, CatalogPair};

pub struct ListArgs {
    pub cat_path: Option<String>,
    pub install: InstallArgs,
}

pub fn list_catalogs(args: ListArgs) -> Result<()> {
    match args.cat_path {
        Some(cat_path) => list_entries(Utf8PathBuf::from(cat_path)),
        None => list_installation(&args.install),
    }
}

/// Prints every entry of one catalog pair.
fn list_entries(cat_path: Utf8PathBuf) -> Result<()> {
    if !cat_path.is_file() {
        return Err(CliError::file_not_found(cat_path).into());
    }

    let mut pair = CatalogPair::open(cat_path.clone());
    let index = pair.index().map_err(CliError::from)?;

    println_pad!(
        "{} {} {}",
        "📦 Catalog:".bright_blue().bold(),
        cat_path.as_str().bright_cyan().bold(),
        format!("(data: {})", index.data_name()).dimmed()
    );
    for entry in index.entries() {
        println_pad!(
            "   {:>10}  {}",
            human_size(entry.length).dimmed(),
            entry.path.bright_white()
        );
    }
    println_pad!(
        "\n{} {} entries, {}",
        "Σ".bright_magenta().bold(),
        index.len(),
        human_size(index.data_len())
    );
    Ok(())
}

/// Prints the catalog pairs of both tiers in lookup order.
fn list_installation(install: &InstallArgs) -> Result<()> {
    let settings = resolve_settings(install)?;
    settings.validate().map_err(CliError::from)?;

    let tiers = [
        ("Primary", settings.primary_dir()),
        ("Secondary", settings.secondary_dir().to_path_buf()),
    ];

    let mut broken = Vec::new();
    for (name, dir) in tiers {
        let pairs = discover_pairs(&dir);
        println_pad!(
            "\n{} {} {}",
            format!("🗂️  {} tier:", name).bright_magenta().bold(),
            dir.as_str().bright_white(),
            format!("({} pairs)", pairs.len()).dimmed()
        );

        for mut pair in pairs {
            let shown = display_relative(pair.cat_path(), &settings.game_dir);
            match pair.index() {
                Ok(index) => println_pad!(
                    "   {} {} {}",
                    "•".bright_cyan(),
                    shown.as_str().bright_cyan().bold(),
                    format!("{} entries, {}", index.len(), human_size(index.data_len())).dimmed()
                ),
                Err(e) => {
                    println_pad!(
                        "   {} {} {}",
                        "✗".bright_red(),
                        shown.as_str().bright_red().bold(),
                        e.to_string().dimmed()
                    );
                    broken.push(e.to_string());
                }
            }
        }
    }

    if let Some(message) = broken.into_iter().next() {
        return Err(CliError::InvalidInstallation { message }.into());
    }
    Ok(())
}
