use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    list_catalogs, pack_catalog, resolve_asset, restore, run, show_config, unpack_catalog,
    ListArgs, PackCatalogArgs, ResolveArgs, RestoreArgs, RunArgs, UnpackArgs,
};
use miette::Result;
use utils::config::InstallArgs;

mod commands;
mod errors;
mod utils;

const DEFAULT_LOG_FILTER: &str = "x3_customizer=info,x3_mod_core=info,x3_catalog=warn";
const VERBOSE_LOG_FILTER: &str = "x3_customizer=debug,x3_mod_core=debug,x3_catalog=debug";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Log per-file detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    install: InstallArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the override folder into the installation and clean up after earlier runs
    Run,
    /// Remove everything earlier runs wrote and restore the files they moved aside
    Restore,
    /// Show where a file is read from and what it decodes to
    Resolve {
        /// Installation-relative path, e.g. types/TShips.txt
        path: String,

        /// Save the decoded content to this file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Extract the files of a catalog pair
    Unpack {
        /// The path to the .cat file
        cat_path: String,

        /// The directory to extract to (defaults to the .cat name without extension)
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Decompress .pck/.pbd/.pbb entries and write them under their plain name
        #[arg(short, long)]
        decompress: bool,

        /// Only extract entries under this top-level folder
        #[arg(short, long)]
        folder: Option<String>,
    },
    /// Pack a directory into a new catalog pair
    Pack {
        /// The directory whose contents become the catalog entries
        input_dir: String,

        /// The directory to write the pair to
        #[arg(short, long, default_value = ".")]
        output_dir: String,

        /// Pair number (defaults to the next free number in the output directory)
        #[arg(short, long)]
        number: Option<u32>,

        /// Store text and model files in their compressed form
        #[arg(short, long)]
        compress: bool,

        /// Replace an existing pair with the same number
        #[arg(long)]
        force: bool,
    },
    /// List the entries of a catalog pair, or every pair of the installation
    List {
        /// The path to a .cat file
        cat_path: Option<String>,
    },
    /// Show the configuration in use
    Config,
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(args.verbose);

    let install = args.install;
    match args.command {
        Commands::Run => run(RunArgs { install }),
        Commands::Restore => restore(RestoreArgs { install }),
        Commands::Resolve { path, output } => resolve_asset(ResolveArgs {
            path,
            output,
            install,
        }),
        Commands::Unpack {
            cat_path,
            output_dir,
            decompress,
            folder,
        } => unpack_catalog(UnpackArgs {
            cat_path,
            output_dir,
            decompress,
            folder,
        }),
        Commands::Pack {
            input_dir,
            output_dir,
            number,
            compress,
            force,
        } => pack_catalog(PackCatalogArgs {
            input_dir,
            output_dir,
            number,
            compress,
            force,
        }),
        Commands::List { cat_path } => list_catalogs(ListArgs { cat_path, install }),
        Commands::Config => show_config(&install),
    }
}
