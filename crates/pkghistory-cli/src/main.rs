mod cmd_attributes;
mod cmd_bottles;
mod cmd_revisions;
mod target;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use target::{Backend, Target, WalkOptions};

#[derive(Parser, Debug)]
#[command(name = "pkghistory")]
#[command(about = "Inspect the history of a package definition file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Log skipped revisions and git commands
    #[arg(long, global = true)]
    debug: bool,

    /// How to read git history
    #[arg(long, global = true, value_enum, default_value_t = Backend::Git)]
    backend: Backend,

    /// Stop after more than this many distinct versions
    #[arg(long, global = true, default_value_t = pkghistory::MAX_VERSIONS_DEPTH)]
    depth: usize,

    /// Tolerate deprecated features in old revisions instead of skipping them
    #[arg(long, global = true)]
    no_strict_deprecations: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the revisions that changed the file, with the version each declares
    Revisions {
        #[command(flatten)]
        target: Target,
    },
    /// Bottle rebuild numbers per package version
    Bottles {
        #[command(flatten)]
        target: Target,
    },
    /// Historical attribute values per release channel and version
    Attributes {
        #[command(flatten)]
        target: Target,

        /// Attribute to collect (repeatable)
        #[arg(short, long = "attr")]
        attributes: Vec<String>,
    },
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let options = WalkOptions {
        backend: cli.backend,
        depth: cli.depth,
        strict_deprecations: !cli.no_strict_deprecations,
        pretty: cli.pretty,
    };

    match cli.command {
        Commands::Revisions { target } => cmd_revisions::run(target, &options),
        Commands::Bottles { target } => cmd_bottles::run(target, &options),
        Commands::Attributes { target, attributes } => {
            cmd_attributes::run(target, attributes, &options)
        }
    }
}
