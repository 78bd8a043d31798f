//! OxiPack CLI
//!
//! Pack files with Huffman, RLE, tar, tgz or solid rar containers, unpack
//! and list them, or serve the HTTP API.

mod commands;
mod utils;

use clap::{ArgAction, Parser, Subcommand};
use commands::{
    CreateOptions, ExtractOptions, ListOptions, cmd_create, cmd_extract, cmd_list, cmd_serve,
};
use oxipack_core::Algorithm;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oxipack")]
#[command(author, version, about = "OxiPack - Pure Rust multi-format packer")]
#[command(long_about = "
OxiPack packs files with Huffman, RLE, or an LZ77 + Huffman stream.
Algorithms: huffman (.huf), rle (.rle), tar (.tar), tgz (.tgz), rar (.rar)

Examples:
  oxipack create notes.huf notes.txt todo.txt
  oxipack create -a rar -l 9 out/ *.log
  oxipack list -v bundle.tgz
  oxipack extract bundle.rar -o restored
  oxipack serve --bind 0.0.0.0:5000
")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbosity: u8,

    /// JSON config file (server and engine settings)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new archive
    #[command(alias = "c")]
    Create {
        /// Output archive file, or a directory to use the generated name
        output: PathBuf,

        /// Files to add to the archive
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Algorithm (huffman, rle, tar, tgz, rar); inferred from the output extension
        #[arg(short, long)]
        algorithm: Option<Algorithm>,

        /// Compression level, 1 (fast) to 9 (best); out-of-range values are clamped
        #[arg(short, long, default_value_t = 5)]
        level: u8,

        /// Worker threads for per-file encoding (0 = one per core)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Extract files from an archive
    #[command(alias = "x")]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Algorithm, when the extension does not tell
        #[arg(short, long)]
        algorithm: Option<Algorithm>,

        /// Include only entries matching pattern (glob syntax: *.txt)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// List contents of an archive
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Algorithm, when the extension does not tell
        #[arg(short, long)]
        algorithm: Option<Algorithm>,

        /// Show sizes and codecs
        #[arg(short, long)]
        long: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Include only entries matching pattern (glob syntax: *.txt)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },

    /// Serve the HTTP API
    Serve {
        /// Address to bind, overriding the config file
        #[arg(short, long)]
        bind: Option<String>,

        /// Largest accepted upload in bytes, overriding the config file
        #[arg(long)]
        max_payload: Option<u64>,
    },
}

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = utils::load_config(cli.config.as_deref())?;
    let verbose = cli.verbosity > 0;

    match cli.command {
        Commands::Create {
            output,
            files,
            algorithm,
            level,
            workers,
            quiet,
        } => {
            if let Some(workers) = workers {
                config.engine.workers = workers;
            }
            cmd_create(
                &CreateOptions {
                    output: &output,
                    files: &files,
                    algorithm,
                    level,
                    progress: !quiet,
                    verbose,
                },
                config.engine,
            )
        }
        Commands::Extract {
            archive,
            output,
            algorithm,
            include,
            exclude,
            quiet,
        } => cmd_extract(&ExtractOptions {
            archive: &archive,
            output: &output,
            algorithm,
            include: &include,
            exclude: &exclude,
            progress: !quiet,
            verbose,
        })
        .map(|_| ()),
        Commands::List {
            archive,
            algorithm,
            long,
            json,
            include,
            exclude,
        } => cmd_list(&ListOptions {
            archive: &archive,
            algorithm,
            verbose: long,
            json,
            include: &include,
            exclude: &exclude,
        }),
        Commands::Serve { bind, max_payload } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(limit) = max_payload {
                config.engine.max_payload_bytes = limit;
                config.engine.validate()?;
            }
            cmd_serve(config)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
