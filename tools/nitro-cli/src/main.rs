//! Nitro CLI - inspect Nintendo DS ROM images
//!
//! # Commands
//!
//! - `nitro info` - Print the cartridge header and table statistics
//! - `nitro ls` - List mounted file names
//! - `nitro cat` - Write one file's bytes to stdout or a file
//! - `nitro narc` - List the contents of a NARC archive inside the ROM
//!
//! # Usage
//!
//! ```bash
//! nitro info game.nds
//! nitro ls game.nds --prefix a/0/
//! nitro cat game.nds overlays/0.bin --output ov0.bin
//! nitro narc game.nds a/0/1/2.narc
//!
//! # Mount options from a file
//! nitro --config nitro.toml ls game.nds
//! ```
//!
//! Set `RUST_LOG=debug` to see mount statistics.

mod cat;
mod info;
mod ls;
mod narc;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nitro_rom::{MountOptions, NdsFileProvider};

/// Nitro CLI - inspect Nintendo DS ROM images
#[derive(Parser)]
#[command(name = "nitro")]
#[command(about = "Inspect and extract files from Nintendo DS ROM images")]
#[command(version)]
struct Cli {
    /// Mount options (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cartridge header and table statistics
    Info(info::InfoArgs),

    /// List mounted file names
    Ls(ls::LsArgs),

    /// Write one file's bytes to stdout or a file
    Cat(cat::CatArgs),

    /// List the contents of a NARC archive inside the ROM
    Narc(narc::NarcArgs),
}

fn main() -> Result<()> {
    // Logs go to stderr so `cat` output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let options = load_options(cli.config.as_deref())?;

    match cli.command {
        Commands::Info(args) => info::execute(args, &options),
        Commands::Ls(args) => ls::execute(args, &options),
        Commands::Cat(args) => cat::execute(args, &options),
        Commands::Narc(args) => narc::execute(args, &options),
    }
}

fn load_options(path: Option<&Path>) -> Result<MountOptions> {
    match path {
        Some(path) => MountOptions::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(MountOptions::default()),
    }
}

/// Open and mount a ROM, with the path in the error context.
pub(crate) fn open_rom(path: &Path, options: &MountOptions) -> Result<NdsFileProvider> {
    NdsFileProvider::open(path, options)
        .with_context(|| format!("Failed to mount {}", path.display()))
}
