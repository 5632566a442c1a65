//! Narc command - list the contents of a nested archive

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use nitro_rom::{FileProvider, MountOptions};

/// Arguments for the narc command
#[derive(Args)]
pub struct NarcArgs {
    /// ROM image (.nds)
    pub rom: PathBuf,

    /// Mounted name of the archive (e.g., "a/0/1/2.narc")
    pub name: String,
}

/// Execute the narc command
pub fn execute(args: NarcArgs, options: &MountOptions) -> Result<()> {
    let rom = crate::open_rom(&args.rom, options)?;
    let narc = rom
        .load_narc(&args.name)
        .with_context(|| format!("Failed to open archive {}", args.name))?;

    println!(
        "=== {} ({} files, {}) ===",
        args.name,
        narc.files().len(),
        if narc.is_anonymous() { "unnamed" } else { "named" }
    );
    for line in crate::ls::listing(&narc, None, true) {
        println!("{line}");
    }
    Ok(())
}
