//! Cat command - extract one file

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use nitro_rom::{FileProvider, MountOptions};

/// Arguments for the cat command
#[derive(Args)]
pub struct CatArgs {
    /// ROM image (.nds)
    pub rom: PathBuf,

    /// Mounted file name (as printed by `nitro ls`)
    pub name: String,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the cat command
pub fn execute(args: CatArgs, options: &MountOptions) -> Result<()> {
    let rom = crate::open_rom(&args.rom, options)?;
    let bytes = rom.read_bytes(&args.name)?;

    match &args.output {
        Some(path) => write_output(path, bytes)?,
        None => std::io::stdout()
            .lock()
            .write_all(bytes)
            .context("Failed to write to stdout")?,
    }
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "Extracted file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nitro_rom::test_utils::{NameTableBuilder, RomBuilder};

    #[test]
    fn test_extract_to_file() {
        let mut names = NameTableBuilder::new(0);
        let data = names.dir(0, "data");
        names.file(data, "hello.txt");

        let dir = tempfile::tempdir().unwrap();
        let rom_path = dir.path().join("game.nds");
        std::fs::write(&rom_path, RomBuilder::new(names).slot(b"hi there").build()).unwrap();

        let out = dir.path().join("out/nested/hello.txt");
        execute(
            CatArgs {
                rom: rom_path,
                name: "data/hello.txt".to_string(),
                output: Some(out.clone()),
            },
            &MountOptions::default(),
        )
        .unwrap();

        assert_eq!(std::fs::read(out).unwrap(), b"hi there");
    }

    #[test]
    fn test_unknown_name_fails() {
        let mut names = NameTableBuilder::new(0);
        names.file(0, "a.bin");

        let dir = tempfile::tempdir().unwrap();
        let rom_path = dir.path().join("game.nds");
        std::fs::write(&rom_path, RomBuilder::new(names).slot(b"a").build()).unwrap();

        let err = execute(
            CatArgs {
                rom: rom_path,
                name: "b.bin".to_string(),
                output: Some(dir.path().join("b.bin")),
            },
            &MountOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("file not found: b.bin"));
    }
}
