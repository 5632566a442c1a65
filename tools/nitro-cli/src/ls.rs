//! Ls command - list mounted file names

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use nitro_rom::{FileProvider, MountOptions};

/// Arguments for the ls command
#[derive(Args)]
pub struct LsArgs {
    /// ROM image (.nds)
    pub rom: PathBuf,

    /// Only list names starting with this prefix (e.g., "overlays/")
    #[arg(long)]
    pub prefix: Option<String>,

    /// Also print file ID and size
    #[arg(short, long)]
    pub long: bool,
}

/// Execute the ls command
pub fn execute(args: LsArgs, options: &MountOptions) -> Result<()> {
    let rom = crate::open_rom(&args.rom, options)?;
    for line in listing(&rom, args.prefix.as_deref(), args.long) {
        println!("{line}");
    }
    Ok(())
}

/// Sorted listing lines for every name matching `prefix`.
pub(crate) fn listing(provider: &impl FileProvider, prefix: Option<&str>, long: bool) -> Vec<String> {
    provider
        .list_names()
        .into_iter()
        .filter(|name| prefix.is_none_or(|p| name.starts_with(p)))
        .filter_map(|name| provider.files().get(name))
        .map(|file| {
            if long {
                format!("{:>5} {:>10}  {}", file.id, file.len(), file.name)
            } else {
                file.name.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nitro_rom::NdsFileProvider;
    use nitro_rom::test_utils::{NameTableBuilder, RomBuilder};

    fn rom() -> NdsFileProvider {
        let mut names = NameTableBuilder::new(1);
        let data = names.dir(0, "data");
        names.file(data, "b.bin");
        names.file(data, "a.bin");
        let image = RomBuilder::new(names)
            .slot(b"ovl")
            .slot(b"bb")
            .slot(b"aaaa")
            .build();
        NdsFileProvider::initialize(image, &MountOptions::default()).unwrap()
    }

    #[test]
    fn test_listing_is_sorted() {
        assert_eq!(
            listing(&rom(), None, false),
            vec!["data/a.bin", "data/b.bin", "overlays/0.bin"]
        );
    }

    #[test]
    fn test_listing_prefix() {
        assert_eq!(listing(&rom(), Some("overlays/"), false), vec!["overlays/0.bin"]);
        assert!(listing(&rom(), Some("nope/"), false).is_empty());
    }

    #[test]
    fn test_long_listing() {
        let lines = listing(&rom(), Some("data/a"), true);
        assert_eq!(lines, vec![format!("{:>5} {:>10}  data/a.bin", 2, 4)]);
    }
}
