//! Info command - print the cartridge header

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use nitro_rom::{FileProvider, MountOptions, NdsFileProvider};

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs {
    /// ROM image (.nds)
    pub rom: PathBuf,
}

/// Execute the info command
pub fn execute(args: InfoArgs, options: &MountOptions) -> Result<()> {
    let rom = crate::open_rom(&args.rom, options)?;
    print!("{}", render(&rom)?);
    Ok(())
}

fn render(rom: &NdsFileProvider) -> Result<String> {
    let header = rom.header();
    let crc = if header.checksum_valid(rom.image()) {
        "ok"
    } else {
        "MISMATCH"
    };
    let arm9_overlays = rom.arm9_overlays()?.len();
    let arm7_overlays = rom.arm7_overlays()?.len();

    let mut out = String::new();
    out.push_str("=== ROM Header ===\n");
    out.push_str(&format!("  Title:       {}\n", header.title));
    out.push_str(&format!("  Game code:   {}\n", header.game_code));
    out.push_str(&format!("  Maker code:  {}\n", header.maker_code));
    out.push_str(&format!("  Version:     {}\n", header.rom_version));
    out.push_str(&format!("  Header CRC:  0x{:04X} ({crc})\n", header.header_crc));
    out.push_str(&format!(
        "  Used size:   {} bytes of {}\n",
        header.total_used_rom_size,
        rom.image().len()
    ));
    out.push_str("=== Tables ===\n");
    out.push_str(&format!(
        "  FAT slots:   {} ({} live)\n",
        rom.allocation_table().len(),
        rom.allocation_table().live_count()
    ));
    out.push_str(&format!(
        "  Named:       {} (first ID {})\n",
        rom.name_table().len(),
        rom.name_table().first_id()
    ));
    out.push_str(&format!("  Overlays:    {arm9_overlays} ARM9, {arm7_overlays} ARM7\n"));
    out.push_str(&format!("  Mounted:     {} files\n", rom.files().len()));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nitro_rom::test_utils::{NameTableBuilder, RomBuilder};

    #[test]
    fn test_render_summary() {
        let mut names = NameTableBuilder::new(1);
        names.file(0, "a.bin");
        let image = RomBuilder::new(names)
            .title("SAMPLE")
            .slot(b"overlay")
            .slot(b"a")
            .arm9_overlay(0, 0)
            .build();
        let rom = NdsFileProvider::initialize(image, &MountOptions::default()).unwrap();

        let text = render(&rom).unwrap();
        assert!(text.contains("Title:       SAMPLE"));
        assert!(text.contains("(ok)"));
        assert!(text.contains("FAT slots:   2 (2 live)"));
        assert!(text.contains("Overlays:    1 ARM9, 0 ARM7"));
        assert!(text.contains("Mounted:     2 files"));
    }
}
