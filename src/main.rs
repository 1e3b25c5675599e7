use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use trimfat::boot_sector::BootSector;
use trimfat::fat::Fat;
use trimfat::human::{format_pow2_size, format_size};

/// Trims the given filesystem image. Only FAT32 is supported.
#[derive(Parser, Debug)]
#[command(name = "trimfat", version)]
struct Args {
    /// FAT32 image file or block device to trim
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// Print every FAT entry before trimming
    #[arg(long = "dump-fat")]
    dump_fat: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // create if absent, never truncate on open; trimming happens last
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&args.image)
        .with_context(|| format!("cannot open {}", args.image.display()))?;

    if args.dump_fat {
        let boot = BootSector::read(&mut file)?;
        for index in 0..boot.num_fats() {
            println!("FAT{index}:");
            Fat::read(&mut file, &boot, index)?.dump(&mut std::io::stdout())?;
        }
    }

    let plan = trimfat::trim::plan(&mut file)?;
    println!("Image size: {}", format_size(plan.image_size));
    println!("Highest cluster found: {}", plan.last_cluster);
    println!(
        "Image can be trimmed from sector {} (one sector is {})",
        plan.first_free_sector,
        format_pow2_size(plan.sector_size as u64)
    );
    println!(
        "New image file size will be {} (saves {})",
        format_size(plan.new_size),
        format_size(plan.saved())
    );

    println!("Truncating {}...", args.image.display());
    file.set_len(plan.new_size)
        .with_context(|| format!("cannot truncate {}", args.image.display()))?;

    Ok(())
}
