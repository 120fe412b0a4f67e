//! Main entry point for the shapepack CLI application.
//!
//! This binary inspects shapefile triads, unpacks ZIP archives into
//! grouped triads, and bundles files into new archives.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use shapepack::archive::{self, GroupingPolicy};
use shapepack::cli::{Cli, Command};
use shapepack::shapefile::{FileTriad, ShapeEntry};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Info { shp, verbose } => info(shp, *verbose, &cli),
        Command::Unpack { zip, strict } => unpack(zip, *strict, &cli),
        Command::Pack {
            name,
            files,
            output_dir,
        } => pack(name, files, output_dir.as_deref(), &cli),
    }
}

/// Read a triad and print a summary, or every entry in verbose mode.
fn info(shp: &Path, verbose: bool, cli: &Cli) -> Result<()> {
    let triad = FileTriad::from_shp_path(shp);
    let entries = triad.read()?;

    if !cli.is_very_quiet() {
        print_summary(&triad, &entries);
    }
    if verbose {
        for entry in &entries {
            print_entry(entry);
        }
    }
    Ok(())
}

fn print_summary(triad: &FileTriad, entries: &[ShapeEntry]) {
    let shape_type = entries
        .iter()
        .map(|e| e.geometry.shape_type())
        .find(|t| *t != shapepack::ShapeType::Null)
        .unwrap_or(shapepack::ShapeType::Null);

    println!("{}: {} shapes ({shape_type})", triad.base_name, entries.len());

    let mut bounds = shapepack::Bounds::new();
    for entry in entries {
        entry.geometry.fold_bounds(&mut bounds);
    }
    let bounds = bounds.finish();
    println!(
        "  extent: [{}, {}] x [{}, {}]",
        bounds.x_min, bounds.y_min, bounds.x_max, bounds.y_max
    );

    if let Some(first) = entries.first() {
        let names: Vec<&str> = first.record.field_names().collect();
        println!("  fields: {}", names.join(", "));
    }
}

fn print_entry(entry: &ShapeEntry) {
    println!(
        "{:>6}  {} ({} parts, {} points)",
        entry.number,
        entry.geometry.shape_type(),
        entry.geometry.part_count(),
        entry.geometry.point_count()
    );
    for (name, value) in entry.record.iter() {
        println!("        {name} = {value}");
    }
}

/// Extract an archive and report the triads found inside.
fn unpack(zip: &Path, strict: bool, cli: &Cli) -> Result<()> {
    let policy = if strict {
        GroupingPolicy::Strict
    } else {
        GroupingPolicy::Lenient
    };
    let triads = archive::extract_and_group_with(zip, policy)?;

    for triad in &triads {
        if !cli.is_quiet() {
            println!("  extracted: {} -> {}", triad.base_name, triad.shp.display());
        }
    }
    if !cli.is_very_quiet() {
        println!("{} dataset(s)", triads.len());
    }
    Ok(())
}

/// Bundle files into an archive.
fn pack(name: &str, files: &[std::path::PathBuf], output_dir: Option<&Path>, cli: &Cli) -> Result<()> {
    let out = output_dir.unwrap_or(Path::new("."));
    let zip_path = archive::create_archive(out, name, files)?;
    if !cli.is_very_quiet() {
        println!("created {} ({} files)", zip_path.display(), files.len());
    }
    Ok(())
}
