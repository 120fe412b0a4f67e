use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shapepack")]
#[command(version)]
#[command(about = "Inspect, pack and unpack shapefile datasets", long_about = None)]
#[command(after_help = "Examples:\n  \
  shapepack info parcels.shp -v              show shapes and attributes\n  \
  shapepack unpack survey.zip                extract and group into triads\n  \
  shapepack pack survey a.shp a.shx a.dbf    bundle files into survey.zip")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', global = true, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a shapefile triad and print a summary
    Info {
        /// Path to the .shp file (.shx and .dbf are found next to it)
        #[arg(value_name = "FILE")]
        shp: PathBuf,

        /// List every shape and its attribute record
        #[arg(short = 'v')]
        verbose: bool,
    },

    /// Extract a ZIP archive and group its contents into triads
    Unpack {
        /// Path to the ZIP archive
        #[arg(value_name = "ARCHIVE")]
        zip: PathBuf,

        /// Fail if any base name is missing part of its triad
        #[arg(long)]
        strict: bool,
    },

    /// Bundle files into a ZIP archive
    Pack {
        /// Archive name (".zip" is appended if absent)
        #[arg(value_name = "NAME")]
        name: String,

        /// Files to include
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Write the archive into DIR instead of the current directory
        #[arg(short = 'd', value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}
