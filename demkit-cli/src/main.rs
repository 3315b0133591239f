use anyhow::Result;
use clap::{Parser, Subcommand};
use demkit::Scoring;
use std::path::PathBuf;

mod commands;

/// DEM elevation lookup and resampling comparison tool
#[derive(Parser)]
#[command(name = "demkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing DEM tiles (.hgt, .tif)
    #[arg(short, long, env = "DEMKIT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Maximum tiles in cache
    #[arg(
        short,
        long,
        env = "DEMKIT_CACHE_SIZE",
        default_value = "100",
        global = true
    )]
    cache_size: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query elevation for a single coordinate
    Query {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Read this raster instead of the data directory
        #[arg(short, long)]
        raster: Option<PathBuf>,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Process elevation for multiple coordinates from a file
    Batch {
        /// Input file (CSV or GeoJSON)
        input: PathBuf,

        /// Output file (same format as input if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude (CSV only)
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude (CSV only)
        #[arg(long, default_value = "lon")]
        lon_col: String,
    },

    /// Display information about a DEM raster
    Info {
        /// Path to a .hgt or .tif file
        #[arg(required_unless_present_all = ["lat", "lon"])]
        raster: Option<PathBuf>,

        /// Find the tile covering this latitude in the data directory
        #[arg(long, requires = "lon", conflicts_with = "raster", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Find the tile covering this longitude in the data directory
        #[arg(long, requires = "lat", conflicts_with = "raster", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// List tiles in the data directory
    List,

    /// Rank resampling methods by accuracy
    Compare {
        /// Raster to evaluate
        #[arg(required_unless_present = "synthetic")]
        raster: Option<PathBuf>,

        /// Evaluate a synthetic SIZE x SIZE surface instead of a raster
        #[arg(long, value_name = "SIZE", conflicts_with = "raster")]
        synthetic: Option<usize>,

        /// Downsampling factor
        #[arg(short, long, default_value = "4")]
        factor: usize,

        /// How estimates are matched with ground truth (footprint, center)
        #[arg(short, long, default_value = "footprint")]
        scoring: Scoring,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    commands::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Query {
            lat,
            lon,
            raster,
            json,
        } => commands::query::run(cli.data_dir, cli.cache_size, raster, lat, lon, json),
        Commands::Batch {
            input,
            output,
            lat_col,
            lon_col,
        } => commands::batch::run(
            cli.data_dir,
            cli.cache_size,
            input,
            output,
            lat_col,
            lon_col,
        ),
        Commands::Info { raster, lat, lon } => commands::info::run(cli.data_dir, raster, lat, lon),
        Commands::List => commands::list::run(cli.data_dir, cli.cache_size),
        Commands::Compare {
            raster,
            synthetic,
            factor,
            scoring,
            json,
        } => commands::compare::run(raster, synthetic, factor, scoring, json),
    }
}
