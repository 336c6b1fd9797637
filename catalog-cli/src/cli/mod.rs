//! Command-line surface

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "catalog-cli",
    about = "Operator tool for bulk product catalog imports",
    version
)]
pub struct Cli {
    /// Path to a TOML config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Enrich the product spreadsheet with dataset images, then upload it
    Enrich(EnrichArgs),
    /// Attach images from the web image search API instead of the dataset
    FetchImages(FetchImagesArgs),
    /// Clean the spreadsheet and bulk-upload its rows as JSON
    Upload(UploadArgs),
    /// Delete every product currently in the backend
    Purge(PurgeArgs),
    /// Push spreadsheet price/discount values onto existing products
    UpdatePrices(UpdatePricesArgs),
}

#[derive(Debug, clap::Args)]
pub struct EnrichArgs {
    /// Input spreadsheet (defaults to <data_dir>/products.xlsx)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Run the pipeline but stop before the upload and verification steps
    #[arg(long)]
    pub skip_upload: bool,
}

#[derive(Debug, clap::Args)]
pub struct FetchImagesArgs {
    /// Input spreadsheet (defaults to <data_dir>/products.xlsx)
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct UploadArgs {
    /// Input spreadsheet (defaults to <data_dir>/products.xlsx)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Delete all existing backend products before uploading
    #[arg(long)]
    pub purge: bool,
}

#[derive(Debug, clap::Args)]
pub struct PurgeArgs {
    /// Page size used while draining the product list
    #[arg(long, default_value_t = 100)]
    pub limit: u32,
}

#[derive(Debug, clap::Args)]
pub struct UpdatePricesArgs {
    /// Input spreadsheet (defaults to <data_dir>/products.xlsx)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Pause between update calls, in milliseconds
    #[arg(long, default_value_t = 50)]
    pub delay_ms: u64,
}
