use anyhow::Result;
use clap::Parser;
use colored::*;

mod api;
mod cli;
mod config;
mod corpus;
mod enrich;
mod images;
mod mapping;
mod model;
mod services;
mod spreadsheet;
mod validate;

use cli::{Cli, Commands, commands};
use config::Config;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(error) = run(&cli).await {
        eprintln!("{} {error:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    match &cli.command {
        Commands::Enrich(args) => commands::enrich::run(&config, args).await,
        Commands::FetchImages(args) => commands::fetch_images::run(&config, args).await,
        Commands::Upload(args) => commands::upload::run(&config, args).await,
        Commands::Purge(args) => commands::purge::run(&config, args).await,
        Commands::UpdatePrices(args) => commands::update_prices::run(&config, args).await,
    }
}
