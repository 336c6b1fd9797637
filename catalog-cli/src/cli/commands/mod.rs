//! Command handlers, one module per subcommand

pub mod enrich;
pub mod fetch_images;
pub mod purge;
pub mod update_prices;
pub mod upload;
