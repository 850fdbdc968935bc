use std::path::PathBuf;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::{filter::Targets, prelude::*};

use vault_ingest::prelude::*;
use vault_ingest::Config;

#[derive(Debug, clap::Args)]
pub struct GlobalArgs {
    /// Path to the TOML configuration file.
    #[clap(long, global = true, default_value = "vault-ingest.toml")]
    pub config: PathBuf,

    /// Raise log verbosity to debug regardless of the config file's level.
    #[clap(long, global = true)]
    pub verbose: bool,
}

pub fn load_config(args: &GlobalArgs) -> Result<Config, Error> {
    Config::load(&args.config)
}

pub fn setup_tracing(config: &vault_ingest::config::LoggingConfig, verbose: bool) {
    let level = if verbose {
        Level::DEBUG
    } else {
        config.level.parse().unwrap_or(Level::INFO)
    };

    let filter = Targets::new()
        .with_target("vault_ingest", level)
        .with_target("vault_ingest_core", level);

    tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .finish()
        .with(filter)
        .init();
}

pub fn seed_hot_addresses(config: &Config) -> Result<Arc<HotAddressTable>, Error> {
    let path = PathBuf::from(&config.hot_address_seed_path);
    let table = HotAddressTable::seed_from_file(&path)?;
    Ok(Arc::new(table))
}
