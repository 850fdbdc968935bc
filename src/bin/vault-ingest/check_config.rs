use tracing::info;

use vault_ingest::prelude::*;

use crate::common::GlobalArgs;

#[derive(Debug, clap::Args)]
pub struct Args {
    #[clap(flatten)]
    pub common: GlobalArgs,
}

/// Validate configuration, the hot-address seed file, and the sink address
/// without attaching to shared memory or entering the main loop.
pub fn run(args: &Args) -> Result<(), Error> {
    let config = crate::common::load_config(&args.common)?;
    crate::common::setup_tracing(&config.logging, args.common.verbose);

    let hot_addresses = crate::common::seed_hot_addresses(&config)?;
    info!(count = hot_addresses.len(), "hot-address seed file OK");

    if config.sink.flight_uri.parse::<tonic::transport::Uri>().is_err() {
        return Err(Error::config(format!("invalid sink.flight_uri: {}", config.sink.flight_uri)));
    }
    info!(uri = %config.sink.flight_uri, "sink address OK");

    info!("configuration OK");
    Ok(())
}
