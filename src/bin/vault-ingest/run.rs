use std::time::{Duration, Instant};

use tracing::info;

use vault_ingest::prelude::*;
use vault_ingest::shm::SharedBlockRegion;
use vault_ingest::sink::ArrowFlightSink;

use crate::common::GlobalArgs;

#[derive(Debug, clap::Args)]
pub struct Args {
    #[clap(flatten)]
    pub common: GlobalArgs,
}

pub fn run(args: &Args) -> Result<(), Error> {
    let config = crate::common::load_config(&args.common)?;
    crate::common::setup_tracing(&config.logging, args.common.verbose);

    let hot_addresses = crate::common::seed_hot_addresses(&config)?;
    info!(count = hot_addresses.len(), "loaded hot-address seed file");

    {
        let hot_addresses = hot_addresses.clone();
        let redis_url = config.subscriber.redis_url.clone();
        let channel = config.subscriber.channel.clone();
        std::thread::spawn(move || vault_ingest::subscriber::run(&redis_url, &channel, hot_addresses));
    }

    let mut region = SharedBlockRegion::attach(
        &config.shm.region_name,
        config.shm.region_size_bytes,
        Duration::from_millis(config.shm.poll_interval_ms),
    )?;

    let sink = ArrowFlightSink::new(config.sink.flight_uri.clone());
    let engine_config = EngineConfig {
        batch_threshold: config.engine.batch_threshold,
    };

    let thread_count = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    info!(thread_count, "vault-ingest ready, polling shared memory");

    loop {
        let Some(payload) = region.wait_for_payload() else {
            continue;
        };

        let started = Instant::now();
        let outcome = run_block(
            payload,
            &hot_addresses,
            Some(&config.engine.data_center_suffix),
            &sink,
            engine_config,
        );
        region.mark_done();

        info!(
            transactions = outcome.transactions_located,
            pool_transactions = outcome.engine.pool_transactions,
            rows_emitted = outcome.engine.rows_emitted,
            sink_errors = outcome.engine.sink_errors,
            block_time_found = outcome.block_time_found,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "block processed",
        );
    }
}
