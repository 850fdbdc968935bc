//! Orchestrates the per-block stages C2-C7 over one payload.

use tracing::{instrument, warn};

use crate::blocktime;
use crate::engine::{self, BatchSink, EngineConfig, EngineOutcome};
use crate::hotset::HotAddressTable;
use crate::index;
use crate::locator;
use crate::skipmap;

/// Result of running the whole pipeline over one block payload.
#[derive(Debug, Clone, Copy)]
pub struct BlockOutcome {
    pub block_time_found: bool,
    pub structural_positions: usize,
    pub transactions_located: usize,
    pub engine: EngineOutcome,
}

/// Run the full per-block pipeline: block-time extraction, structural
/// indexing, skip-map, transaction location, and the parallel engine.
///
/// `buf` is read exactly to its declared length; unlike the reference
/// implementation's unsafe lane reads, nothing here requires trailing
/// padding past the logical JSON end (see [`index::build`]).
#[instrument(skip_all, fields(len = buf.len()))]
pub fn run_block(
    buf: &[u8],
    hot_addresses: &HotAddressTable,
    data_center_suffix: Option<&str>,
    sink: &dyn BatchSink,
    config: EngineConfig,
) -> BlockOutcome {
    let block_time = blocktime::extract(buf);
    if block_time.is_none() {
        warn!("blockTime field not found; signatures will use an empty prefix");
    }
    let block_time = block_time.unwrap_or("");

    let structural = index::build(buf);
    let skip = skipmap::build(&structural, buf);
    let transactions = locator::locate_transactions(&structural, &skip, buf);

    let engine_outcome = if transactions.is_empty() {
        EngineOutcome::default()
    } else {
        engine::run(&transactions, hot_addresses, block_time, data_center_suffix, sink, config)
    };

    BlockOutcome {
        block_time_found: !block_time.is_empty(),
        structural_positions: structural.len(),
        transactions_located: transactions.len(),
        engine: engine_outcome,
    }
}
