//! Partitions a block's transactions across worker threads; each worker
//! filters for pool activity, resolves canonical owners, aggregates
//! balances, and streams row batches to the sink.

use std::collections::HashMap;

use arrow::array::RecordBatch;
use rayon::prelude::*;

use crate::batch::ColumnBuilders;
use crate::error::CoreResult;
use crate::hotset::{hash_address, HotAddressTable};
use crate::locator::TxKeyViews;
use crate::strings::{next_token_balance, parse_string_array};

/// Default number of rows a worker accumulates before flushing a batch.
pub const DEFAULT_BATCH_THRESHOLD: usize = 10_000;

/// Deployment-assigned suffix appended to every signature in this process.
pub const DEFAULT_DATA_CENTER_SUFFIX: &str = "-1";

/// A per-worker handle the engine opens once and writes every flushed batch
/// through. The sink decides what "opening a stream" and "closing it" mean;
/// the engine only calls these three methods in order.
pub trait SinkStream: Send {
    fn write_batch(&mut self, batch: RecordBatch) -> CoreResult<()>;
    fn close(self: Box<Self>) -> CoreResult<()>;
}

/// Opens one [`SinkStream`] per worker at the start of a block.
pub trait BatchSink: Send + Sync {
    fn open_stream(&self, worker_id: usize) -> CoreResult<Box<dyn SinkStream>>;
}

/// Tuning knobs for one engine run, exposed so configuration can override
/// the spec defaults without touching the algorithm.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub batch_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_threshold: DEFAULT_BATCH_THRESHOLD,
        }
    }
}

/// Outcome of processing one block: how many transactions touched a hot
/// pool, how many rows were actually emitted to the sink (can be fewer than
/// `pool_transactions`, since a transaction with empty balances on both
/// sides for every owner/mint pair contributes zero rows), and how many
/// worker-reported sink errors occurred (logged, not fatal to the block).
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineOutcome {
    pub pool_transactions: usize,
    pub rows_emitted: usize,
    pub sink_errors: usize,
}

/// Run the parallel transaction engine over `transactions` for one block.
///
/// Workers never coordinate except at sink I/O; `hot_addresses` is read
/// through a shared lock and never written here. `data_center_suffix`
/// defaults to [`DEFAULT_DATA_CENTER_SUFFIX`] when the caller passes `None`.
pub fn run(
    transactions: &[TxKeyViews<'_>],
    hot_addresses: &HotAddressTable,
    block_time: &str,
    data_center_suffix: Option<&str>,
    sink: &dyn BatchSink,
    config: EngineConfig,
) -> EngineOutcome {
    let suffix = data_center_suffix.unwrap_or(DEFAULT_DATA_CENTER_SUFFIX);
    let worker_count = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1);

    if transactions.is_empty() {
        return EngineOutcome::default();
    }

    let chunk_size = transactions.len().div_ceil(worker_count);
    let chunks: Vec<(usize, &[TxKeyViews<'_>])> = transactions
        .chunks(chunk_size)
        .enumerate()
        .collect();

    let partials: Vec<EngineOutcome> = chunks
        .into_par_iter()
        .map(|(worker_id, chunk)| {
            run_worker(worker_id, chunk, chunk_size, hot_addresses, block_time, suffix, sink, config)
        })
        .collect();

    partials.into_iter().fold(EngineOutcome::default(), |acc, o| EngineOutcome {
        pool_transactions: acc.pool_transactions + o.pool_transactions,
        rows_emitted: acc.rows_emitted + o.rows_emitted,
        sink_errors: acc.sink_errors + o.sink_errors,
    })
}

#[derive(Default, Clone, Copy)]
struct Balances<'a> {
    pre: &'a [u8],
    post: &'a [u8],
}

fn run_worker(
    worker_id: usize,
    chunk: &[TxKeyViews<'_>],
    chunk_size: usize,
    hot_addresses: &HotAddressTable,
    block_time: &str,
    suffix: &str,
    sink: &dyn BatchSink,
    config: EngineConfig,
) -> EngineOutcome {
    let mut outcome = EngineOutcome::default();

    let mut stream = match sink.open_stream(worker_id) {
        Ok(s) => s,
        Err(_) => {
            outcome.sink_errors += 1;
            return outcome;
        }
    };

    let mut builders = ColumnBuilders::new();
    let base_tx_index = worker_id * chunk_size;

    for (offset, tx) in chunk.iter().enumerate() {
        let tx_index = base_tx_index + offset;

        let is_pool_tx = touches_hot_address(tx.account_keys, hot_addresses)
            || touches_hot_address(tx.writable, hot_addresses)
            || touches_hot_address(tx.readonly, hot_addresses);
        if !is_pool_tx {
            continue;
        }
        outcome.pool_transactions += 1;

        let index_to_hot: HashMap<i64, String> = index_hot_addresses(tx, hot_addresses);

        let mut owner_mint: HashMap<Vec<u8>, HashMap<Vec<u8>, Balances<'_>>> = HashMap::new();
        aggregate_balances(tx.pre_token_balances, true, &index_to_hot, &mut owner_mint);
        aggregate_balances(tx.post_token_balances, false, &index_to_hot, &mut owner_mint);

        let signature = format!("{block_time}-{tx_index}{suffix}");

        for (owner, mints) in &owner_mint {
            let owner_str = String::from_utf8_lossy(owner);
            for (mint, balances) in mints {
                if balances.pre.is_empty() && balances.post.is_empty() {
                    continue;
                }
                let mint_str = String::from_utf8_lossy(mint);
                let pre_str = String::from_utf8_lossy(balances.pre);
                let post_str = String::from_utf8_lossy(balances.post);
                builders.append_row(&owner_str, &signature, &mint_str, &pre_str, &post_str);
                outcome.rows_emitted += 1;
            }
        }

        if builders.len() >= config.batch_threshold {
            builders = flush(builders, block_time, stream.as_mut(), &mut outcome);
        }
    }

    if !builders.is_empty() {
        let _ = flush(builders, block_time, stream.as_mut(), &mut outcome);
    }

    if stream.close().is_err() {
        outcome.sink_errors += 1;
    }

    outcome
}

fn flush(builders: ColumnBuilders, block_time: &str, stream: &mut dyn SinkStream, outcome: &mut EngineOutcome) -> ColumnBuilders {
    if let Some(batch) = builders.finish(block_time) {
        if stream.write_batch(batch).is_err() {
            outcome.sink_errors += 1;
        }
    }
    ColumnBuilders::new()
}

fn touches_hot_address(array_view: &[u8], hot_addresses: &HotAddressTable) -> bool {
    parse_string_array(array_view)
        .into_iter()
        .any(|addr| hot_addresses.contains(hash_address(addr)))
}

/// Assign continuous account indices across `accountKeys`, `writable`,
/// `readonly` in that order, recording the canonical hot view for every
/// index whose address is a hot match. First occurrence of a given hash
/// wins, but indices never repeat so this only matters for identical
/// addresses listed twice.
fn index_hot_addresses(tx: &TxKeyViews<'_>, hot_addresses: &HotAddressTable) -> HashMap<i64, String> {
    let mut map = HashMap::new();
    let mut index: i64 = 0;
    for array in [tx.account_keys, tx.writable, tx.readonly] {
        for addr in parse_string_array(array) {
            let hash = hash_address(addr);
            if let Some(canonical) = hot_addresses.lookup(hash) {
                map.insert(index, canonical);
            }
            index += 1;
        }
    }
    map
}

fn aggregate_balances<'a>(
    view: &'a [u8],
    is_pre: bool,
    index_to_hot: &HashMap<i64, String>,
    out: &mut HashMap<Vec<u8>, HashMap<Vec<u8>, Balances<'a>>>,
) {
    let mut pos = 0usize;
    while let Some(entry) = next_token_balance(view, &mut pos) {
        let owner_key: Vec<u8> = match index_to_hot.get(&entry.account_index) {
            Some(canonical) => canonical.as_bytes().to_vec(),
            None => entry.owner.to_vec(),
        };
        if owner_key.is_empty() {
            continue;
        }

        let mint_map = out.entry(owner_key).or_default();
        let balances = mint_map.entry(entry.mint.to_vec()).or_default();
        if is_pre {
            balances.pre = entry.balance;
        } else {
            balances.post = entry.balance;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingStream {
        batches: std::sync::Arc<Mutex<Vec<RecordBatch>>>,
    }

    impl SinkStream for RecordingStream {
        fn write_batch(&mut self, batch: RecordBatch) -> CoreResult<()> {
            self.batches.lock().unwrap().push(batch);
            Ok(())
        }
        fn close(self: Box<Self>) -> CoreResult<()> {
            Ok(())
        }
    }

    struct RecordingSink {
        batches: std::sync::Arc<Mutex<Vec<RecordBatch>>>,
    }

    impl BatchSink for RecordingSink {
        fn open_stream(&self, _worker_id: usize) -> CoreResult<Box<dyn SinkStream>> {
            Ok(Box::new(RecordingStream {
                batches: self.batches.clone(),
            }))
        }
    }

    fn locate(json: &[u8]) -> Vec<TxKeyViews<'_>> {
        let idx = crate::index::build(json);
        let skip = crate::skipmap::build(&idx, json);
        crate::locator::locate_transactions(&idx, &skip, json)
    }

    #[test]
    fn s1_hot_tx_with_balances_emits_one_row() {
        let json = br#"{"readonly":[],"writable":[],"postTokenBalances":[{"accountIndex":1,"mint":"M","owner":"OOO","uiAmountString":"1.5"}],"preTokenBalances":[{"accountIndex":1,"mint":"M","owner":"OOO","uiAmountString":"1.0"}],"accountKeys":["BBB","AAA"]}"#;
        let txs = locate(json);
        assert_eq!(txs.len(), 1);

        let hot = HotAddressTable::new();
        hot.add_pool("AAA", "AAA");

        let batches = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink { batches: batches.clone() };

        let outcome = run(&txs, &hot, "100", None, &sink, EngineConfig::default());
        assert_eq!(outcome.pool_transactions, 1);
        assert_eq!(outcome.rows_emitted, 1);

        let rows = batches.lock().unwrap();
        assert_eq!(rows.len(), 1);
        let batch = &rows[0];
        assert_eq!(batch.num_rows(), 1);
    }

    #[test]
    fn s2_empty_hot_set_emits_zero_rows() {
        let json = br#"{"readonly":[],"writable":[],"postTokenBalances":[],"preTokenBalances":[{"accountIndex":1,"mint":"M","owner":"OOO","uiAmountString":"1.0"}],"accountKeys":["BBB","AAA"]}"#;
        let txs = locate(json);
        let hot = HotAddressTable::new();
        let batches = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink { batches: batches.clone() };

        let outcome = run(&txs, &hot, "100", None, &sink, EngineConfig::default());
        assert_eq!(outcome.pool_transactions, 0);
        assert_eq!(outcome.rows_emitted, 0);
        assert!(batches.lock().unwrap().is_empty());
    }

    #[test]
    fn pool_transaction_with_no_balance_entries_emits_no_rows() {
        // A hot transaction (accountKeys contains a hot vault) but with no
        // balance entries at all: it bumps pool_transactions but contributes
        // zero rows, since rows_emitted counts appended rows, not touched
        // transactions.
        let json = br#"{"readonly":[],"writable":[],"postTokenBalances":[],"preTokenBalances":[],"accountKeys":["BBB","AAA"]}"#;
        let txs = locate(json);
        let hot = HotAddressTable::new();
        hot.add_pool("AAA", "AAA");

        let batches = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink { batches: batches.clone() };

        let outcome = run(&txs, &hot, "100", None, &sink, EngineConfig::default());
        assert_eq!(outcome.pool_transactions, 1);
        assert_eq!(outcome.rows_emitted, 0);
        assert!(batches.lock().unwrap().is_empty());
    }
}
