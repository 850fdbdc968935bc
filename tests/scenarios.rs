//! End-to-end scenarios against the full per-block pipeline, one per literal
//! case: a hot pool, an empty hot set, a missing balance side, a second
//! transaction that's the only hot one, a bracket hidden inside a string,
//! and a block with no blockTime field.

use std::sync::{Arc, Mutex};

use arrow::array::{Array, RecordBatch, StringArray};

use vault_ingest_core::engine::{BatchSink, EngineConfig, SinkStream};
use vault_ingest_core::error::CoreResult;
use vault_ingest_core::hotset::HotAddressTable;
use vault_ingest_core::run_block;

struct CapturingStream {
    rows: Arc<Mutex<Vec<(String, String, String, Option<String>, Option<String>)>>>,
}

impl SinkStream for CapturingStream {
    fn write_batch(&mut self, batch: RecordBatch) -> CoreResult<()> {
        let wallet = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        let signature = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        let mint = batch.column(2).as_any().downcast_ref::<StringArray>().unwrap();
        let pre = batch.column(3).as_any().downcast_ref::<StringArray>().unwrap();
        let post = batch.column(4).as_any().downcast_ref::<StringArray>().unwrap();

        let mut rows = self.rows.lock().unwrap();
        for i in 0..batch.num_rows() {
            rows.push((
                wallet.value(i).to_string(),
                signature.value(i).to_string(),
                mint.value(i).to_string(),
                (!pre.is_null(i)).then(|| pre.value(i).to_string()),
                (!post.is_null(i)).then(|| post.value(i).to_string()),
            ));
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> CoreResult<()> {
        Ok(())
    }
}

struct CapturingSink {
    rows: Arc<Mutex<Vec<(String, String, String, Option<String>, Option<String>)>>>,
}

impl CapturingSink {
    fn new() -> Self {
        Self { rows: Arc::new(Mutex::new(Vec::new())) }
    }
}

impl BatchSink for CapturingSink {
    fn open_stream(&self, _worker_id: usize) -> CoreResult<Box<dyn SinkStream>> {
        Ok(Box::new(CapturingStream { rows: self.rows.clone() }))
    }
}

fn padded(json: &str) -> Vec<u8> {
    let mut buf = json.as_bytes().to_vec();
    buf.extend(std::iter::repeat(0u8).take(64));
    buf
}

fn one_tx(account_keys: &str, pre: &str, post: &str) -> String {
    format!(
        r#"{{"readonly":[],"writable":[],"postTokenBalances":{post},"preTokenBalances":{pre},"accountKeys":{account_keys}}}"#
    )
}

#[test]
fn s1_hot_transaction_emits_one_row() {
    let tx = one_tx(
        r#"["BBB","AAA"]"#,
        r#"[{"accountIndex":1,"mint":"M","owner":"OOO","uiAmountString":"1.0"}]"#,
        r#"[{"accountIndex":1,"mint":"M","owner":"OOO","uiAmountString":"1.5"}]"#,
    );
    let json = format!(r#"{{"blockTime":100,"transactions":[{tx}]}}"#);

    let hot = HotAddressTable::new();
    hot.add_pool("AAA", "AAA");
    let sink = CapturingSink::new();

    run_block(&padded(&json), &hot, None, &sink, EngineConfig::default());

    let rows = sink.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    let (wallet, signature, mint, pre, post) = &rows[0];
    assert_eq!(wallet, "AAA");
    assert_eq!(signature, "100-0-1");
    assert_eq!(mint, "M");
    assert_eq!(pre.as_deref(), Some("1.0"));
    assert_eq!(post.as_deref(), Some("1.5"));
}

#[test]
fn s2_empty_hot_set_emits_zero_rows() {
    let tx = one_tx(
        r#"["BBB","AAA"]"#,
        r#"[{"accountIndex":1,"mint":"M","owner":"OOO","uiAmountString":"1.0"}]"#,
        r#"[{"accountIndex":1,"mint":"M","owner":"OOO","uiAmountString":"1.5"}]"#,
    );
    let json = format!(r#"{{"blockTime":100,"transactions":[{tx}]}}"#);

    let hot = HotAddressTable::new();
    let sink = CapturingSink::new();

    run_block(&padded(&json), &hot, None, &sink, EngineConfig::default());

    assert!(sink.rows.lock().unwrap().is_empty());
}

#[test]
fn s3_missing_post_balance_is_null() {
    let tx = one_tx(
        r#"["BBB","AAA"]"#,
        r#"[{"accountIndex":1,"mint":"M","owner":"OOO","uiAmountString":"1.0"}]"#,
        r#"[]"#,
    );
    let json = format!(r#"{{"blockTime":100,"transactions":[{tx}]}}"#);

    let hot = HotAddressTable::new();
    hot.add_pool("AAA", "AAA");
    let sink = CapturingSink::new();

    run_block(&padded(&json), &hot, None, &sink, EngineConfig::default());

    let rows = sink.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    let (_, _, _, pre, post) = &rows[0];
    assert_eq!(pre.as_deref(), Some("1.0"));
    assert_eq!(post, &None);
}

#[test]
fn s4_only_second_transaction_mentions_hot_address() {
    let cold = one_tx(r#"["XXX"]"#, "[]", "[]");
    let hot_tx = one_tx(
        r#"["AAA"]"#,
        r#"[{"accountIndex":0,"mint":"M","owner":"OOO","uiAmountString":"1"}]"#,
        "[]",
    );
    let json = format!(r#"{{"blockTime":100,"transactions":[{cold},{hot_tx}]}}"#);

    let hot = HotAddressTable::new();
    hot.add_pool("AAA", "AAA");
    let sink = CapturingSink::new();

    let outcome = run_block(&padded(&json), &hot, None, &sink, EngineConfig::default());
    assert_eq!(outcome.transactions_located, 2);

    let rows = sink.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].1.ends_with("-1-1"));
}

#[test]
fn s5_bracket_inside_string_is_not_a_spurious_transaction_start() {
    let json = format!(
        r#"{{"blockTime":100,"note":"has a [ inside","transactions":[{}]}}"#,
        one_tx(
            r#"["AAA"]"#,
            r#"[{"accountIndex":0,"mint":"M","owner":"OOO","uiAmountString":"1"}]"#,
            "[]",
        )
    );

    let hot = HotAddressTable::new();
    hot.add_pool("AAA", "AAA");
    let sink = CapturingSink::new();

    let outcome = run_block(&padded(&json), &hot, None, &sink, EngineConfig::default());
    assert_eq!(outcome.transactions_located, 1);
    assert_eq!(sink.rows.lock().unwrap().len(), 1);
}

#[test]
fn s6_missing_block_time_still_emits_rows() {
    let tx = one_tx(
        r#"["AAA"]"#,
        r#"[{"accountIndex":0,"mint":"M","owner":"OOO","uiAmountString":"1"}]"#,
        "[]",
    );
    let json = format!(r#"{{"transactions":[{tx}]}}"#);

    let hot = HotAddressTable::new();
    hot.add_pool("AAA", "AAA");
    let sink = CapturingSink::new();

    let outcome = run_block(&padded(&json), &hot, None, &sink, EngineConfig::default());
    assert!(!outcome.block_time_found);

    let rows = sink.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].1.starts_with("-0-1"));
}
