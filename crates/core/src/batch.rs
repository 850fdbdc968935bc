//! Per-worker column builders and the columnar record batch they flush into.

use std::sync::Arc;

use arrow::array::{ArrayBuilder, RecordBatch, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};

/// The fixed five-column output schema: `wallet, signature, mint,
/// pre_balance, post_balance`, all utf8.
pub fn schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("wallet", DataType::Utf8, false),
        Field::new("signature", DataType::Utf8, false),
        Field::new("mint", DataType::Utf8, false),
        Field::new("pre_balance", DataType::Utf8, true),
        Field::new("post_balance", DataType::Utf8, true),
    ]))
}

/// One worker's accumulating output rows. Owned exclusively by that worker;
/// never shared across threads.
pub struct ColumnBuilders {
    wallet: StringBuilder,
    signature: StringBuilder,
    mint: StringBuilder,
    pre_balance: StringBuilder,
    post_balance: StringBuilder,
}

impl Default for ColumnBuilders {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnBuilders {
    pub fn new() -> Self {
        Self {
            wallet: StringBuilder::new(),
            signature: StringBuilder::new(),
            mint: StringBuilder::new(),
            pre_balance: StringBuilder::new(),
            post_balance: StringBuilder::new(),
        }
    }

    /// Append one row. An empty `pre`/`post` slice becomes a null column
    /// entry, never an empty string.
    pub fn append_row(&mut self, wallet: &str, signature: &str, mint: &str, pre: &str, post: &str) {
        self.wallet.append_value(wallet);
        self.signature.append_value(signature);
        self.mint.append_value(mint);
        if pre.is_empty() {
            self.pre_balance.append_null();
        } else {
            self.pre_balance.append_value(pre);
        }
        if post.is_empty() {
            self.post_balance.append_null();
        } else {
            self.post_balance.append_value(post);
        }
    }

    pub fn len(&self) -> usize {
        self.wallet.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finish the builders into a record batch with `timestamp` metadata set
    /// to `block_time`. Returns `None` for a zero-row batch -- callers must
    /// not hand those to the sink.
    pub fn finish(mut self, block_time: &str) -> Option<RecordBatch> {
        if self.is_empty() {
            return None;
        }

        let wallet = Arc::new(self.wallet.finish());
        let signature = Arc::new(self.signature.finish());
        let mint = Arc::new(self.mint.finish());
        let pre_balance = Arc::new(self.pre_balance.finish());
        let post_balance = Arc::new(self.post_balance.finish());

        let mut schema = (*schema()).clone();
        schema.metadata.insert("timestamp".to_string(), block_time.to_string());

        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![wallet, signature, mint, pre_balance, post_balance],
        )
        .expect("column lengths always match: every builder receives exactly one append per row");

        Some(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, StringArray};

    #[test]
    fn zero_rows_yields_no_batch() {
        let builders = ColumnBuilders::new();
        assert!(builders.finish("100").is_none());
    }

    #[test]
    fn null_contract_for_empty_sides() {
        let mut builders = ColumnBuilders::new();
        builders.append_row("WALLET", "100-0-1", "MINT", "", "1.5");
        let batch = builders.finish("100").unwrap();

        let pre = batch.column(3).as_any().downcast_ref::<StringArray>().unwrap();
        assert!(pre.is_null(0));
        let post = batch.column(4).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(post.value(0), "1.5");
    }

    #[test]
    fn metadata_carries_block_time() {
        let mut builders = ColumnBuilders::new();
        builders.append_row("W", "S", "M", "1", "2");
        let batch = builders.finish("1699999999").unwrap();
        assert_eq!(batch.schema().metadata().get("timestamp").map(String::as_str), Some("1699999999"));
    }
}
