//! Arrow Flight implementation of the engine's [`BatchSink`] trait: one
//! DoPut stream per worker, batches carrying their `timestamp` metadata in
//! the record batch's own schema metadata (set by [`vault_ingest_core::batch`]).

use arrow_flight::encode::FlightDataEncoderBuilder;
use arrow_flight::{FlightClient, FlightDescriptor};
use futures_util::{stream, TryStreamExt};
use tonic::transport::{Channel, Endpoint};

use vault_ingest_core::engine::{BatchSink, SinkStream};
use vault_ingest_core::error::{CoreError, CoreResult};

/// Connects a fresh Flight client per worker, the same way the reference
/// parser's worker threads each open their own connection with no pooling.
pub struct ArrowFlightSink {
    uri: String,
}

impl ArrowFlightSink {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

impl BatchSink for ArrowFlightSink {
    fn open_stream(&self, worker_id: usize) -> CoreResult<Box<dyn SinkStream>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CoreError::Sink(format!("worker {worker_id} runtime: {e}")))?;

        let uri = self.uri.clone();
        let client = runtime
            .block_on(connect(uri))
            .map_err(|e| CoreError::Sink(format!("worker {worker_id} connect: {e}")))?;

        Ok(Box::new(ArrowFlightStream { runtime, client }))
    }
}

async fn connect(uri: String) -> Result<FlightClient, tonic::transport::Error> {
    let channel: Channel = Endpoint::new(uri)?.connect().await?;
    Ok(FlightClient::new(channel))
}

struct ArrowFlightStream {
    runtime: tokio::runtime::Runtime,
    client: FlightClient,
}

impl SinkStream for ArrowFlightStream {
    fn write_batch(&mut self, batch: arrow::array::RecordBatch) -> CoreResult<()> {
        let client = &mut self.client;
        self.runtime
            .block_on(async move {
                let descriptor = FlightDescriptor::new_path(vec!["solana_data".to_string()]);
                let input = stream::iter(vec![Ok(batch)]);
                let encoded = FlightDataEncoderBuilder::new()
                    .with_flight_descriptor(Some(descriptor))
                    .build(input);

                let mut results = client.do_put(encoded).await?;
                while results.try_next().await?.is_some() {}
                Ok::<(), arrow_flight::error::FlightError>(())
            })
            .map_err(|e| CoreError::Sink(e.to_string()))
    }

    fn close(self: Box<Self>) -> CoreResult<()> {
        Ok(())
    }
}
