//! Long-lived subscriber thread that grows the hot-address table as new
//! pools are announced on a Redis pub/sub channel.

use std::sync::Arc;

use redis::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use vault_ingest_core::hotset::HotAddressTable;

/// Shape of a pool-announcement message. Only the two vault fields are
/// consumed; `base_mint`/`quote_mint` are accepted but ignored.
#[derive(Debug, Deserialize)]
struct PoolEvent {
    base_vault: String,
    quote_vault: String,
}

/// Run the subscribe loop forever on the current thread, feeding
/// `hot_addresses` as messages arrive. Malformed messages are logged and
/// skipped; connection errors are logged and do not affect parsing.
pub fn run(redis_url: &str, channel: &str, hot_addresses: Arc<HotAddressTable>) {
    loop {
        if let Err(err) = subscribe_once(redis_url, channel, &hot_addresses) {
            error!(%err, "pool-event subscriber connection failed; retrying");
            std::thread::sleep(std::time::Duration::from_secs(1));
        }
    }
}

fn subscribe_once(redis_url: &str, channel: &str, hot_addresses: &HotAddressTable) -> redis::RedisResult<()> {
    let client = Client::open(redis_url)?;
    let mut conn = client.get_connection()?;
    let mut pubsub = conn.as_pubsub();
    pubsub.subscribe(channel)?;
    info!(channel, "subscribed to pool-event channel");

    loop {
        let msg = pubsub.get_message()?;
        let payload: String = msg.get_payload()?;
        match serde_json::from_str::<PoolEvent>(&payload) {
            Ok(event) => hot_addresses.add_pool(&event.base_vault, &event.quote_vault),
            Err(err) => warn!(%err, payload, "malformed pool-event message; skipping"),
        }
    }
}
