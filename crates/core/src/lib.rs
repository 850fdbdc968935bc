//! The per-block parsing pipeline: structural indexing, skip-maps, transaction
//! location, hot-address filtering, and columnar batch emission.
//!
//! Glossary:
//!  - `block`: one Solana block JSON payload, the unit of work for the whole
//!    pipeline.
//!  - `hot address`: a pool vault address currently tracked in the
//!    [`hotset::HotAddressTable`]; membership grows over the process
//!    lifetime and never shrinks.
//!  - `structural index`: the ordered `[`/`]` offsets produced by [`index`],
//!    consumed by [`skipmap`] and [`locator`].

pub mod batch;
pub mod blocktime;
pub mod engine;
pub mod error;
pub mod hotset;
pub mod index;
pub mod locator;
pub mod pipeline;
pub mod skipmap;
pub mod strings;

pub use engine::EngineConfig;
pub use error::{CoreError, CoreResult};
pub use hotset::HotAddressTable;
pub use pipeline::{run_block, BlockOutcome};
