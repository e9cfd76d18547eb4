//! # jsonwatch-sources
//!
//! Source adapters for jsonwatch. A source is one independently polled
//! JSON-producing endpoint; each tick the engine fetches a snapshot from
//! every configured source and aggregates the values it finds.
//!
//! ## Provided sources
//!
//! - [`HttpSource`]: fetches a JSON document over HTTP (the usual case)
//! - [`FileSource`]: reads a JSON document from a local file
//! - [`StaticSource`]: serves an in-memory value, for tests and demos
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use jsonwatch_sources::{fetch_batch, HttpSource, MetricSource, SourceError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SourceError> {
//!     let sources: Vec<Box<dyn MetricSource>> = vec![
//!         Box::new(HttpSource::builder("http://host-a:8080/metrics").build()?),
//!         Box::new(HttpSource::builder("http://host-b:8080/metrics").build()?),
//!     ];
//!
//!     let (batch, failures) = fetch_batch(&sources, 1_700_000_000_000).await;
//!     println!("{} of {} sources responded", batch.snapshots.len(), sources.len());
//!     for (id, err) in failures {
//!         eprintln!("source {id} failed: {err}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;

mod file;
mod http;
mod memory;

pub use error::SourceError;
pub use file::FileSource;
pub use http::{HttpSource, HttpSourceBuilder};
pub use memory::StaticSource;

use std::fmt::Debug;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::Value;

use jsonwatch_types::UpdateBatch;

/// One independently polled JSON-producing endpoint.
#[async_trait]
pub trait MetricSource: Send + Sync + Debug {
    /// Fetch one snapshot.
    ///
    /// A failure means the source is absent for the current tick; it is
    /// never fatal to the pipeline.
    async fn fetch(&self) -> Result<Value, SourceError>;

    /// Stable identifier for this source, used to label per-source series.
    fn id(&self) -> &str;
}

/// Fetch a snapshot from every source concurrently and settle all
/// outcomes.
///
/// All requests are issued together and the call returns only once every
/// fetch has succeeded or failed; there are no fast-fail semantics.
/// Successful snapshots land in the returned [`UpdateBatch`] in source
/// order, failures are returned alongside for the caller to report.
pub async fn fetch_batch(
    sources: &[Box<dyn MetricSource>],
    timestamp_ms: i64,
) -> (UpdateBatch, Vec<(String, SourceError)>) {
    let fetches = sources.iter().map(|source| async move {
        (source.id().to_string(), source.fetch().await)
    });
    let settled = join_all(fetches).await;

    let mut batch = UpdateBatch::new(timestamp_ms);
    let mut failures = Vec::new();
    for (id, outcome) in settled {
        match outcome {
            Ok(root) => batch.push(id, root),
            Err(err) => failures.push((id, err)),
        }
    }
    (batch, failures)
}
