//! # jsonwatch
//!
//! Polls a set of JSON-producing endpoints, extracts named values from
//! their nested structures, merges per-source samples into cross-source
//! time series, and hands a ranked selection of series to a renderer
//! once per tick.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Watcher                             │
//! │  ┌─────────┐    ┌─────────┐    ┌────────┐    ┌───────────┐  │
//! │  │ sources │───▶│  graph  │───▶│ select │───▶│  render   │  │
//! │  │ (fetch) │    │(collect,│    │ (rank) │    │(Renderer) │  │
//! │  └─────────┘    │discover)│    └────────┘    └───────────┘  │
//! │                 └─────────┘                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the [`Watcher`] fetches every source together, bundles the
//! successful snapshots into an [`UpdateBatch`], and runs each registered
//! [`Graph`] through the pipeline: aggregate every metric across sources
//! ([`collect`]), discover regex children ([`discover`]), rank and pick
//! the visible subset ([`select`]), and hand the resulting series to the
//! watcher's [`Renderer`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use jsonwatch::{MetricSpec, Watcher};
//! use jsonwatch_sources::HttpSource;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let watcher = Watcher::builder()
//!         .source(HttpSource::builder("http://host-a:8080/metrics").build()?)
//!         .source(HttpSource::builder("http://host-b:8080/metrics").build()?)
//!         .interval(Duration::from_secs(2))
//!         .build();
//!
//!     watcher.add_graph_default(
//!         "queues",
//!         serde_json::Value::Null,
//!         vec![
//!             MetricSpec::new(["stats", "requests"], "count", "Requests"),
//!             MetricSpec::new(["queues"], "depth", "queue $1")
//!                 .key_regex("worker-(.*)")
//!                 .show_top(5),
//!         ],
//!     )?;
//!
//!     watcher.start();
//!     tokio::signal::ctrl_c().await?;
//!     watcher.stop();
//!     Ok(())
//! }
//! ```

pub mod collect;
pub mod config;
pub mod discover;
pub mod graph;
pub mod metric;
pub mod render;
pub mod select;
pub mod watcher;

pub use config::Dashboard;
pub use graph::{Graph, DEFAULT_TOTAL_POINTS};
pub use metric::{ConfigError, MetricDef, Operation};
pub use render::{Renderer, Series, TextRenderer};
pub use watcher::{Watcher, WatcherBuilder, DEFAULT_INTERVAL, MIN_INTERVAL};

pub use jsonwatch_types::{MetricSpec, PathSpec, Sample, SeriesWindow, UpdateBatch};
