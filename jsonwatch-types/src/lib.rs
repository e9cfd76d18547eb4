//! # jsonwatch-types
//!
//! Core types for JSON metric collection. This crate defines the data model
//! shared by the jsonwatch engine and its source adapters:
//!
//! - [`MetricSpec`]: a raw, declarative description of a value to track and
//!   how to combine it across sources. Specs are serde-friendly so graphs
//!   can be declared in a config file; validation happens in the engine.
//! - [`SeriesWindow`]: the bounded, time-ordered sample history of one
//!   metric.
//! - [`UpdateBatch`]: one polling tick's worth of per-source snapshots,
//!   plus the pure path-resolution functions that read values out of them.
//!
//! ## Example
//!
//! ```rust
//! use jsonwatch_types::{resolve_value, MetricSpec, UpdateBatch};
//! use serde_json::json;
//!
//! let spec = MetricSpec::new(["stats", "requests"], "count", "Requests")
//!     .operation("avg")
//!     .ignore_zeros(true);
//!
//! let mut batch = UpdateBatch::new(1_700_000_000_000);
//! batch.push("http://host-a/metrics", json!({"stats": {"requests": {"count": 42}}}));
//!
//! let snapshot = &batch.snapshots[0];
//! let path: Vec<String> = vec!["stats".into(), "requests".into()];
//! assert_eq!(resolve_value(&path, "count", &snapshot.root), Some(42.0));
//! ```

mod batch;
mod spec;
mod window;

pub use batch::*;
pub use spec::*;
pub use window::*;
