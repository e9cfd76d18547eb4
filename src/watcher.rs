//! The watcher: graph registry, polling scheduler, and render dispatch.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use jsonwatch_sources::{fetch_batch, MetricSource};
use jsonwatch_types::{MetricSpec, UpdateBatch};

use crate::graph::{Graph, DEFAULT_TOTAL_POINTS};
use crate::metric::ConfigError;
use crate::render::{Renderer, TextRenderer};

/// Lower bound on the polling interval.
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Default polling interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

// Graphs and the renderer mutate together inside one tick, so they
// share a lock.
struct Inner {
    graphs: Vec<Graph>,
    renderer: Box<dyn Renderer>,
}

/// Polls a set of sources on an interval and drives every registered
/// graph's collect-aggregate-rank-render cycle.
///
/// # Example
///
/// ```rust,no_run
/// use jsonwatch::{MetricSpec, Watcher};
/// use jsonwatch_sources::HttpSource;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let watcher = Watcher::builder()
///         .source(HttpSource::builder("http://localhost:9000/stats.json").build()?)
///         .interval(Duration::from_secs(5))
///         .build();
///
///     watcher.add_graph(
///         "requests",
///         serde_json::Value::Null,
///         vec![MetricSpec::new(["stats", "requests"], "count", "Requests")],
///         100,
///     )?;
///
///     watcher.start();
///     tokio::time::sleep(Duration::from_secs(60)).await;
///     watcher.stop();
///     Ok(())
/// }
/// ```
pub struct Watcher {
    inner: Arc<Mutex<Inner>>,
    sources: Arc<Vec<Box<dyn MetricSource>>>,
    interval: Duration,
    running: watch::Sender<bool>,
}

impl Watcher {
    /// Create a builder for configuring a watcher.
    pub fn builder() -> WatcherBuilder {
        WatcherBuilder::new()
    }

    /// Register a graph.
    ///
    /// Every descriptor is validated here, synchronously; if any is
    /// invalid the whole graph is rejected and nothing is registered.
    /// `target` and `options` are handed to the renderer untouched on
    /// every tick.
    pub fn add_graph(
        &self,
        target: impl Into<String>,
        options: Value,
        specs: Vec<MetricSpec>,
        total_points: usize,
    ) -> Result<(), ConfigError> {
        let graph = Graph::new(target, options, specs, total_points)?;
        self.inner.lock().graphs.push(graph);
        Ok(())
    }

    /// Register a graph with the default window bound.
    pub fn add_graph_default(
        &self,
        target: impl Into<String>,
        options: Value,
        specs: Vec<MetricSpec>,
    ) -> Result<(), ConfigError> {
        self.add_graph(target, options, specs, DEFAULT_TOTAL_POINTS)
    }

    /// Apply one batch to every graph and render the results.
    ///
    /// This is the body of one scheduler tick, exposed so callers can
    /// drive the pipeline manually from their own batches.
    pub fn apply_batch(&self, batch: &UpdateBatch) {
        let mut inner = self.inner.lock();
        let Inner { graphs, renderer } = &mut *inner;
        for graph in graphs.iter_mut() {
            let series = graph.apply(batch);
            renderer.render(&graph.target, &graph.options, &series);
        }
    }

    /// Fetch every source once and apply the batch immediately,
    /// outside the scheduling loop.
    pub async fn tick_once(&self) {
        let (batch, failures) = fetch_batch(&self.sources, now_ms()).await;
        for (source_id, error) in &failures {
            warn!(source = %source_id, %error, "source fetch failed");
        }
        self.apply_batch(&batch);
    }

    /// Whether the polling loop is currently scheduled.
    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    /// Start the polling loop. Idempotent; a second call while running
    /// does nothing.
    ///
    /// Ticks never overlap: each loop iteration awaits the full fetch
    /// round and applies it before the next interval fires. A slow
    /// round delays subsequent ticks rather than stacking them.
    pub fn start(&self) {
        if self.running.send_replace(true) {
            return;
        }

        let inner = self.inner.clone();
        let sources = self.sources.clone();
        let interval = self.interval;
        let mut running = self.running.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let (batch, failures) = fetch_batch(&sources, now_ms()).await;
                        for (source_id, error) in &failures {
                            warn!(source = %source_id, %error, "source fetch failed");
                        }

                        // a round that settles after stop() is discarded
                        // whole; no partially-applied tick state
                        if !*running.borrow() {
                            debug!("discarding batch fetched after stop");
                            break;
                        }

                        let mut inner = inner.lock();
                        let Inner { graphs, renderer } = &mut *inner;
                        for graph in graphs.iter_mut() {
                            let series = graph.apply(&batch);
                            renderer.render(&graph.target, &graph.options, &series);
                        }
                    }
                    _ = running.changed() => {
                        if !*running.borrow() {
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Stop the polling loop. Idempotent. An in-flight fetch round is
    /// not cancelled; its results are discarded instead of applied.
    pub fn stop(&self) {
        self.running.send_replace(false);
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("sources", &self.sources.len())
            .field("graphs", &self.inner.lock().graphs.len())
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Builder for configuring a [`Watcher`].
pub struct WatcherBuilder {
    sources: Vec<Box<dyn MetricSource>>,
    renderer: Option<Box<dyn Renderer>>,
    interval: Duration,
}

impl WatcherBuilder {
    /// Create a new builder with no sources, the text renderer, and a
    /// one second interval.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            renderer: None,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Add a source to poll. Multiple sources can be added; each tick
    /// fetches all of them together.
    pub fn source(mut self, source: impl MetricSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Add an already-boxed source.
    pub fn boxed_source(mut self, source: Box<dyn MetricSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Replace the renderer. Defaults to [`TextRenderer`].
    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Set the polling interval, clamped to [`MIN_INTERVAL`].
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    /// Build the watcher.
    pub fn build(self) -> Watcher {
        let (running, _) = watch::channel(false);
        Watcher {
            inner: Arc::new(Mutex::new(Inner {
                graphs: Vec::new(),
                renderer: self.renderer.unwrap_or_else(|| Box::new(TextRenderer)),
            })),
            sources: Arc::new(self.sources),
            interval: self.interval,
            running,
        }
    }
}

impl Default for WatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Series;
    use jsonwatch_sources::StaticSource;
    use serde_json::json;

    /// Renderer whose frames outlive the watcher that owns it.
    #[derive(Clone, Default)]
    struct SharedRecorder {
        frames: Arc<Mutex<Vec<(String, Vec<Series>)>>>,
    }

    impl Renderer for SharedRecorder {
        fn render(&mut self, target: &str, _options: &Value, series: &[Series]) {
            self.frames.lock().push((target.to_string(), series.to_vec()));
        }
    }

    fn watcher_with(source: StaticSource, recorder: SharedRecorder) -> Watcher {
        Watcher::builder()
            .source(source)
            .renderer(recorder)
            .interval(Duration::from_millis(10))
            .build()
    }

    #[tokio::test]
    async fn add_graph_validates_synchronously() {
        let watcher = Watcher::builder().build();
        let err = watcher
            .add_graph_default(
                "chart",
                Value::Null,
                vec![MetricSpec::new(["s"], "v", "V").operation("median")],
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn apply_batch_renders_every_graph() {
        let recorder = SharedRecorder::default();
        let watcher = watcher_with(
            StaticSource::new("fake", json!({"s": {"v": 3}})),
            recorder.clone(),
        );
        watcher
            .add_graph_default("a", Value::Null, vec![MetricSpec::new(["s"], "v", "V")])
            .unwrap();
        watcher
            .add_graph_default("b", Value::Null, vec![MetricSpec::new(["s"], "v", "V")])
            .unwrap();

        let mut batch = UpdateBatch::new(1000);
        batch.push("fake", json!({"s": {"v": 3}}));
        watcher.apply_batch(&batch);

        let frames = recorder.frames.lock();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].0, "a");
        assert_eq!(frames[1].0, "b");
        assert_eq!(frames[0].1[0].latest().unwrap().value, 3.0);
    }

    #[test]
    fn tick_once_fetches_and_applies_a_single_round() {
        let recorder = SharedRecorder::default();
        let watcher = watcher_with(
            StaticSource::new("fake", json!({"s": {"v": 9}})),
            recorder.clone(),
        );
        watcher
            .add_graph_default("chart", Value::Null, vec![MetricSpec::new(["s"], "v", "V")])
            .unwrap();

        tokio_test::block_on(watcher.tick_once());

        let frames = recorder.frames.lock();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].1[0].latest().unwrap().value, 9.0);
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let watcher = Watcher::builder().build();
        assert!(!watcher.is_running());

        watcher.start();
        watcher.start();
        assert!(watcher.is_running());

        watcher.stop();
        watcher.stop();
        assert!(!watcher.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_polls_sources_on_the_interval() {
        let recorder = SharedRecorder::default();
        let watcher = watcher_with(
            StaticSource::new("fake", json!({"s": {"v": 1}})),
            recorder.clone(),
        );
        watcher
            .add_graph_default("chart", Value::Null, vec![MetricSpec::new(["s"], "v", "V")])
            .unwrap();

        watcher.start();
        tokio::time::sleep(Duration::from_millis(55)).await;
        watcher.stop();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let frames = recorder.frames.lock().len();
        assert!(frames >= 2, "expected several ticks, saw {frames}");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_suppresses_further_ticks() {
        let recorder = SharedRecorder::default();
        let watcher = watcher_with(
            StaticSource::new("fake", json!({"s": {"v": 1}})),
            recorder.clone(),
        );
        watcher
            .add_graph_default("chart", Value::Null, vec![MetricSpec::new(["s"], "v", "V")])
            .unwrap();

        watcher.start();
        tokio::time::sleep(Duration::from_millis(35)).await;
        watcher.stop();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let after_stop = recorder.frames.lock().len();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(recorder.frames.lock().len(), after_stop);
    }

    #[test]
    fn builder_clamps_the_interval_floor() {
        let watcher = Watcher::builder().interval(Duration::from_millis(1)).build();
        assert_eq!(watcher.interval, MIN_INTERVAL);

        let watcher = Watcher::builder().interval(Duration::from_secs(5)).build();
        assert_eq!(watcher.interval, Duration::from_secs(5));
    }

    #[test]
    fn builder_defaults() {
        let watcher = Watcher::builder().build();
        assert_eq!(watcher.interval, DEFAULT_INTERVAL);
        assert_eq!(watcher.sources.len(), 0);
        assert!(!watcher.is_running());
    }
}
