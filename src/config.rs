//! Dashboard configuration files.
//!
//! The CLI declares its sources and graphs in a TOML or JSON file:
//!
//! ```toml
//! interval_ms = 5000
//!
//! [[sources]]
//! url = "http://host-a:8080/metrics"
//!
//! [[sources]]
//! file = "/var/run/collector/metrics.json"
//!
//! [[graphs]]
//! target = "requests"
//! [[graphs.metrics]]
//! path = ["stats", "requests"]
//! metric = "count"
//! label = "Requests"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use jsonwatch_sources::{FileSource, HttpSource, MetricSource};
use jsonwatch_types::MetricSpec;

use crate::graph::DEFAULT_TOTAL_POINTS;
use crate::render::Renderer;
use crate::watcher::{Watcher, DEFAULT_INTERVAL};

/// A parsed dashboard file: sources to poll and graphs to display.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dashboard {
    /// Polling interval in milliseconds. Defaults to one second.
    pub interval_ms: Option<u64>,
    pub sources: Vec<SourceConfig>,
    pub graphs: Vec<GraphConfig>,
}

/// One source entry: exactly one of `url` or `file`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub url: Option<String>,
    pub file: Option<String>,
    pub timeout_ms: Option<u64>,
    pub headers: BTreeMap<String, String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SourceConfig {
    fn into_source(self) -> Result<Box<dyn MetricSource>> {
        match (self.url, self.file) {
            (Some(url), None) => {
                let mut builder = HttpSource::builder(&url);
                if let Some(ms) = self.timeout_ms {
                    builder = builder.timeout(Duration::from_millis(ms));
                }
                for (name, value) in self.headers {
                    builder = builder.header(name, value);
                }
                if let (Some(username), Some(password)) = (self.username, self.password) {
                    builder = builder.credentials(username, password);
                }
                let source = builder.build().with_context(|| format!("source {url}"))?;
                Ok(Box::new(source))
            }
            (None, Some(path)) => Ok(Box::new(FileSource::new(path))),
            (Some(_), Some(_)) => bail!("source entry sets both 'url' and 'file'"),
            (None, None) => bail!("source entry sets neither 'url' nor 'file'"),
        }
    }
}

/// One graph entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    pub target: String,
    #[serde(default)]
    pub options: Value,
    #[serde(default = "default_total_points")]
    pub total_points: usize,
    pub metrics: Vec<MetricSpec>,
}

fn default_total_points() -> usize {
    DEFAULT_TOTAL_POINTS
}

impl Dashboard {
    /// Load a dashboard from a TOML or JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .with_context(|| format!("reading {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("parsing {}", path.display()))
    }

    /// The polling interval, defaulting to one second.
    pub fn interval(&self) -> Duration {
        self.interval_ms.map(Duration::from_millis).unwrap_or(DEFAULT_INTERVAL)
    }

    /// Build a watcher from this dashboard, registering every graph.
    pub fn into_watcher(self, renderer: impl Renderer + 'static) -> Result<Watcher> {
        let interval = self.interval();

        let mut builder = Watcher::builder().renderer(renderer).interval(interval);
        for source in self.sources {
            builder = builder.boxed_source(source.into_source()?);
        }
        let watcher = builder.build();

        for graph in self.graphs {
            watcher
                .add_graph(&graph.target, graph.options, graph.metrics, graph.total_points)
                .with_context(|| format!("graph '{}'", graph.target))?;
        }
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_a_toml_dashboard() {
        let file = write_config(
            ".toml",
            r#"
            interval_ms = 5000

            [[sources]]
            url = "http://host-a:8080/metrics"
            timeout_ms = 2000

            [[sources]]
            file = "/var/run/metrics.json"

            [[graphs]]
            target = "requests"
            total_points = 50

            [[graphs.metrics]]
            path = ["stats", "requests"]
            metric = "count"
            label = "Requests"
            operation = "avg"
            "#,
        );

        let dashboard = Dashboard::load(file.path()).unwrap();
        assert_eq!(dashboard.interval(), Duration::from_millis(5000));
        assert_eq!(dashboard.sources.len(), 2);
        assert_eq!(dashboard.graphs.len(), 1);

        let graph = &dashboard.graphs[0];
        assert_eq!(graph.target, "requests");
        assert_eq!(graph.total_points, 50);
        assert_eq!(graph.metrics[0].label, "Requests");
        assert_eq!(graph.metrics[0].operation.as_deref(), Some("avg"));
    }

    #[test]
    fn loads_a_json_dashboard_with_defaults() {
        let file = write_config(
            ".json",
            r#"{
                "sources": [{"url": "http://localhost:9000/stats"}],
                "graphs": [{
                    "target": "chart",
                    "metrics": [
                        {"path": "queues", "metric": "depth", "label": "q $1",
                         "key_regex": "q-(.*)", "show_top": 3}
                    ]
                }]
            }"#,
        );

        let dashboard = Dashboard::load(file.path()).unwrap();
        assert_eq!(dashboard.interval(), DEFAULT_INTERVAL);
        assert_eq!(dashboard.graphs[0].total_points, DEFAULT_TOTAL_POINTS);
        assert_eq!(dashboard.graphs[0].metrics[0].key_regex.as_deref(), Some("q-(.*)"));
        assert_eq!(dashboard.graphs[0].metrics[0].show_top, Some(3));
    }

    #[test]
    fn source_with_url_and_file_is_rejected() {
        let config = SourceConfig {
            url: Some("http://localhost/metrics".into()),
            file: Some("/tmp/metrics.json".into()),
            ..Default::default()
        };
        assert!(config.into_source().is_err());
    }

    #[test]
    fn source_without_url_or_file_is_rejected() {
        assert!(SourceConfig::default().into_source().is_err());
    }

    #[test]
    fn into_watcher_registers_every_graph() {
        let file = write_config(
            ".toml",
            r#"
            [[sources]]
            file = "/var/run/metrics.json"

            [[graphs]]
            target = "a"
            [[graphs.metrics]]
            path = "stats"
            metric = "count"
            label = "Count"

            [[graphs]]
            target = "b"
            [[graphs.metrics]]
            path = "stats"
            metric = "errors"
            label = "Errors"
            "#,
        );

        let dashboard = Dashboard::load(file.path()).unwrap();
        let watcher = dashboard.into_watcher(crate::render::TextRenderer).unwrap();
        assert!(!watcher.is_running());
    }

    #[test]
    fn invalid_metric_descriptor_fails_watcher_construction() {
        let file = write_config(
            ".toml",
            r#"
            [[sources]]
            file = "/var/run/metrics.json"

            [[graphs]]
            target = "a"
            [[graphs.metrics]]
            path = "stats"
            metric = "count"
            label = "Count"
            operation = "median"
            "#,
        );

        let dashboard = Dashboard::load(file.path()).unwrap();
        assert!(dashboard.into_watcher(crate::render::TextRenderer).is_err());
    }
}
