//! The rendering boundary.
//!
//! The engine never draws anything itself; once per tick per graph it
//! hands the visible series to a [`Renderer`] and moves on.

use serde_json::Value;

use jsonwatch_types::Sample;

/// One visible series: a label and its ordered retained samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub samples: Vec<Sample>,
}

impl Series {
    /// The most recent sample, if any.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

/// Consumes each graph's visible series once per tick.
pub trait Renderer: Send {
    /// Redraw `target` with the given series. `options` is the opaque
    /// value supplied at graph registration.
    fn render(&mut self, target: &str, options: &Value, series: &[Series]);
}

/// A renderer that prints each series' latest value, one line per
/// series. The default renderer for the CLI.
#[derive(Debug, Default)]
pub struct TextRenderer;

impl TextRenderer {
    fn lines(target: &str, series: &[Series]) -> Vec<String> {
        let mut lines = Vec::with_capacity(series.len());
        for s in series {
            let line = match s.latest() {
                Some(sample) => format!("{target}: {} = {}", s.label, sample.value),
                None => format!("{target}: {} = -", s.label),
            };
            lines.push(line);
        }
        lines
    }
}

impl Renderer for TextRenderer {
    fn render(&mut self, target: &str, _options: &Value, series: &[Series]) {
        for line in Self::lines(target, series) {
            println!("{line}");
        }
    }
}

/// A renderer that records everything it was asked to draw. Test-only
/// outside this crate's own tests, but exported so downstream callers
/// can assert on render output as well.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    /// One entry per render call: the target and the series it received.
    pub frames: Vec<(String, Vec<Series>)>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, target: &str, _options: &Value, series: &[Series]) {
        self.frames.push((target.to_string(), series.to_vec()));
    }
}
