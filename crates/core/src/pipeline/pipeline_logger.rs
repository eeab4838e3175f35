use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for analysis progress, stage timings and per-tile metrics.
///
/// Keeps the orchestration free of any particular output channel.
pub trait PipelineLogger: Send {
    /// Tiles finished so far out of `total`.
    fn progress(&mut self, current: usize, total: usize);

    /// Duration of one run of a named stage.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// One sample of a named metric (e.g. detections per tile).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Logger that discards everything. Used by tests and library callers
/// with their own reporting.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleStats {
    pub count: usize,
    pub total: f64,
    pub max: f64,
}

impl SampleStats {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.max = if self.count == 1 { value } else { self.max.max(value) };
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// CLI logger: forwards messages to the `log` facade and aggregates stage
/// timings and metrics for a closing summary.
pub struct StdoutPipelineLogger {
    timings: BTreeMap<String, SampleStats>,
    metrics: BTreeMap<String, SampleStats>,
    start_time: Instant,
    tiles_done: usize,
    total_tiles: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            tiles_done: 0,
            total_tiles: 0,
            messages: Vec::new(),
        }
    }

    /// Formatted summary, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Analysis summary ({}/{} tiles, {:.1}s total):",
            self.tiles_done,
            self.total_tiles,
            elapsed_ms / 1000.0
        )];

        for (stage, stats) in &self.timings {
            lines.push(format!(
                "  {stage:14}: avg {:7.1}ms  max {:7.1}ms  total {:8.0}ms",
                stats.mean(),
                stats.max,
                stats.total
            ));
        }
        for (name, stats) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1}, total {:.0}", stats.mean(), stats.total));
        }

        if self.tiles_done > 0 && elapsed_ms > 0.0 {
            let rate = self.tiles_done as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {rate:.2} tiles/s"));
        }

        Some(lines.join("\n"))
    }

    pub fn timing_stats(&self, stage: &str) -> Option<SampleStats> {
        self.timings.get(stage).copied()
    }

    pub fn metric_stats(&self, name: &str) -> Option<SampleStats> {
        self.metrics.get(name).copied()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.tiles_done = current;
        self.total_tiles = total;
        if total > 0 {
            log::info!("Tiles: {current}/{total}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
