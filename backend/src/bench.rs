//! Latency and memory measurement for a single image.
//!
//! Each measured iteration is one preprocess + forward pass, the same work a
//! prediction request does before the decision rule.

use crate::model::InferenceError;
use crate::pipeline::Pipeline;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Iterations run before measuring (excluded from statistics).
    pub warmup_iterations: usize,
    pub iterations: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            warmup_iterations: 3,
            iterations: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub mean_ms: f64,
    pub std_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl LatencyStats {
    pub fn from_durations(durations: &[Duration]) -> Self {
        if durations.is_empty() {
            return Self::default();
        }

        let mut times_ms: Vec<f64> = durations.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        times_ms.sort_by(|a, b| a.total_cmp(b));

        let n = times_ms.len();
        let mean = times_ms.iter().sum::<f64>() / n as f64;
        let variance = times_ms.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n as f64;

        Self {
            mean_ms: mean,
            std_ms: variance.sqrt(),
            min_ms: times_ms[0],
            max_ms: times_ms[n - 1],
            p50_ms: percentile(&times_ms, 50.0),
            p95_ms: percentile(&times_ms, 95.0),
            p99_ms: percentile(&times_ms, 99.0),
        }
    }
}

/// Nearest-rank percentile over sorted data.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Resident memory of this process, read from `/proc/self/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStats {
    pub rss_mb: f64,
    pub peak_rss_mb: f64,
}

impl MemoryStats {
    /// `None` where `/proc` is unavailable.
    pub fn current() -> Option<Self> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        Some(Self {
            rss_mb: status_field_mb(&status, "VmRSS:")?,
            peak_rss_mb: status_field_mb(&status, "VmHWM:")?,
        })
    }
}

fn status_field_mb(status: &str, key: &str) -> Option<f64> {
    let line = status.lines().find(|l| l.starts_with(key))?;
    let kb: f64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb / 1024.0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub model: String,
    /// Wall time of the first, cold inference.
    pub first_run_secs: f64,
    pub latency: LatencyStats,
    pub throughput: f64,
    pub memory_before: Option<MemoryStats>,
    pub memory_after: Option<MemoryStats>,
    pub config: BenchmarkConfig,
    pub timestamp: String,
}

impl BenchmarkReport {
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
    }

    /// Peak resident memory growth over the run, in MB.
    pub fn peak_growth_mb(&self) -> Option<f64> {
        let before = self.memory_before.as_ref()?;
        let after = self.memory_after.as_ref()?;
        Some((after.peak_rss_mb - before.rss_mb).max(0.0))
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model:            {}", self.model)?;
        writeln!(f, "Inference time:   {:.4} s (first run)", self.first_run_secs)?;
        writeln!(
            f,
            "Latency:          {:.2} ms mean, {:.2} ms p50, {:.2} ms p95, {:.2} ms p99 ({} runs)",
            self.latency.mean_ms,
            self.latency.p50_ms,
            self.latency.p95_ms,
            self.latency.p99_ms,
            self.config.iterations
        )?;
        writeln!(f, "Throughput:       {:.1} images/s", self.throughput)?;
        match (&self.memory_after, self.peak_growth_mb()) {
            (Some(mem), Some(growth)) => writeln!(
                f,
                "Peak memory:      {:.4} MB resident ({:.4} MB above baseline)",
                mem.peak_rss_mb, growth
            ),
            _ => writeln!(f, "Peak memory:      unavailable on this platform"),
        }
    }
}

/// Times `iterations` preprocess + forward passes on `image`.
pub fn run_benchmark(
    pipeline: &Pipeline,
    image: &DynamicImage,
    config: &BenchmarkConfig,
) -> Result<BenchmarkReport, InferenceError> {
    let memory_before = MemoryStats::current();

    let first_run = time_once(pipeline, image)?;
    log::info!("First inference took {:.4}s", first_run.as_secs_f64());

    for _ in 0..config.warmup_iterations {
        time_once(pipeline, image)?;
    }

    let timings = (0..config.iterations)
        .map(|_| time_once(pipeline, image))
        .collect::<Result<Vec<_>, _>>()?;

    let latency = LatencyStats::from_durations(&timings);
    let throughput = if latency.mean_ms > 0.0 {
        1000.0 / latency.mean_ms
    } else {
        0.0
    };

    Ok(BenchmarkReport {
        model: pipeline.model().describe(),
        first_run_secs: first_run.as_secs_f64(),
        latency,
        throughput,
        memory_before,
        memory_after: MemoryStats::current(),
        config: config.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

fn time_once(pipeline: &Pipeline, image: &DynamicImage) -> Result<Duration, InferenceError> {
    let start = Instant::now();
    let batch = pipeline.preprocess(image);
    pipeline.infer(&batch)?;
    Ok(start.elapsed())
}
