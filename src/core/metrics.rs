//! Metrics accumulator: process-wide counters for dashboards
//!
//! Updated per tool call and per verdict; never consulted by the resolver.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::types::{FloorId, Verdict};

/// Latency reservoir bounded at this many samples (oldest dropped first)
const RESERVOIR_CAP: usize = 4096;

#[derive(Default)]
struct MetricsInner {
    tool_usage: BTreeMap<String, u64>,
    verdict_distribution: BTreeMap<String, u64>,
    latency_ms: Vec<f64>,
    floor_health: BTreeMap<FloorId, bool>,
}

/// Process-wide metrics accumulator
pub struct Metrics {
    inner: Mutex<MetricsInner>,
    started_at: Instant,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time snapshot served by the metrics endpoint
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub tool_usage: BTreeMap<String, u64>,
    pub verdict_distribution: BTreeMap<String, u64>,
    pub latency_ms: LatencySummary,
    pub floor_health: BTreeMap<String, bool>,
    pub active_sessions: usize,
    pub uptime_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencySummary {
    pub count: usize,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsInner::default()),
            started_at: Instant::now(),
        }
    }

    pub async fn record_tool(&self, tool: &str, latency_ms: f64) {
        let mut inner = self.inner.lock().await;
        *inner.tool_usage.entry(tool.to_string()).or_insert(0) += 1;
        if inner.latency_ms.len() >= RESERVOIR_CAP {
            inner.latency_ms.remove(0);
        }
        inner.latency_ms.push(latency_ms);
    }

    pub async fn record_verdict(&self, verdict: Verdict) {
        let mut inner = self.inner.lock().await;
        *inner
            .verdict_distribution
            .entry(verdict.to_string())
            .or_insert(0) += 1;
    }

    /// Most-recent pass/fail per floor
    pub async fn record_floor(&self, floor: FloorId, passed: bool) {
        self.inner.lock().await.floor_health.insert(floor, passed);
    }

    pub async fn snapshot(&self, active_sessions: usize) -> MetricsSnapshot {
        let inner = self.inner.lock().await;
        let mut sorted = inner.latency_ms.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let latency = LatencySummary {
            count: sorted.len(),
            mean: if sorted.is_empty() {
                0.0
            } else {
                sorted.iter().sum::<f64>() / sorted.len() as f64
            },
            p50: percentile(&sorted, 0.50),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
        };

        MetricsSnapshot {
            tool_usage: inner.tool_usage.clone(),
            verdict_distribution: inner.verdict_distribution.clone(),
            latency_ms: latency,
            floor_health: inner
                .floor_health
                .iter()
                .map(|(k, v)| (k.label().to_string(), *v))
                .collect(),
            active_sessions,
            uptime_hours: self.started_at.elapsed().as_secs_f64() / 3600.0,
        }
    }
}

fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 - 1.0) * q).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

// =============================================================================
// TESTS
// =============================================================================
