// SPDX-License-Identifier: Apache-2.0

//! Lightweight in-memory counters for the federation layer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use serde::Serialize;

#[derive(Default)]
struct FederationMetrics {
    executions: AtomicU64,
    executions_failed: AtomicU64,
    execution_ms_total: AtomicU64,
    execution_ms_max: AtomicU64,
    releases: AtomicU64,
    releases_failed: AtomicU64,
    metadata_loads: AtomicU64,
    metadata_loads_failed: AtomicU64,
}

static METRICS: OnceLock<FederationMetrics> = OnceLock::new();

fn metrics() -> &'static FederationMetrics {
    METRICS.get_or_init(FederationMetrics::default)
}

pub fn record_execution(duration_ms: f64, success: bool) {
    let duration_ms = duration_ms.max(0.0) as u64;
    let metrics = metrics();
    metrics.executions.fetch_add(1, Ordering::Relaxed);
    if !success {
        metrics.executions_failed.fetch_add(1, Ordering::Relaxed);
    }
    metrics
        .execution_ms_total
        .fetch_add(duration_ms, Ordering::Relaxed);
    metrics
        .execution_ms_max
        .fetch_max(duration_ms, Ordering::Relaxed);
}

pub fn record_release(success: bool) {
    let metrics = metrics();
    metrics.releases.fetch_add(1, Ordering::Relaxed);
    if !success {
        metrics.releases_failed.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_metadata_load(success: bool) {
    let metrics = metrics();
    metrics.metadata_loads.fetch_add(1, Ordering::Relaxed);
    if !success {
        metrics.metadata_loads_failed.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FederationMetricsSnapshot {
    pub executions: u64,
    pub executions_failed: u64,
    pub releases: u64,
    pub releases_failed: u64,
    pub metadata_loads: u64,
    pub metadata_loads_failed: u64,
    pub avg_execution_ms: Option<f64>,
    pub max_execution_ms: Option<u64>,
}

pub fn snapshot() -> FederationMetricsSnapshot {
    let metrics = metrics();
    let executions = metrics.executions.load(Ordering::Relaxed);
    let total_ms = metrics.execution_ms_total.load(Ordering::Relaxed);
    let max_ms = metrics.execution_ms_max.load(Ordering::Relaxed);

    FederationMetricsSnapshot {
        executions,
        executions_failed: metrics.executions_failed.load(Ordering::Relaxed),
        releases: metrics.releases.load(Ordering::Relaxed),
        releases_failed: metrics.releases_failed.load(Ordering::Relaxed),
        metadata_loads: metrics.metadata_loads.load(Ordering::Relaxed),
        metadata_loads_failed: metrics.metadata_loads_failed.load(Ordering::Relaxed),
        avg_execution_ms: (executions > 0).then(|| total_ms as f64 / executions as f64),
        max_execution_ms: (max_ms > 0).then_some(max_ms),
    }
}
