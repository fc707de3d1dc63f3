// Metrics collection and tracking

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Latency samples kept for percentile calculation.
const MAX_LATENCY_SAMPLES: usize = 1000;

/// Per-endpoint request counters
#[derive(Debug, Clone)]
pub struct EndpointMetrics {
    pub request_count: Arc<AtomicU64>,
    pub error_count: Arc<AtomicU64>,
    pub total_latency_ms: Arc<AtomicU64>,
    pub min_latency_ms: Arc<AtomicU64>,
    pub max_latency_ms: Arc<AtomicU64>,
    latency_samples: Arc<Mutex<Vec<u64>>>,
}

impl EndpointMetrics {
    pub fn new() -> Self {
        Self {
            request_count: Arc::new(AtomicU64::new(0)),
            error_count: Arc::new(AtomicU64::new(0)),
            total_latency_ms: Arc::new(AtomicU64::new(0)),
            min_latency_ms: Arc::new(AtomicU64::new(u64::MAX)),
            max_latency_ms: Arc::new(AtomicU64::new(0)),
            latency_samples: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn record_request(&self, latency_ms: u64) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.min_latency_ms.fetch_min(latency_ms, Ordering::Relaxed);
        self.max_latency_ms.fetch_max(latency_ms, Ordering::Relaxed);

        if let Ok(mut samples) = self.latency_samples.lock() {
            samples.push(latency_ms);
            if samples.len() > MAX_LATENCY_SAMPLES {
                samples.remove(0);
            }
        }
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_ms(&self) -> f64 {
        let count = self.request_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        total as f64 / count as f64
    }

    fn percentile(&self, p: u8) -> u64 {
        if let Ok(samples) = self.latency_samples.lock() {
            if samples.is_empty() {
                return 0;
            }
            let mut sorted = samples.clone();
            sorted.sort_unstable();
            let index = (sorted.len() * p as usize / 100).min(sorted.len() - 1);
            sorted[index]
        } else {
            0
        }
    }

    pub fn stats(&self) -> EndpointStats {
        let min = self.min_latency_ms.load(Ordering::Relaxed);
        EndpointStats {
            request_count: self.request_count.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
            avg_latency_ms: self.avg_latency_ms(),
            min_latency_ms: if min == u64::MAX { 0 } else { min },
            max_latency_ms: self.max_latency_ms.load(Ordering::Relaxed),
            p50_latency_ms: self.percentile(50),
            p95_latency_ms: self.percentile(95),
            p99_latency_ms: self.percentile(99),
        }
    }
}

impl Default for EndpointMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Synthesis-specific counters
#[derive(Debug, Clone, Default)]
pub struct SynthesisMetrics {
    pub synthesis_count: Arc<AtomicU64>,
    pub total_synthesis_time_ms: Arc<AtomicU64>,
    pub total_chunks: Arc<AtomicU64>,
    pub total_audio_ms: Arc<AtomicU64>,
    pub model_load_failures: Arc<AtomicU64>,
}

impl SynthesisMetrics {
    pub fn record_synthesis(&self, time_ms: u64, chunks: usize, audio_secs: f64) {
        self.synthesis_count.fetch_add(1, Ordering::Relaxed);
        self.total_synthesis_time_ms.fetch_add(time_ms, Ordering::Relaxed);
        self.total_chunks.fetch_add(chunks as u64, Ordering::Relaxed);
        self.total_audio_ms
            .fetch_add((audio_secs * 1000.0) as u64, Ordering::Relaxed);
    }

    pub fn record_load_failure(&self) {
        self.model_load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> SynthesisStats {
        let count = self.synthesis_count.load(Ordering::Relaxed);
        let total_ms = self.total_synthesis_time_ms.load(Ordering::Relaxed);
        let audio_ms = self.total_audio_ms.load(Ordering::Relaxed);
        SynthesisStats {
            synthesis_count: count,
            avg_synthesis_time_ms: if count == 0 {
                0.0
            } else {
                total_ms as f64 / count as f64
            },
            total_chunks: self.total_chunks.load(Ordering::Relaxed),
            total_audio_secs: audio_ms as f64 / 1000.0,
            // synthesis time per second of produced audio
            real_time_factor: if audio_ms == 0 {
                0.0
            } else {
                total_ms as f64 / audio_ms as f64
            },
            model_load_failures: self.model_load_failures.load(Ordering::Relaxed),
        }
    }
}

/// All server metrics
#[derive(Debug, Clone)]
pub struct AppMetrics {
    pub tts: EndpointMetrics,
    pub synthesis: SynthesisMetrics,
    started: Instant,
}

impl AppMetrics {
    pub fn new() -> Self {
        Self {
            tts: EndpointMetrics::new(),
            synthesis: SynthesisMetrics::default(),
            started: Instant::now(),
        }
    }

    pub fn snapshot(&self) -> MetricsResponse {
        MetricsResponse {
            timestamp: Utc::now(),
            uptime_seconds: self.started.elapsed().as_secs(),
            tts: self.tts.stats(),
            synthesis: self.synthesis.stats(),
        }
    }
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub tts: EndpointStats,
    pub synthesis: SynthesisStats,
}

#[derive(Debug, Serialize)]
pub struct EndpointStats {
    pub request_count: u64,
    pub error_count: u64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub p50_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct SynthesisStats {
    pub synthesis_count: u64,
    pub avg_synthesis_time_ms: f64,
    pub total_chunks: u64,
    pub total_audio_secs: f64,
    pub real_time_factor: f64,
    pub model_load_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_stats_track_latency() {
        let m = EndpointMetrics::new();
        assert_eq!(m.stats().min_latency_ms, 0);

        for ms in [30, 10, 20] {
            m.record_request(ms);
        }
        m.record_error();

        let stats = m.stats();
        assert_eq!(stats.request_count, 3);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.min_latency_ms, 10);
        assert_eq!(stats.max_latency_ms, 30);
        assert_eq!(stats.p50_latency_ms, 20);
        assert!((stats.avg_latency_ms - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn synthesis_stats_compute_real_time_factor() {
        let m = SynthesisMetrics::default();
        m.record_synthesis(500, 2, 2.0);
        m.record_synthesis(1500, 1, 2.0);

        let stats = m.stats();
        assert_eq!(stats.synthesis_count, 2);
        assert_eq!(stats.total_chunks, 3);
        assert!((stats.total_audio_secs - 4.0).abs() < 1e-9);
        assert!((stats.real_time_factor - 0.5).abs() < 1e-9);
        assert!((stats.avg_synthesis_time_ms - 1000.0).abs() < 1e-9);
    }
}
