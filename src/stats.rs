//! Session statistics
//!
//! Counts what the snapshot delivered, what was missing and how the repair
//! went, plus latency percentiles for individual resends.

use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub min_us: u64,
    pub max_us: u64,
    pub mean_us: f64,
    pub p50_us: u64,
    pub p99_us: u64,
}

impl LatencyStats {
    fn from_samples(samples: &[u64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        Some(LatencyStats {
            min_us: sorted[0],
            max_us: sorted[sorted.len() - 1],
            mean_us: sorted.iter().sum::<u64>() as f64 / sorted.len() as f64,
            p50_us: sorted[sorted.len() / 2],
            p99_us: sorted[(sorted.len() * 99) / 100],
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    start_time: Option<Instant>,
    finish_time: Option<Instant>,

    // Snapshot phase
    snapshot_packets: u64,
    snapshot_bytes: u64,
    duplicates: u64,
    trailing_bytes: u64,

    // Repair phase
    gaps: u64,
    recovered: u64,
    failed: u64,
    resend_latencies: Vec<u64>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
        self.finish_time = None;
    }

    pub fn finish(&mut self) {
        self.finish_time = Some(Instant::now());
    }

    pub fn record_snapshot(&mut self, packets: usize, bytes: usize, trailing_bytes: usize) {
        self.snapshot_packets += packets as u64;
        self.snapshot_bytes += bytes as u64;
        self.trailing_bytes += trailing_bytes as u64;
    }

    pub fn record_duplicates(&mut self, count: usize) {
        self.duplicates += count as u64;
    }

    pub fn record_gaps(&mut self, count: usize) {
        self.gaps += count as u64;
    }

    pub fn record_resend(&mut self, recovered: bool, latency: Duration) {
        if recovered {
            self.recovered += 1;
        } else {
            self.failed += 1;
        }
        self.resend_latencies
            .push(u64::try_from(latency.as_micros()).unwrap_or(u64::MAX));
    }

    /// Wall-clock time from `start` to `finish` (or now, if still running)
    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|st| match self.finish_time {
            Some(end) => end.duration_since(st),
            None => st.elapsed(),
        })
    }

    pub fn resend_latency_stats(&self) -> Option<LatencyStats> {
        LatencyStats::from_samples(&self.resend_latencies)
    }

    pub fn snapshot_packets(&self) -> u64 {
        self.snapshot_packets
    }

    pub fn snapshot_bytes(&self) -> u64 {
        self.snapshot_bytes
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    pub fn trailing_bytes(&self) -> u64 {
        self.trailing_bytes
    }

    pub fn gaps(&self) -> u64 {
        self.gaps
    }

    pub fn recovered(&self) -> u64 {
        self.recovered
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn log_summary(&self) {
        info!(
            snapshot_packets = self.snapshot_packets,
            snapshot_bytes = self.snapshot_bytes,
            duplicates = self.duplicates,
            trailing_bytes = self.trailing_bytes,
            elapsed = ?self.elapsed(),
            "snapshot summary"
        );
        info!(
            gaps = self.gaps,
            recovered = self.recovered,
            failed = self.failed,
            "repair summary"
        );

        if let Some(stats) = self.resend_latency_stats() {
            info!(
                min_us = stats.min_us,
                max_us = stats.max_us,
                mean_us = stats.mean_us,
                p50_us = stats.p50_us,
                p99_us = stats.p99_us,
                "resend latency"
            );
        }
    }
}
