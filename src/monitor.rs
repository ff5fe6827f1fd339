//! Process memory monitoring, logged between pipeline phases so users on
//! small machines can see where their RAM goes.

use log::info;
use std::time::Instant;
use sysinfo::{Pid, RefreshKind, System};

#[derive(Debug, Clone)]
pub struct MemoryStats {
    pub used_mb: u64,
    pub used_percent: f32,
    pub peak_mb: u64,
}

pub struct MemoryMonitor {
    system: System,
    pid: Option<Pid>,
    peak_mb: u64,
    start_time: Instant,
}

impl MemoryMonitor {
    pub fn new() -> Self {
        let mut system = System::new_with_specifics(RefreshKind::everything());
        system.refresh_all();

        Self {
            system,
            pid: sysinfo::get_current_pid().ok(),
            peak_mb: 0,
            start_time: Instant::now(),
        }
    }

    /// Sample the current process memory. Returns None when the process
    /// cannot be inspected on this platform.
    pub fn sample(&mut self) -> Option<MemoryStats> {
        let pid = self.pid?;
        self.system.refresh_all();

        let process = self.system.process(pid)?;
        let used_mb = process.memory() / 1024 / 1024;
        let total_mb = self.system.total_memory() / 1024 / 1024;
        let used_percent = if total_mb > 0 {
            (used_mb as f32 / total_mb as f32) * 100.0
        } else {
            0.0
        };

        if used_mb > self.peak_mb {
            self.peak_mb = used_mb;
        }

        Some(MemoryStats {
            used_mb,
            used_percent,
            peak_mb: self.peak_mb,
        })
    }

    /// Log memory usage for a named pipeline phase.
    pub fn log_usage(&mut self, phase: &str) {
        let elapsed = self.start_time.elapsed();
        if let Some(stats) = self.sample() {
            info!(
                "💾 {} - Memory: {}MB ({:.1}%), Peak: {}MB, Elapsed: {:.1}s",
                phase,
                stats.used_mb,
                stats.used_percent,
                stats.peak_mb,
                elapsed.as_secs_f64()
            );
        }
    }

    pub fn peak_mb(&self) -> u64 {
        self.peak_mb
    }
}

impl Default for MemoryMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_tracks_peak() {
        let mut monitor = MemoryMonitor::new();
        if let Some(stats) = monitor.sample() {
            assert!(stats.peak_mb >= stats.used_mb || stats.peak_mb == monitor.peak_mb());
            assert!(monitor.peak_mb() > 0);
        }
    }
}
