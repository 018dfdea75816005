//! Per-host request rate statistics
//!
//! Requests are counted per `Host` header over fixed windows of capture time. Windows are driven
//! by packet timestamps rather than the wall clock, so replayed capture files report the rates
//! they were recorded at.

use std::collections::HashMap;

/// Rate of one host over a finished window.
#[derive(Debug, Clone, PartialEq)]
pub struct HostRate {
    pub host: String,
    pub requests: u64,
    /// Requests per second over the window.
    pub rate: f64,
}

/// Hosts at or above the threshold for one window, highest rate first.
#[derive(Debug, Clone, PartialEq)]
pub struct RateReport {
    pub window_start: i64,
    pub interval: u64,
    pub hosts: Vec<HostRate>,
}

#[derive(Debug)]
pub struct HostStats {
    interval: u64,
    threshold: u64,
    window_start: Option<i64>,
    counts: HashMap<String, u64>,
}

impl HostStats {
    /// `interval` is the window length in seconds and must be non zero, `threshold` the
    /// minimum requests per second for a host to be reported.
    pub fn new(interval: u64, threshold: u64) -> Self {
        Self {
            interval: interval.max(1),
            threshold,
            window_start: None,
            counts: HashMap::new(),
        }
    }

    /// Count one request to `host` seen at `ts` (seconds). Returns the report of the previous
    /// window when `ts` falls past its end.
    pub fn update(&mut self, host: &str, ts: i64) -> Option<RateReport> {
        let report = self.roll_window(ts);

        match self.counts.get_mut(host) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(host.to_string(), 1);
            }
        }

        report
    }

    /// Report of the window in progress, the counters start over.
    pub fn finish(&mut self) -> Option<RateReport> {
        let start = self.window_start.take()?;
        Some(self.report(start))
    }

    fn roll_window(&mut self, ts: i64) -> Option<RateReport> {
        let start = *self.window_start.get_or_insert(ts);
        if ts - start < self.interval as i64 {
            return None;
        }

        let report = self.report(start);
        self.window_start = Some(ts);
        Some(report)
    }

    fn report(&mut self, window_start: i64) -> RateReport {
        let interval = self.interval;
        let threshold = self.threshold as f64;

        let mut hosts: Vec<HostRate> = self
            .counts
            .drain()
            .map(|(host, requests)| HostRate {
                host,
                requests,
                rate: requests as f64 / interval as f64,
            })
            .filter(|h| h.rate >= threshold)
            .collect();
        hosts.sort_by(|a, b| {
            b.rate
                .partial_cmp(&a.rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.host.cmp(&b.host))
        });

        RateReport {
            window_start,
            interval,
            hosts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_after_interval() {
        let mut stats = HostStats::new(10, 0);

        assert!(stats.update("a.example", 100).is_none());
        assert!(stats.update("b.example", 101).is_none());
        assert!(stats.update("a.example", 109).is_none());

        let report = stats.update("a.example", 110).unwrap();
        assert_eq!(report.window_start, 100);
        assert_eq!(report.hosts.len(), 2);
        assert_eq!(report.hosts[0].host, "a.example");
        assert_eq!(report.hosts[0].requests, 2);
        assert!((report.hosts[0].rate - 0.2).abs() < f64::EPSILON);
        assert_eq!(report.hosts[1].host, "b.example");

        // The packet that closed the window opens the next one.
        let report = stats.finish().unwrap();
        assert_eq!(report.window_start, 110);
        assert_eq!(report.hosts[0].requests, 1);
        assert!(stats.finish().is_none());
    }

    #[test]
    fn threshold_filters_slow_hosts() {
        let mut stats = HostStats::new(1, 2);

        stats.update("busy", 5);
        stats.update("busy", 5);
        stats.update("quiet", 5);

        let report = stats.finish().unwrap();
        assert_eq!(report.hosts.len(), 1);
        assert_eq!(report.hosts[0].host, "busy");
    }
}
