// Counter deltas between consecutive snapshots, and per-second rates.

use crate::models::{DevStat, Stats};
use chrono::{DateTime, Local, TimeDelta};
use serde::Deserialize;
use std::collections::BTreeMap;

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;

/// Difference between two readings of one device.
///
/// A delta is invalid when any counter went backwards between the readings
/// (rollover, driver reset, a replaced interface). Invalid deltas carry zeros
/// for the offending fields and must not be turned into rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevDelta {
    pub captured_at: DateTime<Local>,
    pub elapsed: TimeDelta,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    valid: bool,
}

/// Subtracts if the counter did not go backwards, folding the result into
/// the running validity flag.
fn sub_checked(old: u64, new: u64, good: bool) -> (u64, bool) {
    match new.checked_sub(old) {
        Some(d) => (d, good),
        None => (0, false),
    }
}

impl DevDelta {
    pub fn between(prior: &DevStat, current: &DevStat) -> Self {
        let good = true;
        let (rx_bytes, good) = sub_checked(prior.rx_bytes, current.rx_bytes, good);
        let (tx_bytes, good) = sub_checked(prior.tx_bytes, current.tx_bytes, good);
        let (rx_packets, good) = sub_checked(prior.rx_packets, current.rx_packets, good);
        let (tx_packets, good) = sub_checked(prior.tx_packets, current.tx_packets, good);
        Self {
            captured_at: current.captured_at,
            elapsed: current.captured_at - prior.captured_at,
            rx_bytes,
            tx_bytes,
            rx_packets,
            tx_packets,
            valid: good,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Per-second rates, with byte counts divided by `bandwidth_divisor`.
    /// `None` for invalid deltas and for non-positive elapsed time.
    pub fn rates(&self, bandwidth_divisor: f64) -> Option<Rates> {
        if !self.valid {
            return None;
        }
        let secs = self.elapsed.to_std().ok()?.as_secs_f64();
        if secs <= 0.0 {
            return None;
        }
        let byte_secs = secs * bandwidth_divisor;
        Some(Rates {
            rx_bandwidth: self.rx_bytes as f64 / byte_secs,
            tx_bandwidth: self.tx_bytes as f64 / byte_secs,
            rx_packets: self.rx_packets as f64 / secs,
            tx_packets: self.tx_packets as f64 / secs,
        })
    }
}

/// Checked delta of one device; the flag is the AND of all four fields.
pub fn delta(prior: &DevStat, current: &DevStat) -> (DevDelta, bool) {
    let d = DevDelta::between(prior, current);
    (d, d.valid)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub rx_bandwidth: f64,
    pub tx_bandwidth: f64,
    pub rx_packets: f64,
    pub tx_packets: f64,
}

/// Valid deltas for one cycle, keyed by device name.
pub type Deltas = BTreeMap<String, DevDelta>;

/// Diffs every device in `current` against `prior`. Devices new in `current`
/// and devices gone from it are skipped, as are invalid deltas.
pub fn diff_all(prior: &Stats, current: &Stats) -> Deltas {
    let mut deltas = Deltas::new();
    for (name, now) in current.iter() {
        let Some(before) = prior.get(name) else {
            tracing::trace!(device = name, "no prior reading");
            continue;
        };
        let d = DevDelta::between(before, now);
        if d.is_valid() {
            deltas.insert(name.to_string(), d);
        } else {
            tracing::debug!(device = name, "counter went backwards; skipping cycle");
        }
    }
    deltas
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum BandwidthUnit {
    #[serde(rename = "KB")]
    Kilobytes,
    #[default]
    #[serde(rename = "MB")]
    Megabytes,
}

impl BandwidthUnit {
    pub fn divisor(self) -> f64 {
        match self {
            BandwidthUnit::Kilobytes => KB,
            BandwidthUnit::Megabytes => MB,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BandwidthUnit::Kilobytes => "KB/s",
            BandwidthUnit::Megabytes => "MB/s",
        }
    }
}
