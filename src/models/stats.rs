// Raw per-device counters and timestamped snapshots

use chrono::{DateTime, Local};
use std::collections::BTreeMap;

/// A point-in-time reading of one device's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevStat {
    pub captured_at: DateTime<Local>,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
}

/// All device counters from a single read, keyed by device name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    devices: BTreeMap<String, DevStat>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, stat: DevStat) {
        self.devices.insert(name.into(), stat);
    }

    pub fn get(&self, name: &str) -> Option<&DevStat> {
        self.devices.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DevStat)> {
        self.devices.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> Vec<String> {
        self.devices.keys().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<(S, DevStat)> for Stats {
    fn from_iter<I: IntoIterator<Item = (S, DevStat)>>(iter: I) -> Self {
        let mut stats = Stats::new();
        for (name, stat) in iter {
            stats.insert(name, stat);
        }
        stats
    }
}
