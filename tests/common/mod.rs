// Shared test helpers

#![allow(dead_code)]

use chrono::{DateTime, Local, TimeDelta, TimeZone};
use netvolmon::matcher::HostResolver;
use netvolmon::models::{DevStat, InterfaceFlags, NetInfo, Stats};
use netvolmon::sysinfo_repo::SnapshotProvider;
use std::net::IpAddr;
use std::sync::Mutex;

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

pub fn at(secs: i64) -> DateTime<Local> {
    Local.timestamp_opt(1_700_000_000, 0).unwrap() + TimeDelta::seconds(secs)
}

pub fn stat(secs: i64, rx: u64, tx: u64) -> DevStat {
    DevStat {
        captured_at: at(secs),
        rx_bytes: rx,
        tx_bytes: tx,
        rx_packets: rx / 64,
        tx_packets: tx / 64,
    }
}

/// Snapshot of `(name, rx_bytes, tx_bytes)` taken `secs` after the epoch used by `at`.
pub fn snapshot(secs: i64, devices: &[(&str, u64, u64)]) -> Stats {
    devices
        .iter()
        .map(|(name, rx, tx)| (*name, stat(secs, *rx, *tx)))
        .collect()
}

pub fn plain() -> InterfaceFlags {
    InterfaceFlags::default()
}

pub fn loopback() -> InterfaceFlags {
    InterfaceFlags {
        loopback: true,
        point_to_point: false,
    }
}

pub fn point_to_point() -> InterfaceFlags {
    InterfaceFlags {
        loopback: false,
        point_to_point: true,
    }
}

/// Directory with `(name, flags, addresses)` entries.
pub fn directory(entries: &[(&str, InterfaceFlags, &[&str])]) -> NetInfo {
    let mut info = NetInfo::new();
    for (name, flags, addrs) in entries {
        info.add_interface(name, *flags, addrs.iter().map(|a| ip(a)));
    }
    info
}

pub struct FixedHosts(pub Vec<IpAddr>);

impl HostResolver for FixedHosts {
    fn local_addresses(&self) -> anyhow::Result<Vec<IpAddr>> {
        Ok(self.0.clone())
    }
}

/// Hands out snapshots one second apart with eth0 receiving 1 KiB/s and
/// sending 512 B/s.
pub struct SteadyProvider {
    tick: Mutex<i64>,
}

impl SteadyProvider {
    pub fn new() -> Self {
        Self {
            tick: Mutex::new(0),
        }
    }

    pub fn next(&self) -> Stats {
        let mut tick = self.tick.lock().unwrap();
        *tick += 1;
        let n = *tick as u64;
        snapshot(*tick, &[("eth0", n * 1024, n * 512), ("lo", 0, 0)])
    }
}

impl SnapshotProvider for SteadyProvider {
    fn fill(&self) -> anyhow::Result<Stats> {
        Ok(self.next())
    }
}

pub struct FailingProvider;

impl SnapshotProvider for FailingProvider {
    fn fill(&self) -> anyhow::Result<Stats> {
        anyhow::bail!("counters unavailable")
    }
}
