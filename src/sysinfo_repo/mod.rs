// Platform collaborators: counter snapshots and the interface directory.

mod linux;

pub use linux::parse_proc_net_dev;

use crate::models::{DevStat, InterfaceFlags, NetInfo, Stats};
use chrono::Local;
use std::sync::Mutex;
use sysinfo::Networks;
use tracing::instrument;

/// Supplies one consistent reading of every device's counters.
pub trait SnapshotProvider: Send + Sync {
    fn fill(&self) -> anyhow::Result<Stats>;
}

/// Supplies the interface directory. Called once at startup.
pub trait DirectoryProvider {
    fn discover(&self) -> anyhow::Result<NetInfo>;
}

pub struct SysinfoRepo {
    networks: Mutex<Networks>,
}

impl Default for SysinfoRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoRepo {
    pub fn new() -> Self {
        Self {
            networks: Mutex::new(Networks::new_with_refreshed_list()),
        }
    }

    #[cfg_attr(target_os = "linux", allow(dead_code))]
    fn fill_from_sysinfo(&self) -> anyhow::Result<Stats> {
        let mut networks = self
            .networks
            .lock()
            .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?;
        networks.refresh(true);
        let captured_at = Local::now();
        Ok(networks
            .list()
            .iter()
            .map(|(name, data)| {
                (
                    name.clone(),
                    DevStat {
                        captured_at,
                        rx_bytes: data.total_received(),
                        tx_bytes: data.total_transmitted(),
                        rx_packets: data.total_packets_received(),
                        tx_packets: data.total_packets_transmitted(),
                    },
                )
            })
            .collect())
    }
}

impl SnapshotProvider for SysinfoRepo {
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "fill"))]
    fn fill(&self) -> anyhow::Result<Stats> {
        #[cfg(target_os = "linux")]
        {
            linux::read_proc_net_dev()
        }
        #[cfg(not(target_os = "linux"))]
        {
            self.fill_from_sysinfo()
        }
    }
}

impl DirectoryProvider for SysinfoRepo {
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "discover"))]
    fn discover(&self) -> anyhow::Result<NetInfo> {
        let mut networks = self
            .networks
            .lock()
            .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?;
        networks.refresh(true);

        let mut info = NetInfo::new();
        for (name, data) in networks.list() {
            let addrs: Vec<_> = data.ip_networks().iter().map(|n| n.addr).collect();
            let flags = linux::interface_flags(name).unwrap_or_else(|| InterfaceFlags {
                loopback: !addrs.is_empty() && addrs.iter().all(|a| a.is_loopback()),
                point_to_point: false,
            });
            info.add_interface(name, flags, addrs);
        }
        tracing::debug!(
            interfaces = info.interfaces().len(),
            loopback = ?info.loopback().to_sorted_vec(),
            point_to_point = ?info.point_to_point().to_sorted_vec(),
            "interface directory loaded"
        );
        Ok(info)
    }
}
