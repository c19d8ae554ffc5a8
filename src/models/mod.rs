// Snapshot and interface directory models

mod netinfo;
mod stats;

pub use netinfo::{InterfaceFlags, IpMap, NetInfo};
pub use stats::{DevStat, Stats};
