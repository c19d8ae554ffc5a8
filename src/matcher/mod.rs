// Device matching: turns one command-line token into a set of device names.
//
// Each strategy answers independently; the cascade tries them in order and
// the first one that matches anything wins.

mod ip;
mod name;
mod special;

pub use ip::{CidrBlock, ExactIp, IpGlob};
pub use name::{ExactName, NameGlob};
pub use special::{HostResolver, Me, SiteName, SystemHostResolver};

use crate::devset::DeviceSet;
use crate::models::NetInfo;
use crate::netnames::SymbolTable;

/// Read-only state every strategy matches against.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub netinfo: &'a NetInfo,
    pub symbols: &'a SymbolTable,
}

/// One way of interpreting a device token.
///
/// Implementations must not fail on malformed tokens; anything they cannot
/// make sense of is simply no match.
pub trait DeviceMatcher {
    fn name(&self) -> &'static str;

    /// The devices `token` selects, or `None` if it selects nothing.
    fn find(&self, token: &str, ctx: &MatchContext<'_>) -> Option<DeviceSet>;
}

/// Ordered list of strategies, cheapest and least ambiguous first.
pub struct Cascade {
    matchers: Vec<Box<dyn DeviceMatcher>>,
}

impl Cascade {
    pub fn new(matchers: Vec<Box<dyn DeviceMatcher>>) -> Self {
        Self { matchers }
    }

    /// Exact name, `me`, site names, name glob, exact IP, CIDR, IP glob.
    pub fn standard(hosts: Box<dyn HostResolver>) -> Self {
        Self::new(vec![
            Box::new(ExactName),
            Box::new(Me::new(hosts)),
            Box::new(SiteName),
            Box::new(NameGlob),
            Box::new(ExactIp),
            Box::new(CidrBlock),
            Box::new(IpGlob),
        ])
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Runs the strategies in order and returns the first hit along with
    /// the name of the strategy that produced it.
    pub fn find(&self, token: &str, ctx: &MatchContext<'_>) -> Option<(&'static str, DeviceSet)> {
        self.matchers.iter().find_map(|m| {
            m.find(token, ctx)
                .filter(|found| !found.is_empty())
                .map(|found| (m.name(), found))
        })
    }
}

/// Devices of every address in `ip_map` accepted by `keep`.
pub(crate) fn devices_where(
    ctx: &MatchContext<'_>,
    mut keep: impl FnMut(&std::net::IpAddr) -> bool,
) -> Option<DeviceSet> {
    let mut found = DeviceSet::new();
    for (ip, devices) in ctx.netinfo.ip_map().iter() {
        if keep(ip) {
            found.add_all(devices.iter().map(String::as_str));
        }
    }
    (!found.is_empty()).then_some(found)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::InterfaceFlags;
    use std::net::IpAddr;

    /// Host resolver returning a fixed answer.
    pub struct FixedHosts(pub Option<Vec<IpAddr>>);

    impl HostResolver for FixedHosts {
        fn local_addresses(&self) -> anyhow::Result<Vec<IpAddr>> {
            self.0
                .clone()
                .ok_or_else(|| anyhow::anyhow!("lookup failed"))
        }
    }

    /// eth0 10.0.0.5, eth1 192.168.1.1, wlan0 172.29.4.2, lo 127.0.0.1,
    /// and a VRRP address shared by eth0 and eth1.
    pub fn directory() -> NetInfo {
        let ip = |s: &str| -> IpAddr { s.parse().unwrap() };
        let mut info = NetInfo::new();
        info.add_interface(
            "eth0",
            InterfaceFlags::default(),
            [ip("10.0.0.5"), ip("10.9.9.9"), ip("fe80::1")],
        );
        info.add_interface(
            "eth1",
            InterfaceFlags::default(),
            [ip("192.168.1.1"), ip("10.9.9.9")],
        );
        info.add_interface("wlan0", InterfaceFlags::default(), [ip("172.29.4.2")]);
        info.add_interface(
            "lo",
            InterfaceFlags {
                loopback: true,
                point_to_point: false,
            },
            [ip("127.0.0.1"), ip("::1")],
        );
        info
    }
}
