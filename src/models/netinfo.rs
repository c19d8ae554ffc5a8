// Interface directory: names, loopback/point-to-point flags, and IP ownership

use crate::devset::DeviceSet;
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Maps an address to every device carrying it. Aliases and VRRP mean one
/// address can sit on several devices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpMap {
    entries: BTreeMap<IpAddr, Vec<String>>,
}

impl IpMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `device` carries `ip`. Repeated pairs are ignored.
    pub fn add(&mut self, ip: IpAddr, device: &str) {
        let devices = self.entries.entry(ip).or_default();
        if !devices.iter().any(|d| d == device) {
            devices.push(device.to_string());
        }
    }

    pub fn get(&self, ip: &IpAddr) -> Option<&[String]> {
        self.entries.get(ip).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IpAddr, &[String])> {
        self.entries.iter().map(|(ip, devs)| (ip, devs.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceFlags {
    pub loopback: bool,
    pub point_to_point: bool,
}

/// What the platform told us about its interfaces at startup. Built once,
/// then only read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetInfo {
    interfaces: DeviceSet,
    loopback: DeviceSet,
    point_to_point: DeviceSet,
    ip_map: IpMap,
}

impl NetInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interface with its flags and addresses. Every name in the
    /// flag sets and the IP map goes through here, so all of them are also
    /// in `interfaces()`.
    pub fn add_interface<I>(&mut self, name: &str, flags: InterfaceFlags, addrs: I)
    where
        I: IntoIterator<Item = IpAddr>,
    {
        self.interfaces.add(name);
        if flags.loopback {
            self.loopback.add(name);
        }
        if flags.point_to_point {
            self.point_to_point.add(name);
        }
        for ip in addrs {
            self.ip_map.add(ip, name);
        }
    }

    pub fn interfaces(&self) -> &DeviceSet {
        &self.interfaces
    }

    pub fn loopback(&self) -> &DeviceSet {
        &self.loopback
    }

    pub fn point_to_point(&self) -> &DeviceSet {
        &self.point_to_point
    }

    pub fn ip_map(&self) -> &IpMap {
        &self.ip_map
    }

    pub fn is_loopback(&self, name: &str) -> bool {
        self.loopback.contains(name)
    }
}
