// One-shot reports: -R (devices that would be monitored), -L (special
// names), -W (addresses per interface).

use crate::models::NetInfo;
use crate::netnames::SymbolTable;
use std::collections::BTreeMap;
use std::io::Write;

pub fn devices<W: Write>(out: &mut W, devices: &[String]) -> std::io::Result<()> {
    write!(out, "netvolmon: devices would be:")?;
    for d in devices {
        write!(out, " {}", d)?;
    }
    writeln!(out)
}

pub fn specials<W: Write>(out: &mut W, symbols: &SymbolTable) -> std::io::Result<()> {
    writeln!(out, "Supported special device names:")?;
    writeln!(out, "   {:<10}   device(s) with IP address of my hostname", "me")?;
    for (name, cidr) in symbols.sites() {
        writeln!(out, "   {:<10}   device(s) with {}", name, cidr)?;
    }
    for (name, members) in symbols.groups() {
        writeln!(out, "   {:<10}   device(s) matching {}", name, members.join(" or "))?;
    }
    Ok(())
}

/// Addresses of each interface. Honours loopback and point-to-point
/// filtering but not `-x`.
pub fn addresses<W: Write>(
    out: &mut W,
    netinfo: &NetInfo,
    ipv6: bool,
    include_loopback: bool,
    no_point_to_point: bool,
) -> std::io::Result<()> {
    let mut by_device: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (ip, devices) in netinfo.ip_map().iter() {
        if !ipv6 && ip.is_ipv6() {
            continue;
        }
        for dev in devices {
            if !include_loopback && netinfo.is_loopback(dev) {
                continue;
            }
            if no_point_to_point && netinfo.point_to_point().contains(dev) {
                continue;
            }
            by_device.entry(dev.as_str()).or_default().push(ip.to_string());
        }
    }
    for (dev, mut ips) in by_device {
        ips.sort();
        writeln!(out, "{:<8}  {}", dev, ips.join(" "))?;
    }
    Ok(())
}
