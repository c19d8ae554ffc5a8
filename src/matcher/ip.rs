// Matching on interface addresses

use super::{DeviceMatcher, MatchContext, devices_where};
use crate::devset::DeviceSet;
use crate::netnames::Cidr;
use glob::Pattern;
use std::net::IpAddr;

/// A literal address, e.g. `127.0.0.1` -> `lo`. One address may still
/// belong to several devices.
pub struct ExactIp;

impl DeviceMatcher for ExactIp {
    fn name(&self) -> &'static str {
        "exact-ip"
    }

    fn find(&self, token: &str, ctx: &MatchContext<'_>) -> Option<DeviceSet> {
        let ip: IpAddr = token.parse().ok()?;
        let devices = ctx.netinfo.ip_map().get(&ip)?;
        Some(devices.iter().map(String::as_str).collect())
    }
}

/// Any device with an address inside the netblock.
pub struct CidrBlock;

impl DeviceMatcher for CidrBlock {
    fn name(&self) -> &'static str {
        "cidr"
    }

    fn find(&self, token: &str, ctx: &MatchContext<'_>) -> Option<DeviceSet> {
        let cidr: Cidr = token.parse().ok()?;
        devices_in_block(&cidr, ctx)
    }
}

pub(crate) fn devices_in_block(cidr: &Cidr, ctx: &MatchContext<'_>) -> Option<DeviceSet> {
    devices_where(ctx, |ip| cidr.contains(ip))
}

/// Shell-style glob over the text of each address, e.g. `127.*`.
pub struct IpGlob;

impl DeviceMatcher for IpGlob {
    fn name(&self) -> &'static str {
        "ip-glob"
    }

    fn find(&self, token: &str, ctx: &MatchContext<'_>) -> Option<DeviceSet> {
        let pattern = Pattern::new(token).ok()?;
        devices_where(ctx, |ip| pattern.matches(&ip.to_string()))
    }
}
