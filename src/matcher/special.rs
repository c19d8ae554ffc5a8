// Magic tokens: "me" and symbolic site names

use super::ip::devices_in_block;
use super::{DeviceMatcher, MatchContext};
use crate::devset::DeviceSet;
use crate::netnames::Symbol;
use std::net::{IpAddr, ToSocketAddrs};

/// Looks up the addresses of this host's name.
pub trait HostResolver {
    fn local_addresses(&self) -> anyhow::Result<Vec<IpAddr>>;
}

/// Resolves the hostname through the platform resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHostResolver;

impl HostResolver for SystemHostResolver {
    fn local_addresses(&self) -> anyhow::Result<Vec<IpAddr>> {
        let name = hostname::get()?
            .into_string()
            .map_err(|n| anyhow::anyhow!("hostname is not valid UTF-8: {:?}", n))?;
        let addrs = (name.as_str(), 0)
            .to_socket_addrs()?
            .map(|sa| sa.ip())
            .collect();
        Ok(addrs)
    }
}

/// `me`: devices carrying any address our hostname resolves to.
pub struct Me {
    hosts: Box<dyn HostResolver>,
}

impl Me {
    pub fn new(hosts: Box<dyn HostResolver>) -> Self {
        Self { hosts }
    }
}

impl DeviceMatcher for Me {
    fn name(&self) -> &'static str {
        "me"
    }

    fn find(&self, token: &str, ctx: &MatchContext<'_>) -> Option<DeviceSet> {
        if token != "me" {
            return None;
        }
        let addrs = match self.hosts.local_addresses() {
            Ok(a) => a,
            Err(e) => {
                tracing::debug!(error = %e, operation = "resolve_hostname", "'me' lookup failed");
                return None;
            }
        };
        let mut found = DeviceSet::new();
        for ip in &addrs {
            if let Some(devices) = ctx.netinfo.ip_map().get(ip) {
                found.add_all(devices.iter().map(String::as_str));
            }
        }
        (!found.is_empty()).then_some(found)
    }
}

/// A site name (one netblock) or group (any of several).
pub struct SiteName;

impl DeviceMatcher for SiteName {
    fn name(&self) -> &'static str {
        "site-name"
    }

    fn find(&self, token: &str, ctx: &MatchContext<'_>) -> Option<DeviceSet> {
        match ctx.symbols.lookup(token)? {
            Symbol::Site(cidr) => devices_in_block(cidr, ctx),
            Symbol::Group(members) => {
                let mut found = DeviceSet::new();
                for member in members {
                    // A group with an unknown member matches nothing at all.
                    let Some(cidr) = ctx.symbols.site(member) else {
                        tracing::debug!(
                            group = token,
                            member = %member,
                            "group member is not a known site"
                        );
                        return None;
                    };
                    if let Some(devs) = devices_in_block(cidr, ctx) {
                        found.extend(devs);
                    }
                }
                (!found.is_empty()).then_some(found)
            }
        }
    }
}
