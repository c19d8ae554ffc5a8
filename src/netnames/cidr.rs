// CIDR netblocks over both address families

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid CIDR notation: {0}")]
pub struct CidrError(pub String);

/// A netblock such as `10.0.0.0/8` or `fe80::/10`. Host bits in the text
/// are masked off, so `10.1.2.3/8` and `10.0.0.0/8` are the same block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cidr {
    network: IpAddr,
    prefix_len: u8,
}

fn max_prefix(ip: &IpAddr) -> u8 {
    match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn mask_bits(ip: &IpAddr, prefix_len: u8) -> u128 {
    let width = max_prefix(ip) as u32;
    let bits = match ip {
        IpAddr::V4(v4) => u32::from(*v4) as u128,
        IpAddr::V6(v6) => u128::from(*v6),
    };
    if prefix_len == 0 {
        return 0;
    }
    let host_bits = width - prefix_len as u32;
    (bits >> host_bits) << host_bits
}

impl Cidr {
    /// IPv4 block from octets. Callers pass a prefix of at most 32.
    pub const fn v4(octets: [u8; 4], prefix_len: u8) -> Self {
        Self {
            network: IpAddr::V4(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3])),
            prefix_len,
        }
    }

    pub fn network(&self) -> IpAddr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// True if `ip` is in this block. Addresses of the other family never are.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        if self.network.is_ipv4() != ip.is_ipv4() {
            return false;
        }
        mask_bits(&self.network, self.prefix_len) == mask_bits(ip, self.prefix_len)
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CidrError(s.to_string());
        let (addr, prefix) = s.split_once('/').ok_or_else(err)?;
        let network: IpAddr = addr.parse().map_err(|_| err())?;
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let prefix_len: u8 = prefix.parse().map_err(|_| err())?;
        if prefix_len > max_prefix(&network) {
            return Err(err());
        }
        Ok(Self {
            network,
            prefix_len,
        })
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}
