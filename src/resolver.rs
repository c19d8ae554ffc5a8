// Device resolver: command-line tokens -> sorted, deduplicated device list.

use crate::devset::DeviceSet;
use crate::matcher::{Cascade, MatchContext};
use crate::models::{NetInfo, Stats};
use crate::netnames::SymbolTable;
use thiserror::Error;

/// Configuration errors from resolution. Neither is worth retrying.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("device specifier '{0}' doesn't seem to exist or match anything")]
    UnresolvedDevice(String),

    #[error("wound up with no devices to monitor")]
    NoDevices,
}

pub struct Resolver<'a> {
    netinfo: &'a NetInfo,
    symbols: &'a SymbolTable,
    cascade: &'a Cascade,
}

impl<'a> Resolver<'a> {
    pub fn new(netinfo: &'a NetInfo, symbols: &'a SymbolTable, cascade: &'a Cascade) -> Self {
        Self {
            netinfo,
            symbols,
            cascade,
        }
    }

    /// Resolves `tokens` to device names, minus `exclude`.
    ///
    /// With no tokens, every device in `snapshot` that has received
    /// anything is selected instead, leaving out loopback devices unless
    /// `include_loopback` is set. Those names come from the snapshot, so
    /// they may include devices the directory does not know (no
    /// addresses, or appeared after discovery).
    pub fn resolve(
        &self,
        tokens: &[String],
        exclude: &DeviceSet,
        include_loopback: bool,
        snapshot: &Stats,
    ) -> Result<Vec<String>, ResolveError> {
        let mut found = if tokens.is_empty() {
            active_devices(snapshot, self.netinfo, include_loopback)
        } else {
            self.match_tokens(tokens)?
        };
        found.retain(|name| !exclude.contains(name));
        if found.is_empty() {
            return Err(ResolveError::NoDevices);
        }
        Ok(found.to_sorted_vec())
    }

    fn match_tokens(&self, tokens: &[String]) -> Result<DeviceSet, ResolveError> {
        let ctx = MatchContext {
            netinfo: self.netinfo,
            symbols: self.symbols,
        };
        let mut found = DeviceSet::new();
        for token in tokens {
            let Some((strategy, devices)) = self.cascade.find(token, &ctx) else {
                return Err(ResolveError::UnresolvedDevice(token.clone()));
            };
            tracing::debug!(
                token = %token,
                strategy,
                devices = ?devices.to_sorted_vec(),
                "device specifier matched"
            );
            found.extend(devices);
        }
        Ok(found)
    }
}

/// Devices with received traffic in `snapshot`. Sending alone does not
/// count; dead links often transmit.
pub fn active_devices(snapshot: &Stats, netinfo: &NetInfo, include_loopback: bool) -> DeviceSet {
    snapshot
        .iter()
        .filter(|(_, st)| st.rx_bytes != 0)
        .filter(|(name, _)| include_loopback || !netinfo.is_loopback(name))
        .map(|(name, _)| name)
        .collect()
}
