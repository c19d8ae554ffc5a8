// Symbolic site names: short names for local netblocks, and groups of them.

mod cidr;

pub use cidr::{Cidr, CidrError};

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    #[error("site '{name}': {source}")]
    InvalidCidr {
        name: String,
        #[source]
        source: CidrError,
    },

    #[error("'{0}' is defined both as a site name and as a site group")]
    DuplicateName(String),
}

/// What a symbolic token stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol<'a> {
    Site(&'a Cidr),
    Group(&'a [String]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    sites: BTreeMap<String, Cidr>,
    groups: BTreeMap<String, Vec<String>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SymbolTable {
    /// Builds a table from textual CIDRs. Group members are not checked
    /// here; a group naming an unknown site simply never matches.
    pub fn new(
        sites: BTreeMap<String, String>,
        groups: BTreeMap<String, Vec<String>>,
    ) -> Result<Self, SymbolError> {
        if let Some(dup) = groups.keys().find(|g| sites.contains_key(*g)) {
            return Err(SymbolError::DuplicateName(dup.clone()));
        }
        let sites = sites
            .into_iter()
            .map(|(name, text)| match text.parse::<Cidr>() {
                Ok(cidr) => Ok((name, cidr)),
                Err(source) => Err(SymbolError::InvalidCidr { name, source }),
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self { sites, groups })
    }

    /// The compiled-in table of local networks.
    pub fn builtin() -> Self {
        let sites = [
            ("net3", Cidr::v4([128, 100, 3, 0], 24)),
            ("net5", Cidr::v4([128, 100, 5, 0], 24)),
            ("dev2", Cidr::v4([192, 168, 151, 0], 24)),
            ("core", Cidr::v4([192, 168, 66, 0], 24)),
            ("iscsi1", Cidr::v4([192, 168, 101, 0], 24)),
            ("iscsi2", Cidr::v4([192, 168, 102, 0], 24)),
            ("red", Cidr::v4([172, 17, 0, 0], 16)),
            ("vpn", Cidr::v4([172, 29, 0, 0], 16)),
            ("wifi", Cidr::v4([172, 31, 0, 0], 16)),
        ]
        .into_iter()
        .map(|(n, c)| (n.to_string(), c))
        .collect();
        let groups = [("iscsi", ["iscsi1", "iscsi2"]), ("blue", ["net3", "net5"])]
            .into_iter()
            .map(|(g, members)| {
                (
                    g.to_string(),
                    members.iter().map(|m| m.to_string()).collect(),
                )
            })
            .collect();
        Self { sites, groups }
    }

    pub fn lookup(&self, token: &str) -> Option<Symbol<'_>> {
        if let Some(cidr) = self.sites.get(token) {
            return Some(Symbol::Site(cidr));
        }
        self.groups
            .get(token)
            .map(|members| Symbol::Group(members.as_slice()))
    }

    pub fn site(&self, name: &str) -> Option<&Cidr> {
        self.sites.get(name)
    }

    /// Site names in sorted order.
    pub fn sites(&self) -> impl Iterator<Item = (&str, &Cidr)> {
        self.sites.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Groups in sorted order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups.iter().map(|(n, m)| (n.as_str(), m.as_slice()))
    }

    /// `(group, member)` pairs whose member is not a known site.
    pub fn dangling_members(&self) -> Vec<(&str, &str)> {
        self.groups
            .iter()
            .flat_map(|(g, members)| {
                members
                    .iter()
                    .filter(|m| !self.sites.contains_key(*m))
                    .map(move |m| (g.as_str(), m.as_str()))
            })
            .collect()
    }
}
