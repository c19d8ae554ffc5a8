use crate::delta::BandwidthUnit;
use crate::netnames::SymbolTable;
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "NETVOLMON_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    /// Replaces the compiled-in site table when present.
    pub sites: Option<SitesConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_secs: u64,
    pub units: BandwidthUnit,
    pub timestamps: bool,
    pub show_zero: bool,
    pub blank_line: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 1,
            units: BandwidthUnit::Megabytes,
            timestamps: false,
            show_zero: false,
            blank_line: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SitesConfig {
    /// Site name -> CIDR.
    #[serde(default)]
    pub names: BTreeMap<String, String>,
    /// Group name -> site names.
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
}

impl AppConfig {
    /// Loads from `path`, else from `$NETVOLMON_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(p) = path {
            return Self::load_from_path(p);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(p) => Self::load_from_path(Path::new(&p)),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::load_from_str(&s).with_context(|| format!("config {}", path.display()))
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.monitor.interval_secs > 0,
            "monitor.interval_secs must be > 0, got {}",
            self.monitor.interval_secs
        );
        let table = self.symbol_table()?;
        for (group, member) in table.dangling_members() {
            tracing::warn!(
                group,
                member,
                "sites.groups entry names an unknown site; the group will never match"
            );
        }
        Ok(())
    }

    /// The site table to match against: the configured one, or the
    /// compiled-in default.
    pub fn symbol_table(&self) -> anyhow::Result<SymbolTable> {
        match &self.sites {
            Some(sites) => Ok(SymbolTable::new(sites.names.clone(), sites.groups.clone())?),
            None => Ok(SymbolTable::builtin()),
        }
    }
}
