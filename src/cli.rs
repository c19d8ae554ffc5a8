// Command-line parsing: clap flags folded together with the config file
// into the Options the rest of the program runs on.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::config::AppConfig;
use crate::delta::BandwidthUnit;
use crate::devset::DeviceSet;
use crate::models::NetInfo;

const NOTE: &str = "\
Default is to report on all network devices that have received traffic.

Network device names can include shell glob patterns (eg 'enp*f*'),
interface IP addresses, wildcarded IP addresses (eg '127.*'), CIDR
netblocks (match any interface with an address in the netblock) and a
few special names like 'me' (which tries to do an IP address lookup on
the hostname and go from there). Use -L to see the list of special names.

A single trailing number is taken as the delay between reports in seconds.";

/// Errors from command-line validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("given both -d and a trailing 'seconds' argument")]
    ConflictingInterval,

    #[error("the delay between reports must be greater than zero")]
    ZeroInterval,

    #[error("conflicting command line arguments; see -h")]
    ConflictingModes,

    #[error("{0} given with command line arguments")]
    ArgumentsNotAllowed(&'static str),
}

/// Report network device bandwidth and packet rates, per second.
#[derive(Parser, Debug, Clone, PartialEq, Eq, Default)]
#[command(name = "netvolmon")]
#[command(version, about, long_about = None, after_help = NOTE)]
pub struct Cli {
    /// When reporting on everything, report on loopback too.
    #[arg(short = 'l', long = "loopback")]
    pub include_loopback: bool,

    /// Include timestamps in output.
    #[arg(short = 'T', long = "timestamps")]
    pub timestamps: bool,

    /// Show devices even if they have no activity this period.
    #[arg(short = 'z', long = "zero")]
    pub show_zero: bool,

    /// Delay between reports (e.g. 1s, 500ms, 2m).
    #[arg(short = 'd', long = "delay", value_parser = humantime::parse_duration)]
    pub delay: Option<Duration>,

    /// Report bandwidth in KB/s instead of MB/s.
    #[arg(short = 'k', long = "kilobytes")]
    pub kilobytes: bool,

    /// Print a blank line between successive reports.
    #[arg(short = 'b', long = "blank")]
    pub blank_line: bool,

    /// Devices to specifically exclude (comma-separated).
    #[arg(short = 'x', long = "exclude", value_name = "DEVICES")]
    pub exclude: Option<String>,

    /// Exclude all point to point devices.
    #[arg(short = 'P', long = "no-ptp")]
    pub no_point_to_point: bool,

    /// Just report what devices we'd monitor.
    #[arg(short = 'R', long = "report")]
    pub report: bool,

    /// Just list available special names.
    #[arg(short = 'L', long = "list-specials")]
    pub list_specials: bool,

    /// Just report what IPs each interface has.
    #[arg(short = 'W', long = "what")]
    pub report_what: bool,

    /// Include IPv6 IPs in -W.
    #[arg(short = '6', long = "ipv6")]
    pub ipv6: bool,

    /// Config file (default: $NETVOLMON_CONFIG, else built-in settings).
    #[arg(short = 'C', long = "config")]
    pub config: Option<PathBuf>,

    /// Network devices to watch, optionally followed by a delay in seconds.
    #[arg(value_name = "NETWORK-DEV")]
    pub args: Vec<String>,
}

/// What the invocation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Monitor,
    /// `-R`
    ReportDevices,
    /// `-L`
    ListSpecials,
    /// `-W`
    ReportAddresses { ipv6: bool },
}

/// Validated run settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub mode: Mode,
    pub devices: Vec<String>,
    pub interval: Duration,
    pub exclude: Vec<String>,
    pub no_point_to_point: bool,
    pub include_loopback: bool,
    pub timestamps: bool,
    pub show_zero: bool,
    pub blank_line: bool,
    pub units: BandwidthUnit,
}

fn count_set(flags: &[bool]) -> usize {
    flags.iter().filter(|f| **f).count()
}

/// Strips a trailing positive integer from `args` and returns it as an
/// interval, checking it against an explicit `-d`.
pub fn split_trailing_interval(
    args: &mut Vec<String>,
    delay: Option<Duration>,
) -> Result<Option<Duration>, CliError> {
    let Some(last) = args.last() else {
        return Ok(None);
    };
    // Digits only; a sign makes it a device token.
    if !last.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    let secs = match last.parse::<u64>() {
        Ok(n) if n > 0 => n,
        _ => return Ok(None),
    };
    let trailing = Duration::from_secs(secs);
    if delay.is_some_and(|d| d != trailing) {
        return Err(CliError::ConflictingInterval);
    }
    args.pop();
    Ok(Some(trailing))
}

impl Cli {
    pub fn mode(&self) -> Result<Mode, CliError> {
        let shaping = self.timestamps || self.show_zero || self.kilobytes || self.blank_line;
        if count_set(&[self.list_specials, self.report_what, self.report, shaping]) > 1 {
            return Err(CliError::ConflictingModes);
        }
        if !self.args.is_empty() {
            if self.list_specials {
                return Err(CliError::ArgumentsNotAllowed("-L"));
            }
            if self.report_what {
                return Err(CliError::ArgumentsNotAllowed("-W"));
            }
        }
        Ok(if self.list_specials {
            Mode::ListSpecials
        } else if self.report_what {
            Mode::ReportAddresses { ipv6: self.ipv6 }
        } else if self.report {
            Mode::ReportDevices
        } else {
            Mode::Monitor
        })
    }

    /// Validates flags and merges them over `config`.
    pub fn into_options(self, config: &AppConfig) -> Result<Options, CliError> {
        let mode = self.mode()?;
        let mut devices = self.args;
        let trailing = split_trailing_interval(&mut devices, self.delay)?;
        let interval = trailing
            .or(self.delay)
            .unwrap_or(Duration::from_secs(config.monitor.interval_secs));
        if interval.is_zero() {
            return Err(CliError::ZeroInterval);
        }

        let exclude = self
            .exclude
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let units = if self.kilobytes {
            BandwidthUnit::Kilobytes
        } else {
            config.monitor.units
        };

        Ok(Options {
            mode,
            // Naming devices explicitly means a matched loopback is wanted.
            include_loopback: self.include_loopback || !devices.is_empty(),
            devices,
            interval,
            exclude,
            no_point_to_point: self.no_point_to_point,
            timestamps: self.timestamps || config.monitor.timestamps,
            show_zero: self.show_zero || config.monitor.show_zero,
            blank_line: self.blank_line || config.monitor.blank_line,
            units,
        })
    }
}

impl Options {
    /// Devices to leave out: the `-x` list, plus every point-to-point
    /// device in `netinfo` when `-P` was given.
    pub fn exclude_set(&self, netinfo: &NetInfo) -> DeviceSet {
        let mut exclude: DeviceSet = self.exclude.iter().map(String::as_str).collect();
        if self.no_point_to_point {
            exclude.add_all(netinfo.point_to_point().iter());
        }
        exclude
    }
}
