// Reporting loop: snapshot, diff against the previous snapshot, print, repeat.
// Everything runs on one task; the only suspension point is the wait
// between cycles.

use crate::delta::{BandwidthUnit, DevDelta, Rates, diff_all};
use crate::devset::DeviceSet;
use crate::models::{NetInfo, Stats};
use crate::sysinfo_repo::SnapshotProvider;
use anyhow::Context;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::time::{Duration, MissedTickBehavior, interval};

/// Timestamp format for `-T`. The date is left out for space.
const HMS: &str = "%H:%M:%S";

/// Which devices to report and how.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Resolved devices; `None` means whatever is active each cycle.
    pub devices: Option<Vec<String>>,
    pub exclude: DeviceSet,
    pub include_loopback: bool,
    pub show_zero: bool,
    pub timestamps: bool,
    pub blank_line: bool,
    pub units: BandwidthUnit,
}

pub struct Monitor<'a> {
    netinfo: &'a NetInfo,
    settings: MonitorSettings,
    prior: Stats,
}

impl<'a> Monitor<'a> {
    /// `first` is the baseline the first cycle is diffed against.
    pub fn new(netinfo: &'a NetInfo, settings: MonitorSettings, first: Stats) -> Self {
        Self {
            netinfo,
            settings,
            prior: first,
        }
    }

    /// Diffs `current` against the previous snapshot, writes one line per
    /// reportable device, then makes `current` the new baseline. Returns
    /// the number of device lines written.
    pub fn cycle<W: Write>(&mut self, current: Stats, out: &mut W) -> std::io::Result<usize> {
        let deltas = diff_all(&self.prior, &current);

        // Without explicit devices, report whatever is active now; this
        // picks up devices that appeared after startup.
        let keys: Vec<String> = match &self.settings.devices {
            Some(devices) => devices.clone(),
            None => deltas
                .keys()
                .filter(|name| current.get(name).is_some_and(|st| st.rx_bytes != 0))
                .cloned()
                .collect(),
        };

        let divisor = self.settings.units.divisor();
        let mut reported = 0;
        for name in &keys {
            if !self.settings.include_loopback && self.netinfo.is_loopback(name) {
                continue;
            }
            if self.settings.exclude.contains(name) {
                continue;
            }
            // Explicit devices can vanish, or have had a counter reset.
            let Some(d) = deltas.get(name) else {
                tracing::trace!(device = %name, "no usable delta this cycle");
                continue;
            };
            if !self.settings.show_zero && d.rx_bytes == 0 && d.tx_bytes == 0 {
                continue;
            }
            let Some(rates) = d.rates(divisor) else {
                tracing::debug!(device = %name, elapsed = ?d.elapsed, "non-positive elapsed time");
                continue;
            };
            writeln!(out, "{}", self.format_line(name, d, &rates))?;
            reported += 1;
        }
        // Blank separator only after cycles that printed something.
        if reported > 0 && self.settings.blank_line {
            writeln!(out)?;
        }
        out.flush()?;

        self.prior = current;
        Ok(reported)
    }

    fn format_line(&self, name: &str, d: &DevDelta, r: &Rates) -> String {
        let prefix = if self.settings.timestamps {
            format!("{:<8} {:>8} ", name, d.captured_at.format(HMS).to_string())
        } else {
            format!("{:<8} ", name)
        };
        format!(
            "{}{:6.2} RX {:6.2} TX ({})   packets/sec: {:5.0} RX {:5.0} TX",
            prefix,
            r.rx_bandwidth,
            r.tx_bandwidth,
            self.settings.units.label(),
            r.rx_packets,
            r.tx_packets
        )
    }
}

/// Runs cycles every `period` until `shutdown` completes. A failed
/// snapshot ends monitoring with an error; there is no retry.
#[tracing::instrument(skip_all, fields(period_ms = period.as_millis() as u64))]
pub async fn run<W, F>(
    provider: Arc<dyn SnapshotProvider>,
    mut monitor: Monitor<'_>,
    period: Duration,
    out: &mut W,
    shutdown: F,
) -> anyhow::Result<()>
where
    W: Write,
    F: Future<Output = ()>,
{
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick fires immediately; the baseline was just taken.
    tick.tick().await;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let p = provider.clone();
                let current = tokio::task::spawn_blocking(move || p.fill())
                    .await
                    .map_err(|e| anyhow::anyhow!("snapshot task join: {}", e))?
                    .context("error refilling")?;
                monitor.cycle(current, out)?;
            }
            _ = &mut shutdown => {
                tracing::debug!("Monitor shutting down");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DevStat, InterfaceFlags};
    use chrono::{DateTime, Local, TimeZone};

    fn t(secs: i64) -> DateTime<Local> {
        Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn snap(at: i64, devs: &[(&str, u64, u64)]) -> Stats {
        devs.iter()
            .map(|(name, rx, tx)| {
                (
                    *name,
                    DevStat {
                        captured_at: t(at),
                        rx_bytes: *rx,
                        tx_bytes: *tx,
                        rx_packets: *rx / 100,
                        tx_packets: *tx / 100,
                    },
                )
            })
            .collect()
    }

    fn netinfo() -> NetInfo {
        let mut info = NetInfo::new();
        info.add_interface("eth0", InterfaceFlags::default(), []);
        info.add_interface("eth1", InterfaceFlags::default(), []);
        info.add_interface(
            "lo",
            InterfaceFlags {
                loopback: true,
                point_to_point: false,
            },
            [],
        );
        info
    }

    fn settings() -> MonitorSettings {
        MonitorSettings {
            devices: None,
            exclude: DeviceSet::new(),
            include_loopback: false,
            show_zero: false,
            timestamps: false,
            blank_line: false,
            units: BandwidthUnit::Kilobytes,
        }
    }

    fn run_cycle(settings: MonitorSettings, first: Stats, second: Stats) -> String {
        let info = netinfo();
        let mut m = Monitor::new(&info, settings, first);
        let mut out = Vec::new();
        m.cycle(second, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn line_format_matches_report_layout() {
        let out = run_cycle(
            settings(),
            snap(0, &[("eth0", 0, 0)]),
            snap(1, &[("eth0", 2048, 1024)]),
        );
        assert_eq!(
            out,
            "eth0       2.00 RX   1.00 TX (KB/s)   packets/sec:    20 RX    10 TX\n"
        );
    }

    #[test]
    fn timestamps_prefix_local_time() {
        let mut s = settings();
        s.timestamps = true;
        let out = run_cycle(s, snap(0, &[("eth0", 0, 0)]), snap(1, &[("eth0", 1024, 0)]));
        let hms = t(1).format(HMS).to_string();
        assert!(out.starts_with(&format!("eth0     {} ", hms)), "{out}");
    }

    #[test]
    fn watch_everything_skips_loopback_idle_and_excluded() {
        let mut s = settings();
        s.exclude.add("eth1");
        let first = snap(
            0,
            &[("eth0", 100, 0), ("eth1", 100, 0), ("lo", 100, 0), ("ppp0", 0, 0)],
        );
        let second = snap(
            1,
            &[("eth0", 1124, 0), ("eth1", 1124, 0), ("lo", 1124, 0), ("ppp0", 0, 512)],
        );
        let out = run_cycle(s, first, second);
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("eth0 "));
    }

    #[test]
    fn explicit_devices_keep_loopback_and_skip_missing() {
        let mut s = settings();
        s.devices = Some(vec!["gone0".into(), "lo".into()]);
        s.include_loopback = true;
        let out = run_cycle(
            s,
            snap(0, &[("lo", 0, 0), ("gone0", 0, 0)]),
            snap(1, &[("lo", 1024, 1024)]),
        );
        assert!(out.starts_with("lo "));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn zero_traffic_hidden_unless_requested() {
        let first = snap(0, &[("eth0", 100, 100)]);
        let second = snap(1, &[("eth0", 100, 100)]);
        assert_eq!(run_cycle(settings(), first.clone(), second.clone()), "");

        let mut s = settings();
        s.show_zero = true;
        assert_eq!(run_cycle(s, first, second).lines().count(), 1);
    }

    #[test]
    fn rollover_is_silent() {
        let out = run_cycle(
            settings(),
            snap(0, &[("eth0", 5000, 100)]),
            snap(1, &[("eth0", 10, 200)]),
        );
        assert_eq!(out, "");
    }

    #[test]
    fn blank_line_only_after_output() {
        let mut s = settings();
        s.blank_line = true;
        let info = netinfo();
        let mut m = Monitor::new(&info, s, snap(0, &[("eth0", 0, 0)]));
        let mut out = Vec::new();
        assert_eq!(m.cycle(snap(1, &[("eth0", 1024, 0)]), &mut out).unwrap(), 1);
        assert_eq!(m.cycle(snap(2, &[("eth0", 1024, 0)]), &mut out).unwrap(), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("TX\n\n"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn baseline_advances_each_cycle() {
        let info = netinfo();
        let mut m = Monitor::new(&info, settings(), snap(0, &[("eth0", 0, 0)]));
        let mut out = Vec::new();
        m.cycle(snap(1, &[("eth0", 1024, 0)]), &mut out).unwrap();
        m.cycle(snap(3, &[("eth0", 5120, 0)]), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let second = text.lines().nth(1).unwrap();
        assert!(second.starts_with("eth0       2.00 RX"), "{second}");
    }
}
