// Linux-specific helpers: /proc/net/dev counters and /sys/class/net flags.

use crate::models::{DevStat, InterfaceFlags, Stats};
use chrono::{DateTime, Local};

/// Largest /proc/net/dev we are willing to read.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
const MAX_SIZE: usize = 128 * 1024;

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
const IFF_LOOPBACK: u32 = 0x8;
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
const IFF_POINTOPOINT: u32 = 0x10;

/// Reads all of /proc/net/dev in a single read so every device's counters
/// come from the same instant.
#[cfg(target_os = "linux")]
pub(super) fn read_proc_net_dev() -> anyhow::Result<Stats> {
    use anyhow::Context;
    use std::io::Read;

    let mut file = std::fs::File::open("/proc/net/dev").context("opening /proc/net/dev")?;
    let mut data = vec![0u8; MAX_SIZE];
    let captured_at = Local::now();
    let count = file.read(&mut data).context("reading /proc/net/dev")?;
    anyhow::ensure!(count < MAX_SIZE, "/proc/net/dev is too big, over {} bytes", MAX_SIZE);
    anyhow::ensure!(count > 0, "read 0 bytes from /proc/net/dev");
    let text = std::str::from_utf8(&data[..count]).context("/proc/net/dev is not UTF-8")?;
    parse_proc_net_dev(text, captured_at)
}

/// Parses /proc/net/dev text. The first two lines are headers; any
/// malformed device line fails the whole snapshot.
pub fn parse_proc_net_dev(text: &str, captured_at: DateTime<Local>) -> anyhow::Result<Stats> {
    let lines: Vec<&str> = text.lines().collect();
    anyhow::ensure!(lines.len() >= 3, "no devices in /proc/net/dev");

    let mut stats = Stats::new();
    for line in &lines[2..] {
        if line.trim().is_empty() {
            continue;
        }
        let (name, stat) = parse_line(line, captured_at)?;
        stats.insert(name, stat);
    }
    Ok(stats)
}

fn parse_line(line: &str, captured_at: DateTime<Local>) -> anyhow::Result<(String, DevStat)> {
    // Large counters can run into the colon, so split on it rather than
    // on whitespace alone.
    let (name, rest) = line
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("no device name in '{}'", line))?;
    let fields: Vec<&str> = rest.split_whitespace().collect();
    anyhow::ensure!(
        fields.len() == 16,
        "incorrect number of fields: {} in '{}'",
        fields.len() + 1,
        line
    );
    let num = |i: usize| -> anyhow::Result<u64> {
        fields[i]
            .parse()
            .map_err(|e| anyhow::anyhow!("bad counter '{}' in '{}': {}", fields[i], line, e))
    };
    Ok((
        name.trim().to_string(),
        DevStat {
            captured_at,
            rx_bytes: num(0)?,
            rx_packets: num(1)?,
            tx_bytes: num(8)?,
            tx_packets: num(9)?,
        },
    ))
}

/// Loopback and point-to-point flags from /sys/class/net/<name>/flags.
/// `None` off Linux or when the file is unreadable.
pub(super) fn interface_flags(interface_name: &str) -> Option<InterfaceFlags> {
    #[cfg(target_os = "linux")]
    {
        let path = format!("/sys/class/net/{}/flags", interface_name);
        let content = std::fs::read_to_string(&path).ok()?;
        parse_flags(&content)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = interface_name;
        None
    }
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_flags(content: &str) -> Option<InterfaceFlags> {
    let raw = content.trim();
    let hex = raw.strip_prefix("0x").unwrap_or(raw);
    let bits = u32::from_str_radix(hex, 16).ok()?;
    Some(InterfaceFlags {
        loopback: bits & IFF_LOOPBACK != 0,
        point_to_point: bits & IFF_POINTOPOINT != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:   52000     400    0    0    0     0          0         0    52000     400    0    0    0     0       0          0
  eth0: 1234567    8901    0    0    0     0          0        12   765432    4321    0    0    0     0       0          0
wlp2s0:123456789012 99    0    0    0     0          0         0       10       1    0    0    0     0       0          0
";

    #[test]
    fn parses_counters_from_the_right_columns() {
        let now = Local::now();
        let stats = parse_proc_net_dev(SAMPLE, now).unwrap();
        assert_eq!(stats.names(), vec!["eth0", "lo", "wlp2s0"]);
        let eth0 = stats.get("eth0").unwrap();
        assert_eq!(eth0.rx_bytes, 1234567);
        assert_eq!(eth0.rx_packets, 8901);
        assert_eq!(eth0.tx_bytes, 765432);
        assert_eq!(eth0.tx_packets, 4321);
        assert_eq!(eth0.captured_at, now);
        assert_eq!(stats.get("wlp2s0").unwrap().rx_bytes, 123456789012);
    }

    #[test]
    fn every_device_shares_one_timestamp() {
        let now = Local::now();
        let stats = parse_proc_net_dev(SAMPLE, now).unwrap();
        assert!(stats.iter().all(|(_, st)| st.captured_at == now));
    }

    #[test]
    fn header_only_is_an_error() {
        let header: String = SAMPLE.lines().take(2).collect::<Vec<_>>().join("\n");
        assert!(parse_proc_net_dev(&header, Local::now()).is_err());
    }

    #[test]
    fn short_line_fails_whole_snapshot() {
        let bad = format!("{}  eth1: 1 2 3\n", SAMPLE);
        let err = parse_proc_net_dev(&bad, Local::now()).unwrap_err();
        assert!(err.to_string().contains("incorrect number of fields"));
    }

    #[test]
    fn non_numeric_counter_fails() {
        let bad = SAMPLE.replace("1234567", "12x4567");
        assert!(parse_proc_net_dev(&bad, Local::now()).is_err());
    }

    #[test]
    fn flags_decode_loopback_and_point_to_point() {
        assert_eq!(
            parse_flags("0x9\n"),
            Some(InterfaceFlags {
                loopback: true,
                point_to_point: false
            })
        );
        assert_eq!(
            parse_flags("0x1091\n"),
            Some(InterfaceFlags {
                loopback: false,
                point_to_point: true
            })
        );
        assert_eq!(parse_flags("garbage"), None);
    }
}
