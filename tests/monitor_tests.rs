// Monitor loop: ticks against a fake provider, stops on shutdown, aborts on snapshot failure

mod common;

use common::*;
use netvolmon::delta::BandwidthUnit;
use netvolmon::devset::DeviceSet;
use netvolmon::monitor::{Monitor, MonitorSettings, run};
use netvolmon::sysinfo_repo::SnapshotProvider;
use std::sync::Arc;
use tokio::time::Duration;

fn settings(units: BandwidthUnit) -> MonitorSettings {
    MonitorSettings {
        devices: None,
        exclude: DeviceSet::new(),
        include_loopback: false,
        show_zero: false,
        timestamps: false,
        blank_line: false,
        units,
    }
}

#[tokio::test]
async fn monitor_reports_each_tick_until_shutdown() {
    let info = directory(&[("eth0", plain(), &[]), ("lo", loopback(), &[])]);
    let provider = Arc::new(SteadyProvider::new());
    let first = provider.next();
    let monitor = Monitor::new(&info, settings(BandwidthUnit::Kilobytes), first);

    let mut out = Vec::new();
    let provider: Arc<dyn SnapshotProvider> = provider;
    run(
        provider,
        monitor,
        Duration::from_millis(10),
        &mut out,
        tokio::time::sleep(Duration::from_millis(120)),
    )
    .await
    .expect("monitor run");

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(!lines.is_empty(), "expected at least one report line");
    for line in lines {
        assert_eq!(
            line,
            "eth0       1.00 RX   0.50 TX (KB/s)   packets/sec:    16 RX     8 TX"
        );
    }
}

#[tokio::test]
async fn snapshot_failure_ends_monitoring() {
    let info = directory(&[("eth0", plain(), &[])]);
    let first = snapshot(0, &[("eth0", 1, 1)]);
    let monitor = Monitor::new(&info, settings(BandwidthUnit::Megabytes), first);

    let mut out = Vec::new();
    let err = run(
        Arc::new(FailingProvider),
        monitor,
        Duration::from_millis(5),
        &mut out,
        std::future::pending::<()>(),
    )
    .await
    .unwrap_err();
    assert!(format!("{:#}", err).contains("counters unavailable"));
    assert!(out.is_empty());
}

#[test]
fn diff_then_rate_with_unit_divisor_reproduces_raw_counts() {
    let prior = snapshot(0, &[("eth0", 1_000, 2_000)]);
    let current = snapshot(1, &[("eth0", 1_640, 2_128)]);
    let deltas = netvolmon::delta::diff_all(&prior, &current);
    let rates = deltas["eth0"].rates(1.0).unwrap();
    assert_eq!(rates.rx_bandwidth, 640.0);
    assert_eq!(rates.tx_bandwidth, 128.0);
}

#[test]
fn newly_appeared_device_has_no_delta() {
    let prior = snapshot(0, &[("eth0", 10, 10)]);
    let current = snapshot(1, &[("eth0", 20, 20), ("usb0", 5, 5)]);
    let deltas = netvolmon::delta::diff_all(&prior, &current);
    assert!(deltas.contains_key("eth0"));
    assert!(!deltas.contains_key("usb0"));
}
