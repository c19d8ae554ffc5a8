use anyhow::{Context, Result};
use clap::Parser;
use netvolmon::cli::{Cli, Mode};
use netvolmon::config::AppConfig;
use netvolmon::matcher::{Cascade, SystemHostResolver};
use netvolmon::monitor::{self, Monitor, MonitorSettings};
use netvolmon::resolver::Resolver;
use netvolmon::sysinfo_repo::{DirectoryProvider, SnapshotProvider, SysinfoRepo};
use netvolmon::{report, version};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", version::diagnostic(format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    tracing::debug!(version = version::VERSION, "starting");

    // Argument errors take priority over platform errors, so everything
    // here happens before the network layer is touched.
    let app_config = AppConfig::load(cli.config.as_deref())?;
    let options = cli.into_options(&app_config)?;
    let symbols = app_config.symbol_table()?;

    let mut stdout = std::io::stdout();
    if options.mode == Mode::ListSpecials {
        report::specials(&mut stdout, &symbols)?;
        return Ok(());
    }

    // Loaded once: loopback and point-to-point devices are assumed not to
    // come and go while we run.
    let repo = Arc::new(SysinfoRepo::new());
    let netinfo = repo.discover().context("error on network info setup")?;

    if let Mode::ReportAddresses { ipv6 } = options.mode {
        report::addresses(
            &mut stdout,
            &netinfo,
            ipv6,
            options.include_loopback,
            options.no_point_to_point,
        )?;
        return Ok(());
    }

    let exclude = options.exclude_set(&netinfo);

    let first = repo.fill().context("error on initial filling")?;

    let cascade = Cascade::standard(Box::new(SystemHostResolver));
    let resolver = Resolver::new(&netinfo, &symbols, &cascade);
    let devices = resolver.resolve(
        &options.devices,
        &exclude,
        options.include_loopback,
        &first,
    )?;

    if options.mode == Mode::ReportDevices {
        report::devices(&mut stdout, &devices)?;
        return Ok(());
    }

    let settings = MonitorSettings {
        devices: (!options.devices.is_empty()).then_some(devices),
        exclude,
        include_loopback: options.include_loopback,
        show_zero: options.show_zero,
        timestamps: options.timestamps,
        blank_line: options.blank_line,
        units: options.units,
    };
    let monitor = Monitor::new(&netinfo, settings, first);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    let provider: Arc<dyn SnapshotProvider> = repo;
    monitor::run(provider, monitor, options.interval, &mut stdout, shutdown).await
}
