use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueHint};
use nas_state::config::{load_config, Config, WatchConfig};
use nas_state::transport::ReplayTransport;
use nas_state::{Machine, Transport, TransportError};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "nas-state",
    version,
    about = "Inspect remote storage state from a replay file",
    after_help = r#"EXAMPLES
  $ nas-state --replay host.json invoke system.info
  $ nas-state --replay host.json invoke pool.query --arguments '[[], {"select": ["name"]}]'
  $ nas-state --replay host.json pools --cycles 3 --interval 10

The replay file is a JSON object mapping method names to results. It is
re-read on every call, so editing it between cycles shows up as pools
appearing, changing or becoming unavailable."#
)]
struct Cli {
    #[arg(
        long,
        help = "JSON file mapping method names to results",
        value_hint = ValueHint::FilePath
    )]
    replay: PathBuf,
    #[arg(long, help = "TOML configuration file", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
    #[arg(short, long, help = "Log every remote call")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Invoke one method and print the raw result
    Invoke {
        #[arg(help = "Method to invoke, e.g. pool.query")]
        method: String,
        #[arg(long, default_value = "[]", help = "JSON-encoded argument list")]
        arguments: String,
    },
    /// List storage pools
    Pools(WatchArgs),
    /// List disks
    Disks(WatchArgs),
    /// List virtual machines
    Vms(WatchArgs),
}

#[derive(Args)]
struct WatchArgs {
    #[arg(long, help = "Number of refresh cycles (default from config)")]
    cycles: Option<u32>,
    #[arg(long, help = "Seconds between cycles (default from config)")]
    interval: Option<u64>,
}

impl WatchArgs {
    fn apply(&self, mut watch: WatchConfig) -> WatchConfig {
        if let Some(cycles) = self.cycles {
            watch.cycles = cycles;
        }
        if let Some(interval) = self.interval {
            watch.interval_seconds = interval;
        }
        watch
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber (stderr, stdout carries results)
    let default_filter = if cli.verbose {
        "nas_state=debug"
    } else {
        "nas_state=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    }
    .with_env_overrides();

    info!(
        replay = %cli.replay.display(),
        timeout_seconds = config.fetch.timeout_seconds,
        "Configuration loaded"
    );

    let transport: Arc<dyn Transport> = Arc::new(ReplayTransport::new(&cli.replay));

    match cli.command {
        Command::Invoke { method, arguments } => {
            let args: Vec<Value> = serde_json::from_str(&arguments)
                .context("--arguments must be a JSON-encoded list")?;
            let result = transport
                .invoke(&method, args)
                .await
                .with_context(|| format!("Failed to invoke {}", method))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Pools(watch) => {
            let machine = connect(transport, &config).await?;
            run_cycles(&machine, &watch.apply(config.watch), Listing::Pools).await;
        }
        Command::Disks(watch) => {
            let machine = connect(transport, &config).await?;
            run_cycles(&machine, &watch.apply(config.watch), Listing::Disks).await;
        }
        Command::Vms(watch) => {
            let machine = connect(transport, &config).await?;
            run_cycles(&machine, &watch.apply(config.watch), Listing::Vms).await;
        }
    }

    Ok(())
}

async fn connect(transport: Arc<dyn Transport>, config: &Config) -> Result<Machine> {
    Machine::connect(transport, &config.fetch)
        .await
        .context("Failed to connect to remote host")
}

/// Entity kind shown by a watch command
#[derive(Clone, Copy, Debug)]
enum Listing {
    Pools,
    Disks,
    Vms,
}

impl Listing {
    /// Refresh only this kind, so a host answering just its query works.
    async fn refresh(self, machine: &Machine) -> Result<(), TransportError> {
        match self {
            Listing::Pools => machine.refresh_pools().await.map(|_| ()),
            Listing::Disks => machine.refresh_disks().await.map(|_| ()),
            Listing::Vms => machine.refresh_vms().await.map(|_| ()),
        }
    }

    fn print(self, machine: &Machine) {
        match self {
            Listing::Pools => print_pools(machine),
            Listing::Disks => print_disks(machine),
            Listing::Vms => print_vms(machine),
        }
    }
}

/// Refresh and print `watch.cycles` times.
///
/// A failed refresh is logged and the last known state is printed anyway.
async fn run_cycles(machine: &Machine, watch: &WatchConfig, listing: Listing) {
    for cycle in 1..=watch.cycles.max(1) {
        if cycle > 1 {
            tokio::time::sleep(Duration::from_secs(watch.interval_seconds)).await;
            println!();
        }

        if let Err(e) = listing.refresh(machine).await {
            warn!(cycle = cycle, error = %e, "Refresh failed, showing last known state");
        }
        listing.print(machine);
    }
}

fn availability(available: bool) -> &'static str {
    if available {
        "available"
    } else {
        "unavailable"
    }
}

fn print_pools(machine: &Machine) {
    println!("{:<22} {:<16} {:<10} {:<10} STATE", "GUID", "NAME", "STATUS", "DECRYPTED");
    for pool in machine.pools() {
        let status = match pool.status() {
            Ok(status) => status.to_string(),
            Err(e) => format!("? ({})", e.raw),
        };
        println!(
            "{:<22} {:<16} {:<10} {:<10} {}",
            pool.guid(),
            pool.name(),
            status,
            pool.is_decrypted(),
            availability(pool.is_available())
        );
    }
}

fn print_disks(machine: &Machine) {
    println!("{:<10} {:<24} {:<6} {:>8} STATE", "NAME", "MODEL", "TYPE", "TEMP");
    for disk in machine.disks() {
        let disk_type = match disk.disk_type() {
            Ok(disk_type) => disk_type.to_string(),
            Err(e) => format!("? ({})", e.raw),
        };
        let temperature = disk
            .temperature()
            .map(|t| format!("{:.1}C", t))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:<24} {:<6} {:>8} {}",
            disk.name(),
            disk.model().unwrap_or_default(),
            disk_type,
            temperature,
            availability(disk.is_available())
        );
    }
}

fn print_vms(machine: &Machine) {
    println!("{:<6} {:<16} {:<10} {:<8} STATE", "ID", "NAME", "RUN", "PID");
    for vm in machine.vms() {
        let run_state = match vm.state() {
            Ok(Some(state)) => state.to_string(),
            Ok(None) => "-".to_string(),
            Err(e) => format!("? ({})", e.raw),
        };
        let pid = vm
            .pid()
            .map(|pid| pid.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<16} {:<10} {:<8} {}",
            vm.id(),
            vm.name(),
            run_state,
            pid,
            availability(vm.is_available())
        );
    }
}
