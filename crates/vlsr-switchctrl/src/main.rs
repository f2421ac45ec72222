//! vlsrctl - inspect VLSR switch-control state
//!
//! Reads the switch-control configuration and the preserved local IDs and
//! answers operator queries against them.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use vlsr_snmp::{Credentials, SnmpConnection, SnmpError, SnmpResult, SnmpTransport};
use vlsr_switchctrl::{decode_handle, SlotType, SwitchCtrlConfig, SwitchCtrlGlobal, DEFAULT_CONFIG_PATH};

#[derive(Debug, Parser)]
#[command(name = "vlsrctl", about = "Inspect VLSR switch-control state", version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the preserved local-ID file from the configuration
    #[arg(long)]
    preserved: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List registered local IDs
    LocalIds,
    /// Print the ports named by a local-ID handle (decimal or 0x hex)
    Lookup {
        #[arg(value_parser = parse_handle)]
        handle: u32,
    },
    /// Print the type of a chassis slot
    Slot { number: u16 },
}

fn parse_handle(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid handle '{}': {}", s, e))
}

/// Transport for offline queries; vlsrctl never talks to a switch
struct OfflineTransport;

#[async_trait]
impl SnmpTransport for OfflineTransport {
    async fn open(
        &self,
        address: IpAddr,
        _credentials: &Credentials,
    ) -> SnmpResult<Box<dyn SnmpConnection>> {
        Err(SnmpError::Open {
            address,
            reason: "vlsrctl does not open switch sessions".to_string(),
        })
    }
}

/// Initializes tracing/logging subsystem
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = SwitchCtrlConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(path) = cli.preserved {
        config.local_ids.preserved_path = path;
        config.local_ids.load_preserved = true;
    }

    let global = SwitchCtrlGlobal::from_config(&config, Arc::new(OfflineTransport))
        .context("invalid switch-control configuration")?;
    debug!("{} local IDs registered", global.local_ids().len());

    match cli.command {
        Command::LocalIds => {
            for lid in global.local_ids().entries() {
                println!("{:#010x}  {}", lid.handle(), lid);
            }
        }
        Command::Lookup { handle } => {
            let (id_type, value) = decode_handle(handle);
            if !global.has_local_id(id_type, value, 0) {
                bail!("no local ID {}:{} (handle {:#010x})", id_type, value, handle);
            }
            let ports: Vec<String> = global
                .get_ports_by_local_id(handle)
                .iter()
                .map(u32::to_string)
                .collect();
            println!("{}:{} -> [{}]", id_type, value, ports.join(", "));
        }
        Command::Slot { number } => match global.get_slot_type(number) {
            SlotType::Illegal => bail!("slot {} is not configured", number),
            slot_type => println!("slot {}: {}", number, slot_type),
        },
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
