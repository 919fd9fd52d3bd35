//! chassis-provd - chassis VLAN provisioning daemon
//!
//! Entry point. Loads the switch configuration, builds one device client
//! per switch, and exposes the provisioning driver to the orchestration
//! layer that dispatches lifecycle callbacks.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use chassis_mirror::MemoryMirrorStore;
use chassis_provd::{DriverConfig, ProvisioningDriver};

#[derive(Debug, Parser)]
#[command(name = "chassis-provd", about = "Chassis VLAN provisioning driver")]
struct Args {
    /// Path to the YAML switch configuration.
    #[arg(short, long)]
    config: PathBuf,
}

/// Initializes tracing/logging subsystem
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = DriverConfig::load(&args.config)?;
    info!("Loaded {} switch(es) from {}", config.switches.len(), args.config.display());

    let store = Arc::new(MemoryMirrorStore::new());
    let driver = ProvisioningDriver::new(config, store)?;

    info!(
        "chassis-provd ready, managing switches: {}",
        driver.switch_addresses().join(", ")
    );

    // The driver is callback-driven; lifecycle events arrive through the
    // embedding orchestration layer, not through a loop of our own.
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    info!("--- Starting chassis-provd ---");

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("chassis-provd failed to start: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
