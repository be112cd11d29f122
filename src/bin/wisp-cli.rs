use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use wisp_gateway::client::{
    ConnectivityProbe, FileStorage, PageOrigin, ProbeState, RemoteServer, RoutingRequest,
    SettingKey, SettingsStore,
};
use wisp_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "wisp-cli")]
#[command(about = "Inspect and test a wisp gateway from the terminal", long_about = None)]
struct Cli {
    /// Origin the gateway serves the client from
    #[arg(short, long, default_value = "http://localhost:8080")]
    server: String,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the runtime config the server publishes
    Config,
    /// Print the effective settings
    Settings,
    /// Change one setting (wisp-path, search-template, transport)
    Set { key: SettingKey, value: String },
    /// Check health and the WebSocket upgrade
    Probe,
    /// Show how an address-bar input would be routed
    Resolve { input: String },
    /// Forget stored settings
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging("wisp_gateway=warn");
    let cli = Cli::parse();

    let origin = PageOrigin::parse(&cli.server)?;
    let remote = RemoteServer::new(reqwest::Client::new(), origin.clone());
    let storage = match cli.storage {
        Some(path) => FileStorage::new(path),
        None => FileStorage::default_location().context("no config directory for settings")?,
    };
    tracing::debug!(path = %storage.path().display(), "Using settings file");

    let runtime = remote.fetch_runtime_config().await;

    match cli.command {
        Commands::Config => print_json(&runtime)?,
        Commands::Settings => {
            let store = SettingsStore::load(&runtime, Arc::new(storage));
            print_json(&store.settings())?;
        }
        Commands::Set { key, value } => {
            let store = SettingsStore::load(&runtime, Arc::new(storage));
            let settings = store.update(key, &value)?;
            print_json(&settings)?;
        }
        Commands::Probe => {
            let store = SettingsStore::load(&runtime, Arc::new(storage));
            let probe = ConnectivityProbe::new(remote);
            let result = probe
                .probe(&store.settings().wisp_path)
                .await
                .context("probe was cancelled")?;
            print_json(&result)?;
            if result.state == ProbeState::Error {
                std::process::exit(1);
            }
        }
        Commands::Resolve { input } => {
            let store = SettingsStore::load(&runtime, Arc::new(storage));
            print_json(&RoutingRequest::build(&store.settings(), &origin, &input))?;
        }
        Commands::Reset => {
            let store = SettingsStore::load(&runtime, Arc::new(storage));
            print_json(&store.reset()?)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
