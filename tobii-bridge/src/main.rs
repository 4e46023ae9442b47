//! Tobii bridge daemon
//!
//! ```text
//! tobii-bridge [-c tobii-bridge.toml] [--ws-port 8080] [--udp-port 4242]
//!              [--discovery-port 8083] [--log-level info]
//! ```
//!
//! Exits non-zero when the provider or any transport cannot be brought up.

use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tobii_bridge::{BridgeConfig, Error, Result, TobiiBridge};

const DEFAULT_CONFIG_FILE: &str = "tobii-bridge.toml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to ./tobii-bridge.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// WebSocket port
    #[arg(long)]
    ws_port: Option<u16>,

    /// Legacy OpenTrack UDP port
    #[arg(long)]
    udp_port: Option<u16>,

    /// Discovery broadcast port
    #[arg(long)]
    discovery_port: Option<u16>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

/// Config file to load, if any
fn config_path(args: &Args) -> Option<PathBuf> {
    match &args.config {
        Some(path) => Some(path.clone()),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            default.exists().then(|| default.to_path_buf())
        }
    }
}

fn load_config(args: &Args) -> Result<BridgeConfig> {
    let mut config = match config_path(args) {
        Some(path) => BridgeConfig::from_file(&path)?,
        None => BridgeConfig::default(),
    };

    if let Some(port) = args.ws_port {
        config.network.websocket_port = port;
    }
    if let Some(port) = args.udp_port {
        config.network.udp_port = port;
    }
    if let Some(port) = args.discovery_port {
        config.network.discovery_port = port;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    Ok(config)
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

fn run(config: BridgeConfig) -> Result<()> {
    let mut bridge = TobiiBridge::new(config)?;

    let stop = bridge.stop_handle();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        stop.stop();
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    bridge.start()?;
    log::info!("Press Ctrl+C to stop");

    let waited = bridge.wait_for_completion();
    let stopped = bridge.stop();
    waited.and(stopped)
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            init_logging("info");
            log::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging.level);
    if let Some(path) = config_path(&args) {
        log::info!("Using config: {}", path.display());
    }

    if let Err(e) = run(config) {
        log::error!("Tobii bridge failed: {}", e);
        std::process::exit(1);
    }
}
