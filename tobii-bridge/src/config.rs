//! Configuration for the Tobii bridge
//!
//! Loads configuration from a TOML file. Every section and field has a
//! default, so an empty file (or no file at all) yields a working bridge
//! on the standard ports.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Default WebSocket (message-protocol) port
pub const DEFAULT_WEBSOCKET_PORT: u16 = 8080;
/// Default legacy OpenTrack UDP port
pub const DEFAULT_UDP_PORT: u16 = 4242;
/// Default discovery beacon port
pub const DEFAULT_DISCOVERY_PORT: u16 = 8083;
/// Default configuration port advertised in announcements
pub const DEFAULT_CONFIG_PORT: u16 = 8081;

/// Top-level bridge configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network ports and addresses
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Interface the WebSocket listener binds to
    ///
    /// Examples:
    /// - `0.0.0.0` - All interfaces
    /// - `127.0.0.1` - Localhost only
    pub bind_address: String,
    /// WebSocket port for data frames and commands (0 = ephemeral)
    pub websocket_port: u16,
    /// Destination port of the legacy head-pose datagram
    pub udp_port: u16,
    /// Destination port of the discovery announcement
    pub discovery_port: u16,
    /// Configuration port advertised to discovering clients
    pub config_port: u16,
    /// Destination address for both datagram transports
    pub broadcast_address: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            websocket_port: DEFAULT_WEBSOCKET_PORT,
            udp_port: DEFAULT_UDP_PORT,
            discovery_port: DEFAULT_DISCOVERY_PORT,
            config_port: DEFAULT_CONFIG_PORT,
            broadcast_address: "255.255.255.255".to_string(),
        }
    }
}

impl NetworkConfig {
    /// WebSocket listener address
    pub fn websocket_addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::new(
            parse_ip(&self.bind_address)?,
            self.websocket_port,
        ))
    }

    /// Legacy datagram destination
    pub fn legacy_target(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::new(
            parse_ip(&self.broadcast_address)?,
            self.udp_port,
        ))
    }

    /// Discovery announcement destination
    pub fn discovery_target(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::new(
            parse_ip(&self.broadcast_address)?,
            self.discovery_port,
        ))
    }
}

fn parse_ip(s: &str) -> Result<IpAddr> {
    s.parse()
        .map_err(|_| Error::InvalidAddress(s.to_string()))
}

/// Acquisition loop timing
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Target cycle interval in milliseconds (16 ms ≈ 60 Hz)
    pub interval_ms: u64,
    /// Period of the statistics log line in seconds (0 disables it)
    pub stats_interval_secs: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            interval_ms: 16,
            stats_interval_secs: 10,
        }
    }
}

impl AcquisitionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Discovery beacon settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub enabled: bool,
    /// Announcement period in seconds
    pub interval_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 5,
        }
    }
}

/// Tracking provider selection
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider factory key (currently only `mock`)
    pub kind: String,
    /// Simulation seed; 0 draws from entropy
    pub random_seed: u64,
    /// Probability per cycle that the mock reports nobody present
    pub presence_dropout: f32,
    /// Probability per cycle that the mock has no head pose
    pub head_dropout: f32,
    /// Probability per cycle that the mock has no gaze point
    pub gaze_dropout: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: "mock".to_string(),
            random_seed: 0,
            presence_dropout: 0.0,
            head_dropout: 0.0,
            gaze_dropout: 0.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use tobii_bridge::config::BridgeConfig;
    ///
    /// let config = BridgeConfig::from_file("tobii-bridge.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
