//! Bridge orchestration
//!
//! Owns every long-running thread and the lifecycle state machine:
//!
//! ```text
//! Created ──start()──► Starting ──► Running ──stop()──► Stopping ──► Stopped
//!    │                    │ (fatal error)                              ▲
//!    └──────stop()────────┴────────────────────────────────────────────┘
//! ```
//!
//! One start/stop cycle per instance; a stopped bridge cannot be restarted.

use crate::acquisition::AcquisitionLoop;
use crate::config::BridgeConfig;
use crate::core::provider::TrackingProvider;
use crate::devices::create_provider;
use crate::error::{Error, Result};
use crate::state::{ControlState, SnapshotStore};
use crate::streaming::{
    AdvertisedPorts, ClientRegistry, CommandHandler, DatagramBroadcaster, DiscoveryBeacon,
    MessageBroadcaster, WebSocketServer,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// Lifecycle state of a [`TobiiBridge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Created,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl BridgeState {
    pub fn name(&self) -> &'static str {
        match self {
            BridgeState::Created => "created",
            BridgeState::Starting => "starting",
            BridgeState::Running => "running",
            BridgeState::Stopping => "stopping",
            BridgeState::Stopped => "stopped",
        }
    }
}

/// Cloneable handle that asks a running bridge to stop.
///
/// Safe to trigger from a signal handler; the owner still calls
/// [`TobiiBridge::stop`] to join threads. A stop requested before
/// [`TobiiBridge::start`] makes `start` a no-op.
#[derive(Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        !self.running.load(Ordering::Relaxed)
    }
}

/// Sockets bound during startup, before any thread is spawned
struct Transports {
    server: WebSocketServer,
    datagrams: DatagramBroadcaster,
    beacon: Option<DiscoveryBeacon>,
}

/// Sensor-data bridge: acquisition, WebSocket fan-out, legacy UDP, discovery
pub struct TobiiBridge {
    config: BridgeConfig,
    state: BridgeState,
    provider: Option<Box<dyn TrackingProvider>>,
    running: Arc<AtomicBool>,
    snapshot: Arc<SnapshotStore>,
    control: Arc<ControlState>,
    registry: Arc<ClientRegistry>,
    websocket_addr: Option<SocketAddr>,
    acquisition_thread: Option<JoinHandle<()>>,
    discovery_thread: Option<JoinHandle<()>>,
    listener_thread: Option<JoinHandle<()>>,
}

impl TobiiBridge {
    /// Create a bridge with the provider named in `config.provider.kind`
    pub fn new(config: BridgeConfig) -> Result<Self> {
        let provider = create_provider(&config.provider)?;
        Ok(Self::with_provider(config, provider))
    }

    /// Create a bridge around an already constructed provider
    pub fn with_provider(config: BridgeConfig, provider: Box<dyn TrackingProvider>) -> Self {
        let control = Arc::new(ControlState::new());
        Self {
            config,
            state: BridgeState::Created,
            provider: Some(provider),
            // Armed at construction; only cleared, never set again
            running: Arc::new(AtomicBool::new(true)),
            snapshot: Arc::new(SnapshotStore::new()),
            registry: Arc::new(ClientRegistry::new(Arc::clone(&control))),
            control,
            websocket_addr: None,
            acquisition_thread: None,
            discovery_thread: None,
            listener_thread: None,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn control(&self) -> Arc<ControlState> {
        Arc::clone(&self.control)
    }

    /// Bound WebSocket address, available once started
    pub fn websocket_addr(&self) -> Option<SocketAddr> {
        self.websocket_addr
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Bring the provider up, bind every transport, and launch the threads.
    ///
    /// Any failure here is fatal: the bridge ends in `Stopped` and the error
    /// is returned.
    pub fn start(&mut self) -> Result<()> {
        if self.state != BridgeState::Created {
            return Err(Error::InvalidState {
                operation: "start",
                state: self.state.name(),
            });
        }
        if !self.running.load(Ordering::Relaxed) {
            log::info!("Stop requested before start, not starting");
            self.state = BridgeState::Stopped;
            return Ok(());
        }
        self.state = BridgeState::Starting;
        log::info!("Starting Tobii bridge v{}", env!("CARGO_PKG_VERSION"));

        match self.launch() {
            Ok(()) => {
                self.state = BridgeState::Running;
                self.log_banner();
                Ok(())
            }
            Err(e) => {
                log::error!("Bridge failed to start: {}", e);
                self.running.store(false, Ordering::Relaxed);
                // Threads already spawned exit on the cleared flag
                let _ = self.join_threads();
                self.control.set_connected(false);
                self.state = BridgeState::Stopped;
                Err(e)
            }
        }
    }

    fn launch(&mut self) -> Result<()> {
        let mut provider = self.provider.take().ok_or(Error::InvalidState {
            operation: "start",
            state: "provider released",
        })?;
        provider.initialize()?;
        self.control.set_connected(true);

        let transports = match self.bind_transports() {
            Ok(transports) => transports,
            Err(e) => {
                provider.shutdown();
                return Err(e);
            }
        };
        self.spawn_threads(provider, transports)
    }

    fn bind_transports(&self) -> Result<Transports> {
        let network = &self.config.network;

        let handler = Arc::new(CommandHandler::new(Arc::clone(&self.control)));
        let server = WebSocketServer::bind(
            network.websocket_addr()?,
            Arc::clone(&self.registry),
            handler,
        )?;
        let datagrams = DatagramBroadcaster::bind(network.legacy_target()?)?;

        let beacon = if self.config.discovery.enabled {
            let ports = AdvertisedPorts {
                websocket: server.local_addr().port(),
                udp: network.udp_port,
                config: network.config_port,
            };
            Some(DiscoveryBeacon::bind(
                network.discovery_target()?,
                ports,
                Duration::from_secs(self.config.discovery.interval_secs.max(1)),
            )?)
        } else {
            None
        };

        Ok(Transports {
            server,
            datagrams,
            beacon,
        })
    }

    fn spawn_threads(
        &mut self,
        provider: Box<dyn TrackingProvider>,
        transports: Transports,
    ) -> Result<()> {
        let Transports {
            server,
            datagrams,
            beacon,
        } = transports;
        self.websocket_addr = Some(server.local_addr());

        let messages = MessageBroadcaster::new(
            Arc::clone(&self.snapshot),
            Arc::clone(&self.registry),
            Arc::clone(&self.control),
        );
        let stats_secs = self.config.acquisition.stats_interval_secs;
        let mut acquisition = AcquisitionLoop::new(
            provider,
            Arc::clone(&self.snapshot),
            Arc::clone(&self.control),
            messages,
            datagrams,
            self.config.acquisition.interval(),
        )
        .with_stats_interval((stats_secs > 0).then(|| Duration::from_secs(stats_secs)));

        // A dropped closure drops `acquisition`, which shuts the provider down

        let running = Arc::clone(&self.running);
        self.listener_thread = Some(spawn("ws-listener", move || server.run(running))?);

        let running = Arc::clone(&self.running);
        self.acquisition_thread = Some(spawn("acquisition", move || acquisition.run(&running))?);

        if let Some(mut beacon) = beacon {
            let running = Arc::clone(&self.running);
            self.discovery_thread = Some(spawn("discovery-beacon", move || beacon.run(running))?);
        }

        Ok(())
    }

    fn log_banner(&self) {
        let network = &self.config.network;
        if let Some(addr) = self.websocket_addr {
            log::info!("WebSocket server: ws://{}", addr);
        }
        log::info!(
            "Legacy UDP (OpenTrack): {}:{}",
            network.broadcast_address,
            network.udp_port
        );
        if self.config.discovery.enabled {
            log::info!(
                "Discovery beacon: {}:{}",
                network.broadcast_address,
                network.discovery_port
            );
        } else {
            log::info!("Discovery beacon disabled");
        }
        log::info!("✓ Tobii bridge running");
    }

    /// Block until the acquisition and discovery loops have exited.
    ///
    /// Returns once a [`StopHandle`] (or `stop()`) clears the running flag.
    pub fn wait_for_completion(&mut self) -> Result<()> {
        let mut result = Ok(());
        if let Some(handle) = self.acquisition_thread.take()
            && handle.join().is_err()
        {
            result = Err(Error::ThreadPanic("acquisition"));
        }
        if let Some(handle) = self.discovery_thread.take()
            && handle.join().is_err()
        {
            result = Err(Error::ThreadPanic("discovery-beacon"));
        }
        result
    }

    /// Signal every loop to finish and join them. Idempotent.
    pub fn stop(&mut self) -> Result<()> {
        match self.state {
            BridgeState::Stopping | BridgeState::Stopped => return Ok(()),
            BridgeState::Created => {
                self.running.store(false, Ordering::Relaxed);
                self.state = BridgeState::Stopped;
                return Ok(());
            }
            BridgeState::Starting | BridgeState::Running => {}
        }

        self.state = BridgeState::Stopping;
        log::info!("Stopping Tobii bridge...");
        self.running.store(false, Ordering::Relaxed);

        let result = self.join_threads();
        self.control.set_connected(false);
        self.state = BridgeState::Stopped;

        log::info!(
            "Tobii bridge stopped (processed: {}, distributed: {})",
            self.control.packets_processed(),
            self.control.packets_distributed()
        );
        result
    }

    fn join_threads(&mut self) -> Result<()> {
        let waited = self.wait_for_completion();
        let mut result = waited;
        if let Some(handle) = self.listener_thread.take()
            && handle.join().is_err()
        {
            result = Err(Error::ThreadPanic("ws-listener"));
        }
        result
    }
}

impl Drop for TobiiBridge {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("Error while stopping bridge: {}", e);
        }
    }
}

fn spawn<F>(name: &str, f: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    Ok(std::thread::Builder::new().name(name.to_string()).spawn(f)?)
}
