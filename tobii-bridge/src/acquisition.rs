//! Fixed-cadence acquisition loop
//!
//! One cycle: provider update → read gaze/head/presence → replace snapshot →
//! count → WebSocket fan-out → legacy datagram. The loop sleeps for whatever
//! is left of the interval; an overrunning cycle is followed immediately by
//! the next one, with no catch-up.

use crate::core::provider::TrackingProvider;
use crate::core::types::{SensorSnapshot, now_ms};
use crate::error::Result;
use crate::state::{ControlState, SnapshotStore};
use crate::streaming::{DatagramBroadcaster, MessageBroadcaster};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub struct AcquisitionLoop {
    provider: Box<dyn TrackingProvider>,
    snapshot: Arc<SnapshotStore>,
    control: Arc<ControlState>,
    messages: MessageBroadcaster,
    datagrams: DatagramBroadcaster,
    interval: Duration,
    stats_interval: Option<Duration>,
    cycles: u64,
    failed_cycles: u64,
    provider_released: bool,
}

impl AcquisitionLoop {
    pub fn new(
        provider: Box<dyn TrackingProvider>,
        snapshot: Arc<SnapshotStore>,
        control: Arc<ControlState>,
        messages: MessageBroadcaster,
        datagrams: DatagramBroadcaster,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            snapshot,
            control,
            messages,
            datagrams,
            interval,
            stats_interval: None,
            cycles: 0,
            failed_cycles: 0,
            provider_released: false,
        }
    }

    /// Log counters every `interval`; `None` disables
    pub fn with_stats_interval(mut self, interval: Option<Duration>) -> Self {
        self.stats_interval = interval;
        self
    }

    pub fn failed_cycles(&self) -> u64 {
        self.failed_cycles
    }

    /// Run one acquisition cycle.
    ///
    /// A provider error aborts the cycle before the snapshot is touched.
    pub fn run_cycle(&mut self) -> Result<()> {
        self.provider.update()?;

        if !self.control.is_connected() {
            return Ok(());
        }

        let gaze = self.provider.latest_gaze_point()?;
        let head = self.provider.latest_head_pose()?;
        let present = self.provider.is_present()?;

        self.snapshot
            .write(SensorSnapshot::from_readings(now_ms(), gaze, head, present));
        self.control.record_processed();

        self.messages.broadcast();
        self.datagrams.publish(&self.snapshot.read());
        Ok(())
    }

    /// Cycle until `running` clears, then shut the provider down
    pub fn run(&mut self, running: &AtomicBool) {
        log::info!("Acquisition loop started (interval: {:?})", self.interval);
        let mut last_stats = Instant::now();

        while running.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();
            self.cycles += 1;

            if let Err(e) = self.run_cycle() {
                self.failed_cycles += 1;
                log::warn!("Acquisition cycle {} skipped: {}", self.cycles, e);
            }

            if let Some(period) = self.stats_interval
                && last_stats.elapsed() >= period
            {
                self.log_statistics();
                last_stats = Instant::now();
            }

            let elapsed = cycle_start.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }

        self.release_provider();
        self.log_statistics();
        log::info!("Acquisition loop stopped");
    }

    /// Shut the provider down exactly once
    fn release_provider(&mut self) {
        if !self.provider_released {
            self.provider_released = true;
            self.provider.shutdown();
        }
    }

    fn log_statistics(&self) {
        log::info!(
            "Packets processed={} distributed={} clients={} legacy={} failed_cycles={}",
            self.control.packets_processed(),
            self.control.packets_distributed(),
            self.control.client_count(),
            self.datagrams.sent(),
            self.failed_cycles
        );
    }
}

impl Drop for AcquisitionLoop {
    fn drop(&mut self) {
        self.release_provider();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{GazePoint, HeadPose};
    use crate::error::Error;
    use crate::streaming::registry::{ClientRegistry, ConnectionId, outbox};
    use approx::assert_relative_eq;
    use std::net::UdpSocket;

    #[derive(Default)]
    struct ScriptedProvider {
        gaze: Option<GazePoint>,
        head: Option<HeadPose>,
        present: bool,
        fail_update: bool,
        updates: Arc<std::sync::atomic::AtomicU64>,
        shutdowns: Arc<std::sync::atomic::AtomicU64>,
    }

    impl TrackingProvider for ScriptedProvider {
        fn initialize(&mut self) -> Result<()> {
            Ok(())
        }

        fn update(&mut self) -> Result<()> {
            self.updates.fetch_add(1, Ordering::Relaxed);
            if self.fail_update {
                return Err(Error::ProviderRead("scripted failure".to_string()));
            }
            Ok(())
        }

        fn latest_gaze_point(&mut self) -> Result<Option<GazePoint>> {
            Ok(self.gaze)
        }

        fn latest_head_pose(&mut self) -> Result<Option<HeadPose>> {
            Ok(self.head)
        }

        fn is_present(&mut self) -> Result<bool> {
            Ok(self.present)
        }

        fn shutdown(&mut self) {
            self.shutdowns.fetch_add(1, Ordering::Relaxed);
        }
    }

    struct Fixture {
        acquisition: AcquisitionLoop,
        snapshot: Arc<SnapshotStore>,
        control: Arc<ControlState>,
        registry: Arc<ClientRegistry>,
        legacy_rx: UdpSocket,
    }

    fn fixture(provider: ScriptedProvider) -> Fixture {
        let snapshot = Arc::new(SnapshotStore::new());
        let control = Arc::new(ControlState::new());
        let registry = Arc::new(ClientRegistry::new(Arc::clone(&control)));
        let messages = MessageBroadcaster::new(
            Arc::clone(&snapshot),
            Arc::clone(&registry),
            Arc::clone(&control),
        );

        let legacy_rx = UdpSocket::bind("127.0.0.1:0").unwrap();
        legacy_rx
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let datagrams = DatagramBroadcaster::bind(legacy_rx.local_addr().unwrap()).unwrap();

        control.set_connected(true);
        let acquisition = AcquisitionLoop::new(
            Box::new(provider),
            Arc::clone(&snapshot),
            Arc::clone(&control),
            messages,
            datagrams,
            Duration::from_millis(16),
        );

        Fixture {
            acquisition,
            snapshot,
            control,
            registry,
            legacy_rx,
        }
    }

    fn full_provider() -> ScriptedProvider {
        ScriptedProvider {
            gaze: Some(GazePoint {
                x: 0.5,
                y: 0.5,
                timestamp: 1000,
            }),
            head: Some(HeadPose {
                yaw: 1.0,
                pitch: 2.0,
                roll: 3.0,
                x: 0.0,
                y: 0.0,
                z: 0.0,
            }),
            present: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_cycle_updates_snapshot_and_distributes() {
        let mut f = fixture(full_provider());
        let (tx, rx) = outbox();
        f.registry.register(ConnectionId::new(1), tx);

        f.acquisition.run_cycle().unwrap();

        let snapshot = f.snapshot.read();
        assert!(snapshot.present());
        assert_relative_eq!(snapshot.overall_quality(), 0.9, epsilon = 1e-6);
        assert_eq!(f.control.packets_processed(), 1);
        assert_eq!(f.control.packets_distributed(), 1);

        let frame: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(frame["data"]["hasHead"], true);

        let mut buf = [0u8; 64];
        let n = f.legacy_rx.recv(&mut buf).unwrap();
        let datagram = crate::streaming::LegacyOrientationDatagram::from_bytes(&buf[..n]).unwrap();
        assert_eq!(
            (datagram.yaw, datagram.pitch, datagram.roll),
            (1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn test_no_clients_counts_processed_only() {
        let mut f = fixture(full_provider());
        f.acquisition.run_cycle().unwrap();
        assert_eq!(f.control.packets_processed(), 1);
        assert_eq!(f.control.packets_distributed(), 0);
    }

    #[test]
    fn test_no_head_no_datagram() {
        let mut f = fixture(ScriptedProvider {
            head: None,
            ..full_provider()
        });
        f.acquisition.run_cycle().unwrap();

        assert!(f.snapshot.read().head().is_none());
        let mut buf = [0u8; 64];
        assert!(f.legacy_rx.recv(&mut buf).is_err());
    }

    #[test]
    fn test_provider_failure_skips_cycle() {
        let mut f = fixture(ScriptedProvider {
            fail_update: true,
            ..full_provider()
        });
        assert!(f.acquisition.run_cycle().is_err());
        assert_eq!(f.control.packets_processed(), 0);
        assert_eq!(f.snapshot.read(), SensorSnapshot::default());
    }

    #[test]
    fn test_disconnected_provider_only_updates() {
        let updates = Arc::new(std::sync::atomic::AtomicU64::new(0));
        let mut f = fixture(ScriptedProvider {
            updates: Arc::clone(&updates),
            ..full_provider()
        });
        f.control.set_connected(false);

        f.acquisition.run_cycle().unwrap();
        assert_eq!(updates.load(Ordering::Relaxed), 1);
        assert_eq!(f.control.packets_processed(), 0);
    }

    #[test]
    fn test_run_survives_failures_and_stops() {
        let mut f = fixture(ScriptedProvider {
            fail_update: true,
            ..full_provider()
        });
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = std::thread::spawn(move || {
            f.acquisition.run(&flag);
            f.acquisition.failed_cycles()
        });
        std::thread::sleep(Duration::from_millis(100));
        running.store(false, Ordering::Relaxed);

        let failed = handle.join().unwrap();
        assert!(failed >= 2);
    }

    #[test]
    fn test_dropping_unrun_loop_shuts_provider_down() {
        let shutdowns = Arc::new(std::sync::atomic::AtomicU64::new(0));
        let f = fixture(ScriptedProvider {
            shutdowns: Arc::clone(&shutdowns),
            ..full_provider()
        });

        drop(f);
        assert_eq!(shutdowns.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_provider_shut_down_once_after_run() {
        let shutdowns = Arc::new(std::sync::atomic::AtomicU64::new(0));
        let mut f = fixture(ScriptedProvider {
            shutdowns: Arc::clone(&shutdowns),
            ..full_provider()
        });

        f.acquisition.run(&AtomicBool::new(false));
        assert_eq!(shutdowns.load(Ordering::Relaxed), 1);

        drop(f);
        assert_eq!(shutdowns.load(Ordering::Relaxed), 1);
    }
}
