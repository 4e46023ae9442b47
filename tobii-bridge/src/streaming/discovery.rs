//! LAN discovery beacon
//!
//! Broadcasts a JSON [`Announcement`] on the discovery port at a fixed
//! period for the lifetime of the bridge. Shares nothing with the acquisition
//! path except the running flag.

use crate::core::types::now_ms;
use crate::error::Result;
use crate::streaming::messages::Announcement;
use crate::streaming::udp_publisher::bind_broadcast_socket;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Upper bound on how long `run` sleeps before rechecking the running flag
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Ports advertised in every announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisedPorts {
    pub websocket: u16,
    pub udp: u16,
    pub config: u16,
}

pub struct DiscoveryBeacon {
    socket: UdpSocket,
    target: SocketAddr,
    ports: AdvertisedPorts,
    interval: Duration,
    sent: u64,
}

impl DiscoveryBeacon {
    /// Bind the sending socket; failure is fatal at startup
    pub fn bind(target: SocketAddr, ports: AdvertisedPorts, interval: Duration) -> Result<Self> {
        let socket = bind_broadcast_socket("discovery")?;
        Ok(Self {
            socket,
            target,
            ports,
            interval,
            sent: 0,
        })
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Send one announcement
    pub fn announce(&mut self) -> Result<()> {
        let announcement = Announcement::new(
            self.ports.websocket,
            self.ports.udp,
            self.ports.config,
            now_ms(),
        );
        let payload = serde_json::to_vec(&announcement)?;
        self.socket.send_to(&payload, self.target)?;
        self.sent += 1;
        Ok(())
    }

    /// Announce every `interval` until `running` clears
    pub fn run(&mut self, running: Arc<AtomicBool>) {
        log::info!(
            "Discovery beacon started ({} every {:?})",
            self.target,
            self.interval
        );

        while running.load(Ordering::Relaxed) {
            if let Err(e) = self.announce() {
                log::trace!("Discovery announcement dropped: {}", e);
            }

            let deadline = Instant::now() + self.interval;
            while running.load(Ordering::Relaxed) {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                std::thread::sleep(remaining.min(SLEEP_SLICE));
            }
        }

        log::info!("Discovery beacon stopped ({} announcements)", self.sent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn ports() -> AdvertisedPorts {
        AdvertisedPorts {
            websocket: 8080,
            udp: 4242,
            config: 8081,
        }
    }

    #[test]
    fn test_announce_payload() {
        let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
        rx.set_read_timeout(Some(Duration::from_millis(500))).unwrap();
        let mut beacon =
            DiscoveryBeacon::bind(rx.local_addr().unwrap(), ports(), Duration::from_secs(5))
                .unwrap();

        beacon.announce().unwrap();

        let mut buf = [0u8; 1024];
        let n = rx.recv(&mut buf).unwrap();
        let value: Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(value["type"], "tobii-bridge-announcement");
        assert_eq!(value["websocket_port"], 8080);
        assert_eq!(value["udp_port"], 4242);
        assert_eq!(value["config_port"], 8081);
        assert_eq!(beacon.sent(), 1);
    }

    #[test]
    fn test_run_stops_promptly() {
        let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
        rx.set_read_timeout(Some(Duration::from_millis(500))).unwrap();
        let mut beacon =
            DiscoveryBeacon::bind(rx.local_addr().unwrap(), ports(), Duration::from_secs(60))
                .unwrap();

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = std::thread::spawn(move || {
            beacon.run(flag);
            beacon.sent()
        });

        let mut buf = [0u8; 1024];
        assert!(rx.recv(&mut buf).is_ok());

        let stop_requested = Instant::now();
        running.store(false, Ordering::Relaxed);
        let sent = handle.join().unwrap();

        assert_eq!(sent, 1);
        assert!(stop_requested.elapsed() < Duration::from_secs(1));
    }
}
