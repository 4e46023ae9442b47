//! Legacy OpenTrack head-pose broadcaster
//!
//! Every acquisition cycle that carries a head sample produces one 24-byte
//! datagram (see [`crate::streaming::wire`]) broadcast to the legacy port.
//!
//! # Delivery
//!
//! | Property | Behavior |
//! |----------|----------|
//! | Addressing | Broadcast to a fixed address, no client tracking |
//! | Source port | Ephemeral |
//! | Reliability | Best effort, send errors swallowed |
//! | Counters | Never touches `packets_distributed` |

use crate::core::types::SensorSnapshot;
use crate::error::{Error, Result};
use crate::streaming::wire::LegacyOrientationDatagram;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

/// Bind an ephemeral UDP socket with `SO_BROADCAST` enabled
pub(crate) fn bind_broadcast_socket(transport: &'static str) -> Result<UdpSocket> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
    let socket = UdpSocket::bind(addr).map_err(|source| Error::Bind {
        transport,
        addr,
        source,
    })?;
    socket.set_broadcast(true).map_err(|source| Error::Bind {
        transport,
        addr,
        source,
    })?;
    Ok(socket)
}

/// Broadcasts head orientation in OpenTrack's datagram layout
pub struct DatagramBroadcaster {
    socket: UdpSocket,
    target: SocketAddr,
    sent: u64,
}

impl DatagramBroadcaster {
    /// Bind the sending socket; failure is fatal at startup
    pub fn bind(target: SocketAddr) -> Result<Self> {
        let socket = bind_broadcast_socket("legacy-udp")?;
        log::info!("Legacy UDP broadcasting head pose to {}", target);
        Ok(Self {
            socket,
            target,
            sent: 0,
        })
    }

    /// Datagrams handed to the socket so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Send the head pose of `snapshot`; no-op without head data
    pub fn publish(&mut self, snapshot: &SensorSnapshot) {
        let Some(datagram) = LegacyOrientationDatagram::from_snapshot(snapshot) else {
            return;
        };

        match self.socket.send_to(&datagram.to_bytes(), self.target) {
            Ok(_) => self.sent += 1,
            Err(e) => log::trace!("Legacy datagram to {} dropped: {}", self.target, e),
        }
    }
}
