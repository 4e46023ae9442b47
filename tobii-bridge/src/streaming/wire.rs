//! Wire encodings for the outbound transports
//!
//! # WebSocket
//!
//! One JSON text message per frame. Every cycle's data frame is encoded
//! once and the same text is handed to every client outbox.
//!
//! # Legacy OpenTrack UDP
//!
//! Fixed 24-byte datagram, six little-endian IEEE-754 `f32` fields:
//!
//! ```text
//! ┌───────┬───────┬───────┬───────┬───────┬───────┐
//! │ yaw   │ pitch │ roll  │ x     │ y     │ z     │
//! │ 0..4  │ 4..8  │ 8..12 │ 12..16│ 16..20│ 20..24│
//! └───────┴───────┴───────┴───────┴───────┴───────┘
//! ```
//!
//! No header, no version, no checksum. Only emitted for snapshots that carry
//! a head sample.

use crate::core::types::SensorSnapshot;
use crate::error::Result;
use crate::streaming::messages::ServerMessage;
use std::sync::Arc;

/// Size of the legacy OpenTrack datagram in bytes
pub const LEGACY_DATAGRAM_SIZE: usize = 24;

/// Encode a server message as JSON text
pub fn encode_message(msg: &ServerMessage) -> Result<String> {
    Ok(serde_json::to_string(msg)?)
}

/// Encode the data frame for a snapshot, shareable across client outboxes
pub fn encode_data_frame(snapshot: &SensorSnapshot) -> Result<Arc<str>> {
    let text = encode_message(&ServerMessage::from(snapshot))?;
    Ok(Arc::from(text))
}

/// Head orientation and position in OpenTrack's fixed layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegacyOrientationDatagram {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LegacyOrientationDatagram {
    /// Build from a snapshot; `None` when the snapshot has no head sample
    pub fn from_snapshot(snapshot: &SensorSnapshot) -> Option<Self> {
        snapshot.head().map(|h| Self {
            yaw: h.yaw,
            pitch: h.pitch,
            roll: h.roll,
            x: h.position.x,
            y: h.position.y,
            z: h.position.z,
        })
    }

    pub fn to_bytes(&self) -> [u8; LEGACY_DATAGRAM_SIZE] {
        let mut buf = [0u8; LEGACY_DATAGRAM_SIZE];
        let fields = [self.yaw, self.pitch, self.roll, self.x, self.y, self.z];
        for (chunk, value) in buf.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        buf
    }

    /// Decode a received datagram; `None` unless exactly 24 bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != LEGACY_DATAGRAM_SIZE {
            return None;
        }
        let field = |i: usize| {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            f32::from_le_bytes(raw)
        };
        Some(Self {
            yaw: field(0),
            pitch: field(1),
            roll: field(2),
            x: field(3),
            y: field(4),
            z: field(5),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::HeadPose;

    #[test]
    fn test_legacy_layout_is_little_endian() {
        let datagram = LegacyOrientationDatagram {
            yaw: 1.0,
            pitch: 2.0,
            roll: 3.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        };
        let bytes = datagram.to_bytes();

        assert_eq!(&bytes[0..4], &[0x00, 0x00, 0x80, 0x3F]);
        assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x00, 0x40]);
        assert_eq!(&bytes[8..12], &[0x00, 0x00, 0x40, 0x40]);
        assert!(bytes[12..].iter().all(|b| *b == 0));
        assert_eq!(LegacyOrientationDatagram::from_bytes(&bytes), Some(datagram));
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        assert!(LegacyOrientationDatagram::from_bytes(&[0u8; 23]).is_none());
        assert!(LegacyOrientationDatagram::from_bytes(&[0u8; 25]).is_none());
    }

    #[test]
    fn test_no_datagram_without_head() {
        let snapshot = SensorSnapshot::from_readings(5, None, None, true);
        assert!(LegacyOrientationDatagram::from_snapshot(&snapshot).is_none());

        let snapshot = SensorSnapshot::from_readings(
            5,
            None,
            Some(HeadPose {
                yaw: -4.5,
                pitch: 0.25,
                roll: 1.0,
                x: 10.0,
                y: -3.0,
                z: 600.0,
            }),
            true,
        );
        let datagram = LegacyOrientationDatagram::from_snapshot(&snapshot).unwrap();
        assert_eq!(datagram.yaw, -4.5);
        assert_eq!(datagram.z, 600.0);
    }

    #[test]
    fn test_data_frame_is_json_text() {
        let snapshot = SensorSnapshot::from_readings(42, None, None, false);
        let text = encode_data_frame(&snapshot).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "tobii-data");
        assert_eq!(value["timestamp"], 42);
        assert_eq!(value["data"]["present"], false);
        assert_eq!(value["data"]["overallQuality"], 0.0);
    }
}
