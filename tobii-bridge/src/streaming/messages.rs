//! Message types for the WebSocket and discovery transports.
//!
//! All payloads are JSON, one object per message, discriminated by `type`:
//! - Data frames (outbound): the latest [`SensorSnapshot`]
//! - Replies (outbound): calibration and status responses
//! - Commands (inbound): calibration, recording, and status requests
//! - Announcements (broadcast): service discovery beacon

use crate::core::types::SensorSnapshot;
use crate::error::{Error, Result};
use crate::state::StatusReport;
use serde::{Deserialize, Serialize};

/// Service name advertised by the discovery beacon
pub const SERVICE_NAME: &str = "tobii-bridge";

/// Capabilities advertised by the discovery beacon
pub const CAPABILITIES: [&str; 3] = ["gaze-tracking", "head-tracking", "presence-detection"];

/// Every message the bridge sends over WebSocket
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Per-cycle data frame
    #[serde(rename = "tobii-data")]
    Data { timestamp: u64, data: FrameData },

    /// Reply to `start-calibration` / `stop-calibration`
    #[serde(rename = "tobii-calibration")]
    Calibration { calibration: CalibrationReply },

    /// Reply to `set-recording` / `get-status`
    #[serde(rename = "tobii-status")]
    Status { status: StatusReply },
}

impl From<&SensorSnapshot> for ServerMessage {
    fn from(snapshot: &SensorSnapshot) -> Self {
        ServerMessage::Data {
            timestamp: snapshot.timestamp(),
            data: FrameData::from(snapshot),
        }
    }
}

/// Body of a `tobii-data` frame
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameData {
    pub has_gaze: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaze: Option<GazeFrame>,
    pub has_head: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<HeadFrame>,
    pub present: bool,
    pub overall_quality: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GazeFrame {
    pub x: f32,
    pub y: f32,
    pub timestamp: u64,
    pub confidence: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct HeadFrame {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub position: PositionFrame,
    pub confidence: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PositionFrame {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<&SensorSnapshot> for FrameData {
    fn from(snapshot: &SensorSnapshot) -> Self {
        let gaze = snapshot.gaze().map(|g| GazeFrame {
            x: g.x,
            y: g.y,
            timestamp: g.timestamp,
            confidence: g.confidence,
        });
        let head = snapshot.head().map(|h| HeadFrame {
            yaw: h.yaw,
            pitch: h.pitch,
            roll: h.roll,
            position: PositionFrame {
                x: h.position.x,
                y: h.position.y,
                z: h.position.z,
            },
            confidence: h.confidence,
        });

        Self {
            has_gaze: gaze.is_some(),
            gaze,
            has_head: head.is_some(),
            head,
            present: snapshot.present(),
            overall_quality: snapshot.overall_quality(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationPhase {
    Started,
    Stopped,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationResult {
    Success,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationReply {
    pub status: CalibrationPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CalibrationResult>,
}

/// Status reply body: full report for `get-status`, recording-only for `set-recording`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum StatusReply {
    Full(StatusReport),
    Recording { recording: bool },
}

/// Control commands received from WebSocket clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    StartCalibration,
    StopCalibration,
    SetRecording { enabled: bool },
    GetStatus,
    /// Any other `type`, ignored without reply
    Unknown(String),
}

#[derive(Deserialize)]
struct RawCommand {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl ClientCommand {
    /// Parse an inbound text payload.
    ///
    /// Only a payload that is not a JSON object (or whose `type` is not a
    /// string) is an error. A missing or malformed `data.enabled` reads as
    /// `false`.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawCommand =
            serde_json::from_str(text).map_err(|e| Error::MalformedCommand(e.to_string()))?;

        Ok(match raw.kind.as_str() {
            "start-calibration" => ClientCommand::StartCalibration,
            "stop-calibration" => ClientCommand::StopCalibration,
            "set-recording" => ClientCommand::SetRecording {
                enabled: raw
                    .data
                    .get("enabled")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false),
            },
            "get-status" => ClientCommand::GetStatus,
            _ => ClientCommand::Unknown(raw.kind),
        })
    }
}

/// Discovery beacon payload
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Announcement {
    #[serde(rename = "type")]
    pub kind: String,
    pub service: String,
    pub version: String,
    pub websocket_port: u16,
    pub udp_port: u16,
    pub config_port: u16,
    pub capabilities: Vec<String>,
    pub timestamp: u64,
}

impl Announcement {
    pub const TYPE: &'static str = "tobii-bridge-announcement";

    pub fn new(websocket_port: u16, udp_port: u16, config_port: u16, timestamp: u64) -> Self {
        Self {
            kind: Self::TYPE.to_string(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            websocket_port,
            udp_port,
            config_port,
            capabilities: CAPABILITIES.iter().map(|c| c.to_string()).collect(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{GazePoint, HeadPose};
    use serde_json::{Value, json};

    fn full_snapshot() -> SensorSnapshot {
        SensorSnapshot::from_readings(
            1234,
            Some(GazePoint {
                x: 0.5,
                y: 0.5,
                timestamp: 1000,
            }),
            Some(HeadPose {
                yaw: 1.0,
                pitch: 2.0,
                roll: 3.0,
                x: 0.0,
                y: 0.0,
                z: 0.0,
            }),
            true,
        )
    }

    #[test]
    fn test_data_frame_shape() {
        let msg = ServerMessage::from(&full_snapshot());
        let v: Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(v["type"], "tobii-data");
        assert_eq!(v["timestamp"], 1234);
        assert_eq!(v["data"]["hasGaze"], true);
        assert_eq!(v["data"]["gaze"]["timestamp"], 1000);
        assert_eq!(v["data"]["hasHead"], true);
        assert_eq!(v["data"]["head"]["yaw"], 1.0);
        assert_eq!(v["data"]["head"]["position"]["z"], 0.0);
        assert_eq!(v["data"]["present"], true);
        assert!(v["data"]["overallQuality"].is_number());
    }

    #[test]
    fn test_data_frame_without_head() {
        let snapshot = SensorSnapshot::from_readings(1, None, None, true);
        let v: Value = serde_json::to_value(ServerMessage::from(&snapshot)).unwrap();

        assert_eq!(v["data"]["hasHead"], false);
        assert!(v["data"].get("head").is_none());
        assert_eq!(v["data"]["hasGaze"], false);
        assert!(v["data"].get("gaze").is_none());
    }

    #[test]
    fn test_calibration_reply_shape() {
        let started = ServerMessage::Calibration {
            calibration: CalibrationReply {
                status: CalibrationPhase::Started,
                result: Some(CalibrationResult::Success),
            },
        };
        assert_eq!(
            serde_json::to_value(&started).unwrap(),
            json!({"type": "tobii-calibration", "calibration": {"status": "started", "result": "success"}})
        );

        let stopped = ServerMessage::Calibration {
            calibration: CalibrationReply {
                status: CalibrationPhase::Stopped,
                result: None,
            },
        };
        assert_eq!(
            serde_json::to_value(&stopped).unwrap(),
            json!({"type": "tobii-calibration", "calibration": {"status": "stopped"}})
        );
    }

    #[test]
    fn test_status_reply_shapes() {
        let recording = ServerMessage::Status {
            status: StatusReply::Recording { recording: true },
        };
        assert_eq!(
            serde_json::to_value(&recording).unwrap(),
            json!({"type": "tobii-status", "status": {"recording": true}})
        );

        let full = ServerMessage::Status {
            status: StatusReply::Full(StatusReport {
                connected: true,
                recording: false,
                clients: 2,
                packets_processed: 10,
                packets_distributed: 9,
            }),
        };
        assert_eq!(
            serde_json::to_value(&full).unwrap(),
            json!({"type": "tobii-status", "status": {
                "connected": true,
                "recording": false,
                "clients": 2,
                "packets_processed": 10,
                "packets_distributed": 9
            }})
        );

        let back: ServerMessage =
            serde_json::from_value(serde_json::to_value(&full).unwrap()).unwrap();
        assert_eq!(back, full);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            ClientCommand::parse(r#"{"type":"start-calibration"}"#).unwrap(),
            ClientCommand::StartCalibration
        );
        assert_eq!(
            ClientCommand::parse(r#"{"type":"stop-calibration"}"#).unwrap(),
            ClientCommand::StopCalibration
        );
        assert_eq!(
            ClientCommand::parse(r#"{"type":"get-status"}"#).unwrap(),
            ClientCommand::GetStatus
        );
        assert_eq!(
            ClientCommand::parse(r#"{"type":"set-recording","data":{"enabled":true}}"#).unwrap(),
            ClientCommand::SetRecording { enabled: true }
        );
        assert_eq!(
            ClientCommand::parse(r#"{"type":"reboot"}"#).unwrap(),
            ClientCommand::Unknown("reboot".to_string())
        );
        assert_eq!(
            ClientCommand::parse(r#"{}"#).unwrap(),
            ClientCommand::Unknown(String::new())
        );
    }

    #[test]
    fn test_set_recording_defaults_to_false() {
        for payload in [
            r#"{"type":"set-recording"}"#,
            r#"{"type":"set-recording","data":{}}"#,
            r#"{"type":"set-recording","data":{"enabled":"yes"}}"#,
            r#"{"type":"set-recording","data":7}"#,
            r#"{"type":"set-recording","data":null}"#,
        ] {
            assert_eq!(
                ClientCommand::parse(payload).unwrap(),
                ClientCommand::SetRecording { enabled: false },
                "payload: {}",
                payload
            );
        }
    }

    #[test]
    fn test_malformed_commands() {
        for payload in ["", "not json", "[1,2]", r#"{"type":5}"#, "\"get-status\""] {
            assert!(
                matches!(
                    ClientCommand::parse(payload),
                    Err(Error::MalformedCommand(_))
                ),
                "payload: {}",
                payload
            );
        }
    }

    #[test]
    fn test_announcement_shape() {
        let a = Announcement::new(8080, 4242, 8081, 99);
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["type"], "tobii-bridge-announcement");
        assert_eq!(v["service"], "tobii-bridge");
        assert_eq!(v["websocket_port"], 8080);
        assert_eq!(v["udp_port"], 4242);
        assert_eq!(v["config_port"], 8081);
        assert_eq!(
            v["capabilities"],
            json!(["gaze-tracking", "head-tracking", "presence-detection"])
        );
        assert_eq!(v["timestamp"], 99);
        assert!(v["version"].is_string());
    }
}
