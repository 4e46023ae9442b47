//! Inbound control command processing
//!
//! Runs synchronously on the session thread of the client that sent the
//! command. The reply (if any) goes back to that client only.

use crate::state::ControlState;
use crate::streaming::messages::{
    CalibrationPhase, CalibrationReply, CalibrationResult, ClientCommand, ServerMessage,
    StatusReply,
};
use crate::streaming::wire::encode_message;
use std::sync::Arc;

pub struct CommandHandler {
    control: Arc<ControlState>,
}

impl CommandHandler {
    pub fn new(control: Arc<ControlState>) -> Self {
        Self { control }
    }

    /// Handle one text payload and return the encoded reply, if any.
    ///
    /// Malformed payloads are logged and dropped.
    pub fn handle_text(&self, client: &str, text: &str) -> Option<String> {
        let command = match ClientCommand::parse(text) {
            Ok(command) => command,
            Err(e) => {
                log::warn!("Dropping message from {}: {}", client, e);
                return None;
            }
        };

        log::debug!("Command from {}: {:?}", client, command);
        let reply = self.handle(command)?;

        match encode_message(&reply) {
            Ok(text) => Some(text),
            Err(e) => {
                log::error!("Failed to encode reply for {}: {}", client, e);
                None
            }
        }
    }

    /// Apply a command to the shared control state and build the reply
    pub fn handle(&self, command: ClientCommand) -> Option<ServerMessage> {
        match command {
            ClientCommand::StartCalibration => {
                self.control.set_calibrating(true);
                Some(calibration(
                    CalibrationPhase::Started,
                    Some(CalibrationResult::Success),
                ))
            }
            ClientCommand::StopCalibration => {
                self.control.set_calibrating(false);
                Some(calibration(CalibrationPhase::Stopped, None))
            }
            ClientCommand::SetRecording { enabled } => {
                self.control.set_recording(enabled);
                log::info!("Recording {}", if enabled { "enabled" } else { "disabled" });
                Some(ServerMessage::Status {
                    status: StatusReply::Recording {
                        recording: self.control.is_recording(),
                    },
                })
            }
            ClientCommand::GetStatus => Some(ServerMessage::Status {
                status: StatusReply::Full(self.control.status()),
            }),
            ClientCommand::Unknown(kind) => {
                log::debug!("Ignoring unknown command type {:?}", kind);
                None
            }
        }
    }
}

fn calibration(status: CalibrationPhase, result: Option<CalibrationResult>) -> ServerMessage {
    ServerMessage::Calibration {
        calibration: CalibrationReply { status, result },
    }
}
