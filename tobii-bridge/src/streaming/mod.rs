//! Distribution transports: WebSocket fan-out, legacy UDP, and LAN discovery

pub mod broadcaster;
pub mod commands;
pub mod discovery;
pub mod messages;
pub mod registry;
pub mod udp_publisher;
pub mod wire;
pub mod ws_server;

pub use broadcaster::MessageBroadcaster;
pub use commands::CommandHandler;
pub use discovery::{AdvertisedPorts, DiscoveryBeacon};
pub use messages::{Announcement, ClientCommand, ServerMessage};
pub use registry::{ClientRegistry, ConnectionId};
pub use udp_publisher::DatagramBroadcaster;
pub use wire::LegacyOrientationDatagram;
pub use ws_server::WebSocketServer;
