//! Real-Time Notifier - per-owner publish/subscribe over WebSocket.
//!
//! Status transitions are pushed to every active connection in the owner's
//! group. Delivery is best-effort and at-most-once per subscriber; there is
//! no persistence or replay, so a disconnected client polls the
//! Status/History Store instead.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod service;

pub use connection::ConnectionManager;
pub use handler::ws_handler;
pub use messages::{PushEvent, WsMessage};
pub use service::NotifierService;
