//! Notifier message types.
//!
//! [`PushEvent`] is the internal worker -> notifier event; [`WsMessage`] is
//! the JSON frame actually written to clients.

use serde::Serialize;

use crate::core_types::{OwnerId, TransferId};
use crate::transfer::state::TransferStatus;

/// Event emitted by the settlement worker on each status transition.
#[derive(Debug, Clone)]
pub enum PushEvent {
    StatusUpdate {
        owner: OwnerId,
        transfer_id: TransferId,
        status: TransferStatus,
        message: Option<String>,
    },
}

/// Outbound WebSocket frame. Tagged by `type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum WsMessage {
    /// Sent once on connect.
    #[serde(rename_all = "camelCase")]
    Connected { owner: String },

    /// Reply to a client ping.
    Pong,

    /// Pushed on every transfer status transition.
    #[serde(rename_all = "camelCase")]
    TransactionStatusUpdated {
        transfer_id: String,
        status: TransferStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl WsMessage {
    pub fn status_updated(
        transfer_id: TransferId,
        status: TransferStatus,
        message: Option<String>,
    ) -> Self {
        WsMessage::TransactionStatusUpdated {
            transfer_id: transfer_id.to_string(),
            status,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_updated_frame_shape() {
        let id = TransferId::new();
        let frame = WsMessage::status_updated(id, TransferStatus::Completed, None);
        let json = serde_json::to_value(&frame).unwrap();

        assert_eq!(json["type"], "TransactionStatusUpdated");
        assert_eq!(json["transferId"], id.to_string());
        assert_eq!(json["status"], "COMPLETED");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_failed_frame_carries_reason() {
        let frame = WsMessage::status_updated(
            TransferId::new(),
            TransferStatus::Failed,
            Some("insufficient balance".into()),
        );
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["message"], "insufficient balance");
    }
}
