//! Control and status messages
//!
//! Every inbound payload is decoded exactly once into [`Inbound`]. Text or
//! binary payloads that parse as a known control message become
//! [`Inbound::Control`]; everything else is opaque frame data.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Subscriber stream id that matches every stream
pub const WILDCARD_STREAM: &str = "all";

/// Declared role of a registered connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Publishes frames under one stream id
    Streamer,
    /// Receives frames for one stream id (or `all`)
    Viewer,
    /// Receives frames and the `active-streams` directory
    MultiViewer,
}

impl Role {
    /// Whether this role receives relayed frames
    pub fn is_subscriber(&self) -> bool {
        matches!(self, Role::Viewer | Role::MultiViewer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Streamer => "streamer",
            Role::Viewer => "viewer",
            Role::MultiViewer => "multi-viewer",
        };
        f.write_str(name)
    }
}

/// Client-to-server control message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    /// Declare (or re-declare) role and target stream
    Register {
        role: Role,
        #[serde(rename = "streamId")]
        stream_id: String,
    },
    /// Tag the next data payload from this connection with a stream id
    Frame {
        #[serde(rename = "streamId")]
        stream_id: String,
    },
}

impl ControlMessage {
    /// Build a `register` message
    pub fn register(role: Role, stream_id: impl Into<String>) -> Self {
        ControlMessage::Register {
            role,
            stream_id: stream_id.into(),
        }
    }

    /// Build a `frame` priming message
    pub fn frame(stream_id: impl Into<String>) -> Self {
        ControlMessage::Frame {
            stream_id: stream_id.into(),
        }
    }

    /// Encode as JSON text
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Server-to-client status message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StatusMessage {
    /// Currently published stream ids
    #[serde(rename = "active-streams")]
    ActiveStreams { streams: Vec<String> },

    /// Subscriber count for one stream
    #[serde(rename = "streamStatus")]
    StreamStatus {
        #[serde(rename = "streamId")]
        stream_id: String,
        #[serde(rename = "activeViewers")]
        active_viewers: usize,
        /// Unix time in milliseconds
        timestamp: i64,
    },
}

impl StatusMessage {
    /// Encode as JSON text
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A decoded inbound payload
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Recognized control message
    Control(ControlMessage),
    /// Opaque frame bytes
    Data(Bytes),
}

impl Inbound {
    /// Classify a raw payload.
    ///
    /// Binary payloads are classified the same way as text, so a binary frame
    /// that happens to be a valid control message is treated as control.
    pub fn decode(payload: Bytes) -> Self {
        match serde_json::from_slice::<ControlMessage>(&payload) {
            Ok(msg) => Inbound::Control(msg),
            Err(_) => Inbound::Data(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_register() {
        let raw = Bytes::from_static(br#"{"type":"register","role":"multi-viewer","streamId":"all"}"#);

        assert_eq!(
            Inbound::decode(raw),
            Inbound::Control(ControlMessage::register(Role::MultiViewer, "all"))
        );
    }

    #[test]
    fn test_decode_frame_priming() {
        let raw = Bytes::from_static(br#"{"type":"frame","streamId":"cam1","extra":1}"#);

        assert_eq!(
            Inbound::decode(raw),
            Inbound::Control(ControlMessage::frame("cam1"))
        );
    }

    #[test]
    fn test_unknown_type_is_data() {
        let raw = Bytes::from_static(br#"{"type":"ping"}"#);

        assert_eq!(Inbound::decode(raw.clone()), Inbound::Data(raw));
    }

    #[test]
    fn test_unknown_role_is_data() {
        let raw = Bytes::from_static(br#"{"type":"register","role":"admin","streamId":"x"}"#);

        assert!(matches!(Inbound::decode(raw), Inbound::Data(_)));
    }

    #[test]
    fn test_binary_is_data() {
        let raw = Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);

        assert_eq!(Inbound::decode(raw.clone()), Inbound::Data(raw));
    }

    #[test]
    fn test_active_streams_shape() {
        let msg = StatusMessage::ActiveStreams {
            streams: vec!["cam1".into(), "main".into()],
        };

        assert_eq!(
            msg.to_json().unwrap(),
            r#"{"type":"active-streams","streams":["cam1","main"]}"#
        );
    }

    #[test]
    fn test_stream_status_shape() {
        let msg = StatusMessage::StreamStatus {
            stream_id: "main".into(),
            active_viewers: 3,
            timestamp: 1_700_000_000_000,
        };

        assert_eq!(
            msg.to_json().unwrap(),
            r#"{"type":"streamStatus","streamId":"main","activeViewers":3,"timestamp":1700000000000}"#
        );
    }

    #[test]
    fn test_control_roundtrip_json() {
        let json = ControlMessage::register(Role::Streamer, "depth").to_json().unwrap();

        assert_eq!(json, r#"{"type":"register","role":"streamer","streamId":"depth"}"#);
    }

    #[test]
    fn test_role_subscriber() {
        assert!(!Role::Streamer.is_subscriber());
        assert!(Role::Viewer.is_subscriber());
        assert!(Role::MultiViewer.is_subscriber());
        assert_eq!(Role::MultiViewer.to_string(), "multi-viewer");
    }
}
