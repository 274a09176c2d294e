//! Wire protocol
//!
//! JSON control/status messages and the optional self-describing binary
//! frame header.

pub mod framing;
pub mod message;

pub use framing::{encode_header, split_header, with_prefix, FRAME_MAGIC};
pub use message::{ControlMessage, Inbound, Role, StatusMessage, WILDCARD_STREAM};
