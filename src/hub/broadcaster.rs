//! Fan-out to subscribers
//!
//! Every recipient is served independently: a full or closed queue on one
//! connection is logged and counted, and delivery continues with the rest.

use bytes::Bytes;

use crate::protocol::StatusMessage;
use crate::registry::{ConnectionEntry, ConnectionRegistry};
use crate::session::{ConnectionId, Outbound};
use crate::stats::FanOut;

/// Send a frame to every open subscriber of `stream_id` except its origin.
///
/// Subscribers match when their stream id equals `stream_id` or is the `all`
/// wildcard.
pub fn broadcast_frame(
    registry: &ConnectionRegistry,
    stream_id: &str,
    origin: ConnectionId,
    payload: &Bytes,
) -> FanOut {
    let mut fanout = FanOut::default();

    for entry in registry.iter() {
        if entry.id() == origin || !entry.state.is_open() || !entry.subscribes_to(stream_id) {
            continue;
        }

        deliver(entry, Outbound::Binary(payload.clone()), stream_id, &mut fanout);
    }

    tracing::trace!(
        stream = stream_id,
        origin = %origin,
        delivered = fanout.delivered,
        failed = fanout.failed,
        "Frame broadcast"
    );

    fanout
}

/// Send a status message to every open connection accepted by `filter`
pub fn broadcast_status<F>(registry: &ConnectionRegistry, msg: &StatusMessage, filter: F) -> FanOut
where
    F: Fn(&ConnectionEntry) -> bool,
{
    let mut fanout = FanOut::default();

    let text = match msg.to_json() {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode status message");
            return fanout;
        }
    };

    for entry in registry.iter() {
        if entry.state.is_open() && filter(entry) {
            deliver(entry, Outbound::Text(text.clone()), "status", &mut fanout);
        }
    }

    fanout
}

fn deliver(entry: &ConnectionEntry, msg: Outbound, what: &str, fanout: &mut FanOut) {
    match entry.handle.send(msg) {
        Ok(()) => fanout.delivered += 1,
        Err(e) => {
            fanout.failed += 1;
            tracing::warn!(
                conn = %entry.id(),
                stream = what,
                error = %e,
                "Error sending to client"
            );
        }
    }
}
