//! Per-stream frame buffering
//!
//! Frames are admitted into a per-stream buffer sized by the stream's tier
//! and flushed either when the buffer fills or when the health monitor finds
//! it stale. Only the newest fresh frame of a flush is relayed.

pub mod frame_buffer;
pub mod tier;

pub use frame_buffer::{BufferedFrame, Flush, FrameBuffer, FrameBuffers};
pub use tier::{Tier, TierTable, DEPTH_STREAM, MAIN_STREAM};
