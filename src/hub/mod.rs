//! Relay hub: dispatch, buffering, fan-out and health monitoring
//!
//! ```text
//!   connection tasks
//!         │ HubEvent
//!         ▼
//!   ┌─────────────────────── RelayHub (single task) ───────────────────────┐
//!   │ dispatch ──► control ──► ConnectionRegistry / StreamDirectory        │
//!   │    │                          │ active-streams                       │
//!   │    └──────► data ──► FrameBuffers ──► flush ──► broadcaster ──┐      │
//!   │ interval ──► monitor sweep ──► forced flush / prune / status  │      │
//!   └───────────────────────────────────────────────────────────────┼──────┘
//!                                                                   ▼
//!                                                       outbound queues
//! ```

pub mod broadcaster;
pub mod config;
pub mod event;
pub mod monitor;
pub mod relay;

pub use config::{HubConfig, MIN_MONITOR_INTERVAL};
pub use event::HubEvent;
pub use relay::RelayHub;
