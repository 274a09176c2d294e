//! Connection registry and stream directory
//!
//! The registry tracks every live connection with its declared role and
//! target stream; the directory tracks which stream ids are published and by
//! whom. Both are plain data owned by the hub task.
//!
//! # Architecture
//!
//! ```text
//!                              RelayHub
//!                   ┌─────────────────────────────┐
//!                   │ connections: ConnectionId → │
//!                   │   ConnectionEntry {         │
//!                   │     handle, state, info,    │
//!                   │     primed_stream,          │
//!                   │   }                         │
//!                   │ directory: StreamId → owner │
//!                   └──────────────┬──────────────┘
//!                                  │
//!        ┌─────────────────────────┼─────────────────────────┐
//!        ▼                         ▼                         ▼
//!   [Streamer]                 [Viewer]               [Multi-viewer]
//!   register(streamer)         register(viewer)       register(multi-viewer)
//!        │                         ▲                         ▲
//!        └──► admit/flush ──► broadcast ──────────────────────┘
//! ```

pub mod directory;
pub mod entry;
pub mod error;
pub mod store;

pub use directory::StreamDirectory;
pub use entry::ConnectionEntry;
pub use error::RegistryError;
pub use store::ConnectionRegistry;
