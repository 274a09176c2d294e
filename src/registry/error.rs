//! Registry error types

use thiserror::Error;

use crate::session::ConnectionId;

/// Error type for registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Connection is not (or no longer) tracked
    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),
}
