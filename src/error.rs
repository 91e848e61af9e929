//! Error types for the takeover engine

use thiserror::Error;

use crate::dom::NodeId;

/// Result type alias for takeover operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving surfaces.
///
/// None of these ever reach the host page: the event entry points on
/// [`crate::Takeover`] log them and degrade to doing nothing further.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Failed to build the page model
    #[error("Failed to parse page: {0}")]
    ParseError(String),

    /// A node handle does not refer to anything in the document
    #[error("Node {0:?} not found")]
    NodeNotFound(NodeId),

    /// The node exists but is not a media element
    #[error("Node {0:?} is not a media element")]
    NotMedia(NodeId),

    /// A platform capability refused the request
    #[error("Platform error: {0}")]
    Platform(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
