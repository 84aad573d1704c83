use thiserror::Error;

use crate::media::MediaError;
use crate::transport::TransportError;

/// Crate-wide error taxonomy.
///
/// Every expected failure is returned as a value; none of these are
/// raised by panicking. `UnknownRole` can only surface at the string
/// boundary (config, wire); inside the crate the role enum is total.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid join parameter: {0}")]
    InvalidParam(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("join rejected: {0}")]
    JoinRejected(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("join cancelled")]
    Cancelled,
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("media error: {0}")]
    Media(#[from] MediaError),
}
