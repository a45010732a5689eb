use crate::model::LayerId;

/// Error type for geo-data operations.
///
/// Errors are never retried internally; propagation is by returning a failed
/// result to the caller, who decides user-facing behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoError {
    /// Network or transport failure talking to the remote source.
    RemoteUnavailable(String),
    /// The remote source answered with a status the caller cannot use.
    UnexpectedStatus { status: u16 },
    /// A response body could not be decoded.
    Decode(String),
    /// The cache store collaborator failed.
    Storage(String),
    /// A configured layer resolved to no info or contents. This is a
    /// configuration error, not a transient fault.
    MissingLayer { layer: LayerId },
}

impl std::fmt::Display for GeoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoError::RemoteUnavailable(msg) => write!(f, "remote source unavailable: {msg}"),
            GeoError::UnexpectedStatus { status } => {
                write!(f, "unexpected status {status} from remote source")
            }
            GeoError::Decode(msg) => write!(f, "cannot decode response: {msg}"),
            GeoError::Storage(msg) => write!(f, "cache store error: {msg}"),
            GeoError::MissingLayer { layer } => {
                write!(f, "layer '{layer}' has no info or contents on the remote source")
            }
        }
    }
}

impl std::error::Error for GeoError {}
