// Transport seam to the remote host

mod replay;
mod stub;

#[cfg(test)]
mod tests;

pub use replay::ReplayTransport;
pub use stub::StubTransport;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;
use tracing::debug;

/// Method invocation on the remote host.
///
/// Implementations own the connection, authentication and wire format.
/// The state layer only ever calls `invoke` and never retries on failure.
///
/// # Example
/// ```no_run
/// use async_trait::async_trait;
/// use nas_state::transport::{Transport, TransportError};
/// use serde_json::Value;
///
/// struct Offline;
///
/// #[async_trait]
/// impl Transport for Offline {
///     async fn invoke(&self, method: &str, _args: Vec<Value>) -> Result<Value, TransportError> {
///         Err(TransportError::Connection(format!("cannot call {}: offline", method)))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `method` with positional `args` and return the raw result.
    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError>;
}

/// Failure of a remote call
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Connection could not be used (closed, refused, auth rejected)
    Connection(String),
    /// Remote host answered with an error
    Remote { code: Option<i64>, message: String },
    /// Call did not complete within the configured bound
    Timeout,
    /// Response did not have the expected shape
    Malformed(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Connection(msg) => write!(f, "connection error: {}", msg),
            TransportError::Remote {
                code: Some(code),
                message,
            } => write!(f, "remote error {}: {}", code, message),
            TransportError::Remote {
                code: None,
                message,
            } => write!(f, "remote error: {}", message),
            TransportError::Timeout => write!(f, "remote call timed out"),
            TransportError::Malformed(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Arguments for a fetch-all query: no filters, explicit field selection.
pub fn query_args(fields: &[&str]) -> Vec<Value> {
    vec![json!([]), json!({ "select": fields })]
}

/// Issue `method` as a fetch-all query and decode every returned record.
///
/// Records are validated on the way in; a record that lacks a required
/// field (such as its key) fails the whole call with `Malformed`.
pub async fn query<T: DeserializeOwned>(
    transport: &dyn Transport,
    method: &str,
    fields: &[&str],
) -> Result<Vec<T>, TransportError> {
    debug!(method = %method, fields = fields.len(), "Issuing query");

    let result = transport.invoke(method, query_args(fields)).await?;
    serde_json::from_value(result)
        .map_err(|e| TransportError::Malformed(format!("{} result: {}", method, e)))
}
