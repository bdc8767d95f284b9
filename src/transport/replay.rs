use super::{Transport, TransportError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::debug;

/// Transport that answers calls from a JSON file.
///
/// The file maps method names to results:
///
/// ```json
/// { "system.info": { "hostname": "nas" }, "pool.query": [] }
/// ```
///
/// The file is re-read on every call, so editing it between refreshes
/// changes what the next refresh observes. Arguments are ignored.
pub struct ReplayTransport {
    path: PathBuf,
}

impl ReplayTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<Map<String, Value>, TransportError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            TransportError::Connection(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        match serde_json::from_str(&contents) {
            Ok(Value::Object(methods)) => Ok(methods),
            Ok(_) => Err(TransportError::Malformed(format!(
                "{} must contain a JSON object keyed by method",
                self.path.display()
            ))),
            Err(e) => Err(TransportError::Malformed(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        debug!(method = %method, args = args.len(), path = %self.path.display(), "Replaying call");

        let mut methods = self.load().await?;
        methods
            .remove(method)
            .ok_or_else(|| TransportError::Remote {
                code: None,
                message: format!("method not found: {}", method),
            })
    }
}
