use super::{Transport, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

type Handler = Box<dyn Fn(&[Value]) -> Result<Value, TransportError> + Send + Sync>;

/// In-memory stand-in for the remote host.
///
/// Each method is answered by a registered handler. Failures and delays can
/// be injected to exercise timeout and error paths, and every call is
/// recorded for later inspection.
#[derive(Default)]
pub struct StubTransport {
    handlers: Mutex<HashMap<String, Handler>>,
    failure: Mutex<Option<TransportError>>,
    delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for `method`.
    pub fn register<F>(&self, method: &str, handler: F)
    where
        F: Fn(&[Value]) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method.to_string(), Box::new(handler));
    }

    /// Answer `method` with a fixed value.
    pub fn respond(&self, method: &str, value: Value) {
        self.register(method, move |_| Ok(value.clone()));
    }

    /// Fail every call with `error` until cleared.
    pub fn fail_with(&self, error: TransportError) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    pub fn clear_failure(&self) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Hold every call for `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((method.to_string(), args.clone()));

        let delay = *self.delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(error) = failure {
            return Err(error);
        }

        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        match handlers.get(method) {
            Some(handler) => handler(args.as_slice()),
            None => Err(TransportError::Remote {
                code: None,
                message: format!("method not found: {}", method),
            }),
        }
    }
}
