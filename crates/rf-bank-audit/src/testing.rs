//! Scripted WAAPI stand-in for unit tests

use std::collections::HashMap;
use std::sync::Mutex;

use rf_waapi::{WaapiCall, WaapiError, WaapiResult};
use serde_json::Value;

type Responder = Box<dyn Fn(&str, &Value, &Value) -> WaapiResult<Value> + Send + Sync>;

/// Answers calls by URI (or through a responder closure) and records every call
#[derive(Default)]
pub struct ScriptedWaapi {
    replies: HashMap<String, Value>,
    failures: Mutex<HashMap<String, WaapiError>>,
    responder: Option<Responder>,
    calls: Mutex<Vec<(String, Value, Value)>>,
}

impl ScriptedWaapi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call to `uri` with `result`
    pub fn reply(mut self, uri: &str, result: Value) -> Self {
        self.replies.insert(uri.to_string(), result);
        self
    }

    /// Fail the next call to `uri`
    pub fn fail(self, uri: &str, err: WaapiError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(uri.to_string(), err);
        self
    }

    /// Compute answers from the call itself
    pub fn respond_with<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str, &Value, &Value) -> WaapiResult<Value> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// `(uri, args, options)` of every call so far
    pub fn calls(&self) -> Vec<(String, Value, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, uri: &str, args: &Value, options: &Value) -> WaapiResult<Value> {
        if let Some(err) = self.failures.lock().unwrap().remove(uri) {
            return Err(err);
        }
        if let Some(reply) = self.replies.get(uri) {
            return Ok(reply.clone());
        }
        match &self.responder {
            Some(responder) => responder(uri, args, options),
            None => Err(WaapiError::RequestFailed {
                uri: uri.to_string(),
                error: "wamp.error.no_such_procedure".to_string(),
                message: None,
            }),
        }
    }
}

impl WaapiCall for ScriptedWaapi {
    async fn call(&self, uri: &str, args: Value, options: Value) -> WaapiResult<Value> {
        let result = self.answer(uri, &args, &options);
        self.calls
            .lock()
            .unwrap()
            .push((uri.to_string(), args, options));
        result
    }
}
