//! WAAPI client — WAMP caller session over WebSocket
//!
//! A background task owns the socket. Calls are queued to it over a channel, tagged
//! with a WAMP request id and answered through a oneshot once the matching RESULT or
//! ERROR frame arrives, so several calls may be in flight on one connection.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Map, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::call::{WaapiCall, WaapiSession};
use crate::error::{WaapiError, WaapiResult};
use crate::protocol::{
    local_url, ConnectionConfig, ConnectionState, WampMessage, CLOSE_NORMAL, GOODBYE_AND_OUT,
    WAMP_SUBPROTOCOL,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Response slot for one in-flight call
type PendingTx = oneshot::Sender<WaapiResult<Value>>;

/// Call queued for the session task
struct PendingCall {
    uri: String,
    args: Map<String, Value>,
    options: Value,
    response_tx: PendingTx,
}

/// Connected WAAPI client
pub struct WaapiClient {
    /// Connection configuration
    config: ConnectionConfig,

    /// WAMP session id from WELCOME
    session_id: u64,

    /// Current connection state, updated by the session task
    state: Arc<RwLock<ConnectionState>>,

    /// Queue of outgoing calls
    call_tx: mpsc::Sender<PendingCall>,

    /// Session task handle
    session_handle: JoinHandle<()>,
}

impl WaapiClient {
    /// Open the WebSocket, join the realm and start the session task
    pub async fn connect(config: ConnectionConfig) -> WaapiResult<Self> {
        url::Url::parse(&config.url).map_err(|e| {
            WaapiError::ConnectionFailed(format!("Invalid URL '{}': {}", config.url, e))
        })?;

        let mut request = config
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| WaapiError::ConnectionFailed(e.to_string()))?;
        request
            .headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(WAMP_SUBPROTOCOL));

        log::debug!("[WAAPI] Connecting to {}", config.url);
        let timeout = config.timeout();

        let (mut ws, _) = tokio::time::timeout(timeout, connect_async(request))
            .await
            .map_err(|_| WaapiError::Timeout {
                timeout_ms: config.timeout_ms,
                context: format!("connection to {}", config.url),
            })?
            .map_err(|e| WaapiError::ConnectionFailed(format!("WebSocket error: {}", e)))?;

        let state = Arc::new(RwLock::new(ConnectionState::Joining));

        let hello = WampMessage::hello(&config.realm).encode();
        ws.send(Message::Text(hello.into()))
            .await
            .map_err(|e| WaapiError::ConnectionFailed(e.to_string()))?;

        let session_id = tokio::time::timeout(timeout, Self::await_welcome(&mut ws))
            .await
            .map_err(|_| WaapiError::Timeout {
                timeout_ms: config.timeout_ms,
                context: "WELCOME".to_string(),
            })??;

        *state.write().await = ConnectionState::Connected;

        let (call_tx, call_rx) = mpsc::channel(64);
        let session_handle = tokio::spawn(session_loop(ws, call_rx, Arc::clone(&state)));

        log::info!("[WAAPI] Connected to {} (session {})", config.url, session_id);

        Ok(Self {
            config,
            session_id,
            state,
            call_tx,
            session_handle,
        })
    }

    async fn await_welcome(ws: &mut WsStream) -> WaapiResult<u64> {
        while let Some(msg) = ws.next().await {
            let msg = msg.map_err(|e| WaapiError::ConnectionFailed(e.to_string()))?;
            match msg {
                Message::Text(text) => {
                    return match WampMessage::decode(&text)? {
                        WampMessage::Welcome { session, .. } => Ok(session),
                        WampMessage::Abort { details, reason } => {
                            Err(WaapiError::Aborted(describe_abort(&reason, &details)))
                        }
                        other => Err(WaapiError::Protocol(format!(
                            "expected WELCOME, got message {}",
                            other.code()
                        ))),
                    };
                }
                Message::Close(_) => break,
                _ => {} // Ignore ping/pong/binary
            }
        }

        Err(WaapiError::ConnectionFailed(
            "connection closed before WELCOME".into(),
        ))
    }

    /// Get the current connection state
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// WAMP session id assigned by the router
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Issue one WAAPI call and wait for its keyword-argument result
    pub async fn request(&self, uri: &str, args: Value, options: Value) -> WaapiResult<Value> {
        log::debug!("[WAAPI] Calling {} args={} options={}", uri, args, options);

        let Value::Object(args) = args else {
            return Err(WaapiError::Protocol(format!(
                "arguments for '{}' must be a JSON object",
                uri
            )));
        };

        let (response_tx, response_rx) = oneshot::channel();
        self.call_tx
            .send(PendingCall {
                uri: uri.to_string(),
                args,
                options,
                response_tx,
            })
            .await
            .map_err(|_| WaapiError::NotConnected)?;

        let response = match self.config.call_timeout_ms {
            Some(timeout_ms) => tokio::time::timeout(
                Duration::from_millis(u64::from(timeout_ms)),
                response_rx,
            )
            .await
            .map_err(|_| WaapiError::CallTimeout {
                uri: uri.to_string(),
                timeout_ms,
            })?,
            None => response_rx.await,
        };

        response.map_err(|_| {
            WaapiError::ConnectionFailed(format!("connection closed before '{}' returned", uri))
        })?
    }

    /// Send GOODBYE, close the socket and wait for the session task to finish
    pub async fn close(self) -> WaapiResult<()> {
        let Self {
            config,
            call_tx,
            session_handle,
            ..
        } = self;

        // Dropping the only sender is the session task's shutdown signal
        drop(call_tx);

        tokio::time::timeout(config.timeout(), session_handle)
            .await
            .map_err(|_| WaapiError::Timeout {
                timeout_ms: config.timeout_ms,
                context: "session shutdown".to_string(),
            })?
            .map_err(|e| WaapiError::ConnectionFailed(format!("session task failed: {}", e)))?;

        log::info!("[WAAPI] Disconnected from {}", config.url);
        Ok(())
    }
}

impl WaapiCall for WaapiClient {
    async fn call(&self, uri: &str, args: Value, options: Value) -> WaapiResult<Value> {
        self.request(uri, args, options).await
    }
}

impl WaapiSession for WaapiClient {
    async fn close(self) -> WaapiResult<()> {
        WaapiClient::close(self).await
    }
}

/// What the session task should do after an inbound frame
enum Inbound {
    Continue,
    Goodbye(String),
    Abort(String),
}

async fn session_loop(
    ws: WsStream,
    mut call_rx: mpsc::Receiver<PendingCall>,
    state: Arc<RwLock<ConnectionState>>,
) {
    let (mut write, mut read) = ws.split();
    let mut pending: HashMap<u64, (String, PendingTx)> = HashMap::new();
    let mut next_request: u64 = 1;

    let final_state = loop {
        tokio::select! {
            // Outgoing calls
            call = call_rx.recv() => {
                let Some(call) = call else {
                    *state.write().await = ConnectionState::Disconnecting;
                    let goodbye = WampMessage::goodbye(CLOSE_NORMAL).encode();
                    let _ = write.send(Message::Text(goodbye.into())).await;
                    let _ = write.send(Message::Close(None)).await;
                    break ConnectionState::Disconnected;
                };

                let request = next_request;
                next_request += 1;

                let frame = WampMessage::call(request, &call.uri, call.args, call.options).encode();
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    log::error!("[WAAPI] Failed to send '{}': {}", call.uri, e);
                    let _ = call
                        .response_tx
                        .send(Err(WaapiError::ConnectionFailed(e.to_string())));
                    break ConnectionState::Error;
                }
                pending.insert(request, (call.uri, call.response_tx));
            }

            // Incoming frames
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match dispatch_frame(&text, &mut pending) {
                        Inbound::Continue => {}
                        Inbound::Goodbye(reason) => {
                            log::info!("[WAAPI] Router closed the session: {}", reason);
                            let reply = WampMessage::goodbye(GOODBYE_AND_OUT).encode();
                            let _ = write.send(Message::Text(reply.into())).await;
                            break ConnectionState::Disconnected;
                        }
                        Inbound::Abort(reason) => {
                            log::error!("[WAAPI] Session aborted: {}", reason);
                            break ConnectionState::Error;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        break ConnectionState::Disconnected;
                    }
                    Some(Err(e)) => {
                        log::error!("[WAAPI] WebSocket error: {}", e);
                        break ConnectionState::Error;
                    }
                    Some(Ok(_)) => {} // Ignore ping/pong/binary
                }
            }
        }
    };

    for (_, (uri, response_tx)) in pending.drain() {
        let _ = response_tx.send(Err(WaapiError::ConnectionFailed(format!(
            "connection closed before '{}' returned",
            uri
        ))));
    }

    *state.write().await = final_state;
}

/// Route one inbound frame to its pending call
fn dispatch_frame(text: &str, pending: &mut HashMap<u64, (String, PendingTx)>) -> Inbound {
    let msg = match WampMessage::decode(text) {
        Ok(msg) => msg,
        Err(e) => {
            log::warn!("[WAAPI] Invalid frame: {}", e);
            return Inbound::Continue;
        }
    };

    match msg {
        WampMessage::Result {
            request, kwargs, ..
        } => match pending.remove(&request) {
            Some((uri, response_tx)) => {
                if log::log_enabled!(log::Level::Trace) {
                    log::trace!("[WAAPI] {} returned {}", uri, Value::Object(kwargs.clone()));
                }
                let _ = response_tx.send(Ok(Value::Object(kwargs)));
            }
            None => log::warn!("[WAAPI] RESULT for unknown request {}", request),
        },
        WampMessage::Error {
            request,
            error,
            kwargs,
            ..
        } => match pending.remove(&request) {
            Some((uri, response_tx)) => {
                let message = kwargs
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let _ = response_tx.send(Err(WaapiError::RequestFailed {
                    uri,
                    error,
                    message,
                }));
            }
            None => log::warn!("[WAAPI] ERROR for unknown request {}: {}", request, error),
        },
        WampMessage::Goodbye { reason, .. } => return Inbound::Goodbye(reason),
        WampMessage::Abort { details, reason } => {
            return Inbound::Abort(describe_abort(&reason, &details));
        }
        other => log::warn!("[WAAPI] Ignoring unexpected message {}", other.code()),
    }

    Inbound::Continue
}

fn describe_abort(reason: &str, details: &Value) -> String {
    match details.get("message").and_then(Value::as_str) {
        Some(message) => format!("{} ({})", reason, message),
        None => reason.to_string(),
    }
}

/// Client builder
pub struct WaapiClientBuilder {
    config: ConnectionConfig,
}

impl WaapiClientBuilder {
    /// WAAPI on this machine at the given port
    pub fn local(port: u16) -> Self {
        Self::url(&local_url(port))
    }

    /// WAAPI at an explicit WebSocket URL
    pub fn url(url: &str) -> Self {
        Self {
            config: ConnectionConfig {
                url: url.to_string(),
                ..ConnectionConfig::default()
            },
        }
    }

    /// Set the realm
    pub fn realm(mut self, realm: &str) -> Self {
        self.config.realm = realm.to_string();
        self
    }

    /// Set the connect, join and shutdown timeout
    pub fn timeout(mut self, timeout_ms: u32) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    /// Give up on any single call after `timeout_ms`
    pub fn call_timeout(mut self, timeout_ms: u32) -> Self {
        self.config.call_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Connect and join
    pub async fn connect(self) -> WaapiResult<WaapiClient> {
        WaapiClient::connect(self.config).await
    }
}
