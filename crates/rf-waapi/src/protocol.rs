//! WAMP v2 message definitions for WAAPI communication
//!
//! WAAPI speaks the JSON flavour of WAMP: every frame is a JSON array whose first
//! element is the message code. Only the messages a caller session needs are
//! modelled here: HELLO and CALL are encoded, everything the router sends back
//! is decoded.

use std::time::Duration;

use serde_json::{json, Map, Value};

use crate::error::{WaapiError, WaapiResult};

/// WebSocket subprotocol negotiated with the WAAPI router
pub const WAMP_SUBPROTOCOL: &str = "wamp.2.json";

/// Realm WAAPI serves
pub const DEFAULT_REALM: &str = "realm1";

/// Default WAAPI port configured in Wwise user preferences
pub const DEFAULT_PORT: u16 = 8080;

/// Reason sent with GOODBYE on a client-initiated close
pub const CLOSE_NORMAL: &str = "wamp.close.normal";

/// Reason sent back when acknowledging a router GOODBYE
pub const GOODBYE_AND_OUT: &str = "wamp.close.goodbye_and_out";

/// Build the local WAAPI endpoint for a port
pub fn local_url(port: u16) -> String {
    format!("ws://127.0.0.1:{}/waapi", port)
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    /// WebSocket URL (ws://host:port/waapi)
    pub url: String,

    /// WAMP realm to join
    pub realm: String,

    /// Timeout for connecting, joining and session shutdown, in milliseconds
    pub timeout_ms: u32,

    /// Deadline for a single call; `None` waits for the reply as long as the socket lives
    pub call_timeout_ms: Option<u32>,
}

impl ConnectionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: local_url(DEFAULT_PORT),
            realm: DEFAULT_REALM.to_string(),
            timeout_ms: 5000,
            call_timeout_ms: None,
        }
    }
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// WebSocket open, waiting for WELCOME
    Joining,
    /// Session established and ready for calls
    Connected,
    /// GOODBYE sent, closing
    Disconnecting,
    /// Connection lost on error
    Error,
}

/// WAMP message codes used by a caller
pub mod code {
    pub const HELLO: u64 = 1;
    pub const WELCOME: u64 = 2;
    pub const ABORT: u64 = 3;
    pub const GOODBYE: u64 = 6;
    pub const ERROR: u64 = 8;
    pub const CALL: u64 = 48;
    pub const RESULT: u64 = 50;
}

/// A decoded WAMP frame
#[derive(Debug, Clone, PartialEq)]
pub enum WampMessage {
    /// `[HELLO, Realm, Details]`
    Hello { realm: String, details: Value },

    /// `[WELCOME, Session, Details]`
    Welcome { session: u64, details: Value },

    /// `[ABORT, Details, Reason]`
    Abort { details: Value, reason: String },

    /// `[GOODBYE, Details, Reason]`
    Goodbye { details: Value, reason: String },

    /// `[ERROR, REQUEST.Type, REQUEST.Request, Details, Error, Arguments?, ArgumentsKw?]`
    Error {
        request_type: u64,
        request: u64,
        details: Value,
        error: String,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    },

    /// `[CALL, Request, Options, Procedure, Arguments?, ArgumentsKw?]`
    Call {
        request: u64,
        options: Value,
        procedure: String,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    },

    /// `[RESULT, CALL.Request, Details, Arguments?, ArgumentsKw?]`
    Result {
        request: u64,
        details: Value,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    },
}

impl WampMessage {
    /// HELLO announcing the caller role
    pub fn hello(realm: &str) -> Self {
        Self::Hello {
            realm: realm.to_string(),
            details: json!({ "roles": { "caller": { "features": {} } } }),
        }
    }

    /// CALL carrying WAAPI arguments as keyword arguments and WAAPI options as call options
    pub fn call(request: u64, procedure: &str, args: Map<String, Value>, options: Value) -> Self {
        Self::Call {
            request,
            options,
            procedure: procedure.to_string(),
            args: Vec::new(),
            kwargs: args,
        }
    }

    /// GOODBYE with a reason URI
    pub fn goodbye(reason: &str) -> Self {
        Self::Goodbye {
            details: json!({}),
            reason: reason.to_string(),
        }
    }

    /// Message code of this frame
    pub fn code(&self) -> u64 {
        match self {
            Self::Hello { .. } => code::HELLO,
            Self::Welcome { .. } => code::WELCOME,
            Self::Abort { .. } => code::ABORT,
            Self::Goodbye { .. } => code::GOODBYE,
            Self::Error { .. } => code::ERROR,
            Self::Call { .. } => code::CALL,
            Self::Result { .. } => code::RESULT,
        }
    }

    /// Encode into the JSON array wire form
    pub fn to_value(&self) -> Value {
        match self {
            Self::Hello { realm, details } => json!([code::HELLO, realm, details]),
            Self::Welcome { session, details } => json!([code::WELCOME, session, details]),
            Self::Abort { details, reason } => json!([code::ABORT, details, reason]),
            Self::Goodbye { details, reason } => json!([code::GOODBYE, details, reason]),
            Self::Error {
                request_type,
                request,
                details,
                error,
                args,
                kwargs,
            } => json!([code::ERROR, request_type, request, details, error, args, kwargs]),
            Self::Call {
                request,
                options,
                procedure,
                args,
                kwargs,
            } => json!([code::CALL, request, options, procedure, args, kwargs]),
            Self::Result {
                request,
                details,
                args,
                kwargs,
            } => json!([code::RESULT, request, details, args, kwargs]),
        }
    }

    /// Encode into a text frame
    pub fn encode(&self) -> String {
        self.to_value().to_string()
    }

    /// Decode a text frame sent by the router
    pub fn decode(text: &str) -> WaapiResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Array(items) = value else {
            return Err(WaapiError::Protocol(format!("frame is not an array: {}", text)));
        };
        let frame = Frame { items: &items };

        match frame.u64_at(0, "message code")? {
            code::WELCOME => Ok(Self::Welcome {
                session: frame.u64_at(1, "session id")?,
                details: frame.value_at(2),
            }),
            code::ABORT => Ok(Self::Abort {
                details: frame.value_at(1),
                reason: frame.str_at(2, "abort reason")?,
            }),
            code::GOODBYE => Ok(Self::Goodbye {
                details: frame.value_at(1),
                reason: frame.str_at(2, "goodbye reason")?,
            }),
            code::ERROR => Ok(Self::Error {
                request_type: frame.u64_at(1, "request type")?,
                request: frame.u64_at(2, "request id")?,
                details: frame.value_at(3),
                error: frame.str_at(4, "error uri")?,
                args: frame.args_at(5)?,
                kwargs: frame.kwargs_at(6)?,
            }),
            code::RESULT => Ok(Self::Result {
                request: frame.u64_at(1, "request id")?,
                details: frame.value_at(2),
                args: frame.args_at(3)?,
                kwargs: frame.kwargs_at(4)?,
            }),
            other => Err(WaapiError::Protocol(format!("unsupported message code {}", other))),
        }
    }
}

/// Positional accessors over a frame's elements
struct Frame<'a> {
    items: &'a [Value],
}

impl Frame<'_> {
    fn u64_at(&self, index: usize, what: &str) -> WaapiResult<u64> {
        self.items
            .get(index)
            .and_then(Value::as_u64)
            .ok_or_else(|| WaapiError::Protocol(format!("missing or invalid {}", what)))
    }

    fn str_at(&self, index: usize, what: &str) -> WaapiResult<String> {
        self.items
            .get(index)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| WaapiError::Protocol(format!("missing or invalid {}", what)))
    }

    fn value_at(&self, index: usize) -> Value {
        self.items.get(index).cloned().unwrap_or_else(|| json!({}))
    }

    fn args_at(&self, index: usize) -> WaapiResult<Vec<Value>> {
        match self.items.get(index) {
            None => Ok(Vec::new()),
            Some(Value::Array(args)) => Ok(args.clone()),
            Some(_) => Err(WaapiError::Protocol("arguments must be a list".into())),
        }
    }

    fn kwargs_at(&self, index: usize) -> WaapiResult<Map<String, Value>> {
        match self.items.get(index) {
            None => Ok(Map::new()),
            Some(Value::Object(kwargs)) => Ok(kwargs.clone()),
            Some(_) => Err(WaapiError::Protocol("keyword arguments must be a dict".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_default() {
        let config = ConnectionConfig::default();
        assert_eq!(config.url, "ws://127.0.0.1:8080/waapi");
        assert_eq!(config.realm, "realm1");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.call_timeout_ms, None);
    }

    #[test]
    fn test_hello_announces_caller_role() {
        let frame = WampMessage::hello(DEFAULT_REALM).to_value();
        assert_eq!(frame[0], 1);
        assert_eq!(frame[1], "realm1");
        assert!(frame[2]["roles"]["caller"].is_object());
    }

    #[test]
    fn test_call_layout() {
        let mut args = Map::new();
        args.insert("from".into(), json!({ "ofType": ["Event"] }));
        let frame = WampMessage::call(7, "ak.wwise.core.object.get", args, json!({ "return": ["name"] }))
            .to_value();

        assert_eq!(frame[0], 48);
        assert_eq!(frame[1], 7);
        assert_eq!(frame[2]["return"][0], "name");
        assert_eq!(frame[3], "ak.wwise.core.object.get");
        assert_eq!(frame[4], json!([]));
        assert_eq!(frame[5]["from"]["ofType"][0], "Event");
    }

    #[test]
    fn test_decode_welcome() {
        let msg = WampMessage::decode(r#"[2, 9129137332, {"roles": {"dealer": {}}}]"#).unwrap();
        match msg {
            WampMessage::Welcome { session, details } => {
                assert_eq!(session, 9129137332);
                assert!(details["roles"]["dealer"].is_object());
            }
            other => panic!("Expected WELCOME, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_result_without_payload() {
        let msg = WampMessage::decode("[50, 3, {}]").unwrap();
        assert_eq!(
            msg,
            WampMessage::Result {
                request: 3,
                details: json!({}),
                args: Vec::new(),
                kwargs: Map::new(),
            }
        );
    }

    #[test]
    fn test_decode_error_with_message() {
        let msg = WampMessage::decode(
            r#"[8, 48, 5, {}, "ak.wwise.query.unknown_object", [], {"message": "Object not found"}]"#,
        )
        .unwrap();
        match msg {
            WampMessage::Error {
                request_type,
                request,
                error,
                kwargs,
                ..
            } => {
                assert_eq!(request_type, code::CALL);
                assert_eq!(request, 5);
                assert_eq!(error, "ak.wwise.query.unknown_object");
                assert_eq!(kwargs["message"], "Object not found");
            }
            other => panic!("Expected ERROR, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            WampMessage::decode(r#"{"type": "stage_event"}"#),
            Err(WaapiError::Protocol(_))
        ));
        assert!(matches!(WampMessage::decode("[999]"), Err(WaapiError::Protocol(_))));
        assert!(matches!(WampMessage::decode("[50, 1, {}, {}]"), Err(WaapiError::Protocol(_))));
        assert!(matches!(WampMessage::decode("not json"), Err(WaapiError::Json(_))));
    }

    #[test]
    fn test_client_frames_are_not_decoded() {
        let mut args = Map::new();
        args.insert("soundbank".into(), json!("SoundBank:Init"));
        let call = WampMessage::call(11, "ak.wwise.core.soundbank.getInclusions", args, json!({}));
        assert_eq!(call.code(), code::CALL);

        assert!(matches!(WampMessage::decode(&call.encode()), Err(WaapiError::Protocol(_))));
        assert!(matches!(
            WampMessage::decode(&WampMessage::hello(DEFAULT_REALM).encode()),
            Err(WaapiError::Protocol(_))
        ));
    }
}
