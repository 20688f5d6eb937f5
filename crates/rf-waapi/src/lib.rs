//! # rf-waapi — Wwise Authoring API client
//!
//! Request/response access to a running Wwise authoring tool over WAAPI.
//!
//! ## Features
//!
//! - WAMP v2 JSON session (`wamp.2.json`) over WebSocket
//! - Pipelined calls correlated by request id
//! - Typed `ak.wwise.core.object.get` query builder
//! - `WaapiCall` / `WaapiSession` seams for swapping the transport in tests

pub mod call;
pub mod client;
pub mod error;
pub mod protocol;

pub use call::*;
pub use client::*;
pub use error::*;
pub use protocol::*;
