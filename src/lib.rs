//! Loopback bridge between synchronous HTTP clients and an asynchronous UI
//! runtime.
//!
//! Every inbound request is serialized into a script call for the runtime and
//! the HTTP handler waits until the runtime answers through a [`Responder`],
//! or until the configured timeout elapses and the client gets a `502`.

pub mod framework;
pub mod server;

pub use framework::core::{
    BridgeConfig, BridgeError, ConfigError, DispatchError, IntakeError, PendingRequest,
    ResponseEnvelope, ResponseRecord, ServerError,
};
pub use framework::runtime::{ChannelRuntime, ScriptCall, ScriptRuntime, ScriptStream, parse_script};
pub use server::{Dispatcher, Listener, Responder};
