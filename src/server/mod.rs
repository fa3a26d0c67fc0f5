//! HTTP side of the bridge
//!
//! This module owns the hyper listener, the per-request dispatcher that waits
//! on the UI runtime, and the intake through which the runtime answers.

pub mod dispatcher;
pub mod intake;
pub mod listener;
pub mod stdio;

#[cfg(test)]
mod test_listener;

pub use dispatcher::Dispatcher;
pub use intake::Responder;
pub use listener::Listener;
pub use stdio::{read_responses, write_scripts};
