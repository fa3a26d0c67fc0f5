//! Outbound boundary towards the UI runtime
//!
//! Requests leave the bridge as a script string which the runtime evaluates.
//! Delivery is fire-and-forget: nothing is returned and failures surface
//! only as a request timeout.

pub mod channel;
pub mod script;

pub use channel::{ChannelRuntime, ScriptStream};
pub use script::{ScriptCall, parse_script, render_script};

/// Something that can evaluate a script in the UI runtime
pub trait ScriptRuntime: Send + Sync {
    fn eval(&self, script: String);
}

impl<F> ScriptRuntime for F
where
    F: Fn(String) + Send + Sync,
{
    fn eval(&self, script: String) {
        self(script)
    }
}
