use super::ScriptRuntime;
use futures::stream::Stream;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Type alias for the stream of scripts handed to the UI runtime
pub type ScriptStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Runtime that queues every script on a channel for someone else to run
#[derive(Debug, Clone)]
pub struct ChannelRuntime {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelRuntime {
    pub fn new() -> (Self, ScriptStream) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, Box::pin(UnboundedReceiverStream::new(receiver)))
    }
}

impl ScriptRuntime for ChannelRuntime {
    fn eval(&self, script: String) {
        if self.sender.send(script).is_err() {
            log::warn!("⚠️  Script consumer is gone, request will time out");
        }
    }
}
