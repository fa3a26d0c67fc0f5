pub mod core;
pub mod correlation;
pub mod runtime;

// Re-export commonly used types for convenience
pub use self::core::{BridgeConfig, BridgeError, IntakeError, PendingRequest, ResponseRecord};
pub use correlation::CorrelationTable;
pub use runtime::{ChannelRuntime, ScriptRuntime};
