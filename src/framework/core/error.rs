use std::fmt;

#[derive(Debug)]
pub enum BridgeError {
    Server(ServerError),
    Dispatch(DispatchError),
    Intake(IntakeError),
    Config(ConfigError),
}

#[derive(Debug)]
pub enum ServerError {
    BindError(String),
    TaskFailed(String),
}

#[derive(Debug)]
pub enum DispatchError {
    BodyRead(String),
    Serialization(String),
    DuplicateId(u64),
}

/// Returned by the response intake when an id is not pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeError {
    InvalidRequestId(u64),
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidAddress(String),
    ValidationError(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Server(e) => write!(f, "Server error: {}", e),
            BridgeError::Dispatch(e) => write!(f, "Dispatch error: {}", e),
            BridgeError::Intake(e) => write!(f, "Intake error: {}", e),
            BridgeError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::BindError(msg) => write!(f, "Bind error: {}", msg),
            ServerError::TaskFailed(msg) => write!(f, "Server task failed: {}", msg),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::BodyRead(msg) => write!(f, "Failed to read request body: {}", msg),
            DispatchError::Serialization(msg) => write!(f, "Failed to serialize request: {}", msg),
            DispatchError::DuplicateId(id) => write!(f, "Request id {} is already pending", id),
        }
    }
}

impl fmt::Display for IntakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntakeError::InvalidRequestId(id) => write!(f, "invalid request id: {}", id),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for BridgeError {}
impl std::error::Error for ServerError {}
impl std::error::Error for DispatchError {}
impl std::error::Error for IntakeError {}
impl std::error::Error for ConfigError {}

// Conversion traits
impl From<ServerError> for BridgeError {
    fn from(error: ServerError) -> Self {
        BridgeError::Server(error)
    }
}

impl From<DispatchError> for BridgeError {
    fn from(error: DispatchError) -> Self {
        BridgeError::Dispatch(error)
    }
}

impl From<IntakeError> for BridgeError {
    fn from(error: IntakeError) -> Self {
        BridgeError::Intake(error)
    }
}

impl From<ConfigError> for BridgeError {
    fn from(error: ConfigError) -> Self {
        BridgeError::Config(error)
    }
}
