use super::error::ConfigError;
use std::net::SocketAddr;
use std::time::Duration;

/// Callback invoked by the UI runtime for every forwarded request
pub const DEFAULT_CALLBACK: &str = "sages";

/// How long a request waits for the UI runtime before answering 502
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration for the loopback listener
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    /// Enables per-request diagnostic logging; no behavioral effect
    pub verbose: bool,
    pub timeout: Duration,
    pub callback: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            verbose: false,
            timeout: DEFAULT_TIMEOUT,
            callback: DEFAULT_CALLBACK.to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = callback.into();
        self
    }

    /// Resolve `host:port` into a socket address
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidAddress(format!("{}: {}", raw, e)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        if self.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "timeout must be greater than zero".to_string(),
            ));
        }

        // The callback name is spliced verbatim into the script text.
        let valid_callback = !self.callback.is_empty()
            && self
                .callback
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.');
        if !valid_callback {
            return Err(ConfigError::ValidationError(format!(
                "invalid callback name: {:?}",
                self.callback
            )));
        }

        Ok(())
    }
}
