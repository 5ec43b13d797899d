//! Server configuration
//!
//! Bind address comes from the first command line argument or
//! `CHAT_RELAY_ADDR`; queue sizes from `CHAT_RELAY_COMMAND_BUFFER` and
//! `CHAT_RELAY_CLIENT_BUFFER`.

use std::env;

use crate::error::AppError;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default channel buffer size for server commands
pub const DEFAULT_COMMAND_BUFFER: usize = 256;

/// Default per-connection outbound queue size
pub const DEFAULT_CLIENT_BUFFER: usize = 32;

/// Runtime settings for the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the listener to
    pub addr: String,
    /// Capacity of the handler → actor command channel
    pub command_buffer: usize,
    /// Capacity of each session's outbound queue
    pub client_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            command_buffer: DEFAULT_COMMAND_BUFFER,
            client_buffer: DEFAULT_CLIENT_BUFFER,
        }
    }
}

impl ServerConfig {
    /// Load from process arguments and environment
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_sources(env::args().nth(1), |key| env::var(key).ok())
    }

    /// Load from an explicit address argument and variable lookup
    pub fn from_sources(
        arg_addr: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let addr = arg_addr
            .or_else(|| lookup("CHAT_RELAY_ADDR"))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        Ok(Self {
            addr,
            command_buffer: parse_buffer(&lookup, "CHAT_RELAY_COMMAND_BUFFER", DEFAULT_COMMAND_BUFFER)?,
            client_buffer: parse_buffer(&lookup, "CHAT_RELAY_CLIENT_BUFFER", DEFAULT_CLIENT_BUFFER)?,
        })
    }
}

/// Channel capacities must be positive integers
fn parse_buffer(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> Result<usize, AppError> {
    let Some(value) = lookup(key) else {
        return Ok(default);
    };

    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::InvalidConfig {
            key: key.to_string(),
            value,
        }),
    }
}
