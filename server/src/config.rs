//! Relay configuration.
//!
//! Every setting comes from the environment (after `.env` is loaded) and
//! falls back to a default when unset or unparsable. Bad values are logged,
//! never fatal.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::net::IpAddr;

use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND_ADDR: IpAddr = IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED);
pub const DEFAULT_CLIENT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_BOARD: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub port: u16,
    pub bind_addr: IpAddr,
    /// Outbound frames buffered per connection before peers start skipping it.
    pub client_queue_capacity: usize,
    /// Board used when a client connects without `?board=`.
    pub default_board: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: DEFAULT_BIND_ADDR,
            client_queue_capacity: DEFAULT_CLIENT_QUEUE_CAPACITY,
            default_board: DEFAULT_BOARD.to_owned(),
        }
    }
}

impl RelayConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` is this over the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let capacity = env_parse(&lookup, "CLIENT_QUEUE_CAPACITY", DEFAULT_CLIENT_QUEUE_CAPACITY);
        Self {
            port: env_parse(&lookup, "PORT", DEFAULT_PORT),
            bind_addr: env_parse(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR),
            // tokio mpsc panics on zero capacity.
            client_queue_capacity: capacity.max(1),
            default_board: lookup("DEFAULT_BOARD")
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BOARD.to_owned()),
        }
    }

    #[must_use]
    pub fn listen_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Parse `key` through `lookup`, falling back to `default`.
fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            warn!(key, value = %raw, "config: unparsable value, using default");
            default
        }
    }
}
