//! Connection manager configuration and well-known endpoints.

use std::time::Duration;

use crate::error::{Error, Result};

/// Twitch IRC over a raw TLS socket.
pub const DEFAULT_IRC_SERVER: &str = "ircs://irc.chat.twitch.tv:6697/";

/// Twitch IRC over a secure websocket, as used by the web chat.
pub const DEFAULT_WEB_CHAT: &str = "wss://irc-ws.chat.twitch.tv/";

/// Server used when none is configured.
pub const DEFAULT_SERVER: &str = DEFAULT_WEB_CHAT;

/// Capabilities requested on connect.
///
/// `twitch.tv/membership` is left out: it is rarely useful and costs a JOIN
/// and PART for every viewer.
pub const DEFAULT_CAPS: &str = "twitch.tv/tags twitch.tv/commands";

/// Smallest reconnect delay.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(15);

/// Largest reconnect delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(300);

/// Settings for [`IrCon`](crate::IrCon).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Server URL; the scheme selects the transport.
    pub server: String,
    /// Lower bound and step of the reconnect backoff.
    pub min_delay: Duration,
    /// Upper bound of the reconnect backoff.
    pub max_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_owned(),
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl Config {
    /// Default settings against `server`.
    pub fn with_server(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    /// Override the backoff bounds.
    pub fn backoff(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    /// Check the backoff bounds.
    ///
    /// A zero `min_delay` would pin the delay at zero and redial a failing
    /// server without pause.
    pub fn validate(&self) -> Result<()> {
        if self.min_delay.is_zero() {
            return Err(Error::ZeroMinDelay);
        }
        Ok(())
    }
}
