//! Login sequence sent after a transport connects.

use std::future::Future;

use crate::config::DEFAULT_CAPS;
use crate::error::Result;
use crate::transport::Sender;

/// Nick used for anonymous, read-only Twitch logins.
pub const ANONYMOUS_NICK: &str = "justinfan12345";

/// Placeholder token accepted for anonymous logins.
pub const ANONYMOUS_PASS: &str = "blah";

/// A pluggable login strategy.
pub trait Handshaker: Send + Sync + 'static {
    /// Send the login sequence. Any send error aborts it.
    fn handshake<S: Sender>(&self, sender: &S) -> impl Future<Output = Result<()>> + Send;
}

/// Standard pre-registration handshake: `CAP REQ`, `PASS`, `NICK`, `USER`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IrcHandshake {
    /// Capabilities requested on connect; skipped if empty.
    pub caps: String,
    pub nick: String,
    /// Real name sent in `USER`.
    pub gecos: String,
    /// Password or OAuth token (`oauth:...`); skipped if empty.
    pub pass: String,
}

impl IrcHandshake {
    /// Twitch login with [`DEFAULT_CAPS`].
    ///
    /// An empty `nick` selects the anonymous login, which can read chat but
    /// cannot send messages.
    pub fn twitch(nick: impl Into<String>, pass: impl Into<String>) -> Self {
        let mut nick = nick.into();
        let mut pass = pass.into();
        if nick.is_empty() {
            nick = ANONYMOUS_NICK.to_owned();
            pass = ANONYMOUS_PASS.to_owned();
        }
        Self {
            caps: DEFAULT_CAPS.to_owned(),
            gecos: nick.clone(),
            nick,
            pass,
        }
    }

    /// Anonymous Twitch login.
    pub fn anonymous() -> Self {
        Self::twitch("", "")
    }
}

impl Default for IrcHandshake {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl Handshaker for IrcHandshake {
    async fn handshake<S: Sender>(&self, sender: &S) -> Result<()> {
        if !self.caps.is_empty() {
            sender.send(&format!("CAP REQ :{}", self.caps)).await?;
        }
        if !self.pass.is_empty() {
            sender.send(&format!("PASS {}", self.pass)).await?;
        }
        sender.send(&format!("NICK {}", self.nick)).await?;
        sender
            .send(&format!("USER {} 8 * :{}", self.nick, self.gecos))
            .await
    }
}
