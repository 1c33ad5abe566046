//! # tmi-ircon
//!
//! A self-healing client connection to Twitch chat (IRCv3 over TLS or
//! websocket).
//!
//! ## Features
//!
//! - IRC line parsing with IRCv3 tags, source, arguments and trailing parameter
//! - Raw TLS (`ircs://`) and websocket (`wss://`) transports behind one interface
//! - Outgoing line sanitizing against protocol injection
//! - Automatic reconnect with adaptive backoff and PING handling
//! - Pluggable login sequence and application callbacks

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Parsing messages
//!
//! ```rust
//! use tmi_ircon::Message;
//!
//! let msg: Message = "@badge=1;mod=0 :nick!u@h PRIVMSG #c :hello world".parse().unwrap();
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.tag("mod"), Some("0"));
//! assert_eq!(msg.args, vec!["#c", "hello world"]);
//! assert!(msg.has_trailer);
//! ```
//!
//! ### Staying connected
//!
//! ```no_run
//! use tmi_ircon::{Error, Handler, IrCon, IrcHandshake, Message};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Printer;
//!
//! impl Handler for Printer {
//!     fn connected(&self) {
//!         println!("connected");
//!     }
//!     fn disconnected(&self, err: Error) {
//!         println!("disconnected: {err}");
//!     }
//!     fn message(&self, msg: Message) {
//!         println!("{}", msg.raw());
//!     }
//! }
//!
//! # async fn demo() {
//! let irc = IrCon::new(IrcHandshake::anonymous());
//! irc.run(CancellationToken::new(), Printer).await;
//! # }
//! ```

pub mod backoff;
pub mod config;
pub mod ctcp;
pub mod error;
pub mod handler;
pub mod handshake;
pub mod ircon;
pub mod line;
pub mod message;
pub mod transport;

pub use self::backoff::Backoff;
pub use self::config::Config;
pub use self::error::{Error, Result};
pub use self::handler::{Event, Handler};
pub use self::handshake::{Handshaker, IrcHandshake};
pub use self::ircon::IrCon;
pub use self::line::{LineBuffer, MAX_LINE_LEN};
pub use self::message::{Message, Tags};
pub use self::transport::{sanitize, Conn, Dialer, Sender, ServerDialer, Transport};
