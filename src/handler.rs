//! Application callbacks for [`IrCon`](crate::IrCon).

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::Error;
use crate::Message;

/// Receives lifecycle events and messages from [`IrCon`](crate::IrCon).
///
/// For each session the manager delivers zero or more `message` calls, at
/// most one `connected`, more `message` calls, and exactly one
/// `disconnected`. Messages may arrive before `connected` while the
/// handshake is still being written. Nothing is delivered for a session
/// after its `disconnected`.
///
/// Callbacks run on the session's read task; a slow handler delays reading
/// and with it the PING replies that keep the link alive.
pub trait Handler: Send + Sync + 'static {
    /// The handshake was sent; the connection is ready for use.
    fn connected(&self);

    /// The session ended, or a connection attempt failed before it started.
    fn disconnected(&self, err: Error);

    /// A line arrived from the server.
    fn message(&self, msg: Message);
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn connected(&self) {
        (**self).connected()
    }

    fn disconnected(&self, err: Error) {
        (**self).disconnected(err)
    }

    fn message(&self, msg: Message) {
        (**self).message(msg)
    }
}

/// Handler callbacks as a value, for consuming them through a channel.
#[derive(Clone, Debug)]
pub enum Event {
    Connected,
    Disconnected(Error),
    Message(Message),
}

/// Forwards every callback as an [`Event`]. Events are dropped once the
/// receiver is gone.
impl Handler for mpsc::UnboundedSender<Event> {
    fn connected(&self) {
        let _ = self.send(Event::Connected);
    }

    fn disconnected(&self, err: Error) {
        let _ = self.send(Event::Disconnected(err));
    }

    fn message(&self, msg: Message) {
        let _ = self.send(Event::Message(msg));
    }
}
