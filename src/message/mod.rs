//! The parsed form of one protocol line.

mod parse;
pub mod tags;

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

pub use self::tags::Tags;

/// One IRC line, split into tags, source, command and arguments.
///
/// Parsing never fails: malformed input produces a message with an empty
/// command or fewer arguments rather than an error.
///
/// ```
/// use tmi_ircon::Message;
///
/// let msg = Message::parse("@badge=1;mod=0 :nick!u@h PRIVMSG #c :hello world");
/// assert_eq!(msg.command, "PRIVMSG");
/// assert_eq!(msg.args, ["#c", "hello world"]);
/// assert_eq!(msg.tags.as_ref().unwrap()["mod"], "0");
/// assert!(msg.has_trailer);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Unescaped IRCv3 tags; `None` if the line had no `@` section.
    pub tags: Option<Tags>,
    /// Origin of the message, empty if absent.
    pub source: String,
    /// Command verb or numeric.
    pub command: String,
    /// Parameters in order. A trailing parameter occupies the last slot.
    pub args: Vec<String>,
    /// Whether the last argument used trailing-parameter syntax.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "trailer", default, skip_serializing_if = "std::ops::Not::not")
    )]
    pub has_trailer: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    raw: String,
}

impl Message {
    /// Parse a single line, without its line terminator.
    pub fn parse(line: &str) -> Message {
        parse::parse_line(line)
    }

    /// The argument at position `i`, joining any later arguments with spaces.
    ///
    /// Useful for commands whose payload may or may not have been sent as a
    /// trailing parameter. Returns an empty string if `i` is out of range.
    pub fn trailer(&self, i: usize) -> String {
        match self.args.get(i..) {
            Some(rest) => rest.join(" "),
            None => String::new(),
        }
    }

    /// The argument at position `i`, or an empty string.
    pub fn arg(&self, i: usize) -> &str {
        self.args.get(i).map(String::as_str).unwrap_or_default()
    }

    /// Look up a tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.as_ref()?.get(key).map(String::as_str)
    }

    /// The line this message was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl FromStr for Message {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Message::parse(s))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Message(")?;
        if let Some(tags) = self.tags.as_ref().filter(|t| !t.is_empty()) {
            let mut keys: Vec<_> = tags.keys().collect();
            keys.sort();
            f.write_str("tags={")?;
            for (n, key) in keys.into_iter().enumerate() {
                if n > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}={}", key, tags[key])?;
            }
            f.write_str("}, ")?;
        }
        write!(f, "from={}, {}, args={:?})", self.source, self.command, self.args)
    }
}
