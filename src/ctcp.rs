//! Client-to-client protocol lines.
//!
//! CTCP payloads travel inside `PRIVMSG` (queries) and `NOTICE` (replies),
//! wrapped in `\x01` delimiters. The builders return lines ready for
//! [`IrCon::send`](crate::IrCon::send).

const DELIM: char = '\x01';

/// Build a CTCP query such as `PRIVMSG #chan :\x01ACTION waves\x01`.
pub fn command(target: &str, command: &str, args: &[&str]) -> String {
    build("PRIVMSG", target, command, args)
}

/// Build a CTCP reply such as `NOTICE nick :\x01VERSION tmi-ircon\x01`.
pub fn reply(target: &str, command: &str, args: &[&str]) -> String {
    build("NOTICE", target, command, args)
}

fn build(verb: &str, target: &str, command: &str, args: &[&str]) -> String {
    let mut line = format!("{verb} {target} :{DELIM}{}", strip(command));
    for arg in args {
        line.push(' ');
        line.push_str(&strip(arg));
    }
    line.push(DELIM);
    line
}

/// Payload delimiters would end the CTCP body early.
fn strip(s: &str) -> String {
    s.replace(DELIM, "")
}

/// Split a CTCP body into command and argument text.
///
/// Returns `None` unless `text` starts with `\x01`. The closing delimiter is
/// optional, as some clients omit it.
///
/// ```
/// assert_eq!(tmi_ircon::ctcp::parse("\x01ACTION waves\x01"), Some(("ACTION", "waves")));
/// assert_eq!(tmi_ircon::ctcp::parse("hello"), None);
/// ```
pub fn parse(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_prefix(DELIM)?;
    let body = body.strip_suffix(DELIM).unwrap_or(body);
    Some(body.split_once(' ').unwrap_or((body, "")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_without_args() {
        assert_eq!(command("#chan", "VERSION", &[]), "PRIVMSG #chan :\x01VERSION\x01");
    }

    #[test]
    fn test_command_with_args() {
        assert_eq!(
            command("#chan", "ACTION", &["waves", "hello"]),
            "PRIVMSG #chan :\x01ACTION waves hello\x01"
        );
    }

    #[test]
    fn test_reply() {
        assert_eq!(
            reply("nick", "PING", &["12345"]),
            "NOTICE nick :\x01PING 12345\x01"
        );
    }

    #[test]
    fn test_delimiters_are_stripped() {
        assert_eq!(
            command("#c", "ACTION", &["a\x01b"]),
            "PRIVMSG #c :\x01ACTION ab\x01"
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse("\x01VERSION\x01"), Some(("VERSION", "")));
        assert_eq!(parse("\x01ACTION is here"), Some(("ACTION", "is here")));
        assert_eq!(parse("plain text"), None);
    }
}
