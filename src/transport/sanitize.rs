//! Outgoing line sanitizer.

/// Protocol line terminator appended to every outgoing line.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Prepare a line for the wire.
///
/// Every NUL, CR or LF inside `line` is replaced with a space and `\r\n` is
/// appended, so caller-supplied text can never start a second protocol line.
///
/// ```
/// use tmi_ircon::transport::sanitize;
///
/// assert_eq!(sanitize("PRIVMSG #c :hi\r\nQUIT"), "PRIVMSG #c :hi  QUIT\r\n");
/// ```
pub fn sanitize(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + LINE_TERMINATOR.len());
    out.extend(line.chars().map(|c| match c {
        '\0' | '\r' | '\n' => ' ',
        c => c,
    }));
    out.push_str(LINE_TERMINATOR);
    out
}
