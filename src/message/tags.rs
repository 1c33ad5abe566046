//! IRCv3 message tag parsing and unescaping.

use std::borrow::Cow;
use std::collections::HashMap;

/// Parsed message tags, keyed by tag name.
pub type Tags = HashMap<String, String>;

/// Parse a raw tag section (without the leading `@`) into a map.
///
/// Entries are separated by `;`. A key without `=` maps to an empty value.
/// A trailing `;` does not produce an entry.
pub fn parse_tags(raw: &str) -> Tags {
    raw.split_terminator(';')
        .map(|entry| {
            let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
            (key.to_owned(), unescape_tag_value(value).into_owned())
        })
        .collect()
}

/// Unescape a tag value from wire format.
///
/// Recognised sequences are `\:` `\s` `\r` `\n` and `\\`. Any other
/// backslash, including a trailing one, is kept as is. Values without a
/// backslash are returned borrowed.
pub fn unescape_tag_value(value: &str) -> Cow<'_, str> {
    if !value.contains('\\') {
        return Cow::Borrowed(value);
    }

    let mut unescaped = String::with_capacity(value.len());
    let mut iter = value.chars().peekable();
    while let Some(c) = iter.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        let r = match iter.peek() {
            Some(':') => ';',
            Some('s') => ' ',
            Some('r') => '\r',
            Some('n') => '\n',
            Some('\\') => '\\',
            _ => {
                unescaped.push('\\');
                continue;
            }
        };
        iter.next();
        unescaped.push(r);
    }
    Cow::Owned(unescaped)
}
