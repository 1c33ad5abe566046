//! Nom-based splitting of a raw line into message sections.
//!
//! The grammar is deliberately loose: every input produces a message, and
//! anything that does not fit degrades into the command or argument list.

use nom::{
    bytes::complete::take_till,
    character::complete::char,
    combinator::opt,
    sequence::preceded,
    IResult,
};

use super::tags::parse_tags;
use super::Message;

/// Take a `<marker>section` up to the next space and consume that one space.
fn section(input: &str, marker: char) -> IResult<&str, Option<&str>> {
    let value: IResult<&str, Option<&str>> =
        opt(preceded(char(marker), take_till(|c| c == ' ')))(input);
    let (input, value) = value?;
    if value.is_none() {
        return Ok((input, None));
    }
    let space: IResult<&str, Option<char>> = opt(char(' '))(input);
    let (input, _) = space?;
    Ok((input, value))
}

/// Parse one protocol line. Never fails.
pub(crate) fn parse_line(line: &str) -> Message {
    let (rest, tags) = section(line, '@').unwrap_or((line, None));
    let (rest, source) = section(rest, ':').unwrap_or((rest, None));

    let (head, trailer) = match rest.split_once(" :") {
        Some((head, trailer)) => (head, Some(trailer)),
        None => (rest, None),
    };

    let mut words = head.split(' ');
    let command = words.next().unwrap_or_default().to_owned();
    let mut args: Vec<String> = words.map(str::to_owned).collect();
    if let Some(trailer) = trailer {
        args.push(trailer.to_owned());
    }

    Message {
        tags: tags.map(parse_tags),
        source: source.unwrap_or_default().to_owned(),
        command,
        args,
        has_trailer: trailer.is_some(),
        raw: line.to_owned(),
    }
}
