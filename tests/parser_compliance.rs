//! IRCv3 tag and Twitch message compliance tests.
//!
//! Covers the IRCv3 message-tags escaping rules
//! (https://ircv3.net/specs/extensions/message-tags) and a corpus of real
//! Twitch chat lines.
//!
//! Run with: `cargo test --test parser_compliance`

use tmi_ircon::message::tags::{parse_tags, unescape_tag_value};
use tmi_ircon::{LineBuffer, Message};

// =============================================================================
// IRCv3 MESSAGE TAGS ESCAPING
// =============================================================================

mod tag_escaping {
    use super::*;

    /// Escape table from the message-tags document.
    #[test]
    fn test_escape_table() {
        let cases = [
            ("\\:", ";"),
            ("\\s", " "),
            ("\\\\", "\\"),
            ("\\r", "\r"),
            ("\\n", "\n"),
        ];
        for (escaped, raw) in cases {
            assert_eq!(unescape_tag_value(escaped), raw, "escape {escaped:?}");
        }
    }

    #[test]
    fn test_unescape_combined() {
        assert_eq!(unescape_tag_value("A\\sB\\:C"), "A B;C");
        assert_eq!(unescape_tag_value("a\\:b\\sc\\\\d\\re\\nf"), "a;b c\\d\re\nf");
    }
}

// =============================================================================
// TAG SECTION PARSING
// =============================================================================

mod tag_parsing {
    use super::*;

    #[test]
    fn test_key_without_value() {
        let tags = parse_tags("flag;k=v");
        assert_eq!(tags["flag"], "");
        assert_eq!(tags["k"], "v");
    }

    #[test]
    fn test_empty_values() {
        let tags = parse_tags("badge-info=;badges=;emotes=");
        assert_eq!(tags.len(), 3);
        assert!(tags.values().all(String::is_empty));
    }

    #[test]
    fn test_value_containing_equals() {
        let tags = parse_tags("url=https://x.test/?a=b");
        assert_eq!(tags["url"], "https://x.test/?a=b");
    }

    #[test]
    fn test_vendor_and_client_tags() {
        let msg = Message::parse("@+example.com/foo=bar;draft/reply=123 PRIVMSG #c :x");
        assert_eq!(msg.tag("+example.com/foo"), Some("bar"));
        assert_eq!(msg.tag("draft/reply"), Some("123"));
    }
}

// =============================================================================
// MESSAGE STRUCTURE
// =============================================================================

mod structure {
    use super::*;

    #[test]
    fn test_full_line() {
        let msg = Message::parse("@badge=1;mod=0 :nick!u@h PRIVMSG #c :hello world");
        let tags = msg.tags.as_ref().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["badge"], "1");
        assert_eq!(tags["mod"], "0");
        assert_eq!(msg.source, "nick!u@h");
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.args, vec!["#c", "hello world"]);
        assert!(msg.has_trailer);
    }

    #[test]
    fn test_ping() {
        let msg = Message::parse("PING :tmi.server");
        assert!(msg.tags.is_none());
        assert_eq!(msg.source, "");
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.args, vec!["tmi.server"]);
        assert!(msg.has_trailer);
    }

    #[test]
    fn test_bare_command() {
        let msg = Message::parse("PING");
        assert_eq!(msg.command, "PING");
        assert!(msg.args.is_empty());
        assert!(!msg.has_trailer);
    }

    #[test]
    fn test_trailer_may_be_empty() {
        let msg = Message::parse("PRIVMSG #c :");
        assert_eq!(msg.args, vec!["#c", ""]);
        assert!(msg.has_trailer);
    }

    #[test]
    fn test_trailer_keeps_colons_and_spaces() {
        let msg = Message::parse("PRIVMSG #c :a :b  c");
        assert_eq!(msg.args, vec!["#c", "a :b  c"]);
    }

    #[test]
    fn test_numeric() {
        let msg = Message::parse(":tmi.twitch.tv 001 justinfan12345 :Welcome, GLHF!");
        assert_eq!(msg.command, "001");
        assert_eq!(msg.args, vec!["justinfan12345", "Welcome, GLHF!"]);
    }

    #[test]
    fn test_cap_ack() {
        let msg = Message::parse(":tmi.twitch.tv CAP * ACK :twitch.tv/tags twitch.tv/commands");
        assert_eq!(msg.args, vec!["*", "ACK", "twitch.tv/tags twitch.tv/commands"]);
    }

    #[test]
    fn test_dangling_tags() {
        let msg = Message::parse("@a=b;c=d");
        assert_eq!(msg.tag("c"), Some("d"));
        assert_eq!(msg.command, "");
        assert!(msg.args.is_empty());
    }

    #[test]
    fn test_empty_line() {
        let msg = Message::parse("");
        assert_eq!(msg.command, "");
        assert!(msg.tags.is_none());
        assert!(msg.args.is_empty());
    }

    #[test]
    fn test_raw_is_retained() {
        let line = "@a=b :s CMD x :y z";
        assert_eq!(Message::parse(line).raw(), line);
    }
}

// =============================================================================
// TWITCH CORPUS
// =============================================================================

mod twitch {
    use super::*;

    const CORPUS: &[(&str, &str)] = &[
        (
            "@msg-id=slow_off :tmi.twitch.tv NOTICE #channel :This room is no longer in slow mode.",
            "This room is no longer in slow mode.",
        ),
        (
            "@color=#0D4200;display-name=TWITCH_UserNaME;emotes=25:0-4,12-16/1902:6-10;subscriber=0;turbo=1;user-type=global_mod :twitch_username!twitch_username@twitch_username.tmi.twitch.tv PRIVMSG #channel :Kappa Keepo Kappa",
            "Kappa Keepo Kappa",
        ),
        (
            "@badge-info=;badges=;color=#1E90FF;display-name=cbdg;emote-only=1;emotes=300949179:0-9;flags=;id=477f0595-3183-4520-85d7-123e2018806b;mod=0;msg-id=highlighted-message;room-id=24761645;subscriber=0;tmi-sent-ts=1578179988796;turbo=0;user-id=53381086;user-type= :cbdg!cbdg@cbdg.tmi.twitch.tv PRIVMSG #cirno_tv :naroStaryn",
            "naroStaryn",
        ),
        (
            "@badge-info=subscriber/68;badges=subscriber/60;color=#6B00B8;display-name=MrXtacle;emotes=;flags=;id=16894214-c514-4612-a979-de9280ca437a;login=mrxtacle;mod=0;msg-id=resub;msg-param-cumulative-months=68;msg-param-months=0;msg-param-should-share-streak=0;msg-param-sub-plan-name=Baka\\sBrigade!;msg-param-sub-plan=1000;room-id=24761645;subscriber=1;system-msg=MrXtacle\\ssubscribed\\sat\\sTier\\s1.\\sThey've\\ssubscribed\\sfor\\s68\\smonths!;tmi-sent-ts=1578181991964;user-id=28413930;user-type= :tmi.twitch.tv USERNOTICE #cirno_tv :Look at me, I'm all gwown up RainbowDaijoubu",
            "Look at me, I'm all gwown up RainbowDaijoubu",
        ),
        (
            "@color=#0D4200;display-name=TWITCH_UserNaME;emotes=25:0-4,12-16/1902:6-10;subscriber=0;turbo=1;user-type=global_mod :twitch_username!twitch_username@twitch_username.tmi.twitch.tv PRIVMSG #channel Kappa",
            "Kappa",
        ),
    ];

    #[test]
    fn test_payloads() {
        for (line, payload) in CORPUS {
            let msg = Message::parse(line);
            assert_eq!(msg.trailer(1), *payload, "payload of {line:?}");
        }
    }

    #[test]
    fn test_resub_tags_are_unescaped() {
        let msg = Message::parse(CORPUS[3].0);
        assert_eq!(msg.command, "USERNOTICE");
        assert_eq!(msg.tag("msg-param-sub-plan-name"), Some("Baka Brigade!"));
        assert_eq!(
            msg.tag("system-msg"),
            Some("MrXtacle subscribed at Tier 1. They've subscribed for 68 months!")
        );
        assert_eq!(msg.tag("user-type"), Some(""));
    }

    #[test]
    fn test_source_and_channel() {
        let msg = Message::parse(CORPUS[2].0);
        assert_eq!(msg.source, "cbdg!cbdg@cbdg.tmi.twitch.tv");
        assert_eq!(msg.arg(0), "#cirno_tv");
        assert_eq!(msg.tag("emote-only"), Some("1"));
    }

    #[test]
    fn test_action_payload() {
        let msg = Message::parse(
            ":bot!bot@bot.tmi.twitch.tv PRIVMSG #forsen :\u{1}ACTION [Cookies] you have 162 cookies!\u{1}",
        );
        let trailer = msg.trailer(1);
        let (command, text) = tmi_ircon::ctcp::parse(&trailer).unwrap();
        assert_eq!(command, "ACTION");
        assert_eq!(text, "[Cookies] you have 162 cookies!");
    }

    #[test]
    fn test_corpus_through_line_buffer() {
        let mut stream = Vec::new();
        for (line, _) in CORPUS {
            stream.extend_from_slice(line.as_bytes());
            stream.extend_from_slice(b"\r\n");
        }

        let mut buffer = LineBuffer::new();
        let mut parsed = Vec::new();
        for chunk in stream.chunks(97) {
            buffer.feed(chunk);
            while let Some(msg) = buffer.try_read() {
                parsed.push(msg);
            }
        }

        assert_eq!(parsed.len(), CORPUS.len());
        for (msg, (line, _)) in parsed.iter().zip(CORPUS) {
            assert_eq!(msg.raw(), *line);
        }
        assert!(buffer.is_empty());
    }
}
