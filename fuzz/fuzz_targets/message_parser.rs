//! Fuzz target for line parsing
//!
//! Feeds arbitrary text to the parser and the outgoing sanitizer, checking
//! that neither panics and that sanitized output stays a single line.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        if input.len() > 8192 {
            return;
        }

        let msg = tmi_ircon::Message::parse(input);
        assert_eq!(msg.raw(), input);
        let _ = msg.to_string();

        let line = tmi_ircon::transport::sanitize(input);
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with("\r\n"));
    }
});
