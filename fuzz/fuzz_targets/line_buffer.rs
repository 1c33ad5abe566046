//! Fuzz target for stream framing
//!
//! The first byte picks a chunk size; the rest is fed to a line buffer in
//! chunks of that size, as a socket would deliver it.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&size, stream)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(size).max(1);

    let mut buffer = tmi_ircon::LineBuffer::new();
    let mut lines = 0;
    for piece in stream.chunks(chunk) {
        buffer.feed(piece);
        while buffer.try_read().is_some() {
            lines += 1;
        }
    }

    let newlines = stream.iter().filter(|&&b| b == b'\n').count();
    assert_eq!(lines, newlines);
    let tail = stream.iter().rev().take_while(|&&b| b != b'\n').count();
    assert_eq!(buffer.len(), tail);
});
