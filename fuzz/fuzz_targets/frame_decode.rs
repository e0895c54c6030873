//! Fuzz target for Frame::decode_bytes
//!
//! Feeds arbitrary bytes to the line decoder. Decoding must never panic, and
//! any frame that decodes must survive an encode/decode cycle unchanged.

#![no_main]

use libfuzzer_sys::fuzz_target;
use squelch_proto::Frame;

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = Frame::decode_bytes(data) else {
        return;
    };

    let line = frame.encode();
    let reparsed = Frame::decode(&line).expect("encoded frame must decode");
    assert_eq!(reparsed, frame);
});
