#![no_main]

use libfuzzer_sys::fuzz_target;
use wou_transport::parser::ReceiveParser;
use wou_transport::regs::ShadowRegisters;

// Feeds arbitrary bytes straight into the receive parser, the one piece
// of this crate that must never panic on attacker-controlled (or simply
// noisy) input: every byte that ever reaches `Board` arrives this way.
fuzz_target!(|data: &[u8]| {
    let mut regs = ShadowRegisters::new();
    let mut parser = ReceiveParser::new();
    parser.feed(data);
    loop {
        match parser.poll(&mut regs) {
            wou_transport::parser::ParseEvent::NeedMoreData => break,
            _ => continue,
        }
    }
});
