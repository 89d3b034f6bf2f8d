use wou_transport::constants::{NR_OF_WIN, WB_WR_CMD};
use wou_transport::crc;
use wou_transport::window::{AckOutcome, Window};

#[test]
fn filling_the_window_without_acking_blocks_the_next_seal() {
    crc::init();
    let mut w = Window::new();
    // §8 scenario 5: append and seal NR_OF_WIN+1 frames with the peer
    // silent. The (NR_OF_WIN+1)-th eof() must block.
    for _ in 0..(NR_OF_WIN as u16 + 1) {
        w.current_mut()
            .append_packet(WB_WR_CMD, 0, 1, Some(&[0xAA]))
            .unwrap();
        w.seal_current();
    }
    assert!(w.would_block());
}

#[test]
fn acking_in_order_frees_slots_one_at_a_time() {
    crc::init();
    let mut w = Window::new();
    for _ in 0..3 {
        w.current_mut()
            .append_packet(WB_WR_CMD, 0, 1, Some(&[0xAA]))
            .unwrap();
        w.seal_current();
    }
    assert_eq!(w.on_ack(1), AckOutcome::Advanced { by: 1 });
    assert_eq!(w.sb(), 1);
    assert_eq!(w.on_ack(3), AckOutcome::Advanced { by: 2 });
    assert_eq!(w.sb(), 3);
}

#[test]
fn a_nak_leaves_sb_untouched_and_forces_retransmit_from_sb() {
    crc::init();
    let mut w = Window::new();
    w.current_mut()
        .append_packet(WB_WR_CMD, 0, 1, Some(&[0xAA]))
        .unwrap();
    w.seal_current();
    let (_, _) = w.drain_pending(4096);
    assert_eq!(w.sn(), 1);

    // The remote echoes back the already-acked id instead of advancing.
    assert_eq!(w.on_ack(w.tid_sb()), AckOutcome::Retransmit);
    assert_eq!(w.sb(), 0);
    assert_eq!(w.sn(), 0);
}
