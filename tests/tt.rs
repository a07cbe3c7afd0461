use solaris::tt::{Bound, TT};
use solaris::types::{Move, MATE};

fn mv(from: u8, to: u8) -> Move {
    Move {
        from,
        to,
        promo: None,
    }
}

#[test]
fn store_then_probe_round_trips() {
    let mut tt = TT::new(1);
    let key = 0x9E3779B97F4A7C15u64;
    tt.store(key, 42, Bound::Exact, 7, mv(12, 28), 0);
    let e = tt.probe(key, 0).expect("entry just stored");
    assert_eq!(e.value, 42);
    assert_eq!(e.best, mv(12, 28));
    assert!(e.depth >= 7);
    assert_eq!(e.bound, Bound::Exact);
}

#[test]
fn clear_forgets_everything() {
    let mut tt = TT::new(1);
    tt.store(0xDEADBEEF, 10, Bound::Lower, 3, mv(0, 8), 0);
    assert!(tt.probe(0xDEADBEEF, 0).is_some());
    tt.clear();
    assert!(tt.probe(0xDEADBEEF, 0).is_none());
    assert_eq!(tt.fullness(), 0);
}

#[test]
fn probe_miss_on_unknown_key() {
    let tt = TT::new(1);
    assert!(tt.probe(0x123456789, 0).is_none());
}

#[test]
fn mate_scores_are_ply_adjusted() {
    let mut tt = TT::new(1);
    let key = 0xABCDEF0123456789u64;
    // mate found 5 plies from the root, stored from a node at ply 2
    tt.store(key, MATE - 5, Bound::Exact, 4, mv(1, 2), 2);
    // probed from a node at ply 4, the same mate is 2 plies closer to us
    let e = tt.probe(key, 4).expect("entry");
    assert_eq!(e.value, MATE - 7);
}

#[test]
fn resize_discards_entries() {
    let mut tt = TT::new(4);
    tt.store(0xFEED, 1, Bound::Upper, 2, mv(3, 4), 0);
    tt.set_size(8);
    assert!(tt.probe(0xFEED, 0).is_none());
}

#[test]
fn fullness_reports_occupancy() {
    let mut tt = TT::new(1);
    assert_eq!(tt.fullness(), 0);
    for i in 0..1000u64 {
        tt.store(i.wrapping_mul(0x2545F4914F6CDD1D), 0, Bound::Exact, 1, mv(0, 1), 0);
    }
    assert!(tt.fullness() > 0);
}

#[test]
fn quiescence_depth_zero_entries_are_probed() {
    let mut tt = TT::new(1);
    let key = 0x1122334455667788u64;
    tt.store(key, -30, Bound::Upper, 0, Move::default(), 6);
    let e = tt.probe(key, 6).expect("entry");
    assert_eq!(e.depth, 0);
    assert_eq!(e.value, -30);
}
