use solaris::board::Board;
use solaris::perft::perft;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const ENDGAME: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

#[test]
fn startpos_perft() {
    let b = Board::new_start();
    assert_eq!(perft(&mut b.clone(), 1), 20);
    assert_eq!(perft(&mut b.clone(), 2), 400);
    assert_eq!(perft(&mut b.clone(), 3), 8_902);
    assert_eq!(perft(&mut b.clone(), 4), 197_281);
}

#[test]
fn kiwipete_perft() {
    let b = Board::from_fen(KIWIPETE).unwrap();
    assert_eq!(perft(&mut b.clone(), 1), 48);
    assert_eq!(perft(&mut b.clone(), 2), 2_039);
    assert_eq!(perft(&mut b.clone(), 3), 97_862);
}

#[test]
fn endgame_perft() {
    // exercises en passant, promotions and checks
    let b = Board::from_fen(ENDGAME).unwrap();
    assert_eq!(perft(&mut b.clone(), 1), 14);
    assert_eq!(perft(&mut b.clone(), 2), 191);
    assert_eq!(perft(&mut b.clone(), 3), 2_812);
    assert_eq!(perft(&mut b.clone(), 4), 43_238);
}

#[test]
#[ignore = "slow; run with --ignored to validate deep perft"]
fn startpos_perft_deep() {
    let b = Board::new_start();
    assert_eq!(perft(&mut b.clone(), 5), 4_865_609);
    assert_eq!(perft(&mut b.clone(), 6), 119_060_324);
}

#[test]
fn make_unmake_round_trip() {
    let mut b = Board::from_fen(KIWIPETE).unwrap();
    let before_fen = b.to_fen();
    let before_key = b.key;
    for mv in solaris::movegen::legal_moves(&mut b.clone()) {
        let u = b.make_move(mv);
        b.unmake_move(mv, u);
        assert_eq!(b.to_fen(), before_fen, "state differs after {}", mv.uci());
        assert_eq!(b.key, before_key, "key differs after {}", mv.uci());
    }
}
