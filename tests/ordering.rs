use solaris::board::Board;
use solaris::movegen::legal_moves;
use solaris::ordering::{ordered_moves, KILLER_0_SCORE, PV_HINT_SCORE, TT_MOVE_SCORE};
use solaris::types::Move;

fn no_killers() -> [Move; 2] {
    [Move::default(); 2]
}

fn empty_history() -> [[i32; 4096]; 2] {
    [[0; 4096]; 2]
}

fn find(b: &mut Board, uci: &str) -> Move {
    legal_moves(b)
        .into_iter()
        .find(|m| m.uci() == uci)
        .unwrap_or_else(|| panic!("{} not legal", uci))
}

#[test]
fn tt_move_sorts_first() {
    let mut b = Board::new_start();
    let tt_move = find(&mut b, "g1f3");
    let scored = ordered_moves(
        &mut b,
        Some(tt_move),
        None,
        &no_killers(),
        &empty_history(),
        0.0,
    );
    assert_eq!(scored[0].1, tt_move);
    assert_eq!(scored[0].0, TT_MOVE_SCORE);
}

#[test]
fn pv_hint_ranks_below_tt_move() {
    let mut b = Board::new_start();
    let tt_move = find(&mut b, "g1f3");
    let hint = find(&mut b, "e2e4");
    let scored = ordered_moves(
        &mut b,
        Some(tt_move),
        Some(hint),
        &no_killers(),
        &empty_history(),
        0.0,
    );
    assert_eq!(scored[0].1, tt_move);
    assert_eq!(scored[1].1, hint);
    assert_eq!(scored[1].0, PV_HINT_SCORE);
}

#[test]
fn killer_outranks_plain_quiets() {
    let mut b = Board::new_start();
    let killer = find(&mut b, "b1c3");
    let scored = ordered_moves(
        &mut b,
        None,
        None,
        &[killer, Move::default()],
        &empty_history(),
        0.0,
    );
    assert_eq!(scored[0].1, killer);
    assert_eq!(scored[0].0, KILLER_0_SCORE);
}

#[test]
fn winning_capture_beats_losing_capture() {
    // white pawn can take the queen on d5, white queen can take the pawn on h5
    let mut b =
        Board::from_fen("4k3/8/8/3q3p/4P2Q/8/8/4K3 w - - 0 1").unwrap();
    let pawn_takes_queen = find(&mut b, "e4d5");
    let queen_takes_pawn = find(&mut b, "h4h5");
    let scored = ordered_moves(&mut b, None, None, &no_killers(), &empty_history(), 0.0);
    let pos_pq = scored.iter().position(|&(_, m)| m == pawn_takes_queen).unwrap();
    let pos_qp = scored.iter().position(|&(_, m)| m == queen_takes_pawn).unwrap();
    assert!(pos_pq < pos_qp, "MVV/LVA ordering violated");
    assert_eq!(scored[0].1, pawn_takes_queen);
}

#[test]
fn history_breaks_ties_between_quiets() {
    let mut b = Board::new_start();
    let favoured = find(&mut b, "d2d3");
    let mut history = empty_history();
    history[0][favoured.from as usize * 64 + favoured.to as usize] = 9_999;
    let scored = ordered_moves(&mut b, None, None, &no_killers(), &history, 0.0);
    let pos_fav = scored.iter().position(|&(_, m)| m == favoured).unwrap();
    let pos_other = scored
        .iter()
        .position(|&(_, m)| m.uci() == "b1a3")
        .unwrap();
    assert!(pos_fav < pos_other);
}
