use crate::board::Board;
use crate::movegen::mobility_attacks;
use crate::params::PARAMS;
use crate::types::{file_of, rank_of, PieceKind, Score, Side};
use lazy_static::lazy_static;

pub const PAWN_VALUE: Score = 100;
pub const KNIGHT_VALUE: Score = 325;
pub const BISHOP_VALUE: Score = 350;
pub const ROOK_VALUE: Score = 500;
pub const QUEEN_VALUE: Score = 900;

#[inline]
pub fn piece_value(kind: PieceKind) -> Score {
    match kind {
        PieceKind::Pawn => PAWN_VALUE,
        PieceKind::Knight => KNIGHT_VALUE,
        PieceKind::Bishop => BISHOP_VALUE,
        PieceKind::Rook => ROOK_VALUE,
        PieceKind::Queen => QUEEN_VALUE,
        PieceKind::King => 0,
    }
}

// Phase weights: knights and bishops 1, rooks 2, queens 4.
const PHASE_WEIGHTS: [i32; 6] = [0, 1, 1, 2, 4, 0];
const TOTAL_PHASE: i32 = 4 + 4 + 8 + 8;

/// Game phase in [0, 1]: 0 at the starting position, 1 with only kings left.
pub fn phase(b: &Board) -> f64 {
    let mut p = TOTAL_PHASE;
    for i in 0..64u8 {
        if let Some(pc) = b.piece_at(i) {
            p -= PHASE_WEIGHTS[pc.kind as usize];
        }
    }
    let p = p.max(0);
    ((p * 256 + TOTAL_PHASE / 2) / TOTAL_PHASE) as f64 / 256.0
}

// Piece-square tables, white's perspective, a1 = index 0. Black mirrors the
// rank. Every table is file-symmetric so the mirror preserves sign symmetry.
#[rustfmt::skip]
const PAWN_MG: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10, -20, -20,  10,  10,   5,
      5,  -5, -10,   0,   0, -10,  -5,   5,
      0,   0,   0,  20,  20,   0,   0,   0,
      5,   5,  10,  25,  25,  10,   5,   5,
     10,  10,  20,  30,  30,  20,  10,  10,
     50,  50,  50,  50,  50,  50,  50,  50,
      0,   0,   0,   0,   0,   0,   0,   0,
];
#[rustfmt::skip]
const PAWN_EG: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
     10,  10,  10,  10,  10,  10,  10,  10,
     10,  10,  10,  10,  10,  10,  10,  10,
     20,  20,  20,  20,  20,  20,  20,  20,
     30,  30,  30,  30,  30,  30,  30,  30,
     50,  50,  50,  50,  50,  50,  50,  50,
     80,  80,  80,  80,  80,  80,  80,  80,
      0,   0,   0,   0,   0,   0,   0,   0,
];
#[rustfmt::skip]
const KNIGHT_MG: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];
#[rustfmt::skip]
const KNIGHT_EG: [i32; 64] = [
    -50, -30, -20, -20, -20, -20, -30, -50,
    -30, -10,   0,   5,   5,   0, -10, -30,
    -20,   0,  10,  15,  15,  10,   0, -20,
    -20,   5,  15,  20,  20,  15,   5, -20,
    -20,   5,  15,  20,  20,  15,   5, -20,
    -20,   0,  10,  15,  15,  10,   0, -20,
    -30, -10,   0,   5,   5,   0, -10, -30,
    -50, -30, -20, -20, -20, -20, -30, -50,
];
#[rustfmt::skip]
const BISHOP_MG: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];
#[rustfmt::skip]
const BISHOP_EG: [i32; 64] = [
    -15, -10, -10, -10, -10, -10, -10, -15,
    -10,   0,   0,   5,   5,   0,   0, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,   5,  10,  15,  15,  10,   5, -10,
    -10,   5,  10,  15,  15,  10,   5, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,   0,   0,   5,   5,   0,   0, -10,
    -15, -10, -10, -10, -10, -10, -10, -15,
];
#[rustfmt::skip]
const ROOK_MG: [i32; 64] = [
      0,   0,   0,   5,   5,   0,   0,   0,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      5,  10,  10,  10,  10,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
];
#[rustfmt::skip]
const ROOK_EG: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      0,   5,   5,   5,   5,   5,   5,   0,
      0,   5,   5,   5,   5,   5,   5,   0,
      0,   5,   5,   5,   5,   5,   5,   0,
      0,   5,   5,   5,   5,   5,   5,   0,
      0,   5,   5,   5,   5,   5,   5,   0,
      5,  10,  10,  10,  10,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
];
#[rustfmt::skip]
const QUEEN_MG: [i32; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   5,   0,   0,   5,   0, -10,
    -10,   5,   5,   5,   5,   5,   5, -10,
     -5,   0,   5,   5,   5,   5,   0,  -5,
     -5,   0,   5,   5,   5,   5,   0,  -5,
    -10,   5,   5,   5,   5,   5,   5, -10,
    -10,   0,   5,   0,   0,   5,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];
#[rustfmt::skip]
const QUEEN_EG: [i32; 64] = [
    -10,  -5,  -5,  -5,  -5,  -5,  -5, -10,
     -5,   0,   5,   5,   5,   5,   0,  -5,
     -5,   5,  10,  10,  10,  10,   5,  -5,
     -5,   5,  10,  15,  15,  10,   5,  -5,
     -5,   5,  10,  15,  15,  10,   5,  -5,
     -5,   5,  10,  10,  10,  10,   5,  -5,
     -5,   0,   5,   5,   5,   5,   0,  -5,
    -10,  -5,  -5,  -5,  -5,  -5,  -5, -10,
];
#[rustfmt::skip]
const KING_MG: [i32; 64] = [
     20,  30,  10,   0,   0,  10,  30,  20,
     20,  20,   0,   0,   0,   0,  20,  20,
    -10, -20, -20, -20, -20, -20, -20, -10,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
];
#[rustfmt::skip]
const KING_EG: [i32; 64] = [
    -50, -30, -30, -30, -30, -30, -30, -50,
    -30, -20, -10,   0,   0, -10, -20, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -20, -10,   0,   0, -10, -20, -30,
    -50, -30, -30, -30, -30, -30, -30, -50,
];

fn tables_for(kind: PieceKind) -> (&'static [i32; 64], &'static [i32; 64]) {
    match kind {
        PieceKind::Pawn => (&PAWN_MG, &PAWN_EG),
        PieceKind::Knight => (&KNIGHT_MG, &KNIGHT_EG),
        PieceKind::Bishop => (&BISHOP_MG, &BISHOP_EG),
        PieceKind::Rook => (&ROOK_MG, &ROOK_EG),
        PieceKind::Queen => (&QUEEN_MG, &QUEEN_EG),
        PieceKind::King => (&KING_MG, &KING_EG),
    }
}

lazy_static! {
    /// Manhattan distance between every pair of squares.
    static ref MANHATTAN: [[i32; 64]; 64] = {
        let mut t = [[0i32; 64]; 64];
        for a in 0..64usize {
            for b in 0..64usize {
                let df = (file_of(a as u8) as i32 - file_of(b as u8) as i32).abs();
                let dr = (rank_of(a as u8) as i32 - rank_of(b as u8) as i32).abs();
                t[a][b] = df + dr;
            }
        }
        t
    };
    /// Manhattan distance from the four centre squares.
    static ref CENTER_MANHATTAN: [i32; 64] = {
        let mut t = [0i32; 64];
        for s in 0..64usize {
            let f = file_of(s as u8) as i32;
            let r = rank_of(s as u8) as i32;
            t[s] = (3 - f).max(f - 4) + (3 - r).max(r - 4);
        }
        t
    };
}

/// Static score of the position from the side to move's perspective.
/// Deterministic, never fails; drawn-material detection is the caller's job.
pub fn evaluate(b: &Board) -> Score {
    let ph = phase(b);
    let mut score = 0f64;

    let mut pawn_files = [[0u8; 8]; 2];
    let mut king_sq = [0u8; 2];
    for i in 0..64u8 {
        if let Some(p) = b.piece_at(i) {
            let si = p.side.index();
            let sign = if p.side == Side::White { 1.0 } else { -1.0 };
            let tbl_idx = if p.side == Side::White {
                i as usize
            } else {
                (i ^ 56) as usize
            };
            let (mg, eg) = tables_for(p.kind);
            score += sign * piece_value(p.kind) as f64;
            score += sign * (mg[tbl_idx] as f64 * (1.0 - ph) + eg[tbl_idx] as f64 * ph);
            match p.kind {
                PieceKind::Pawn => pawn_files[si][file_of(i)] += 1,
                PieceKind::King => king_sq[si] = i,
                _ => {}
            }
        }
    }

    let white_mob = mobility_attacks(b, Side::White).count_ones() as i32;
    let black_mob = mobility_attacks(b, Side::Black).count_ones() as i32;
    score += (white_mob - black_mob) as f64;

    score += pawn_structure(b, Side::White, &pawn_files) as f64;
    score -= pawn_structure(b, Side::Black, &pawn_files) as f64;

    // Mop-up: in won endgames, drive the losing king to the edge and bring
    // the winning king up to it.
    if score.abs() > 200.0 && ph > 0.5 {
        let p = PARAMS.read();
        let (winner, loser) = if score > 0.0 { (0, 1) } else { (1, 0) };
        let edge = p.mopup_edge_weight * CENTER_MANHATTAN[king_sq[loser] as usize];
        let chase = p.mopup_chase_weight
            * (14 - MANHATTAN[king_sq[winner] as usize][king_sq[loser] as usize]);
        let mopup = (edge + chase) as f64 * ph;
        score += if score > 0.0 { mopup } else { -mopup };
    }

    let white_pov = score.round() as Score;
    if b.stm == Side::White {
        white_pov
    } else {
        -white_pov
    }
}

fn pawn_structure(b: &Board, side: Side, pawn_files: &[[u8; 8]; 2]) -> i32 {
    let p = PARAMS.read();
    let us = side.index();
    let them = 1 - us;
    let mut total = 0i32;

    for f in 0..8 {
        if pawn_files[us][f] > 1 {
            total += (pawn_files[us][f] - 1) as i32 * p.doubled_pawn;
        }
    }

    for i in 0..64u8 {
        let Some(pc) = b.piece_at(i) else { continue };
        if pc.side != side || pc.kind != PieceKind::Pawn {
            continue;
        }
        let f = file_of(i);
        let r = rank_of(i) as i32;
        let rel_rank = (if side == Side::White { r } else { 7 - r }) as usize;

        let friendly_adjacent = adjacent_files(pawn_files, us, f);
        let enemy_adjacent = adjacent_files(pawn_files, them, f);
        if friendly_adjacent == 0 {
            total += p.isolated_pawn;
            if enemy_adjacent > 0 {
                total += p.backward_pawn;
            }
        }

        let connected = pawn_defended(b, i, side);
        if connected {
            total += p.connected_pawn;
        }

        if is_passed(b, i, side) {
            let mut bonus = p.passed_pawn[rel_rank.min(7)];
            if connected {
                bonus += p.passed_connected;
            }
            total += bonus;
        }
    }
    total
}

#[inline]
fn adjacent_files(pawn_files: &[[u8; 8]; 2], side: usize, f: usize) -> u8 {
    let left = if f > 0 { pawn_files[side][f - 1] } else { 0 };
    let right = if f < 7 { pawn_files[side][f + 1] } else { 0 };
    left + right
}

fn pawn_defended(b: &Board, sq: u8, side: Side) -> bool {
    let f = file_of(sq) as i32;
    let r = rank_of(sq) as i32;
    let behind = if side == Side::White { -1 } else { 1 };
    for df in [-1, 1] {
        if let Some(t) = crate::types::sq(f + df, r + behind) {
            if matches!(b.piece_at(t), Some(p) if p.side == side && p.kind == PieceKind::Pawn) {
                return true;
            }
        }
    }
    false
}

fn is_passed(b: &Board, sq: u8, side: Side) -> bool {
    let f = file_of(sq) as i32;
    let r = rank_of(sq) as i32;
    let dir = if side == Side::White { 1 } else { -1 };
    let mut nr = r + dir;
    while (0..8).contains(&nr) {
        for df in [-1, 0, 1] {
            if let Some(t) = crate::types::sq(f + df, nr) {
                if matches!(b.piece_at(t), Some(p) if p.side != side && p.kind == PieceKind::Pawn) {
                    return false;
                }
            }
        }
        nr += dir;
    }
    true
}
