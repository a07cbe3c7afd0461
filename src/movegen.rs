use crate::board::Board;
use crate::types::{sq, Move, PieceKind, Side};
use arrayvec::ArrayVec;
use lazy_static::lazy_static;

/// Upper bound on pseudo-legal moves in any reachable position.
pub const MAX_MOVES: usize = 256;

/// Fixed-capacity move buffer filled in place at each node.
pub type MoveList = ArrayVec<Move, MAX_MOVES>;

lazy_static! {
    static ref KNIGHT_TARGETS: [u64; 64] = {
        let mut arr = [0u64; 64];
        for s in 0u8..64 {
            let f = (s % 8) as i32;
            let r = (s / 8) as i32;
            for (df, dr) in [(1, 2), (2, 1), (-1, 2), (-2, 1), (1, -2), (2, -1), (-1, -2), (-2, -1)]
            {
                if let Some(t) = sq(f + df, r + dr) {
                    arr[s as usize] |= 1u64 << t;
                }
            }
        }
        arr
    };
    static ref KING_TARGETS: [u64; 64] = {
        let mut arr = [0u64; 64];
        for s in 0u8..64 {
            let f = (s % 8) as i32;
            let r = (s / 8) as i32;
            for df in -1..=1 {
                for dr in -1..=1 {
                    if df == 0 && dr == 0 {
                        continue;
                    }
                    if let Some(t) = sq(f + df, r + dr) {
                        arr[s as usize] |= 1u64 << t;
                    }
                }
            }
        }
        arr
    };
}

const DIAG_DIRS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const LINE_DIRS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[inline]
fn add(moves: &mut MoveList, from: u8, to: u8) {
    moves.push(Move {
        from,
        to,
        promo: None,
    });
}

/// All legal moves for the side to move. Legality is checked by making each
/// pseudo-legal move and rejecting those that leave the mover's king en prise.
pub fn legal_moves(b: &mut Board) -> MoveList {
    let mut pseudo = MoveList::new();
    pseudo_legal(b, &mut pseudo);
    let us = b.stm;
    let mut legal = MoveList::new();
    for m in pseudo {
        let u = b.make_move(m);
        if !b.in_check(us) {
            legal.push(m);
        }
        b.unmake_move(m, u);
    }
    legal
}

pub fn pseudo_legal(b: &Board, out: &mut MoveList) {
    let side = b.stm;
    for sqi in 0u8..64 {
        if let Some(p) = b.piece_at(sqi) {
            if p.side != side {
                continue;
            }
            match p.kind {
                PieceKind::Pawn => pawn_moves(b, sqi, side, out),
                PieceKind::Knight => jump_moves(b, sqi, side, KNIGHT_TARGETS[sqi as usize], out),
                PieceKind::King => jump_moves(b, sqi, side, KING_TARGETS[sqi as usize], out),
                PieceKind::Bishop => slider_moves(b, sqi, side, out, &DIAG_DIRS),
                PieceKind::Rook => slider_moves(b, sqi, side, out, &LINE_DIRS),
                PieceKind::Queen => {
                    slider_moves(b, sqi, side, out, &DIAG_DIRS);
                    slider_moves(b, sqi, side, out, &LINE_DIRS);
                }
            }
        }
    }
    castling_moves(b, side, out);
}

fn push_pawn(out: &mut MoveList, from: u8, to: u8, promotes: bool) {
    if promotes {
        for pk in [
            PieceKind::Queen,
            PieceKind::Rook,
            PieceKind::Bishop,
            PieceKind::Knight,
        ] {
            out.push(Move {
                from,
                to,
                promo: Some(pk),
            });
        }
    } else {
        add(out, from, to);
    }
}

fn pawn_moves(b: &Board, s: u8, side: Side, out: &mut MoveList) {
    let file = (s % 8) as i32;
    let rank = (s / 8) as i32;
    let dir = if side == Side::White { 1 } else { -1 };
    let last_rank = if side == Side::White { 7 } else { 0 };
    if let Some(t) = sq(file, rank + dir) {
        if b.piece_at(t).is_none() {
            push_pawn(out, s, t, rank + dir == last_rank);
            let start_rank = if side == Side::White { 1 } else { 6 };
            if rank == start_rank {
                if let Some(t2) = sq(file, rank + 2 * dir) {
                    if b.piece_at(t2).is_none() {
                        add(out, s, t2);
                    }
                }
            }
        }
    }
    for df in [-1, 1] {
        if let Some(t) = sq(file + df, rank + dir) {
            match b.piece_at(t) {
                Some(p) if p.side != side => push_pawn(out, s, t, rank + dir == last_rank),
                None if Some(t) == b.ep => add(out, s, t),
                _ => {}
            }
        }
    }
}

fn jump_moves(b: &Board, s: u8, side: Side, mut targets: u64, out: &mut MoveList) {
    while targets != 0 {
        let t = targets.trailing_zeros() as u8;
        targets &= targets - 1;
        match b.piece_at(t) {
            None => add(out, s, t),
            Some(p) if p.side != side => add(out, s, t),
            _ => {}
        }
    }
}

fn slider_moves(b: &Board, s: u8, side: Side, out: &mut MoveList, dirs: &[(i32, i32)]) {
    let f = (s % 8) as i32;
    let r = (s / 8) as i32;
    for &(df, dr) in dirs {
        let mut nf = f + df;
        let mut nr = r + dr;
        while let Some(t) = sq(nf, nr) {
            match b.piece_at(t) {
                Some(p) => {
                    if p.side != side {
                        add(out, s, t);
                    }
                    break;
                }
                None => add(out, s, t),
            }
            nf += df;
            nr += dr;
        }
    }
}

fn castling_moves(b: &Board, side: Side, out: &mut MoveList) {
    let (e, f, g, d, c, bfile, h, a) = match side {
        Side::White => (4u8, 5u8, 6u8, 3u8, 2u8, 1u8, 7u8, 0u8),
        Side::Black => (60u8, 61u8, 62u8, 59u8, 58u8, 57u8, 63u8, 56u8),
    };
    let Some(k) = b.piece_at(e) else { return };
    if k.side != side || k.kind != PieceKind::King {
        return;
    }
    let them = side.flip();
    let k_right = match side {
        Side::White => b.castle & 1 != 0,
        Side::Black => b.castle & 4 != 0,
    };
    if k_right
        && b.piece_at(f).is_none()
        && b.piece_at(g).is_none()
        && !square_attacked(b, e, them)
        && !square_attacked(b, f, them)
        && !square_attacked(b, g, them)
        && matches!(b.piece_at(h), Some(p) if p.side == side && p.kind == PieceKind::Rook)
    {
        add(out, e, g);
    }
    let q_right = match side {
        Side::White => b.castle & 2 != 0,
        Side::Black => b.castle & 8 != 0,
    };
    if q_right
        && b.piece_at(d).is_none()
        && b.piece_at(c).is_none()
        && b.piece_at(bfile).is_none()
        && !square_attacked(b, e, them)
        && !square_attacked(b, d, them)
        && !square_attacked(b, c, them)
        && matches!(b.piece_at(a), Some(p) if p.side == side && p.kind == PieceKind::Rook)
    {
        add(out, e, c);
    }
}

pub fn square_attacked(b: &Board, s: u8, by: Side) -> bool {
    let f = (s % 8) as i32;
    let r = (s / 8) as i32;
    // pawns attack backwards relative to their push direction
    let dir = if by == Side::White { -1 } else { 1 };
    for df in [-1, 1] {
        if let Some(t) = sq(f + df, r + dir) {
            if matches!(b.piece_at(t), Some(p) if p.side == by && p.kind == PieceKind::Pawn) {
                return true;
            }
        }
    }
    let mut bb = KNIGHT_TARGETS[s as usize];
    while bb != 0 {
        let t = bb.trailing_zeros() as u8;
        bb &= bb - 1;
        if matches!(b.piece_at(t), Some(p) if p.side == by && p.kind == PieceKind::Knight) {
            return true;
        }
    }
    let mut bb = KING_TARGETS[s as usize];
    while bb != 0 {
        let t = bb.trailing_zeros() as u8;
        bb &= bb - 1;
        if matches!(b.piece_at(t), Some(p) if p.side == by && p.kind == PieceKind::King) {
            return true;
        }
    }
    slider_attack(b, s, by, &DIAG_DIRS, true) || slider_attack(b, s, by, &LINE_DIRS, false)
}

fn slider_attack(b: &Board, s: u8, by: Side, dirs: &[(i32, i32)], diag: bool) -> bool {
    let f = (s % 8) as i32;
    let r = (s / 8) as i32;
    for &(df, dr) in dirs {
        let mut nf = f + df;
        let mut nr = r + dr;
        while let Some(t) = sq(nf, nr) {
            if let Some(p) = b.piece_at(t) {
                if p.side == by {
                    let hits = if diag {
                        matches!(p.kind, PieceKind::Bishop | PieceKind::Queen)
                    } else {
                        matches!(p.kind, PieceKind::Rook | PieceKind::Queen)
                    };
                    if hits {
                        return true;
                    }
                }
                break;
            }
            nf += df;
            nr += dr;
        }
    }
    false
}

/// Squares attacked by `side`'s piece standing on `s`, as a bitboard.
pub fn piece_attacks(b: &Board, s: u8, kind: PieceKind, side: Side) -> u64 {
    match kind {
        PieceKind::Knight => KNIGHT_TARGETS[s as usize],
        PieceKind::King => KING_TARGETS[s as usize],
        PieceKind::Pawn => {
            let f = (s % 8) as i32;
            let r = (s / 8) as i32;
            let dir = if side == Side::White { 1 } else { -1 };
            let mut bb = 0u64;
            for df in [-1, 1] {
                if let Some(t) = sq(f + df, r + dir) {
                    bb |= 1u64 << t;
                }
            }
            bb
        }
        PieceKind::Bishop => slider_attack_bits(b, s, &DIAG_DIRS),
        PieceKind::Rook => slider_attack_bits(b, s, &LINE_DIRS),
        PieceKind::Queen => {
            slider_attack_bits(b, s, &DIAG_DIRS) | slider_attack_bits(b, s, &LINE_DIRS)
        }
    }
}

fn slider_attack_bits(b: &Board, s: u8, dirs: &[(i32, i32)]) -> u64 {
    let f = (s % 8) as i32;
    let r = (s / 8) as i32;
    let mut bb = 0u64;
    for &(df, dr) in dirs {
        let mut nf = f + df;
        let mut nr = r + dr;
        while let Some(t) = sq(nf, nr) {
            bb |= 1u64 << t;
            if b.piece_at(t).is_some() {
                break;
            }
            nf += df;
            nr += dr;
        }
    }
    bb
}

/// Union of attack bitboards of `side`'s knights, bishops, rooks and queens.
/// Squares covered twice count once; the evaluator takes the popcount.
pub fn mobility_attacks(b: &Board, side: Side) -> u64 {
    let mut bb = 0u64;
    for s in 0u8..64 {
        if let Some(p) = b.piece_at(s) {
            if p.side == side
                && matches!(
                    p.kind,
                    PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen
                )
            {
                bb |= piece_attacks(b, s, p.kind, side);
            }
        }
    }
    bb
}

/// Union of squares attacked by `side`'s pawns.
pub fn pawn_attacks(b: &Board, side: Side) -> u64 {
    let mut bb = 0u64;
    for s in 0u8..64 {
        if matches!(b.piece_at(s), Some(p) if p.side == side && p.kind == PieceKind::Pawn) {
            bb |= piece_attacks(b, s, PieceKind::Pawn, side);
        }
    }
    bb
}

/// True when `mv` takes an enemy piece, en passant included.
#[inline]
pub fn is_capture(b: &Board, mv: Move) -> bool {
    b.piece_at(mv.to).is_some()
        || (Some(mv.to) == b.ep
            && matches!(b.piece_at(mv.from), Some(p) if p.kind == PieceKind::Pawn))
}

/// True when making `mv` leaves the opponent in check.
pub fn gives_check(b: &mut Board, mv: Move) -> bool {
    let u = b.make_move(mv);
    let check = b.in_check(b.stm);
    b.unmake_move(mv, u);
    check
}
