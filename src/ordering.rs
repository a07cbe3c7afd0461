use crate::board::Board;
use crate::eval::{piece_value, PAWN_VALUE};
use crate::movegen::{gives_check, legal_moves, pawn_attacks};
use crate::types::{Move, PieceKind, ScoredMove};

pub const TT_MOVE_SCORE: i32 = 100_000_000;
pub const PV_HINT_SCORE: i32 = 1_000_000;
pub const KILLER_0_SCORE: i32 = 10_000;
pub const KILLER_1_SCORE: i32 = 8_000;

/// Generate all legal moves and score them for search order, best first.
/// Killer and history tables belong to the search; the orderer itself is
/// stateless. Relative order within equal scores is unspecified.
pub fn ordered_moves(
    b: &mut Board,
    tt_move: Option<Move>,
    pv_hint: Option<Move>,
    killers: &[Move; 2],
    history: &[[i32; 4096]; 2],
    phase: f64,
) -> Vec<ScoredMove> {
    let moves = legal_moves(b);
    let side = b.stm.index();
    let enemy_pawn_cover = pawn_attacks(b, b.stm.flip());
    // (phase + 1)^4: captures and pushes gain weight as material comes off
    let phase_factor_sq = (phase + 1.0).powi(4);

    let mut scored: Vec<ScoredMove> = Vec::with_capacity(moves.len());
    for mv in moves {
        scored.push((
            score_move(
                b,
                mv,
                tt_move,
                pv_hint,
                killers,
                &history[side],
                phase,
                phase_factor_sq,
                enemy_pawn_cover,
            ),
            mv,
        ));
    }
    scored.sort_by_key(|(s, _)| -*s);
    scored
}

#[allow(clippy::too_many_arguments)]
fn score_move(
    b: &mut Board,
    mv: Move,
    tt_move: Option<Move>,
    pv_hint: Option<Move>,
    killers: &[Move; 2],
    history: &[i32; 4096],
    phase: f64,
    phase_factor_sq: f64,
    enemy_pawn_cover: u64,
) -> i32 {
    if tt_move == Some(mv) {
        return TT_MOVE_SCORE;
    }
    if pv_hint == Some(mv) {
        return PV_HINT_SCORE;
    }
    if killers[0] == mv {
        return KILLER_0_SCORE;
    }
    if killers[1] == mv {
        return KILLER_1_SCORE;
    }

    let mover = match b.piece_at(mv.from) {
        Some(p) => p,
        None => return 0,
    };
    let mut score = 0f64;

    let victim = match b.piece_at(mv.to) {
        Some(v) => Some(v.kind),
        None if Some(mv.to) == b.ep && mover.kind == PieceKind::Pawn => Some(PieceKind::Pawn),
        None => None,
    };
    match victim {
        Some(victim) => {
            let mvv_lva = 10 * piece_value(victim) - 5 * piece_value(mover.kind);
            score += mvv_lva as f64 * phase_factor_sq;
        }
        None => {
            score += history[mv.from as usize * 64 + mv.to as usize] as f64;
        }
    }

    // Checking moves matter more once the board empties out.
    if phase > 0.6 && gives_check(b, mv) {
        score += PAWN_VALUE as f64 * (5.0 * phase + 1.0);
    }

    match mover.kind {
        PieceKind::Pawn => {
            score += PAWN_VALUE as f64 * phase_factor_sq;
            if let Some(promo) = mv.promo {
                score += 5.0 * piece_value(promo) as f64;
            }
        }
        PieceKind::King => {
            score += 20f64.powf(3.0 * phase);
        }
        _ => {}
    }

    if mover.kind != PieceKind::Pawn && enemy_pawn_cover & (1u64 << mv.to) != 0 {
        score -= (5 * piece_value(mover.kind) + 5 * PAWN_VALUE) as f64;
    }

    score.round() as i32
}
