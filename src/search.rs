use crate::board::Board;
use crate::eval::{self, evaluate, piece_value, QUEEN_VALUE};
use crate::movegen::{is_capture, legal_moves};
use crate::ordering::ordered_moves;
use crate::timeman::TimeController;
use crate::tt::{Bound, TT};
use crate::types::{
    is_mate_score, plies_to_mate, Move, PieceKind, Score, INF, INVALID, MATE,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const MAX_PLY: usize = 128;

/// Aspiration window widths, widened on consecutive fails of the same kind.
const ASPIRATION_WINDOWS: [Score; 7] = [50, 97, 307, 965, 3036, 9546, INF];
/// Quiescence delta-pruning slack: a capture must be able to lift the
/// stand-pat above alpha even after this margin.
const DELTA_MARGIN: Score = 200 + QUEEN_VALUE;
/// Null-move pruning is unsound in pawn endgames; skip it late.
const NULL_MOVE_PHASE_LIMIT: f64 = 0.7;

/// One completed iteration, as handed to the reporter.
pub struct IterationInfo {
    pub depth: i32,
    pub seldepth: usize,
    pub score: Score,
    pub nodes: u64,
    pub nps: u64,
    pub time_ms: u128,
    pub hashfull: usize,
    pub pv: Vec<Move>,
}

/// Sink for search output. The search calls it synchronously from the search
/// thread; the UCI driver's implementation prints protocol lines.
pub trait Reporter: Send + Sync {
    fn iteration_info(&self, info: &IterationInfo);
    fn search_complete(&self, best: Move, ponder: Option<Move>);
}

/// Per-`go` counters. Only `nodes` is shared (the watcher reads it for the
/// `go nodes` cap); the rest are read after the search returns.
#[derive(Clone, Copy, Default)]
pub struct SearchStats {
    pub nodes: u64,
    pub qnodes: u64,
    pub tt_hits: u64,
    pub cutoffs: u64,
    pub seldepth: usize,
}

/// Engine-side search state: the transposition table and the heuristic
/// tables persist across searches within a game and are cleared on
/// `ucinewgame`.
#[derive(Clone)]
pub struct Search {
    pub tt: Arc<Mutex<TT>>,
    pub stop: Arc<AtomicBool>,
    pub node_counter: Arc<AtomicU64>,
    pub stats: SearchStats,
    killers: [[Move; 2]; MAX_PLY],
    history: [[i32; 4096]; 2],
}

impl Search {
    pub fn new(hash_mb: usize) -> Self {
        Search {
            tt: Arc::new(Mutex::new(TT::new(hash_mb))),
            stop: Arc::new(AtomicBool::new(false)),
            node_counter: Arc::new(AtomicU64::new(0)),
            stats: SearchStats::default(),
            killers: [[Move::default(); 2]; MAX_PLY],
            history: [[0; 4096]; 2],
        }
    }

    pub fn set_hash_mb(&mut self, mb: usize) {
        self.tt.lock().set_size(mb);
    }

    pub fn new_game(&mut self) {
        self.tt.lock().clear();
        self.killers = [[Move::default(); 2]; MAX_PLY];
        self.history = [[0; 4096]; 2];
    }

    #[inline]
    fn nodes_visited(&self) -> u64 {
        self.node_counter.load(Ordering::Relaxed)
    }

    #[inline]
    fn count_node(&mut self) {
        self.node_counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn cancelled(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Iterative deepening driver. Returns the best and ponder moves of the
    /// last fully completed iteration; an aborted iteration never overwrites
    /// them.
    pub fn think(
        &mut self,
        b: &mut Board,
        tc: &Arc<Mutex<TimeController>>,
        reporter: &dyn Reporter,
    ) -> (Move, Option<Move>) {
        self.stats = SearchStats::default();
        self.node_counter.store(0, Ordering::Relaxed);
        for side in self.history.iter_mut() {
            for h in side.iter_mut() {
                *h /= 2;
            }
        }
        self.killers = [[Move::default(); 2]; MAX_PLY];
        self.tt.lock().new_search();

        let mut best_move: Option<Move> = None;
        let mut ponder_move: Option<Move> = None;
        let mut best_score: Score = 0;
        let mut prev_pv: Vec<Move> = Vec::new();
        let mut depth = 1i32;

        while depth as usize <= MAX_PLY {
            {
                let mut t = tc.lock();
                if !t.can_search_deeper(depth, self.nodes_visited()) {
                    break;
                }
                t.begin_iteration();
            }

            let (mut alpha, mut beta) = if depth == 1 {
                (-INF, INF)
            } else {
                (
                    best_score - ASPIRATION_WINDOWS[0],
                    best_score + ASPIRATION_WINDOWS[0],
                )
            };
            let mut line = Vec::new();
            let mut score = self.pv_search(b, depth, 0, alpha, beta, &mut line, &prev_pv, false);
            let mut fail = 0usize;
            while score != INVALID && (score <= alpha || score >= beta) {
                if score <= alpha {
                    alpha = alpha.saturating_sub(ASPIRATION_WINDOWS[fail]).max(-INF);
                }
                if score >= beta {
                    beta = beta.saturating_add(ASPIRATION_WINDOWS[fail]).min(INF);
                }
                line.clear();
                score = self.pv_search(b, depth, 0, alpha, beta, &mut line, &prev_pv, false);
                fail = (fail + 1).min(ASPIRATION_WINDOWS.len() - 1);
            }
            if score == INVALID || self.cancelled() {
                break;
            }

            if let Some(&first) = line.first() {
                best_move = Some(first);
                ponder_move = line.get(1).copied();
                prev_pv = line.clone();
            }
            best_score = score;

            let (elapsed, pondering) = {
                let t = tc.lock();
                (t.elapsed_ms(), t.is_pondering())
            };
            let nodes = self.stats.nodes + self.stats.qnodes;
            reporter.iteration_info(&IterationInfo {
                depth,
                seldepth: self.stats.seldepth,
                score,
                nodes,
                nps: (nodes as u128 * 1000 / elapsed.max(1)) as u64,
                time_ms: elapsed,
                hashfull: self.tt.lock().fullness(),
                pv: line.clone(),
            });

            // A forced mate shorter than the horizon cannot improve.
            if is_mate_score(score) && !pondering && plies_to_mate(score) < depth {
                break;
            }
            depth += 1;
        }

        let best = best_move
            .or_else(|| self.root_fallback(b))
            .unwrap_or_default();

        // movetime searches hold the reply until the budget elapses;
        // a stop request releases the hold early.
        {
            let (is_movetime, allocated, elapsed) = {
                let t = tc.lock();
                (t.is_movetime(), t.allocated_ms(), t.elapsed_ms())
            };
            if is_movetime {
                if let Some(allocated) = allocated {
                    let mut remaining = allocated.saturating_sub(elapsed);
                    while remaining > 0 && !self.cancelled() {
                        let slice = remaining.min(10) as u64;
                        std::thread::sleep(Duration::from_millis(slice));
                        remaining = allocated.saturating_sub(tc.lock().elapsed_ms());
                    }
                }
            }
        }

        reporter.search_complete(best, ponder_move);
        (best, ponder_move)
    }

    /// When no iteration finished, fall back to the table's best move for
    /// the root, then to the first legal move.
    fn root_fallback(&self, b: &mut Board) -> Option<Move> {
        let legal = legal_moves(b);
        if legal.is_empty() {
            return None;
        }
        if let Some(e) = self.tt.lock().probe(b.key, 0) {
            if legal.iter().any(|&m| m == e.best) {
                return Some(e.best);
            }
        }
        legal.first().copied()
    }

    #[allow(clippy::too_many_arguments)]
    fn pv_search(
        &mut self,
        b: &mut Board,
        depth: i32,
        ply: usize,
        mut alpha: Score,
        mut beta: Score,
        line: &mut Vec<Move>,
        hint: &[Move],
        last_null: bool,
    ) -> Score {
        if self.cancelled() {
            return INVALID;
        }
        self.stats.nodes += 1;
        self.count_node();

        if b.is_threefold_repetition() || b.is_insufficient_material() || b.is_fifty_move_draw() {
            return 0;
        }
        if ply >= MAX_PLY {
            return evaluate(b);
        }

        // Mate distance pruning: no line from here can beat a shorter mate
        // we already have elsewhere.
        alpha = alpha.max(-MATE + ply as Score);
        beta = beta.min(MATE - ply as Score);
        if alpha >= beta {
            return alpha;
        }

        if depth <= 0 {
            return self.quiescence(b, ply, alpha, beta);
        }

        let mut tt_move: Option<Move> = None;
        if ply > 0 {
            if let Some(e) = self.tt.lock().probe(b.key, ply) {
                self.stats.tt_hits += 1;
                if !e.best.is_null() {
                    tt_move = Some(e.best);
                }
                if e.depth as i32 >= depth {
                    match e.bound {
                        Bound::Exact => {
                            line.clear();
                            if !e.best.is_null() {
                                line.push(e.best);
                            }
                            return e.value;
                        }
                        Bound::Lower => alpha = alpha.max(e.value),
                        Bound::Upper => beta = beta.min(e.value),
                    }
                    if alpha >= beta {
                        return e.value;
                    }
                }
            }
        }

        let in_check = b.in_check(b.stm);
        let node_phase = eval::phase(b);

        if !in_check
            && depth > 3
            && ply > 0
            && !last_null
            && node_phase < NULL_MOVE_PHASE_LIMIT
            && has_non_pawn_material(b)
        {
            let r = if depth > 6 { 4 } else { 3 };
            let u = b.make_null();
            let child = self.zw_search(b, depth - r - 1, ply + 1, 1 - beta, true);
            b.unmake_null(u);
            if child == INVALID {
                return INVALID;
            }
            let score = -child;
            if score >= beta {
                return score;
            }
        }

        let hint_move = hint.first().copied();
        let killers = self.killers[ply.min(MAX_PLY - 1)];
        let moves = ordered_moves(b, tt_move, hint_move, &killers, &self.history, node_phase);
        if moves.is_empty() {
            return if in_check { -(MATE - ply as Score) } else { 0 };
        }

        let side = b.stm.index();
        let mut best_score = -INF;
        let mut best_move = Move::default();
        let mut bound = Bound::Upper;
        let mut child_line: Vec<Move> = Vec::new();

        for (i, &(_, mv)) in moves.iter().enumerate() {
            let quiet = !is_capture(b, mv) && mv.promo.is_none();
            let is_killer = killers.contains(&mv);
            let u = b.make_move(mv);
            let child_in_check = b.in_check(b.stm);

            let score;
            if i == 0 {
                let ext = if child_in_check { 1 } else { 0 };
                let child_hint = if hint_move == Some(mv) && hint.len() > 1 {
                    &hint[1..]
                } else {
                    &[][..]
                };
                child_line.clear();
                let child = self.pv_search(
                    b,
                    depth - 1 + ext,
                    ply + 1,
                    -beta,
                    -alpha,
                    &mut child_line,
                    child_hint,
                    false,
                );
                if child == INVALID {
                    b.unmake_move(mv, u);
                    return INVALID;
                }
                score = -child;
            } else {
                // Late move reduction: trust the ordering and search late
                // quiet moves shallower, re-searching on a surprise.
                let mut d = depth - 1;
                if depth > 3 && quiet && !is_killer && !in_check {
                    d = (depth - 1 - isqrt(i)).max(0);
                }
                let child = self.zw_search(b, d, ply + 1, -alpha, false);
                if child == INVALID {
                    b.unmake_move(mv, u);
                    return INVALID;
                }
                let zw_score = -child;
                if zw_score > alpha && zw_score < beta {
                    let ext = if child_in_check { 1 } else { 0 };
                    child_line.clear();
                    let full = self.pv_search(
                        b,
                        depth - 1 + ext,
                        ply + 1,
                        -beta,
                        -alpha,
                        &mut child_line,
                        &[],
                        false,
                    );
                    if full == INVALID {
                        b.unmake_move(mv, u);
                        return INVALID;
                    }
                    score = -full;
                } else {
                    score = zw_score;
                }
            }
            b.unmake_move(mv, u);

            if self.cancelled() {
                return INVALID;
            }

            if score >= beta {
                self.stats.cutoffs += 1;
                self.tt
                    .lock()
                    .store(b.key, score, Bound::Lower, depth.min(i8::MAX as i32) as i8, mv, ply);
                if quiet {
                    self.record_quiet_cutoff(mv, ply, depth, side);
                }
                return score;
            }
            if score > best_score {
                best_score = score;
                best_move = mv;
                if score > alpha {
                    alpha = score;
                    bound = Bound::Exact;
                    line.clear();
                    line.push(mv);
                    line.extend_from_slice(&child_line);
                }
            }
        }

        self.tt
            .lock()
            .store(b.key, best_score, bound, depth.min(i8::MAX as i32) as i8, best_move, ply);
        best_score
    }

    /// Scout search on the window `[beta - 1, beta]`. No PV collection, no
    /// check extension; quiet-cutoff bookkeeping matches the PV search.
    fn zw_search(
        &mut self,
        b: &mut Board,
        depth: i32,
        ply: usize,
        mut beta: Score,
        last_null: bool,
    ) -> Score {
        if self.cancelled() {
            return INVALID;
        }
        self.stats.nodes += 1;
        self.count_node();

        if b.is_threefold_repetition() || b.is_insufficient_material() || b.is_fifty_move_draw() {
            return 0;
        }
        if ply >= MAX_PLY {
            return evaluate(b);
        }

        let mut alpha = beta - 1;
        alpha = alpha.max(-MATE + ply as Score);
        beta = beta.min(MATE - ply as Score);
        if alpha >= beta {
            return alpha;
        }

        if depth <= 0 {
            return self.quiescence(b, ply, alpha, beta);
        }

        let mut tt_move: Option<Move> = None;
        if let Some(e) = self.tt.lock().probe(b.key, ply) {
            self.stats.tt_hits += 1;
            if !e.best.is_null() {
                tt_move = Some(e.best);
            }
            if e.depth as i32 >= depth {
                let usable = match e.bound {
                    Bound::Exact => true,
                    Bound::Lower => e.value >= beta,
                    Bound::Upper => e.value <= alpha,
                };
                if usable {
                    return e.value;
                }
            }
        }

        let in_check = b.in_check(b.stm);
        let node_phase = eval::phase(b);

        if !in_check
            && depth > 3
            && !last_null
            && node_phase < NULL_MOVE_PHASE_LIMIT
            && has_non_pawn_material(b)
        {
            let r = if depth > 6 { 4 } else { 3 };
            let u = b.make_null();
            let child = self.zw_search(b, depth - r - 1, ply + 1, 1 - beta, true);
            b.unmake_null(u);
            if child == INVALID {
                return INVALID;
            }
            let score = -child;
            if score >= beta {
                return score;
            }
        }

        let killers = self.killers[ply.min(MAX_PLY - 1)];
        let moves = ordered_moves(b, tt_move, None, &killers, &self.history, node_phase);
        if moves.is_empty() {
            return if in_check { -(MATE - ply as Score) } else { 0 };
        }

        let side = b.stm.index();
        let mut best_score = -INF;
        let mut best_move = Move::default();

        for (i, &(_, mv)) in moves.iter().enumerate() {
            let quiet = !is_capture(b, mv) && mv.promo.is_none();
            let is_killer = killers.contains(&mv);
            let u = b.make_move(mv);

            let mut d = depth - 1;
            if i > 0 && depth > 3 && quiet && !is_killer && !in_check {
                d = (depth - 1 - isqrt(i)).max(0);
            }
            let child = self.zw_search(b, d, ply + 1, 1 - beta, false);
            if child == INVALID {
                b.unmake_move(mv, u);
                return INVALID;
            }
            let mut score = -child;
            if score >= beta && d < depth - 1 {
                // reduced move surprised us; verify at full depth
                let full = self.zw_search(b, depth - 1, ply + 1, 1 - beta, false);
                if full == INVALID {
                    b.unmake_move(mv, u);
                    return INVALID;
                }
                score = -full;
            }
            b.unmake_move(mv, u);

            if self.cancelled() {
                return INVALID;
            }

            if score >= beta {
                self.stats.cutoffs += 1;
                self.tt
                    .lock()
                    .store(b.key, score, Bound::Lower, depth.min(i8::MAX as i32) as i8, mv, ply);
                if quiet {
                    self.record_quiet_cutoff(mv, ply, depth, side);
                }
                return score;
            }
            if score > best_score {
                best_score = score;
                best_move = mv;
            }
        }

        self.tt
            .lock()
            .store(b.key, best_score, Bound::Upper, depth.min(i8::MAX as i32) as i8, best_move, ply);
        best_score
    }

    /// Captures-and-promotions search past the horizon. The side to move may
    /// always stand pat.
    fn quiescence(&mut self, b: &mut Board, ply: usize, mut alpha: Score, beta: Score) -> Score {
        if self.cancelled() {
            return INVALID;
        }
        self.stats.qnodes += 1;
        self.count_node();
        self.stats.seldepth = self.stats.seldepth.max(ply);

        if b.is_insufficient_material() {
            return 0;
        }
        if ply >= MAX_PLY {
            return evaluate(b);
        }

        let mut tt_move: Option<Move> = None;
        if let Some(e) = self.tt.lock().probe(b.key, ply) {
            self.stats.tt_hits += 1;
            if !e.best.is_null() {
                tt_move = Some(e.best);
            }
            let usable = match e.bound {
                Bound::Exact => true,
                Bound::Lower => e.value >= beta,
                Bound::Upper => e.value <= alpha,
            };
            if e.depth >= 0 && usable {
                return e.value;
            }
        }

        let stand_pat = evaluate(b);
        if stand_pat >= beta {
            return stand_pat;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let node_phase = eval::phase(b);
        let killers = self.killers[ply.min(MAX_PLY - 1)];
        let moves = ordered_moves(b, tt_move, None, &killers, &self.history, node_phase);
        if moves.is_empty() {
            return if b.in_check(b.stm) {
                -(MATE - ply as Score)
            } else {
                0
            };
        }

        let orig_alpha = alpha;
        let mut best_move = Move::default();
        for &(_, mv) in &moves {
            let captured = match b.piece_at(mv.to) {
                Some(v) => Some(v.kind),
                None if Some(mv.to) == b.ep
                    && matches!(b.piece_at(mv.from), Some(p) if p.kind == PieceKind::Pawn) =>
                {
                    Some(PieceKind::Pawn)
                }
                None => None,
            };
            if captured.is_none() && mv.promo.is_none() {
                continue;
            }
            // Delta pruning: even winning this piece cannot rescue alpha.
            let gain = captured.map(piece_value).unwrap_or(0);
            if stand_pat + DELTA_MARGIN + gain <= alpha {
                continue;
            }

            let u = b.make_move(mv);
            let child = self.quiescence(b, ply + 1, -beta, -alpha);
            b.unmake_move(mv, u);
            if child == INVALID {
                return INVALID;
            }
            let score = -child;

            if score > alpha {
                alpha = score;
                best_move = mv;
                if alpha >= beta {
                    self.stats.cutoffs += 1;
                    self.tt.lock().store(b.key, score, Bound::Lower, 0, mv, ply);
                    return score;
                }
            }
        }

        let bound = if alpha > orig_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt.lock().store(b.key, alpha, bound, 0, best_move, ply);
        alpha
    }

    fn record_quiet_cutoff(&mut self, mv: Move, ply: usize, depth: i32, side: usize) {
        let k = &mut self.killers[ply.min(MAX_PLY - 1)];
        if k[0] != mv {
            k[1] = k[0];
            k[0] = mv;
        }
        let idx = mv.from as usize * 64 + mv.to as usize;
        let bonus = depth.max(1) * depth.max(1);
        self.history[side][idx] = self.history[side][idx].saturating_add(bonus);
    }
}

fn has_non_pawn_material(b: &Board) -> bool {
    for i in 0..64u8 {
        if let Some(p) = b.piece_at(i) {
            if p.side == b.stm && !matches!(p.kind, PieceKind::Pawn | PieceKind::King) {
                return true;
            }
        }
    }
    false
}

#[inline]
fn isqrt(i: usize) -> i32 {
    (i as f64).sqrt() as i32
}
