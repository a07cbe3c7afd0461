use crate::types::Side;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Subtracted from every budget to cover I/O and scheduling latency.
pub const MARGIN_MS: f64 = 20.0;
pub const MIN_MOVE_TIME_MS: f64 = 200.0;
/// Rough cost multiplier of one more iteration relative to the last one.
pub const BRANCHING_FACTOR_ESTIMATE: u128 = 3;
const MAX_LEAD_MS: f64 = 4000.0;
const MAX_SUDDEN_DEATH_MS: f64 = 500_000.0;

/// Everything the `go` command may constrain a search by.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: u64,
    pub binc: u64,
    pub movestogo: Option<u64>,
    pub movetime: Option<u64>,
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub infinite: bool,
    pub ponder: bool,
}

/// Tracks one in-flight search: when it started, how long the last completed
/// iteration took, and how much time this move may spend. The watcher thread
/// polls it and fires the shared cancellation token when the budget runs out.
pub struct TimeController {
    start: Instant,
    interval_start: Instant,
    last_interval_ms: u128,
    /// Per-move budget in ms; `None` means unbounded.
    allocated: Option<u128>,
    own_time: Option<u128>,
    increment: u128,
    max_depth: Option<i32>,
    max_nodes: Option<u64>,
    movetime: bool,
    pondering: bool,
    stop: Arc<AtomicBool>,
}

impl TimeController {
    pub fn new(limits: &Limits, stm: Side, phase: f64, stop: Arc<AtomicBool>) -> Self {
        let (own, opp, inc) = match stm {
            Side::White => (limits.wtime, limits.btime, limits.winc),
            Side::Black => (limits.btime, limits.wtime, limits.binc),
        };
        let allocated = allocate_ms(limits, own, opp, phase);
        let now = Instant::now();
        TimeController {
            start: now,
            interval_start: now,
            last_interval_ms: 0,
            allocated,
            own_time: own.map(u128::from),
            increment: inc as u128,
            max_depth: limits.depth,
            max_nodes: limits.nodes,
            movetime: limits.movetime.is_some(),
            pondering: limits.ponder,
            stop,
        }
    }

    #[inline]
    pub fn token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    #[inline]
    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    #[inline]
    pub fn allocated_ms(&self) -> Option<u128> {
        self.allocated
    }

    #[inline]
    pub fn is_movetime(&self) -> bool {
        self.movetime
    }

    #[inline]
    pub fn is_pondering(&self) -> bool {
        self.pondering
    }

    /// Mark the start of a new iteration, remembering how long the previous
    /// one took.
    pub fn begin_iteration(&mut self) {
        self.last_interval_ms = self.interval_start.elapsed().as_millis();
        self.interval_start = Instant::now();
    }

    /// The clock only starts running for us once the pondered move is played.
    pub fn ponder_hit(&mut self) {
        self.start = Instant::now();
        self.interval_start = self.start;
        self.pondering = false;
    }

    /// May an iteration at `depth` begin?
    pub fn can_search_deeper(&self, depth: i32, nodes: u64) -> bool {
        if self.pondering {
            return true;
        }
        if self.stop.load(Ordering::Relaxed) {
            return false;
        }
        if let Some(max) = self.max_depth {
            if depth > max {
                return false;
            }
        }
        if let Some(max) = self.max_nodes {
            if nodes >= max {
                return false;
            }
        }
        let Some(allocated) = self.allocated else {
            return true;
        };
        let elapsed = self.elapsed_ms();
        if elapsed > allocated {
            return false;
        }
        let estimate = elapsed + self.last_interval_ms * BRANCHING_FACTOR_ESTIMATE;
        if estimate > allocated + self.increment {
            return false;
        }
        if let Some(own) = self.own_time {
            if estimate > own {
                return false;
            }
        }
        true
    }

    /// Hard in-flight cutoff checked by the watcher: the move budget is gone.
    pub fn out_of_time(&self) -> bool {
        if self.pondering {
            return false;
        }
        match self.allocated {
            Some(allocated) => self.elapsed_ms() >= allocated,
            None => false,
        }
    }
}

/// Per-move budget in milliseconds. `None` means effectively unbounded
/// (infinite analysis, or depth/node-capped searches).
fn allocate_ms(limits: &Limits, own: Option<u64>, opp: Option<u64>, phase: f64) -> Option<u128> {
    if let Some(mt) = limits.movetime {
        return Some((mt as f64 - MARGIN_MS).max(1.0) as u128);
    }
    if limits.infinite {
        return None;
    }
    let own = own? as f64;
    let opp = opp.unwrap_or(0) as f64;
    let lead = ((own - opp) * 0.2).clamp(0.0, MAX_LEAD_MS);
    if let Some(mtg) = limits.movestogo.filter(|&m| m > 0) {
        let slice = own / mtg as f64 - MARGIN_MS + lead;
        return Some(slice.max(1.0) as u128);
    }
    // Sudden death: spend a phase-scaled slice of the remaining clock.
    let t = (own * phase.max(0.6)).clamp(MIN_MOVE_TIME_MS, MAX_SUDDEN_DEATH_MS);
    let slice = (-1e-7 * t * t + 0.07 * t + 100.0).max(MIN_MOVE_TIME_MS) + lead;
    Some(slice as u128)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn movetime_budget_keeps_margin() {
        let limits = Limits {
            movetime: Some(200),
            ..Limits::default()
        };
        let tc = TimeController::new(&limits, Side::White, 0.0, token());
        assert_eq!(tc.allocated_ms(), Some(180));
    }

    #[test]
    fn movestogo_splits_clock() {
        let limits = Limits {
            wtime: Some(60_000),
            btime: Some(60_000),
            movestogo: Some(30),
            ..Limits::default()
        };
        let tc = TimeController::new(&limits, Side::White, 0.0, token());
        assert_eq!(tc.allocated_ms(), Some(1980));
    }

    #[test]
    fn infinite_is_unbounded_until_caps() {
        let limits = Limits {
            infinite: true,
            depth: Some(3),
            ..Limits::default()
        };
        let tc = TimeController::new(&limits, Side::White, 0.0, token());
        assert!(tc.allocated_ms().is_none());
        assert!(tc.can_search_deeper(3, 0));
        assert!(!tc.can_search_deeper(4, 0));
    }

    #[test]
    fn node_cap_blocks_admission() {
        let limits = Limits {
            nodes: Some(1000),
            ..Limits::default()
        };
        let tc = TimeController::new(&limits, Side::White, 0.0, token());
        assert!(tc.can_search_deeper(5, 999));
        assert!(!tc.can_search_deeper(5, 1000));
    }

    #[test]
    fn pondering_always_admits() {
        let limits = Limits {
            wtime: Some(10),
            btime: Some(10),
            ponder: true,
            ..Limits::default()
        };
        let mut tc = TimeController::new(&limits, Side::White, 0.0, token());
        assert!(tc.can_search_deeper(30, u64::MAX - 1));
        assert!(!tc.out_of_time());
        tc.ponder_hit();
        assert!(!tc.is_pondering());
    }

    #[test]
    fn fired_token_blocks_admission() {
        let stop = token();
        let limits = Limits::default();
        let tc = TimeController::new(&limits, Side::White, 0.0, Arc::clone(&stop));
        assert!(tc.can_search_deeper(2, 0));
        stop.store(true, Ordering::Relaxed);
        assert!(!tc.can_search_deeper(2, 0));
    }
}
