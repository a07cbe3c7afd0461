use parking_lot::Mutex;
use solaris::board::Board;
use solaris::movegen::legal_moves;
use solaris::search::{IterationInfo, Reporter, Search};
use solaris::timeman::{Limits, TimeController};
use solaris::types::{is_mate_score, mate_in_moves, Move, Score};
use std::sync::Arc;

#[derive(Default)]
struct Collect {
    iterations: Mutex<Vec<(i32, Score, Vec<Move>)>>,
}

impl Reporter for Collect {
    fn iteration_info(&self, info: &IterationInfo) {
        self.iterations
            .lock()
            .push((info.depth, info.score, info.pv.clone()));
    }

    fn search_complete(&self, _best: Move, _ponder: Option<Move>) {}
}

fn search_to_depth(fen: &str, depth: i32) -> (Move, Vec<(i32, Score, Vec<Move>)>) {
    let mut board = Board::from_fen(fen).unwrap();
    let mut search = Search::new(16);
    let limits = Limits {
        depth: Some(depth),
        ..Limits::default()
    };
    let tc = Arc::new(Mutex::new(TimeController::new(
        &limits,
        board.stm,
        solaris::eval::phase(&board),
        Arc::clone(&search.stop),
    )));
    let reporter = Collect::default();
    let (best, _ponder) = search.think(&mut board, &tc, &reporter);
    (best, reporter.iterations.into_inner())
}

#[test]
fn startpos_depth_one_plays_an_opening_move() {
    let (best, iters) = search_to_depth(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        1,
    );
    let mut b = Board::new_start();
    assert!(legal_moves(&mut b).contains(&best));
    let (depth, score, _) = iters.last().expect("one iteration");
    assert_eq!(*depth, 1);
    assert!(score.abs() <= 100, "startpos score off balance: {}", score);
}

#[test]
fn finds_back_rank_mate_in_one() {
    let (best, iters) = search_to_depth("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 4);
    assert_eq!(best.uci(), "a1a8");
    let (_, score, _) = iters.last().unwrap();
    assert!(is_mate_score(*score));
    assert_eq!(mate_in_moves(*score), 1);
}

#[test]
fn mate_distance_is_stable_across_iterations() {
    let (_, iters) = search_to_depth("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 4);
    for (_, score, _) in &iters {
        assert!(is_mate_score(*score));
        assert_eq!(mate_in_moves(*score), 1);
    }
}

#[test]
fn threefold_repetition_scores_zero() {
    let mut b =
        Board::from_fen("8/8/1Q6/1p6/5k2/8/2P3P1/7K b - - 5 101").unwrap();
    let moves = [
        "f4g5", "h1h2", "g5f5", "h2h1", "f5g5", "h1h2", "g5f5", "h2h1", "f5g5",
    ];
    for (i, m) in moves.iter().enumerate() {
        let parsed = legal_moves(&mut b)
            .into_iter()
            .find(|mv| mv.uci() == *m)
            .unwrap_or_else(|| panic!("move {} not legal", m));
        b.make_move(parsed);
        if i + 1 < moves.len() {
            assert!(
                !b.is_threefold_repetition(),
                "premature repetition after {}",
                m
            );
        }
    }
    assert!(b.is_threefold_repetition());

    let mut search = Search::new(16);
    let limits = Limits {
        depth: Some(1),
        ..Limits::default()
    };
    let tc = Arc::new(Mutex::new(TimeController::new(
        &limits,
        b.stm,
        solaris::eval::phase(&b),
        Arc::clone(&search.stop),
    )));
    let reporter = Collect::default();
    let (best, _) = search.think(&mut b.clone(), &tc, &reporter);
    let iters = reporter.iterations.into_inner();
    assert_eq!(iters.last().unwrap().1, 0, "repetition must score as draw");
    assert!(legal_moves(&mut b).contains(&best));
}

#[test]
fn quiescence_sees_the_pawn_recapture() {
    // After 1. d4 e5 the depth-1 search must not believe a pawn is free:
    // quiescence resolves the exchange on d4/e5.
    let (_, iters) = search_to_depth(
        "rnbqkbnr/pppp1ppp/8/4p3/3P4/8/PPP1PPPP/RNBQKBNR w KQkq e6 0 1",
        1,
    );
    let (_, score, _) = iters.last().unwrap();
    assert!(
        (-150..=250).contains(score),
        "depth-1 score not exchange-aware: {}",
        score
    );
}

#[test]
fn search_counters_are_maintained() {
    let mut board =
        Board::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3")
            .unwrap();
    let mut search = Search::new(16);
    let limits = Limits {
        depth: Some(4),
        ..Limits::default()
    };
    let tc = Arc::new(Mutex::new(TimeController::new(
        &limits,
        board.stm,
        solaris::eval::phase(&board),
        Arc::clone(&search.stop),
    )));
    let reporter = Collect::default();
    search.think(&mut board, &tc, &reporter);
    let stats = search.stats;
    assert!(stats.nodes > 0);
    assert!(stats.qnodes > 0, "quiescence never reached");
    assert!(stats.cutoffs > 0, "no beta cutoffs at depth 4");
    assert!(stats.tt_hits > 0, "no transposition hits at depth 4");
    assert!(stats.seldepth >= 4, "seldepth {} below depth", stats.seldepth);
}

#[test]
fn aborted_search_falls_back_to_a_legal_move() {
    let mut board = Board::new_start();
    let mut search = Search::new(16);
    // token already fired: no iteration can be admitted
    search
        .stop
        .store(true, std::sync::atomic::Ordering::Relaxed);
    let limits = Limits {
        depth: Some(5),
        ..Limits::default()
    };
    let tc = Arc::new(Mutex::new(TimeController::new(
        &limits,
        board.stm,
        0.0,
        Arc::clone(&search.stop),
    )));
    let reporter = Collect::default();
    let (best, _) = search.think(&mut board, &tc, &reporter);
    assert!(reporter.iterations.lock().is_empty());
    let mut b = Board::new_start();
    assert!(legal_moves(&mut b).contains(&best));
}
