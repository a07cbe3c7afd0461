use crate::board::Board;
use crate::eval;
use crate::movegen::legal_moves;
use crate::search::{IterationInfo, Reporter, Search};
use crate::timeman::{Limits, TimeController};
use crate::types::{is_mate_score, mate_in_moves, Move, PieceKind};
use parking_lot::Mutex;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const NAME: &str = "Solaris";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const HASH_MIN_MB: usize = 8;
const HASH_MAX_MB: usize = 2048;
const HASH_DEFAULT_MB: usize = 128;
/// Watcher poll interval; well under the 200 ms staleness bound.
const WATCH_POLL_MS: u64 = 25;

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

struct UciReporter {
    sink: Sink,
}

impl Reporter for UciReporter {
    fn iteration_info(&self, info: &IterationInfo) {
        let score = if is_mate_score(info.score) {
            format!("mate {}", mate_in_moves(info.score))
        } else {
            format!("cp {}", info.score)
        };
        let mut line = format!(
            "info depth {} seldepth {} score {} nodes {} nps {} time {} hashfull {} multipv 1",
            info.depth,
            info.seldepth,
            score,
            info.nodes,
            info.nps,
            info.time_ms,
            info.hashfull
        );
        if !info.pv.is_empty() {
            line.push_str(" pv");
            for m in &info.pv {
                line.push(' ');
                line.push_str(&m.uci());
            }
        }
        let mut out = self.sink.lock();
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }

    fn search_complete(&self, best: Move, ponder: Option<Move>) {
        let mut out = self.sink.lock();
        let best = if best.is_null() {
            "0000".to_string()
        } else {
            best.uci()
        };
        match ponder {
            Some(p) if !p.is_null() => {
                let _ = writeln!(out, "bestmove {} ponder {}", best, p.uci());
            }
            _ => {
                let _ = writeln!(out, "bestmove {}", best);
            }
        }
        let _ = out.flush();
    }
}

pub struct Uci {
    board: Board,
    search: Arc<Mutex<Search>>,
    stop: Arc<AtomicBool>,
    tc: Option<Arc<Mutex<TimeController>>>,
    search_thread: Option<JoinHandle<()>>,
    hash_mb: usize,
    ponder_enabled: bool,
    sink: Sink,
}

impl Default for Uci {
    fn default() -> Self {
        Self::new()
    }
}

impl Uci {
    pub fn new() -> Self {
        Self::with_sink(Box::new(io::stdout()))
    }

    pub fn with_sink(sink: Box<dyn Write + Send>) -> Self {
        let search = Search::new(HASH_DEFAULT_MB);
        let stop = Arc::clone(&search.stop);
        Self {
            board: Board::new_start(),
            search: Arc::new(Mutex::new(search)),
            stop,
            tc: None,
            search_thread: None,
            hash_mb: HASH_DEFAULT_MB,
            ponder_enabled: true,
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    pub fn mainloop(&mut self) {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { continue };
            if !self.handle_command(line.trim()) {
                break;
            }
        }
    }

    fn say(&self, msg: &str) {
        let mut out = self.sink.lock();
        let _ = writeln!(out, "{}", msg);
        let _ = out.flush();
    }

    fn info_string(&self, msg: &str) {
        self.say(&format!("info string {}", msg));
    }

    /// Block until the in-flight search (if any) has emitted `bestmove`.
    pub fn wait_for_search(&mut self) {
        if let Some(handle) = self.search_thread.take() {
            let _ = handle.join();
        }
    }

    /// Cancel and join the in-flight search. `bestmove` is emitted by the
    /// search thread before it exits, never by the canceller.
    fn abort_search(&mut self) {
        if self.search_thread.is_some() {
            self.stop.store(true, Ordering::Relaxed);
            self.wait_for_search();
        }
    }

    /// Process one UCI line; returns false on `quit`.
    pub fn handle_command(&mut self, line: &str) -> bool {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("uci") => {
                self.say(&format!("id name {} {}", NAME, VERSION));
                self.say(&format!("id author the {} authors", NAME));
                self.say(&format!(
                    "option name Hash type spin default {} min {} max {}",
                    HASH_DEFAULT_MB, HASH_MIN_MB, HASH_MAX_MB
                ));
                self.say("option name Ponder type check default true");
                self.say("option name ParamsFile type string default");
                self.say("uciok");
            }
            Some("isready") => self.say("readyok"),
            Some("ucinewgame") => {
                self.abort_search();
                self.search.lock().new_game();
                self.board = Board::new_start();
            }
            Some("position") => {
                self.abort_search();
                self.handle_position(line);
            }
            Some("go") => self.handle_go(line),
            Some("stop") => self.abort_search(),
            Some("ponderhit") => {
                if let Some(tc) = &self.tc {
                    tc.lock().ponder_hit();
                }
            }
            Some("setoption") => self.handle_setoption(line),
            Some("saveparams") => {
                let path = tokens.next().unwrap_or("params.json");
                match crate::params::save_params_to(path) {
                    Ok(()) => self.info_string(&format!("params saved to `{}`", path)),
                    Err(e) => self.info_string(&format!("failed to save params: {}", e)),
                }
            }
            Some("perft") => {
                let depth = tokens.next().and_then(|s| s.parse().ok()).unwrap_or(4);
                let mut b = self.board.clone();
                let nodes = crate::perft::perft(&mut b, depth);
                self.info_string(&format!("perft({}) = {}", depth, nodes));
            }
            Some("d") => {
                let fen = self.board.to_fen();
                self.info_string(&format!("FEN {}", fen));
            }
            Some("quit") => {
                self.abort_search();
                return false;
            }
            Some(other) => self.info_string(&format!("unknown command `{}`", other)),
            None => {}
        }
        true
    }

    fn handle_position(&mut self, cmd: &str) {
        let mut toks = cmd.split_whitespace();
        toks.next();
        match toks.next() {
            Some("startpos") => {
                self.board = Board::new_start();
                if toks.next() == Some("moves") {
                    for m in toks {
                        if !self.play_move_token(m) {
                            break;
                        }
                    }
                }
            }
            Some("fen") => {
                let fen: Vec<&str> = toks.by_ref().take(6).collect();
                if fen.len() != 6 {
                    self.info_string("invalid position command: truncated FEN");
                    return;
                }
                match Board::from_fen(&fen.join(" ")) {
                    Ok(b) => self.board = b,
                    Err(e) => {
                        self.info_string(&format!("invalid FEN: {}", e));
                        return;
                    }
                }
                if toks.next() == Some("moves") {
                    for m in toks {
                        if !self.play_move_token(m) {
                            break;
                        }
                    }
                }
            }
            _ => self.info_string("invalid position command"),
        }
    }

    /// Apply one move token; on failure report it and abandon the rest.
    fn play_move_token(&mut self, token: &str) -> bool {
        let Some(parsed) = parse_uci_move(token) else {
            self.info_string(&format!("unparsable move `{}`", token));
            return false;
        };
        let legal = legal_moves(&mut self.board);
        match legal.iter().find(|&&m| m == parsed) {
            Some(&m) => {
                self.board.make_move(m);
                true
            }
            None => {
                self.info_string(&format!("illegal move `{}`", token));
                false
            }
        }
    }

    fn handle_go(&mut self, cmd: &str) {
        self.abort_search();

        let mut limits = Limits::default();
        let toks: Vec<&str> = cmd.split_whitespace().collect();
        let mut i = 1;
        while i < toks.len() {
            let value = toks.get(i + 1);
            match toks[i] {
                "depth" => {
                    limits.depth = value.and_then(|v| v.parse().ok());
                    i += 2;
                }
                "movetime" => {
                    limits.movetime = value.and_then(|v| v.parse().ok());
                    i += 2;
                }
                "nodes" => {
                    limits.nodes = value.and_then(|v| v.parse().ok());
                    i += 2;
                }
                "movestogo" => {
                    limits.movestogo = value.and_then(|v| v.parse().ok());
                    i += 2;
                }
                "wtime" => {
                    limits.wtime = value.and_then(|v| v.parse().ok());
                    i += 2;
                }
                "btime" => {
                    limits.btime = value.and_then(|v| v.parse().ok());
                    i += 2;
                }
                "winc" => {
                    limits.winc = value.and_then(|v| v.parse().ok()).unwrap_or(0);
                    i += 2;
                }
                "binc" => {
                    limits.binc = value.and_then(|v| v.parse().ok()).unwrap_or(0);
                    i += 2;
                }
                "infinite" => {
                    limits.infinite = true;
                    i += 1;
                }
                "ponder" => {
                    limits.ponder = self.ponder_enabled;
                    i += 1;
                }
                other => {
                    self.info_string(&format!("ignoring go token `{}`", other));
                    i += 1;
                }
            }
        }

        self.stop.store(false, Ordering::Relaxed);
        let phase = eval::phase(&self.board);
        let tc = Arc::new(Mutex::new(TimeController::new(
            &limits,
            self.board.stm,
            phase,
            Arc::clone(&self.stop),
        )));
        self.tc = Some(Arc::clone(&tc));

        let search = Arc::clone(&self.search);
        let stop = Arc::clone(&self.stop);
        let mut board = self.board.clone();
        let reporter = UciReporter {
            sink: Arc::clone(&self.sink),
        };

        let done = Arc::new(AtomicBool::new(false));
        let watcher = {
            let done = Arc::clone(&done);
            let tc = Arc::clone(&tc);
            std::thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    if tc.lock().out_of_time() {
                        stop.store(true, Ordering::Relaxed);
                    }
                    std::thread::sleep(Duration::from_millis(WATCH_POLL_MS));
                }
            })
        };

        self.search_thread = Some(std::thread::spawn(move || {
            search.lock().think(&mut board, &tc, &reporter);
            done.store(true, Ordering::Relaxed);
            let _ = watcher.join();
        }));
    }

    fn handle_setoption(&mut self, cmd: &str) {
        // setoption name <Name> value <Val>
        let mut name = String::new();
        let mut value = String::new();
        let mut it = cmd.split_whitespace();
        it.next();
        if it.next() == Some("name") {
            for tok in it.by_ref() {
                if tok == "value" {
                    break;
                }
                if !name.is_empty() {
                    name.push(' ');
                }
                name.push_str(tok);
            }
            value = it.collect::<Vec<_>>().join(" ");
        }

        if name.eq_ignore_ascii_case("Hash") {
            match value.trim().parse::<usize>() {
                Ok(mb) if (HASH_MIN_MB..=HASH_MAX_MB).contains(&mb) => {
                    self.abort_search();
                    self.search.lock().set_hash_mb(mb);
                    self.hash_mb = mb;
                }
                _ => self.info_string(&format!(
                    "Hash must be {}..{} MB, keeping {} MB",
                    HASH_MIN_MB, HASH_MAX_MB, self.hash_mb
                )),
            }
        } else if name.eq_ignore_ascii_case("Ponder") {
            self.ponder_enabled = value.trim().eq_ignore_ascii_case("true") || value.trim() == "1";
        } else if name.eq_ignore_ascii_case("ParamsFile") {
            let path = value.trim();
            if !path.is_empty() {
                if let Err(e) = crate::params::load_params_from(path) {
                    self.info_string(&format!("failed to load params `{}`: {}", path, e));
                }
            }
        } else {
            self.info_string(&format!("unknown option `{}`", name));
        }
    }
}

fn parse_uci_move(s: &str) -> Option<Move> {
    let b = s.as_bytes();
    if !(4..=5).contains(&b.len()) {
        return None;
    }
    let in_range =
        |c: u8, lo: u8, hi: u8| -> bool { (lo..=hi).contains(&c) };
    if !in_range(b[0], b'a', b'h')
        || !in_range(b[1], b'1', b'8')
        || !in_range(b[2], b'a', b'h')
        || !in_range(b[3], b'1', b'8')
    {
        return None;
    }
    let from = (b[1] - b'1') * 8 + (b[0] - b'a');
    let to = (b[3] - b'1') * 8 + (b[2] - b'a');
    let promo = if b.len() == 5 {
        Some(match b[4].to_ascii_lowercase() {
            b'q' => PieceKind::Queen,
            b'r' => PieceKind::Rook,
            b'b' => PieceKind::Bishop,
            b'n' => PieceKind::Knight,
            _ => return None,
        })
    } else {
        None
    };
    Some(Move { from, to, promo })
}
