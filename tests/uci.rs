use parking_lot::Mutex;
use solaris::uci::Uci;
use std::io::Write;
use std::sync::Arc;

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().clone()).expect("uci output should be utf8")
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn uci_with_buf() -> (Uci, SharedBuf) {
    let buf = SharedBuf::default();
    (Uci::with_sink(Box::new(buf.clone())), buf)
}

#[test]
fn handshake_lists_options() {
    let (mut uci, buf) = uci_with_buf();
    uci.handle_command("uci");
    let text = buf.text();
    assert!(text.contains("id name Solaris"));
    assert!(text.contains("option name Hash type spin default 128 min 8 max 2048"));
    assert!(text.contains("option name Ponder type check default true"));
    assert!(text.trim_end().ends_with("uciok"));
}

#[test]
fn isready_replies_readyok() {
    let (mut uci, buf) = uci_with_buf();
    uci.handle_command("isready");
    assert_eq!(buf.text().trim(), "readyok");
}

#[test]
fn position_applies_moves() {
    let (mut uci, buf) = uci_with_buf();
    uci.handle_command("position startpos moves e2e4 e7e5");
    uci.handle_command("d");
    assert!(buf
        .text()
        .contains("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2"));
}

#[test]
fn illegal_move_is_reported_and_ignored() {
    let (mut uci, buf) = uci_with_buf();
    uci.handle_command("position startpos moves e2e5 e7e5");
    let text = buf.text();
    assert!(text.contains("info string illegal move `e2e5`"));
    uci.handle_command("d");
    // the whole move list was abandoned; still at the start position
    assert!(buf
        .text()
        .contains("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"));
}

#[test]
fn unparsable_move_is_reported() {
    let (mut uci, buf) = uci_with_buf();
    uci.handle_command("position startpos moves xyzzy");
    assert!(buf.text().contains("info string unparsable move `xyzzy`"));
}

#[test]
fn oversized_hash_is_rejected_keeping_previous() {
    let (mut uci, buf) = uci_with_buf();
    uci.handle_command("setoption name Hash value 999999");
    assert!(buf.text().contains("Hash must be 8..2048 MB, keeping 128 MB"));
}

#[test]
fn go_depth_one_emits_bestmove() {
    let (mut uci, buf) = uci_with_buf();
    uci.handle_command("position startpos");
    uci.handle_command("go depth 1");
    uci.wait_for_search();
    let text = buf.text();
    assert!(text.contains("info depth 1"));
    let best = text
        .lines()
        .find_map(|l| l.strip_prefix("bestmove "))
        .expect("bestmove line");
    let mv = best.split_whitespace().next().unwrap();
    assert_eq!(mv.len(), 4);
    assert_ne!(mv, "0000");
}

#[test]
fn mate_in_one_is_announced() {
    let (mut uci, buf) = uci_with_buf();
    uci.handle_command("position fen 6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1");
    uci.handle_command("go depth 4");
    uci.wait_for_search();
    let text = buf.text();
    assert!(text.contains("score mate 1"), "missing mate score: {}", text);
    assert!(text.contains("bestmove a1a8"), "wrong bestmove: {}", text);
}

#[test]
fn threefold_repetition_reports_draw_score() {
    let (mut uci, buf) = uci_with_buf();
    uci.handle_command(
        "position fen 8/8/1Q6/1p6/5k2/8/2P3P1/7K b - - 5 101 \
         moves f4g5 h1h2 g5f5 h2h1 f5g5 h1h2 g5f5 h2h1 f5g5",
    );
    uci.handle_command("go depth 1");
    uci.wait_for_search();
    let text = buf.text();
    assert!(text.contains("score cp 0"), "draw not scored 0: {}", text);
    assert!(text.contains("bestmove "));
}

#[test]
fn ucinewgame_resets_the_board() {
    let (mut uci, buf) = uci_with_buf();
    uci.handle_command("position startpos moves e2e4");
    uci.handle_command("ucinewgame");
    uci.handle_command("d");
    assert!(buf
        .text()
        .contains("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"));
}

#[test]
fn perft_command_counts_nodes() {
    let (mut uci, buf) = uci_with_buf();
    uci.handle_command("position startpos");
    uci.handle_command("perft 3");
    assert!(buf.text().contains("perft(3) = 8902"));
}
