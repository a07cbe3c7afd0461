use parking_lot::Mutex;
use solaris::uci::Uci;
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

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

fn bestmove_of(text: &str) -> Option<String> {
    text.lines()
        .find_map(|l| l.strip_prefix("bestmove "))
        .map(|rest| rest.split_whitespace().next().unwrap().to_string())
}

#[test]
fn movetime_is_respected() {
    let buf = SharedBuf::default();
    let mut uci = Uci::with_sink(Box::new(buf.clone()));
    uci.handle_command("position startpos");
    let start = Instant::now();
    uci.handle_command("go movetime 200");
    uci.wait_for_search();
    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_millis(160),
        "returned too early: {:?}",
        elapsed
    );
    assert!(
        elapsed <= Duration::from_millis(400),
        "over budget: {:?}",
        elapsed
    );
    let text = buf.text();
    assert!(text.contains("info depth 1"), "no iteration report: {}", text);
    let best = bestmove_of(&text).expect("bestmove line");
    assert_ne!(best, "0000");
}

#[test]
fn movetime_one_still_answers() {
    let buf = SharedBuf::default();
    let mut uci = Uci::with_sink(Box::new(buf.clone()));
    uci.handle_command("position startpos");
    uci.handle_command("go movetime 1");
    uci.wait_for_search();
    let best = bestmove_of(&buf.text()).expect("bestmove line");
    assert_ne!(best, "0000");
}

#[test]
fn infinite_search_stops_on_stop() {
    let buf = SharedBuf::default();
    let mut uci = Uci::with_sink(Box::new(buf.clone()));
    uci.handle_command("position startpos");
    uci.handle_command("go infinite");
    thread::sleep(Duration::from_millis(80));
    uci.handle_command("stop");
    let text = buf.text();
    let best = bestmove_of(&text).expect("bestmove after stop");
    assert_ne!(best, "0000");
}

#[test]
fn clock_search_returns_promptly() {
    let buf = SharedBuf::default();
    let mut uci = Uci::with_sink(Box::new(buf.clone()));
    uci.handle_command("position startpos");
    let start = Instant::now();
    uci.handle_command("go wtime 1000 btime 1000 winc 0 binc 0");
    uci.wait_for_search();
    // sudden-death allocation for a 1s clock is the 200 ms floor
    assert!(
        start.elapsed() <= Duration::from_millis(600),
        "clock search overran: {:?}",
        start.elapsed()
    );
    assert!(bestmove_of(&buf.text()).is_some());
}
