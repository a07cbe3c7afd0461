use solaris::uci::Uci;

fn main() {
    let mut uci = Uci::new();
    uci.mainloop();
}
