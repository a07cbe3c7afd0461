use crate::types::{file_of, Move, Piece, PieceKind, Side};
use crate::zobrist::ZOBRIST;

/// Mailbox board with incremental Zobrist key and a key history used for
/// repetition detection. The search borrows it immutably between make/unmake
/// and mutably only during make/unmake.
#[derive(Clone)]
pub struct Board {
    pub pieces: [Option<Piece>; 64],
    pub stm: Side,
    pub castle: u8, // bit0 K, bit1 Q, bit2 k, bit3 q
    pub ep: Option<u8>,
    pub halfmove: u32,
    pub fullmove: u32,
    pub key: u64,
    /// Zobrist keys of every position reached since this board was set up,
    /// the current position last.
    history: Vec<u64>,
    /// Occurrences of the current position among the reachable history,
    /// current occurrence included. Maintained on make/unmake so draw checks
    /// never rescan per node.
    repetitions: u32,
}

pub struct Undo {
    pub captured: Option<Piece>,
    pub old_ep: Option<u8>,
    pub old_half: u32,
    pub old_full: u32,
    pub old_castle: u8,
    pub old_key: u64,
    pub old_reps: u32,
    pub ep_captured_sq: Option<usize>,
    pub castle_rook_from: Option<usize>,
    pub castle_rook_to: Option<usize>,
    pub is_castle: bool,
    pub is_ep: bool,
}

pub struct NullUndo {
    pub old_ep: Option<u8>,
    pub old_half: u32,
    pub old_key: u64,
    pub old_reps: u32,
}

impl Board {
    pub fn new_start() -> Self {
        Self::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap()
    }

    pub fn from_fen(fen: &str) -> anyhow::Result<Self> {
        let mut pieces = [None; 64];
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() != 6 {
            anyhow::bail!("bad FEN: expected 6 fields");
        }
        let mut idx: i32 = 56; // a8
        for c in parts[0].chars() {
            match c {
                '/' => idx -= 16,
                '1'..='8' => idx += c as i32 - '0' as i32,
                p => {
                    if !(0..64).contains(&idx) {
                        anyhow::bail!("bad FEN: board overflow");
                    }
                    let side = if p.is_ascii_uppercase() {
                        Side::White
                    } else {
                        Side::Black
                    };
                    let kind = match p.to_ascii_lowercase() {
                        'p' => PieceKind::Pawn,
                        'n' => PieceKind::Knight,
                        'b' => PieceKind::Bishop,
                        'r' => PieceKind::Rook,
                        'q' => PieceKind::Queen,
                        'k' => PieceKind::King,
                        _ => anyhow::bail!("bad FEN: unknown piece `{}`", p),
                    };
                    pieces[idx as usize] = Some(Piece { side, kind });
                    idx += 1;
                }
            }
        }
        let stm = if parts[1] == "w" { Side::White } else { Side::Black };
        let mut castle = 0u8;
        if parts[2].contains('K') {
            castle |= 1;
        }
        if parts[2].contains('Q') {
            castle |= 2;
        }
        if parts[2].contains('k') {
            castle |= 4;
        }
        if parts[2].contains('q') {
            castle |= 8;
        }
        let ep = if parts[3] != "-" {
            let b = parts[3].as_bytes();
            if b.len() != 2 {
                anyhow::bail!("bad FEN: en passant square");
            }
            let f = b[0] as i32 - 'a' as i32;
            let r = b[1] as i32 - '1' as i32;
            crate::types::sq(f, r)
        } else {
            None
        };
        let halfmove: u32 = parts[4].parse().unwrap_or(0);
        let fullmove: u32 = parts[5].parse().unwrap_or(1);
        let mut b = Self {
            pieces,
            stm,
            castle,
            ep,
            halfmove,
            fullmove,
            key: 0,
            history: Vec::with_capacity(256),
            repetitions: 1,
        };
        b.recompute_key();
        b.history.push(b.key);
        Ok(b)
    }

    pub fn to_fen(&self) -> String {
        let mut s = String::new();
        for r in (0..8).rev() {
            let mut empty = 0;
            for f in 0..8 {
                match self.pieces[r * 8 + f] {
                    None => empty += 1,
                    Some(p) => {
                        if empty > 0 {
                            s.push_str(&empty.to_string());
                            empty = 0;
                        }
                        let c = match p.kind {
                            PieceKind::Pawn => 'p',
                            PieceKind::Knight => 'n',
                            PieceKind::Bishop => 'b',
                            PieceKind::Rook => 'r',
                            PieceKind::Queen => 'q',
                            PieceKind::King => 'k',
                        };
                        s.push(if p.side == Side::White {
                            c.to_ascii_uppercase()
                        } else {
                            c
                        });
                    }
                }
            }
            if empty > 0 {
                s.push_str(&empty.to_string());
            }
            if r > 0 {
                s.push('/');
            }
        }
        s.push(' ');
        s.push(if self.stm == Side::White { 'w' } else { 'b' });
        s.push(' ');
        let mut c = String::new();
        if self.castle & 1 != 0 {
            c.push('K');
        }
        if self.castle & 2 != 0 {
            c.push('Q');
        }
        if self.castle & 4 != 0 {
            c.push('k');
        }
        if self.castle & 8 != 0 {
            c.push('q');
        }
        if c.is_empty() {
            c.push('-');
        }
        s.push_str(&c);
        s.push(' ');
        if let Some(ep) = self.ep {
            s.push((b'a' + ep % 8) as char);
            s.push((b'1' + ep / 8) as char);
        } else {
            s.push('-');
        }
        s.push(' ');
        s.push_str(&self.halfmove.to_string());
        s.push(' ');
        s.push_str(&self.fullmove.to_string());
        s
    }

    #[inline]
    pub fn piece_at(&self, sq: u8) -> Option<Piece> {
        self.pieces[sq as usize]
    }

    pub fn king_square(&self, side: Side) -> Option<u8> {
        (0u8..64).find(|&i| {
            matches!(self.piece_at(i), Some(p) if p.side == side && p.kind == PieceKind::King)
        })
    }

    fn recompute_key(&mut self) {
        let mut k = 0u64;
        for i in 0..64 {
            if let Some(p) = self.pieces[i] {
                k ^= ZOBRIST.piece_key(p, i as u8);
            }
        }
        if self.stm == Side::White {
            k ^= ZOBRIST.stm;
        }
        k ^= ZOBRIST.castle[self.castle as usize];
        k ^= ZOBRIST.ep_key(self.ep);
        self.key = k;
    }

    /// Recount occurrences of the current key among positions reachable
    /// without crossing an irreversible move. Same side to move implies the
    /// match is two plies apart, so the scan steps by 2.
    fn recount_repetitions(&mut self) {
        let mut reps = 1u32;
        let len = self.history.len();
        let span = (self.halfmove as usize).min(len.saturating_sub(1));
        let mut back = 2;
        while back <= span {
            if self.history[len - 1 - back] == self.key {
                reps += 1;
            }
            back += 2;
        }
        self.repetitions = reps;
    }

    pub fn make_move(&mut self, mv: Move) -> Undo {
        let from = mv.from as usize;
        let to = mv.to as usize;
        let moving = self.pieces[from];
        let mut captured = self.pieces[to];
        let old_ep = self.ep;
        let old_half = self.halfmove;
        let old_full = self.fullmove;
        let old_castle = self.castle;
        let old_key = self.key;
        let old_reps = self.repetitions;
        let side = self.stm;

        self.ep = None;
        if let Some(p) = moving {
            if p.kind == PieceKind::Pawn || captured.is_some() {
                self.halfmove = 0;
            } else {
                self.halfmove += 1;
            }
        }
        if side == Side::Black {
            self.fullmove += 1;
        }

        let mut is_castle = false;
        let mut castle_rook_from: Option<usize> = None;
        let mut castle_rook_to: Option<usize> = None;
        let mut is_ep = false;
        let mut ep_captured_sq: Option<usize> = None;

        if let Some(p) = moving {
            if p.kind == PieceKind::King {
                // Castling is encoded as the king's two-square move.
                if (mv.from == 4 && (mv.to == 6 || mv.to == 2) && side == Side::White)
                    || (mv.from == 60 && (mv.to == 62 || mv.to == 58) && side == Side::Black)
                {
                    is_castle = true;
                    match mv.to {
                        6 => {
                            castle_rook_from = Some(7);
                            castle_rook_to = Some(5);
                        }
                        2 => {
                            castle_rook_from = Some(0);
                            castle_rook_to = Some(3);
                        }
                        62 => {
                            castle_rook_from = Some(63);
                            castle_rook_to = Some(61);
                        }
                        _ => {
                            castle_rook_from = Some(56);
                            castle_rook_to = Some(59);
                        }
                    }
                }
                match side {
                    Side::White => self.castle &= !(1 | 2),
                    Side::Black => self.castle &= !(4 | 8),
                }
            }
            if p.kind == PieceKind::Pawn {
                let from_rank = (mv.from / 8) as i32;
                let to_rank = (mv.to / 8) as i32;
                if (from_rank - to_rank).abs() == 2 {
                    self.ep = Some(((from_rank + to_rank) / 2 * 8) as u8 + mv.from % 8);
                }
                if captured.is_none() && Some(mv.to) == old_ep {
                    is_ep = true;
                    let dir = if side == Side::White { -1 } else { 1 };
                    let cap_sq = (((mv.to / 8) as i32 + dir) * 8 + (mv.to % 8) as i32) as usize;
                    ep_captured_sq = Some(cap_sq);
                    captured = self.pieces[cap_sq];
                }
            }
        }

        let mut key = self.key;
        if let Some(p) = moving {
            key ^= ZOBRIST.piece_key(p, mv.from);
        }
        if let Some(c) = captured {
            let cap_sq = ep_captured_sq.map(|s| s as u8).unwrap_or(mv.to);
            key ^= ZOBRIST.piece_key(c, cap_sq);
        }

        self.pieces[to] = moving;
        self.pieces[from] = None;
        if let Some(csq) = ep_captured_sq {
            self.pieces[csq] = None;
        }

        if let Some(promo) = mv.promo {
            if let Some(mut p) = self.pieces[to] {
                p.kind = promo;
                self.pieces[to] = Some(p);
                key ^= ZOBRIST.piece_key(p, mv.to);
            }
        } else if let Some(p) = self.pieces[to] {
            key ^= ZOBRIST.piece_key(p, mv.to);
        }

        if is_castle {
            if let (Some(rf), Some(rt)) = (castle_rook_from, castle_rook_to) {
                if let Some(rook) = self.pieces[rf] {
                    key ^= ZOBRIST.piece_key(rook, rf as u8);
                    key ^= ZOBRIST.piece_key(rook, rt as u8);
                    self.pieces[rt] = self.pieces[rf];
                    self.pieces[rf] = None;
                }
            }
        }

        // Rook moves or rook captures drop the matching right.
        for sq in [mv.from, mv.to] {
            match sq {
                0 => self.castle &= !2,
                7 => self.castle &= !1,
                56 => self.castle &= !8,
                63 => self.castle &= !4,
                _ => {}
            }
        }

        key ^= ZOBRIST.castle[old_castle as usize] ^ ZOBRIST.castle[self.castle as usize];
        key ^= ZOBRIST.ep_key(old_ep) ^ ZOBRIST.ep_key(self.ep);
        key ^= ZOBRIST.stm;
        self.key = key;
        self.stm = side.flip();

        self.history.push(self.key);
        self.recount_repetitions();

        Undo {
            captured,
            old_ep,
            old_half,
            old_full,
            old_castle,
            old_key,
            old_reps,
            ep_captured_sq,
            castle_rook_from,
            castle_rook_to,
            is_castle,
            is_ep,
        }
    }

    pub fn unmake_move(&mut self, mv: Move, u: Undo) {
        self.stm = self.stm.flip();

        if u.is_castle {
            if let (Some(rf), Some(rt)) = (u.castle_rook_from, u.castle_rook_to) {
                self.pieces[rf] = self.pieces[rt];
                self.pieces[rt] = None;
            }
        }

        let from = mv.from as usize;
        let to = mv.to as usize;
        if let Some(mut p) = self.pieces[to] {
            if mv.promo.is_some() {
                p.kind = PieceKind::Pawn;
            }
            self.pieces[from] = Some(p);
        }
        self.pieces[to] = if u.is_ep { None } else { u.captured };
        if let Some(csq) = u.ep_captured_sq {
            self.pieces[csq] = u.captured;
        }

        self.ep = u.old_ep;
        self.halfmove = u.old_half;
        self.fullmove = u.old_full;
        self.castle = u.old_castle;
        self.key = u.old_key;
        self.repetitions = u.old_reps;
        self.history.pop();
    }

    /// Pass the turn. Used by null-move pruning only.
    pub fn make_null(&mut self) -> NullUndo {
        let u = NullUndo {
            old_ep: self.ep,
            old_half: self.halfmove,
            old_key: self.key,
            old_reps: self.repetitions,
        };
        self.key ^= ZOBRIST.ep_key(self.ep);
        self.ep = None;
        self.halfmove += 1;
        self.key ^= ZOBRIST.stm;
        self.stm = self.stm.flip();
        self.history.push(self.key);
        self.recount_repetitions();
        u
    }

    pub fn unmake_null(&mut self, u: NullUndo) {
        self.stm = self.stm.flip();
        self.ep = u.old_ep;
        self.halfmove = u.old_half;
        self.key = u.old_key;
        self.repetitions = u.old_reps;
        self.history.pop();
    }

    pub fn in_check(&self, side: Side) -> bool {
        match self.king_square(side) {
            Some(ksq) => crate::movegen::square_attacked(self, ksq, side.flip()),
            None => false,
        }
    }

    #[inline]
    pub fn is_threefold_repetition(&self) -> bool {
        self.repetitions >= 3
    }

    #[inline]
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove >= 100
    }

    /// K vs K, K+minor vs K, and same-coloured-bishop KB vs KB.
    pub fn is_insufficient_material(&self) -> bool {
        let mut minor_count = [0u8; 2];
        let mut minor: [Option<(PieceKind, u8)>; 2] = [None; 2];
        for i in 0..64u8 {
            if let Some(p) = self.piece_at(i) {
                match p.kind {
                    PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
                    PieceKind::Knight | PieceKind::Bishop => {
                        let si = p.side.index();
                        minor_count[si] += 1;
                        if minor_count[si] > 1 {
                            return false;
                        }
                        minor[si] = Some((p.kind, i));
                    }
                    PieceKind::King => {}
                }
            }
        }
        match (minor[0], minor[1]) {
            (None, None) => true,
            (Some(_), None) | (None, Some(_)) => true,
            (Some((PieceKind::Bishop, a)), Some((PieceKind::Bishop, b))) => {
                // drawn only when both bishops live on the same square colour
                (file_of(a) + crate::types::rank_of(a)) % 2
                    == (file_of(b) + crate::types::rank_of(b)) % 2
            }
            _ => false,
        }
    }

    #[inline]
    pub fn is_draw(&self) -> bool {
        self.is_threefold_repetition() || self.is_fifty_move_draw() || self.is_insufficient_material()
    }
}
