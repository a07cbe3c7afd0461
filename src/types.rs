#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Side {
    White,
    Black,
}

impl Side {
    #[inline]
    pub fn flip(self) -> Side {
        if self == Side::White {
            Side::Black
        } else {
            Side::White
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        if self == Side::White {
            0
        } else {
            1
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct Move {
    pub from: u8,
    pub to: u8,
    pub promo: Option<PieceKind>,
}

impl Move {
    #[inline]
    pub fn is_null(self) -> bool {
        self.from == 0 && self.to == 0
    }

    pub fn uci(self) -> String {
        let mut s = String::new();
        s.push((b'a' + self.from % 8) as char);
        s.push((b'1' + self.from / 8) as char);
        s.push((b'a' + self.to % 8) as char);
        s.push((b'1' + self.to / 8) as char);
        if let Some(pk) = self.promo {
            s.push(match pk {
                PieceKind::Rook => 'r',
                PieceKind::Bishop => 'b',
                PieceKind::Knight => 'n',
                _ => 'q',
            });
        }
        s
    }
}

/// A move paired with its ordering score. The score is transient; it exists
/// only to sort moves within one node and is never persisted.
pub type ScoredMove = (i32, Move);

/// Centipawn score. Mate scores are encoded as distances from `MATE`.
pub type Score = i32;

pub const MATE: Score = 100_000;
pub const INF: Score = 9_999_999;
/// Sentinel returned by a cancelled search frame. Callers must propagate it
/// and never treat it as an ordinary score.
pub const INVALID: Score = 20_000;

const MATE_THRESHOLD: Score = MATE - 1000;

#[inline]
pub fn is_mate_score(s: Score) -> bool {
    s != INVALID && s.abs() > MATE_THRESHOLD
}

/// Plies from the root to the mate encoded in `s`.
#[inline]
pub fn plies_to_mate(s: Score) -> Score {
    MATE - s.abs()
}

/// Full moves to mate as reported over UCI, negative when we are being mated.
#[inline]
pub fn mate_in_moves(s: Score) -> Score {
    let moves = (plies_to_mate(s) + 1) / 2;
    if s > 0 {
        moves
    } else {
        -moves
    }
}

#[inline]
pub fn sq(file: i32, rank: i32) -> Option<u8> {
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some((rank * 8 + file) as u8)
    } else {
        None
    }
}

#[inline]
pub fn file_of(sq: u8) -> usize {
    (sq as usize) & 7
}

#[inline]
pub fn rank_of(sq: u8) -> usize {
    (sq as usize) >> 3
}
