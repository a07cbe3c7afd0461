use crate::types::{Piece, PieceKind, Side};
use lazy_static::lazy_static;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

pub struct Zobrist {
    pub psq: [[[u64; 64]; 6]; 2],
    pub castle: [u64; 16],
    pub ep_file: [u64; 8],
    pub stm: u64,
}

impl Zobrist {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(0xC0FFEE_BABE_F005_u64);
        let mut psq = [[[0u64; 64]; 6]; 2];
        for side in 0..2 {
            for kind in 0..6 {
                for sq in 0..64 {
                    psq[side][kind][sq] = rng.next_u64();
                }
            }
        }
        let mut castle = [0u64; 16];
        for k in castle.iter_mut() {
            *k = rng.next_u64();
        }
        let mut ep_file = [0u64; 8];
        for k in ep_file.iter_mut() {
            *k = rng.next_u64();
        }
        let stm = rng.next_u64();
        Self {
            psq,
            castle,
            ep_file,
            stm,
        }
    }

    #[inline]
    pub fn piece_key(&self, p: Piece, sq: u8) -> u64 {
        let k = match p.kind {
            PieceKind::Pawn => 0,
            PieceKind::Knight => 1,
            PieceKind::Bishop => 2,
            PieceKind::Rook => 3,
            PieceKind::Queen => 4,
            PieceKind::King => 5,
        };
        self.psq[p.side.index()][k][sq as usize]
    }

    #[inline]
    pub fn ep_key(&self, ep: Option<u8>) -> u64 {
        match ep {
            Some(sq) => self.ep_file[(sq % 8) as usize],
            None => 0,
        }
    }
}

lazy_static! {
    pub static ref ZOBRIST: Zobrist = Zobrist::new();
}
