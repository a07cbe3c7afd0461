use crate::types::{Move, Score, MATE};

const CLUSTER_SIZE: usize = 4;
const MATE_BOUND: Score = MATE - 1000;
const EMPTY_DEPTH: i8 = i8::MIN;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Bound {
    /// PV node, score is exact.
    Exact,
    /// Fail high: the real score is at least `value`.
    Lower,
    /// Fail low: the real score is at most `value`.
    Upper,
}

#[derive(Copy, Clone)]
pub struct Entry {
    /// Hash bits above the cluster index; a probe trusts an entry only when
    /// these match.
    pub key32: u32,
    pub value: Score,
    pub best: Move,
    /// Remaining depth the value was computed at; 0 for quiescence entries.
    pub depth: i8,
    pub bound: Bound,
    pub gen: u8,
}

impl Entry {
    const fn empty() -> Self {
        Entry {
            key32: 0,
            value: 0,
            best: Move {
                from: 0,
                to: 0,
                promo: None,
            },
            depth: EMPTY_DEPTH,
            bound: Bound::Upper,
            gen: 0,
        }
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.depth == EMPTY_DEPTH
    }
}

#[derive(Copy, Clone)]
struct Cluster {
    entries: [Entry; CLUSTER_SIZE],
}

impl Cluster {
    const fn empty() -> Self {
        Cluster {
            entries: [Entry::empty(); CLUSTER_SIZE],
        }
    }
}

/// Mate scores are stored relative to the entry's node and converted back to
/// root-relative on probe, so a mate found via one path stays correct when
/// the position is reached at another ply.
#[inline]
fn value_to_tt(value: Score, ply: usize) -> Score {
    if value > MATE_BOUND {
        value + ply as Score
    } else if value < -MATE_BOUND {
        value - ply as Score
    } else {
        value
    }
}

#[inline]
fn value_from_tt(value: Score, ply: usize) -> Score {
    if value > MATE_BOUND {
        value - ply as Score
    } else if value < -MATE_BOUND {
        value + ply as Score
    } else {
        value
    }
}

pub struct TT {
    clusters: Vec<Cluster>,
    mask: usize,
    index_bits: u32,
    generation: u8,
    used: usize,
}

impl TT {
    pub fn new(mb: usize) -> Self {
        let mut tt = TT {
            clusters: Vec::new(),
            mask: 0,
            index_bits: 0,
            generation: 0,
            used: 0,
        };
        tt.set_size(mb);
        tt
    }

    /// Resize to the largest power-of-two cluster count fitting `mb`
    /// megabytes. Existing entries are discarded.
    pub fn set_size(&mut self, mb: usize) {
        let bytes = mb.max(1) * 1024 * 1024;
        let n = bytes / std::mem::size_of::<Cluster>();
        let mut cap = 1usize;
        let mut bits = 0u32;
        while cap * 2 <= n {
            cap *= 2;
            bits += 1;
        }
        self.clusters = vec![Cluster::empty(); cap];
        self.mask = cap - 1;
        self.index_bits = bits;
        self.generation = 0;
        self.used = 0;
    }

    pub fn clear(&mut self) {
        for c in self.clusters.iter_mut() {
            *c = Cluster::empty();
        }
        self.generation = 0;
        self.used = 0;
    }

    /// Begin a new root search; older generations lose replacement priority.
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Occupancy in per-mille, for UCI `hashfull`.
    pub fn fullness(&self) -> usize {
        self.used * 1000 / (self.clusters.len() * CLUSTER_SIZE)
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    #[inline]
    fn signature(&self, key: u64) -> u32 {
        (key >> self.index_bits) as u32
    }

    pub fn probe(&self, key: u64, ply: usize) -> Option<Entry> {
        let sig = self.signature(key);
        let cluster = &self.clusters[self.index(key)];
        for e in &cluster.entries {
            if !e.is_empty() && e.key32 == sig {
                let mut out = *e;
                out.value = value_from_tt(e.value, ply);
                return Some(out);
            }
        }
        None
    }

    pub fn store(
        &mut self,
        key: u64,
        value: Score,
        bound: Bound,
        depth: i8,
        best: Move,
        ply: usize,
    ) {
        let sig = self.signature(key);
        let idx = self.index(key);
        let generation = self.generation;
        let stored = value_to_tt(value, ply);

        let cluster = &mut self.clusters[idx];
        let mut victim = 0usize;
        let mut victim_quality = i32::MAX;
        for (i, e) in cluster.entries.iter_mut().enumerate() {
            if !e.is_empty() && e.key32 == sig {
                // Same position: refresh unless the new result is materially
                // shallower than what we already hold.
                if bound == Bound::Exact || depth as i32 + 2 >= e.depth as i32 || e.gen != generation
                {
                    let best = if best.is_null() { e.best } else { best };
                    *e = Entry {
                        key32: sig,
                        value: stored,
                        best,
                        depth,
                        bound,
                        gen: generation,
                    };
                }
                return;
            }
            let quality = if e.is_empty() {
                i32::MIN
            } else {
                e.depth as i32 - generation.wrapping_sub(e.gen) as i32
            };
            if quality < victim_quality {
                victim_quality = quality;
                victim = i;
            }
        }

        if cluster.entries[victim].is_empty() {
            self.used += 1;
        }
        cluster.entries[victim] = Entry {
            key32: sig,
            value: stored,
            best,
            depth,
            bound,
            gen: generation,
        };
    }
}
