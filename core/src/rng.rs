//! Deterministic random number generation.
//!
//! RULE: Nothing in the game core may call any platform RNG.
//! All randomness flows through StreamRng instances derived
//! from the single session seed.
//!
//! Each concern gets its own RNG stream, seeded deterministically
//! from (session_seed XOR stream_index). This means:
//!   - Adding a new stream never changes existing streams.
//!   - Rolling extra numbers in one minigame never shifts another's draws.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single concern.
pub struct StreamRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StreamRng {
    /// Create a stream RNG from the session seed and a stable
    /// stream index. The index must never change once assigned.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll an index in [0, len). `len` must be non-zero.
    pub fn index_below(&mut self, len: usize) -> usize {
        self.next_u64_below(len as u64) as usize
    }

    /// Roll a float in [lo, hi).
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform pick from a slice. None when the slice is empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let i = self.index_below(items.len());
        items.get(i)
    }
}

/// All stream RNGs for a single session, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_stream(&self, slot: StreamSlot) -> StreamRng {
        StreamRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries — only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Lineup      = 0,
    Dialogue    = 1,
    Chatbot     = 2,
    StreetChase = 3,
    CarChase    = 4,
    Haircut     = 5,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lineup      => "lineup",
            Self::Dialogue    => "dialogue",
            Self::Chatbot     => "chatbot",
            Self::StreetChase => "street_chase",
            Self::CarChase    => "car_chase",
            Self::Haircut     => "haircut",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let bank_a = RngBank::new(0xC0FFEE);
        let bank_b = RngBank::new(0xC0FFEE);
        let mut a = bank_a.for_stream(StreamSlot::Dialogue);
        let mut b = bank_b.for_stream(StreamSlot::Dialogue);
        for _ in 0..64 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn streams_are_independent() {
        let bank = RngBank::new(7);
        let mut lineup = bank.for_stream(StreamSlot::Lineup);
        let mut chase = bank.for_stream(StreamSlot::StreetChase);
        let a: Vec<u64> = (0..8).map(|_| lineup.next_u64()).collect();
        let b: Vec<u64> = (0..8).map(|_| chase.next_u64()).collect();
        assert_ne!(a, b, "Different slots must not share a stream");
    }

    #[test]
    fn range_f64_stays_in_bounds() {
        let mut rng = RngBank::new(99).for_stream(StreamSlot::CarChase);
        for _ in 0..1_000 {
            let x = rng.range_f64(-0.2, 0.3);
            assert!((-0.2..0.3).contains(&x), "out of range: {x}");
        }
    }

    #[test]
    fn pick_on_empty_slice_is_none() {
        let mut rng = RngBank::new(1).for_stream(StreamSlot::Dialogue);
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
    }
}
