use std::{collections::VecDeque, fmt::Write as _};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PieceKind;

/// Fair supply of piece kinds using the 7-bag system.
///
/// The bag holds a shuffled set of all 7 kinds and is consumed front to
/// back. Once it is empty, a fresh uniformly shuffled set (Fisher-Yates)
/// replaces it. Every aligned run of 7 draws therefore contains each kind
/// exactly once, and no kind appears more than twice in any 7 consecutive
/// draws.
///
/// # Example
///
/// ```
/// use shaktris_engine::{BagSeed, PieceBag};
///
/// let seed = BagSeed::from_bytes([7; 16]);
/// let mut bag = PieceBag::with_seed(seed);
///
/// let first_set: Vec<_> = (0..7).map(|_| bag.next_kind()).collect();
/// assert_eq!(first_set.len(), 7);
/// assert_eq!(bag.remaining().count(), 0);
///
/// // The 8th draw starts a new shuffled set
/// bag.next_kind();
/// assert_eq!(bag.remaining().count(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct PieceBag {
    rng: Pcg32,
    bag: VecDeque<PieceKind>,
}

impl Default for PieceBag {
    fn default() -> Self {
        Self::new()
    }
}

/// Seed for deterministic piece generation.
///
/// A 128-bit seed serialized as a 32-character hex string. The same seed
/// yields the same piece sequence and the same spawn lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BagSeed([u8; 16]);

impl BagSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Derives an independent generator for a named purpose.
    ///
    /// Streams with different `stream` values do not share a sequence.
    #[must_use]
    pub fn rng(self, stream: u64) -> Pcg32 {
        let state = u64::from_be_bytes(self.0[..8].try_into().unwrap_or_default());
        let inc = u64::from_be_bytes(self.0[8..].try_into().unwrap_or_default());
        Pcg32::new(state, inc.wrapping_add(stream.wrapping_mul(2)))
    }
}

impl Serialize for BagSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let num = u128::from_be_bytes(self.0);
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{num:032x}").map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for BagSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        if hex_str.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "invalid hex seed: expected 32 characters, got {}",
                hex_str.len()
            )));
        }
        let num = u128::from_str_radix(&hex_str, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid hex seed: {hex_str} ({e})")))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Distribution<BagSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BagSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        BagSeed(seed)
    }
}

impl PieceBag {
    /// Creates a bag seeded from the thread-local generator.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed.
    #[must_use]
    pub fn with_seed(seed: BagSeed) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
            bag: VecDeque::with_capacity(PieceKind::LEN),
        }
    }

    fn refill_if_empty(&mut self) {
        if !self.bag.is_empty() {
            return;
        }
        let mut new_bag = PieceKind::ALL;
        // Fisher-Yates: for i from the last index down to 1, swap with a uniform index <= i
        new_bag.shuffle(&mut self.rng);
        self.bag.extend(new_bag);
    }

    /// Draws the next piece kind.
    ///
    /// # Panics
    ///
    /// Panics if the bag is empty (should never happen with refill-on-empty).
    pub fn next_kind(&mut self) -> PieceKind {
        self.refill_if_empty();
        self.bag
            .pop_front()
            .expect("bag is refilled before drawing")
    }

    /// Returns the kind [`Self::next_kind`] would return, without drawing it.
    pub fn peek(&mut self) -> PieceKind {
        self.refill_if_empty();
        self.bag[0]
    }

    /// Kinds left in the current set, in draw order.
    pub fn remaining(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.bag.iter().copied()
    }
}
