// Core types shared across the utterance model and the context builder.
//
// Defines the arena identifiers for words, syllables and phonemes, and the
// small closed types that replace "doesn't apply" string tokens inside the
// model:
// - `Neighbour<T>`: a neighbour lookup that may fall outside the utterance
// - `Stress`: a syllable stress level, or unknown
// - `VowelId`: the vowel of a syllable, or no vowel
//
// Each of these renders to its label token (`xx`, `novowel`) only through
// `Display`, which is what the context builder writes into a context. Inside
// the model they stay distinct so one meaning cannot be mistaken for another.

use serde::{Deserialize, Serialize};
use sire_phonemes::NO_VOWEL;
use std::fmt;

/// The label token for "does not apply here" (outside the utterance, no
/// parse, no stress, no neighbour).
pub const SENTINEL: &str = "xx";

// ---------------------------------------------------------------------------
// Arena IDs
// ---------------------------------------------------------------------------

/// Index of a word node in an utterance's word arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordId(pub u32);

/// Index of a syllable node in an utterance's syllable arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SyllableId(pub u32);

/// Index of a phoneme node in an utterance's phoneme arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhonemeId(pub u32);

impl WordId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl SyllableId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl PhonemeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ---------------------------------------------------------------------------
// Neighbours
// ---------------------------------------------------------------------------

/// Result of a left/right neighbour lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Neighbour<T> {
    Inside(T),
    /// The computed index falls outside `[0, len)`.
    Outside,
}

impl<T> Neighbour<T> {
    pub fn inside(self) -> Option<T> {
        match self {
            Neighbour::Inside(t) => Some(t),
            Neighbour::Outside => None,
        }
    }

    pub fn is_outside(&self) -> bool {
        matches!(self, Neighbour::Outside)
    }

    /// Neighbour at `pos + offset` in a sequence of length `len`.
    pub(crate) fn at(items: &[T], pos: usize, offset: isize) -> Neighbour<T>
    where
        T: Copy,
    {
        let target = pos as isize + offset;
        if target < 0 || target as usize >= items.len() {
            Neighbour::Outside
        } else {
            Neighbour::Inside(items[target as usize])
        }
    }
}

// ---------------------------------------------------------------------------
// Stress
// ---------------------------------------------------------------------------

/// Syllable (or phoneme) stress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stress {
    /// 0 = unstressed, 1 = primary, 2 = secondary.
    Level(u8),
    /// The loader could not tell (e.g. converted HTS labels).
    Unknown,
}

impl Stress {
    /// True for any known level above zero.
    pub fn is_stressed(self) -> bool {
        matches!(self, Stress::Level(l) if l > 0)
    }

    pub fn level(self) -> Option<u8> {
        match self {
            Stress::Level(l) => Some(l),
            Stress::Unknown => None,
        }
    }

    /// Parse a loader stress token: a digit string or `xx`.
    pub fn parse(token: &str) -> Option<Stress> {
        if token == SENTINEL {
            return Some(Stress::Unknown);
        }
        token.trim().parse::<u8>().ok().map(Stress::Level)
    }
}

impl fmt::Display for Stress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stress::Level(l) => write!(f, "{l}"),
            Stress::Unknown => f.write_str(SENTINEL),
        }
    }
}

// ---------------------------------------------------------------------------
// Syllable vowel
// ---------------------------------------------------------------------------

/// The first vowel phoneme of a syllable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VowelId {
    Vowel(String),
    NoVowel,
}

impl VowelId {
    /// The inventory symbol to look features up under.
    pub fn symbol(&self) -> &str {
        match self {
            VowelId::Vowel(v) => v,
            VowelId::NoVowel => NO_VOWEL,
        }
    }
}

impl fmt::Display for VowelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ---------------------------------------------------------------------------
// State alignment
// ---------------------------------------------------------------------------

/// Start and end time of one HMM emitting state of a phoneme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSpan(pub i64, pub i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stress_tokens() {
        assert_eq!(Stress::parse("1"), Some(Stress::Level(1)));
        assert_eq!(Stress::parse("xx"), Some(Stress::Unknown));
        assert_eq!(Stress::parse("high"), None);
        assert_eq!(Stress::Unknown.to_string(), "xx");
        assert_eq!(Stress::Level(2).to_string(), "2");
        assert!(Stress::Level(2).is_stressed());
        assert!(!Stress::Level(0).is_stressed());
        assert!(!Stress::Unknown.is_stressed());
    }

    #[test]
    fn vowel_id_renders_sentinel() {
        assert_eq!(VowelId::NoVowel.to_string(), "novowel");
        assert_eq!(VowelId::Vowel("@U".into()).symbol(), "@U");
    }

    #[test]
    fn neighbour_bounds() {
        let items = [10, 20, 30];
        assert_eq!(Neighbour::at(&items, 0, -1), Neighbour::Outside);
        assert_eq!(Neighbour::at(&items, 0, 1), Neighbour::Inside(20));
        assert_eq!(Neighbour::at(&items, 1, 2), Neighbour::Outside);
        assert_eq!(Neighbour::at(&items, 2, -2).inside(), Some(10));
    }
}
