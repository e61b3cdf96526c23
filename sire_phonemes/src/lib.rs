// Phoneme inventories for SiRe context labelling.
//
// Maps phoneme symbols to their eight articulatory attributes and answers
// the vowel / consonant / silence questions the context builder asks for
// every phoneme, syllable vowel and neighbour. Pure lookup, no state beyond
// the immutable table.
//
// Architecture:
// - `columns.rs`: `FeatureColumn` (VOC..V) and `Phoneset` (combilex, cmudict)
// - `tables.rs`: the static Combilex and CMUdict rows
// - `lib.rs` (this file): `PhonemeInventory`, the value handed to every
//   component that needs phoneme features. There is no global table.
//
// Sentinels: both tables contain `xx` (the phoneme before the start or after
// the end of an utterance) and `novowel` (the vowel of a syllable without
// one), so neighbour and vowel lookups never need a special path.
//
// See also: `sire_core::utterance` which validates every phoneme id against
// an inventory at construction time, and `sire_core::builder` which reads the
// feature columns.

pub mod columns;
mod tables;

pub use columns::{FeatureColumn, Phoneset};

use rustc_hash::FxHashMap;
use std::sync::Arc;

/// The eight attribute values of one phoneme, in `FeatureColumn::ALL` order.
pub type FeatureVector = [&'static str; 8];

/// Symbol used for "outside the utterance" in every phoneme-valued field.
pub const PRE_UTTERANCE: &str = "xx";

/// Symbol used as the vowel of a syllable that has no vowel.
pub const NO_VOWEL: &str = "novowel";

/// Phoneme symbols treated as silence by every phoneset.
pub const SILENCE_SYMBOLS: [&str; 3] = ["sil", "pau", "#"];

/// A phoneme id that does not resolve in the active inventory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("phoneme `{symbol}` is not in the {phoneset} inventory")]
pub struct UnknownPhoneme {
    pub symbol: String,
    pub phoneset: Phoneset,
}

/// An immutable phoneme table for one phoneset.
///
/// Cloning is cheap (the table is shared behind an `Arc`), so utterances keep
/// their own handle to the inventory they were built with.
#[derive(Debug, Clone)]
pub struct PhonemeInventory {
    phoneset: Phoneset,
    table: Arc<FxHashMap<&'static str, FeatureVector>>,
}

impl PhonemeInventory {
    /// Build the inventory for `phoneset`.
    pub fn new(phoneset: Phoneset) -> Self {
        let rows = match phoneset {
            Phoneset::Combilex => tables::COMBILEX,
            Phoneset::Cmudict => tables::CMUDICT,
        };
        let table: FxHashMap<&'static str, FeatureVector> = rows.iter().copied().collect();
        PhonemeInventory {
            phoneset,
            table: Arc::new(table),
        }
    }

    pub fn combilex() -> Self {
        Self::new(Phoneset::Combilex)
    }

    pub fn cmudict() -> Self {
        Self::new(Phoneset::Cmudict)
    }

    pub fn phoneset(&self) -> Phoneset {
        self.phoneset
    }

    /// All eight attributes of `symbol`, or `None` if it is not in the table.
    pub fn feature_vector(&self, symbol: &str) -> Option<&FeatureVector> {
        self.table.get(symbol)
    }

    /// Like `feature_vector`, but unknown symbols are an error.
    pub fn require(&self, symbol: &str) -> Result<&FeatureVector, UnknownPhoneme> {
        self.table.get(symbol).ok_or_else(|| UnknownPhoneme {
            symbol: symbol.to_string(),
            phoneset: self.phoneset,
        })
    }

    /// A single attribute of `symbol`.
    pub fn feature(&self, symbol: &str, column: FeatureColumn) -> Option<&'static str> {
        self.table.get(symbol).map(|v| v[column.index()])
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.table.contains_key(symbol)
    }

    /// True if the VOC attribute is `v`. Silence is neither vowel nor
    /// consonant, so `!is_consonant` is not a vowel test.
    pub fn is_vowel(&self, symbol: &str) -> bool {
        self.feature(symbol, FeatureColumn::Voc) == Some("v")
    }

    /// True if the VOC attribute is `c` (this includes `novowel`).
    pub fn is_consonant(&self, symbol: &str) -> bool {
        self.feature(symbol, FeatureColumn::Voc) == Some("c")
    }

    pub fn is_silence(&self, symbol: &str) -> bool {
        SILENCE_SYMBOLS.contains(&symbol)
    }

    pub fn silence_symbols(&self) -> &'static [&'static str] {
        &SILENCE_SYMBOLS
    }

    /// Every symbol in the table, sorted.
    pub fn symbols(&self) -> Vec<&'static str> {
        let mut symbols: Vec<&'static str> = self.table.keys().copied().collect();
        symbols.sort_unstable();
        symbols
    }

    /// The documented value list of a column.
    pub fn feature_values(&self, column: FeatureColumn) -> &'static [&'static str] {
        column.values()
    }
}

impl Default for PhonemeInventory {
    fn default() -> Self {
        Self::combilex()
    }
}
