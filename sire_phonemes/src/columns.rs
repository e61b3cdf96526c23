// Articulatory feature columns and phoneset selection.
//
// Every phoneme in an inventory carries exactly eight categorical attributes,
// always in the column order defined by `FeatureColumn::ALL`:
// - `Voc`: vowel (`v`) or consonant (`c`)
// - `Vl`: vowel length: short, long, diphthong, schwa
// - `Vh`: vowel height
// - `Vf`: vowel frontness
// - `Vr`: vowel lip rounding
// - `Ct`: consonant type: stop, fricative, affricate, nasal, liquid, approximant
// - `Ca`: consonant place of articulation
// - `V`: voicing
//
// Column names (`VOC`, `VL`, ...) are part of the label format: context
// feature names are built by prefixing them (`lpVOC`, `cpCT`, `svVH`), so they
// must never change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the eight articulatory attribute columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureColumn {
    Voc,
    Vl,
    Vh,
    Vf,
    Vr,
    Ct,
    Ca,
    V,
}

impl FeatureColumn {
    /// All columns in feature-vector order.
    pub const ALL: [FeatureColumn; 8] = [
        FeatureColumn::Voc,
        FeatureColumn::Vl,
        FeatureColumn::Vh,
        FeatureColumn::Vf,
        FeatureColumn::Vr,
        FeatureColumn::Ct,
        FeatureColumn::Ca,
        FeatureColumn::V,
    ];

    /// Index of this column inside a `FeatureVector`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The label-format name of the column.
    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::Voc => "VOC",
            FeatureColumn::Vl => "VL",
            FeatureColumn::Vh => "VH",
            FeatureColumn::Vf => "VF",
            FeatureColumn::Vr => "VR",
            FeatureColumn::Ct => "CT",
            FeatureColumn::Ca => "CA",
            FeatureColumn::V => "V",
        }
    }

    /// Documented value list for the column. `xx` is the silence /
    /// pre-utterance value and appears in every column.
    pub fn values(self) -> &'static [&'static str] {
        match self {
            FeatureColumn::Voc => &["v", "c", "xx"],
            FeatureColumn::Vl => &["sh", "l", "d", "sc", "c", "xx"],
            FeatureColumn::Vh => &["h", "m", "l", "c", "xx"],
            FeatureColumn::Vf => &["f", "m", "b", "c", "xx"],
            FeatureColumn::Vr => &["r", "u", "c", "xx"],
            FeatureColumn::Ct => &["s", "f", "af", "n", "l", "ap", "v", "xx"],
            FeatureColumn::Ca => &["la", "a", "p", "ld", "d", "ve", "g", "vo", "xx"],
            FeatureColumn::V => &["v", "u", "xx"],
        }
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which phoneme table an inventory is built from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phoneset {
    /// Combilex (RPX/GAM/EDI) symbols, e.g. `@U`, `tS`, `I@`.
    #[default]
    Combilex,
    /// Lower-cased ARPAbet as used by CMUdict, e.g. `aa`, `ch`, `iy`.
    Cmudict,
}

impl Phoneset {
    pub fn name(self) -> &'static str {
        match self {
            Phoneset::Combilex => "combilex",
            Phoneset::Cmudict => "cmudict",
        }
    }
}

impl FromStr for Phoneset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "combilex" => Ok(Phoneset::Combilex),
            "cmudict" => Ok(Phoneset::Cmudict),
            other => Err(format!(
                "unknown phoneset `{other}` (expected combilex or cmudict)"
            )),
        }
    }
}

impl fmt::Display for Phoneset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_order_matches_indices() {
        for (i, col) in FeatureColumn::ALL.iter().enumerate() {
            assert_eq!(col.index(), i, "column {} out of place", col);
        }
    }

    #[test]
    fn every_column_accepts_xx() {
        for col in FeatureColumn::ALL {
            assert!(col.values().contains(&"xx"), "{} lacks xx", col);
        }
    }

    #[test]
    fn phoneset_names_roundtrip() {
        for set in [Phoneset::Combilex, Phoneset::Cmudict] {
            assert_eq!(set.name().parse::<Phoneset>(), Ok(set));
        }
        assert!("arpabet".parse::<Phoneset>().is_err());
    }

    #[test]
    fn phoneset_serde_is_lowercase() {
        let json = serde_json::to_string(&Phoneset::Cmudict).unwrap();
        assert_eq!(json, "\"cmudict\"");
    }
}
