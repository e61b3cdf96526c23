// Proto-utterance: the loader-neutral input to the utterance hierarchy.
//
// Loaders for aligned MLFs, HTS labels, SiRe labels and plain text all reduce
// their input to this nested words → syllables → phonemes shape. The core
// never parses raw label text itself; it reads proto-utterances as JSON:
//
//   {"id": "utt_001", "txtloaded": true,
//    "utt": [{"id": "the", "syllables": [{"id": "D@", "stress": "0",
//             "phonemes": [{"id": "D", "start": 0, "end": 50000}, ...]}]}]}
//
// Stress may be a string token (`"1"`, `"xx"`), an integer, or absent.
//
// See also: `utterance.rs` which builds the arena from a `ProtoUtterance`.

use crate::error::{Result, SireError};
use crate::types::{StateSpan, Stress};
use serde::{Deserialize, Serialize};

/// Default fake phoneme duration for text-derived utterances: 100 ms in HTK
/// 100 ns units.
pub const PHONY_PHONEME_DURATION: i64 = 1_000_000;

/// A stress value as written by a loader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProtoStress {
    Number(i64),
    Text(String),
}

impl ProtoStress {
    pub fn to_stress(&self) -> Result<Stress> {
        match self {
            ProtoStress::Number(n) if (0..=u8::MAX as i64).contains(n) => Ok(Stress::Level(*n as u8)),
            ProtoStress::Number(n) => Err(SireError::structure("stress", n.to_string())),
            ProtoStress::Text(t) => {
                Stress::parse(t).ok_or_else(|| SireError::structure("stress", t.clone()))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtoPhoneme {
    pub id: String,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
    #[serde(default)]
    pub stress: Option<ProtoStress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<Vec<StateSpan>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtoSyllable {
    pub id: String,
    #[serde(default)]
    pub stress: Option<ProtoStress>,
    pub phonemes: Vec<ProtoPhoneme>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtoWord {
    pub id: String,
    pub syllables: Vec<ProtoSyllable>,
    /// Part-of-speech tag, when a tagger or parse supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(default)]
    pub emph: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtoUtterance {
    pub id: String,
    pub utt: Vec<ProtoWord>,
    /// Word ids are orthographic (loaded from text) rather than phoneme
    /// concatenations. Contraction splitting requires this.
    #[serde(default)]
    pub txtloaded: bool,
}

/// A JSON file holds either one proto-utterance or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProtoFile {
    Many(Vec<ProtoUtterance>),
    One(ProtoUtterance),
}

impl ProtoUtterance {
    /// Parse a single proto-utterance.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a file body that is either one proto-utterance or an array.
    pub fn many_from_json(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        let file: ProtoFile = serde_json::from_str(json)?;
        Ok(match file {
            ProtoFile::Many(v) => v,
            ProtoFile::One(u) => vec![u],
        })
    }

    pub fn phonemes(&self) -> impl Iterator<Item = &ProtoPhoneme> {
        self.utt
            .iter()
            .flat_map(|w| w.syllables.iter())
            .flat_map(|s| s.phonemes.iter())
    }

    /// Give every phoneme without timings consecutive fake timings of
    /// `step` units, continuing from the last known end time.
    pub fn fill_phony_timings(&mut self, step: i64) {
        let mut cursor = 0;
        for phoneme in self
            .utt
            .iter_mut()
            .flat_map(|w| w.syllables.iter_mut())
            .flat_map(|s| s.phonemes.iter_mut())
        {
            match (phoneme.start, phoneme.end) {
                (Some(_), Some(end)) => cursor = end,
                _ => {
                    phoneme.start = Some(cursor);
                    cursor += step;
                    phoneme.end = Some(cursor);
                }
            }
        }
    }
}
