// Run configuration for label generation.
//
// `LabelConfig` gathers every setting of a labelling run: the phoneset, the
// context flavour (encoding plus parse and emphasis flags), the question
// dialect, the label kind, and the two compatibility switches. It is loaded
// from JSON (every field optional, falling back to `Default`), and the
// `make_labels` binary overrides individual fields from its command line.
//
// `context_type()` validates the flag combination; an emphasis run with a
// non-absolute encoding or with parse features is a configuration error.
//
// See also: `pipeline.rs` which consumes the config per utterance,
// `skeleton.rs` for `ContextType`.

use crate::error::Result;
use crate::label::LabelKind;
use crate::questions::{QuestionDialect, QuestionOptions};
use crate::skeleton::{ContextType, ParseFeatures, PositionEncoding};
use serde::{Deserialize, Serialize};
use sire_phonemes::{PhonemeInventory, Phoneset};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub phoneset: Phoneset,
    pub context_type: PositionEncoding,
    /// Attach a constituency parse and add the phrase features.
    pub constituency_parse: bool,
    /// Attach a dependency parse and add the dependency features.
    pub dependency_parse: bool,
    pub emphasis: bool,
    pub question_dialect: QuestionDialect,
    pub label_kind: LabelKind,
    /// Write the current phoneme as `-X+` in labels and questions.
    pub hhed_fix: bool,
    /// Commas count as words a constituency parse must cover.
    pub comma_is_pause: bool,
}

impl LabelConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn context_type(&self) -> Result<ContextType> {
        ContextType::new(
            self.context_type,
            ParseFeatures::from_flags(self.constituency_parse, self.dependency_parse),
            self.emphasis,
        )
    }

    pub fn inventory(&self) -> PhonemeInventory {
        PhonemeInventory::new(self.phoneset)
    }

    pub fn question_options(&self) -> QuestionOptions {
        QuestionOptions {
            dialect: self.question_dialect,
            hhed_fix: self.hhed_fix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() {
        let config = LabelConfig::from_json("{}").unwrap();
        assert_eq!(config, LabelConfig::default());
        assert_eq!(config.context_type().unwrap().name(), "Relational");
    }

    #[test]
    fn json_names_match_cli_names() {
        let config = LabelConfig::from_json(
            r#"{"phoneset": "cmudict", "context_type": "absolute", "emphasis": true,
                "question_dialect": "Nitech_NN", "label_kind": "AlignState", "hhed_fix": true}"#,
        )
        .unwrap();
        assert_eq!(config.phoneset, Phoneset::Cmudict);
        assert_eq!(config.label_kind, LabelKind::AlignState);
        assert_eq!(config.context_type().unwrap().name(), "Emphasis");
        assert_eq!(config.question_options().dialect, QuestionDialect::NitechNn);
    }

    #[test]
    fn bad_combinations_are_rejected() {
        let config = LabelConfig {
            emphasis: true,
            dependency_parse: true,
            context_type: PositionEncoding::Absolute,
            ..LabelConfig::default()
        };
        assert!(config.context_type().is_err());
        assert!(LabelConfig::from_json(r#"{"question_dialect": "NN"}"#).is_err());
    }
}
