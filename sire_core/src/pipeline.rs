// Per-utterance preparation: proto-utterance in, annotated utterance out.
//
// The steps run in a fixed order:
// 1. Text-derived protos (or any proto missing timings) get phony timings.
// 2. The arena is built and every phoneme checked against the inventory.
// 3. Parses are attached (constituency first, then dependency). Either may
//    split contractions to make the word counts line up.
// 4. Words without real tags get Festival's closed-class guess, when the
//    word ids came from text.
// 5. Pitch accents are predicted from the tags and syllable stress.
//
// Any failure is wrapped with the utterance id.
//
// See also: `builder.rs` which turns the prepared utterance into contexts,
// `sire_labels` which drives this over a whole corpus.

use crate::builder::ContextBuilder;
use crate::config::LabelConfig;
use crate::error::{Result, SireError};
use crate::label::render_label;
use crate::parse::{ConstituencyTree, DependencyTree, attach_constituency, attach_dependency};
use crate::prosody::{predict_accents, predict_festival_pos};
use crate::proto::{PHONY_PHONEME_DURATION, ProtoUtterance};
use crate::skeleton::Context;
use crate::utterance::Utterance;
use sire_phonemes::PhonemeInventory;

/// Parses to attach to one utterance.
#[derive(Clone, Debug, Default)]
pub struct Parses {
    pub constituency: Option<ConstituencyTree>,
    pub dependency: Option<DependencyTree>,
}

/// Build and annotate one utterance.
pub fn prepare_utterance(
    proto: &ProtoUtterance,
    inventory: &PhonemeInventory,
    config: &LabelConfig,
    parses: Parses,
) -> Result<Utterance> {
    prepare(proto, inventory, config, parses).map_err(|e| e.in_utterance(&proto.id))
}

fn prepare(
    proto: &ProtoUtterance,
    inventory: &PhonemeInventory,
    config: &LabelConfig,
    parses: Parses,
) -> Result<Utterance> {
    let needs_timings = proto.txtloaded || proto.phonemes().any(|p| p.start.is_none() || p.end.is_none());
    let mut utt = if needs_timings {
        let mut proto = proto.clone();
        proto.fill_phony_timings(PHONY_PHONEME_DURATION);
        Utterance::from_proto(&proto, inventory)?
    } else {
        Utterance::from_proto(proto, inventory)?
    };

    let tagged = match (config.constituency_parse, parses.constituency) {
        (true, Some(tree)) => {
            attach_constituency(&mut utt, &tree, config.comma_is_pause)?;
            true
        }
        (true, None) => {
            return Err(SireError::structure(
                "constituency parse",
                "constituency features requested but no parse was given",
            ));
        }
        (false, _) => false,
    };
    match (config.dependency_parse, parses.dependency) {
        (true, Some(tree)) => attach_dependency(&mut utt, tree)?,
        (true, None) => {
            return Err(SireError::structure(
                "dependency parse",
                "dependency features requested but no parse was given",
            ));
        }
        (false, _) => {}
    }

    if !tagged && utt.txtloaded() {
        predict_festival_pos(&mut utt)?;
    }
    predict_accents(&mut utt)?;
    tracing::debug!(utt = %proto.id, words = utt.num_words(), phonemes = utt.num_phonemes(), "utterance prepared");
    Ok(utt)
}

/// Prepare one utterance, build its contexts and render its label file.
pub fn label_utterance(
    proto: &ProtoUtterance,
    config: &LabelConfig,
    builder: &ContextBuilder,
    inventory: &PhonemeInventory,
    parses: Parses,
) -> Result<(Vec<Context>, String)> {
    let utt = prepare_utterance(proto, inventory, config, parses)?;
    let contexts = builder.build_utterance(&utt)?;
    let label = render_label(&utt, &contexts, config.label_kind, config.hhed_fix)
        .map_err(|e| e.in_utterance(&proto.id))?;
    Ok((contexts, label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::skeleton::PositionEncoding;
    use crate::utterance::tests::the_cat;

    fn config(encoding: PositionEncoding) -> LabelConfig {
        LabelConfig {
            context_type: encoding,
            ..LabelConfig::default()
        }
    }

    #[test]
    fn text_derived_utterances_get_phony_timings_and_tags() {
        let mut proto = the_cat();
        for p in proto.utt.iter_mut().flat_map(|w| w.syllables.iter_mut()).flat_map(|s| s.phonemes.iter_mut()) {
            p.start = None;
            p.end = None;
        }
        let inventory = PhonemeInventory::combilex();
        let utt = prepare_utterance(&proto, &inventory, &LabelConfig::default(), Parses::default()).unwrap();
        let last = *utt.phonemes().last().unwrap();
        assert_eq!(utt.phoneme(last).end, Some(7 * PHONY_PHONEME_DURATION));
        assert_eq!(utt.word(utt.words()[1]).pos.as_deref(), Some("det"));
        // "cat" is a one-syllable content word.
        let cat = utt.word(utt.words()[2]).syllables[0];
        assert_eq!(utt.syllable(cat).accent, 1);
    }

    #[test]
    fn constituency_parse_supplies_tags() {
        let config = LabelConfig {
            constituency_parse: true,
            ..config(PositionEncoding::Relational)
        };
        let parses = Parses {
            constituency: Some(ConstituencyTree::parse("(ROOT (NP (DT The) (NN cat)))").unwrap()),
            dependency: None,
        };
        let utt = prepare_utterance(&the_cat(), &config.inventory(), &config, parses).unwrap();
        assert_eq!(utt.word(utt.words()[1]).pos.as_deref(), Some("dt"));
        assert_eq!(utt.word(utt.words()[0]).pos.as_deref(), Some("sil"));
    }

    #[test]
    fn requested_parse_must_be_present() {
        let config = LabelConfig {
            dependency_parse: true,
            ..config(PositionEncoding::Absolute)
        };
        let err = prepare_utterance(&the_cat(), &config.inventory(), &config, Parses::default()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Structural);
        assert!(err.to_string().contains("the_cat"));
    }

    #[test]
    fn label_utterance_renders_every_phoneme() {
        let config = config(PositionEncoding::Categorical);
        let builder = ContextBuilder::new(config.context_type().unwrap());
        let (contexts, label) =
            label_utterance(&the_cat(), &config, &builder, &config.inventory(), Parses::default()).unwrap();
        assert_eq!(contexts.len(), 7);
        assert_eq!(label.lines().count(), 7);
    }
}
