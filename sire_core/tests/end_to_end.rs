// End-to-end tests: JSON proto-utterance in, label lines and questions out.

use sire_core::encoding::{Direction, strfloatify, strintify, to_relational};
use sire_core::questions::fit_question_sets;
use sire_core::{
    ContextBuilder, ContextType, LabelConfig, LabelKind, Parses, PositionEncoding, ProtoUtterance,
    QuestionDialect, QuestionOptions, SireError, Utterance, label_utterance, prepare_utterance,
    render_label,
};
use sire_phonemes::PhonemeInventory;

const THE_CAT: &str = r#"{
    "id": "the_cat",
    "utt": [
        {"id": "sil", "syllables": [{"id": "sil", "stress": "0",
            "phonemes": [{"id": "sil", "start": 0, "end": 100}]}]},
        {"id": "the", "syllables": [{"id": "D@", "stress": "0",
            "phonemes": [{"id": "D", "start": 100, "end": 200}, {"id": "@", "start": 200, "end": 300}]}]},
        {"id": "cat", "syllables": [{"id": "kat", "stress": "0",
            "phonemes": [{"id": "k", "start": 300, "end": 400}, {"id": "a", "start": 400, "end": 500},
                         {"id": "t", "start": 500, "end": 600}]}]},
        {"id": "sil", "syllables": [{"id": "sil", "stress": "0",
            "phonemes": [{"id": "sil", "start": 600, "end": 700}]}]}
    ]
}"#;

const CATS_SAT: &str = r#"{
    "id": "cats_sat",
    "txtloaded": true,
    "utt": [
        {"id": "sil", "syllables": [{"id": "sil", "stress": "0",
            "phonemes": [{"id": "sil", "start": 0, "end": 100}]}]},
        {"id": "cat's", "syllables": [{"id": "kats", "stress": "1",
            "phonemes": [{"id": "k", "start": 100, "end": 200}, {"id": "a", "start": 200, "end": 300},
                         {"id": "t", "start": 300, "end": 400}, {"id": "s", "start": 400, "end": 500}]}]},
        {"id": "sat", "syllables": [{"id": "sat", "stress": "1",
            "phonemes": [{"id": "s", "start": 500, "end": 600}, {"id": "a", "start": 600, "end": 700},
                         {"id": "t", "start": 700, "end": 800}]}]},
        {"id": "sil", "syllables": [{"id": "sil", "stress": "0",
            "phonemes": [{"id": "sil", "start": 800, "end": 900}]}]}
    ]
}"#;

fn the_cat() -> Utterance {
    let proto = ProtoUtterance::from_json(THE_CAT).unwrap();
    Utterance::from_proto(&proto, &PhonemeInventory::combilex()).unwrap()
}

fn config(encoding: PositionEncoding) -> LabelConfig {
    LabelConfig {
        context_type: encoding,
        ..LabelConfig::default()
    }
}

#[test]
fn schwa_of_the_is_syllable_and_word_final() {
    let utt = the_cat();
    let builder = ContextBuilder::new(ContextType::plain(PositionEncoding::Categorical));
    let schwa = utt.phonemes()[2];
    let ctx = builder.build(&utt, schwa).unwrap();
    assert_eq!(ctx.get("cp"), Some("@"));
    assert_eq!(ctx.get("cpsp"), Some("end"));
    assert_eq!(ctx.get("cpwp"), Some("end"));
}

#[test]
fn relational_positions_reserve_zero() {
    assert_eq!(to_relational(0, 4, Direction::Forward).unwrap(), 1.0);
    assert_eq!(to_relational(4, 4, Direction::Forward).unwrap(), 0.01);
    assert_eq!(to_relational(2, 4, Direction::Backward).unwrap(), 0.5);
    for mpos in 0..12 {
        for pos in 0..=mpos {
            let f = to_relational(pos, mpos, Direction::Forward).unwrap();
            let b = to_relational(pos, mpos, Direction::Backward).unwrap();
            assert!(f > 0.0 && b > 0.0);
            if f != 0.01 && b != 0.01 && mpos > 0 {
                assert!(((f + b) * 100.0).round() == 100.0, "{pos}/{mpos}: {f} + {b}");
            }
        }
    }
    for n in 0..=100 {
        let s = strfloatify(n);
        assert_eq!(strintify(s.parse().unwrap()), n.to_string());
    }
}

#[test]
fn labels_are_deterministic() {
    let config = config(PositionEncoding::Relational);
    let proto = ProtoUtterance::from_json(THE_CAT).unwrap();
    let builder = ContextBuilder::new(config.context_type().unwrap());
    let inventory = config.inventory();
    let (_, first) = label_utterance(&proto, &config, &builder, &inventory, Parses::default()).unwrap();
    let (_, second) = label_utterance(&proto, &config, &builder, &inventory, Parses::default()).unwrap();
    assert_eq!(first, second);
    let lines: Vec<&str> = first.lines().collect();
    assert_eq!(lines.len(), 7);
    assert!(lines[0].starts_with("0 100 |llp:xx|lp:xx|cp:sil|rp:D|rrp:@|"));
    assert!(lines.iter().all(|l| l.ends_with('|')));
}

#[test]
fn contraction_is_split_to_match_parse() {
    let config = LabelConfig {
        constituency_parse: true,
        ..config(PositionEncoding::Absolute)
    };
    let proto = ProtoUtterance::from_json(CATS_SAT).unwrap();
    let tree = sire_core::parse::ConstituencyTree::parse(
        "(ROOT (S (NP (NP (NN cat) (POS 's))) (VP (VBD sat))))",
    )
    .unwrap();
    let parses = Parses {
        constituency: Some(tree),
        dependency: None,
    };
    let utt = prepare_utterance(&proto, &config.inventory(), &config, parses).unwrap();
    let ids: Vec<&str> = utt.words().iter().map(|&w| utt.word(w).id.as_str()).collect();
    assert_eq!(ids, ["sil", "cat", "'s", "sat", "sil"]);
    assert_eq!(utt.num_syllables(), 5);
    // The split partitions the phonemes without gaps or overlaps.
    let cat: Vec<&str> = utt
        .word_phonemes(utt.words()[1])
        .into_iter()
        .chain(utt.word_phonemes(utt.words()[2]))
        .map(|p| utt.phoneme(p).id.as_str())
        .collect();
    assert_eq!(cat, ["k", "a", "t", "s"]);
    assert_eq!(utt.num_phonemes(), 9);

    let builder = ContextBuilder::new(config.context_type().unwrap());
    let contexts = builder.build_utterance(&utt).unwrap();
    let lab = render_label(&utt, &contexts, LabelKind::Phone, false).unwrap();
    assert_eq!(lab.lines().count(), 9);
}

#[test]
fn parse_count_mismatch_names_the_utterance() {
    let config = LabelConfig {
        constituency_parse: true,
        ..config(PositionEncoding::Relational)
    };
    let proto = ProtoUtterance::from_json(THE_CAT).unwrap();
    let tree = sire_core::parse::ConstituencyTree::parse("(ROOT (NP (DT the) (JJ black) (NN cat)))").unwrap();
    let parses = Parses {
        constituency: Some(tree),
        dependency: None,
    };
    let err = prepare_utterance(&proto, &config.inventory(), &config, parses).unwrap_err();
    assert!(matches!(err, SireError::InUtterance { .. }));
    assert!(err.to_string().contains("the_cat"));
}

#[test]
fn fitted_questions_cover_observed_values() {
    let utt = the_cat();
    let builder = ContextBuilder::new(ContextType::plain(PositionEncoding::Absolute));
    let contexts = builder.build_utterance(&utt).unwrap();
    let sets = fit_question_sets(builder.schema().clone(), &contexts, QuestionOptions::default()).unwrap();
    assert!(sets.questions.contains(&"QS \"cp-@\" {*|cp:@|*}".to_string()));
    assert!(sets.questions.contains(&"QS \"cp-k\" {*|cp:k|*}".to_string()));
    assert!(!sets.questions.iter().any(|q| q.contains("|start:")));
    assert!(sets.utterance_level.iter().all(|q| q.contains("|un")));
    assert!(!sets.utterance_level.is_empty());

    let options = QuestionOptions {
        dialect: QuestionDialect::CstrNn,
        hhed_fix: true,
    };
    let sets = fit_question_sets(builder.schema().clone(), &contexts, options).unwrap();
    assert!(sets.questions.contains(&"QS \"cp--@+\" {*|cp:-@+|*}".to_string()));
    assert!(sets.questions.iter().any(|q| q.starts_with("CQS ")));
}
