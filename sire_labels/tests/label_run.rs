// Full runs of the labelling driver against a temporary corpus.

use sire_core::{LabelConfig, LabelKind, PositionEncoding, QuestionDialect};
use sire_labels::{RunPaths, load_protos, run, utterance_questions_path};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn word(id: &str, phones: &[&str], clock: &mut i64) -> serde_json::Value {
    let phonemes: Vec<serde_json::Value> = phones
        .iter()
        .map(|p| {
            let start = *clock;
            *clock += 100;
            serde_json::json!({"id": p, "start": start, "end": *clock})
        })
        .collect();
    serde_json::json!({
        "id": id,
        "syllables": [{"id": phones.concat(), "stress": "1", "phonemes": phonemes}],
    })
}

fn utterance(id: &str, words: &[(&str, &[&str])]) -> serde_json::Value {
    let mut clock = 0;
    let mut utt = vec![word("sil", &["sil"], &mut clock)];
    for (w, phones) in words {
        utt.push(word(w, phones, &mut clock));
    }
    utt.push(word("sil", &["sil"], &mut clock));
    serde_json::json!({"id": id, "txtloaded": true, "utt": utt})
}

fn write_corpus(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    let b = utterance("utt_b", &[("cat", &["k", "a", "t"]), ("sat", &["s", "a", "t"])]);
    let a = serde_json::json!([utterance("utt_a", &[("the", &["D", "@"]), ("cat", &["k", "a", "t"])])]);
    fs::write(dir.join("b.json"), b.to_string()).unwrap();
    fs::write(dir.join("a.json"), a.to_string()).unwrap();
    fs::write(dir.join("notes.txt"), "not a proto").unwrap();
}

#[test]
fn directory_input_is_read_in_sorted_order() {
    let tmp = tempdir().unwrap();
    let corpus = tmp.path().join("corpus");
    write_corpus(&corpus);
    let protos = load_protos(&corpus).unwrap();
    let ids: Vec<&str> = protos.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["utt_a", "utt_b"]);
    assert!(load_protos(&tmp.path().join("missing.json")).is_err());
}

#[test]
fn run_writes_labels_and_both_question_files() {
    let tmp = tempdir().unwrap();
    let corpus = tmp.path().join("corpus");
    write_corpus(&corpus);
    let paths = RunPaths {
        input: corpus,
        labdir: tmp.path().join("lab"),
        parse_dir: None,
        questions: Some(tmp.path().join("qs").join("questions.hed")),
    };
    let config = LabelConfig {
        context_type: PositionEncoding::Relational,
        ..LabelConfig::default()
    };
    let out = run(&config, &paths).unwrap();
    assert_eq!(out.labels.len(), 2);

    let lab = fs::read_to_string(tmp.path().join("lab").join("utt_a.lab")).unwrap();
    assert_eq!(lab.lines().count(), 7);
    assert!(lab.lines().all(|l| l.ends_with('|')));
    assert!(tmp.path().join("lab").join("utt_b.lab").exists());

    let qpath = paths.questions.unwrap();
    let questions = fs::read_to_string(&qpath).unwrap();
    let lines: Vec<&str> = questions.lines().collect();
    let mut sorted = lines.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(lines, sorted);
    assert!(lines.contains(&"QS \"cp-k\" {*|cp:k|*}"));

    let utt_questions = fs::read_to_string(utterance_questions_path(&qpath)).unwrap();
    assert!(utt_questions.lines().all(|q| q.contains("|un")));
    assert!(utt_questions.contains("QS \"unw-4\" {*|unw:4|*}"));
}

#[test]
fn duplicate_utterance_ids_are_rejected() {
    let tmp = tempdir().unwrap();
    let corpus = tmp.path().join("corpus");
    write_corpus(&corpus);
    let again = utterance("utt_b", &[("the", &["D", "@"])]);
    fs::write(corpus.join("c.json"), again.to_string()).unwrap();
    let paths = RunPaths {
        input: corpus,
        labdir: tmp.path().join("lab"),
        parse_dir: None,
        questions: None,
    };
    let err = run(&LabelConfig::default(), &paths).unwrap_err();
    assert!(err.to_string().contains("duplicate utterance id `utt_b`"));
    assert!(!tmp.path().join("lab").exists());
}

#[test]
fn align_state_labels_need_state_spans() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("utt.json");
    let mut proto = utterance("utt_s", &[("cat", &["k", "a", "t"])]);
    for w in proto["utt"].as_array_mut().unwrap() {
        for p in w["syllables"][0]["phonemes"].as_array_mut().unwrap() {
            let s = p["start"].as_i64().unwrap();
            p["states"] = (0..5).map(|k| serde_json::json!([s + 20 * k, s + 20 * (k + 1)])).collect();
        }
    }
    fs::write(&input, proto.to_string()).unwrap();
    let paths = RunPaths {
        input,
        labdir: tmp.path().join("lab"),
        parse_dir: None,
        questions: None,
    };
    let config = LabelConfig {
        context_type: PositionEncoding::Absolute,
        label_kind: LabelKind::AlignState,
        question_dialect: QuestionDialect::NitechNn,
        ..LabelConfig::default()
    };
    run(&config, &paths).unwrap();
    let lab = fs::read_to_string(tmp.path().join("lab").join("utt_s.lab")).unwrap();
    let lines: Vec<&str> = lab.lines().collect();
    assert_eq!(lines.len(), 5 * 5);
    assert!(lines[0].starts_with("0 20 |"));
    assert!(lines[0].ends_with("|"));
    assert!(lines[1].starts_with("20 40 |") && lines[1].ends_with("|[3]"));
}

#[test]
fn dependency_run_reads_relations_files() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("utt.json");
    fs::write(&input, utterance("utt_d", &[("the", &["D", "@"]), ("cat", &["k", "a", "t"])]).to_string()).unwrap();
    let parse_dir = tmp.path().join("parses");
    fs::create_dir_all(&parse_dir).unwrap();
    fs::write(parse_dir.join("utt_d.relations"), "root(ROOT-0, cat-2)\ndet(cat-2, the-1)\n").unwrap();

    let config = LabelConfig {
        context_type: PositionEncoding::Absolute,
        dependency_parse: true,
        ..LabelConfig::default()
    };
    let mut paths = RunPaths {
        input,
        labdir: tmp.path().join("lab"),
        parse_dir: Some(parse_dir),
        questions: None,
    };
    run(&config, &paths).unwrap();
    let lab = fs::read_to_string(tmp.path().join("lab").join("utt_d.lab")).unwrap();
    assert!(lab.lines().nth(1).unwrap().contains("|wpdr:det|"));
    assert!(lab.lines().nth(1).unwrap().contains("|wpgdr:mod|"));

    // A missing relations file fails the run before any label is written.
    paths.parse_dir = Some(tmp.path().join("nowhere"));
    paths.labdir = tmp.path().join("lab2");
    assert!(run(&config, &paths).is_err());
    assert!(!tmp.path().join("lab2").exists());
}
