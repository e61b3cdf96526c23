// Context building and question fitting on a synthetic 200-word utterance.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sire_core::proto::{ProtoPhoneme, ProtoStress, ProtoSyllable, ProtoWord};
use sire_core::questions::fit_question_sets;
use sire_core::{
    ContextBuilder, ContextType, PositionEncoding, ProtoUtterance, QuestionDialect, QuestionOptions,
    Utterance,
};
use sire_phonemes::PhonemeInventory;

const SYLLABLES: [&[&str]; 4] = [&["k", "a", "t"], &["D", "@"], &["s", "I"], &["t", "@", "n"]];

fn synthetic_utterance(words: usize) -> ProtoUtterance {
    let mut clock = 0;
    let mut phoneme = |id: &str| {
        let start = clock;
        clock += 50_000;
        ProtoPhoneme {
            id: id.to_string(),
            start: Some(start),
            end: Some(clock),
            stress: None,
            states: None,
        }
    };
    let mut utt = vec![ProtoWord {
        id: "sil".into(),
        syllables: vec![ProtoSyllable {
            id: "sil".into(),
            stress: Some(ProtoStress::Number(0)),
            phonemes: vec![phoneme("sil")],
        }],
        pos: None,
        emph: false,
    }];
    for w in 0..words {
        let syllables = (0..1 + w % 3)
            .map(|s| {
                let phones = SYLLABLES[(w + s) % SYLLABLES.len()];
                ProtoSyllable {
                    id: phones.concat(),
                    stress: Some(ProtoStress::Number(if s == 0 { 1 } else { 0 })),
                    phonemes: phones.iter().map(|p| phoneme(*p)).collect(),
                }
            })
            .collect::<Vec<_>>();
        utt.push(ProtoWord {
            id: syllables.iter().map(|s| s.id.as_str()).collect(),
            syllables,
            pos: None,
            emph: w % 7 == 0,
        });
    }
    ProtoUtterance {
        id: "bench".into(),
        utt,
        txtloaded: false,
    }
}

fn bench_context_build(c: &mut Criterion) {
    let inventory = PhonemeInventory::combilex();
    let proto = synthetic_utterance(200);
    let utt = Utterance::from_proto(&proto, &inventory).unwrap();

    let mut group = c.benchmark_group("context_build");
    group.throughput(Throughput::Elements(utt.num_phonemes() as u64));
    for encoding in [
        PositionEncoding::Categorical,
        PositionEncoding::Absolute,
        PositionEncoding::Relational,
    ] {
        let builder = ContextBuilder::new(ContextType::plain(encoding));
        group.bench_function(BenchmarkId::new("build_utterance", encoding.name()), |b| {
            b.iter(|| builder.build_utterance(&utt).unwrap())
        });
    }
    group.finish();
}

fn bench_question_fitting(c: &mut Criterion) {
    let inventory = PhonemeInventory::combilex();
    let utt = Utterance::from_proto(&synthetic_utterance(200), &inventory).unwrap();
    let builder = ContextBuilder::new(ContextType::plain(PositionEncoding::Relational));
    let contexts = builder.build_utterance(&utt).unwrap();

    let mut group = c.benchmark_group("question_fitting");
    for dialect in [QuestionDialect::Hmm, QuestionDialect::NitechNn, QuestionDialect::CstrNn] {
        let options = QuestionOptions {
            dialect,
            hhed_fix: false,
        };
        group.bench_function(BenchmarkId::new("fit", dialect.name()), |b| {
            b.iter(|| fit_question_sets(builder.schema().clone(), &contexts, options).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_context_build, bench_question_fitting);
criterion_main!(benches);
