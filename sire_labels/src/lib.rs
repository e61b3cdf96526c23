// sire_labels: corpus-level driver for label and question generation.
//
// Reads proto-utterances (one JSON file, or every `.json` file of a
// directory in sorted name order), attaches per-utterance parse files,
// renders one `.lab` file per utterance and fits a question set over the
// whole corpus.
//
// The run is staged so the binary can report progress between stages:
// - `load_protos`: read and parse every input file.
// - `label_corpus`: prepare each utterance, build its contexts, render its
//   label text in memory and feed the contexts to the question fitter.
// - `write_labels`: write `<labdir>/<utt id>.lab` files.
// - `write_questions`: write the main and utterance-level question files.
//
// Labels are only written once every utterance has been labelled, so a
// failing utterance never leaves a partial corpus behind.
//
// Parse files live in one directory: `<id>.parse` holds a bracketed
// constituency parse, `<id>.relations` the typed dependency lines.
//
// See also: `sire_core::pipeline` for the per-utterance steps.

use anyhow::{Context as _, Result, bail};
use sire_core::parse::{ConstituencyTree, DependencyTree};
use sire_core::questions::{QuestionFitter, QuestionSets, finalise_questions};
use sire_core::{ContextBuilder, LabelConfig, Parses, ProtoUtterance, label_utterance};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a run reads from and writes to.
#[derive(Clone, Debug)]
pub struct RunPaths {
    pub input: PathBuf,
    pub labdir: PathBuf,
    pub parse_dir: Option<PathBuf>,
    pub questions: Option<PathBuf>,
}

/// The rendered label text of one utterance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UtteranceLabel {
    pub id: String,
    pub text: String,
}

/// Everything a run produces, before it is written out.
#[derive(Clone, Debug, Default)]
pub struct CorpusLabels {
    pub labels: Vec<UtteranceLabel>,
    pub questions: QuestionSets,
}

/// Read every proto-utterance under `input`.
pub fn load_protos(input: &Path) -> Result<Vec<ProtoUtterance>> {
    let files = if input.is_dir() {
        let mut files = Vec::new();
        for entry in fs::read_dir(input).with_context(|| format!("reading directory {}", input.display()))? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                files.push(path);
            }
        }
        files.sort();
        files
    } else {
        vec![input.to_path_buf()]
    };

    let mut protos = Vec::new();
    for file in &files {
        let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
        let mut batch = ProtoUtterance::many_from_json(&text)
            .with_context(|| format!("parsing proto-utterances in {}", file.display()))?;
        tracing::debug!(file = %file.display(), utterances = batch.len(), "loaded proto-utterances");
        protos.append(&mut batch);
    }
    if protos.is_empty() {
        bail!("no proto-utterances found under {}", input.display());
    }
    Ok(protos)
}

/// Read the parse files `config` asks for.
pub fn load_parses(config: &LabelConfig, parse_dir: Option<&Path>, utt_id: &str) -> Result<Parses> {
    let mut parses = Parses::default();
    if !config.constituency_parse && !config.dependency_parse {
        return Ok(parses);
    }
    let Some(dir) = parse_dir else {
        bail!("parse features are enabled but no parse directory was given");
    };
    if config.constituency_parse {
        let path = dir.join(format!("{utt_id}.parse"));
        let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let tree = ConstituencyTree::parse(text.trim())
            .with_context(|| format!("parsing constituency tree {}", path.display()))?;
        parses.constituency = Some(tree);
    }
    if config.dependency_parse {
        let path = dir.join(format!("{utt_id}.relations"));
        let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let tree = DependencyTree::parse(text.lines().filter(|l| !l.trim().is_empty()))
            .with_context(|| format!("parsing dependency relations {}", path.display()))?;
        parses.dependency = Some(tree);
    }
    Ok(parses)
}

/// Label every utterance and fit the corpus question sets.
pub fn label_corpus(
    config: &LabelConfig,
    protos: &[ProtoUtterance],
    parse_dir: Option<&Path>,
) -> Result<CorpusLabels> {
    let context_type = config.context_type()?;
    let inventory = config.inventory();
    let builder = ContextBuilder::new(context_type);
    let mut fitter = QuestionFitter::new(builder.schema().clone(), config.question_options());

    let mut labels = Vec::with_capacity(protos.len());
    let mut seen = BTreeSet::new();
    for proto in protos {
        // Each id names its own `.lab` file.
        if !seen.insert(proto.id.as_str()) {
            bail!("duplicate utterance id `{}`", proto.id);
        }
        let parses = load_parses(config, parse_dir, &proto.id)?;
        let (contexts, text) = label_utterance(proto, config, &builder, &inventory, parses)?;
        fitter.add_contexts(&contexts)?;
        labels.push(UtteranceLabel {
            id: proto.id.clone(),
            text,
        });
    }
    let questions = fitter.fit()?;
    Ok(CorpusLabels { labels, questions })
}

pub fn write_labels(labdir: &Path, labels: &[UtteranceLabel]) -> Result<()> {
    fs::create_dir_all(labdir).with_context(|| format!("creating {}", labdir.display()))?;
    for label in labels {
        let path = labdir.join(format!("{}.lab", label.id));
        fs::write(&path, &label.text).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

/// `questions.hed` → `questions_utt.hed`.
pub fn utterance_questions_path(qpath: &Path) -> PathBuf {
    let stem = qpath.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let name = match qpath.extension() {
        Some(ext) => format!("{stem}_utt.{}", ext.to_string_lossy()),
        None => format!("{stem}_utt"),
    };
    qpath.with_file_name(name)
}

/// Write the de-duplicated, sorted question sets. Returns the line counts.
pub fn write_questions(qpath: &Path, sets: &QuestionSets) -> Result<(usize, usize)> {
    let main = finalise_questions(sets.questions.iter().cloned());
    let utt = finalise_questions(sets.utterance_level.iter().cloned());
    if let Some(parent) = qpath.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let utt_path = utterance_questions_path(qpath);
    fs::write(qpath, lines(&main)).with_context(|| format!("writing {}", qpath.display()))?;
    fs::write(&utt_path, lines(&utt)).with_context(|| format!("writing {}", utt_path.display()))?;
    Ok((main.len(), utt.len()))
}

fn lines(questions: &[String]) -> String {
    let mut out = questions.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Run every stage without progress output.
pub fn run(config: &LabelConfig, paths: &RunPaths) -> Result<CorpusLabels> {
    let protos = load_protos(&paths.input)?;
    let corpus = label_corpus(config, &protos, paths.parse_dir.as_deref())?;
    write_labels(&paths.labdir, &corpus.labels)?;
    if let Some(qpath) = &paths.questions {
        write_questions(qpath, &corpus.questions)?;
    }
    Ok(corpus)
}
