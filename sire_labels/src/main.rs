// make_labels: write full-context labels and question sets for a corpus.
//
// Usage:
//   make_labels <input> <labdir> [--config FILE] [--phoneset NAME]
//     [--context-type NAME] [--constituency] [--dependency] [--parse-dir DIR]
//     [--emphasis] [--questions FILE] [--qtype NAME] [--labtype NAME]
//     [--hhed-fix] [--comma-is-pause]
//
// Settings come from the JSON config (if any) and are then overridden by
// the flags given on the command line. Log verbosity follows `RUST_LOG`,
// defaulting to `info`.

use anyhow::{Context as _, Result};
use clap::Parser;
use sire_core::{LabelConfig, LabelKind, PositionEncoding, QuestionDialect};
use sire_labels::{label_corpus, load_protos, utterance_questions_path, write_labels, write_questions};
use sire_phonemes::Phoneset;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "make_labels")]
#[command(about = "Create full-context labels and question sets from proto-utterances")]
#[command(version)]
struct Args {
    /// Proto-utterance JSON file, or a directory of them.
    input: PathBuf,

    /// Output directory for `.lab` files.
    labdir: PathBuf,

    /// JSON run configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// combilex or cmudict.
    #[arg(long)]
    phoneset: Option<Phoneset>,

    /// categorical, absolute or relational.
    #[arg(long)]
    context_type: Option<PositionEncoding>,

    /// Add constituency-parse features (reads `<parse-dir>/<id>.parse`).
    #[arg(long)]
    constituency: bool,

    /// Add dependency-parse features (reads `<parse-dir>/<id>.relations`).
    #[arg(long)]
    dependency: bool,

    #[arg(long)]
    parse_dir: Option<PathBuf>,

    /// Add emphasis features (absolute context type only).
    #[arg(long)]
    emphasis: bool,

    /// Question file to write; the utterance-level set goes next to it.
    #[arg(long)]
    questions: Option<PathBuf>,

    /// HMM, Nitech_NN or CSTR_NN.
    #[arg(long)]
    qtype: Option<QuestionDialect>,

    /// Phone or AlignState.
    #[arg(long)]
    labtype: Option<LabelKind>,

    /// Write the current phoneme as `-X+` in labels and questions.
    #[arg(long)]
    hhed_fix: bool,

    /// Keep commas as words when matching constituency parses.
    #[arg(long)]
    comma_is_pause: bool,
}

impl Args {
    fn label_config(&self) -> Result<LabelConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
                LabelConfig::from_json(&text).with_context(|| format!("parsing config {}", path.display()))?
            }
            None => LabelConfig::default(),
        };
        if let Some(phoneset) = self.phoneset {
            config.phoneset = phoneset;
        }
        if let Some(encoding) = self.context_type {
            config.context_type = encoding;
        }
        if let Some(dialect) = self.qtype {
            config.question_dialect = dialect;
        }
        if let Some(kind) = self.labtype {
            config.label_kind = kind;
        }
        config.constituency_parse |= self.constituency;
        config.dependency_parse |= self.dependency;
        config.emphasis |= self.emphasis;
        config.hhed_fix |= self.hhed_fix;
        config.comma_is_pause |= self.comma_is_pause;
        // Validates the encoding / parse / emphasis combination up front.
        config.context_type()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.label_config()?;
    info!(
        context_type = %config.context_type()?.name(),
        phoneset = ?config.phoneset,
        dialect = %config.question_dialect,
        "make_labels v{}",
        env!("CARGO_PKG_VERSION")
    );

    println!("[1/4] Loading proto-utterances from {}...", args.input.display());
    let protos = load_protos(&args.input)?;
    println!("  {} utterances.", protos.len());

    println!("[2/4] Building contexts...");
    let corpus = label_corpus(&config, &protos, args.parse_dir.as_deref())?;

    println!("[3/4] Writing labels to {}...", args.labdir.display());
    write_labels(&args.labdir, &corpus.labels)?;
    println!("  {} label files.", corpus.labels.len());

    match &args.questions {
        Some(qpath) => {
            println!("[4/4] Writing questions to {}...", qpath.display());
            let (main, utt) = write_questions(qpath, &corpus.questions)?;
            println!(
                "  {main} questions, {utt} utterance-level questions in {}.",
                utterance_questions_path(qpath).display()
            );
        }
        None => println!("[4/4] No question file requested."),
    }
    Ok(())
}
