// sire_core: full-context labels and question sets for parametric TTS.
//
// Turns a proto-utterance (words → syllables → phonemes with timings, as
// written by a corpus loader) into one context per phoneme, renders those
// contexts as HTK-style label lines, and fits decision-tree question sets to
// the values a corpus actually produced.
//
// Module overview:
// - `error.rs`:      SireError, ErrorCategory, crate Result alias.
// - `types.rs`:      WordId/SyllableId/PhonemeId, Neighbour, Stress, VowelId.
// - `proto.rs`:      ProtoUtterance, the serde-loaded input shape.
// - `utterance.rs`:  Utterance arena with position and neighbour queries.
// - `splitter.rs`:   Contraction splitting ("cat's" → "cat" + "'s").
// - `parse.rs`:      Constituency and dependency trees, word attachment.
// - `prosody.rs`:    Festival/SiRe POS generalisation, accent prediction.
// - `encoding.rs`:   Relational, categorical and integer encodings.
// - `skeleton.rs`:   Type tags, feature blocks, Schema, Context.
// - `builder.rs`:    ContextBuilder, one Context per phoneme.
// - `questions.rs`:  QuestionFitter and the HMM / Nitech / CSTR dialects.
// - `label.rs`:      Phone and AlignState label rendering.
// - `config.rs`:     LabelConfig, the settings of one run.
// - `pipeline.rs`:   prepare_utterance / label_utterance.
//
// Output is deterministic: contexts keep insertion order, and anything that
// reaches a question file passes through a `BTreeSet`. Hash maps are only
// used for lookups.

pub mod builder;
pub mod config;
pub mod encoding;
pub mod error;
pub mod label;
pub mod parse;
pub mod pipeline;
pub mod prosody;
pub mod proto;
pub mod questions;
pub mod skeleton;
pub mod splitter;
pub mod types;
pub mod utterance;

pub use builder::ContextBuilder;
pub use config::LabelConfig;
pub use error::{ErrorCategory, Result, SireError};
pub use label::{LabelKind, render_label};
pub use pipeline::{Parses, label_utterance, prepare_utterance};
pub use proto::ProtoUtterance;
pub use questions::{QuestionDialect, QuestionFitter, QuestionOptions, QuestionSets, finalise_questions};
pub use skeleton::{Context, ContextType, ParseFeatures, PositionEncoding, Schema};
pub use utterance::Utterance;
