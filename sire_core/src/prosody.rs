// Part-of-speech generalisation and pitch-accent prediction.
//
// Two POS generalisations feed the `gpos` features:
// - Festival: `content` for open-class words, otherwise the closed-class tag
//   guessed from a fixed word list (`predict_festival_pos`).
// - SiRe: a coarse class from a real tagger's Penn tag, used when a
//   constituency parse supplied the tags.
//
// Accent prediction follows Festival's simple intonation model: content
// words are accented on their single syllable or on their primary-stressed
// syllables, function words are never accented.

use crate::error::{Result, SireError};
use crate::types::{Stress, WordId};
use crate::utterance::Utterance;

const FESTIVAL_FUNCTION_TAGS: [&str; 9] = ["in", "to", "det", "md", "cc", "wp", "pps", "aux", "punc"];

const AUX_WORDS: [&str; 9] = ["is", "am", "are", "was", "were", "has", "have", "had", "be"];
const PPS_WORDS: [&str; 6] = ["her", "his", "their", "its", "our", "mine"];
const PUNCTUATION: [&str; 10] = [".", ",", ":", ";", "\"", "'", "(", "?", ")", "!"];

/// Festival's closed-class word lists, checked in order.
const FESTIVAL_CLOSED_CLASSES: &[(&str, &[&str])] = &[
    (
        "in",
        &[
            "of", "for", "in", "on", "that", "with", "by", "at", "from", "as", "if", "against",
            "about", "before", "because", "under", "after", "over", "into", "while", "without",
            "through", "new", "between", "among", "until", "per", "up", "down",
        ],
    ),
    ("to", &["to"]),
    (
        "det",
        &[
            "the", "a", "an", "no", "some", "this", "that", "each", "another", "those", "every",
            "all", "any", "these", "both", "neither", "many",
        ],
    ),
    ("md", &["will", "may", "would", "can", "could", "should", "must", "ought", "might"]),
    ("cc", &["and", "but", "or", "plus", "yet", "nor"]),
    ("wp", &["who", "what", "where", "how", "when"]),
    ("pps", &PPS_WORDS),
    ("aux", &AUX_WORDS),
    ("punc", &PUNCTUATION),
];

/// True unless `pos` is one of Festival's function-word tags. A word without
/// a tag counts as content.
pub fn is_festival_content(pos: Option<&str>) -> bool {
    match pos {
        Some(p) => !FESTIVAL_FUNCTION_TAGS.contains(&p),
        None => true,
    }
}

/// Festival general POS of a word: `content` or its function-word tag.
pub fn festival_general_pos(utt: &Utterance, word: WordId) -> String {
    let w = utt.word(word);
    if w.pos.is_none() && utt.is_silence_word(word) {
        return "punc".into();
    }
    match w.pos.as_deref() {
        p if is_festival_content(p) => "content".into(),
        Some(p) => p.to_string(),
        None => "content".into(),
    }
}

/// SiRe general POS of a tagged word.
pub fn sire_general_pos(utt: &Utterance, word: WordId) -> Result<String> {
    let w = utt.word(word);
    let id = w.id.as_str();
    let Some(pos) = w.pos.as_deref() else {
        // Punctuation words the parse did not cover.
        if PUNCTUATION.contains(&id) {
            return Ok("punc".into());
        }
        return Err(SireError::structure(
            "part of speech",
            format!("word `{id}` has no tag"),
        ));
    };
    let class = match pos {
        "cd" | "dt" | "ex" | "fw" | "ls" | "md" | "pos" | "rp" | "uh" | "sym" | "sil" => pos,
        _ if AUX_WORDS.contains(&id) => "aux",
        _ if PPS_WORDS.contains(&id) => "pps",
        "cc" | "in" | "to" => "conj",
        "jj" | "jjr" | "jjs" => "adj",
        "nn" | "nns" | "nnp" | "nnps" | "prp" | "prp$" => "noun",
        "pdt" => "dt",
        "rb" | "rbr" | "rbs" => "adv",
        "vb" | "vbd" | "vbg" | "vbn" | "vbp" | "vbz" => "verb",
        "wdt" | "wp" | "wp$" | "wrb" => "wh",
        p if PUNCTUATION.contains(&p) => "punc",
        "content" => {
            return Err(SireError::structure(
                "part of speech",
                format!("word `{id}` only has a guessed tag; a real tagger is needed"),
            ));
        }
        other => {
            return Err(SireError::structure(
                "part of speech",
                format!("cannot categorise tag `{other}` of word `{id}`"),
            ));
        }
    };
    Ok(class.to_string())
}

/// Tag every word with Festival's closed-class guess (`content` otherwise).
/// Silence words become `punc`.
pub fn predict_festival_pos(utt: &mut Utterance) -> Result<()> {
    if !utt.txtloaded() {
        return Err(SireError::structure(
            "part of speech prediction",
            "word ids were not loaded from text",
        ));
    }
    let words: Vec<WordId> = utt.words().to_vec();
    for word in words {
        let tag = {
            let id = utt.word(word).id.as_str();
            FESTIVAL_CLOSED_CLASSES
                .iter()
                .find(|(_, list)| list.contains(&id))
                .map(|(tag, _)| *tag)
                .unwrap_or_else(|| {
                    if utt.is_silence_word(word) {
                        "punc"
                    } else {
                        "content"
                    }
                })
        };
        utt.word_mut(word).pos = Some(tag.to_string());
    }
    Ok(())
}

/// Festival simple accent prediction.
pub fn predict_accents(utt: &mut Utterance) -> Result<()> {
    let words: Vec<WordId> = utt.words().to_vec();
    for word in words {
        let content = is_festival_content(utt.word(word).pos.as_deref());
        let sylls = utt.word(word).syllables.clone();
        for &s in &sylls {
            let accent = if !content {
                0
            } else if sylls.len() == 1 {
                1
            } else {
                match utt.syllable(s).stress {
                    Stress::Level(1) => 1,
                    Stress::Level(0) | Stress::Level(2) => 0,
                    other => {
                        return Err(SireError::structure(
                            "syllable stress",
                            format!(
                                "`{}` in word `{}` cannot be used for accent prediction",
                                other,
                                utt.word(word).id
                            ),
                        ));
                    }
                }
            };
            utt.syllable_mut(s).accent = accent;
        }
    }
    Ok(())
}
