// Contraction splitting: structural repair of orthographic contractions.
//
// Dictionaries keep "there's" or "don't" as one word with one pronunciation,
// while parsers split them into two tokens. When a parse disagrees with the
// utterance on word count, `try_split_words` walks the words and splits every
// recognised contraction into two words: the first keeps all but the final
// syllable, the second gets exactly the final syllable.
//
// Before the word split, a multi-phoneme final syllable is itself split on
// its last phoneme (`split_syllable`), but only when that phoneme is
// whitelisted for the contraction. A final phoneme that may span both words
// (the `I@` of "we're") instead gets a zero-duration phony syllable inserted
// after it, so the word count changes while phoneme timing does not.
//
// Anything not explicitly allowed is an error: a wrong split silently
// corrupts every context downstream.
//
// The splitter needs exclusive access to the utterance (`&mut`). Node
// positions are never cached, so the hierarchy is consistent again as soon
// as the word and syllable sequences have been rewired.

use crate::error::{Result, SireError};
use crate::types::{Stress, SyllableId, VowelId, WordId};
use crate::utterance::{Phoneme, Syllable, Utterance, Word};
use smallvec::SmallVec;
use tracing::warn;

/// How a contraction is recognised from the word id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pattern {
    Suffix(&'static str),
    Exact(&'static str),
}

impl Pattern {
    fn matches(self, id: &str) -> bool {
        match self {
            Pattern::Suffix(s) => id.ends_with(s),
            Pattern::Exact(s) => id == s,
        }
    }
}

/// What may be done with a multi-phoneme final syllable.
#[derive(Clone, Copy, Debug)]
enum FinalSyllable {
    /// Split off the last phoneme if it is in `whitelist`; insert a phony
    /// syllable if it is in `spanning`.
    SplitPhoneme {
        whitelist: &'static [&'static str],
        spanning: &'static [&'static str],
    },
    /// Hand the whole syllable to the second word if its id is listed.
    Whole(&'static [&'static str]),
}

#[derive(Clone, Copy, Debug)]
struct Contraction {
    pattern: Pattern,
    /// Characters from the end of the word id where the second word starts.
    offset: usize,
    final_syllable: FinalSyllable,
    /// Phonemes of a lone one-phoneme syllable that get a phony syllable.
    lone_spanning: &'static [&'static str],
}

const fn split(
    pattern: Pattern,
    offset: usize,
    whitelist: &'static [&'static str],
    spanning: &'static [&'static str],
) -> Contraction {
    Contraction {
        pattern,
        offset,
        final_syllable: FinalSyllable::SplitPhoneme {
            whitelist,
            spanning,
        },
        lone_spanning: &[],
    }
}

const fn whole(pattern: Pattern, offset: usize, accepted: &'static [&'static str]) -> Contraction {
    Contraction {
        pattern,
        offset,
        final_syllable: FinalSyllable::Whole(accepted),
        lone_spanning: &[],
    }
}

/// Checked in order; the first match wins.
const CONTRACTIONS: &[Contraction] = &[
    split(Pattern::Suffix("'s"), 2, &["s", "z"], &[]),
    split(
        Pattern::Suffix("'re"),
        3,
        &["I@", "U@", "E@", "@", "r"],
        &["I@", "U@", "E@", "O"],
    ),
    split(Pattern::Suffix("n't"), 2, &["n", "G", "t"], &[]),
    split(Pattern::Suffix("'ll"), 3, &["lw", "l"], &[]),
    split(Pattern::Suffix("'ve"), 3, &["f", "v"], &[]),
    split(Pattern::Exact("i'm"), 2, &["m"], &[]),
    Contraction {
        lone_spanning: &["aI"],
        ..split(Pattern::Suffix("'d"), 2, &["d", "G"], &["u"])
    },
    whole(Pattern::Exact("gonna"), 2, &["nu", "n@"]),
    whole(Pattern::Exact("cannot"), 3, &["nQG", "nQt"]),
    whole(Pattern::Exact("wanna"), 2, &["n@"]),
];

fn classify(word_id: &str) -> Option<&'static Contraction> {
    CONTRACTIONS.iter().find(|c| c.pattern.matches(word_id))
}

/// True if `word_id` is a contraction the splitter knows how to handle.
pub fn is_contraction(word_id: &str) -> bool {
    classify(word_id).is_some()
}

/// Split every recognised contraction in the utterance. Returns the number
/// of words added.
///
/// Requires orthographic word ids (`txtloaded`).
pub fn try_split_words(utt: &mut Utterance) -> Result<usize> {
    if !utt.txtloaded() {
        return Err(SireError::structure(
            "contraction split",
            "word ids were not loaded from text",
        ));
    }
    let before = utt.num_words();
    let snapshot: Vec<WordId> = utt.words().to_vec();
    for word in snapshot {
        if let Some(contraction) = classify(&utt.word(word).id) {
            split_word(utt, word, contraction)?;
        }
    }
    let added = utt.num_words() - before;
    if added == 0 {
        warn!(utt = %utt.id, "nothing to split in utterance");
    }
    Ok(added)
}

fn split_error(utt: &Utterance, word: WordId, reason: String) -> SireError {
    SireError::ContractionSplit {
        word: utt.word(word).id.clone(),
        reason,
    }
}

fn last_syllable(utt: &Utterance, word: WordId) -> Result<SyllableId> {
    utt.word(word)
        .syllables
        .last()
        .copied()
        .ok_or_else(|| split_error(utt, word, "word has no syllables".into()))
}

fn split_word(utt: &mut Utterance, word: WordId, contraction: &Contraction) -> Result<()> {
    let mut whole_syllable = false;
    let last = last_syllable(utt, word)?;
    if utt.syllable_num_phonemes(last) != 1 {
        match contraction.final_syllable {
            FinalSyllable::SplitPhoneme {
                whitelist,
                spanning,
            } => split_syllable(utt, word, last, whitelist, spanning)?,
            FinalSyllable::Whole(accepted) => {
                whole_syllable = accepted.contains(&utt.syllable(last).id.as_str());
            }
        }
    } else if utt.word_num_syllables(word) < 2 && !contraction.lone_spanning.is_empty() {
        split_syllable(
            utt,
            word,
            last,
            contraction.lone_spanning,
            contraction.lone_spanning,
        )?;
    }

    let last = last_syllable(utt, word)?;
    let n = utt.syllable_num_phonemes(last);
    if n > 1 && !whole_syllable {
        return Err(split_error(
            utt,
            word,
            format!(
                "final syllable `{}` has {} phonemes and splitting it is not allowed",
                utt.syllable(last).id,
                n
            ),
        ));
    }
    if utt.word_num_syllables(word) < 2 {
        return Err(split_error(
            utt,
            word,
            "the first word would be left without syllables".into(),
        ));
    }

    let original = utt.word(word).clone();
    let chars: Vec<char> = original.id.chars().collect();
    let cut = chars.len().saturating_sub(contraction.offset);
    let first_id: String = chars[..cut].iter().collect();
    let second_id: String = chars[cut..].iter().collect();

    let (head, tail) = original.syllables.split_at(original.syllables.len() - 1);
    let w1 = utt.push_word(Word {
        id: first_id,
        pos: None,
        emph: original.emph,
        syllables: SmallVec::from_slice(head),
        constituency: None,
        dependency: None,
    });
    let w2 = utt.push_word(Word {
        id: second_id,
        pos: None,
        emph: original.emph,
        syllables: SmallVec::from_slice(tail),
        constituency: None,
        dependency: None,
    });
    for (new_word, sylls) in [(w1, head), (w2, tail)] {
        for &s in sylls {
            utt.syllable_mut(s).word = new_word;
            let phonemes = utt.syllable(s).phonemes.clone();
            for p in phonemes {
                utt.phoneme_mut(p).word = new_word;
            }
        }
    }

    let pos = utt.word_pos_in_utt(word)?;
    utt.word_order_mut().splice(pos..=pos, [w1, w2]);
    warn!(
        utt = %utt.id,
        word = %original.id,
        first = %utt.word(w1).id,
        second = %utt.word(w2).id,
        "split contraction into two words"
    );
    Ok(())
}

/// Split a syllable on its last phoneme, or append a phony syllable when
/// that phoneme spans both words.
fn split_syllable(
    utt: &mut Utterance,
    word: WordId,
    syll: SyllableId,
    whitelist: &[&str],
    spanning: &[&str],
) -> Result<()> {
    let phonemes = utt.syllable(syll).phonemes.clone();
    let Some(&last) = phonemes.last() else {
        return Err(split_error(utt, word, "empty final syllable".into()));
    };
    let last_id = utt.phoneme(last).id.clone();

    if spanning.contains(&last_id.as_str()) {
        let end = utt.syllable_end_time(syll);
        let (stress, vowel) = {
            let s = utt.syllable(syll);
            (s.stress, s.vowel.clone())
        };
        let phony = utt.push_syllable(Syllable {
            id: last_id.clone(),
            stress,
            vowel,
            accent: 0,
            phonemes: SmallVec::new(),
            word,
        });
        let phony_phone = utt.push_phoneme(Phoneme {
            id: last_id,
            start: end,
            end,
            stress: None,
            states: None,
            syllable: phony,
            word,
            phony: true,
        });
        utt.syllable_mut(phony).phonemes.push(phony_phone);
        insert_after(utt, word, syll, &[phony])?;
        return Ok(());
    }

    if !whitelist.contains(&last_id.as_str()) {
        return Err(split_error(
            utt,
            word,
            format!(
                "last phoneme `{}` of syllable `{}` is not one of {:?}",
                last_id,
                utt.syllable(syll).id,
                whitelist
            ),
        ));
    }
    if phonemes.len() < 2 {
        return Err(split_error(
            utt,
            word,
            format!("syllable `{}` has a single phoneme", utt.syllable(syll).id),
        ));
    }

    let (head, tail) = phonemes.split_at(phonemes.len() - 1);
    let (s1_stress, s2_stress) = if utt.phoneme(phonemes[0]).stress.is_none() {
        let s = utt.syllable(syll).stress;
        (s, s)
    } else {
        let any_stressed = |ids: &[_]| {
            ids.iter()
                .any(|&p| utt.phoneme(p).stress.is_some_and(Stress::is_stressed))
        };
        let level = |b: bool| Stress::Level(u8::from(b));
        (level(any_stressed(head)), level(any_stressed(tail)))
    };

    let mut new_sylls = [syll; 2];
    for (slot, (part, stress)) in new_sylls
        .iter_mut()
        .zip([(head, s1_stress), (tail, s2_stress)])
    {
        let id: String = part.iter().map(|&p| utt.phoneme(p).id.as_str()).collect();
        let new = utt.push_syllable(Syllable {
            id,
            stress,
            vowel: VowelId::NoVowel,
            accent: 0,
            phonemes: SmallVec::from_slice(part),
            word,
        });
        for &p in part {
            utt.phoneme_mut(p).syllable = new;
        }
        let vowel = utt.find_vowel(new);
        utt.syllable_mut(new).vowel = vowel;
        *slot = new;
    }

    warn!(
        utt = %utt.id,
        syllable = %utt.syllable(syll).id,
        first = %utt.syllable(new_sylls[0]).id,
        second = %utt.syllable(new_sylls[1]).id,
        "split syllable into two"
    );
    replace_syllable(utt, word, syll, &new_sylls)
}

/// Insert `new` right after `anchor` in both the word and the utterance.
fn insert_after(
    utt: &mut Utterance,
    word: WordId,
    anchor: SyllableId,
    new: &[SyllableId],
) -> Result<()> {
    let in_word = utt.syllable_pos_in_word(anchor)?;
    let in_utt = utt.syllable_pos_in_utt(anchor)?;
    let syllables = &mut utt.word_mut(word).syllables;
    for (i, &s) in new.iter().enumerate() {
        syllables.insert(in_word + 1 + i, s);
    }
    utt.syllable_order_mut()
        .splice(in_utt + 1..in_utt + 1, new.iter().copied());
    Ok(())
}

/// Replace `old` with `new` in both the word and the utterance.
fn replace_syllable(
    utt: &mut Utterance,
    word: WordId,
    old: SyllableId,
    new: &[SyllableId],
) -> Result<()> {
    let in_word = utt.syllable_pos_in_word(old)?;
    let in_utt = utt.syllable_pos_in_utt(old)?;
    let syllables = &mut utt.word_mut(word).syllables;
    syllables.remove(in_word);
    for (i, &s) in new.iter().enumerate() {
        syllables.insert(in_word + i, s);
    }
    utt.syllable_order_mut()
        .splice(in_utt..=in_utt, new.iter().copied());
    Ok(())
}
