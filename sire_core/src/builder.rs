// Context builder: computes every feature of a skeleton for one phoneme.
//
// A `ContextBuilder` is created once per run for a `ContextType`. It owns the
// shared `Schema` and fills one fresh `Context` per phoneme by querying the
// utterance hierarchy and its phoneme inventory. Blocks are added in a fixed
// order, which is also the order of the fields on the label line:
//
//   basic → positional (categorical | absolute | relational) → festival
//   → constituency → dependency → emphasis
//
// Silence handling follows the label contract: relational phoneme/syllable
// positions of a silence phoneme are the reserved 0.0, categorical positions
// of silence are `xx`, parse-derived features of unattached (silence) words
// are `xx`. Absolute positions have no silence special case.
//
// The builder only reads the utterance. Structural repair (contraction
// splitting, parse attachment, POS and accent prediction) happens before,
// in `pipeline::prepare_utterance`.
//
// See also: `skeleton.rs` for the feature tables and type tags, `encoding.rs`
// for the positional encodings, `label.rs` for serialization.

use crate::encoding::{
    distance_category, format_float, position_category, round2, to_relational,
    to_relational_or_missing, Direction,
};
use crate::error::{Result, SireError};
use crate::parse::{general_relation, ConstituencyAttachment, DepNodeId, DependencyTree};
use crate::prosody::{festival_general_pos, sire_general_pos};
use crate::skeleton::{Context, ContextType, PositionEncoding, Schema};
use crate::types::{Neighbour, PhonemeId, Stress, SyllableId, WordId, SENTINEL};
use crate::utterance::Utterance;
use sire_phonemes::{FeatureColumn, PhonemeInventory};
use std::sync::Arc;

/// Builds contexts of one `ContextType`.
#[derive(Clone, Debug)]
pub struct ContextBuilder {
    context_type: ContextType,
    schema: Arc<Schema>,
}

impl ContextBuilder {
    pub fn new(context_type: ContextType) -> Self {
        ContextBuilder {
            context_type,
            schema: Arc::new(Schema::for_context_type(&context_type)),
        }
    }

    pub fn context_type(&self) -> ContextType {
        self.context_type
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The context of one phoneme.
    pub fn build(&self, utt: &Utterance, phoneme: PhonemeId) -> Result<Context> {
        let cur = Cursor::new(utt, phoneme);
        let mut c = Context::new(self.schema.clone());
        let parse = self.context_type.parse();

        add_basic(&mut c, &cur)?;
        match self.context_type.encoding() {
            PositionEncoding::Categorical => add_categorical(&mut c, &cur)?,
            PositionEncoding::Absolute => add_absolute(&mut c, &cur)?,
            PositionEncoding::Relational => add_relational(&mut c, &cur)?,
        }
        // Real tags from a constituency parse use the finer SiRe mapping.
        add_festival(&mut c, &cur, !parse.constituency())?;
        if parse.constituency() {
            add_constituency(&mut c, &cur, self.context_type.encoding())?;
        }
        if parse.dependency() {
            add_dependency(&mut c, &cur, self.context_type.encoding())?;
        }
        if self.context_type.emphasis() {
            add_emphasis(&mut c, &cur)?;
        }
        Ok(c)
    }

    /// Contexts for every phoneme of the utterance, in utterance order.
    /// Errors name the utterance.
    pub fn build_utterance(&self, utt: &Utterance) -> Result<Vec<Context>> {
        tracing::debug!(utt = %utt.id, phonemes = utt.num_phonemes(), "building contexts");
        utt.phonemes()
            .iter()
            .map(|&p| self.build(utt, p))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| e.in_utterance(&utt.id))
    }
}

/// The phoneme a context is being built for, with its parents resolved.
struct Cursor<'a> {
    utt: &'a Utterance,
    inventory: &'a PhonemeInventory,
    phoneme: PhonemeId,
    syllable: SyllableId,
    word: WordId,
    silent: bool,
}

impl<'a> Cursor<'a> {
    fn new(utt: &'a Utterance, phoneme: PhonemeId) -> Self {
        let p = utt.phoneme(phoneme);
        let inventory = utt.inventory();
        Cursor {
            utt,
            inventory,
            phoneme,
            syllable: p.syllable,
            word: p.word,
            silent: inventory.is_silence(&p.id),
        }
    }

    fn is_silence(&self, phoneme: PhonemeId) -> bool {
        self.inventory.is_silence(&self.utt.phoneme(phoneme).id)
    }

    fn symbol(&self, neighbour: Neighbour<PhonemeId>) -> &'a str {
        match neighbour {
            Neighbour::Inside(p) => &self.utt.phoneme(p).id,
            Neighbour::Outside => SENTINEL,
        }
    }
}

fn timing(value: Option<i64>, which: &str, phoneme: &str) -> Result<String> {
    value.map(|t| t.to_string()).ok_or_else(|| {
        SireError::structure("phoneme timing", format!("`{phoneme}` has no {which} time"))
    })
}

fn or_sentinel<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| SENTINEL.to_string(), |v| v.to_string())
}

// ---------------------------------------------------------------------------
// Basic block
// ---------------------------------------------------------------------------

fn add_basic(c: &mut Context, cur: &Cursor) -> Result<()> {
    let utt = cur.utt;
    let inv = cur.inventory;
    let phoneme = utt.phoneme(cur.phoneme);

    c.add("start", timing(phoneme.start, "start", &phoneme.id)?)?;
    c.add("end", timing(phoneme.end, "end", &phoneme.id)?)?;

    // Phoneme window.
    let lp = cur.symbol(utt.left_phoneme(cur.phoneme)?);
    let rp = cur.symbol(utt.right_phoneme(cur.phoneme)?);
    c.add("llp", cur.symbol(utt.left_left_phoneme(cur.phoneme)?))?;
    c.add("lp", lp)?;
    c.add("cp", phoneme.id.as_str())?;
    c.add("rp", rp)?;
    c.add("rrp", cur.symbol(utt.right_right_phoneme(cur.phoneme)?))?;

    let lpf = inv.require(lp)?;
    let cpf = inv.require(&phoneme.id)?;
    let rpf = inv.require(rp)?;
    for col in FeatureColumn::ALL {
        let name = col.name();
        c.add(&format!("lp{name}"), lpf[col.index()])?;
        c.add(&format!("cp{name}"), cpf[col.index()])?;
        c.add(&format!("rp{name}"), rpf[col.index()])?;
    }

    // Syllable level.
    let syll = utt.syllable(cur.syllable);
    let s_pos = utt.syllable_pos_in_utt(cur.syllable)?;
    let ls = utt.left_syllable(cur.syllable)?.inside();
    let rs = utt.right_syllable(cur.syllable)?.inside();

    c.add("lss", or_sentinel(ls.map(|s| utt.syllable(s).stress)))?;
    let css = match syll.stress {
        Stress::Unknown => {
            tracing::warn!(
                utt = %utt.id,
                syllable = %syll.id,
                "current syllable stress is unknown, using 0"
            );
            "0".to_string()
        }
        stress => stress.to_string(),
    };
    c.add("css", css)?;
    c.add("rss", or_sentinel(rs.map(|s| utt.syllable(s).stress)))?;

    let syllables = utt.syllables();
    let snss = (s_pos + 1..syllables.len())
        .find(|&i| utt.syllable(syllables[i]).stress.is_stressed())
        .map(|i| i - s_pos);
    c.add("snss", or_sentinel(snss))?;
    // The first syllable of the utterance is never a "previous stressed
    // syllable".
    let spss = (1..s_pos)
        .rev()
        .find(|&i| utt.syllable(syllables[i]).stress.is_stressed())
        .map(|i| s_pos - i);
    c.add("spss", or_sentinel(spss))?;

    c.add("lsnp", or_sentinel(ls.map(|s| utt.syllable_num_phonemes(s))))?;
    c.add("csnp", utt.syllable_num_phonemes(cur.syllable).to_string())?;
    c.add("rsnp", or_sentinel(rs.map(|s| utt.syllable_num_phonemes(s))))?;

    c.add("svid", syll.vowel.to_string())?;
    let svf = inv.require(syll.vowel.symbol())?;
    for col in FeatureColumn::ALL {
        c.add(&format!("sv{}", col.name()), svf[col.index()])?;
    }

    // Word and utterance level.
    c.add("wnp", utt.word_num_phonemes(cur.word).to_string())?;
    c.add("wns", utt.word_num_syllables(cur.word).to_string())?;
    c.add("unp", utt.num_phonemes().to_string())?;
    c.add("uns", utt.num_syllables().to_string())?;
    c.add("unw", utt.num_words().to_string())?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Positional blocks
// ---------------------------------------------------------------------------

fn add_categorical(c: &mut Context, cur: &Cursor) -> Result<()> {
    let utt = cur.utt;

    let phone_cats = |p: Option<PhonemeId>| -> Result<(String, String)> {
        match p {
            Some(p) if !cur.is_silence(p) => {
                let ph = utt.phoneme(p);
                let sp = position_category(
                    utt.phoneme_pos_in_syllable(p)?,
                    utt.syllable_num_phonemes(ph.syllable),
                    false,
                );
                let wp = position_category(
                    utt.phoneme_pos_in_word(p)?,
                    utt.word_num_phonemes(ph.word),
                    false,
                );
                Ok((sp.to_string(), wp.to_string()))
            }
            _ => Ok((SENTINEL.to_string(), SENTINEL.to_string())),
        }
    };
    let (cpsp, cpwp) = phone_cats(Some(cur.phoneme))?;
    let (lpsp, lpwp) = phone_cats(utt.left_phoneme(cur.phoneme)?.inside())?;
    let (rpsp, rpwp) = phone_cats(utt.right_phoneme(cur.phoneme)?.inside())?;
    c.add("cpsp", cpsp)?;
    c.add("cpwp", cpwp)?;
    c.add("lpsp", lpsp)?;
    c.add("lpwp", lpwp)?;
    c.add("rpsp", rpsp)?;
    c.add("rpwp", rpwp)?;

    let syll_cat = |s: Option<SyllableId>| -> Result<String> {
        match s {
            Some(s) => {
                let word = utt.syllable(s).word;
                Ok(position_category(
                    utt.syllable_pos_in_word(s)?,
                    utt.word_num_syllables(word),
                    false,
                )
                .to_string())
            }
            None => Ok(SENTINEL.to_string()),
        }
    };
    c.add("cswp", syll_cat(Some(cur.syllable))?)?;
    c.add("lswp", syll_cat(utt.left_syllable(cur.syllable)?.inside())?)?;
    c.add("rswp", syll_cat(utt.right_syllable(cur.syllable)?.inside())?)?;

    let word_cat = |w: Option<WordId>| -> Result<String> {
        match w {
            Some(w) => Ok(position_category(utt.word_pos_in_utt(w)?, utt.num_words(), true).to_string()),
            None => Ok(SENTINEL.to_string()),
        }
    };
    c.add("cwup", word_cat(Some(cur.word))?)?;
    c.add("lwup", word_cat(utt.prev_word(cur.word)?.inside())?)?;
    c.add("rwup", word_cat(utt.next_word(cur.word)?.inside())?)?;
    Ok(())
}

/// Zero-based index and container size of the current phoneme in its
/// syllable and word, and of its syllable in the word.
struct Positions {
    p_in_syll: (usize, usize),
    p_in_word: (usize, usize),
    s_in_word: (usize, usize),
    w_in_utt: (usize, usize),
}

impl Positions {
    fn of(cur: &Cursor) -> Result<Self> {
        let utt = cur.utt;
        Ok(Positions {
            p_in_syll: (
                utt.phoneme_pos_in_syllable(cur.phoneme)?,
                utt.syllable_num_phonemes(cur.syllable),
            ),
            p_in_word: (
                utt.phoneme_pos_in_word(cur.phoneme)?,
                utt.word_num_phonemes(cur.word),
            ),
            s_in_word: (
                utt.syllable_pos_in_word(cur.syllable)?,
                utt.word_num_syllables(cur.word),
            ),
            w_in_utt: (utt.word_pos_in_utt(cur.word)?, utt.num_words()),
        })
    }
}

fn add_relational(c: &mut Context, cur: &Cursor) -> Result<()> {
    let pos = Positions::of(cur)?;
    let rel = |(p, n): (usize, usize), dir| -> Result<String> {
        Ok(format_float(to_relational(p, n.saturating_sub(1), dir)?))
    };
    let silence = format_float(0.0);

    for (name, at, dir) in [
        ("pfwsp", pos.p_in_syll, Direction::Forward),
        ("pbwsp", pos.p_in_syll, Direction::Backward),
        ("pfwwp", pos.p_in_word, Direction::Forward),
        ("pbwwp", pos.p_in_word, Direction::Backward),
        ("sfwwp", pos.s_in_word, Direction::Forward),
        ("sbwwp", pos.s_in_word, Direction::Backward),
    ] {
        if cur.silent {
            c.add(name, silence.as_str())?;
        } else {
            c.add(name, rel(at, dir)?)?;
        }
    }
    c.add("wfwup", rel(pos.w_in_utt, Direction::Forward)?)?;
    c.add("wbwup", rel(pos.w_in_utt, Direction::Backward)?)?;
    Ok(())
}

fn add_absolute(c: &mut Context, cur: &Cursor) -> Result<()> {
    let pos = Positions::of(cur)?;
    for (fw, bw, (p, n)) in [
        ("pfwsp", "pbwsp", pos.p_in_syll),
        ("pfwwp", "pbwwp", pos.p_in_word),
        ("sfwwp", "sbwwp", pos.s_in_word),
        ("wfwup", "wbwup", pos.w_in_utt),
    ] {
        c.add(fw, p.to_string())?;
        c.add(bw, (n - 1 - p).to_string())?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Festival block
// ---------------------------------------------------------------------------

fn add_festival(c: &mut Context, cur: &Cursor, festival_gpos: bool) -> Result<()> {
    let utt = cur.utt;
    let gpos = |w: WordId| -> Result<String> {
        if festival_gpos {
            Ok(festival_general_pos(utt, w))
        } else {
            sire_general_pos(utt, w)
        }
    };
    let gpos_of = |n: Neighbour<WordId>| -> Result<String> {
        match n {
            Neighbour::Inside(w) => gpos(w),
            Neighbour::Outside => Ok(SENTINEL.to_string()),
        }
    };
    c.add("rgpos", gpos_of(utt.next_word(cur.word)?)?)?;
    c.add("cgpos", gpos(cur.word)?)?;
    c.add("lgpos", gpos_of(utt.prev_word(cur.word)?)?)?;

    let s_pos = utt.syllable_pos_in_utt(cur.syllable)?;
    let accented = |s: &SyllableId| utt.syllable(*s).accent == 1;
    let (before, after) = utt.syllables().split_at(s_pos);
    let after = &after[1..];

    c.add("csacc", utt.syllable(cur.syllable).accent.to_string())?;
    c.add("nasbcs", before.iter().filter(|s| accented(*s)).count().to_string())?;
    c.add("nasacs", after.iter().filter(|s| accented(*s)).count().to_string())?;
    let pasd = before.iter().rposition(accented).map(|i| s_pos - i);
    let nasd = after.iter().position(accented).map(|i| i + 1);
    c.add("pasd", or_sentinel(pasd))?;
    c.add("nasd", or_sentinel(nasd))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Constituency block
// ---------------------------------------------------------------------------

const LEVEL_SUFFIXES: [&str; 3] = ["ppp", "gppp", "ggppp"];

fn attachment(utt: &Utterance, word: WordId) -> ConstituencyAttachment {
    utt.word(word)
        .constituency
        .clone()
        .unwrap_or_else(ConstituencyAttachment::missing)
}

fn add_constituency(c: &mut Context, cur: &Cursor, encoding: PositionEncoding) -> Result<()> {
    let utt = cur.utt;
    let levels = attachment(utt, cur.word);
    c.add("wpp", levels.parent.label.as_str())?;
    c.add("wgpp", levels.grandparent.label.as_str())?;
    c.add("wggpp", levels.greatgrandparent.label.as_str())?;

    match encoding {
        PositionEncoding::Relational => {
            for (level, suffix) in levels.levels().into_iter().zip(LEVEL_SUFFIXES) {
                for (dir, tag) in [(Direction::Forward, "fw"), (Direction::Backward, "bw")] {
                    let v = to_relational_or_missing(level.pos_in_parent, level.num_siblings, dir)?;
                    c.add(&format!("w{tag}r{suffix}"), format_float(v))?;
                }
            }
        }
        PositionEncoding::Absolute => {
            for (level, suffix) in levels.levels().into_iter().zip(LEVEL_SUFFIXES) {
                let (fw, bw) = match (level.pos_in_parent, level.num_siblings) {
                    (Some(pos), Some(n)) => (pos.to_string(), (n - 1 - pos).to_string()),
                    _ => (SENTINEL.to_string(), SENTINEL.to_string()),
                };
                c.add(&format!("wfwr{suffix}"), fw)?;
                c.add(&format!("wbwr{suffix}"), bw)?;
            }
        }
        PositionEncoding::Categorical => {
            // All three levels carry the word's category in the utterance.
            let num_words = utt.num_words();
            let neighbours = [
                ("rw", utt.next_word(cur.word)?.inside()),
                ("cw", Some(cur.word)),
                ("lw", utt.prev_word(cur.word)?.inside()),
            ];
            for (prefix, word) in neighbours {
                let value = match word {
                    Some(w) => position_category(utt.word_pos_in_utt(w)?, num_words, true).to_string(),
                    None => SENTINEL.to_string(),
                };
                for suffix in LEVEL_SUFFIXES {
                    c.add(&format!("{prefix}c{suffix}"), value.as_str())?;
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Dependency block
// ---------------------------------------------------------------------------

fn relation_of(tree: &DependencyTree, node: Option<DepNodeId>) -> String {
    or_sentinel(node.and_then(|n| tree.node(n).relation.clone()))
}

fn add_dependency(c: &mut Context, cur: &Cursor, encoding: PositionEncoding) -> Result<()> {
    let utt = cur.utt;
    let tree = utt.dependency_tree().ok_or_else(|| {
        SireError::structure("dependency features", "no dependency parse is attached")
    })?;
    let node = utt.word(cur.word).dependency;

    c.add("wpdr", relation_of(tree, node))?;
    c.add("wgpdr", relation_of(tree, node.and_then(|n| tree.ancestor(n, 1))))?;
    c.add("wggpdr", relation_of(tree, node.and_then(|n| tree.ancestor(n, 2))))?;
    let general = match node.and_then(|n| tree.node(n).relation.as_deref()) {
        Some(rel) => general_relation(rel)?.to_string(),
        None => SENTINEL.to_string(),
    };
    c.add("wpgdr", general)?;

    let dnc = match node {
        Some(n) => tree.node(n).children.len().to_string(),
        None if cur.silent => SENTINEL.to_string(),
        None => "0".to_string(),
    };
    c.add("dnc", dnc)?;

    let arcs_to = |other: Neighbour<WordId>| -> Result<String> {
        let (Some(n), Neighbour::Inside(w)) = (node, other) else {
            return Ok(SENTINEL.to_string());
        };
        if utt.word_starts_with_silence(cur.word) || utt.word_starts_with_silence(w) {
            return Ok(SENTINEL.to_string());
        }
        match utt.word(w).dependency {
            Some(m) => Ok(tree.distance_in_arcs(n, m)?.to_string()),
            None => Ok(SENTINEL.to_string()),
        }
    };
    c.add("dtdlw", arcs_to(utt.prev_word(cur.word)?)?)?;
    c.add("dtdrw", arcs_to(utt.next_word(cur.word)?)?)?;

    let num_words = utt.num_words();
    for (k, name) in [(1, "wdpr"), (2, "wdgpr"), (3, "wdggpr")] {
        let ancestor = node
            .and_then(|n| tree.ancestor(n, k))
            .filter(|&a| a != DepNodeId::ROOT);
        let value = match (node, ancestor) {
            (Some(n), Some(a)) => {
                let here = tree.node(n).utt_pos;
                let there = tree.node(a).utt_pos;
                match encoding {
                    PositionEncoding::Absolute => here.abs_diff(there).to_string(),
                    PositionEncoding::Relational => {
                        // Parser positions count from 1 and ignore the
                        // leading silence, hence the shift.
                        let last = num_words.saturating_sub(1);
                        let a = to_relational(here.saturating_sub(1), last, Direction::Forward)?;
                        let b = to_relational(there.saturating_sub(1), last, Direction::Forward)?;
                        format_float(round2((a - b).abs()))
                    }
                    PositionEncoding::Categorical => {
                        distance_category(here, there, num_words, true).to_string()
                    }
                }
            }
            _ => SENTINEL.to_string(),
        };
        c.add(name, value)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Emphasis block
// ---------------------------------------------------------------------------

fn add_emphasis(c: &mut Context, cur: &Cursor) -> Result<()> {
    let utt = cur.utt;
    let flag = |w: WordId| if utt.word(w).emph { "1" } else { "0" };
    let words = utt.words();
    let w_pos = utt.word_pos_in_utt(cur.word)?;

    c.add("wemph", flag(cur.word))?;
    c.add("fwemph", or_sentinel(utt.next_word(cur.word)?.inside().map(flag)))?;
    c.add("bwemph", or_sentinel(utt.prev_word(cur.word)?.inside().map(flag)))?;
    let next = words[w_pos + 1..]
        .iter()
        .position(|&w| utt.word(w).emph)
        .map(|i| i + 1);
    let prev = words[..w_pos]
        .iter()
        .rposition(|&w| utt.word(w).emph)
        .map(|i| w_pos - i);
    c.add("wnew", or_sentinel(next))?;
    c.add("wpew", or_sentinel(prev))?;
    c.add("unew", words.iter().filter(|&&w| utt.word(w).emph).count().to_string())?;
    Ok(())
}
