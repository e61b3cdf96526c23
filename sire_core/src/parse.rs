// Syntactic parse trees and their attachment to utterance words.
//
// Two parse flavours, both produced by an external parser and read here as
// text:
// - `ConstituencyTree`: a bracketed phrase-structure parse, e.g.
//   `(ROOT (S (NP (DT the) (NN cat)) (VP (VBD sat))))`. A pre-terminal
//   `(tag word)` becomes one leaf labelled `tag-word`. Every node records its
//   index in its parent and its parent's child count.
// - `DependencyTree`: typed dependency lines, `rel(head-i, dep-j)`, rooted
//   at the synthetic `ROOT-0` node (arena index 0).
//
// Attachment matches parse leaves (or dependency nodes, sorted by word
// index) one-to-one with the utterance words that are not silence. When the
// counts differ the contraction splitter is run once and the counts are
// re-checked; a remaining mismatch is a structural error.
//
// After attachment a word carries a `ConstituencyAttachment` (three phrase
// levels, each possibly missing) and/or the `DepNodeId` of its node in the
// utterance's `DependencyTree`.
//
// See also: `splitter.rs` (the recovery path), `builder.rs` (the parse
// feature blocks).

use crate::error::{Result, SireError};
use crate::splitter::try_split_words;
use crate::types::{SENTINEL, WordId};
use crate::utterance::Utterance;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constituency parses
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhraseNode {
    pub label: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Index within the parent's children; `None` for the root.
    pub pos_in_parent: Option<usize>,
    /// The parent's child count; `None` for the root.
    pub num_siblings: Option<usize>,
}

/// A phrase-structure tree. Node 0 is the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstituencyTree {
    nodes: Vec<PhraseNode>,
}

fn tokenize(bracketed: &str) -> Vec<String> {
    bracketed
        .to_lowercase()
        .replace('(', " ( ")
        .replace(')', " ) ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

impl ConstituencyTree {
    /// Parse a bracketed parse (case-insensitive; stored lower-cased).
    pub fn parse(bracketed: &str) -> Result<Self> {
        let tokens = tokenize(bracketed);
        let mut tree = ConstituencyTree { nodes: Vec::new() };
        let mut cursor = 0;
        tree.parse_node(&tokens, &mut cursor, None)?;
        if cursor != tokens.len() {
            return Err(SireError::MalformedParse(format!(
                "trailing tokens after the root phrase: `{}`",
                tokens[cursor..].join(" ")
            )));
        }
        Ok(tree)
    }

    fn parse_node(&mut self, tokens: &[String], cursor: &mut usize, parent: Option<usize>) -> Result<usize> {
        let eof = || SireError::MalformedParse("unbalanced brackets".into());
        if tokens.get(*cursor).map(String::as_str) != Some("(") {
            return Err(SireError::MalformedParse(format!(
                "expected `(` at token {}",
                *cursor
            )));
        }
        *cursor += 1;

        let mut label = String::new();
        if let Some(tok) = tokens.get(*cursor) {
            if tok != "(" && tok != ")" {
                label = tok.clone();
                *cursor += 1;
            }
        }
        let id = self.nodes.len();
        self.nodes.push(PhraseNode {
            label,
            parent,
            children: Vec::new(),
            pos_in_parent: None,
            num_siblings: None,
        });

        loop {
            let tok = tokens.get(*cursor).ok_or_else(eof)?;
            match tok.as_str() {
                ")" => {
                    *cursor += 1;
                    break;
                }
                "(" => {
                    let child = self.parse_node(tokens, cursor, Some(id))?;
                    self.nodes[id].children.push(child);
                }
                word => {
                    // Pre-terminal: fold the word into the tag.
                    let node = &mut self.nodes[id];
                    node.label = format!("{}-{}", node.label, word);
                    *cursor += 1;
                }
            }
        }

        let n = self.nodes[id].children.len();
        let children = self.nodes[id].children.clone();
        for (i, child) in children.into_iter().enumerate() {
            self.nodes[child].pos_in_parent = Some(i);
            self.nodes[child].num_siblings = Some(n);
        }
        Ok(id)
    }

    pub fn root(&self) -> usize {
        0
    }

    pub fn node(&self, id: usize) -> &PhraseNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Word leaves in order. Punctuation leaves (label not starting with a
    /// letter) are skipped, except `,` when `keep_comma` is set.
    pub fn leaves(&self, keep_comma: bool) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.children.is_empty() {
                if id == self.root() {
                    continue;
                }
                let first = node.label.chars().next();
                if first.is_some_and(char::is_alphabetic) || (keep_comma && first == Some(',')) {
                    out.push(id);
                }
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// The phrase level of node `id`, or a missing level for `None`.
    fn level(&self, id: Option<usize>) -> PhraseLevel {
        match id {
            Some(id) => {
                let n = &self.nodes[id];
                PhraseLevel {
                    label: n.label.clone(),
                    pos_in_parent: n.pos_in_parent,
                    num_siblings: n.num_siblings,
                }
            }
            None => PhraseLevel::missing(),
        }
    }

    /// Parent, grandparent and great-grandparent phrases of a leaf.
    pub fn attachment(&self, leaf: usize) -> ConstituencyAttachment {
        let parent = self.nodes[leaf].parent;
        let grandparent = parent.and_then(|p| self.nodes[p].parent);
        let greatgrandparent = grandparent.and_then(|g| self.nodes[g].parent);
        ConstituencyAttachment {
            parent: self.level(parent),
            grandparent: self.level(grandparent),
            greatgrandparent: self.level(greatgrandparent),
        }
    }
}

/// One ancestor phrase of a word, flattened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseLevel {
    pub label: String,
    pub pos_in_parent: Option<usize>,
    pub num_siblings: Option<usize>,
}

impl PhraseLevel {
    pub fn missing() -> Self {
        PhraseLevel {
            label: SENTINEL.to_string(),
            pos_in_parent: None,
            num_siblings: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituencyAttachment {
    pub parent: PhraseLevel,
    pub grandparent: PhraseLevel,
    pub greatgrandparent: PhraseLevel,
}

impl ConstituencyAttachment {
    pub fn missing() -> Self {
        ConstituencyAttachment {
            parent: PhraseLevel::missing(),
            grandparent: PhraseLevel::missing(),
            greatgrandparent: PhraseLevel::missing(),
        }
    }

    pub fn levels(&self) -> [&PhraseLevel; 3] {
        [&self.parent, &self.grandparent, &self.greatgrandparent]
    }
}

// ---------------------------------------------------------------------------
// Dependency parses
// ---------------------------------------------------------------------------

/// Index of a node in a `DependencyTree`. Node 0 is `ROOT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepNodeId(pub u32);

impl DepNodeId {
    pub const ROOT: DepNodeId = DepNodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepNode {
    pub label: String,
    /// Relation to the head; `None` for `ROOT`.
    pub relation: Option<String>,
    /// Word index: the parser's 1-based index until attachment, the word's
    /// utterance position afterwards.
    pub utt_pos: usize,
    pub parent: Option<DepNodeId>,
    pub children: Vec<DepNodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyTree {
    nodes: Vec<DepNode>,
}

/// Split `word-3` into (`word`, 3). Words may contain dashes themselves;
/// copy-node primes (`word-3'`) are ignored.
fn split_token(token: &str) -> Result<(String, usize)> {
    let token = token.trim().trim_end_matches('\'');
    let (label, pos) = token
        .rsplit_once('-')
        .ok_or_else(|| SireError::MalformedParse(format!("dependency token `{token}` has no index")))?;
    let pos = pos
        .parse::<usize>()
        .map_err(|_| SireError::MalformedParse(format!("dependency token `{token}` has a bad index")))?;
    Ok((label.to_string(), pos))
}

impl DependencyTree {
    /// Parse Stanford typed dependency lines. Blank lines are skipped; nodes
    /// not reachable from `ROOT-0` are dropped.
    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        // head token -> [(relation, dependent token)]
        let mut relations: FxHashMap<(String, usize), Vec<(String, String, usize)>> = FxHashMap::default();
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let malformed = || SireError::MalformedParse(format!("bad dependency line `{line}`"));
            let (rel, rest) = line.split_once('(').ok_or_else(malformed)?;
            let rest = rest.strip_suffix(')').ok_or_else(malformed)?;
            let (head, dep) = rest.split_once(", ").ok_or_else(malformed)?;
            let head = split_token(head)?;
            let (dep_label, dep_pos) = split_token(dep)?;
            relations
                .entry(head)
                .or_default()
                .push((rel.trim().to_string(), dep_label, dep_pos));
        }

        let mut tree = DependencyTree {
            nodes: vec![DepNode {
                label: "ROOT".into(),
                relation: None,
                utt_pos: 0,
                parent: None,
                children: Vec::new(),
            }],
        };
        let mut seen: FxHashSet<(String, usize)> = FxHashSet::default();
        seen.insert(("ROOT".into(), 0));
        let mut stack = vec![(DepNodeId::ROOT, ("ROOT".to_string(), 0usize))];
        while let Some((parent, key)) = stack.pop() {
            let Some(deps) = relations.get(&key) else {
                continue;
            };
            for (rel, label, pos) in deps {
                let child_key = (label.clone(), *pos);
                if !seen.insert(child_key.clone()) {
                    return Err(SireError::MalformedParse(format!(
                        "dependency node `{label}-{pos}` has more than one head"
                    )));
                }
                let id = DepNodeId(tree.nodes.len() as u32);
                tree.nodes.push(DepNode {
                    label: label.clone(),
                    relation: Some(rel.clone()),
                    utt_pos: *pos,
                    parent: Some(parent),
                    children: Vec::new(),
                });
                tree.nodes[parent.index()].children.push(id);
                stack.push((id, child_key));
            }
        }
        Ok(tree)
    }

    pub fn node(&self, id: DepNodeId) -> &DepNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: DepNodeId) -> &mut DepNode {
        &mut self.nodes[id.index()]
    }

    /// All nodes except `ROOT`, sorted by word index.
    pub fn nodes_sorted(&self) -> Vec<DepNodeId> {
        let mut ids: Vec<DepNodeId> = (1..self.nodes.len()).map(|i| DepNodeId(i as u32)).collect();
        ids.sort_by_key(|&id| self.node(id).utt_pos);
        ids
    }

    /// The `k`-th ancestor of `id` (1 = head).
    pub fn ancestor(&self, id: DepNodeId, k: usize) -> Option<DepNodeId> {
        let mut cur = id;
        for _ in 0..k {
            cur = self.node(cur).parent?;
        }
        Some(cur)
    }

    /// Number of arcs between two nodes through their lowest common
    /// ancestor.
    pub fn distance_in_arcs(&self, a: DepNodeId, b: DepNodeId) -> Result<usize> {
        let chain = |mut n: DepNodeId| {
            let mut out = vec![n];
            while let Some(p) = self.node(n).parent {
                out.push(p);
                n = p;
            }
            out
        };
        let ca = chain(a);
        let cb = chain(b);
        for (i, pa) in ca.iter().enumerate() {
            if let Some(j) = cb.iter().position(|pb| pb == pa) {
                return Ok(i + j);
            }
        }
        Err(SireError::structure(
            "dependency tree",
            "the two nodes are not in the same tree",
        ))
    }
}

/// Coarse class of a fine-grained Stanford dependency relation.
pub fn general_relation(relation: &str) -> Result<&'static str> {
    Ok(match relation {
        "auxpass" | "cop" => "aux",
        "agent" => "agent",
        "root" => "root",
        "dep" => "dep",
        "aux" => "aux",
        "arg" => "arg",
        "obj" => "obj",
        "subj" => "subj",
        "cc" => "cc",
        "conj" => "conj",
        "expl" => "expl",
        "mod" => "mod",
        "parataxis" => "parataxis",
        "punct" => "punct",
        "ref" => "ref",
        "sdep" => "sdep",
        "goeswith" => "goeswith",
        "xsubj" => "xsubj",
        "discourse" => "discourse",
        "acomp" | "ccomp" | "xcomp" | "pcomp" => "comp",
        "dobj" | "iobj" | "pobj" => "obj",
        "nsubj" | "nsubjpass" | "csubj" | "csubjpass" => "subj",
        "amod" | "appos" | "advcl" | "det" | "predet" | "preconj" | "vmod" | "mwe" | "mark"
        | "advmod" | "neg" | "rcmod" | "quantmod" | "nn" | "npadvmod" | "tmod" | "num"
        | "number" | "prep" | "poss" | "possessive" | "prt" => "mod",
        other => {
            return Err(SireError::structure(
                "dependency relation",
                format!("`{other}` has no general class"),
            ));
        }
    })
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

/// Make sure `expected` parse items line up with the utterance's non-silence
/// words, running the contraction splitter once if they do not.
fn reconcile(utt: &mut Utterance, what: &'static str, expected: usize, keep_comma: bool) -> Result<Vec<WordId>> {
    if utt.num_words_no_pau(keep_comma) != expected {
        try_split_words(utt)?;
        let words = utt.num_words_no_pau(keep_comma);
        if words != expected {
            return Err(SireError::ParseMismatch {
                what,
                parse: expected,
                words,
            });
        }
    }
    Ok(utt.words_no_pau(keep_comma))
}

/// Attach a constituency parse: set each word's id and POS tag from its leaf
/// and record its three ancestor phrases.
pub fn attach_constituency(utt: &mut Utterance, tree: &ConstituencyTree, keep_comma: bool) -> Result<()> {
    let leaves = tree.leaves(keep_comma);
    let words = reconcile(utt, "parse leaves", leaves.len(), keep_comma)?;
    for (word, leaf) in words.into_iter().zip(leaves) {
        let label = &tree.node(leaf).label;
        let (pos, id) = label
            .split_once('-')
            .ok_or_else(|| SireError::MalformedParse(format!("leaf `{label}` has no part of speech")))?;
        let attachment = tree.attachment(leaf);
        let w = utt.word_mut(word);
        w.pos = Some(pos.to_string());
        w.id = id.to_string();
        w.constituency = Some(attachment);
    }
    let silences: Vec<WordId> = utt
        .words()
        .iter()
        .copied()
        .filter(|&w| utt.is_silence_word(w))
        .collect();
    for word in silences {
        let w = utt.word_mut(word);
        w.pos = Some("sil".into());
        w.constituency = Some(ConstituencyAttachment::missing());
    }
    utt.set_constituency_attached();
    Ok(())
}

/// Attach a dependency parse: set each word's id from its node and re-index
/// the node to the word's utterance position. Silence and comma words stay
/// unattached.
pub fn attach_dependency(utt: &mut Utterance, mut tree: DependencyTree) -> Result<()> {
    let nodes = tree.nodes_sorted();
    let words = reconcile(utt, "dependency nodes", nodes.len(), false)?;
    for (word, node) in words.into_iter().zip(nodes) {
        let pos = utt.word_pos_in_utt(word)?;
        let n = tree.node_mut(node);
        n.utt_pos = pos;
        let label = n.label.clone();
        let w = utt.word_mut(word);
        w.id = label;
        w.dependency = Some(node);
    }
    utt.set_dependency_tree(tree);
    Ok(())
}
