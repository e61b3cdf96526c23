// Utterance hierarchy: an arena of words, syllables and phonemes.
//
// Ownership runs strictly downward (utterance → words → syllables →
// phonemes); every upward link is a plain arena ID. Three node arenas hold
// every node ever created for the utterance. Three order vectors (`words`,
// `syllables`, `phonemes`) hold the live nodes in depth-first
// word → syllable → phoneme order and give O(1) utterance-relative indexing.
//
// Positions are never cached. `pos_in_*` queries search for the node's ID
// inside the relevant parent sequence, so they stay correct after a
// contraction split rewires the hierarchy. A node replaced by a split stays in
// its arena but drops out of every sequence; querying it gives `NotFound`,
// which always points at a stale ID held by the caller.
//
// Word phoneme lists are derived from the word's syllables, so a word's
// phoneme and syllable counts are the sums over its syllables by
// construction.
//
// Phony phonemes (created by the splitter for word-spanning phonemes) sit in
// their syllable and therefore in their word, but never in the flat phoneme
// sequence: they take no time and get no label line.
//
// See also: `splitter.rs` for the structural edits, `parse.rs` for the parse
// attachments stored on words, `builder.rs` for the feature queries.

use crate::error::{Result, SireError};
use crate::parse::{ConstituencyAttachment, DependencyTree, DepNodeId};
use crate::proto::ProtoUtterance;
use crate::types::{Neighbour, PhonemeId, StateSpan, Stress, SyllableId, VowelId, WordId};
use sire_phonemes::PhonemeInventory;
use smallvec::SmallVec;

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Phoneme {
    pub id: String,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub stress: Option<Stress>,
    pub states: Option<Vec<StateSpan>>,
    pub syllable: SyllableId,
    pub word: WordId,
    /// Zero-duration placeholder created by a contraction split.
    pub phony: bool,
}

#[derive(Clone, Debug)]
pub struct Syllable {
    /// Concatenation of the child phoneme ids.
    pub id: String,
    pub stress: Stress,
    pub vowel: VowelId,
    /// Predicted pitch accent (0 or 1), see `prosody::predict_accents`.
    pub accent: u8,
    pub phonemes: SmallVec<[PhonemeId; 4]>,
    pub word: WordId,
}

#[derive(Clone, Debug)]
pub struct Word {
    /// Orthographic id when text was loaded, phoneme concatenation otherwise.
    pub id: String,
    pub pos: Option<String>,
    pub emph: bool,
    pub syllables: SmallVec<[SyllableId; 4]>,
    pub constituency: Option<ConstituencyAttachment>,
    pub dependency: Option<DepNodeId>,
}

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Utterance {
    pub id: String,
    inventory: PhonemeInventory,
    txtloaded: bool,
    word_nodes: Vec<Word>,
    syllable_nodes: Vec<Syllable>,
    phoneme_nodes: Vec<Phoneme>,
    words: Vec<WordId>,
    syllables: Vec<SyllableId>,
    phonemes: Vec<PhonemeId>,
    constituency_attached: bool,
    dependency_tree: Option<DependencyTree>,
}

impl Utterance {
    /// Build the hierarchy from a proto-utterance in one depth-first pass.
    ///
    /// Every phoneme id must resolve in `inventory`; syllables must not be
    /// empty.
    pub fn from_proto(proto: &ProtoUtterance, inventory: &PhonemeInventory) -> Result<Self> {
        let mut utt = Utterance {
            id: proto.id.clone(),
            inventory: inventory.clone(),
            txtloaded: proto.txtloaded,
            word_nodes: Vec::with_capacity(proto.utt.len()),
            syllable_nodes: Vec::new(),
            phoneme_nodes: Vec::new(),
            words: Vec::with_capacity(proto.utt.len()),
            syllables: Vec::new(),
            phonemes: Vec::new(),
            constituency_attached: false,
            dependency_tree: None,
        };

        for proto_word in &proto.utt {
            let word_id = utt.push_word(Word {
                id: proto_word.id.clone(),
                pos: proto_word.pos.clone(),
                emph: proto_word.emph,
                syllables: SmallVec::new(),
                constituency: None,
                dependency: None,
            });
            utt.words.push(word_id);

            for proto_syll in &proto_word.syllables {
                if proto_syll.phonemes.is_empty() {
                    return Err(SireError::structure(
                        "syllable",
                        format!("`{}` in word `{}` has no phonemes", proto_syll.id, proto_word.id),
                    ));
                }
                let stress = match &proto_syll.stress {
                    Some(s) => s.to_stress()?,
                    None => Stress::Unknown,
                };
                let syll_id = utt.push_syllable(Syllable {
                    id: proto_syll.id.clone(),
                    stress,
                    vowel: VowelId::NoVowel,
                    accent: 0,
                    phonemes: SmallVec::new(),
                    word: word_id,
                });
                utt.syllables.push(syll_id);
                utt.word_nodes[word_id.index()].syllables.push(syll_id);

                for proto_phone in &proto_syll.phonemes {
                    inventory.require(&proto_phone.id)?;
                    let stress = match &proto_phone.stress {
                        Some(s) => Some(s.to_stress()?),
                        None => None,
                    };
                    let phone_id = utt.push_phoneme(Phoneme {
                        id: proto_phone.id.clone(),
                        start: proto_phone.start,
                        end: proto_phone.end,
                        stress,
                        states: proto_phone.states.clone(),
                        syllable: syll_id,
                        word: word_id,
                        phony: false,
                    });
                    utt.phonemes.push(phone_id);
                    utt.syllable_nodes[syll_id.index()].phonemes.push(phone_id);
                }
                let vowel = utt.find_vowel(syll_id);
                utt.syllable_nodes[syll_id.index()].vowel = vowel;
            }
        }
        Ok(utt)
    }

    // -- arena plumbing ----------------------------------------------------

    pub(crate) fn push_word(&mut self, word: Word) -> WordId {
        let id = WordId(self.word_nodes.len() as u32);
        self.word_nodes.push(word);
        id
    }

    pub(crate) fn push_syllable(&mut self, syll: Syllable) -> SyllableId {
        let id = SyllableId(self.syllable_nodes.len() as u32);
        self.syllable_nodes.push(syll);
        id
    }

    pub(crate) fn push_phoneme(&mut self, phoneme: Phoneme) -> PhonemeId {
        let id = PhonemeId(self.phoneme_nodes.len() as u32);
        self.phoneme_nodes.push(phoneme);
        id
    }

    pub(crate) fn word_mut(&mut self, id: WordId) -> &mut Word {
        &mut self.word_nodes[id.index()]
    }

    pub(crate) fn syllable_mut(&mut self, id: SyllableId) -> &mut Syllable {
        &mut self.syllable_nodes[id.index()]
    }

    pub(crate) fn phoneme_mut(&mut self, id: PhonemeId) -> &mut Phoneme {
        &mut self.phoneme_nodes[id.index()]
    }

    pub(crate) fn word_order_mut(&mut self) -> &mut Vec<WordId> {
        &mut self.words
    }

    pub(crate) fn syllable_order_mut(&mut self) -> &mut Vec<SyllableId> {
        &mut self.syllables
    }

    pub(crate) fn set_constituency_attached(&mut self) {
        self.constituency_attached = true;
    }

    pub(crate) fn set_dependency_tree(&mut self, tree: DependencyTree) {
        self.dependency_tree = Some(tree);
    }

    /// First vowel among the syllable's phonemes.
    pub(crate) fn find_vowel(&self, syll: SyllableId) -> VowelId {
        self.syllable(syll)
            .phonemes
            .iter()
            .map(|&p| &self.phoneme(p).id)
            .find(|id| self.inventory.is_vowel(id))
            .map(|id| VowelId::Vowel(id.clone()))
            .unwrap_or(VowelId::NoVowel)
    }

    // -- accessors ---------------------------------------------------------

    pub fn inventory(&self) -> &PhonemeInventory {
        &self.inventory
    }

    pub fn txtloaded(&self) -> bool {
        self.txtloaded
    }

    pub fn word(&self, id: WordId) -> &Word {
        &self.word_nodes[id.index()]
    }

    pub fn syllable(&self, id: SyllableId) -> &Syllable {
        &self.syllable_nodes[id.index()]
    }

    pub fn phoneme(&self, id: PhonemeId) -> &Phoneme {
        &self.phoneme_nodes[id.index()]
    }

    /// Live words in utterance order.
    pub fn words(&self) -> &[WordId] {
        &self.words
    }

    /// Live syllables in utterance order (phony syllables included).
    pub fn syllables(&self) -> &[SyllableId] {
        &self.syllables
    }

    /// Live phonemes in utterance order (phony phonemes excluded).
    pub fn phonemes(&self) -> &[PhonemeId] {
        &self.phonemes
    }

    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    pub fn num_syllables(&self) -> usize {
        self.syllables.len()
    }

    pub fn num_phonemes(&self) -> usize {
        self.phonemes.len()
    }

    pub fn constituency_attached(&self) -> bool {
        self.constituency_attached
    }

    pub fn dependency_tree(&self) -> Option<&DependencyTree> {
        self.dependency_tree.as_ref()
    }

    #[allow(dead_code)]
    pub(crate) fn dependency_tree_mut(&mut self) -> Option<&mut DependencyTree> {
        self.dependency_tree.as_mut()
    }

    /// Phonemes of a word, derived from its syllables.
    pub fn word_phonemes(&self, word: WordId) -> Vec<PhonemeId> {
        self.word(word)
            .syllables
            .iter()
            .flat_map(|&s| self.syllable(s).phonemes.iter().copied())
            .collect()
    }

    pub fn word_num_phonemes(&self, word: WordId) -> usize {
        self.word(word)
            .syllables
            .iter()
            .map(|&s| self.syllable(s).phonemes.len())
            .sum()
    }

    pub fn word_num_syllables(&self, word: WordId) -> usize {
        self.word(word).syllables.len()
    }

    pub fn syllable_num_phonemes(&self, syll: SyllableId) -> usize {
        self.syllable(syll).phonemes.len()
    }

    /// True if the word is a silence word (its id is a silence symbol).
    pub fn is_silence_word(&self, word: WordId) -> bool {
        self.inventory.is_silence(&self.word(word).id)
    }

    /// True if the word's first phoneme is silence.
    pub fn word_starts_with_silence(&self, word: WordId) -> bool {
        self.word(word)
            .syllables
            .first()
            .and_then(|&s| self.syllable(s).phonemes.first())
            .is_some_and(|&p| self.inventory.is_silence(&self.phoneme(p).id))
    }

    /// Words that are neither silence nor (unless `keep_comma`) a comma.
    /// These are the words a parse is expected to cover.
    pub fn words_no_pau(&self, keep_comma: bool) -> Vec<WordId> {
        self.words
            .iter()
            .copied()
            .filter(|&w| {
                let id = &self.word(w).id;
                !self.inventory.is_silence(id) && (keep_comma || id != ",")
            })
            .collect()
    }

    pub fn num_words_no_pau(&self, keep_comma: bool) -> usize {
        self.words_no_pau(keep_comma).len()
    }

    // -- timing ------------------------------------------------------------

    pub fn syllable_start_time(&self, syll: SyllableId) -> Option<i64> {
        let first = *self.syllable(syll).phonemes.first()?;
        self.phoneme(first).start
    }

    pub fn syllable_end_time(&self, syll: SyllableId) -> Option<i64> {
        let last = *self.syllable(syll).phonemes.last()?;
        self.phoneme(last).end
    }

    pub fn phoneme_duration(&self, phoneme: PhonemeId) -> Option<i64> {
        let p = self.phoneme(phoneme);
        Some(p.end? - p.start?)
    }

    // -- positions ---------------------------------------------------------

    pub fn phoneme_pos_in_syllable(&self, phoneme: PhonemeId) -> Result<usize> {
        let p = self.phoneme(phoneme);
        let syll = self.syllable(p.syllable);
        syll.phonemes
            .iter()
            .position(|&x| x == phoneme)
            .ok_or_else(|| SireError::not_found("phoneme", &p.id, format!("syllable {}", syll.id)))
    }

    pub fn phoneme_pos_in_word(&self, phoneme: PhonemeId) -> Result<usize> {
        let p = self.phoneme(phoneme);
        self.word_phonemes(p.word)
            .iter()
            .position(|&x| x == phoneme)
            .ok_or_else(|| {
                SireError::not_found("phoneme", &p.id, format!("word {}", self.word(p.word).id))
            })
    }

    pub fn phoneme_pos_in_utt(&self, phoneme: PhonemeId) -> Result<usize> {
        self.phonemes.iter().position(|&x| x == phoneme).ok_or_else(|| {
            SireError::not_found("phoneme", &self.phoneme(phoneme).id, format!("utterance {}", self.id))
        })
    }

    pub fn syllable_pos_in_word(&self, syll: SyllableId) -> Result<usize> {
        let s = self.syllable(syll);
        self.word(s.word)
            .syllables
            .iter()
            .position(|&x| x == syll)
            .ok_or_else(|| {
                SireError::not_found("syllable", &s.id, format!("word {}", self.word(s.word).id))
            })
    }

    pub fn syllable_pos_in_utt(&self, syll: SyllableId) -> Result<usize> {
        self.syllables.iter().position(|&x| x == syll).ok_or_else(|| {
            SireError::not_found("syllable", &self.syllable(syll).id, format!("utterance {}", self.id))
        })
    }

    pub fn word_pos_in_utt(&self, word: WordId) -> Result<usize> {
        self.words.iter().position(|&x| x == word).ok_or_else(|| {
            SireError::not_found("word", &self.word(word).id, format!("utterance {}", self.id))
        })
    }

    // -- neighbours --------------------------------------------------------

    /// Phoneme `offset` places away in the utterance (e.g. -2 for
    /// left-left, +1 for right).
    pub fn phoneme_neighbour(&self, phoneme: PhonemeId, offset: isize) -> Result<Neighbour<PhonemeId>> {
        let pos = self.phoneme_pos_in_utt(phoneme)?;
        Ok(Neighbour::at(&self.phonemes, pos, offset))
    }

    pub fn left_phoneme(&self, phoneme: PhonemeId) -> Result<Neighbour<PhonemeId>> {
        self.phoneme_neighbour(phoneme, -1)
    }

    pub fn left_left_phoneme(&self, phoneme: PhonemeId) -> Result<Neighbour<PhonemeId>> {
        self.phoneme_neighbour(phoneme, -2)
    }

    pub fn right_phoneme(&self, phoneme: PhonemeId) -> Result<Neighbour<PhonemeId>> {
        self.phoneme_neighbour(phoneme, 1)
    }

    pub fn right_right_phoneme(&self, phoneme: PhonemeId) -> Result<Neighbour<PhonemeId>> {
        self.phoneme_neighbour(phoneme, 2)
    }

    pub fn left_syllable(&self, syll: SyllableId) -> Result<Neighbour<SyllableId>> {
        let pos = self.syllable_pos_in_utt(syll)?;
        Ok(Neighbour::at(&self.syllables, pos, -1))
    }

    pub fn right_syllable(&self, syll: SyllableId) -> Result<Neighbour<SyllableId>> {
        let pos = self.syllable_pos_in_utt(syll)?;
        Ok(Neighbour::at(&self.syllables, pos, 1))
    }

    pub fn prev_word(&self, word: WordId) -> Result<Neighbour<WordId>> {
        let pos = self.word_pos_in_utt(word)?;
        Ok(Neighbour::at(&self.words, pos, -1))
    }

    pub fn next_word(&self, word: WordId) -> Result<Neighbour<WordId>> {
        let pos = self.word_pos_in_utt(word)?;
        Ok(Neighbour::at(&self.words, pos, 1))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::proto::{ProtoPhoneme, ProtoStress, ProtoSyllable, ProtoWord};

    /// Helper: build a proto word from `(syllable stress, [phonemes])` pairs.
    /// Syllable ids are phoneme concatenations; timings are 10 units per
    /// phoneme starting at `*clock`.
    pub(crate) fn proto_word(id: &str, sylls: &[(&str, &[&str])], clock: &mut i64) -> ProtoWord {
        ProtoWord {
            id: id.to_string(),
            pos: None,
            emph: false,
            syllables: sylls
                .iter()
                .map(|(stress, phones)| ProtoSyllable {
                    id: phones.concat(),
                    stress: Some(ProtoStress::Text(stress.to_string())),
                    phonemes: phones
                        .iter()
                        .map(|p| {
                            let start = *clock;
                            *clock += 10;
                            ProtoPhoneme {
                                id: p.to_string(),
                                start: Some(start),
                                end: Some(*clock),
                                stress: None,
                                states: None,
                            }
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Helper: `sil the cat sil` with single unstressed syllables.
    pub(crate) fn the_cat() -> ProtoUtterance {
        let mut clock = 0;
        ProtoUtterance {
            id: "the_cat".into(),
            txtloaded: true,
            utt: vec![
                proto_word("sil", &[("0", &["sil"])], &mut clock),
                proto_word("the", &[("0", &["D", "@"])], &mut clock),
                proto_word("cat", &[("0", &["k", "a", "t"])], &mut clock),
                proto_word("sil", &[("0", &["sil"])], &mut clock),
            ],
        }
    }

    fn phone_named(utt: &Utterance, id: &str) -> PhonemeId {
        *utt.phonemes()
            .iter()
            .find(|&&p| utt.phoneme(p).id == id)
            .unwrap()
    }

    #[test]
    fn build_flattens_depth_first() {
        let utt = Utterance::from_proto(&the_cat(), &PhonemeInventory::combilex()).unwrap();
        assert_eq!(utt.num_words(), 4);
        assert_eq!(utt.num_syllables(), 4);
        assert_eq!(utt.num_phonemes(), 7);
        let ids: Vec<&str> = utt.phonemes().iter().map(|&p| utt.phoneme(p).id.as_str()).collect();
        assert_eq!(ids, ["sil", "D", "@", "k", "a", "t", "sil"]);
    }

    #[test]
    fn positions_are_relative_to_each_parent() {
        let utt = Utterance::from_proto(&the_cat(), &PhonemeInventory::combilex()).unwrap();
        let a = phone_named(&utt, "a");
        assert_eq!(utt.phoneme_pos_in_syllable(a).unwrap(), 1);
        assert_eq!(utt.phoneme_pos_in_word(a).unwrap(), 1);
        assert_eq!(utt.phoneme_pos_in_utt(a).unwrap(), 4);
        let w = utt.phoneme(a).word;
        assert_eq!(utt.word_pos_in_utt(w).unwrap(), 2);
        assert_eq!(utt.word_num_phonemes(w), 3);
    }

    #[test]
    fn neighbours_fall_outside_at_edges() {
        let utt = Utterance::from_proto(&the_cat(), &PhonemeInventory::combilex()).unwrap();
        let first = utt.phonemes()[0];
        let last = *utt.phonemes().last().unwrap();
        assert!(utt.left_phoneme(first).unwrap().is_outside());
        assert!(utt.left_left_phoneme(utt.phonemes()[1]).unwrap().is_outside());
        assert!(utt.right_phoneme(last).unwrap().is_outside());
        assert_eq!(utt.right_right_phoneme(first).unwrap().inside(), Some(utt.phonemes()[2]));
        let first_word = utt.words()[0];
        assert!(utt.prev_word(first_word).unwrap().is_outside());
    }

    #[test]
    fn vowel_ids_and_silence_words() {
        let utt = Utterance::from_proto(&the_cat(), &PhonemeInventory::combilex()).unwrap();
        let sylls = utt.syllables();
        assert_eq!(utt.syllable(sylls[0]).vowel, VowelId::NoVowel);
        assert_eq!(utt.syllable(sylls[2]).vowel, VowelId::Vowel("a".into()));
        assert_eq!(utt.num_words_no_pau(false), 2);
        assert!(utt.is_silence_word(utt.words()[3]));
    }

    #[test]
    fn unknown_phoneme_rejected() {
        let mut proto = the_cat();
        proto.utt[1].syllables[0].phonemes[0].id = "DH".into();
        let err = Utterance::from_proto(&proto, &PhonemeInventory::combilex()).unwrap_err();
        assert!(matches!(err, SireError::UnknownPhoneme(_)), "got {:?}", err);
    }

    #[test]
    fn empty_syllable_rejected() {
        let mut proto = the_cat();
        proto.utt[2].syllables[0].phonemes.clear();
        assert!(Utterance::from_proto(&proto, &PhonemeInventory::combilex()).is_err());
    }

    #[test]
    fn missing_syllable_stress_is_unknown() {
        let mut proto = the_cat();
        proto.utt[2].syllables[0].stress = None;
        let utt = Utterance::from_proto(&proto, &PhonemeInventory::combilex()).unwrap();
        assert_eq!(utt.syllable(utt.syllables()[2]).stress, Stress::Unknown);
    }

    #[test]
    fn durations_and_syllable_times() {
        let utt = Utterance::from_proto(&the_cat(), &PhonemeInventory::combilex()).unwrap();
        let cat_syll = utt.syllables()[2];
        assert_eq!(utt.syllable_start_time(cat_syll), Some(30));
        assert_eq!(utt.syllable_end_time(cat_syll), Some(60));
        assert_eq!(utt.phoneme_duration(utt.phonemes()[0]), Some(10));
    }
}
