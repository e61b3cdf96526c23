// Static phoneme tables.
//
// One row per symbol: `(symbol, [VOC, VL, VH, VF, VR, CT, CA, V])`. Both
// tables end with the shared non-phonetic rows: the silence symbols (`#`,
// `sil`, `pau`), the pre-utterance sentinel `xx`, the no-vowel sentinel
// `novowel`, and the experimental `UH` hesitation vowel.
//
// The CMUdict table uses two extra height values (`mh`, `ml`), the length
// value `s` for the short high vowels and frontness `v` for `er`; they are
// carried through verbatim since feature values are opaque label tokens.

use crate::FeatureVector;

pub(crate) const COMBILEX: &[(&str, FeatureVector)] = &[
    ("p", ["c", "c", "c", "c", "c", "s", "la", "u"]),
    ("t", ["c", "c", "c", "c", "c", "s", "a", "u"]),
    ("G", ["c", "c", "c", "c", "c", "s", "g", "v"]),
    ("t^", ["c", "c", "c", "c", "c", "ap", "a", "v"]),
    ("g", ["c", "c", "c", "c", "c", "s", "ve", "v"]),
    ("k", ["c", "c", "c", "c", "c", "s", "ve", "u"]),
    ("m", ["c", "c", "c", "c", "c", "n", "la", "v"]),
    ("b", ["c", "c", "c", "c", "c", "s", "la", "v"]),
    ("d", ["c", "c", "c", "c", "c", "s", "a", "v"]),
    ("x", ["c", "c", "c", "c", "c", "f", "ve", "u"]),
    ("tS", ["c", "c", "c", "c", "c", "af", "p", "u"]),
    ("dZ", ["c", "c", "c", "c", "c", "af", "p", "v"]),
    ("s", ["c", "c", "c", "c", "c", "f", "a", "u"]),
    ("z", ["c", "c", "c", "c", "c", "f", "a", "v"]),
    ("S", ["c", "c", "c", "c", "c", "f", "p", "u"]),
    ("Z", ["c", "c", "c", "c", "c", "f", "p", "v"]),
    ("f", ["c", "c", "c", "c", "c", "f", "ld", "u"]),
    ("v", ["c", "c", "c", "c", "c", "f", "ld", "v"]),
    ("T", ["c", "c", "c", "c", "c", "f", "d", "u"]),
    ("D", ["c", "c", "c", "c", "c", "f", "d", "v"]),
    ("h", ["c", "c", "c", "c", "c", "f", "g", "u"]),
    ("m!", ["c", "c", "c", "c", "c", "n", "la", "v"]),
    ("n", ["c", "c", "c", "c", "c", "n", "a", "v"]),
    ("n!", ["c", "c", "c", "c", "c", "n", "a", "v"]),
    ("N", ["c", "c", "c", "c", "c", "n", "ve", "v"]),
    ("l", ["c", "c", "c", "c", "c", "l", "a", "v"]),
    ("lw", ["c", "c", "c", "c", "c", "l", "a", "v"]),
    ("l!", ["c", "c", "c", "c", "c", "l", "a", "v"]),
    ("r", ["c", "c", "c", "c", "c", "ap", "a", "v"]),
    ("j", ["c", "c", "c", "c", "c", "l", "p", "v"]),
    ("w", ["c", "c", "c", "c", "c", "l", "la", "v"]),
    ("E", ["v", "sh", "m", "f", "u", "v", "vo", "v"]),
    ("a", ["v", "sh", "l", "f", "u", "v", "vo", "v"]),
    ("A", ["v", "l", "l", "b", "u", "v", "vo", "v"]),
    ("@U", ["v", "d", "m", "b", "r", "v", "vo", "v"]),
    ("o^", ["v", "l", "m", "b", "r", "v", "vo", "v"]),
    ("e^", ["v", "l", "m", "f", "r", "v", "vo", "v"]),
    ("Q", ["v", "sh", "l", "b", "r", "v", "vo", "v"]),
    ("O", ["v", "l", "m", "b", "r", "v", "vo", "v"]),
    ("Or", ["v", "l", "m", "b", "r", "v", "vo", "v"]),
    ("i", ["v", "l", "h", "f", "u", "v", "vo", "v"]),
    ("I", ["v", "sh", "h", "f", "u", "v", "vo", "v"]),
    ("@r", ["v", "sc", "m", "m", "u", "v", "vo", "v"]),
    ("@", ["v", "sc", "m", "m", "u", "v", "vo", "v"]),
    ("V", ["v", "sh", "l", "m", "u", "v", "vo", "v"]),
    ("U", ["v", "sh", "h", "b", "r", "v", "vo", "v"]),
    ("u", ["v", "l", "h", "b", "r", "v", "vo", "v"]),
    ("eI", ["v", "d", "m", "f", "u", "v", "vo", "v"]),
    ("aI", ["v", "d", "l", "m", "u", "v", "vo", "v"]),
    ("ae", ["v", "d", "l", "m", "u", "v", "vo", "v"]),
    ("OI", ["v", "d", "m", "b", "r", "v", "vo", "v"]),
    ("aU", ["v", "d", "l", "m", "u", "v", "vo", "v"]),
    ("I@", ["v", "d", "h", "f", "u", "v", "vo", "v"]),
    ("@@", ["v", "l", "m", "m", "u", "v", "vo", "v"]),
    ("@@r", ["v", "l", "m", "m", "u", "v", "vo", "v"]),
    ("E@", ["v", "sh", "m", "f", "u", "v", "vo", "v"]),
    ("U@", ["v", "d", "h", "b", "r", "v", "vo", "v"]),
    ("#", ["xx", "xx", "xx", "xx", "xx", "xx", "xx", "u"]),
    ("sil", ["xx", "xx", "xx", "xx", "xx", "xx", "xx", "u"]),
    ("pau", ["xx", "xx", "xx", "xx", "xx", "xx", "xx", "u"]),
    ("xx", ["xx", "xx", "xx", "xx", "xx", "xx", "xx", "xx"]),
    ("novowel", ["c", "c", "c", "c", "c", "xx", "xx", "xx"]),
    ("UH", ["v", "sh", "l", "m", "u", "v", "vo", "v"]),
];

pub(crate) const CMUDICT: &[(&str, FeatureVector)] = &[
    ("aa", ["v", "sh", "l", "b", "u", "v", "vo", "v"]),
    ("ae", ["v", "sh", "ml", "f", "u", "v", "vo", "v"]),
    ("ah", ["v", "sc", "m", "m", "u", "v", "vo", "v"]),
    ("ao", ["v", "sh", "ml", "b", "r", "v", "vo", "v"]),
    ("aw", ["v", "d", "l", "m", "u", "v", "vo", "v"]),
    ("ay", ["v", "d", "l", "m", "u", "v", "vo", "v"]),
    ("b", ["c", "c", "c", "c", "c", "s", "la", "v"]),
    ("ch", ["c", "c", "c", "c", "c", "af", "p", "u"]),
    ("d", ["c", "c", "c", "c", "c", "s", "a", "v"]),
    ("dh", ["c", "c", "c", "c", "c", "f", "d", "v"]),
    ("eh", ["v", "sh", "ml", "f", "u", "v", "vo", "v"]),
    ("er", ["v", "sh", "ml", "v", "u", "v", "vo", "v"]),
    ("ey", ["v", "d", "mh", "f", "u", "v", "vo", "v"]),
    ("f", ["c", "c", "c", "c", "c", "f", "ld", "u"]),
    ("v", ["c", "c", "c", "c", "c", "f", "ld", "v"]),
    ("g", ["c", "c", "c", "c", "c", "s", "ve", "v"]),
    ("hh", ["c", "c", "c", "c", "c", "f", "g", "u"]),
    ("ih", ["v", "s", "h", "f", "u", "v", "vo", "v"]),
    ("iy", ["v", "l", "h", "f", "u", "v", "vo", "v"]),
    ("jh", ["c", "c", "c", "c", "c", "af", "p", "v"]),
    ("k", ["c", "c", "c", "c", "c", "s", "ve", "u"]),
    ("l", ["c", "c", "c", "c", "c", "l", "a", "v"]),
    ("m", ["c", "c", "c", "c", "c", "n", "la", "v"]),
    ("n", ["c", "c", "c", "c", "c", "n", "a", "v"]),
    ("ng", ["c", "c", "c", "c", "c", "n", "ve", "v"]),
    ("ow", ["v", "d", "mh", "b", "r", "v", "vo", "v"]),
    ("oy", ["v", "d", "ml", "b", "r", "v", "vo", "v"]),
    ("p", ["c", "c", "c", "c", "c", "s", "la", "u"]),
    ("r", ["c", "c", "c", "c", "c", "l", "a", "v"]),
    ("s", ["c", "c", "c", "c", "c", "f", "a", "u"]),
    ("sh", ["c", "c", "c", "c", "c", "f", "p", "u"]),
    ("t", ["c", "c", "c", "c", "c", "s", "a", "u"]),
    ("th", ["c", "c", "c", "c", "c", "f", "d", "u"]),
    ("uh", ["v", "s", "h", "b", "r", "v", "vo", "v"]),
    ("uw", ["v", "l", "h", "b", "r", "v", "vo", "v"]),
    ("w", ["c", "c", "c", "c", "c", "l", "la", "v"]),
    ("y", ["c", "c", "c", "c", "c", "l", "p", "v"]),
    ("z", ["c", "c", "c", "c", "c", "f", "a", "v"]),
    ("zh", ["c", "c", "c", "c", "c", "f", "p", "v"]),
    ("#", ["xx", "xx", "xx", "xx", "xx", "xx", "xx", "u"]),
    ("sil", ["xx", "xx", "xx", "xx", "xx", "xx", "xx", "u"]),
    ("pau", ["xx", "xx", "xx", "xx", "xx", "xx", "xx", "u"]),
    ("xx", ["xx", "xx", "xx", "xx", "xx", "xx", "xx", "xx"]),
    ("novowel", ["c", "c", "c", "c", "c", "xx", "xx", "xx"]),
    ("UH", ["v", "sh", "l", "m", "u", "v", "vo", "v"]),
];
