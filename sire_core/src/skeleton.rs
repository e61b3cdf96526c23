// Context skeletons: the typed schema of every feature a context may carry.
//
// A `Schema` is an ordered table of feature name → `TypeTag`, composed by
// merging named `FeatureBlock`s (basic, one positional encoding, Festival,
// and optionally constituency, dependency or emphasis). A `ContextType`
// selects the blocks; combined parse types are simply the union of both
// parse blocks. Schemas are built once per run and shared behind an `Arc`.
//
// Two realisations of a schema:
// - `Context`: one phoneme's values. Each feature may be added once; adding
//   an unknown name, a duplicate, or a value that does not fit the type tag
//   is an immediate error. Values keep insertion order, which is the order
//   they are written to the label line.
// - `ContextPopulation`: every value seen for each feature across many
//   contexts, for question fitting. Re-adding a name appends.
//
// Type tags replace the `"int0xx"`-style strings of the label tooling with
// explicit flags; `Display` renders the compact form for error messages.

use crate::error::{Result, SireError};
use crate::types::SENTINEL;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use sire_phonemes::FeatureColumn;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Type tags
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Timing fields. Never produce questions.
    Untyped,
    /// Any string; questions are set membership.
    Bool,
    Int,
    Float,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag {
    pub kind: ValueKind,
    /// `xx` is a legal value.
    pub allows_sentinel: bool,
    /// 0 is a real value rather than only silence; threshold questions start
    /// at 0 instead of 1.
    pub zero_valid: bool,
    /// Routed into the utterance-level (GV) question set as well.
    pub utterance_level: bool,
}

impl TypeTag {
    const fn new(kind: ValueKind, allows_sentinel: bool, zero_valid: bool, utterance_level: bool) -> Self {
        TypeTag {
            kind,
            allows_sentinel,
            zero_valid,
            utterance_level,
        }
    }

    pub const UNTYPED: TypeTag = TypeTag::new(ValueKind::Untyped, false, false, false);
    pub const BOOL: TypeTag = TypeTag::new(ValueKind::Bool, false, false, false);
    pub const INT: TypeTag = TypeTag::new(ValueKind::Int, false, false, false);
    pub const INT0: TypeTag = TypeTag::new(ValueKind::Int, false, true, false);
    pub const INTXX: TypeTag = TypeTag::new(ValueKind::Int, true, false, false);
    pub const INT0XX: TypeTag = TypeTag::new(ValueKind::Int, true, true, false);
    pub const INT_UTT: TypeTag = TypeTag::new(ValueKind::Int, false, false, true);
    pub const INT0_UTT: TypeTag = TypeTag::new(ValueKind::Int, false, true, true);
    pub const FLOAT: TypeTag = TypeTag::new(ValueKind::Float, false, false, false);
    pub const FLOATXX: TypeTag = TypeTag::new(ValueKind::Float, true, false, false);

    /// Check that `value` fits this tag.
    fn accepts(&self, name: &str, value: &str) -> bool {
        let sentinel = self.allows_sentinel && value == SENTINEL;
        match self.kind {
            ValueKind::Untyped => (name == "start" || name == "end") && value.parse::<i64>().is_ok(),
            ValueKind::Bool => true,
            ValueKind::Int => value.parse::<i64>().is_ok() || sentinel,
            ValueKind::Float => value.parse::<f64>().is_ok() || sentinel,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ValueKind::Untyped => "untyped",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
        };
        f.write_str(kind)?;
        if self.zero_valid {
            f.write_str("0")?;
        }
        if self.allows_sentinel {
            f.write_str(SENTINEL)?;
        }
        if self.utterance_level {
            f.write_str("utt")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Context types and blocks
// ---------------------------------------------------------------------------

/// How positions inside syllables, words and the utterance are expressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionEncoding {
    Categorical,
    Absolute,
    #[default]
    Relational,
}

impl PositionEncoding {
    pub fn name(self) -> &'static str {
        match self {
            PositionEncoding::Categorical => "Categorical",
            PositionEncoding::Absolute => "Absolute",
            PositionEncoding::Relational => "Relational",
        }
    }
}

impl FromStr for PositionEncoding {
    type Err = SireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "categorical" => Ok(PositionEncoding::Categorical),
            "absolute" => Ok(PositionEncoding::Absolute),
            "relational" => Ok(PositionEncoding::Relational),
            _ => Err(SireError::configuration(
                "context type",
                s,
                "categorical, absolute or relational",
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParseFeatures {
    None,
    Constituency,
    Dependency,
    Combined,
}

impl ParseFeatures {
    pub fn from_flags(constituency: bool, dependency: bool) -> Self {
        match (constituency, dependency) {
            (false, false) => ParseFeatures::None,
            (true, false) => ParseFeatures::Constituency,
            (false, true) => ParseFeatures::Dependency,
            (true, true) => ParseFeatures::Combined,
        }
    }

    pub fn constituency(self) -> bool {
        matches!(self, ParseFeatures::Constituency | ParseFeatures::Combined)
    }

    pub fn dependency(self) -> bool {
        matches!(self, ParseFeatures::Dependency | ParseFeatures::Combined)
    }
}

/// The context flavour: one positional encoding, optional parse features,
/// optional emphasis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextType {
    encoding: PositionEncoding,
    parse: ParseFeatures,
    emphasis: bool,
}

impl ContextType {
    /// Emphasis features exist only for the Absolute encoding without parse
    /// features.
    pub fn new(encoding: PositionEncoding, parse: ParseFeatures, emphasis: bool) -> Result<Self> {
        if emphasis && (encoding != PositionEncoding::Absolute || parse != ParseFeatures::None) {
            return Err(SireError::configuration(
                "context type",
                format!("{} with emphasis", ContextType { encoding, parse, emphasis: false }.name()),
                "emphasis only with the absolute encoding and no parse features",
            ));
        }
        Ok(ContextType {
            encoding,
            parse,
            emphasis,
        })
    }

    pub fn plain(encoding: PositionEncoding) -> Self {
        ContextType {
            encoding,
            parse: ParseFeatures::None,
            emphasis: false,
        }
    }

    pub fn encoding(&self) -> PositionEncoding {
        self.encoding
    }

    pub fn parse(&self) -> ParseFeatures {
        self.parse
    }

    pub fn emphasis(&self) -> bool {
        self.emphasis
    }

    /// e.g. `Relational`, `AbsoluteStanfordDependency`, `Emphasis`.
    pub fn name(&self) -> String {
        if self.emphasis {
            return "Emphasis".into();
        }
        let suffix = match self.parse {
            ParseFeatures::None => "",
            ParseFeatures::Constituency => "StanfordPcfg",
            ParseFeatures::Dependency => "StanfordDependency",
            ParseFeatures::Combined => "StanfordCombined",
        };
        format!("{}{}", self.encoding.name(), suffix)
    }

    pub fn blocks(&self) -> Vec<FeatureBlock> {
        let mut blocks = vec![
            FeatureBlock::Basic,
            FeatureBlock::Positional(self.encoding),
            FeatureBlock::Festival,
        ];
        if self.parse.constituency() {
            blocks.push(FeatureBlock::Constituency(self.encoding));
        }
        if self.parse.dependency() {
            blocks.push(FeatureBlock::Dependency(self.encoding));
        }
        if self.emphasis {
            blocks.push(FeatureBlock::Emphasis);
        }
        blocks
    }
}

/// A named group of features that always travel together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureBlock {
    Basic,
    Positional(PositionEncoding),
    Festival,
    Constituency(PositionEncoding),
    Dependency(PositionEncoding),
    Emphasis,
}

impl FeatureBlock {
    /// The block's features in declaration order.
    pub fn features(self) -> Vec<(String, TypeTag)> {
        let mut out: Vec<(String, TypeTag)> = Vec::new();
        let mut push = |names: &[&str], tag: TypeTag| {
            out.extend(names.iter().map(|n| (n.to_string(), tag)));
        };
        match self {
            FeatureBlock::Basic => {
                push(&["start", "end"], TypeTag::UNTYPED);
                push(&["llp", "lp", "cp", "rp", "rrp"], TypeTag::BOOL);
                for col in FeatureColumn::ALL {
                    let c = col.name();
                    push(
                        &[format!("lp{c}").as_str(), format!("cp{c}").as_str(), format!("rp{c}").as_str()],
                        TypeTag::BOOL,
                    );
                }
                push(&["lss"], TypeTag::INT0XX);
                push(&["css"], TypeTag::INT0);
                push(&["rss"], TypeTag::INT0XX);
                push(&["lsnp"], TypeTag::INTXX);
                push(&["csnp"], TypeTag::INT);
                push(&["rsnp"], TypeTag::INTXX);
                push(&["svid"], TypeTag::BOOL);
                for col in FeatureColumn::ALL {
                    push(&[format!("sv{}", col.name()).as_str()], TypeTag::BOOL);
                }
                push(&["snss", "spss"], TypeTag::INTXX);
                push(&["wnp", "wns"], TypeTag::INTXX);
                push(&["unp", "uns", "unw"], TypeTag::INT_UTT);
            }
            FeatureBlock::Positional(PositionEncoding::Categorical) => push(
                &[
                    "cpsp", "lpsp", "rpsp", "cpwp", "lpwp", "rpwp", "cswp", "lswp", "rswp", "cwup",
                    "lwup", "rwup",
                ],
                TypeTag::BOOL,
            ),
            FeatureBlock::Positional(encoding) => {
                let tag = if encoding == PositionEncoding::Absolute {
                    TypeTag::INT0
                } else {
                    TypeTag::FLOAT
                };
                push(
                    &["pfwsp", "pbwsp", "pfwwp", "pbwwp", "sfwwp", "sbwwp", "wfwup", "wbwup"],
                    tag,
                );
            }
            FeatureBlock::Festival => {
                push(&["rgpos", "cgpos", "lgpos"], TypeTag::BOOL);
                push(&["csacc", "nasbcs", "nasacs"], TypeTag::INT0);
                push(&["pasd", "nasd"], TypeTag::INTXX);
            }
            FeatureBlock::Constituency(encoding) => {
                push(&["wpp", "wgpp", "wggpp"], TypeTag::BOOL);
                match encoding {
                    PositionEncoding::Categorical => push(
                        &[
                            "rwcppp", "rwcgppp", "rwcggppp", "cwcppp", "cwcgppp", "cwcggppp",
                            "lwcppp", "lwcgppp", "lwcggppp",
                        ],
                        TypeTag::BOOL,
                    ),
                    PositionEncoding::Absolute => push(&CONSTITUENCY_POSITIONS, TypeTag::INT0XX),
                    PositionEncoding::Relational => push(&CONSTITUENCY_POSITIONS, TypeTag::FLOAT),
                }
            }
            FeatureBlock::Dependency(encoding) => {
                push(&["wpdr", "wgpdr", "wggpdr", "wpgdr"], TypeTag::BOOL);
                push(&["dnc"], TypeTag::INT0XX);
                push(&["dtdlw", "dtdrw"], TypeTag::INTXX);
                let tag = match encoding {
                    PositionEncoding::Categorical => TypeTag::BOOL,
                    PositionEncoding::Absolute => TypeTag::INTXX,
                    PositionEncoding::Relational => TypeTag::FLOATXX,
                };
                push(&["wdpr", "wdgpr", "wdggpr"], tag);
            }
            FeatureBlock::Emphasis => {
                push(&["wemph", "fwemph", "bwemph"], TypeTag::BOOL);
                push(&["wnew", "wpew"], TypeTag::INTXX);
                push(&["unew"], TypeTag::INT0_UTT);
            }
        }
        out
    }
}

const CONSTITUENCY_POSITIONS: [&str; 6] = [
    "wfwrppp", "wbwrppp", "wfwrgppp", "wbwrgppp", "wfwrggppp", "wbwrggppp",
];

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureSpec {
    pub name: String,
    pub tag: TypeTag,
}

/// Ordered feature name → type tag table.
#[derive(Clone, Debug)]
pub struct Schema {
    name: String,
    fields: Vec<FeatureSpec>,
    index: FxHashMap<String, usize>,
}

impl Schema {
    /// Merge blocks in order. A name declared by an earlier block wins.
    pub fn from_blocks(name: impl Into<String>, blocks: &[FeatureBlock]) -> Self {
        let mut schema = Schema {
            name: name.into(),
            fields: Vec::new(),
            index: FxHashMap::default(),
        };
        for block in blocks {
            for (feature, tag) in block.features() {
                if schema.index.contains_key(&feature) {
                    continue;
                }
                schema.index.insert(feature.clone(), schema.fields.len());
                schema.fields.push(FeatureSpec { name: feature, tag });
            }
        }
        schema
    }

    pub fn for_context_type(context_type: &ContextType) -> Self {
        Self::from_blocks(context_type.name(), &context_type.blocks())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FeatureSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn tag(&self, name: &str) -> Option<TypeTag> {
        self.index_of(name).map(|i| self.fields[i].tag)
    }

    /// Resolve `name` and validate `value` against its tag.
    pub fn check_value(&self, name: &str, value: &str) -> Result<usize> {
        let idx = self.index_of(name).ok_or_else(|| SireError::UnknownFeature {
            name: name.to_string(),
            skeleton: self.name.clone(),
        })?;
        let tag = self.fields[idx].tag;
        if !tag.accepts(name, value) {
            return Err(SireError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
                tag: tag.to_string(),
            });
        }
        Ok(idx)
    }
}

// ---------------------------------------------------------------------------
// Realised contexts
// ---------------------------------------------------------------------------

/// One phoneme's feature values against a schema.
#[derive(Clone, Debug)]
pub struct Context {
    schema: Arc<Schema>,
    values: Vec<Option<String>>,
    order: Vec<usize>,
}

impl Context {
    pub fn new(schema: Arc<Schema>) -> Self {
        let n = schema.len();
        Context {
            schema,
            values: vec![None; n],
            order: Vec::with_capacity(n),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Add a value. Unknown names, duplicates and values that do not fit
    /// the feature's type tag are errors.
    pub fn add(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let idx = self.schema.check_value(name, &value)?;
        if let Some(existing) = &self.values[idx] {
            return Err(SireError::DuplicateFeature {
                name: name.to_string(),
                existing: existing.clone(),
                value,
            });
        }
        self.values[idx] = Some(value);
        self.order.push(idx);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.schema
            .index_of(name)
            .and_then(|i| self.values[i].as_deref())
    }

    /// Added values as (feature, value) in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&FeatureSpec, &str)> {
        self.order.iter().filter_map(move |&i| {
            self.values[i]
                .as_deref()
                .map(|v| (&self.schema.fields[i], v))
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Schema features that have no value yet.
    pub fn missing(&self) -> Vec<&str> {
        self.schema
            .fields
            .iter()
            .zip(&self.values)
            .filter(|(_, v)| v.is_none())
            .map(|(f, _)| f.name.as_str())
            .collect()
    }
}

/// Every value seen per feature across many contexts.
#[derive(Clone, Debug)]
pub struct ContextPopulation {
    schema: Arc<Schema>,
    values: Vec<Vec<String>>,
}

impl ContextPopulation {
    pub fn new(schema: Arc<Schema>) -> Self {
        let n = schema.len();
        ContextPopulation {
            schema,
            values: vec![Vec::new(); n],
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Validate and append a value.
    pub fn add_multiple(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let idx = self.schema.check_value(name, &value)?;
        self.values[idx].push(value);
        Ok(())
    }

    pub fn values(&self, name: &str) -> &[String] {
        match self.schema.index_of(name) {
            Some(i) => &self.values[i],
            None => &[],
        }
    }

    /// (feature, values) for every schema feature, in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&FeatureSpec, &[String])> {
        self.schema
            .fields
            .iter()
            .zip(&self.values)
            .map(|(f, v)| (f, v.as_slice()))
    }
}
