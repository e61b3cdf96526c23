// Question generation: derives decision-tree questions from built contexts.
//
// Fitting is two passes. `QuestionFitter::add_context` accumulates every
// value of every feature into a `ContextPopulation` (and, for features whose
// type tag is utterance-level, into a second population for the GV set).
// `QuestionFitter::fit` then turns each feature's distinct values into
// question lines for one `QuestionDialect`. Features are independent, so
// per-feature synthesis runs on rayon; results are collected in schema order.
//
// Dialects:
// - `HMM`: `QS "name-value" {*|name:value|*}` membership questions, plus
//   `<=` threshold questions for numeric features (`make_hmm_relational_qs`).
// - `Nitech_NN`: `LQ 0` membership questions for categorical features and
//   `LQ 1 <magnitude>` questions for numeric ones.
// - `CSTR_NN`: membership questions for categorical features, one `CQS`
//   capture question per numeric feature.
//
// Float values appear in patterns in integer form (`strintify`) since the
// pattern language treats `.` specially. Timing (untyped) features never
// produce questions.
//
// `finalise_questions` merges the question lines of a whole run into one
// sorted, de-duplicated list.

use crate::encoding::{strfloatify, strintify};
use crate::error::{Result, SireError};
use crate::skeleton::{Context, ContextPopulation, FeatureSpec, Schema, TypeTag, ValueKind};
use crate::types::SENTINEL;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Output syntax of a question file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionDialect {
    #[default]
    #[serde(rename = "HMM")]
    Hmm,
    #[serde(rename = "Nitech_NN")]
    NitechNn,
    #[serde(rename = "CSTR_NN")]
    CstrNn,
}

impl QuestionDialect {
    pub fn name(self) -> &'static str {
        match self {
            QuestionDialect::Hmm => "HMM",
            QuestionDialect::NitechNn => "Nitech_NN",
            QuestionDialect::CstrNn => "CSTR_NN",
        }
    }
}

impl fmt::Display for QuestionDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QuestionDialect {
    type Err = SireError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "HMM" => Ok(QuestionDialect::Hmm),
            "Nitech_NN" => Ok(QuestionDialect::NitechNn),
            "CSTR_NN" => Ok(QuestionDialect::CstrNn),
            _ => Err(SireError::configuration(
                "question dialect",
                s,
                "HMM, Nitech_NN or CSTR_NN",
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuestionOptions {
    pub dialect: QuestionDialect,
    /// Write current-phoneme values as `-X+`, matching the label rewrite.
    pub hhed_fix: bool,
}

/// The main question set and the utterance-level (GV) set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestionSets {
    pub questions: Vec<String>,
    pub utterance_level: Vec<String>,
}

/// Accumulates contexts and fits questions to the values seen.
#[derive(Clone, Debug)]
pub struct QuestionFitter {
    population: ContextPopulation,
    utterance_level: ContextPopulation,
    options: QuestionOptions,
}

impl QuestionFitter {
    pub fn new(schema: Arc<Schema>, options: QuestionOptions) -> Self {
        QuestionFitter {
            population: ContextPopulation::new(schema.clone()),
            utterance_level: ContextPopulation::new(schema),
            options,
        }
    }

    /// Add every value of one context. Utterance-level features are routed
    /// into the GV population as well.
    pub fn add_context(&mut self, context: &Context) -> Result<()> {
        for (feature, value) in context.iter() {
            self.population.add_multiple(&feature.name, value)?;
            if feature.tag.utterance_level {
                self.utterance_level.add_multiple(&feature.name, value)?;
            }
        }
        Ok(())
    }

    pub fn add_contexts<'a>(&mut self, contexts: impl IntoIterator<Item = &'a Context>) -> Result<()> {
        for context in contexts {
            self.add_context(context)?;
        }
        Ok(())
    }

    pub fn fit(&self) -> Result<QuestionSets> {
        Ok(QuestionSets {
            questions: make_questions(&self.population, self.options, false)?,
            utterance_level: make_questions(&self.utterance_level, self.options, true)?,
        })
    }
}

/// Fit both question sets to a batch of contexts built against `schema`.
pub fn fit_question_sets(
    schema: Arc<Schema>,
    contexts: &[Context],
    options: QuestionOptions,
) -> Result<QuestionSets> {
    let mut fitter = QuestionFitter::new(schema, options);
    fitter.add_contexts(contexts)?;
    fitter.fit()
}

/// Merge question lines into one sorted list without duplicates.
pub fn finalise_questions(lines: impl IntoIterator<Item = String>) -> Vec<String> {
    lines.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

fn make_questions(
    population: &ContextPopulation,
    options: QuestionOptions,
    utterance_level: bool,
) -> Result<Vec<String>> {
    let observed: Vec<(&FeatureSpec, &[String])> = population
        .iter()
        .filter(|(feature, values)| {
            if values.is_empty() {
                // The GV population only ever holds utterance-level features.
                if !utterance_level {
                    tracing::warn!(
                        feature = %feature.name,
                        skeleton = population.schema().name(),
                        "context feature not used"
                    );
                }
                return false;
            }
            true
        })
        .collect();

    let per_feature = observed
        .par_iter()
        .map(|(feature, values)| feature_questions(feature, values, options))
        .collect::<Result<Vec<Vec<String>>>>()?;
    Ok(per_feature.into_iter().flatten().collect())
}

fn membership(dialect: QuestionDialect, name: &str, value: &str) -> String {
    match dialect {
        QuestionDialect::Hmm | QuestionDialect::CstrNn => {
            format!("QS \"{name}-{value}\" {{*|{name}:{value}|*}}")
        }
        QuestionDialect::NitechNn => format!("LQ 0 \"{name}-{value}\" {{*|{name}:{value}|*}}"),
    }
}

fn invalid(feature: &FeatureSpec, value: &str) -> SireError {
    SireError::InvalidValue {
        name: feature.name.clone(),
        value: value.to_string(),
        tag: feature.tag.to_string(),
    }
}

/// Distinct numeric values in ascending order, with `xx` (if present) last.
fn sorted_numeric<'v>(feature: &FeatureSpec, values: &'v [String]) -> Result<Vec<&'v str>> {
    let distinct: BTreeSet<&str> = values.iter().map(String::as_str).collect();
    let mut sentinel = false;
    let mut numeric: Vec<(f64, &str)> = Vec::with_capacity(distinct.len());
    for v in distinct {
        if v == SENTINEL {
            sentinel = true;
            continue;
        }
        let x = v.parse::<f64>().map_err(|_| invalid(feature, v))?;
        numeric.push((x, v));
    }
    numeric.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut out: Vec<&str> = numeric.into_iter().map(|(_, v)| v).collect();
    if sentinel {
        out.push(SENTINEL);
    }
    Ok(out)
}

fn feature_questions(feature: &FeatureSpec, values: &[String], options: QuestionOptions) -> Result<Vec<String>> {
    let name = feature.name.as_str();
    match feature.tag.kind {
        ValueKind::Untyped => Ok(Vec::new()),
        ValueKind::Bool => {
            let distinct: BTreeSet<&str> = values.iter().map(String::as_str).collect();
            Ok(distinct
                .into_iter()
                .map(|v| {
                    if options.hhed_fix && name == "cp" {
                        membership(options.dialect, name, &format!("-{v}+"))
                    } else {
                        membership(options.dialect, name, v)
                    }
                })
                .collect())
        }
        ValueKind::Int | ValueKind::Float => {
            let sorted = sorted_numeric(feature, values)?;
            match options.dialect {
                QuestionDialect::Hmm => make_hmm_relational_qs(&sorted, name, feature.tag),
                QuestionDialect::NitechNn => sorted
                    .into_iter()
                    .map(|v| nitech_numeric(feature, v))
                    .collect(),
                QuestionDialect::CstrNn => Ok(vec![format!("CQS \"{name}\" {{*|{name}:(\\d+)|*}}")]),
            }
        }
    }
}

/// `LQ 1` question: the magnitude is the float form, the pattern the
/// integer form.
fn nitech_numeric(feature: &FeatureSpec, value: &str) -> Result<String> {
    let name = feature.name.as_str();
    if value == SENTINEL {
        return Ok(format!("LQ 1 0.0 \"{name}-xx\" {{*|{name}:xx|*}}"));
    }
    match feature.tag.kind {
        ValueKind::Float => {
            let x = value.parse::<f64>().map_err(|_| invalid(feature, value))?;
            let int = strintify(x);
            Ok(format!("LQ 1 {value} \"{name}-{int}\" {{*|{name}:{int}|*}}"))
        }
        _ => {
            let n = value.parse::<i64>().map_err(|_| invalid(feature, value))?;
            Ok(format!(
                "LQ 1 {} \"{name}-{value}\" {{*|{name}:{value}|*}}",
                strfloatify(n)
            ))
        }
    }
}

/// HMM questions for a numeric feature: one membership question per value
/// and a `<=` threshold question for every value above the type's minimum.
///
/// `values` must be distinct and ascending. An `xx` value becomes a plain
/// membership question; it is an error unless the type allows it.
pub fn make_hmm_relational_qs(values: &[&str], name: &str, tag: TypeTag) -> Result<Vec<String>> {
    let mut questions = Vec::new();
    if values.contains(&SENTINEL) {
        if !tag.allows_sentinel {
            return Err(SireError::InvalidValue {
                name: name.to_string(),
                value: SENTINEL.to_string(),
                tag: tag.to_string(),
            });
        }
        questions.push(format!("QS \"{name}-xx\" {{*|{name}:xx|*}}"));
    }

    let start: i64 = if tag.zero_valid { 0 } else { 1 };
    for &raw in values.iter().filter(|&&v| v != SENTINEL) {
        let bad = || SireError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
            tag: tag.to_string(),
        };
        let val: i64 = match tag.kind {
            ValueKind::Float => {
                let x = raw.parse::<f64>().map_err(|_| bad())?;
                strintify(x).parse().map_err(|_| bad())?
            }
            _ => raw.parse().map_err(|_| bad())?,
        };
        questions.push(format!("QS \"{name}-{val}\" {{*|{name}:{val}|*}}"));
        if val > start {
            questions.push(threshold_question(name, val, start));
        }
    }
    Ok(questions)
}

/// `QS "name<=v"` matching every integer from `start` to `v`. Units are
/// listed one by one, completed tens as `n?` wildcards, then the final
/// partial tens one by one.
fn threshold_question(name: &str, val: i64, start: i64) -> String {
    let item = |n: String| format!("*|{name}:{n}|*");
    let tens = val / 10;
    let rem = val % 10;
    let items: Vec<String> = if tens > 0 {
        (start..10)
            .map(|n| item(n.to_string()))
            .chain((1..tens).map(|n| item(format!("{n}?"))))
            .chain((0..=rem).map(|n| item(format!("{tens}{n}"))))
            .collect()
    } else {
        (start..=val).map(|n| item(n.to_string())).collect()
    };
    format!("QS \"{name}<={val}\" {{{}}}", items.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{ContextType, PositionEncoding};

    fn relational() -> Arc<Schema> {
        Arc::new(Schema::for_context_type(&ContextType::plain(
            PositionEncoding::Relational,
        )))
    }

    #[test]
    fn dialect_names() {
        assert_eq!("Nitech_NN".parse::<QuestionDialect>().unwrap(), QuestionDialect::NitechNn);
        assert_eq!(QuestionDialect::CstrNn.to_string(), "CSTR_NN");
        let err = "NN".parse::<QuestionDialect>().unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::Configuration);
    }

    #[test]
    fn thresholds_compact_tens() {
        let qs = make_hmm_relational_qs(&["0", "1", "2", "3", "11", "12"], "n", TypeTag::INT0).unwrap();
        assert!(!qs.iter().any(|q| q.starts_with("QS \"n<=0\"")));
        assert!(qs.contains(&"QS \"n-0\" {*|n:0|*}".to_string()));
        assert!(qs.contains(&"QS \"n<=1\" {*|n:0|*,*|n:1|*}".to_string()));
        assert!(qs.contains(&"QS \"n<=3\" {*|n:0|*,*|n:1|*,*|n:2|*,*|n:3|*}".to_string()));
        let units: String = (0..10).map(|n| format!("*|n:{n}|*,")).collect();
        assert!(qs.contains(&format!("QS \"n<=11\" {{{units}*|n:10|*,*|n:11|*}}")));
        assert!(qs.contains(&format!("QS \"n<=12\" {{{units}*|n:10|*,*|n:11|*,*|n:12|*}}")));
        assert_eq!(qs.len(), 6 + 5);
    }

    #[test]
    fn thresholds_start_at_one_without_zero() {
        let qs = make_hmm_relational_qs(&["1", "2", "25"], "n", TypeTag::INT).unwrap();
        assert_eq!(qs[0], "QS \"n-1\" {*|n:1|*}");
        assert_eq!(qs[2], "QS \"n<=2\" {*|n:1|*,*|n:2|*}");
        let units: String = (1..10).map(|n| format!("*|n:{n}|*,")).collect();
        assert_eq!(
            qs[4],
            format!("QS \"n<=25\" {{{units}*|n:1?|*,*|n:20|*,*|n:21|*,*|n:22|*,*|n:23|*,*|n:24|*,*|n:25|*}}")
        );
    }

    #[test]
    fn sentinel_only_where_allowed() {
        let qs = make_hmm_relational_qs(&["2", "xx"], "snss", TypeTag::INTXX).unwrap();
        assert_eq!(qs[0], "QS \"snss-xx\" {*|snss:xx|*}");
        assert_eq!(qs.len(), 3);
        assert!(make_hmm_relational_qs(&["2", "xx"], "csnp", TypeTag::INT).is_err());
    }

    #[test]
    fn floats_use_integer_patterns() {
        let qs = make_hmm_relational_qs(&["0.01", "0.5", "1.0"], "pfwsp", TypeTag::FLOAT).unwrap();
        assert_eq!(qs[0], "QS \"pfwsp-1\" {*|pfwsp:1|*}");
        assert_eq!(qs[1], "QS \"pfwsp-50\" {*|pfwsp:50|*}");
        assert!(qs[2].starts_with("QS \"pfwsp<=50\" {*|pfwsp:1|*,"));
        assert!(qs[2].contains("*|pfwsp:4?|*,*|pfwsp:50|*}"));
        assert_eq!(qs[3], "QS \"pfwsp-100\" {*|pfwsp:100|*}");
    }

    fn population_with(values: &[(&str, &str)]) -> QuestionFitter {
        let schema = relational();
        let mut fitter = QuestionFitter::new(schema.clone(), QuestionOptions::default());
        let mut ctx = Context::new(schema);
        for (k, v) in values {
            ctx.add(k, *v).unwrap();
        }
        fitter.add_context(&ctx).unwrap();
        fitter
    }

    #[test]
    fn dialects_render_numeric_features_differently() {
        let values = [("cp", "a"), ("pfwsp", "0.5"), ("lsnp", "xx"), ("start", "0"), ("unw", "3")];
        let mut fitter = population_with(&values);

        fitter.options = QuestionOptions {
            dialect: QuestionDialect::NitechNn,
            hhed_fix: true,
        };
        let sets = fitter.fit().unwrap();
        assert_eq!(
            sets.questions,
            [
                "LQ 0 \"cp--a+\" {*|cp:-a+|*}",
                "LQ 1 0.0 \"lsnp-xx\" {*|lsnp:xx|*}",
                "LQ 1 0.03 \"unw-3\" {*|unw:3|*}",
                "LQ 1 0.5 \"pfwsp-50\" {*|pfwsp:50|*}",
            ]
        );
        assert_eq!(sets.utterance_level, ["LQ 1 0.03 \"unw-3\" {*|unw:3|*}"]);

        fitter.options.dialect = QuestionDialect::CstrNn;
        let sets = fitter.fit().unwrap();
        assert!(sets.questions.contains(&"CQS \"pfwsp\" {*|pfwsp:(\\d+)|*}".to_string()));
        assert!(sets.questions.contains(&"QS \"cp--a+\" {*|cp:-a+|*}".to_string()));
        assert!(!sets.questions.iter().any(|q| q.contains("start")));
    }

    #[test]
    fn fitting_dedupes_values() {
        let schema = relational();
        let mut contexts = Vec::new();
        for phone in ["a", "b", "a"] {
            let mut ctx = Context::new(schema.clone());
            ctx.add("cp", phone).unwrap();
            contexts.push(ctx);
        }
        let sets = fit_question_sets(schema, &contexts, QuestionOptions::default()).unwrap();
        assert_eq!(sets.questions, ["QS \"cp-a\" {*|cp:a|*}", "QS \"cp-b\" {*|cp:b|*}"]);
        assert!(sets.utterance_level.is_empty());
    }

    #[test]
    fn finalise_sorts_and_dedupes() {
        let merged = finalise_questions(["b".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(merged, ["a", "b"]);
    }
}
