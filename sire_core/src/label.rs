// Label serialization.
//
// One context renders to `"<start> <end> |name:value|name:value|...|"`.
// Fields follow the context's insertion order. Float features are written in
// integer form (`strintify`) unless they hold `xx`. With `hhed_fix` the
// current phoneme is written `-X+`, the delimiters HHEd hard-codes around
// the centre phone.
//
// `AlignState` labels expand every phoneme into its five HMM state spans.

use crate::encoding::strintify;
use crate::error::{Result, SireError};
use crate::skeleton::{Context, ValueKind};
use crate::types::SENTINEL;
use crate::utterance::Utterance;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Number of emitting states per phoneme in a state-aligned label.
pub const NUM_STATES: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelKind {
    /// One line per phoneme.
    #[default]
    Phone,
    /// Five lines per phoneme, one per HMM state.
    AlignState,
}

impl FromStr for LabelKind {
    type Err = SireError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Phone" => Ok(LabelKind::Phone),
            "AlignState" => Ok(LabelKind::AlignState),
            _ => Err(SireError::configuration("label kind", s, "Phone or AlignState")),
        }
    }
}

/// The feature part of a label line: `|name:value|...|`.
pub fn context_string(context: &Context, hhed_fix: bool) -> Result<String> {
    let mut s = String::new();
    for (feature, value) in context.iter() {
        let name = feature.name.as_str();
        if name == "start" || name == "end" {
            continue;
        }
        let field = match feature.tag.kind {
            ValueKind::Float if !(value == SENTINEL && feature.tag.allows_sentinel) => {
                let x = value.parse::<f64>().map_err(|_| SireError::InvalidValue {
                    name: name.to_string(),
                    value: value.to_string(),
                    tag: feature.tag.to_string(),
                })?;
                format!("|{name}:{}", strintify(x))
            }
            _ if hhed_fix && name == "cp" => format!("|{name}:-{value}+"),
            _ => format!("|{name}:{value}"),
        };
        s.push_str(&field);
    }
    s.push('|');
    Ok(s)
}

/// A full `Phone` label line.
pub fn label_line(context: &Context, hhed_fix: bool) -> Result<String> {
    let field = |name: &str| {
        context
            .get(name)
            .ok_or_else(|| SireError::MissingValue { name: name.to_string() })
    };
    Ok(format!(
        "{} {} {}",
        field("start")?,
        field("end")?,
        context_string(context, hhed_fix)?
    ))
}

/// Render the label file of one utterance. `contexts` are the utterance's
/// contexts in phoneme order.
pub fn render_label(utt: &Utterance, contexts: &[Context], kind: LabelKind, hhed_fix: bool) -> Result<String> {
    if contexts.len() != utt.num_phonemes() {
        return Err(SireError::structure(
            "label",
            format!(
                "{} contexts for {} phonemes",
                contexts.len(),
                utt.num_phonemes()
            ),
        ));
    }
    let mut out = String::new();
    for (&phoneme, context) in utt.phonemes().iter().zip(contexts) {
        match kind {
            LabelKind::Phone => {
                out.push_str(&label_line(context, hhed_fix)?);
                out.push('\n');
            }
            LabelKind::AlignState => {
                let p = utt.phoneme(phoneme);
                let Some(states) = &p.states else {
                    tracing::warn!(
                        utt = %utt.id,
                        phoneme = %p.id,
                        "no state alignment for phoneme, skipping it"
                    );
                    continue;
                };
                if states.len() != NUM_STATES {
                    return Err(SireError::structure(
                        "state alignment",
                        format!("phoneme `{}` has {} states, expected {NUM_STATES}", p.id, states.len()),
                    ));
                }
                let ctx = context_string(context, hhed_fix)?;
                for (i, span) in states.iter().enumerate() {
                    out.push_str(&format!("{} {} {ctx}[{}]", span.0, span.1, i + 2));
                    if i == 0 {
                        out.push(' ');
                        out.push_str(&ctx);
                    }
                    out.push('\n');
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ContextBuilder;
    use crate::skeleton::{ContextType, PositionEncoding, Schema};
    use crate::types::StateSpan;
    use crate::utterance::tests::the_cat;
    use sire_phonemes::PhonemeInventory;
    use std::sync::Arc;

    #[test]
    fn line_format_and_float_encoding() {
        let schema = Arc::new(Schema::for_context_type(&ContextType::plain(
            PositionEncoding::Relational,
        )));
        let mut ctx = Context::new(schema);
        ctx.add("start", "0").unwrap();
        ctx.add("end", "100").unwrap();
        ctx.add("cp", "a").unwrap();
        ctx.add("pfwsp", "0.33").unwrap();
        ctx.add("lp", "xx").unwrap();
        assert_eq!(label_line(&ctx, false).unwrap(), "0 100 |cp:a|pfwsp:33|lp:xx|");
        assert_eq!(label_line(&ctx, true).unwrap(), "0 100 |cp:-a+|pfwsp:33|lp:xx|");
    }

    #[test]
    fn missing_timing_is_an_error() {
        let schema = Arc::new(Schema::for_context_type(&ContextType::plain(
            PositionEncoding::Absolute,
        )));
        let mut ctx = Context::new(schema);
        ctx.add("cp", "a").unwrap();
        assert!(matches!(label_line(&ctx, false), Err(SireError::MissingValue { .. })));
    }

    #[test]
    fn phone_labels_one_line_per_phoneme() {
        let utt = Utterance::from_proto(&the_cat(), &PhonemeInventory::combilex()).unwrap();
        let builder = ContextBuilder::new(ContextType::plain(PositionEncoding::Categorical));
        let contexts = builder.build_utterance(&utt).unwrap();
        let lab = render_label(&utt, &contexts, LabelKind::Phone, false).unwrap();
        let lines: Vec<&str> = lab.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[2].starts_with("20 30 |llp:sil|lp:D|cp:@|rp:k|rrp:a|"));
        assert!(lines[2].ends_with('|'));
    }

    #[test]
    fn align_state_labels() {
        let mut proto = the_cat();
        for (i, word) in proto.utt.iter_mut().enumerate() {
            for syll in &mut word.syllables {
                for ph in &mut syll.phonemes {
                    if i != 3 {
                        let s = ph.start.unwrap();
                        ph.states = Some((0..5).map(|k| StateSpan(s + 2 * k, s + 2 * k + 2)).collect());
                    }
                }
            }
        }
        let utt = Utterance::from_proto(&proto, &PhonemeInventory::combilex()).unwrap();
        let builder = ContextBuilder::new(ContextType::plain(PositionEncoding::Absolute));
        let contexts = builder.build_utterance(&utt).unwrap();
        let lab = render_label(&utt, &contexts, LabelKind::AlignState, false).unwrap();
        let lines: Vec<&str> = lab.lines().collect();
        // The final silence has no states and is skipped.
        assert_eq!(lines.len(), 6 * 5);
        let ctx = context_string(&contexts[0], false).unwrap();
        assert_eq!(lines[0], format!("0 2 {ctx}[2] {ctx}"));
        assert_eq!(lines[4], format!("8 10 {ctx}[6]"));

        let mut proto = the_cat();
        proto.utt[0].syllables[0].phonemes[0].states = Some(vec![StateSpan(0, 10)]);
        let utt = Utterance::from_proto(&proto, &PhonemeInventory::combilex()).unwrap();
        let contexts = builder.build_utterance(&utt).unwrap();
        assert!(render_label(&utt, &contexts, LabelKind::AlignState, false).is_err());
    }

    #[test]
    fn label_kind_names() {
        assert_eq!("AlignState".parse::<LabelKind>().unwrap(), LabelKind::AlignState);
        assert!("State".parse::<LabelKind>().is_err());
    }
}
