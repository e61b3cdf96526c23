// Error taxonomy for context labelling.
//
// Three fatal categories, matching how a failure should be handled:
// - Schema: a context value does not fit its feature's type tag, a feature
//   is added twice, or a feature name is unknown to the skeleton. These mean
//   the context definition itself is corrupt.
// - Structural: the utterance hierarchy or a parse disagrees with itself
//   (count mismatch, stale node lookup, impossible contraction split).
// - Configuration: an unsupported dialect, context type or label kind name.
//
// Data-quality problems (defaulted stress, unused features) are not errors;
// they are logged with `tracing::warn!` where they happen.
//
// `SireError::InUtterance` wraps any error raised while processing one
// utterance so the final message always names the utterance id.

use sire_phonemes::UnknownPhoneme;

/// Crate-wide result alias.
pub type Result<T, E = SireError> = std::result::Result<T, E>;

/// How a fatal error should be handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Schema,
    Structural,
    Configuration,
}

#[derive(Debug, thiserror::Error)]
pub enum SireError {
    #[error("feature `{name}` does not exist in the {skeleton} skeleton")]
    UnknownFeature { name: String, skeleton: String },

    #[error("feature `{name}` already has value `{existing}` (tried to add `{value}`)")]
    DuplicateFeature {
        name: String,
        existing: String,
        value: String,
    },

    #[error("value `{value}` is not valid for feature `{name}` of type {tag}")]
    InvalidValue {
        name: String,
        value: String,
        tag: String,
    },

    #[error("feature `{name}` has no value")]
    MissingValue { name: String },

    #[error("{kind} `{id}` not found in {container}")]
    NotFound {
        kind: &'static str,
        id: String,
        container: String,
    },

    #[error(transparent)]
    UnknownPhoneme(#[from] UnknownPhoneme),

    #[error("number of {what} ({parse}) does not equal number of words ({words})")]
    ParseMismatch {
        what: &'static str,
        parse: usize,
        words: usize,
    },

    #[error("malformed parse: {0}")]
    MalformedParse(String),

    #[error("cannot split word `{word}`: {reason}")]
    ContractionSplit { word: String, reason: String },

    #[error("invalid {what}: {detail}")]
    Structure { what: &'static str, detail: String },

    #[error("invalid {what} `{value}`{hint}")]
    Configuration {
        what: &'static str,
        value: String,
        hint: String,
    },

    #[error("utterance {utt}: {source}")]
    InUtterance {
        utt: String,
        #[source]
        source: Box<SireError>,
    },
}

impl SireError {
    pub fn not_found(kind: &'static str, id: impl Into<String>, container: impl Into<String>) -> Self {
        SireError::NotFound {
            kind,
            id: id.into(),
            container: container.into(),
        }
    }

    pub fn structure(what: &'static str, detail: impl Into<String>) -> Self {
        SireError::Structure {
            what,
            detail: detail.into(),
        }
    }

    pub fn configuration(what: &'static str, value: impl Into<String>, expected: &str) -> Self {
        SireError::Configuration {
            what,
            value: value.into(),
            hint: if expected.is_empty() {
                String::new()
            } else {
                format!(" (expected {expected})")
            },
        }
    }

    /// Attach the utterance id. Already-wrapped errors are left alone.
    pub fn in_utterance(self, utt: &str) -> Self {
        match self {
            SireError::InUtterance { .. } => self,
            other => SireError::InUtterance {
                utt: utt.to_string(),
                source: Box::new(other),
            },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SireError::UnknownFeature { .. }
            | SireError::DuplicateFeature { .. }
            | SireError::InvalidValue { .. }
            | SireError::MissingValue { .. } => ErrorCategory::Schema,
            SireError::NotFound { .. }
            | SireError::UnknownPhoneme(_)
            | SireError::ParseMismatch { .. }
            | SireError::MalformedParse(_)
            | SireError::ContractionSplit { .. }
            | SireError::Structure { .. } => ErrorCategory::Structural,
            SireError::Configuration { .. } => ErrorCategory::Configuration,
            SireError::InUtterance { source, .. } => source.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_keeps_category_and_names_utterance() {
        let err = SireError::DuplicateFeature {
            name: "cp".into(),
            existing: "a".into(),
            value: "b".into(),
        }
        .in_utterance("utt_001");
        assert_eq!(err.category(), ErrorCategory::Schema);
        let msg = err.to_string();
        assert!(msg.starts_with("utterance utt_001:"), "got {}", msg);
        assert!(msg.contains("`cp`"));
    }

    #[test]
    fn wrapping_twice_is_a_no_op() {
        let err = SireError::structure("syllable", "empty")
            .in_utterance("a")
            .in_utterance("b");
        assert!(err.to_string().starts_with("utterance a:"));
    }

    #[test]
    fn configuration_error_quotes_value() {
        let err = SireError::configuration("question dialect", "NN", "HMM, Nitech_NN or CSTR_NN");
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(
            err.to_string(),
            "invalid question dialect `NN` (expected HMM, Nitech_NN or CSTR_NN)"
        );
    }
}
