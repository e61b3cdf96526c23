// Positional encodings and the float/int value codec.
//
// Three ways of expressing "where is this node inside its container":
// - relational: a fraction in (0, 1], rounded to two decimals
// - absolute: the raw zero-based index (computed inline by the builder)
// - categorical: one of `one`/`beg`/`mid`/`end` (or `xx`)
//
// 0.0 is reserved for "not part of the utterance" in every relational
// feature. `to_relational` therefore never returns 0.0 for a real position:
// a rounded result of 0.0 is clamped to 0.01, and callers that need the
// silence value write it themselves before calling.
//
// Float-valued features are carried inside contexts as Python-style decimal
// strings ("1.0", "0.5", "0.33") but written to labels and question patterns
// in integer form (`strintify`), because the downstream pattern language
// gives `.` a special meaning. `strfloatify` is the exact inverse for every
// two-decimal value in [0, 1].

use crate::error::{Result, SireError};
use crate::types::SENTINEL;
use std::fmt;

/// Direction of a relational position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// `1 - pos/mpos`: 1.0 at the start of the container.
    Forward,
    /// `pos/mpos`: 1.0 at the end of the container.
    Backward,
}

/// Round to two decimals, halves away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Relational position of index `pos` in a container whose last index is
/// `mpos`.
pub fn to_relational(pos: usize, mpos: usize, direction: Direction) -> Result<f64> {
    if pos > mpos {
        return Err(SireError::structure(
            "relational position",
            format!("position {pos} is above maximum position {mpos}"),
        ));
    }
    if mpos == 0 {
        return Ok(1.0);
    }
    let ratio = round2(pos as f64 / mpos as f64);
    // The forward value is `1 - ratio`; the outer round2 only strips the
    // subtraction's float noise (1 - 0.57 is 0.43000000000000005).
    let p = match direction {
        Direction::Forward => round2(1.0 - ratio),
        Direction::Backward => ratio,
    };
    Ok(if p == 0.0 { 0.01 } else { p })
}

/// `to_relational` for optional inputs: a missing position or maximum
/// yields the reserved 0.0.
pub fn to_relational_or_missing(
    pos: Option<usize>,
    mpos: Option<usize>,
    direction: Direction,
) -> Result<f64> {
    match (pos, mpos) {
        (Some(pos), Some(mpos)) => to_relational(pos, mpos, direction),
        _ => Ok(0.0),
    }
}

/// Render a float the way the label format expects: shortest round-trip
/// digits, always with a decimal point.
pub fn format_float(x: f64) -> String {
    let s = format!("{x}");
    if s.contains('.') || s.contains('e') || !x.is_finite() {
        s
    } else {
        format!("{s}.0")
    }
}

/// Integer form of a two-decimal float (`0.33` → `"33"`).
pub fn strintify(x: f64) -> String {
    let scaled = (round2(x) * 100.0).round() as i64;
    scaled.to_string()
}

/// Float form of an integer-encoded value (`33` → `"0.33"`).
pub fn strfloatify(n: i64) -> String {
    format_float(round2(n as f64 / 100.0))
}

// ---------------------------------------------------------------------------
// Categorical positions
// ---------------------------------------------------------------------------

/// Categorical position of a node inside its container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PositionCategory {
    /// A boundary silence slot (only with `with_silence`).
    Outside,
    One,
    Beginning,
    Middle,
    End,
}

impl PositionCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            PositionCategory::Outside => SENTINEL,
            PositionCategory::One => "one",
            PositionCategory::Beginning => "beg",
            PositionCategory::Middle => "mid",
            PositionCategory::End => "end",
        }
    }
}

impl fmt::Display for PositionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position category of index `pos` in a container of `n` elements.
///
/// With `with_silence` the container is assumed to start and end with a
/// silence element: those two slots are `Outside`, a three-element container
/// is `One`, and beginning/end are measured one step in from the edges.
/// The rule order below is the label contract; do not reorder.
pub fn position_category(pos: usize, n: usize, with_silence: bool) -> PositionCategory {
    if with_silence {
        if pos == 0 || pos + 1 == n {
            PositionCategory::Outside
        } else if n == 3 {
            PositionCategory::One
        } else if pos == 1 {
            PositionCategory::Beginning
        } else if pos + 2 == n {
            PositionCategory::End
        } else {
            PositionCategory::Middle
        }
    } else if n == 1 {
        PositionCategory::One
    } else if pos == 0 {
        PositionCategory::Beginning
    } else if pos + 1 == n {
        PositionCategory::End
    } else {
        PositionCategory::Middle
    }
}

/// Categorical distance between two word positions in a sentence of
/// `num_words` words.
///
/// `shortsent` if the sentence has three words or fewer (not counting the
/// boundary silences when `with_silence`); otherwise `close` within a tenth
/// of the sentence (rounded up), `mid` within half (rounded down), else
/// `long`.
pub fn distance_category(
    w1: usize,
    w2: usize,
    num_words: usize,
    with_silence: bool,
) -> &'static str {
    let dist = w1.abs_diff(w2);
    let n = if with_silence {
        num_words.saturating_sub(2)
    } else {
        num_words
    };
    if n <= 3 {
        "shortsent"
    } else if dist <= n.div_ceil(10) {
        "close"
    } else if dist <= n / 2 {
        "mid"
    } else {
        "long"
    }
}
