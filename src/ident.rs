//! Identifier value types
//!
//! Checkpoint identifiers arrive as strings ("1", "2", "10", sometimes
//! "A10") but must order numerically: "2" sorts before "10". Plain
//! lexicographic comparison is a correctness bug here, so the id is a
//! dedicated newtype carrying the ordering with it. Group classification
//! is a closed set, not free-form text.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Checkpoint identifier with numeric-aware (natural) ordering
///
/// Digit runs compare by numeric value, everything else byte-wise.
/// Equal numeric values with different zero-padding ("1" vs "01") stay
/// distinct, with the shorter run ordered first.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct CheckpointId(String);

impl CheckpointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CheckpointId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CheckpointId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialOrd for CheckpointId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CheckpointId {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0)
    }
}

/// Natural-order comparison: digit runs by value, other bytes as-is
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let mut i = 0;
    let mut j = 0;

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let run_a = digit_run(a, i);
            let run_b = digit_run(b, j);
            let sig_a = trim_leading_zeros(&a[i..run_a]);
            let sig_b = trim_leading_zeros(&b[j..run_b]);

            // More significant digits means a larger value; equal-length
            // runs compare digit-wise, which matches numeric order.
            let by_value = sig_a.len().cmp(&sig_b.len()).then_with(|| sig_a.cmp(sig_b));
            if by_value != Ordering::Equal {
                return by_value;
            }
            // Same value, different zero-padding: keep the order total.
            let by_padding = (run_a - i).cmp(&(run_b - j));
            if by_padding != Ordering::Equal {
                return by_padding;
            }
            i = run_a;
            j = run_b;
        } else {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                other => return other,
            }
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn digit_run(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    end
}

fn trim_leading_zeros(run: &[u8]) -> &[u8] {
    let first = run.iter().position(|b| *b != b'0').unwrap_or(run.len());
    &run[first..]
}

/// Group classification, a small closed set rather than free-form text
///
/// Each classification can have its own reference coordinates per
/// checkpoint.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupClass {
    Y,
    F,
    E,
}

impl GroupClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupClass::Y => "Y",
            GroupClass::F => "F",
            GroupClass::E => "E",
        }
    }
}

impl fmt::Display for GroupClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Y" | "y" => Ok(GroupClass::Y),
            "F" | "f" => Ok(GroupClass::F),
            "E" | "e" => Ok(GroupClass::E),
            other => Err(format!("unknown group class '{other}' (expected Y, F or E)")),
        }
    }
}
