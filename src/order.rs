//! Total orders over read identifiers.
//!
//! Both inputs must be sorted under the same order; the merge-join compares
//! identifiers with it and the readers use it to detect disordered input.

use clap::ValueEnum;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NameOrder {
    /// Mixed numeric/lexical order, as produced by `samtools sort -n`
    Natural,
    /// Plain byte-wise order
    Lexical,
}

impl NameOrder {
    pub fn compare(self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            NameOrder::Natural => natural_cmp(a, b),
            NameOrder::Lexical => a.cmp(b),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NameOrder::Natural => "natural",
            NameOrder::Lexical => "lexical",
        }
    }

    /// The order to suggest when input is found disordered under `self`.
    pub fn alternate(self) -> NameOrder {
        match self {
            NameOrder::Natural => NameOrder::Lexical,
            NameOrder::Lexical => NameOrder::Natural,
        }
    }
}

/// Compare two names the way `samtools sort -n` does.
///
/// Digit runs compare by numeric value with leading zeros skipped. When two
/// runs have the same value, the one that had more leading zeros sorts first.
pub fn natural_cmp(a: &[u8], b: &[u8]) -> Ordering {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let (start_a, start_b) = (i, j);
            while i < a.len() && a[i] == b'0' {
                i += 1;
            }
            while j < b.len() && b[j] == b'0' {
                j += 1;
            }
            while i < a.len() && j < b.len() && a[i].is_ascii_digit() && a[i] == b[j] {
                i += 1;
                j += 1;
            }
            let digit_a = i < a.len() && a[i].is_ascii_digit();
            let digit_b = j < b.len() && b[j].is_ascii_digit();
            if digit_a && digit_b {
                // first differing digit decides unless one run is longer
                let mut k = 0;
                while i + k < a.len()
                    && j + k < b.len()
                    && a[i + k].is_ascii_digit()
                    && b[j + k].is_ascii_digit()
                {
                    k += 1;
                }
                let longer_a = i + k < a.len() && a[i + k].is_ascii_digit();
                let longer_b = j + k < b.len() && b[j + k].is_ascii_digit();
                return if longer_a {
                    Ordering::Greater
                } else if longer_b {
                    Ordering::Less
                } else {
                    a[i].cmp(&b[j])
                };
            } else if digit_a {
                return Ordering::Greater;
            } else if digit_b {
                return Ordering::Less;
            } else if i - start_a != j - start_b {
                return if i - start_a < j - start_b { Ordering::Greater } else { Ordering::Less };
            }
        } else {
            if a[i] != b[j] {
                return a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
    }
    if i < a.len() {
        Ordering::Greater
    } else if j < b.len() {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}
