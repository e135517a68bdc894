//! Input sides and output categories.

use std::fmt;

/// Which of the two inputs a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::First => 0,
            Side::Second => 1,
        }
    }

    pub fn only(self) -> Destination {
        match self {
            Side::First => Destination::FirstOnly,
            Side::Second => Destination::SecondOnly,
        }
    }

    pub fn better(self) -> Destination {
        match self {
            Side::First => Destination::FirstBetter,
            Side::Second => Destination::SecondBetter,
        }
    }

    pub fn worse(self) -> Destination {
        match self {
            Side::First => Destination::FirstWorse,
            Side::Second => Destination::SecondWorse,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::First => write!(f, "first"),
            Side::Second => write!(f, "second"),
        }
    }
}

/// Where a record is routed. A destination that was not requested drops its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Destination {
    FirstOnly,
    SecondOnly,
    FirstBetter,
    SecondBetter,
    FirstWorse,
    SecondWorse,
    /// Legacy mode: both inputs hold the read; written once from the first input.
    Matched,
}

impl Destination {
    pub const COUNT: usize = 7;

    pub const ALL: [Destination; Self::COUNT] = [
        Destination::FirstOnly,
        Destination::SecondOnly,
        Destination::FirstBetter,
        Destination::SecondBetter,
        Destination::FirstWorse,
        Destination::SecondWorse,
        Destination::Matched,
    ];

    /// The input whose records (and header) flow into this destination.
    pub fn side(self) -> Side {
        match self {
            Destination::FirstOnly
            | Destination::FirstBetter
            | Destination::FirstWorse
            | Destination::Matched => Side::First,
            Destination::SecondOnly | Destination::SecondBetter | Destination::SecondWorse => {
                Side::Second
            }
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Destination::FirstOnly => "first-only",
            Destination::SecondOnly => "second-only",
            Destination::FirstBetter => "first-better",
            Destination::SecondBetter => "second-better",
            Destination::FirstWorse => "first-worse",
            Destination::SecondWorse => "second-worse",
            Destination::Matched => "matched",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
