//! Candlestick classifier
//!
//! Maps a single OHLC bar onto one of twelve symbols `a`..=`l` by trying an
//! ordered table of strict price orderings. The first rule that holds wins, so
//! bars that satisfy several rules through price coincidences resolve to the
//! earliest one.
//!
//! | symbol | ordering      |
//! |--------|---------------|
//! | `a`    | H > O > C > L |
//! | `b`    | H = O > C > L |
//! | `c`    | H > O = C > L |
//! | `d`    | H > O > C = L |
//! | `e`    | H > C > O > L |
//! | `f`    | H = C > O > L |
//! | `g`    | H > C = O > L |
//! | `h`    | H > C > L = O |
//! | `i`    | H = O = C > L |
//! | `j`    | H > O = C = L |
//! | `k`    | H = C > O = L |
//! | `l`    | H > O = L = C |
//!
//! `g` and `l` describe the same orderings as `c` and `j` respectively and are
//! therefore never produced; they stay in the table so the alphabet is complete.

#![allow(clippy::float_cmp)]

use chrono::NaiveDate;

use crate::{Error, Result, OHLC};

/// Symbol assigned to a bar, `None` when no rule matched.
pub type Code = Option<Symbol>;

/// Generate the `Symbol` enum together with its character mapping.
macro_rules! define_symbols {
    ($($variant:ident => $ch:literal),* $(,)?) => {
        /// One letter of the candlestick alphabet
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Symbol {
            $($variant),*
        }

        impl Symbol {
            /// Every symbol in rule order
            pub const ALL: [Symbol; 12] = [$(Symbol::$variant),*];

            #[inline]
            pub fn as_char(self) -> char {
                match self {
                    $(Self::$variant => $ch),*
                }
            }

            pub fn from_char(ch: char) -> Option<Self> {
                match ch {
                    $($ch => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

define_symbols! {
    A => 'a',
    B => 'b',
    C => 'c',
    D => 'd',
    E => 'e',
    F => 'f',
    G => 'g',
    H => 'h',
    I => 'i',
    J => 'j',
    K => 'k',
    L => 'l',
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl std::str::FromStr for Symbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => {
                Symbol::from_char(ch).ok_or(Error::InvalidValue("unknown candlestick symbol"))
            }
            _ => Err(Error::InvalidValue("symbol must be a single character")),
        }
    }
}

impl serde::Serialize for Symbol {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_char(self.as_char())
    }
}

impl<'de> serde::Deserialize<'de> for Symbol {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(d)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================
// RULE TABLE
// ============================================================

/// Predicate over (open, high, low, close)
type Predicate = fn(f64, f64, f64, f64) -> bool;

/// Rules in priority order. Order is significant.
const RULES: [(Symbol, Predicate); 12] = [
    (Symbol::A, |o, h, l, c| h > o && o > c && c > l),
    (Symbol::B, |o, h, l, c| h == o && o > c && c > l),
    (Symbol::C, |o, h, l, c| h > o && o == c && c > l),
    (Symbol::D, |o, h, l, c| h > o && o > c && c == l),
    (Symbol::E, |o, h, l, c| h > c && c > o && o > l),
    (Symbol::F, |o, h, l, c| h == c && c > o && o > l),
    (Symbol::G, |o, h, l, c| h > c && c == o && o > l),
    (Symbol::H, |o, h, l, c| h > c && c > l && l == o),
    (Symbol::I, |o, h, l, c| h == o && o == c && c > l),
    (Symbol::J, |o, h, l, c| h > o && o == c && c == l),
    (Symbol::K, |o, h, l, c| h == c && c > o && o == l),
    (Symbol::L, |o, h, l, c| h > o && o == l && l == c),
];

/// Classify one bar. Returns `None` when no rule matches.
#[inline]
pub fn classify(open: f64, high: f64, low: f64, close: f64) -> Code {
    RULES
        .iter()
        .find(|(_, matches)| matches(open, high, low, close))
        .map(|&(symbol, _)| symbol)
}

/// Classify anything implementing [`OHLC`].
#[inline]
pub fn classify_bar<T: OHLC + ?Sized>(bar: &T) -> Code {
    classify(bar.open(), bar.high(), bar.low(), bar.close())
}

// ============================================================
// SYMBOL STREAM
// ============================================================

/// A bar together with its classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedBar {
    pub date: Option<NaiveDate>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub code: Code,
}

impl OHLC for EncodedBar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// Classify every bar, keeping order and length.
///
/// Unclassified bars are kept with `code: None` and reported through a
/// `WARN` event carrying the row index and prices.
pub fn encode<T: OHLC>(bars: &[T]) -> Vec<EncodedBar> {
    bars.iter()
        .enumerate()
        .map(|(index, bar)| {
            let code = classify_bar(bar);
            if code.is_none() {
                tracing::warn!(
                    index,
                    date = ?bar.date(),
                    open = bar.open(),
                    high = bar.high(),
                    low = bar.low(),
                    close = bar.close(),
                    "bar matches no candlestick rule"
                );
            }
            EncodedBar {
                date: bar.date(),
                open: bar.open(),
                high: bar.high(),
                low: bar.low(),
                close: bar.close(),
                code,
            }
        })
        .collect()
}
