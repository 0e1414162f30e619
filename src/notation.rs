// src/notation.rs

//! The closed vocabulary of command notation.
//!
//! Every entry in a command sequence is a [`Token`]. Tokens are plain values:
//! once created they are never mutated, only replaced. Each kind has a
//! canonical text form, which is what the clipboard codec reads and writes.

use serde::{Deserialize, Serialize};
use std::fmt;

// --- Directions ---

/// A stick direction, relative to a character facing right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dir {
    U,
    D,
    F,
    B,
    UB,
    UF,
    DB,
    DF,
    /// Neutral. Has no hold variant.
    N,
}

impl Dir {
    /// Diagonals are decoded before orthogonals.
    pub const DIAGONALS: [Dir; 4] = [Dir::UB, Dir::UF, Dir::DB, Dir::DF];
    pub const ORTHOGONALS: [Dir; 4] = [Dir::U, Dir::D, Dir::F, Dir::B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dir::U => "u",
            Dir::D => "d",
            Dir::F => "f",
            Dir::B => "b",
            Dir::UB => "ub",
            Dir::UF => "uf",
            Dir::DB => "db",
            Dir::DF => "df",
            Dir::N => "n",
        }
    }

    /// For a diagonal, the two orthogonal directions it combines.
    pub fn components(&self) -> Option<(Dir, Dir)> {
        match self {
            Dir::UB => Some((Dir::U, Dir::B)),
            Dir::UF => Some((Dir::U, Dir::F)),
            Dir::DB => Some((Dir::D, Dir::B)),
            Dir::DF => Some((Dir::D, Dir::F)),
            _ => None,
        }
    }

    fn from_lower(s: &str) -> Option<Dir> {
        Some(match s {
            "u" => Dir::U,
            "d" => Dir::D,
            "f" => Dir::F,
            "b" => Dir::B,
            "ub" => Dir::UB,
            "uf" => Dir::UF,
            "db" => Dir::DB,
            "df" => Dir::DF,
            "n" => Dir::N,
            _ => return None,
        })
    }
}

/// A direction token value: a tap, or a hold (held for the hold threshold).
///
/// Taps are written lowercase (`df`), holds uppercase (`DF`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Direction {
    pub dir: Dir,
    pub hold: bool,
}

impl Direction {
    pub const fn tap(dir: Dir) -> Self {
        Self { dir, hold: false }
    }

    /// Neutral cannot be held; `hold(Dir::N)` yields a neutral tap.
    pub const fn hold(dir: Dir) -> Self {
        Self {
            dir,
            hold: !matches!(dir, Dir::N),
        }
    }

    pub fn canonical(&self) -> String {
        if self.hold {
            self.dir.as_str().to_ascii_uppercase()
        } else {
            self.dir.as_str().to_string()
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        if let Some(dir) = Dir::from_lower(s) {
            return Some(Self::tap(dir));
        }
        if s.chars().all(|c| c.is_ascii_uppercase()) {
            let dir = Dir::from_lower(&s.to_ascii_lowercase())?;
            if dir != Dir::N {
                return Some(Self::hold(dir));
            }
        }
        None
    }
}

// --- Buttons ---

/// A non-empty combination of the four attack buttons, stored as a bit set
/// (bit 0 = button 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Buttons(u8);

impl Buttons {
    /// Builds a combination from button numbers. Numbers outside 1..=4 are
    /// ignored; returns `None` if nothing valid remains.
    pub fn from_numbers<I: IntoIterator<Item = u8>>(numbers: I) -> Option<Self> {
        let bits = numbers
            .into_iter()
            .filter(|n| (1..=4).contains(n))
            .fold(0u8, |acc, n| acc | 1 << (n - 1));
        Self::from_bits(bits)
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        let bits = bits & 0b1111;
        (bits != 0).then_some(Self(bits))
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, button: u8) -> bool {
        (1..=4).contains(&button) && self.0 & (1 << (button - 1)) != 0
    }

    /// Button numbers in ascending order.
    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        (1..=4u8).filter(move |n| self.contains(*n))
    }

    pub fn canonical(&self) -> String {
        self.numbers()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join("+")
    }

    /// Accepts `1`, `1+2`, `2+1`... Duplicates and unknown digits are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let mut bits = 0u8;
        for part in s.split('+') {
            let n: u8 = part.parse().ok()?;
            if !(1..=4).contains(&n) || bits & (1 << (n - 1)) != 0 {
                return None;
            }
            bits |= 1 << (n - 1);
        }
        Self::from_bits(bits)
    }
}

// --- Specials and structural marks ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Special {
    Heat,
    /// Two heat activations merged by a double press.
    HeatSmash,
    Rage,
}

impl Special {
    pub fn as_str(&self) -> &'static str {
        match self {
            Special::Heat => "heat",
            Special::HeatSmash => "heatSmash",
            Special::Rage => "rage",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "heat" => Some(Special::Heat),
            "heatSmash" => Some(Special::HeatSmash),
            "rage" => Some(Special::Rage),
            _ => None,
        }
    }
}

/// Structural notation marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    BracketOpen,
    BracketClose,
    ParenOpen,
    ParenClose,
    Tilde,
    /// Separator between two consecutive moves.
    Next,
    LineBreak,
}

impl Mark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::BracketOpen => "[",
            Mark::BracketClose => "]",
            Mark::ParenOpen => "(",
            Mark::ParenClose => ")",
            Mark::Tilde => "~",
            Mark::Next => "next",
            Mark::LineBreak => "\n",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "[" => Some(Mark::BracketOpen),
            "]" => Some(Mark::BracketClose),
            "(" => Some(Mark::ParenOpen),
            ")" => Some(Mark::ParenClose),
            "~" => Some(Mark::Tilde),
            "next" => Some(Mark::Next),
            "\n" => Some(Mark::LineBreak),
            _ => None,
        }
    }
}

// --- Token ---

/// One atomic unit of command notation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    Direction(Direction),
    Button(Buttons),
    Special(Special),
    Notation(Mark),
    Text(String),
}

impl Token {
    pub fn tap(dir: Dir) -> Self {
        Token::Direction(Direction::tap(dir))
    }

    pub fn hold(dir: Dir) -> Self {
        Token::Direction(Direction::hold(dir))
    }

    /// Convenience for tests and the trace format: `Token::buttons(&[1, 2])`.
    pub fn buttons(numbers: &[u8]) -> Option<Self> {
        Buttons::from_numbers(numbers.iter().copied()).map(Token::Button)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Token::Text(_))
    }

    /// Parses a bare (unquoted) canonical token. Text tokens are never
    /// produced here; quoting is the codec's business.
    pub fn parse_bare(s: &str) -> Option<Self> {
        if let Some(d) = Direction::parse(s) {
            return Some(Token::Direction(d));
        }
        if let Some(b) = Buttons::parse(s) {
            return Some(Token::Button(b));
        }
        if let Some(sp) = Special::parse(s) {
            return Some(Token::Special(sp));
        }
        Mark::parse(s).map(Token::Notation)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Direction(d) => f.write_str(&d.canonical()),
            Token::Button(b) => f.write_str(&b.canonical()),
            Token::Special(s) => f.write_str(s.as_str()),
            Token::Notation(m) => f.write_str(m.as_str()),
            Token::Text(t) => write!(f, "{:?}", t),
        }
    }
}
