use core::fmt;
use serde::{Deserialize, Serialize};

/// Card color. Always public, and the tie-break when two ranks are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    #[serde(rename = "B")]
    Black = 0,
    #[serde(rename = "W")]
    White = 1,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Black, Color::White];

    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'B' => Some(Color::Black),
            'W' => Some(Color::White),
            _ => None,
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            Color::Black => 'B',
            Color::White => 'W',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
