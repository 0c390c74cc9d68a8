use std::fmt;

use super::GridVector;

/// Axis-aligned unit step on the pixel grid.
///
/// Slices use image coordinates: `x` grows to the right and `y` grows
/// downwards, so turning right means turning clockwise on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    East,
    South,
    West,
    North,
}

impl Direction {
    /// Unit step of this direction.
    #[must_use]
    pub fn vector(self) -> GridVector {
        match self {
            Self::East => GridVector::new(1, 0),
            Self::South => GridVector::new(0, 1),
            Self::West => GridVector::new(-1, 0),
            Self::North => GridVector::new(0, -1),
        }
    }

    /// Direction after a clockwise quarter turn.
    #[must_use]
    pub fn right(self) -> Self {
        match self {
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
            Self::North => Self::East,
        }
    }

    /// Direction after a counter-clockwise quarter turn.
    #[must_use]
    pub fn left(self) -> Self {
        match self {
            Self::East => Self::North,
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
        }
    }

    /// Applies a relative turn.
    #[must_use]
    pub fn turn(self, turn: Turn) -> Self {
        match turn {
            Turn::Forward => self,
            Turn::Left => self.left(),
            Turn::Right => self.right(),
        }
    }
}

/// Relative move between two consecutive unit steps of a boundary walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    Forward,
    Left,
    Right,
}

impl Turn {
    /// Single-letter code used in turn strings.
    #[must_use]
    pub fn code(self) -> char {
        match self {
            Self::Forward => 'F',
            Self::Left => 'L',
            Self::Right => 'R',
        }
    }

    /// Parses a single-letter code.
    #[must_use]
    pub fn from_code(c: char) -> Option<Self> {
        match c {
            'F' => Some(Self::Forward),
            'L' => Some(Self::Left),
            'R' => Some(Self::Right),
            _ => None,
        }
    }

    /// Parses a turn string such as `"FRFL"`. Returns `None` on any other letter.
    #[must_use]
    pub fn parse_sequence(s: &str) -> Option<Vec<Self>> {
        s.chars().map(Self::from_code).collect()
    }

    /// Net quarter turns: `+1` clockwise, `-1` counter-clockwise.
    #[must_use]
    pub fn winding(self) -> i32 {
        match self {
            Self::Forward => 0,
            Self::Left => -1,
            Self::Right => 1,
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Formats a turn sequence as a compact string.
#[must_use]
pub fn turn_string(turns: &[Turn]) -> String {
    turns.iter().map(|t| t.code()).collect()
}
