//! Threat colors and per-color storage.
//!
//! ## Color
//!
//! Four standard colors shared by every variant, plus `Purple`, which only
//! appears when the mutation challenge is enabled.
//!
//! ## ColorMap
//!
//! Fixed-size per-color storage indexed by `Color`, used for marker counts,
//! supplies, cure status, samples and hospitals.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A threat color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Yellow,
    Black,
    Red,
    Purple,
}

impl Color {
    /// Every color, in index order.
    pub const ALL: [Color; 5] = [
        Color::Blue,
        Color::Yellow,
        Color::Black,
        Color::Red,
        Color::Purple,
    ];

    /// The four colors that carry location cards and must be cured to win.
    pub const STANDARD: [Color; 4] = [Color::Blue, Color::Yellow, Color::Black, Color::Red];

    /// Index into a `ColorMap`.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Black => "black",
            Color::Red => "red",
            Color::Purple => "purple",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-color storage with O(1) access.
///
/// ```
/// use contagion::core::{Color, ColorMap};
///
/// let mut supply: ColorMap<u8> = ColorMap::splat(24);
/// supply[Color::Red] -= 3;
/// assert_eq!(supply[Color::Red], 21);
/// assert_eq!(supply[Color::Blue], 24);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorMap<T> {
    values: [T; 5],
}

impl<T: Copy> ColorMap<T> {
    /// Create a map with every color set to `value`.
    #[must_use]
    pub fn splat(value: T) -> Self {
        Self { values: [value; 5] }
    }

    /// Iterate over (Color, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Color, T)> + '_ {
        Color::ALL.iter().map(move |&c| (c, self.values[c.index()]))
    }
}

impl ColorMap<u8> {
    /// Sum of all colors.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.values.iter().map(|&v| u32::from(v)).sum()
    }
}

impl<T> Index<Color> for ColorMap<T> {
    type Output = T;

    fn index(&self, color: Color) -> &Self::Output {
        &self.values[color.index()]
    }
}

impl<T> IndexMut<Color> for ColorMap<T> {
    fn index_mut(&mut self, color: Color) -> &mut Self::Output {
        &mut self.values[color.index()]
    }
}

/// Progress against a color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CureStatus {
    #[default]
    Active,
    Cured,
    /// Cured and no markers left on the board. Further placements are no-ops.
    Eradicated,
}

impl CureStatus {
    /// Cured or eradicated.
    #[must_use]
    pub fn is_cured(self) -> bool {
        !matches!(self, CureStatus::Active)
    }
}
