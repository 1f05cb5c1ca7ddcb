//! Axis identifiers for the three-axis table.

use core::fmt;

/// One of the three motion axes.
///
/// Used to index every per-axis array in the crate, so the discriminants
/// are fixed at 0..=2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisId {
    /// Horizontal X axis.
    X = 0,
    /// Horizontal Y axis.
    Y = 1,
    /// Vertical Z axis.
    Z = 2,
}

impl AxisId {
    /// All axes in index order.
    pub const ALL: [AxisId; 3] = [AxisId::X, AxisId::Y, AxisId::Z];

    /// Array index for this axis.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parse an axis token (case-insensitive).
    pub fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("x") {
            Some(AxisId::X)
        } else if token.eq_ignore_ascii_case("y") {
            Some(AxisId::Y)
        } else if token.eq_ignore_ascii_case("z") {
            Some(AxisId::Z)
        } else {
            None
        }
    }

    /// Upper-case letter for reports and log lines.
    #[inline]
    pub const fn letter(self) -> &'static str {
        match self {
            AxisId::X => "X",
            AxisId::Y => "Y",
            AxisId::Z => "Z",
        }
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_order() {
        for (i, axis) in AxisId::ALL.iter().enumerate() {
            assert_eq!(axis.index(), i);
        }
    }

    #[test]
    fn test_token_parsing() {
        assert_eq!(AxisId::from_token("x"), Some(AxisId::X));
        assert_eq!(AxisId::from_token("Y"), Some(AxisId::Y));
        assert_eq!(AxisId::from_token("z"), Some(AxisId::Z));
        assert_eq!(AxisId::from_token("all"), None);
        assert_eq!(AxisId::from_token(""), None);
    }
}
