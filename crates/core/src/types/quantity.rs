//! Coercion of shopper-supplied quantities.
//!
//! Quantity input is never rejected with an error: negatives clamp to zero,
//! fractions truncate, and text that is not a number is ignored.

use core::fmt;

/// A quantity after coercion. Zero means "remove the row".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quantity(u32);

impl Quantity {
    pub const ZERO: Self = Self(0);

    /// Clamp an integer into the valid range.
    #[must_use]
    pub fn clamp(value: i64) -> Self {
        Self(u32::try_from(value.max(0)).unwrap_or(u32::MAX))
    }

    /// Coerce raw text (e.g. the value of a number input).
    ///
    /// Returns `None` when the text is not a finite number.
    ///
    /// ```
    /// use horno_core::Quantity;
    ///
    /// assert_eq!(Quantity::parse_input(" 3 "), Some(Quantity::clamp(3)));
    /// assert_eq!(Quantity::parse_input("2.9"), Some(Quantity::clamp(2)));
    /// assert_eq!(Quantity::parse_input("-5"), Some(Quantity::ZERO));
    /// assert_eq!(Quantity::parse_input("dos"), None);
    /// ```
    #[must_use]
    pub fn parse_input(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if let Ok(whole) = trimmed.parse::<i64>() {
            return Some(Self::clamp(whole));
        }

        let value = trimmed.parse::<f64>().ok().filter(|v| v.is_finite())?;
        #[allow(clippy::cast_possible_truncation)] // `as` saturates; truncation toward zero is intended
        let whole = value.trunc() as i64;
        Some(Self::clamp(whole))
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(Quantity::clamp(-5), Quantity::ZERO);
        assert_eq!(Quantity::clamp(0), Quantity::ZERO);
        assert_eq!(Quantity::clamp(3).get(), 3);
        assert_eq!(Quantity::clamp(i64::MAX).get(), u32::MAX);
    }

    #[test]
    fn test_parse_input_edge_cases() {
        assert_eq!(Quantity::parse_input(""), None);
        assert_eq!(Quantity::parse_input("NaN"), None);
        assert_eq!(Quantity::parse_input("inf"), None);
        assert_eq!(Quantity::parse_input("-0.5"), Some(Quantity::ZERO));
        assert_eq!(Quantity::parse_input("1e1"), Some(Quantity::clamp(10)));
    }
}
