//! Validated scalar types shared across the clinic crates.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Errors that can occur when creating validated numeric types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity must be at least 1, got {0}")]
    Zero(i64),
    #[error("value {value} is outside the allowed range {min}..={max}")]
    OutOfRange { value: i64, min: i64, max: i64 },
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Treats blank input as absent.
    ///
    /// Optional form fields arrive as empty strings as often as they arrive missing; both
    /// map to `None` here.
    pub fn optional(input: Option<impl AsRef<str>>) -> Option<Self> {
        input.and_then(|s| Self::new(s).ok())
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A dispensing quantity of at least one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quantity(u32);

impl Quantity {
    /// Creates a quantity, rejecting zero and negative values.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::Zero` for values below 1 and `QuantityError::OutOfRange` for
    /// values that do not fit in a `u32`.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::Zero(value));
        }
        let value = u32::try_from(value).map_err(|_| QuantityError::OutOfRange {
            value,
            min: 1,
            max: i64::from(u32::MAX),
        })?;
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A patient age in whole years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Age(u8);

impl Age {
    pub const MAX: u8 = 150;

    /// # Errors
    ///
    /// Returns `QuantityError::OutOfRange` unless `0 <= value <= 150`.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if !(0..=i64::from(Self::MAX)).contains(&value) {
            return Err(QuantityError::OutOfRange {
                value,
                min: 0,
                max: i64::from(Self::MAX),
            });
        }
        Ok(Self(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Common cold \n").unwrap();
        assert_eq!(text.as_str(), "Common cold");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   ").unwrap_err(), TextError::Empty);
        assert_eq!(NonEmptyText::new("").unwrap_err(), TextError::Empty);
    }

    #[test]
    fn optional_treats_blank_as_none() {
        assert_eq!(NonEmptyText::optional(Some("")), None);
        assert_eq!(NonEmptyText::optional(None::<&str>), None);
        assert_eq!(
            NonEmptyText::optional(Some(" cough ")),
            Some(NonEmptyText::new("cough").unwrap())
        );
    }

    #[test]
    fn deserialize_rejects_empty_string() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"");
        assert!(err.is_err());
        let ok: NonEmptyText = serde_json::from_str("\"500mg\"").unwrap();
        assert_eq!(ok.as_str(), "500mg");
    }

    #[test]
    fn quantity_must_be_positive() {
        assert_eq!(Quantity::new(0).unwrap_err(), QuantityError::Zero(0));
        assert_eq!(Quantity::new(-3).unwrap_err(), QuantityError::Zero(-3));
        assert_eq!(Quantity::new(10).unwrap().get(), 10);
        assert!(matches!(
            Quantity::new(i64::from(u32::MAX) + 1),
            Err(QuantityError::OutOfRange { .. })
        ));
    }

    #[test]
    fn age_is_bounded() {
        assert_eq!(Age::new(0).unwrap().get(), 0);
        assert_eq!(Age::new(150).unwrap().get(), 150);
        assert!(Age::new(151).is_err());
        assert!(Age::new(-1).is_err());
    }
}
