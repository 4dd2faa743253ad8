use crate::{UuidError, UuidResult};
use chrono::NaiveDate;
use std::{fmt, str::FromStr};

/// The letter prefix of a prescription number (1 to 8 uppercase ASCII letters).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrescriptionPrefix(String);

impl PrescriptionPrefix {
    const MAX_LEN: usize = 8;

    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] unless the input is 1 to 8 uppercase ASCII letters.
    pub fn new(input: &str) -> UuidResult<Self> {
        let input = input.trim();
        if input.is_empty()
            || input.len() > Self::MAX_LEN
            || !input.bytes().all(|b| b.is_ascii_uppercase())
        {
            return Err(UuidError::InvalidInput(format!(
                "prescription prefix must be 1-{} uppercase ASCII letters, got: '{}'",
                Self::MAX_LEN,
                input
            )));
        }
        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PrescriptionPrefix {
    fn default() -> Self {
        Self("R".into())
    }
}

impl fmt::Display for PrescriptionPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-facing prescription identifier: `<PREFIX>-<YYYYMMDD>-<NNNN>`.
///
/// Example: `R-20261016-0042`
///
/// The sequence is the per-day ordinal allocated by the store when the prescription is
/// created. It is zero-padded to four digits and grows wider past 9999.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrescriptionNumber {
    prefix: PrescriptionPrefix,
    issued_on: NaiveDate,
    sequence: u32,
}

impl PrescriptionNumber {
    /// Builds a number from its parts. `sequence` must be at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] when `sequence` is zero.
    pub fn new(prefix: PrescriptionPrefix, issued_on: NaiveDate, sequence: u32) -> UuidResult<Self> {
        if sequence == 0 {
            return Err(UuidError::InvalidInput(
                "prescription sequence starts at 1".into(),
            ));
        }
        Ok(Self {
            prefix,
            issued_on,
            sequence,
        })
    }

    pub fn prefix(&self) -> &PrescriptionPrefix {
        &self.prefix
    }

    pub fn issued_on(&self) -> NaiveDate {
        self.issued_on
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// The `YYYYMMDD` key under which the store counts prescriptions for a day.
    pub fn day_key(date: NaiveDate) -> String {
        date.format("%Y%m%d").to_string()
    }
}

impl fmt::Display for PrescriptionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:04}",
            self.prefix,
            Self::day_key(self.issued_on),
            self.sequence
        )
    }
}

impl FromStr for PrescriptionNumber {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || UuidError::InvalidInput(format!("invalid prescription number: '{}'", s));

        let mut parts = s.split('-');
        let (Some(prefix), Some(day), Some(seq), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let prefix = PrescriptionPrefix::new(prefix)?;
        if day.len() != 8 {
            return Err(invalid());
        }
        let issued_on = NaiveDate::parse_from_str(day, "%Y%m%d").map_err(|_| invalid())?;
        if seq.len() < 4 || !seq.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let sequence: u32 = seq.parse().map_err(|_| invalid())?;

        Self::new(prefix, issued_on, sequence)
    }
}
