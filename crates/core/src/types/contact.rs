//! Contact identifiers typed in by customers: phone, CPF and CEP.
//!
//! The storefront accepts masked input (`(11) 99999-9999`, `123.456.789-09`,
//! `01001-000`) and stores digits only, so every type here normalizes by
//! stripping everything that is not an ASCII digit.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing contact identifiers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// The input has no digits at all.
    #[error("value must contain at least one digit")]
    Empty,
    /// The input has the wrong number of digits.
    #[error("expected {expected} digits, got {actual}")]
    InvalidLength {
        /// Required digit count.
        expected: usize,
        /// Digits found in the input.
        actual: usize,
    },
}

/// Keep only the ASCII digits of `input`.
///
/// ```
/// assert_eq!(petbox_core::digits_only("(11) 99999-9999"), "11999999999");
/// ```
#[must_use]
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// A phone number, digits only.
///
/// No length rule is enforced: landlines, mobiles and numbers with country
/// code are all accepted as long as at least one digit is present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse a phone number, discarding mask characters.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::Empty` if the input has no digits.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let digits = digits_only(s);
        if digits.is_empty() {
            return Err(ContactError::Empty);
        }
        Ok(Self(digits))
    }

    /// Returns the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Brazilian individual tax id (CPF), digits only.
///
/// Check digits are not verified; the storefront only requires the field to
/// be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cpf(String);

impl Cpf {
    /// Number of digits in a complete CPF.
    pub const LENGTH: usize = 11;

    /// Parse a CPF, discarding mask characters.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::Empty` if the input has no digits.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let digits = digits_only(s);
        if digits.is_empty() {
            return Err(ContactError::Empty);
        }
        Ok(Self(digits))
    }

    /// Returns the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masked form `123.456.789-09`, or the raw digits when incomplete.
    #[must_use]
    pub fn formatted(&self) -> String {
        let d = &self.0;
        match (d.get(0..3), d.get(3..6), d.get(6..9), d.get(9..11)) {
            (Some(a), Some(b), Some(c), Some(v)) if d.len() == Self::LENGTH => {
                format!("{a}.{b}.{c}-{v}")
            }
            _ => d.clone(),
        }
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Brazilian postal code (CEP): exactly eight digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostalCode(String);

impl PostalCode {
    /// Number of digits in a CEP.
    pub const LENGTH: usize = 8;

    /// Parse a CEP, discarding mask characters.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::Empty` for input without digits and
    /// `ContactError::InvalidLength` unless exactly eight digits remain.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let digits = digits_only(s);
        if digits.is_empty() {
            return Err(ContactError::Empty);
        }
        if digits.len() != Self::LENGTH {
            return Err(ContactError::InvalidLength {
                expected: Self::LENGTH,
                actual: digits.len(),
            });
        }
        Ok(Self(digits))
    }

    /// Returns the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
