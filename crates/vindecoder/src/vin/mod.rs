//! Vehicle Identification Number rules.
//!
//! A VIN is 17 characters drawn from [`ALPHABET`]. This module validates
//! the character set, splits the VIN into its sections, and implements the
//! check digit and model-year rules. Nothing here touches the database.

mod check_digit;
mod generate;
mod model_year;

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

pub use check_digit::{compute_check_digit, transliterate, WEIGHTS};
pub use generate::generate;
pub use model_year::{model_year_codes, past_model_year_codes, resolve_model_year};

/// Length of every VIN.
pub const VIN_LENGTH: usize = 17;

/// Characters a VIN may contain, in the order used for range expansion.
///
/// `I`, `O` and `Q` are excluded because they read too much like `1` and `0`.
pub const ALPHABET: &str = "ABCDEFGHJKLMNPRSTUVWXYZ1234567890";

/// Letters that are never valid in a VIN, in reporting order.
const FORBIDDEN: [char; 3] = ['I', 'O', 'Q'];

/// Why a string is not a usable VIN.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VinError {
    /// The VIN is not 17 characters long.
    #[error("VIN must be exactly {VIN_LENGTH} characters")]
    InvalidLength {
        /// Number of characters supplied.
        actual: usize,
    },

    /// The VIN contains `I`, `O` or `Q`.
    #[error("Invalid character \"{0}\" found")]
    ForbiddenCharacter(char),

    /// The VIN contains a character outside [`ALPHABET`].
    #[error("VIN contains invalid characters")]
    InvalidCharacters,

    /// A North American VIN failed its check digit.
    #[error("Check digit validation failed. This VIN is not valid.")]
    CheckDigitMismatch {
        /// The digit found at position 9.
        found: char,
        /// The digit computed from the other positions.
        expected: char,
    },
}

/// Check whether `c` may appear in a VIN.
#[must_use]
pub fn is_vin_char(c: char) -> bool {
    ALPHABET.contains(c)
}

/// Position of `c` within [`ALPHABET`].
#[must_use]
pub fn alphabet_index(c: char) -> Option<usize> {
    ALPHABET.chars().position(|a| a == c)
}

/// A syntactically valid, uppercase VIN.
///
/// Construction through [`Vin::parse`] guarantees exactly 17 ASCII
/// characters from [`ALPHABET`], so the section accessors can slice by
/// byte offset. The check digit is *not* enforced here; see
/// [`Vin::validate_for_decode`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Vin(String);

impl Vin {
    /// Normalize and validate a VIN.
    ///
    /// Surrounding whitespace is trimmed and letters are uppercased.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: length, then forbidden letters,
    /// then any other character outside the alphabet.
    pub fn parse(input: &str) -> Result<Self, VinError> {
        let vin = input.trim().to_uppercase();

        let len = vin.chars().count();
        if len != VIN_LENGTH {
            return Err(VinError::InvalidLength { actual: len });
        }

        if let Some(c) = FORBIDDEN.iter().find(|c| vin.contains(**c)) {
            return Err(VinError::ForbiddenCharacter(*c));
        }

        if !vin.chars().all(is_vin_char) {
            return Err(VinError::InvalidCharacters);
        }

        Ok(Self(vin))
    }

    /// Parse and apply the decode-time rules.
    ///
    /// North American VINs (first character `1`-`5`) must carry a correct
    /// check digit; elsewhere the check digit is informational.
    ///
    /// # Errors
    ///
    /// Returns a [`VinError`] if parsing fails or a North American VIN has
    /// a wrong check digit.
    pub fn validate_for_decode(input: &str) -> Result<Self, VinError> {
        let vin = Self::parse(input)?;
        if vin.is_north_american() && !vin.check_digit_valid() {
            return Err(VinError::CheckDigitMismatch {
                found: vin.check_digit(),
                expected: vin.expected_check_digit(),
            });
        }
        Ok(vin)
    }

    /// The full VIN.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// World Manufacturer Identifier, positions 1-3.
    #[must_use]
    pub fn wmi(&self) -> &str {
        &self.0[0..3]
    }

    /// The two-character region code, positions 1-2.
    #[must_use]
    pub fn region_code(&self) -> &str {
        &self.0[0..2]
    }

    /// Vehicle Descriptor Section, positions 4-9.
    #[must_use]
    pub fn vds(&self) -> &str {
        &self.0[3..9]
    }

    /// Vehicle Identifier Section, positions 10-17.
    #[must_use]
    pub fn vis(&self) -> &str {
        &self.0[9..17]
    }

    /// Serial number, positions 12-17.
    #[must_use]
    pub fn serial_number(&self) -> &str {
        &self.0[11..17]
    }

    /// Check digit, position 9.
    #[must_use]
    pub fn check_digit(&self) -> char {
        self.char_at(8)
    }

    /// Model year code, position 10.
    #[must_use]
    pub fn model_year_char(&self) -> char {
        self.char_at(9)
    }

    /// Plant code, position 11.
    #[must_use]
    pub fn plant_code(&self) -> char {
        self.char_at(10)
    }

    /// The check digit computed from the other positions.
    #[must_use]
    pub fn expected_check_digit(&self) -> char {
        compute_check_digit(&self.0)
    }

    /// Whether position 9 holds the computed check digit.
    #[must_use]
    pub fn check_digit_valid(&self) -> bool {
        self.check_digit() == self.expected_check_digit()
    }

    /// Whether the VIN was assigned in North America (first character 1-5).
    #[must_use]
    pub fn is_north_american(&self) -> bool {
        matches!(self.0.as_bytes()[0], b'1'..=b'5')
    }

    fn char_at(&self, index: usize) -> char {
        char::from(self.0.as_bytes()[index])
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Vin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Vin {
    type Err = VinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Vin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HONDA: &str = "1HGCM82633A004352";

    #[test]
    fn test_alphabet_excludes_ioq() {
        assert_eq!(ALPHABET.len(), 33);
        for c in FORBIDDEN {
            assert!(!is_vin_char(c));
        }
    }

    #[test]
    fn test_alphabet_index() {
        assert_eq!(alphabet_index('A'), Some(0));
        assert_eq!(alphabet_index('Z'), Some(22));
        assert_eq!(alphabet_index('1'), Some(23));
        assert_eq!(alphabet_index('0'), Some(32));
        assert_eq!(alphabet_index('O'), None);
    }

    #[test]
    fn test_parse_normalizes() {
        let vin = Vin::parse("  1hgcm82633a004352 \n").unwrap();
        assert_eq!(vin.as_str(), HONDA);
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            Vin::parse("1HGCM"),
            Err(VinError::InvalidLength { actual: 5 })
        );
        assert_eq!(
            Vin::parse("1HGCM82633A0043521").unwrap_err().to_string(),
            "VIN must be exactly 17 characters"
        );
    }

    #[test]
    fn test_parse_forbidden_character() {
        let err = Vin::parse("1HGCM82633A00435O").unwrap_err();
        assert_eq!(err, VinError::ForbiddenCharacter('O'));
        assert_eq!(err.to_string(), "Invalid character \"O\" found");
    }

    #[test]
    fn test_parse_reports_forbidden_in_fixed_order() {
        // Q appears first in the string, but I is checked first
        let err = Vin::parse("QHGCM82633A00435I").unwrap_err();
        assert_eq!(err, VinError::ForbiddenCharacter('I'));
    }

    #[test]
    fn test_parse_invalid_characters() {
        assert_eq!(
            Vin::parse("1HGCM82633A00435-"),
            Err(VinError::InvalidCharacters)
        );
    }

    #[test]
    fn test_sections() {
        let vin = Vin::parse(HONDA).unwrap();
        assert_eq!(vin.wmi(), "1HG");
        assert_eq!(vin.region_code(), "1H");
        assert_eq!(vin.vds(), "CM8263");
        assert_eq!(vin.vis(), "3A004352");
        assert_eq!(vin.check_digit(), '3');
        assert_eq!(vin.model_year_char(), '3');
        assert_eq!(vin.plant_code(), 'A');
        assert_eq!(vin.serial_number(), "004352");
    }

    #[test]
    fn test_check_digit_valid() {
        let vin = Vin::parse(HONDA).unwrap();
        assert!(vin.check_digit_valid());
        assert!(vin.is_north_american());
    }

    #[test]
    fn test_validate_for_decode_rejects_bad_north_american() {
        let err = Vin::validate_for_decode("1HGCM82643A004352").unwrap_err();
        assert_eq!(
            err,
            VinError::CheckDigitMismatch {
                found: '4',
                expected: '3'
            }
        );
    }

    #[test]
    fn test_validate_for_decode_accepts_bad_non_north_american() {
        // European VIN with a check digit that does not compute
        let vin = Vin::validate_for_decode("WVWZZZ1JZXW000001").unwrap();
        assert!(!vin.is_north_american());
        assert!(!vin.check_digit_valid());
    }

    #[test]
    fn test_display_and_serialize() {
        let vin: Vin = HONDA.parse().unwrap();
        assert_eq!(vin.to_string(), HONDA);
        assert_eq!(serde_json::to_string(&vin).unwrap(), format!("\"{HONDA}\""));
    }
}
