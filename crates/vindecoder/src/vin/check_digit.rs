//! ISO 3779 / 49 CFR 565 check digit.

/// Positional weights; position 9 (the check digit itself) weighs 0.
pub const WEIGHTS: [u32; 17] = [8, 7, 6, 5, 4, 3, 2, 10, 0, 9, 8, 7, 6, 5, 4, 3, 2];

/// Numeric value of a VIN character for the check digit sum.
///
/// Returns 0 for characters outside the VIN alphabet.
#[must_use]
pub fn transliterate(c: char) -> u32 {
    match c {
        'A' | 'J' => 1,
        'B' | 'K' | 'S' => 2,
        'C' | 'L' | 'T' => 3,
        'D' | 'M' | 'U' => 4,
        'E' | 'N' | 'V' => 5,
        'F' | 'W' => 6,
        'G' | 'P' | 'X' => 7,
        'H' | 'Y' => 8,
        'R' | 'Z' => 9,
        '0'..='9' => c.to_digit(10).unwrap_or(0),
        _ => 0,
    }
}

/// Compute the check digit for a 17-character VIN.
///
/// The character currently at position 9 does not affect the result.
/// A remainder of 10 is written as `X`.
#[must_use]
pub fn compute_check_digit(vin: &str) -> char {
    let total: u32 = vin
        .chars()
        .zip(WEIGHTS)
        .map(|(c, w)| transliterate(c) * w)
        .sum();

    match total % 11 {
        10 => 'X',
        // remainder is 0..=9 here
        r => char::from_digit(r, 10).unwrap_or('0'),
    }
}
