//! Random VIN generation.

use rand::seq::IndexedRandom;
use rand::Rng;

use super::{compute_check_digit, is_vin_char, past_model_year_codes, Vin, ALPHABET};

fn random_chars<R: Rng + ?Sized>(rng: &mut R, count: usize, pool: &[u8]) -> String {
    (0..count)
        .map(|_| char::from(pool[rng.random_range(0..pool.len())]))
        .collect()
}

/// Generate a random VIN with a correct check digit.
///
/// When `wmi` is a valid three-character WMI it is used as the prefix;
/// otherwise a random one is drawn from the alphabet. The VDS and plant
/// code are random alphabet characters and the serial number is six
/// random digits. The model year code is drawn from the codes that do
/// not resolve to a year after `current_year` (`L` when there are none).
pub fn generate<R: Rng + ?Sized>(rng: &mut R, wmi: Option<&str>, current_year: i32) -> Vin {
    let alphabet = ALPHABET.as_bytes();

    let wmi = match wmi {
        Some(w) if w.len() == 3 && w.chars().all(is_vin_char) => w.to_string(),
        _ => random_chars(rng, 3, alphabet),
    };
    let vds = random_chars(rng, 5, alphabet);

    let year_codes: Vec<char> = past_model_year_codes(current_year).collect();
    let year = *year_codes.choose(rng).unwrap_or(&'L');
    let plant = random_chars(rng, 1, alphabet);
    let serial = random_chars(rng, 6, b"0123456789");

    let mut vin = format!("{wmi}{vds}0{year}{plant}{serial}");
    let check = compute_check_digit(&vin);
    vin.replace_range(8..9, &check.to_string());

    debug_assert!(Vin::parse(&vin).is_ok(), "generated malformed VIN {vin}");
    Vin(vin)
}
