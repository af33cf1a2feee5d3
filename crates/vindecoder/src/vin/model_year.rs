//! Model year codes (position 10).
//!
//! The code table repeats every 30 years. The table below anchors each
//! code to its 2010-2039 cycle; [`resolve_model_year`] moves codes that
//! are more than a cycle old forward once, and treats years after the
//! current one as unknown.

/// Length of one model-year cycle.
const CYCLE_YEARS: i32 = 30;

const MODEL_YEARS: [(char, i32); 30] = [
    ('A', 2010),
    ('B', 2011),
    ('C', 2012),
    ('D', 2013),
    ('E', 2014),
    ('F', 2015),
    ('G', 2016),
    ('H', 2017),
    ('J', 2018),
    ('K', 2019),
    ('L', 2020),
    ('M', 2021),
    ('N', 2022),
    ('P', 2023),
    ('R', 2024),
    ('S', 2025),
    ('T', 2026),
    ('V', 2027),
    ('W', 2028),
    ('X', 2029),
    ('Y', 2030),
    ('1', 2031),
    ('2', 2032),
    ('3', 2033),
    ('4', 2034),
    ('5', 2035),
    ('6', 2036),
    ('7', 2037),
    ('8', 2038),
    ('9', 2039),
];

/// All characters that encode a model year.
pub fn model_year_codes() -> impl Iterator<Item = char> {
    MODEL_YEARS.iter().map(|(c, _)| *c)
}

/// Resolve a model year code relative to `current_year`.
///
/// A base year more than one cycle before `current_year` moves forward
/// by one cycle. Returns `None` if the resulting year lies after
/// `current_year`, or if `code` is not a model year code (`U`, `Z` and
/// `0` are unused).
#[must_use]
pub fn resolve_model_year(code: char, current_year: i32) -> Option<i32> {
    let base = MODEL_YEARS
        .iter()
        .find_map(|(c, year)| (*c == code).then_some(*year))?;

    let year = if base < current_year - CYCLE_YEARS {
        base + CYCLE_YEARS
    } else {
        base
    };
    (year <= current_year).then_some(year)
}

/// Model year codes that resolve to a year not after `current_year`.
pub fn past_model_year_codes(current_year: i32) -> impl Iterator<Item = char> {
    model_year_codes().filter(move |c| resolve_model_year(*c, current_year).is_some())
}
