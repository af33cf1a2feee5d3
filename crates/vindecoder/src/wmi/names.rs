//! Location naming used by the WMI data sources.

/// Continents that appear as WMI assignees in place of a country.
pub const KNOWN_REGIONS: [&str; 7] = [
    "Africa",
    "Asia",
    "Europe",
    "North America",
    "South America",
    "Oceania",
    "Antarctica",
];

/// ISO alpha-2 code of the catch-all country for unassigned codes.
pub const UNKNOWN_COUNTRY_ISO: &str = "XX";

/// Source spellings that differ from the country table's common names.
const NAME_ALIASES: [(&str, &str); 10] = [
    ("Turkey", "Türkiye"),
    ("Czech Republic", "Czechia"),
    ("Czechia", "Czech Republic"),
    ("SA", "South America"),
    ("Swaziland", "Eswatini"),
    ("UAE", "United Arab Emirates"),
    ("Dom. Rep.", "Dominican Republic"),
    ("Bosnia & Herzogovina", "Bosnia and Herzegovina"),
    ("Bosnia & Herzegovina", "Bosnia and Herzegovina"),
    ("USA", "United States"),
];

/// Whether `name` is one of the continental pseudo-countries.
#[must_use]
pub fn is_known_region(name: &str) -> bool {
    KNOWN_REGIONS.contains(&name)
}

/// Placeholder ISO alpha-2 and alpha-3 codes for a continental region.
///
/// They start with `0` so they never collide with a real ISO code.
#[must_use]
pub fn region_iso_codes(name: &str) -> Option<(&'static str, &'static str)> {
    match name {
        "Africa" => Some(("0A", "0AF")),
        "Asia" => Some(("0S", "0AS")),
        "Europe" => Some(("0E", "0EU")),
        "North America" => Some(("0N", "0NA")),
        "South America" => Some(("0U", "0SA")),
        "Oceania" => Some(("0C", "0OC")),
        "Antarctica" => Some(("0T", "0AN")),
        _ => None,
    }
}

/// Names to try, in order, when looking a source location up in the
/// country table.
///
/// Inline annotations (`Germany<small>(former East)</small>`) are
/// stripped first. The aliased spelling comes before the original so
/// both directions of a rename resolve.
#[must_use]
pub fn location_name_candidates(name: &str) -> Vec<String> {
    let cleaned = name.split("<small>").next().unwrap_or(name).trim();

    let mut candidates: Vec<String> = NAME_ALIASES
        .iter()
        .filter(|(from, _)| *from == cleaned)
        .map(|(_, to)| (*to).to_string())
        .collect();
    candidates.push(cleaned.to_string());
    candidates
}
