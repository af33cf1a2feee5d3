//! The two-character region code grid.
//!
//! The second `wikitable` on the page has one row per first character
//! and one column per second character, in VIN alphabet order. Cells
//! name the country and may span several columns (`colspan`) or carry on
//! into following rows (`rowspan`).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::seed::RegionEntry;
use crate::vin::{alphabet_index, ALPHABET};

static TABLES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.wikitable").expect("static selector"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("static selector"));
static CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("static selector"));

/// Text of a cell with whitespace collapsed.
pub(super) fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn span(cell: ElementRef<'_>, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

/// Clean a country name from the grid: drop parenthesized remarks and
/// map the spellings the page uses onto the country dataset's names.
#[must_use]
pub fn normalize_country_name(raw: &str) -> String {
    let name = raw.split('(').next().unwrap_or(raw).trim();
    match name {
        "Swaziland" => "Eswatini",
        "UAE" => "United Arab Emirates",
        "Dom. Rep." => "Dominican Republic",
        "Bosnia & Herzogovina" | "Bosnia & Herzegovina" => "Bosnia and Herzegovina",
        other => other,
    }
    .to_string()
}

/// A cell still covering columns of later rows.
#[derive(Debug, Clone)]
struct Claim {
    country: String,
    rows_left: usize,
    colspan: usize,
}

/// Country per `(row, column)` grid position, both as VIN alphabet
/// indices.
fn read_grid(table: ElementRef<'_>) -> BTreeMap<(usize, usize), String> {
    let columns = ALPHABET.len();
    let mut grid = BTreeMap::new();
    let mut claims: BTreeMap<usize, Claim> = BTreeMap::new();

    for row in table.select(&ROWS) {
        let cells: Vec<_> = row.select(&CELLS).collect();
        let Some(first) = cells.first() else {
            continue;
        };

        // Header rows start with an empty cell, notes with a word
        let label = cell_text(*first);
        let mut chars = label.chars();
        let (Some(letter), None) = (chars.next(), chars.next()) else {
            continue;
        };
        let Some(row_index) = alphabet_index(letter) else {
            debug!("Skipping grid row '{label}'");
            continue;
        };

        let mut next_claims = BTreeMap::new();
        let mut col = 0;
        let mut next_cell = 1;
        while col < columns {
            let (country, colspan) = if let Some(claim) = claims.get(&col) {
                if claim.rows_left > 1 {
                    next_claims.insert(
                        col,
                        Claim {
                            rows_left: claim.rows_left - 1,
                            ..claim.clone()
                        },
                    );
                }
                (claim.country.clone(), claim.colspan)
            } else if let Some(cell) = cells.get(next_cell) {
                next_cell += 1;
                let text = cell_text(*cell);
                let colspan = span(*cell, "colspan");
                let rowspan = span(*cell, "rowspan");
                if rowspan > 1 && !text.is_empty() {
                    next_claims.insert(
                        col,
                        Claim {
                            country: text.clone(),
                            rows_left: rowspan - 1,
                            colspan,
                        },
                    );
                }
                (text, colspan)
            } else {
                (String::new(), 1)
            };

            let country = normalize_country_name(&country);
            if !country.is_empty() {
                for c in col..(col + colspan).min(columns) {
                    grid.insert((row_index, c), country.clone());
                }
            }
            col += colspan;
        }
        claims = next_claims;
    }
    grid
}

fn format_range(row: char, start: char, end: char) -> String {
    if start == end {
        format!("{row}{start}")
    } else {
        format!("{row}{start}-{row}{end}")
    }
}

/// Merge runs of adjacent codes in the same row and country into ranges.
fn consolidate(grid: &BTreeMap<(usize, usize), String>) -> Vec<RegionEntry> {
    let alphabet: Vec<char> = ALPHABET.chars().collect();
    let mut entries = Vec::new();
    // (row, first column, last column, country)
    let mut run: Option<(usize, usize, usize, &String)> = None;

    let mut flush = |run: Option<(usize, usize, usize, &String)>| {
        if let Some((row, start, end, country)) = run {
            entries.push(RegionEntry {
                range: format_range(alphabet[row], alphabet[start], alphabet[end]),
                country: country.clone(),
            });
        }
    };

    for (&(row, col), country) in grid {
        run = match run {
            Some((r, start, end, c)) if r == row && end + 1 == col && c == country => {
                Some((r, start, col, c))
            }
            previous => {
                flush(previous);
                Some((row, col, col, country))
            }
        };
    }
    flush(run);
    entries
}

/// Parse the region grid into range entries, in grid order.
///
/// # Errors
///
/// Returns [`Error::Scrape`] if the page has fewer than two `wikitable`
/// tables.
pub fn parse_region_table(html: &str) -> Result<Vec<RegionEntry>> {
    let document = Html::parse_document(html);
    let table = document.select(&TABLES).nth(1).ok_or_else(|| {
        Error::scrape("regions", "expected the region grid as the second wikitable")
    })?;

    let grid = read_grid(table);
    let entries = consolidate(&grid);
    info!(
        "Parsed {} region codes into {} ranges",
        grid.len(),
        entries.len()
    );
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::test_support::WMI_PAGE;

    fn ranges(entries: &[RegionEntry]) -> Vec<(&str, &str)> {
        entries
            .iter()
            .map(|e| (e.range.as_str(), e.country.as_str()))
            .collect()
    }

    fn grid_page(rows: &str) -> String {
        format!(
            r#"<table class="wikitable"></table>
               <table class="wikitable">{rows}</table>"#
        )
    }

    #[test]
    fn test_normalize_country_name() {
        assert_eq!(normalize_country_name("Swaziland"), "Eswatini");
        assert_eq!(normalize_country_name("UAE"), "United Arab Emirates");
        assert_eq!(normalize_country_name("Dom. Rep."), "Dominican Republic");
        assert_eq!(
            normalize_country_name("Bosnia & Herzogovina"),
            "Bosnia and Herzegovina"
        );
        assert_eq!(
            normalize_country_name("Germany (former East Germany)"),
            "Germany"
        );
        assert_eq!(normalize_country_name("  Japan "), "Japan");
        assert_eq!(normalize_country_name("(unassigned)"), "");
    }

    #[test]
    fn test_parse_region_table() {
        let entries = parse_region_table(WMI_PAGE).unwrap();

        assert_eq!(
            ranges(&entries),
            [
                ("AA-AH", "South Africa"),
                ("AJ-AK", "Ivory Coast"),
                ("JA-J0", "Japan"),
                ("KA-KE", "Korea"),
                ("KF-K0", "Kazakhstan"),
                ("LA-LE", "Korea"),
                ("LF-L0", "China"),
                ("SA-SM", "United Kingdom"),
                ("SN-S0", "Germany"),
                ("YA-YB", "Finland"),
                ("YC", "Eswatini"),
            ]
        );
    }

    #[test]
    fn test_rowspan_claims_columns_of_later_rows() {
        let page = grid_page(
            r#"<tr><th>1</th><td colspan="2">United States</td><td rowspan="3">Canada</td></tr>
               <tr><th>2</th><td colspan="2">Mexico</td></tr>
               <tr><th>3</th><td>Brazil</td><td>Chile</td></tr>
               <tr><th>4</th><td colspan="3">Peru</td></tr>"#,
        );

        let entries = parse_region_table(&page).unwrap();
        assert_eq!(
            ranges(&entries),
            [
                ("1A-1B", "United States"),
                ("1C", "Canada"),
                ("2A-2B", "Mexico"),
                ("2C", "Canada"),
                ("3A", "Brazil"),
                ("3B", "Chile"),
                ("3C", "Canada"),
                ("4A-4C", "Peru"),
            ]
        );
    }

    #[test]
    fn test_empty_cells_leave_gaps() {
        let page = grid_page(
            r#"<tr><th>W</th><td colspan="2">Germany</td><td></td><td>Germany</td></tr>"#,
        );

        let entries = parse_region_table(&page).unwrap();
        assert_eq!(ranges(&entries), [("WA-WB", "Germany"), ("WD", "Germany")]);
    }

    #[test]
    fn test_colspan_past_last_column_is_clamped() {
        let page = grid_page(r#"<tr><th>9</th><td colspan="40">Brazil</td></tr>"#);

        let entries = parse_region_table(&page).unwrap();
        assert_eq!(ranges(&entries), [("9A-90", "Brazil")]);
    }

    #[test]
    fn test_missing_grid() {
        let err = parse_region_table(r#"<table class="wikitable"></table>"#).unwrap_err();
        assert!(matches!(err, Error::Scrape { section: "regions", .. }));
    }
}
