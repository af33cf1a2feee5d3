//! The "List of Many WMIs" factory table.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::info;

use super::regions::cell_text;
use crate::error::{Error, Result};
use crate::seed::FactoryEntry;

const SECTION_ID: &str = "List_of_Many_WMIs";

static SECTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&format!("#{SECTION_ID}")).expect("static selector")
});
static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("static selector"));
static CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("static selector"));

fn is_wikitable(element: ElementRef<'_>) -> bool {
    element.value().name() == "table" && element.value().classes().any(|c| c == "wikitable")
}

/// Whether `element` starts the next section of the page.
fn is_section_heading(element: ElementRef<'_>) -> bool {
    matches!(element.value().name(), "h2" | "h3")
        || element.value().classes().any(|c| c == "mw-heading")
}

/// The first wikitable after the section heading, within the section.
fn find_table(document: &Html) -> Result<ElementRef<'_>> {
    let heading = document
        .select(&SECTION)
        .next()
        .ok_or_else(|| Error::scrape("factories", format!("no element with id {SECTION_ID}")))?;

    // The id sits on the heading, which is wrapped in a div on newer skins
    let start = heading
        .parent()
        .and_then(ElementRef::wrap)
        .filter(|parent| parent.value().classes().any(|c| c == "mw-heading"))
        .unwrap_or(heading);

    start
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|el| !is_section_heading(*el))
        .find(|el| is_wikitable(*el))
        .ok_or_else(|| Error::scrape("factories", "no wikitable in the List of Many WMIs section"))
}

/// Parse the factory table into `{WMI, Manufacturer}` entries.
///
/// The header row, rows with fewer than two cells and rows with an
/// empty WMI or manufacturer are skipped.
///
/// # Errors
///
/// Returns [`Error::Scrape`] if the section or its table is missing.
pub fn parse_factory_table(html: &str) -> Result<Vec<FactoryEntry>> {
    let document = Html::parse_document(html);
    let table = find_table(&document)?;

    let entries: Vec<_> = table
        .select(&ROWS)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<_> = row.select(&CELLS).collect();
            let [wmi, manufacturer, ..] = cells.as_slice() else {
                return None;
            };
            let wmi = cell_text(*wmi);
            let manufacturer = cell_text(*manufacturer);
            (!wmi.is_empty() && !manufacturer.is_empty())
                .then_some(FactoryEntry { wmi, manufacturer })
        })
        .collect();

    info!("Parsed {} factory rows", entries.len());
    Ok(entries)
}
