//! WMI factory seeding.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::StepReport;
use crate::error::Result;
use crate::storage::{Storage, WmiFactory};
use crate::wmi::{is_known_region, parse_factory_wmis};

/// One entry of `wmi_factory_codes.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryEntry {
    /// Free-form WMI list, e.g. `JHF-JHG, JHL-JHN, JHZ`.
    #[serde(rename = "WMI", default)]
    pub wmi: String,
    /// Manufacturer name.
    #[serde(rename = "Manufacturer", default)]
    pub manufacturer: String,
}

/// Merge `incoming` into an existing manufacturer name.
///
/// Returns `None` when `existing` already mentions `incoming`.
#[must_use]
pub fn merge_manufacturer(existing: &str, incoming: &str) -> Option<String> {
    if existing.contains(incoming) {
        None
    } else {
        Some(format!("{existing} & {incoming}"))
    }
}

/// Factory row for `wmi`, located through the region code of its first
/// two characters.
fn locate(storage: &Storage, wmi: &str, manufacturer: &str) -> Result<WmiFactory> {
    let mut factory = WmiFactory {
        wmi: wmi.to_string(),
        name: manufacturer.to_string(),
        ..WmiFactory::default()
    };

    if let Some(location) = storage.region_country(&wmi[..2])? {
        if is_known_region(location.display_name()) {
            factory.region = Some(location.display_name().to_string());
        } else {
            factory.country_id = location.id;
        }
    }
    Ok(factory)
}

/// Insert the factories of every entry, merging manufacturer names for
/// WMIs listed more than once.
///
/// # Errors
///
/// Returns an error if a database operation fails; the step is rolled
/// back.
pub fn seed_factories(storage: &Storage, entries: &[FactoryEntry]) -> Result<StepReport> {
    storage.in_transaction(|storage| {
        let mut report = StepReport::new("factories");

        for entry in entries {
            let raw = entry.wmi.trim();
            let manufacturer = entry.manufacturer.trim();

            if manufacturer.is_empty() {
                report.error(format!("No manufacturer name for WMI: {raw}"));
                report.skipped += 1;
                continue;
            }

            let parsed = parse_factory_wmis(raw);
            for error in &parsed.errors {
                report.error(error.to_string());
            }
            if parsed.codes.is_empty() {
                if !raw.is_empty() {
                    report.error(format!("No valid codes generated from: '{raw}'"));
                }
                continue;
            }

            for wmi in &parsed.codes {
                if wmi.chars().count() != 3 || !wmi.is_ascii() {
                    report.error(format!("Invalid WMI code length after generation: '{wmi}'"));
                    continue;
                }

                if let Some(existing) = storage.factory_by_wmi(wmi)? {
                    match (existing.id, merge_manufacturer(&existing.name, manufacturer)) {
                        (Some(id), Some(merged)) => {
                            debug!("Updated {wmi} -> {merged}");
                            storage.rename_factory(id, &merged)?;
                            report.updated += 1;
                        }
                        _ => report.skipped += 1,
                    }
                    continue;
                }

                let factory = locate(storage, wmi, manufacturer)?;
                storage.insert_factory(&factory)?;
                debug!(
                    "Inserted {wmi} -> {manufacturer} ({})",
                    factory.region.as_deref().unwrap_or("country")
                );
                report.inserted += 1;
            }
        }

        Ok(report)
    })
}
