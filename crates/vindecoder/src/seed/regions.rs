//! WMI region code seeding.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::StepReport;
use crate::error::Result;
use crate::storage::{Country, Storage};
use crate::wmi::{expand_region_range, is_known_region, location_name_candidates};

/// One entry of `wmi_region_codes.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionEntry {
    /// Range notation, e.g. `AA-AH` or `J`.
    pub range: String,
    /// Country or continent the range is assigned to.
    pub country: String,
}

fn resolve_location(storage: &Storage, name: &str) -> Result<Option<Country>> {
    for candidate in location_name_candidates(name) {
        if let Some(country) = storage.find_or_create_region(&candidate)? {
            return Ok(Some(country));
        }
    }
    Ok(None)
}

/// Assign the region codes of every entry to its country or continent.
///
/// Codes that are already assigned keep their first assignment.
///
/// # Errors
///
/// Returns an error if a database operation fails; the step is rolled
/// back.
pub fn seed_regions(storage: &Storage, entries: &[RegionEntry]) -> Result<StepReport> {
    storage.in_transaction(|storage| {
        let mut report = StepReport::new("regions");

        for entry in entries {
            let Some(location) = resolve_location(storage, &entry.country)? else {
                report.error(format!(
                    "Country not found and not a known region: {} (range: {})",
                    entry.country, entry.range
                ));
                continue;
            };
            let Some(location_id) = location.id else {
                continue;
            };

            let codes = expand_region_range(&entry.range);
            if codes.is_empty() {
                report.error(format!("No codes generated for range: {}", entry.range));
                continue;
            }

            let kind = if is_known_region(location.display_name()) {
                "region"
            } else {
                "country"
            };
            debug!(
                "{kind} {}: {} ({} codes)",
                location.display_name(),
                entry.range,
                codes.len()
            );

            for code in codes {
                if storage.insert_region_code(&code, location_id)? {
                    report.inserted += 1;
                } else {
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    })
}
