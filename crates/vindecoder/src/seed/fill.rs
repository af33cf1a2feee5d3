//! Assignment of unclaimed region codes to the `Unknown` country.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::StepReport;
use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::wmi::{all_region_codes, UNKNOWN_COUNTRY_ISO};

/// Assign every two-character code that has no region yet to `Unknown`.
///
/// Afterwards every code in the VIN alphabet squared is assigned.
///
/// # Errors
///
/// Returns [`Error::SeedPrerequisite`] if the `Unknown` country has not
/// been seeded, or an error if a database operation fails.
pub fn fill_missing_regions(storage: &Storage) -> Result<StepReport> {
    let unknown = storage
        .country_by_iso2(UNKNOWN_COUNTRY_ISO)?
        .and_then(|c| c.id)
        .ok_or_else(|| {
            Error::seed_prerequisite(
                "fill_missing",
                format!("Unknown country ({UNKNOWN_COUNTRY_ISO}) not found; seed countries first"),
            )
        })?;

    storage.in_transaction(|storage| {
        let mut report = StepReport::new("fill_missing");
        let existing = storage.region_codes()?;

        let mut missing: BTreeMap<char, Vec<String>> = BTreeMap::new();
        for code in all_region_codes() {
            if !existing.contains(&code) {
                let first = code.chars().next().unwrap_or_default();
                missing.entry(first).or_default().push(code);
            }
        }

        if missing.is_empty() {
            info!("No missing region codes");
            return Ok(report);
        }

        for (first, codes) in &missing {
            debug!("Filling range {first}: {} codes", codes.len());
            for code in codes {
                if storage.insert_region_code(code, unknown)? {
                    report.inserted += 1;
                }
            }
        }

        info!("Assigned {} region codes to Unknown", report.inserted);
        Ok(report)
    })
}
