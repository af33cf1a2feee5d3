//! World Manufacturer Identifier rules.
//!
//! The data sources describe WMI assignments as ranges (`AA-AH`,
//! `JHF-JHG, JHZ`) over the VIN alphabet and name countries loosely.
//! This module expands those ranges into individual codes and maps
//! location names onto the names used in the country table.

mod names;
mod range;

pub use names::{
    is_known_region, location_name_candidates, region_iso_codes, KNOWN_REGIONS,
    UNKNOWN_COUNTRY_ISO,
};
pub use range::{
    all_region_codes, expand_factory_range, expand_region_range, parse_factory_wmis,
    ParsedWmis, RangeError,
};
