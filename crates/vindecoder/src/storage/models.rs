//! Row types stored in the database.

use serde::Serialize;

use crate::wmi::{region_iso_codes, UNKNOWN_COUNTRY_ISO};

/// A country, or a continental region standing in for one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Country {
    /// Row id (assigned by the storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// ISO 3166-1 alpha-2 code, or a `0`-prefixed placeholder for regions.
    pub iso_alpha2: String,
    /// ISO 3166-1 alpha-3 code.
    pub iso_alpha3: Option<String>,
    /// ISO 3166-1 numeric code.
    pub iso_numeric: Option<String>,
    /// Official name.
    pub name: String,
    /// Everyday name; what WMI sources refer to.
    pub common_name: Option<String>,
    /// Continent-level region.
    pub region: Option<String>,
    /// Finer region, as given by the dataset.
    pub subregion: Option<String>,
    /// First listed currency code.
    pub currency_code: Option<String>,
    /// International calling code.
    pub calling_code: Option<String>,
    /// First listed top-level domain.
    pub tld: Option<String>,
    /// Flag emoji.
    pub flag_emoji: Option<String>,
}

impl Country {
    /// The catch-all country for unassigned WMI codes.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            iso_alpha2: UNKNOWN_COUNTRY_ISO.to_string(),
            iso_alpha3: Some("XXX".to_string()),
            iso_numeric: Some("999".to_string()),
            name: "Unknown".to_string(),
            common_name: Some("Unknown".to_string()),
            region: Some("Unknown".to_string()),
            subregion: Some("Unknown".to_string()),
            flag_emoji: Some("🏳".to_string()),
            ..Self::default()
        }
    }

    /// A continental region entry, or `None` if `name` is not a known region.
    #[must_use]
    pub fn continental(name: &str) -> Option<Self> {
        let (iso_alpha2, iso_alpha3) = region_iso_codes(name)?;
        Some(Self {
            iso_alpha2: iso_alpha2.to_string(),
            iso_alpha3: Some(iso_alpha3.to_string()),
            iso_numeric: Some("000".to_string()),
            name: name.to_string(),
            common_name: Some(name.to_string()),
            region: Some(name.to_string()),
            subregion: Some(name.to_string()),
            flag_emoji: Some("🌐".to_string()),
            ..Self::default()
        })
    }

    /// Common name, falling back to the official name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.common_name.as_deref().unwrap_or(&self.name)
    }
}

/// Assignment of a two-character region code to a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WmiRegion {
    /// Row id.
    pub id: i64,
    /// The first two VIN characters.
    pub code: String,
    /// Country (or continental region) the code belongs to.
    pub country_id: i64,
}

/// A manufacturer assigned to a three-character WMI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WmiFactory {
    /// Row id (assigned by the storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// The first three VIN characters.
    pub wmi: String,
    /// Manufacturer name; merged names are joined with ` & `.
    pub name: String,
    /// Country of the factory, when the region code names a country.
    pub country_id: Option<i64>,
    /// Continental region, when the region code names no single country.
    pub region: Option<String>,
}

/// One factory with its logos, as listed by the logo overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryLogoSummary {
    /// Factory row id.
    pub id: i64,
    /// The factory's WMI.
    pub wmi: String,
    /// Manufacturer name.
    pub manufacturer: String,
    /// Country common name, else the factory region, else `Unknown`.
    pub country: String,
    /// Whether any logo is linked.
    pub has_logos: bool,
    /// Number of linked logos.
    pub logo_count: usize,
    /// Linked logo file names.
    pub logos: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_country() {
        let c = Country::unknown();
        assert_eq!(c.iso_alpha2, "XX");
        assert_eq!(c.display_name(), "Unknown");
        assert!(c.id.is_none());
    }

    #[test]
    fn test_continental() {
        let europe = Country::continental("Europe").unwrap();
        assert_eq!(europe.iso_alpha2, "0E");
        assert_eq!(europe.iso_alpha3.as_deref(), Some("0EU"));
        assert_eq!(europe.region.as_deref(), Some("Europe"));
        assert_eq!(europe.flag_emoji.as_deref(), Some("🌐"));
        assert!(Country::continental("Germany").is_none());
    }

    #[test]
    fn test_display_name_fallback() {
        let c = Country {
            name: "Federal Republic of Germany".to_string(),
            ..Country::default()
        };
        assert_eq!(c.display_name(), "Federal Republic of Germany");
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = FactoryLogoSummary {
            id: 1,
            wmi: "1FA".to_string(),
            manufacturer: "Ford".to_string(),
            country: "United States".to_string(),
            has_logos: true,
            logo_count: 1,
            logos: vec!["ford.png".to_string()],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["hasLogos"], true);
        assert_eq!(json["logoCount"], 1);
    }
}
