//! Country seeding from the mledoze/countries dataset.

use std::fmt;
use std::path::Path;

use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use tracing::{debug, info};

use super::{read_source, StepReport};
use crate::error::Result;
use crate::fetch;
use crate::storage::{Country, Storage};

/// Country names as given by the dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CountryNames {
    /// Everyday name.
    pub common: Option<String>,
    /// Official name.
    pub official: Option<String>,
}

/// International dialing information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Idd {
    /// Dialing prefix root, e.g. `+4`.
    #[serde(default)]
    pub root: Option<String>,
    /// Suffixes completing the root, e.g. `9`.
    #[serde(default)]
    pub suffixes: Vec<String>,
}

/// One entry of `countries.json`. Fields this crate doesn't store are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CountryRecord {
    /// Names.
    pub name: CountryNames,
    /// ISO alpha-2 code.
    pub cca2: Option<String>,
    /// ISO alpha-3 code.
    pub cca3: Option<String>,
    /// ISO numeric code.
    pub ccn3: Option<String>,
    /// Continent-level region (`Americas` is split when stored).
    pub region: Option<String>,
    /// Finer region.
    pub subregion: Option<String>,
    /// The first currency code listed.
    #[serde(rename = "currencies", deserialize_with = "first_key")]
    pub currency: Option<String>,
    /// Dialing information.
    pub idd: Idd,
    /// Top-level domains.
    pub tld: Vec<String>,
    /// Flag emoji.
    pub flag: Option<String>,
}

/// Deserialize a JSON object into its first key, in document order.
fn first_key<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    struct FirstKey;

    impl<'de> Visitor<'de> for FirstKey {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an object or null")
        }

        fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(
            self,
            deserializer: D,
        ) -> std::result::Result<Self::Value, D::Error> {
            deserializer.deserialize_any(self)
        }

        fn visit_map<A: MapAccess<'de>>(
            self,
            mut map: A,
        ) -> std::result::Result<Self::Value, A::Error> {
            let first = map.next_key::<String>()?;
            if first.is_some() {
                map.next_value::<IgnoredAny>()?;
            }
            while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
            Ok(first)
        }
    }

    deserializer.deserialize_option(FirstKey)
}

impl CountryRecord {
    /// Continent the country is stored under.
    ///
    /// `Americas` is split into North and South America by subregion and
    /// `Antarctic` becomes `Antarctica`.
    #[must_use]
    pub fn mapped_region(&self) -> Option<String> {
        let region = self.region.as_deref()?;
        let mapped = match region {
            "Americas" => match self.subregion.as_deref() {
                Some("Northern America" | "North America" | "Central America" | "Caribbean") => {
                    "North America"
                }
                _ => "South America",
            },
            "Antarctic" => "Antarctica",
            other => other,
        };
        Some(mapped.to_string())
    }

    /// Calling code: root plus the first suffix, or the root alone.
    #[must_use]
    pub fn calling_code(&self) -> Option<String> {
        let root = self.idd.root.as_deref().filter(|r| !r.is_empty())?;
        Some(match self.idd.suffixes.first() {
            Some(suffix) => format!("{root}{suffix}"),
            None => root.to_string(),
        })
    }

    /// The country row for this record, or `None` without an alpha-2 code.
    #[must_use]
    pub fn to_country(&self) -> Option<Country> {
        let iso_alpha2 = self.cca2.clone().filter(|c| !c.is_empty())?;
        let common = self.name.common.clone();
        let name = self
            .name
            .official
            .clone()
            .or_else(|| common.clone())
            .unwrap_or_else(|| iso_alpha2.clone());

        Some(Country {
            id: None,
            iso_alpha2,
            iso_alpha3: self.cca3.clone(),
            iso_numeric: self.ccn3.clone(),
            name,
            common_name: common,
            region: self.mapped_region(),
            subregion: self.subregion.clone(),
            currency_code: self.currency.clone(),
            calling_code: self.calling_code(),
            tld: self.tld.first().cloned(),
            flag_emoji: self.flag.clone(),
        })
    }
}

/// Load the country dataset, downloading it first if it is missing and
/// `fetch` is set. Returns the records with the file's BLAKE3 hash.
///
/// # Errors
///
/// Returns an error if the file is missing (and not fetched), the
/// download fails, or the file is not a valid dataset.
pub fn load_countries(
    path: &Path,
    fetch: bool,
    url: &str,
) -> Result<(Vec<CountryRecord>, String)> {
    if path.exists() {
        info!("Countries file already exists: {}", path.display());
    } else if fetch {
        download_countries(url, path)?;
    }
    read_source(path)
}

/// Download the country dataset from `url` into `dest`.
///
/// # Errors
///
/// Returns an error if the request fails or times out, the server
/// answers with an error status, or the file cannot be written.
pub fn download_countries(url: &str, dest: &Path) -> Result<()> {
    fetch::download_to(url, dest)?;
    Ok(())
}

/// Insert every record not already present, then make sure the
/// `Unknown` country exists.
///
/// # Errors
///
/// Returns an error if a database operation fails; the step is rolled
/// back.
pub fn seed_countries(storage: &Storage, records: &[CountryRecord]) -> Result<StepReport> {
    storage.in_transaction(|storage| {
        let mut report = StepReport::new("countries");
        let mut existing = storage.country_iso2_codes()?;
        info!("Processing {} countries", records.len());

        for record in records {
            let Some(country) = record.to_country() else {
                debug!("Skipping country without ISO alpha-2 code");
                report.skipped += 1;
                continue;
            };
            if existing.contains(&country.iso_alpha2) {
                report.skipped += 1;
                continue;
            }

            storage.insert_country(&country)?;
            debug!("Inserted {}", country.display_name());
            existing.insert(country.iso_alpha2);
            report.inserted += 1;
        }

        let (_, created) = storage.ensure_unknown_country()?;
        if created {
            debug!("Inserted Unknown catch-all country");
            report.inserted += 1;
        }

        Ok(report)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn parse(json: &str) -> Vec<CountryRecord> {
        serde_json::from_str(json).unwrap()
    }

    const SAMPLE: &str = r#"[
        {"name": {"common": "Mexico", "official": "United Mexican States"},
         "cca2": "MX", "cca3": "MEX", "ccn3": "484",
         "region": "Americas", "subregion": "North America",
         "currencies": {"MXN": {"name": "Mexican peso", "symbol": "$"}},
         "idd": {"root": "+5", "suffixes": ["2"]},
         "tld": [".mx"], "flag": "🇲🇽", "area": 1964375},
        {"name": {"common": "Brazil"},
         "cca2": "BR", "region": "Americas", "subregion": "South America",
         "currencies": {"BRL": {}, "USD": {}},
         "idd": {"root": "+5"}, "tld": [], "flag": "🇧🇷"},
        {"name": {"common": "Nowhere"}},
        {"name": {"common": "Bouvet Island"}, "cca2": "BV",
         "region": "Antarctic", "currencies": null, "idd": {}}
    ]"#;

    #[test]
    fn test_parse_record_fields() {
        let records = parse(SAMPLE);
        let mexico = records[0].to_country().unwrap();

        assert_eq!(mexico.iso_alpha2, "MX");
        assert_eq!(mexico.name, "United Mexican States");
        assert_eq!(mexico.common_name.as_deref(), Some("Mexico"));
        assert_eq!(mexico.currency_code.as_deref(), Some("MXN"));
        assert_eq!(mexico.calling_code.as_deref(), Some("+52"));
        assert_eq!(mexico.tld.as_deref(), Some(".mx"));
        assert_eq!(mexico.flag_emoji.as_deref(), Some("🇲🇽"));
    }

    #[test]
    fn test_official_name_falls_back_to_common() {
        let brazil = parse(SAMPLE)[1].to_country().unwrap();
        assert_eq!(brazil.name, "Brazil");
        assert_eq!(brazil.tld, None);
        assert_eq!(brazil.calling_code.as_deref(), Some("+5"));
    }

    #[test]
    fn test_first_currency_in_document_order() {
        let brazil = &parse(SAMPLE)[1];
        assert_eq!(brazil.currency.as_deref(), Some("BRL"));
        assert_eq!(parse(SAMPLE)[3].currency, None);
    }

    #[test]
    fn test_region_mapping() {
        let records = parse(SAMPLE);
        assert_eq!(records[0].mapped_region().as_deref(), Some("North America"));
        assert_eq!(records[1].mapped_region().as_deref(), Some("South America"));
        assert_eq!(records[3].mapped_region().as_deref(), Some("Antarctica"));
        assert_eq!(records[2].mapped_region(), None);
    }

    #[test]
    fn test_caribbean_is_north_america() {
        let record = CountryRecord {
            region: Some("Americas".to_string()),
            subregion: Some("Caribbean".to_string()),
            ..CountryRecord::default()
        };
        assert_eq!(record.mapped_region().as_deref(), Some("North America"));
    }

    #[test]
    fn test_record_without_cca2() {
        assert!(parse(SAMPLE)[2].to_country().is_none());
    }

    #[test]
    fn test_seed_countries_counts() {
        let storage = Storage::open_in_memory().unwrap();
        let records = parse(SAMPLE);

        let report = seed_countries(&storage, &records).unwrap();
        // MX, BR, BV and Unknown
        assert_eq!(report.inserted, 4);
        assert_eq!(report.skipped, 1);
        assert!(storage.country_by_iso2("XX").unwrap().is_some());
    }

    #[test]
    fn test_seed_countries_skips_existing() {
        let storage = Storage::open_in_memory().unwrap();
        let records = parse(SAMPLE);

        seed_countries(&storage, &records).unwrap();
        let report = seed_countries(&storage, &records).unwrap();

        assert_eq!(report.inserted, 0);
        assert_eq!(report.skipped, 4);
    }

    #[test]
    fn test_seed_countries_skips_duplicates_in_batch() {
        let storage = Storage::open_in_memory().unwrap();
        let mut records = parse(SAMPLE);
        records.push(records[0].clone());

        let report = seed_countries(&storage, &records).unwrap();
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn test_load_countries_missing_without_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("countries.json");

        let err = load_countries(&path, false, "https://example.invalid/c.json").unwrap_err();
        assert!(matches!(err, Error::SourceMissing { .. }));
    }

    #[test]
    fn test_load_countries_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("countries.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let (records, hash) =
            load_countries(&path, true, "https://example.invalid/c.json").unwrap();
        assert_eq!(records.len(), 4);
        assert!(!hash.is_empty());
    }
}
