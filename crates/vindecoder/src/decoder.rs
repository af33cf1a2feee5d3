//! VIN decoding against the WMI database.

use chrono::Datelike;
use rand::Rng;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::Result;
use crate::storage::{Country, Storage};
use crate::vin::{self, resolve_model_year, Vin};

/// Placeholder for any location that could not be resolved.
const UNKNOWN: &str = "Unknown";

/// Flag shown for unresolved locations.
const UNKNOWN_FLAG: &str = "🏳";

/// Flag shown for factories assigned to a continent rather than a country.
const FACTORY_FLAG: &str = "🏭";

/// Everything known about a VIN.
///
/// Serializes to the JSON document returned by the decode API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedVin {
    /// The normalized VIN.
    pub vin: String,
    /// World Manufacturer Identifier (positions 1-3).
    pub wmi: String,
    /// Vehicle Descriptor Section (positions 4-9).
    pub vds: String,
    /// Vehicle Identifier Section (positions 10-17).
    pub vis: String,
    /// Check digit as found (position 9).
    pub check_digit: char,
    /// Whether the check digit matches the computed one.
    pub check_digit_valid: bool,
    /// Model year code (position 10).
    pub model_year_char: char,
    /// Plant code (position 11).
    pub plant_code: char,
    /// Serial number (positions 12-17).
    pub serial_number: String,
    /// Continent of the region code's country.
    pub region: String,
    /// Country the region code (positions 1-2) is assigned to.
    pub region_country: String,
    /// Flag of `region_country`.
    pub region_flag: String,
    /// Country of the factory, else the region country.
    pub country: String,
    /// Flag of `country`.
    pub country_flag: String,
    /// Continent of `country`.
    pub country_region: String,
    /// Manufacturer name.
    pub manufacturer: String,
    /// Logo files of the manufacturer.
    pub manufacturer_logos: Vec<String>,
    /// Country (or continent) of the factory.
    pub factory_country: String,
    /// Flag of the factory's country.
    pub factory_flag: String,
    /// Continent of the factory.
    pub factory_region: String,
    /// Resolved model year.
    #[serde(serialize_with = "year_or_unknown")]
    pub model_year: Option<i32>,
}

fn year_or_unknown<S: Serializer>(
    year: &Option<i32>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match year {
        Some(year) => serializer.serialize_i32(*year),
        None => serializer.serialize_str(UNKNOWN),
    }
}

/// Name, flag and continent of a location.
struct Place {
    name: String,
    flag: String,
    region: String,
}

impl Place {
    fn unknown() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            flag: UNKNOWN_FLAG.to_string(),
            region: UNKNOWN.to_string(),
        }
    }

    fn of(country: &Country) -> Self {
        Self {
            name: country.display_name().to_string(),
            flag: country
                .flag_emoji
                .clone()
                .unwrap_or_else(|| UNKNOWN_FLAG.to_string()),
            region: country.region.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

/// Decodes VINs using a [`Storage`].
#[derive(Debug)]
pub struct Decoder<'a> {
    storage: &'a Storage,
    current_year: i32,
}

impl<'a> Decoder<'a> {
    /// Create a decoder that resolves model years against today's date.
    #[must_use]
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            current_year: chrono::Local::now().year(),
        }
    }

    /// Resolve model years as if it were `year`.
    #[must_use]
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// Validate and decode a VIN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVin`](crate::Error::InvalidVin) if the VIN
    /// fails validation, or a database error.
    pub fn decode(&self, input: &str) -> Result<DecodedVin> {
        let vin = Vin::validate_for_decode(input)?;
        self.decode_vin(&vin)
    }

    /// Decode an already validated VIN.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub fn decode_vin(&self, vin: &Vin) -> Result<DecodedVin> {
        let region = self
            .storage
            .region_country(vin.region_code())?
            .map_or_else(Place::unknown, |c| Place::of(&c));

        let factory = self.storage.factory_by_wmi(vin.wmi())?;
        let factory_country = match factory.as_ref().and_then(|f| f.country_id) {
            Some(id) => self.storage.country(id)?,
            None => None,
        };

        let country = match &factory_country {
            Some(c) => Place::of(c),
            None => Place {
                name: region.name.clone(),
                flag: region.flag.clone(),
                region: region.region.clone(),
            },
        };

        let (manufacturer, logos, factory_place) = match &factory {
            Some(f) => {
                let logos = match f.id {
                    Some(id) => self.storage.logos_for_factory(id)?,
                    None => Vec::new(),
                };
                let place = match &factory_country {
                    Some(c) => Place::of(c),
                    None => Place {
                        name: f.region.clone().unwrap_or_else(|| UNKNOWN.to_string()),
                        flag: FACTORY_FLAG.to_string(),
                        region: f
                            .region
                            .clone()
                            .unwrap_or_else(|| "Unknown Factory Region".to_string()),
                    },
                };
                (f.name.clone(), logos, place)
            }
            None => (
                "Unknown Manufacturer".to_string(),
                Vec::new(),
                Place::unknown(),
            ),
        };

        debug!(vin = %vin, manufacturer = %manufacturer, "Decoded VIN");

        Ok(DecodedVin {
            vin: vin.to_string(),
            wmi: vin.wmi().to_string(),
            vds: vin.vds().to_string(),
            vis: vin.vis().to_string(),
            check_digit: vin.check_digit(),
            check_digit_valid: vin.check_digit_valid(),
            model_year_char: vin.model_year_char(),
            plant_code: vin.plant_code(),
            serial_number: vin.serial_number().to_string(),
            region: region.region,
            region_country: region.name,
            region_flag: region.flag,
            country: country.name,
            country_flag: country.flag,
            country_region: country.region,
            manufacturer,
            manufacturer_logos: logos,
            factory_country: factory_place.name,
            factory_flag: factory_place.flag,
            factory_region: factory_place.region,
            model_year: resolve_model_year(vin.model_year_char(), self.current_year),
        })
    }

    /// Generate a random valid VIN for a random known factory and decode it.
    ///
    /// With no factories in the database the WMI is random.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<DecodedVin> {
        let count = self.storage.factory_count()?;
        let wmi = if count > 0 {
            self.storage.factory_wmi_at(rng.random_range(0..count))?
        } else {
            None
        };
        let vin = vin::generate(rng, wmi.as_deref(), self.current_year);
        self.decode_vin(&vin)
    }
}
