//! Flat geo records projected from decoded database values
//!
//! City and ASN databases store deeply nested maps. The service only needs a
//! handful of fields, so each lookup is projected into a small struct whose
//! fields default to `0`, `0.0` or `""` when the record lacks them.

use crate::data_section::DataValue;
use crate::language::language_for_country;
use serde::Serialize;

/// Projection of a decoded record into a typed struct
pub trait FromRecord: Default {
    /// Extract the fields this type cares about, defaulting absent ones
    fn from_record(value: &DataValue) -> Self;
}

/// Fields taken from a City database record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CityRecord {
    /// `location.longitude`
    pub longitude: f64,
    /// `location.latitude`
    pub latitude: f64,
    /// `country.iso_code`
    pub country_code: String,
    /// `country.names.en`
    pub country: String,
    /// `location.time_zone`
    pub timezone: String,
}

impl FromRecord for CityRecord {
    fn from_record(value: &DataValue) -> Self {
        CityRecord {
            longitude: float_at(value, &["location", "longitude"]),
            latitude: float_at(value, &["location", "latitude"]),
            country_code: string_at(value, &["country", "iso_code"]),
            country: string_at(value, &["country", "names", "en"]),
            timezone: string_at(value, &["location", "time_zone"]),
        }
    }
}

/// Fields taken from an ASN database record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AsnRecord {
    /// `autonomous_system_number`
    pub asn: u64,
    /// `autonomous_system_organization`
    pub organization: String,
}

impl FromRecord for AsnRecord {
    fn from_record(value: &DataValue) -> Self {
        AsnRecord {
            asn: value
                .get("autonomous_system_number")
                .and_then(DataValue::as_u64)
                .unwrap_or(0),
            organization: string_at(value, &["autonomous_system_organization"]),
        }
    }
}

/// The response body of the locate endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoResult {
    /// The address that was looked up, as given
    pub ip: String,
    /// Degrees east, 0.0 when unknown
    pub longitude: f64,
    /// Degrees north, 0.0 when unknown
    pub latitude: f64,
    /// ISO 3166-1 alpha-2 code
    pub country_code: String,
    /// English country name
    pub country: String,
    /// IANA time zone name
    pub timezone: String,
    /// Autonomous system number, 0 when unknown
    pub asn: u64,
    /// Autonomous system organization
    pub organization: String,
    /// Culture tag derived from `country_code`
    pub language: String,
}

impl GeoResult {
    /// Merge a city and an ASN projection for `ip`
    pub fn new(ip: impl Into<String>, city: CityRecord, asn: AsnRecord) -> Self {
        let language = language_for_country(&city.country_code).to_string();
        GeoResult {
            ip: ip.into(),
            longitude: city.longitude,
            latitude: city.latitude,
            country_code: city.country_code,
            country: city.country,
            timezone: city.timezone,
            asn: asn.asn,
            organization: asn.organization,
            language,
        }
    }
}

fn float_at(value: &DataValue, path: &[&str]) -> f64 {
    value
        .get_path(path)
        .and_then(DataValue::as_f64)
        .unwrap_or(0.0)
}

fn string_at(value: &DataValue, path: &[&str]) -> String {
    value
        .get_path(path)
        .and_then(DataValue::as_str)
        .unwrap_or_default()
        .to_string()
}
