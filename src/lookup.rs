use crate::database::{
    AsnRecord, CityRecord, CountryRecord, Database, DatabaseError, DatabaseKind, Databases,
};

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    #[error("GeoIP databases not fully loaded")]
    DatabasesNotLoaded,
    #[error("Invalid IP address format")]
    InvalidFormat,
    #[error("IP not found")]
    NotFound,
    #[error("Error looking up IP")]
    InternalError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
}

/// Canonical geolocation record merged from the city, country and ASN databases
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub query: String,
    pub status: Status,
    pub continent: String,
    pub continent_code: String,
    pub country: String,
    pub country_code: String,
    pub region: String,
    pub region_name: String,
    pub city: String,
    pub district: String,
    pub zip: String,
    pub lat: f64,
    pub lon: f64,
    pub timezone: String,
    /// Accuracy radius of the coordinates in kilometres. Not a UTC offset, the name is kept
    /// for compatibility with existing clients.
    pub offset: u16,
    pub currency: String,
    pub isp: String,
    pub org: String,
    #[serde(rename = "as")]
    pub as_: String,
    pub asname: String,
}

#[derive(Debug, Default, PartialEq)]
struct CountryFields {
    continent: String,
    continent_code: String,
    country: String,
    country_code: String,
    currency: String,
}

impl From<&CountryRecord> for CountryFields {
    fn from(record: &CountryRecord) -> Self {
        let mut fields = Self::default();
        if let Some(continent) = &record.continent {
            fields.continent = continent.names.english().to_owned();
            fields.continent_code = continent.code.clone().unwrap_or_default();
        }
        if let Some(country) = &record.country {
            fields.country = country.names.english().to_owned();
            fields.country_code = country.iso_code.clone().unwrap_or_default();
            fields.currency = country.currency.clone().unwrap_or_default();
        }
        fields
    }
}

#[derive(Debug, Default, PartialEq)]
struct CityFields {
    region: String,
    region_name: String,
    city: String,
    district: String,
    zip: String,
    lat: f64,
    lon: f64,
    timezone: String,
    offset: u16,
}

impl From<&CityRecord> for CityFields {
    fn from(record: &CityRecord) -> Self {
        let mut fields = Self::default();
        let mut subdivisions = record.subdivisions.iter();
        if let Some(region) = subdivisions.next() {
            fields.region = region.iso_code.clone().unwrap_or_default();
            fields.region_name = region.names.english().to_owned();
        }
        if let Some(district) = subdivisions.next() {
            fields.district = district.names.english().to_owned();
        }
        if let Some(city) = &record.city {
            fields.city = city.names.english().to_owned();
        }
        if let Some(postal) = &record.postal {
            fields.zip = postal.code.clone().unwrap_or_default();
        }
        if let Some(location) = &record.location {
            fields.lat = location.latitude.unwrap_or_default();
            fields.lon = location.longitude.unwrap_or_default();
            fields.timezone = location.time_zone.clone().unwrap_or_default();
            fields.offset = location.accuracy_radius.unwrap_or_default();
        }
        fields
    }
}

#[derive(Debug, Default, PartialEq)]
struct AsnFields {
    organization: String,
    as_: String,
}

impl From<&AsnRecord> for AsnFields {
    fn from(record: &AsnRecord) -> Self {
        let organization = record
            .autonomous_system_organization
            .clone()
            .unwrap_or_default();
        let as_ = match record.autonomous_system_number {
            Some(number) => format!("AS{number} {organization}"),
            None => String::new(),
        };
        Self { organization, as_ }
    }
}

impl GeoLocation {
    /// Merges raw sub-records. The sources are field-disjoint, a missing sub-record only
    /// leaves its own fields at their defaults.
    pub fn merge(
        query: &str,
        city: Option<&CityRecord>,
        country: Option<&CountryRecord>,
        asn: Option<&AsnRecord>,
    ) -> Self {
        let CountryFields {
            continent,
            continent_code,
            country,
            country_code,
            currency,
        } = country.map(CountryFields::from).unwrap_or_default();
        let CityFields {
            region,
            region_name,
            city,
            district,
            zip,
            lat,
            lon,
            timezone,
            offset,
        } = city.map(CityFields::from).unwrap_or_default();
        let AsnFields { organization, as_ } = asn.map(AsnFields::from).unwrap_or_default();

        Self {
            query: query.to_owned(),
            status: Status::Success,
            continent,
            continent_code,
            country,
            country_code,
            region,
            region_name,
            city,
            district,
            zip,
            lat,
            lon,
            timezone,
            offset,
            currency,
            isp: organization.clone(),
            org: organization.clone(),
            as_,
            asname: organization,
        }
    }
}

fn query<R>(
    database: &dyn Database<R>,
    kind: DatabaseKind,
    ip: &str,
) -> Result<Option<R>, LookupError> {
    database.get(ip).map_err(|error| match error {
        DatabaseError::InvalidFormat(_) => LookupError::InvalidFormat,
        error => {
            log::error!("{kind} lookup of {ip:?} failed: {error}");
            LookupError::InternalError
        }
    })
}

/// Looks `ip` up in all three databases and merges the results.
///
/// Nothing is queried unless all three databases are loaded.
pub fn lookup(ip: &str, databases: &Databases) -> Result<GeoLocation, LookupError> {
    let (Some(city_db), Some(country_db), Some(asn_db)) =
        (databases.city(), databases.country(), databases.asn())
    else {
        return Err(LookupError::DatabasesNotLoaded);
    };

    let city = query(city_db, DatabaseKind::City, ip)?;
    let country = query(country_db, DatabaseKind::Country, ip)?;
    let asn = query(asn_db, DatabaseKind::Asn, ip)?;

    if city.is_none() && country.is_none() && asn.is_none() {
        return Err(LookupError::NotFound);
    }

    Ok(GeoLocation::merge(
        ip,
        city.as_ref(),
        country.as_ref(),
        asn.as_ref(),
    ))
}
