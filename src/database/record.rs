//! Subsets of the GeoLite2 City, Country and ASN record layouts.
//!
//! Only the fields served by the API are declared, everything else in a record is skipped
//! during deserialization. All fields are optional because GeoLite2 omits them freely.

use serde::Deserialize;

/// Localized names, only English is used
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Names {
    pub en: Option<String>,
}

impl Names {
    pub fn english(&self) -> &str {
        self.en.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Continent {
    pub code: Option<String>,
    #[serde(default)]
    pub names: Names,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Country {
    pub iso_code: Option<String>,
    #[serde(default)]
    pub names: Names,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CountryRecord {
    pub continent: Option<Continent>,
    pub country: Option<Country>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct City {
    #[serde(default)]
    pub names: Names,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Postal {
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Location {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub time_zone: Option<String>,
    pub accuracy_radius: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Subdivision {
    pub iso_code: Option<String>,
    #[serde(default)]
    pub names: Names,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CityRecord {
    pub city: Option<City>,
    pub postal: Option<Postal>,
    pub location: Option<Location>,
    #[serde(default)]
    pub subdivisions: Vec<Subdivision>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AsnRecord {
    pub autonomous_system_number: Option<u32>,
    pub autonomous_system_organization: Option<String>,
}
