pub use error::DatabaseError;
pub use max_mind_db::MaxMindDb;
pub use memory::InMemoryDatabase;
pub use record::{AsnRecord, CityRecord, CountryRecord};

mod error;
pub mod max_mind_db;
mod memory;
pub mod record;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum DatabaseKind {
    City,
    Country,
    Asn,
}

impl DatabaseKind {
    /// Load order used at startup
    pub const ALL: [DatabaseKind; 3] = [Self::City, Self::Country, Self::Asn];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::City => "GeoLite2-City.mmdb",
            Self::Country => "GeoLite2-Country.mmdb",
            Self::Asn => "GeoLite2-ASN.mmdb",
        }
    }

    pub fn path_in<P: AsRef<Path>>(self, dir: P) -> PathBuf {
        dir.as_ref().join(self.file_name())
    }
}

impl From<DatabaseKind> for &'static str {
    fn from(kind: DatabaseKind) -> Self {
        match kind {
            DatabaseKind::City => "GeoLite2-City",
            DatabaseKind::Country => "GeoLite2-Country",
            DatabaseKind::Asn => "GeoLite2-ASN",
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str((*self).into())
    }
}

/// A read-only IP database yielding records of type `R`.
///
/// `Ok(None)` means the address is well-formed but not covered by the database,
/// a malformed address is reported as [DatabaseError::InvalidFormat].
pub trait Database<R>: Send + Sync {
    fn get(&self, ip: &str) -> Result<Option<R>, DatabaseError>;
}

pub type Handle<R> = Box<dyn Database<R>>;

/// The three database handles shared by all requests.
///
/// Every slot is written at most once, by the loader, and is read-only afterwards.
#[derive(Default)]
pub struct Databases {
    city: OnceLock<Handle<CityRecord>>,
    country: OnceLock<Handle<CountryRecord>>,
    asn: OnceLock<Handle<AsnRecord>>,
}

impl Databases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the slot was already occupied, the handle is dropped then
    pub fn set_city(&self, handle: Handle<CityRecord>) -> bool {
        self.city.set(handle).is_ok()
    }

    pub fn set_country(&self, handle: Handle<CountryRecord>) -> bool {
        self.country.set(handle).is_ok()
    }

    pub fn set_asn(&self, handle: Handle<AsnRecord>) -> bool {
        self.asn.set(handle).is_ok()
    }

    pub fn city(&self) -> Option<&dyn Database<CityRecord>> {
        self.city.get().map(|handle| &**handle)
    }

    pub fn country(&self) -> Option<&dyn Database<CountryRecord>> {
        self.country.get().map(|handle| &**handle)
    }

    pub fn asn(&self) -> Option<&dyn Database<AsnRecord>> {
        self.asn.get().map(|handle| &**handle)
    }

    pub fn is_loaded(&self) -> bool {
        self.city.get().is_some() && self.country.get().is_some() && self.asn.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_paths() {
        let paths: Vec<_> = DatabaseKind::ALL
            .into_iter()
            .map(|kind| kind.path_in("/var/lib/geoip"))
            .collect();
        assert_eq!(
            paths,
            [
                PathBuf::from("/var/lib/geoip/GeoLite2-City.mmdb"),
                PathBuf::from("/var/lib/geoip/GeoLite2-Country.mmdb"),
                PathBuf::from("/var/lib/geoip/GeoLite2-ASN.mmdb"),
            ]
        );
    }

    #[test]
    fn slots_are_write_once() {
        let databases = Databases::new();
        assert!(!databases.is_loaded());

        assert!(databases.set_city(Box::new(InMemoryDatabase::<CityRecord>::new())));
        assert!(!databases.set_city(Box::new(InMemoryDatabase::<CityRecord>::new())));
        assert!(databases.set_country(Box::new(InMemoryDatabase::<CountryRecord>::new())));
        assert!(!databases.is_loaded());

        assert!(databases.set_asn(Box::new(InMemoryDatabase::<AsnRecord>::new())));
        assert!(databases.is_loaded());
    }
}
