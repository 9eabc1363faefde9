use crate::database::{Database, DatabaseError};

use maxminddb::MaxMindDBError;
use serde::de::DeserializeOwned;
use std::net::IpAddr;
use std::path::Path;

/// GeoLite2 database file read fully into memory
pub struct MaxMindDb {
    maxminddb_reader: maxminddb::Reader<Vec<u8>>,
}

impl MaxMindDb {
    pub fn open<P: AsRef<Path>>(filepath: P) -> Result<Self, DatabaseError> {
        Ok(Self {
            maxminddb_reader: maxminddb::Reader::open_readfile(filepath)?,
        })
    }

    pub fn database_type(&self) -> &str {
        &self.maxminddb_reader.metadata.database_type
    }
}

impl<R> Database<R> for MaxMindDb
where
    R: DeserializeOwned,
{
    fn get(&self, ip: &str) -> Result<Option<R>, DatabaseError> {
        let address: IpAddr = ip
            .parse()
            .map_err(|_| DatabaseError::InvalidFormat(ip.to_owned()))?;
        match self.maxminddb_reader.lookup(address) {
            Ok(record) => Ok(Some(record)),
            Err(MaxMindDBError::AddressNotFoundError(_)) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}
