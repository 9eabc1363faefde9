use crate::database::{Database, DatabaseError};

use std::collections::HashMap;
use std::net::IpAddr;

/// Exact-address database kept in a [HashMap], useful when no `.mmdb` file is at hand
#[derive(Debug, Clone)]
pub struct InMemoryDatabase<R> {
    records: HashMap<IpAddr, R>,
}

impl<R> InMemoryDatabase<R> {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    pub fn insert(&mut self, address: IpAddr, record: R) -> Option<R> {
        self.records.insert(address, record)
    }
}

impl<R> Default for InMemoryDatabase<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> FromIterator<(IpAddr, R)> for InMemoryDatabase<R> {
    fn from_iter<I: IntoIterator<Item = (IpAddr, R)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<R> Database<R> for InMemoryDatabase<R>
where
    R: Clone + Send + Sync,
{
    fn get(&self, ip: &str) -> Result<Option<R>, DatabaseError> {
        let address: IpAddr = ip
            .parse()
            .map_err(|_| DatabaseError::InvalidFormat(ip.to_owned()))?;
        Ok(self.records.get(&address).cloned())
    }
}
