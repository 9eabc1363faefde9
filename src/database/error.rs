use maxminddb::MaxMindDBError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error(r#""{0}" does not appear to be an IPv4 or IPv6 address"#)]
    InvalidFormat(String),
    #[error(transparent)]
    MaxMindDBError(#[from] MaxMindDBError),
}
