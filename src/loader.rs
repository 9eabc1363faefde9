use crate::database::{
    AsnRecord, CityRecord, CountryRecord, Database, DatabaseKind, Databases, MaxMindDb,
};

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Opens `path` with `open`, retrying forever with `interval` pauses.
///
/// Failures are only logged, so this returns once the file eventually opens.
pub fn load<T, E, F>(path: &Path, interval: Duration, mut open: F) -> T
where
    E: Display,
    F: FnMut(&Path) -> Result<T, E>,
{
    let mut attempt: u64 = 1;
    loop {
        match open(path) {
            Ok(value) => return value,
            Err(error) => {
                log::warn!(
                    r#"Failed to load "{}" (attempt {attempt}), retrying in {interval:?}: {error}"#,
                    path.display(),
                );
            }
        }
        attempt += 1;
        std::thread::sleep(interval);
    }
}

/// Loads the city, country and ASN databases from `dir`, in this order, installing every
/// handle as soon as it is open. Blocks until all three are in place.
pub fn load_all(dir: &Path, interval: Duration, databases: &Databases) {
    load_all_with(dir, interval, databases, |path| MaxMindDb::open(path))
}

/// [load_all] with a custom opener, one call per attempt on each database file
pub fn load_all_with<D, E, F>(dir: &Path, interval: Duration, databases: &Databases, mut open: F)
where
    D: Database<CityRecord> + Database<CountryRecord> + Database<AsnRecord> + 'static,
    E: Display,
    F: FnMut(&Path) -> Result<D, E>,
{
    for kind in DatabaseKind::ALL {
        let database = load(&kind.path_in(dir), interval, &mut open);
        log::info!("{kind} database loaded successfully");
        let installed = match kind {
            DatabaseKind::City => databases.set_city(Box::new(database)),
            DatabaseKind::Country => databases.set_country(Box::new(database)),
            DatabaseKind::Asn => databases.set_asn(Box::new(database)),
        };
        if !installed {
            log::warn!("{kind} database was already loaded, keeping the previous one");
        }
    }
    if databases.is_loaded() {
        log::info!("All GeoIP databases are loaded");
    }
}

/// Runs [load_all] on a dedicated thread.
///
/// The thread is not owned by any async runtime, so shutting the runtime down never waits for
/// databases that fail to load.
pub fn spawn_loader(
    dir: PathBuf,
    interval: Duration,
    databases: Arc<Databases>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("database-loader".to_owned())
        .spawn(move || load_all(&dir, interval, &databases))
}
