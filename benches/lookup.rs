use criterion::{black_box, criterion_group, Criterion};
use geoip_proxy::database::record::{Location, Names, Subdivision};
use geoip_proxy::database::{AsnRecord, CityRecord, CountryRecord, Databases, InMemoryDatabase};
use geoip_proxy::lookup::lookup;
use std::net::{IpAddr, Ipv4Addr};

criterion_group!(benches_lookup, bench_lookup);

fn ips() -> Vec<IpAddr> {
    [
        [127, 0, 0, 1],
        [80, 94, 184, 70],
        [93, 180, 26, 112],
        [128, 174, 199, 60],
    ]
    .into_iter()
    .map(|octets| IpAddr::V4(Ipv4Addr::from(octets)))
    .collect()
}

fn databases() -> Databases {
    let city = CityRecord {
        location: Some(Location {
            latitude: Some(40.1),
            longitude: Some(-88.2),
            time_zone: Some("America/Chicago".to_owned()),
            accuracy_radius: Some(20),
        }),
        subdivisions: vec![Subdivision {
            iso_code: Some("IL".to_owned()),
            names: Names {
                en: Some("Illinois".to_owned()),
            },
        }],
        ..Default::default()
    };
    let asn = AsnRecord {
        autonomous_system_number: Some(38),
        autonomous_system_organization: Some("UIUC".to_owned()),
    };

    let databases = Databases::new();
    databases.set_city(Box::new(
        ips()
            .into_iter()
            .map(|ip| (ip, city.clone()))
            .collect::<InMemoryDatabase<_>>(),
    ));
    databases.set_country(Box::new(InMemoryDatabase::<CountryRecord>::new()));
    databases.set_asn(Box::new(
        ips()
            .into_iter()
            .map(|ip| (ip, asn.clone()))
            .collect::<InMemoryDatabase<_>>(),
    ));
    databases
}

pub fn bench_lookup(c: &mut Criterion) {
    let databases = databases();
    let queries: Vec<String> = ips().iter().map(IpAddr::to_string).collect();

    c.bench_function("lookup found", |b| {
        b.iter(|| {
            for ip in &queries {
                let _ = lookup(black_box(ip), &databases);
            }
        })
    });

    c.bench_function("lookup not found", |b| {
        b.iter(|| lookup(black_box("203.0.113.7"), &databases))
    });
}
