use hyper::HeaderMap;
use std::net::IpAddr;

/// Address taken from the first of `header_names` present in `headers`.
///
/// With `recursive` the left-most entry of a comma-separated list is taken, i.e. the original
/// client, otherwise the right-most one appended by the nearest proxy.
fn forwarded_ip(headers: &HeaderMap, header_names: &[String], recursive: bool) -> Option<IpAddr> {
    header_names
        .iter()
        .filter_map(|name| {
            let values = headers.get_all(name.as_str());
            let mut it_values = values.iter();
            if recursive {
                it_values.next()
            } else {
                it_values.next_back()
            }
        })
        .next()
        .and_then(|value| {
            let value = value.to_str().ok()?;
            let mut split = value.split(',');
            if recursive {
                split.next()
            } else {
                split.next_back()
            }
        })
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// Caller address as reported by `GET /`, IPv4-mapped IPv6 addresses are shown as IPv4
pub fn observed_ip(
    headers: &HeaderMap,
    header_names: &[String],
    recursive: bool,
    socket_ip: Option<IpAddr>,
) -> Option<IpAddr> {
    forwarded_ip(headers, header_names, recursive)
        .or(socket_ip)
        .map(|ip| ip.to_canonical())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    const FORWARDED_FOR: &str = "X-FORWARDED-FOR";

    fn headers(pairs: &[(&'static str, String)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(*name, value.parse().unwrap());
        }
        headers
    }

    #[test]
    fn socket_ip_without_headers() {
        let socket_ip = IpAddr::V4(Ipv4Addr::new(128, 174, 199, 60));
        for recursive in [false, true] {
            let actual = observed_ip(
                &HeaderMap::new(),
                &[FORWARDED_FOR.to_owned()],
                recursive,
                Some(socket_ip),
            );
            assert_eq!(actual, Some(socket_ip));
        }
    }

    #[test]
    fn nothing_observed() {
        assert_eq!(observed_ip(&HeaderMap::new(), &[], true, None), None);
    }

    #[test]
    fn ipv4_mapped_socket_ip() {
        let mapped = IpAddr::V6(Ipv4Addr::new(80, 94, 184, 70).to_ipv6_mapped());
        let actual = observed_ip(&HeaderMap::new(), &[], true, Some(mapped));
        assert_eq!(actual, Some(IpAddr::V4(Ipv4Addr::new(80, 94, 184, 70))));

        let v6 = IpAddr::V6(Ipv6Addr::LOCALHOST);
        assert_eq!(observed_ip(&HeaderMap::new(), &[], true, Some(v6)), Some(v6));
    }

    #[test]
    fn headers_ignored_unless_configured() {
        let socket_ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let request_headers = headers(&[(FORWARDED_FOR, "128.174.199.60".to_owned())]);
        let actual = observed_ip(&request_headers, &[], true, Some(socket_ip));
        assert_eq!(actual, Some(socket_ip));
    }

    #[test]
    fn proxy_chain() {
        let ip_client = IpAddr::V4(Ipv4Addr::new(128, 174, 199, 60));
        let ip_proxy1 = IpAddr::V4(Ipv4Addr::new(80, 94, 184, 70));
        let ip_proxy2 = IpAddr::V4(Ipv4Addr::new(52, 0, 14, 116));
        let request_headers = headers(&[(
            FORWARDED_FOR,
            format!("{ip_client}, {ip_proxy1}, {ip_proxy2}"),
        )]);

        for (ip_expected, recursive) in [(ip_proxy2, false), (ip_client, true)] {
            let actual = observed_ip(
                &request_headers,
                &[FORWARDED_FOR.to_owned()],
                recursive,
                Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            );
            assert_eq!(actual, Some(ip_expected));
        }
    }

    #[test]
    fn first_configured_header_wins() {
        let ip_real = IpAddr::V4(Ipv4Addr::new(128, 174, 199, 60));
        let ip_forwarded = IpAddr::V4(Ipv4Addr::new(80, 94, 184, 70));
        let request_headers = headers(&[
            ("X-REAL-IP", ip_real.to_string()),
            (FORWARDED_FOR, ip_forwarded.to_string()),
        ]);
        let actual = observed_ip(
            &request_headers,
            &["X-REAL-IP".to_owned(), FORWARDED_FOR.to_owned()],
            true,
            None,
        );
        assert_eq!(actual, Some(ip_real));
    }

    #[test]
    fn garbage_header_falls_back_to_socket() {
        let socket_ip = IpAddr::V4(Ipv4Addr::new(52, 0, 14, 116));
        let request_headers = headers(&[(FORWARDED_FOR, "unknown".to_owned())]);
        let actual = observed_ip(
            &request_headers,
            &[FORWARDED_FOR.to_owned()],
            true,
            Some(socket_ip),
        );
        assert_eq!(actual, Some(socket_ip));
    }
}
