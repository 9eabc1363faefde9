use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Dotted quad, or colon-separated hex groups optionally ending with an embedded IPv4.
    // Octet ranges are not checked here, the database reader rejects those.
    static ref IP_PATTERN: Regex = Regex::new(
        r"^(?:(?:\d{1,3}\.){3}\d{1,3}|[0-9A-Fa-f]{0,4}(?::[0-9A-Fa-f]{0,4}){2,7}(?::(?:\d{1,3}\.){3}\d{1,3})?)$"
    )
    .unwrap();
}

/// Loose shape check applied before any database is touched
pub fn looks_like_ip(s: &str) -> bool {
    IP_PATTERN.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_shapes() {
        for s in ["1.2.3.4", "81.2.69.142", "0.0.0.0", "255.255.255.255", "999.1.1.1"] {
            assert!(looks_like_ip(s), "{s}");
        }
        for s in ["1.2.3", "1.2.3.4.5", "1.2.3.4 ", "1.2.3.a", "1234.1.1.1"] {
            assert!(!looks_like_ip(s), "{s}");
        }
    }

    #[test]
    fn ipv6_shapes() {
        for s in [
            "::",
            "::1",
            "2001:db8::1",
            "2001:0db8:85a3:0000:0000:8a2e:0370:7334",
            "::ffff:81.2.69.142",
            "fe80::",
        ] {
            assert!(looks_like_ip(s), "{s}");
        }
        for s in ["2001:db8::g", "1:", "12345::1", "fe80::1%eth0"] {
            assert!(!looks_like_ip(s), "{s}");
        }
    }

    #[test]
    fn not_ips() {
        for s in ["", " ", "not-an-ip", "favicon.ico", "bulk", "localhost", "example.com"] {
            assert!(!looks_like_ip(s), "{s:?}");
        }
    }
}
