//! Outbound request guard shared by sitemap discovery and page fetching.

use std::net::IpAddr;

use url::{Host, Url};

/// Check if a URL targets a potentially dangerous resource: a non-HTTP
/// scheme, a missing host, or a loopback/private/link-local address.
pub fn is_ssrf_target(url: &Url) -> bool {
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    match url.host() {
        Some(Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(Host::Domain(host)) => {
            host == "localhost" || host.ends_with(".local") || host.ends_with(".internal")
        }
        None => true,
    }
}

/// Check if an IP is in a private/reserved range.
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocked(raw: &str) -> bool {
        is_ssrf_target(&Url::parse(raw).unwrap())
    }

    #[test]
    fn private_and_local_targets_are_blocked() {
        for raw in [
            "http://127.0.0.1/",
            "http://10.0.0.8/sitemap.xml",
            "http://192.168.1.1/",
            "http://169.254.169.254/latest/meta-data/",
            "http://100.64.0.1/",
            "http://[::1]:8080/",
            "http://localhost:3000/",
            "https://printer.local/",
            "https://db.internal/",
            "file:///etc/passwd",
        ] {
            assert!(blocked(raw), "{raw} should be blocked");
        }
    }

    #[test]
    fn public_targets_pass() {
        assert!(!blocked("https://example.com/sitemap.xml"));
        assert!(!blocked("http://93.184.216.34/"));
        assert!(!blocked("http://100.128.0.1/"));
    }
}
