//! Client address resolution and IP allow-listing.

use std::net::{IpAddr, SocketAddr};

use axum::http::{HeaderMap, HeaderName};
use ipnet::IpNet;

/// Error returned for an allow-list entry that is neither a CIDR range nor an address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected CIDR range or IP address")]
pub struct InvalidRange;

/// Parse an allow-list entry. A bare address becomes a single-host range.
pub fn parse_ip_range(raw: &str) -> Result<IpNet, InvalidRange> {
    let raw = raw.trim();
    if let Ok(net) = raw.parse::<IpNet>() {
        return Ok(net);
    }
    let ip = raw.parse::<IpAddr>().map_err(|_| InvalidRange)?;
    let prefix = match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    IpNet::new(ip, prefix).map_err(|_| InvalidRange)
}

/// Allowed client ranges. An empty list admits everyone.
#[derive(Debug, Clone, Default)]
pub struct IpAllowList {
    ranges: Vec<IpNet>,
}

impl IpAllowList {
    pub fn new(ranges: Vec<IpNet>) -> Self {
        Self { ranges }
    }

    /// Build from configured strings, skipping entries that do not parse.
    ///
    /// Configuration validation rejects such entries before this runs.
    pub fn from_config(ranges: &[String]) -> Self {
        Self::new(
            ranges
                .iter()
                .filter_map(|r| parse_ip_range(r).ok())
                .collect(),
        )
    }

    pub fn is_enabled(&self) -> bool {
        !self.ranges.is_empty()
    }

    /// Whether `ip` falls within at least one range.
    pub fn permits(&self, ip: Option<IpAddr>) -> bool {
        match ip {
            Some(ip) => self.ranges.iter().any(|net| net.contains(&ip)),
            None => false,
        }
    }
}

/// Resolve the caller's address.
///
/// The first non-empty comma-separated value of the trusted forwarded-for
/// header wins; otherwise the transport peer address is used.
pub fn client_ip(
    headers: &HeaderMap,
    forwarded_for: Option<&HeaderName>,
    remote: Option<SocketAddr>,
) -> Option<IpAddr> {
    let forwarded = forwarded_for
        .and_then(|name| headers.get(name))
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').map(str::trim).find(|v| !v.is_empty()))
        .and_then(parse_address);

    forwarded.or_else(|| remote.map(|addr| addr.ip()))
}

fn parse_address(raw: &str) -> Option<IpAddr> {
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_single_address_becomes_host_range() {
        let net = parse_ip_range("192.168.1.7").unwrap();
        assert_eq!(net.prefix_len(), 32);
        let net = parse_ip_range("::1").unwrap();
        assert_eq!(net.prefix_len(), 128);
        assert!(parse_ip_range("10.0.0.0/33").is_err());
        assert!(parse_ip_range("nonsense").is_err());
    }

    #[test]
    fn test_forwarded_header_first_value() {
        let name = HeaderName::from_static("x-forwarded-for");
        let remote: SocketAddr = "10.0.0.12:64564".parse().unwrap();

        let ip = client_ip(&forwarded(" , 10.2.2.2, 10.3.3.3"), Some(&name), Some(remote));
        assert_eq!(ip, Some("10.2.2.2".parse().unwrap()));

        let ip = client_ip(&forwarded("10.2.2.2:8080"), Some(&name), Some(remote));
        assert_eq!(ip, Some("10.2.2.2".parse().unwrap()));
    }

    #[test]
    fn test_remote_address_fallback() {
        let remote: SocketAddr = "10.0.0.12:64564".parse().unwrap();
        // header present but not trusted
        let ip = client_ip(&forwarded("10.2.2.2"), None, Some(remote));
        assert_eq!(ip, Some("10.0.0.12".parse().unwrap()));

        let name = HeaderName::from_static("x-forwarded-for");
        let ip = client_ip(&forwarded("unknown"), Some(&name), Some(remote));
        assert_eq!(ip, Some("10.0.0.12".parse().unwrap()));
    }

    #[test]
    fn test_allow_list() {
        let list = IpAllowList::from_config(&["10.0.0.0/8".into(), "192.168.1.7".into()]);
        assert!(list.is_enabled());
        assert!(list.permits(Some("10.20.30.40".parse().unwrap())));
        assert!(list.permits(Some("192.168.1.7".parse().unwrap())));
        assert!(!list.permits(Some("192.168.1.8".parse().unwrap())));
        assert!(!list.permits(None));
    }
}
