/// Validate a hostname or role name used as a file stem.
/// Allows alphanumeric, hyphens, dots, and underscores. No path separators or shell metacharacters.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > 253 || hostname.starts_with('.') {
        return false;
    }
    hostname.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
}

/// Convert a device name to its output filename
/// e.g., ("leaf1", "yaml") -> "leaf1.yaml"
pub fn device_config_filename(device: &str, extension: &str) -> String {
    format!("{}.{}", device, extension)
}

/// Split a CIDR address into address and prefix length.
/// "10.0.0.1/31" -> ("10.0.0.1", 31). A bare address has no prefix length.
pub fn split_prefix(cidr: &str) -> (&str, Option<u8>) {
    match cidr.split_once('/') {
        Some((addr, len)) => (addr, len.parse().ok()),
        None => (cidr, None),
    }
}

pub fn is_ipv4_host_prefix(cidr: &str) -> bool {
    cidr.ends_with("/32") && !cidr.contains(':')
}

pub fn is_ipv6_host_prefix(cidr: &str) -> bool {
    cidr.ends_with("/128")
}

/// Derive an IS-IS NET from a router IPv4 address, using the zero-padded last octet
/// as system id: "10.0.0.12" -> "49.0001.0000.0000.0012.00"
pub fn isis_net_from_ipv4(router_id: &str) -> Option<String> {
    let last_octet = router_id.rsplit('.').next()?;
    if last_octet.is_empty() || last_octet.len() > 4 || !last_octet.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("49.0001.0000.0000.{:0>4}.00", last_octet))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_hostname() {
        assert!(is_valid_hostname("switch-01"));
        assert!(is_valid_hostname("leaf1.dc1"));
        assert!(is_valid_hostname("core_router"));
        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname("../etc/passwd"));
        assert!(!is_valid_hostname("a/b"));
        assert!(!is_valid_hostname(".hidden"));
        assert!(!is_valid_hostname("leaf; rm -rf /"));
        assert!(!is_valid_hostname(&"a".repeat(254)));
    }

    #[test]
    fn test_device_config_filename() {
        assert_eq!(device_config_filename("leaf1", "yaml"), "leaf1.yaml");
    }

    #[test]
    fn test_split_prefix() {
        assert_eq!(split_prefix("10.0.0.1/31"), ("10.0.0.1", Some(31)));
        assert_eq!(split_prefix("2001:db8::1/128"), ("2001:db8::1", Some(128)));
        assert_eq!(split_prefix("10.0.0.1"), ("10.0.0.1", None));
        assert_eq!(split_prefix("10.0.0.1/abc"), ("10.0.0.1", None));
    }

    #[test]
    fn test_host_prefixes() {
        assert!(is_ipv4_host_prefix("10.0.0.1/32"));
        assert!(!is_ipv4_host_prefix("10.0.0.0/31"));
        assert!(is_ipv6_host_prefix("2001:db8::1/128"));
        assert!(!is_ipv6_host_prefix("2001:db8::/64"));
    }

    #[test]
    fn test_isis_net_from_ipv4() {
        assert_eq!(isis_net_from_ipv4("10.0.0.12").as_deref(), Some("49.0001.0000.0000.0012.00"));
        assert_eq!(isis_net_from_ipv4("192.168.1.254").as_deref(), Some("49.0001.0000.0000.0254.00"));
        assert_eq!(isis_net_from_ipv4("10.0.0.x"), None);
        assert_eq!(isis_net_from_ipv4(""), None);
    }
}
