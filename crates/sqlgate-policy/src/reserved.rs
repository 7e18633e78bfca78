//! Reserved-network classification.
//!
//! A fixed, ordered table of well-known reserved IPv4/IPv6 ranges
//! (RFC 1918, CGNAT, link-local, ULA, documentation and benchmarking
//! ranges). Classification walks the table in order and the first
//! matching range wins; an address matching nothing is `Public`.

use crate::range::AddressSpec;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// The classification of a single IP address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkClass {
    /// Loopback addresses (127.0.0.0/8, ::1)
    Loopback,
    /// Private, CGNAT, link-local, and ULA ranges
    Private,
    /// Other reserved ranges (documentation, benchmarking, mapped)
    OtherReserved,
    /// Publicly routable
    Public,
}

const fn v4(a: u8, b: u8, c: u8, d: u8, prefix: u8) -> AddressSpec {
    AddressSpec::from_parts(IpAddr::V4(Ipv4Addr::new(a, b, c, d)), prefix)
}

#[allow(clippy::many_single_char_names)]
const fn v6(a: u16, b: u16, c: u16, d: u16, e: u16, f: u16, g: u16, h: u16, prefix: u8) -> AddressSpec {
    AddressSpec::from_parts(IpAddr::V6(Ipv6Addr::new(a, b, c, d, e, f, g, h)), prefix)
}

/// Private and private-use ranges (IPv4 and IPv6).
const PRIVATE_RANGES: &[AddressSpec] = &[
    v4(10, 0, 0, 0, 8),
    v4(100, 64, 0, 0, 10),
    v4(172, 16, 0, 0, 12),
    v4(192, 0, 0, 0, 24),
    v4(192, 168, 0, 0, 16),
    v4(198, 18, 0, 0, 15),
    v4(169, 254, 0, 0, 16),
    v4(255, 255, 255, 255, 32),
    v6(0x64, 0xff9b, 0x1, 0, 0, 0, 0, 0, 48),
    v6(0x100, 0, 0, 0, 0, 0, 0, 0, 64),
    v6(0x5f00, 0, 0, 0, 0, 0, 0, 0, 16),
    v6(0xfc00, 0, 0, 0, 0, 0, 0, 0, 7),
    v6(0xfd00, 0, 0, 0, 0, 0, 0, 0, 8),
    v6(0xfe80, 0, 0, 0, 0, 0, 0, 0, 10),
];

/// Loopback ranges (IPv4 and IPv6).
const LOOPBACK_RANGES: &[AddressSpec] = &[
    v4(127, 0, 0, 0, 8),
    v6(0, 0, 0, 0, 0, 0, 0, 1, 128),
];

/// Other reserved ranges not classified as private or loopback.
const OTHER_RESERVED_RANGES: &[AddressSpec] = &[
    v4(0, 0, 0, 0, 8),
    v4(192, 0, 2, 0, 24),
    v4(198, 51, 100, 0, 24),
    v4(203, 0, 113, 0, 24),
    v4(233, 252, 0, 0, 24),
    v6(0, 0, 0, 0, 0, 0, 0, 0, 128),
    v6(0, 0, 0, 0, 0, 0xffff, 0, 0, 96),
    v6(0x2001, 0x20, 0, 0, 0, 0, 0, 0, 28),
    v6(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0, 32),
    v6(0x3fff, 0, 0, 0, 0, 0, 0, 0, 20),
];

/// Classify a single IP address against the reserved-range table.
///
/// Pure function with no failure mode: addresses matching no reserved
/// range are `Public`.
#[must_use]
pub fn classify(ip: IpAddr) -> NetworkClass {
    for range in PRIVATE_RANGES {
        if range.contains(ip) {
            return NetworkClass::Private;
        }
    }

    for range in LOOPBACK_RANGES {
        if range.contains(ip) {
            return NetworkClass::Loopback;
        }
    }

    for range in OTHER_RESERVED_RANGES {
        if range.contains(ip) {
            return NetworkClass::OtherReserved;
        }
    }

    NetworkClass::Public
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(text: &str) -> IpAddr {
        text.parse().expect("valid test address")
    }

    #[test]
    fn test_loopback() {
        assert_eq!(classify(ip("127.0.0.1")), NetworkClass::Loopback);
        assert_eq!(classify(ip("127.255.255.254")), NetworkClass::Loopback);
        assert_eq!(classify(ip("::1")), NetworkClass::Loopback);
    }

    #[test]
    fn test_private_rfc1918() {
        assert_eq!(classify(ip("10.1.2.3")), NetworkClass::Private);
        assert_eq!(classify(ip("172.16.0.1")), NetworkClass::Private);
        assert_eq!(classify(ip("172.31.255.1")), NetworkClass::Private);
        assert_eq!(classify(ip("192.168.0.1")), NetworkClass::Private);
    }

    #[test]
    fn test_private_cgnat_and_link_local() {
        assert_eq!(classify(ip("100.64.0.1")), NetworkClass::Private);
        assert_eq!(classify(ip("100.127.255.1")), NetworkClass::Private);
        assert_eq!(classify(ip("169.254.10.10")), NetworkClass::Private);
    }

    #[test]
    fn test_private_ipv6() {
        assert_eq!(classify(ip("fc00::1")), NetworkClass::Private);
        assert_eq!(classify(ip("fd12:3456::1")), NetworkClass::Private);
        assert_eq!(classify(ip("fe80::1")), NetworkClass::Private);
    }

    #[test]
    fn test_other_reserved_documentation() {
        assert_eq!(classify(ip("192.0.2.1")), NetworkClass::OtherReserved);
        assert_eq!(classify(ip("198.51.100.200")), NetworkClass::OtherReserved);
        assert_eq!(classify(ip("203.0.113.7")), NetworkClass::OtherReserved);
        assert_eq!(classify(ip("2001:db8::1")), NetworkClass::OtherReserved);
    }

    #[test]
    fn test_public() {
        assert_eq!(classify(ip("8.8.8.8")), NetworkClass::Public);
        assert_eq!(classify(ip("93.184.215.14")), NetworkClass::Public);
        assert_eq!(classify(ip("2600:1901::1")), NetworkClass::Public);
    }

    #[test]
    fn test_public_just_outside_private_ranges() {
        assert_eq!(classify(ip("11.0.0.1")), NetworkClass::Public);
        assert_eq!(classify(ip("172.32.0.1")), NetworkClass::Public);
        assert_eq!(classify(ip("192.169.0.1")), NetworkClass::Public);
        assert_eq!(classify(ip("100.128.0.1")), NetworkClass::Public);
    }

    #[test]
    fn test_mapped_ipv4_follows_ipv4_classification() {
        assert_eq!(classify(ip("::ffff:10.0.0.1")), NetworkClass::Private);
        assert_eq!(classify(ip("::ffff:127.0.0.1")), NetworkClass::Loopback);
    }
}
