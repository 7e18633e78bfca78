//! Address-range parsing and containment testing.
//!
//! An [`AddressSpec`] is a normalized (base-address, prefix-length) pair.
//! It is constructed only through successful parsing of one of three
//! textual forms: a bare address, CIDR notation, or an IPv4 address with
//! a dotted subnet mask.

use crate::{PolicyError, Result};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// A validated, normalized network range.
///
/// Invariant: the prefix length is within `[0, 32]` for IPv4 bases and
/// `[0, 128]` for IPv6 bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressSpec {
    base: IpAddr,
    prefix: u8,
}

impl AddressSpec {
    /// Construct a spec from parts without text parsing.
    ///
    /// Used for the static reserved-range tables; the caller guarantees
    /// the prefix is valid for the address family.
    pub(crate) const fn from_parts(base: IpAddr, prefix: u8) -> Self {
        Self { base, prefix }
    }

    /// Parse an address-or-range specification.
    ///
    /// Accepted forms:
    /// - bare address: `10.0.0.1` or `2001:db8::1` (normalized to /32, /128)
    /// - CIDR: `10.0.0.0/24`, `2001:db8::/32`
    /// - dotted subnet mask (IPv4 only): `10.0.0.0/255.255.255.0`
    ///
    /// # Errors
    /// Returns a format error naming the offending token for anything else,
    /// including out-of-range prefixes and non-contiguous masks.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(PolicyError::InvalidAddressSpec(text.to_string()));
        }

        let Some((addr_text, suffix)) = trimmed.split_once('/') else {
            // Bare address form
            let base: IpAddr = trimmed
                .parse()
                .map_err(|_| PolicyError::InvalidAddressSpec(trimmed.to_string()))?;
            let prefix = if base.is_ipv4() { 32 } else { 128 };
            return Ok(Self { base, prefix });
        };

        let base: IpAddr = addr_text
            .trim()
            .parse()
            .map_err(|_| PolicyError::InvalidAddressSpec(trimmed.to_string()))?;

        if suffix.contains('.') {
            // Dotted subnet mask form, IPv4 only
            let IpAddr::V4(_) = base else {
                return Err(PolicyError::InvalidAddressSpec(trimmed.to_string()));
            };
            let mask: Ipv4Addr = suffix
                .trim()
                .parse()
                .map_err(|_| PolicyError::InvalidSubnetMask(suffix.trim().to_string()))?;
            let prefix = mask_to_prefix(mask)?;
            return Ok(Self { base, prefix });
        }

        // CIDR form
        let prefix: u8 = suffix
            .trim()
            .parse()
            .map_err(|_| PolicyError::InvalidPrefixLength(trimmed.to_string()))?;
        let max = if base.is_ipv4() { 32 } else { 128 };
        if prefix > max {
            return Err(PolicyError::InvalidPrefixLength(trimmed.to_string()));
        }

        Ok(Self { base, prefix })
    }

    /// The range's base address.
    #[must_use]
    pub fn base(&self) -> IpAddr {
        self.base
    }

    /// The range's prefix length.
    #[must_use]
    pub fn prefix_len(&self) -> u8 {
        self.prefix
    }

    /// Whether `ip` falls within this range.
    ///
    /// IPv4-mapped IPv6 addresses are unmapped before comparison, so
    /// `::ffff:10.0.0.1` is contained in `10.0.0.0/8`. Addresses of a
    /// different family than the base never match.
    #[must_use]
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = match (self.base, ip) {
            (IpAddr::V4(_), IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
                Some(v4) => IpAddr::V4(v4),
                None => return false,
            },
            _ => ip,
        };

        match (self.base, ip) {
            (IpAddr::V4(base), IpAddr::V4(ip)) => {
                leading_bits_match(&base.octets(), &ip.octets(), self.prefix)
            }
            (IpAddr::V6(base), IpAddr::V6(ip)) => {
                leading_bits_match(&base.octets(), &ip.octets(), self.prefix)
            }
            _ => false,
        }
    }
}

impl fmt::Display for AddressSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix)
    }
}

/// Compare the leading `prefix` bits of two equal-length byte slices,
/// masking the final boundary byte.
fn leading_bits_match(base: &[u8], ip: &[u8], prefix: u8) -> bool {
    let mut bits = i16::from(prefix);
    for (a, b) in base.iter().zip(ip.iter()) {
        if bits <= 0 {
            break;
        }
        let mask: u8 = if bits >= 8 {
            0xFF
        } else {
            0xFF << (8 - bits)
        };
        if (a & mask) != (b & mask) {
            return false;
        }
        bits -= 8;
    }
    true
}

/// Convert a dotted subnet mask to a prefix length (e.g. `255.255.255.0`
/// to 24). The mask must be a contiguous run of set bits from the most
/// significant bit; non-contiguous and all-zero masks are rejected.
fn mask_to_prefix(mask: Ipv4Addr) -> Result<u8> {
    let mut prefix: u8 = 0;
    let mut zero_seen = false;
    for byte in mask.octets() {
        for i in (0..8).rev() {
            let bit = byte & (1 << i) != 0;
            if bit {
                if zero_seen {
                    return Err(PolicyError::InvalidSubnetMask(mask.to_string()));
                }
                prefix += 1;
            } else {
                zero_seen = true;
            }
        }
    }

    if prefix == 0 {
        return Err(PolicyError::InvalidSubnetMask(mask.to_string()));
    }

    Ok(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(text: &str) -> IpAddr {
        text.parse().expect("valid test address")
    }

    #[test]
    fn test_bare_ipv4_normalizes_to_32() {
        let spec = AddressSpec::parse("10.0.0.1").expect("parse");
        assert_eq!(spec.prefix_len(), 32);
        assert_eq!(spec.base(), ip("10.0.0.1"));
    }

    #[test]
    fn test_bare_ipv6_normalizes_to_128() {
        let spec = AddressSpec::parse("2001:db8::1").expect("parse");
        assert_eq!(spec.prefix_len(), 128);
    }

    #[test]
    fn test_cidr_and_mask_normalize_identically() {
        let cidr = AddressSpec::parse("10.0.0.0/24").expect("parse cidr");
        let masked = AddressSpec::parse("10.0.0.0/255.255.255.0").expect("parse mask");
        assert_eq!(cidr, masked);
        assert_eq!(cidr.to_string(), "10.0.0.0/24");
    }

    #[test]
    fn test_non_contiguous_mask_rejected() {
        let result = AddressSpec::parse("10.0.0.0/255.0.255.0");
        assert_eq!(
            result,
            Err(PolicyError::InvalidSubnetMask("255.0.255.0".to_string()))
        );
    }

    #[test]
    fn test_all_zero_mask_rejected() {
        assert!(AddressSpec::parse("10.0.0.0/0.0.0.0").is_err());
    }

    #[test]
    fn test_mask_on_ipv6_base_rejected() {
        assert!(AddressSpec::parse("2001:db8::/255.255.0.0").is_err());
    }

    #[test]
    fn test_prefix_out_of_range_rejected() {
        assert!(AddressSpec::parse("10.0.0.0/33").is_err());
        assert!(AddressSpec::parse("2001:db8::/129").is_err());
        assert!(AddressSpec::parse("10.0.0.0/24").is_ok());
        assert!(AddressSpec::parse("2001:db8::/128").is_ok());
    }

    #[test]
    fn test_garbage_rejected_with_offending_token() {
        let result = AddressSpec::parse("not-an-address");
        assert_eq!(
            result,
            Err(PolicyError::InvalidAddressSpec("not-an-address".to_string()))
        );
        assert!(AddressSpec::parse("").is_err());
        assert!(AddressSpec::parse("10.0.0.0/abc").is_err());
    }

    #[test]
    fn test_contains_ipv4() {
        let spec = AddressSpec::parse("192.168.1.0/24").expect("parse");
        assert!(spec.contains(ip("192.168.1.42")));
        assert!(spec.contains(ip("192.168.1.0")));
        assert!(spec.contains(ip("192.168.1.255")));
        assert!(!spec.contains(ip("192.168.2.42")));
    }

    #[test]
    fn test_contains_partial_byte_boundary() {
        // /12 masks only the top 4 bits of the second byte
        let spec = AddressSpec::parse("172.16.0.0/12").expect("parse");
        assert!(spec.contains(ip("172.16.0.1")));
        assert!(spec.contains(ip("172.31.255.255")));
        assert!(!spec.contains(ip("172.32.0.1")));
    }

    #[test]
    fn test_contains_ipv6() {
        let spec = AddressSpec::parse("2001:db8::/32").expect("parse");
        assert!(spec.contains(ip("2001:db8::1")));
        assert!(spec.contains(ip("2001:db8:ffff::1")));
        assert!(!spec.contains(ip("2001:db9::1")));
    }

    #[test]
    fn test_contains_zero_prefix_matches_everything() {
        let spec = AddressSpec::parse("0.0.0.0/0").expect("parse");
        assert!(spec.contains(ip("1.2.3.4")));
        assert!(spec.contains(ip("255.255.255.255")));
    }

    #[test]
    fn test_contains_unmaps_ipv4_mapped_ipv6() {
        let spec = AddressSpec::parse("10.0.0.0/8").expect("parse");
        assert!(spec.contains(ip("::ffff:10.1.2.3")));
        assert!(!spec.contains(ip("::ffff:11.1.2.3")));
    }

    #[test]
    fn test_contains_mixed_families_never_match() {
        let v4 = AddressSpec::parse("10.0.0.0/8").expect("parse");
        assert!(!v4.contains(ip("2001:db8::1")));

        let v6 = AddressSpec::parse("2001:db8::/32").expect("parse");
        assert!(!v6.contains(ip("10.0.0.1")));
    }
}
