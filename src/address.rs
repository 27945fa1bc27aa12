//! Pure IP address classification against the global-unicast allowlist.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Where an IP address falls in the address-range table.
///
/// Only [`AddressClassification::UnicastGlobal`] is fetchable; every other
/// variant is denied. The catch-all for IPv6 space outside `2000::/3` is
/// [`AddressClassification::OtherNonGlobal`], which keeps the policy an
/// allowlist rather than a denylist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressClassification {
    UnicastGlobal,
    Loopback,
    Private,
    LinkLocal,
    UniqueLocalV6,
    Multicast,
    Reserved,
    Unspecified,
    OtherNonGlobal,
}

impl AddressClassification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnicastGlobal => "unicast_global",
            Self::Loopback => "loopback",
            Self::Private => "private",
            Self::LinkLocal => "link_local",
            Self::UniqueLocalV6 => "unique_local_v6",
            Self::Multicast => "multicast",
            Self::Reserved => "reserved",
            Self::Unspecified => "unspecified",
            Self::OtherNonGlobal => "other_non_global",
        }
    }

    pub fn is_global_unicast(self) -> bool {
        self == Self::UnicastGlobal
    }
}

impl fmt::Display for AddressClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an IP address purely from its bit pattern.
///
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are unwrapped and classified
/// by their embedded IPv4 semantics — otherwise `::ffff:10.0.0.1` would slip
/// past an IPv6-only range check.
pub fn classify_ip(ip: IpAddr) -> AddressClassification {
    match ip {
        IpAddr::V4(v4) => classify_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => classify_v4(v4),
            None => classify_v6(v6),
        },
    }
}

fn classify_v4(v4: Ipv4Addr) -> AddressClassification {
    let octets = v4.octets();
    if v4.is_unspecified() {
        AddressClassification::Unspecified
    } else if v4.is_loopback() {
        AddressClassification::Loopback
    } else if v4.is_private() {
        AddressClassification::Private
    } else if v4.is_link_local() {
        // 169.254.0.0/16 — includes the cloud metadata address 169.254.169.254
        AddressClassification::LinkLocal
    } else if v4.is_multicast() {
        AddressClassification::Multicast
    } else if v4.is_broadcast() || octets[0] >= 240 {
        // 255.255.255.255 and 240.0.0.0/4 future use
        AddressClassification::Reserved
    } else if octets[0] == 0 {
        // 0.0.0.0/8 "this network"
        AddressClassification::Reserved
    } else if octets[0] == 100 && (64..=127).contains(&octets[1]) {
        // 100.64.0.0/10 carrier-grade NAT
        AddressClassification::OtherNonGlobal
    } else if octets[0] == 192 && octets[1] == 0 && octets[2] == 0 {
        // 192.0.0.0/24 protocol assignments
        AddressClassification::Reserved
    } else if v4.is_documentation() {
        AddressClassification::Reserved
    } else if octets[0] == 198 && (octets[1] & 0xfe) == 18 {
        // 198.18.0.0/15 benchmarking
        AddressClassification::Reserved
    } else {
        AddressClassification::UnicastGlobal
    }
}

fn classify_v6(v6: Ipv6Addr) -> AddressClassification {
    let segs = v6.segments();
    if v6.is_unspecified() {
        AddressClassification::Unspecified
    } else if v6.is_loopback() {
        AddressClassification::Loopback
    } else if (segs[0] & 0xfe00) == 0xfc00 {
        // unique-local fc00::/7 — IPv6 equivalent of RFC 1918
        AddressClassification::UniqueLocalV6
    } else if (segs[0] & 0xffc0) == 0xfe80 {
        // link-local fe80::/10
        AddressClassification::LinkLocal
    } else if v6.is_multicast() {
        AddressClassification::Multicast
    } else if segs[0] == 0x2001 && segs[1] == 0x0db8 {
        // 2001:db8::/32 documentation sits inside 2000::/3
        AddressClassification::Reserved
    } else if (segs[0] & 0xe000) == 0x2000 {
        // 2000::/3 is the only currently-allocated global unicast block
        AddressClassification::UnicastGlobal
    } else {
        AddressClassification::OtherNonGlobal
    }
}
