/// Peer network addresses as stored in peers.dat, with their display forms.
///
/// BIP155 payloads are decoded by `bitcoin::p2p::address::AddrV2`. Legacy
/// 16-byte slots are classified here, since they can also carry Tor v2 and
/// internal addresses behind reserved IPv6 prefixes.
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use bitcoin::p2p::address::AddrV2;
use data_encoding::{BASE32_NOPAD, HEXLOWER};
use sha3::{Digest, Sha3_256};

const IPV4_IN_IPV6_PREFIX: [u8; 12] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff];
/// OnionCat prefix used to smuggle Tor v2 addresses through 16-byte slots.
pub const TORV2_IN_IPV6_PREFIX: [u8; 6] = [0xfd, 0x87, 0xd8, 0x7e, 0xeb, 0x43];
pub const INTERNAL_IN_IPV6_PREFIX: [u8; 6] = [0xfd, 0x6b, 0x88, 0xc0, 0x87, 0x24];

const TORV3_VERSION: u8 = 0x03;

/// A decoded peer network address (without port).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetAddr {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    TorV2([u8; 10]),
    TorV3([u8; 32]),
    I2p([u8; 32]),
    Cjdns(Ipv6Addr),
    /// Name-derived placeholder used for seed lookups.
    Internal([u8; 10]),
    /// A BIP155 network id this decoder does not know.
    Unknown { network_id: u8, bytes: Vec<u8> },
}

impl NetAddr {
    /// Classify a legacy 16-byte address slot.
    #[must_use]
    pub fn from_legacy(raw: [u8; 16]) -> Self {
        if raw.starts_with(&IPV4_IN_IPV6_PREFIX) {
            return Self::Ipv4(Ipv4Addr::new(raw[12], raw[13], raw[14], raw[15]));
        }
        if raw.starts_with(&TORV2_IN_IPV6_PREFIX) {
            return Self::TorV2(tail10(&raw));
        }
        if raw.starts_with(&INTERNAL_IN_IPV6_PREFIX) {
            return Self::Internal(tail10(&raw));
        }
        Self::Ipv6(Ipv6Addr::from(raw))
    }

    /// Short network name (`ipv4`, `ipv6`, `onion`, `i2p`, `cjdns`, `internal`, `unknown`).
    #[must_use]
    pub fn network(&self) -> &'static str {
        match self {
            Self::Ipv4(_) => "ipv4",
            Self::Ipv6(_) => "ipv6",
            Self::TorV2(_) | Self::TorV3(_) => "onion",
            Self::I2p(_) => "i2p",
            Self::Cjdns(_) => "cjdns",
            Self::Internal(_) => "internal",
            Self::Unknown { .. } => "unknown",
        }
    }

    /// Render as `host:port`, bracketing IPv6-style hosts.
    #[must_use]
    pub fn with_port(&self, port: u16) -> String {
        match self {
            Self::Ipv6(_) | Self::Cjdns(_) => format!("[{self}]:{port}"),
            _ => format!("{self}:{port}"),
        }
    }
}

impl From<AddrV2> for NetAddr {
    fn from(addr: AddrV2) -> Self {
        match addr {
            AddrV2::Ipv4(ip) => Self::Ipv4(ip),
            AddrV2::Ipv6(ip) => Self::Ipv6(ip),
            AddrV2::TorV2(id) => Self::TorV2(id),
            AddrV2::TorV3(pubkey) => Self::TorV3(pubkey),
            AddrV2::I2p(hash) => Self::I2p(hash),
            AddrV2::Cjdns(ip) => Self::Cjdns(ip),
            AddrV2::Unknown(network_id, bytes) => Self::Unknown { network_id, bytes },
        }
    }
}

impl fmt::Display for NetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4(ip) => write!(f, "{ip}"),
            Self::Ipv6(ip) | Self::Cjdns(ip) => write!(f, "{ip}"),
            Self::TorV2(bytes) => write!(f, "{}.onion", base32(bytes)),
            Self::TorV3(pubkey) => write!(f, "{}.onion", torv3_name(pubkey)),
            Self::I2p(hash) => write!(f, "{}.b32.i2p", base32(hash)),
            Self::Internal(hash) => write!(f, "{}.internal", base32(hash)),
            Self::Unknown { network_id, bytes } => {
                write!(f, "unknown{network_id}:{}", HEXLOWER.encode(bytes))
            }
        }
    }
}

/// Lowercase RFC 4648 base32 without padding.
fn base32(bytes: &[u8]) -> String {
    BASE32_NOPAD.encode(bytes).to_ascii_lowercase()
}

/// Tor v3 service name: `base32(pubkey || checksum[..2] || version)`.
fn torv3_name(pubkey: &[u8; 32]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(b".onion checksum");
    hasher.update(pubkey);
    hasher.update([TORV3_VERSION]);
    let checksum = hasher.finalize();

    let mut full = Vec::with_capacity(35);
    full.extend_from_slice(pubkey);
    full.extend_from_slice(&checksum[..2]);
    full.push(TORV3_VERSION);
    base32(&full)
}

fn tail10(raw: &[u8; 16]) -> [u8; 10] {
    let mut out = [0u8; 10];
    out.copy_from_slice(&raw[6..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peers::PeersError;
    use crate::peers::reader::ByteReader;

    fn v2(data: &[u8]) -> Result<NetAddr, PeersError> {
        ByteReader::new(data)
            .decode::<AddrV2>("address")
            .map(NetAddr::from)
    }

    #[test]
    fn test_legacy_ipv4_mapped() {
        let mut raw = [0u8; 16];
        raw[10] = 0xff;
        raw[11] = 0xff;
        raw[12..].copy_from_slice(&[192, 168, 1, 7]);
        let addr = NetAddr::from_legacy(raw);
        assert_eq!(addr, NetAddr::Ipv4(Ipv4Addr::new(192, 168, 1, 7)));
        assert_eq!(addr.with_port(8333), "192.168.1.7:8333");
        assert_eq!(addr.network(), "ipv4");
    }

    #[test]
    fn test_legacy_ipv6() {
        let ip: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let addr = NetAddr::from_legacy(ip.octets());
        assert_eq!(addr.with_port(8333), "[2001:db8::1]:8333");
    }

    #[test]
    fn test_legacy_torv2() {
        let mut raw = [0u8; 16];
        raw[..6].copy_from_slice(&TORV2_IN_IPV6_PREFIX);
        let addr = NetAddr::from_legacy(raw);
        assert_eq!(addr.network(), "onion");
        assert_eq!(addr.to_string(), "aaaaaaaaaaaaaaaa.onion");
    }

    #[test]
    fn test_legacy_internal() {
        let mut raw = [0u8; 16];
        raw[..6].copy_from_slice(&INTERNAL_IN_IPV6_PREFIX);
        raw[15] = 1;
        let addr = NetAddr::from_legacy(raw);
        assert_eq!(addr, NetAddr::Internal([0, 0, 0, 0, 0, 0, 0, 0, 0, 1]));
        assert_eq!(addr.network(), "internal");
        assert_eq!(addr.to_string(), "aaaaaaaaaaaaaaab.internal");
        assert_eq!(addr.with_port(0), "aaaaaaaaaaaaaaab.internal:0");
    }

    #[test]
    fn test_v2_torv3_name() {
        // Known-answer vector from Bitcoin Core's netbase tests.
        let name = "pg6mmjiyjmcrsslvykfwnntlaru7p5svn6y2ymmju6nubxndf4pscryd.onion";
        let decoded = BASE32_NOPAD
            .decode(name.trim_end_matches(".onion").to_ascii_uppercase().as_bytes())
            .unwrap();
        let mut data = vec![4, 32];
        data.extend_from_slice(&decoded[..32]);
        assert_eq!(v2(&data).unwrap().to_string(), name);
    }

    #[test]
    fn test_v2_i2p() {
        let mut data = vec![5, 32];
        data.extend_from_slice(&[0u8; 32]);
        let addr = v2(&data).unwrap();
        assert_eq!(addr.network(), "i2p");
        assert!(addr.to_string().ends_with(".b32.i2p"));
        assert_eq!(addr.to_string().len(), 52 + ".b32.i2p".len());
    }

    #[test]
    fn test_v2_cjdns() {
        let ip: Ipv6Addr = "fc00::1".parse().unwrap();
        let mut data = vec![6, 16];
        data.extend_from_slice(&ip.octets());
        let addr = v2(&data).unwrap();
        assert_eq!(addr, NetAddr::Cjdns(ip));
        assert_eq!(addr.network(), "cjdns");
        assert_eq!(addr.with_port(8333), "[fc00::1]:8333");
    }

    #[test]
    fn test_v2_wrong_length() {
        let err = v2(&[1, 5, 1, 2, 3, 4, 5]).unwrap_err();
        assert!(matches!(err, PeersError::Corrupt { offset: 0, .. }));
    }

    #[test]
    fn test_v2_unknown_network_is_kept() {
        let addr = v2(&[0x2a, 2, 0xbe, 0xef]).unwrap();
        assert_eq!(addr.to_string(), "unknown42:beef");
        assert_eq!(addr.network(), "unknown");
    }

    #[test]
    fn test_v2_oversized_payload() {
        let err = v2(&[0x2a, 0xfd, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, PeersError::Corrupt { .. }));
    }

    #[test]
    fn test_v2_ipv6_with_embedded_ipv4_is_rejected() {
        let mut data = vec![2, 16];
        data.extend_from_slice(&IPV4_IN_IPV6_PREFIX);
        data.extend_from_slice(&[1, 2, 3, 4]);
        assert!(matches!(v2(&data).unwrap_err(), PeersError::Corrupt { .. }));
    }
}
