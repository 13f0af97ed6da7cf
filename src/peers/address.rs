/// Address manager records (`CAddrInfo`) and service flags.
use std::net::Ipv6Addr;

use bitcoin::p2p::ServiceFlags;
use bitcoin::p2p::address::{AddrV2, AddrV2Message, Address};
use chrono::DateTime;

use super::errors::PeersError;
use super::netaddr::NetAddr;
use super::reader::ByteReader;

/// Low bits of the stored per-record version that carry a client version and
/// are ignored when picking the address encoding.
const DISK_VERSION_IGNORE_MASK: u32 = 0x0007_FFFF;
/// Stored version flag marking a record as addrv2-encoded.
pub const DISK_VERSION_ADDRV2: u32 = 1 << 29;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Known service bits and their display names.
const SERVICE_NAMES: &[(ServiceFlags, &str)] = &[
    (ServiceFlags::NETWORK, "NETWORK"),
    (ServiceFlags::GETUTXO, "GETUTXO"),
    (ServiceFlags::BLOOM, "BLOOM"),
    (ServiceFlags::WITNESS, "WITNESS"),
    (ServiceFlags::COMPACT_FILTERS, "COMPACT_FILTERS"),
    (ServiceFlags::NETWORK_LIMITED, "NETWORK_LIMITED"),
    (ServiceFlags::P2P_V2, "P2P_V2"),
];

/// One entry of the new or tried table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrInfo {
    /// The peer's address.
    pub addr: NetAddr,
    /// The peer's port.
    pub port: u16,
    /// Advertised service bits.
    pub services: ServiceFlags,
    /// Last time the peer was seen or advertised (unix seconds).
    pub time: u32,
    /// The address that told us about this peer.
    pub source: NetAddr,
    /// Last successful connection (unix seconds, 0 = never).
    pub last_success: i64,
    /// Connection attempts since the last success.
    pub attempts: i32,
}

impl AddrInfo {
    /// Decode one record.
    ///
    /// `stream_addrv2` is true for files written with BIP155 support; it
    /// permits addrv2 records and selects the encoding of the `source` field.
    ///
    /// # Errors
    ///
    /// Returns `PeersError::Corrupt` on an unsupported per-record version,
    /// and propagates any read failure.
    pub fn read(r: &mut ByteReader<'_>, stream_addrv2: bool) -> Result<Self, PeersError> {
        let stored_version: u32 = r.decode("address version")?;
        let use_v2 = match stored_version & !DISK_VERSION_IGNORE_MASK {
            0 => false,
            DISK_VERSION_ADDRV2 if stream_addrv2 => true,
            other => {
                return Err(r.corrupt(format!(
                    "unsupported address disk version 0x{other:08x}"
                )));
            }
        };

        // The CAddress body: time, services, address, port.
        let (time, services, addr, port) = if use_v2 {
            let msg: AddrV2Message = r.decode("address")?;
            (msg.time, msg.services, NetAddr::from(msg.addr), msg.port)
        } else {
            let time: u32 = r.decode("address time")?;
            let legacy: Address = r.decode("address")?;
            let raw = Ipv6Addr::from(legacy.address).octets();
            (time, legacy.services, NetAddr::from_legacy(raw), legacy.port)
        };
        let source = if stream_addrv2 {
            NetAddr::from(r.decode::<AddrV2>("source address")?)
        } else {
            NetAddr::from_legacy(r.decode("source address")?)
        };
        let last_success: i64 = r.decode("last success")?;
        let attempts: i32 = r.decode("attempts")?;

        Ok(Self {
            addr,
            port,
            services,
            time,
            source,
            last_success,
            attempts,
        })
    }

    /// `host:port` form of the peer address.
    #[must_use]
    pub fn address(&self) -> String {
        self.addr.with_port(self.port)
    }

    /// Names of the set service bits.
    #[must_use]
    pub fn service_flags(&self) -> Vec<String> {
        service_flag_names(self.services)
    }
}

/// Render each set bit of `services` as a name, unknown bits as `UNKNOWN[2^n]`.
#[must_use]
pub fn service_flag_names(services: ServiceFlags) -> Vec<String> {
    let bits = services.to_u64();
    (0..64)
        .map(|bit| 1u64 << bit)
        .filter(|mask| bits & mask != 0)
        .map(|mask| {
            let flag = ServiceFlags::from(mask);
            SERVICE_NAMES
                .iter()
                .find(|(known, _)| *known == flag)
                .map_or_else(
                    || format!("UNKNOWN[2^{}]", mask.trailing_zeros()),
                    |(_, name)| (*name).to_owned(),
                )
        })
        .collect()
}

/// RFC 3339 UTC timestamp, or `None` for zero/out-of-range values.
#[must_use]
pub fn format_timestamp(secs: i64) -> Option<String> {
    if secs <= 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0).map(|t| t.format(TIMESTAMP_FORMAT).to_string())
}

/// RFC 3339 UTC rendering of a record's `time`. Zero renders as the epoch.
#[must_use]
pub fn format_time(secs: u32) -> String {
    DateTime::from_timestamp(i64::from(secs), 0)
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}
