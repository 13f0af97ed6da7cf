/// Test-only builder for synthetic peers.dat images.
use std::net::{Ipv4Addr, Ipv6Addr};

use bitcoin::consensus::serialize;
use bitcoin::p2p::ServiceFlags;
use bitcoin::p2p::address::{AddrV2, AddrV2Message, Address};

use super::address::DISK_VERSION_ADDRV2;
use super::db::{FILE_FORMAT, INCOMPATIBILITY_BASE, sha256d};
use super::netaddr::{INTERNAL_IN_IPV6_PREFIX, NetAddr, TORV2_IN_IPV6_PREFIX};

/// A record to serialize.
#[derive(Debug, Clone)]
pub struct Record {
    pub addr: NetAddr,
    pub port: u16,
    pub services: u64,
    pub time: u32,
    pub source: NetAddr,
    pub last_success: i64,
    pub attempts: i32,
}

impl Record {
    pub fn ipv4(ip: [u8; 4], port: u16) -> Self {
        Self {
            addr: NetAddr::Ipv4(Ipv4Addr::from(ip)),
            port,
            services: 1 | 8,
            time: 1_600_000_000,
            source: NetAddr::Ipv4(Ipv4Addr::new(127, 0, 0, 1)),
            last_success: 0,
            attempts: 0,
        }
    }
}

/// Builds a serialized database with a valid checksum trailer.
#[derive(Debug, Clone)]
pub struct DbBuilder {
    magic: [u8; 4],
    format: u8,
    compat: u8,
    new: Vec<Record>,
    tried: Vec<Record>,
    new_buckets: u32,
    buckets: Vec<(u32, Vec<i32>)>,
    counts: Option<(i32, i32)>,
}

impl DbBuilder {
    /// Format 1 file as written by pre-BIP155 clients.
    pub fn legacy() -> Self {
        Self {
            magic: bitcoin::Network::Bitcoin.magic().to_bytes(),
            format: 1,
            compat: INCOMPATIBILITY_BASE,
            new: Vec::new(),
            tried: Vec::new(),
            new_buckets: 1024,
            buckets: Vec::new(),
            counts: None,
        }
    }

    /// Newest supported format.
    pub fn current() -> Self {
        Self {
            format: FILE_FORMAT,
            compat: INCOMPATIBILITY_BASE + FILE_FORMAT,
            ..Self::legacy()
        }
    }

    pub fn magic(mut self, magic: [u8; 4]) -> Self {
        self.magic = magic;
        self
    }

    pub fn format(mut self, format: u8) -> Self {
        self.format = format;
        self
    }

    pub fn compat(mut self, compat: u8) -> Self {
        self.compat = compat;
        self
    }

    pub fn new_record(mut self, record: Record) -> Self {
        self.new.push(record);
        self
    }

    pub fn tried_record(mut self, record: Record) -> Self {
        self.tried.push(record);
        self
    }

    /// Number of new buckets written to the file.
    pub fn bucket_count(mut self, count: u32) -> Self {
        self.new_buckets = count;
        self
    }

    pub fn bucket(mut self, bucket: u32, indices: &[i32]) -> Self {
        self.buckets.push((bucket, indices.to_vec()));
        self
    }

    /// Write these counts instead of the real record counts.
    pub fn override_counts(mut self, n_new: i32, n_tried: i32) -> Self {
        self.counts = Some((n_new, n_tried));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let addrv2 = self.format >= 3;
        let mut out = Vec::new();
        out.extend_from_slice(&self.magic);
        out.push(self.format);
        out.push(self.compat);
        out.extend_from_slice(&[0xab; 32]);

        let (n_new, n_tried) = self.counts.unwrap_or((
            i32::try_from(self.new.len()).unwrap(),
            i32::try_from(self.tried.len()).unwrap(),
        ));
        out.extend_from_slice(&n_new.to_le_bytes());
        out.extend_from_slice(&n_tried.to_le_bytes());
        let n_buckets = i32::try_from(self.new_buckets).unwrap();
        let stored = if self.format >= 1 {
            n_buckets ^ (1 << 30)
        } else {
            n_buckets
        };
        out.extend_from_slice(&stored.to_le_bytes());

        for record in self.new.iter().chain(&self.tried) {
            write_record(&mut out, record, addrv2);
        }

        for bucket in 0..self.new_buckets {
            let indices = self
                .buckets
                .iter()
                .find(|(b, _)| *b == bucket)
                .map(|(_, i)| i.as_slice())
                .unwrap_or_default();
            out.extend_from_slice(&i32::try_from(indices.len()).unwrap().to_le_bytes());
            for index in indices {
                out.extend_from_slice(&index.to_le_bytes());
            }
        }

        if self.format >= 2 {
            out.extend_from_slice(&[0u8; 32]);
        }

        let checksum = sha256d(&out);
        out.extend_from_slice(&checksum);
        out
    }
}

fn write_record(out: &mut Vec<u8>, record: &Record, addrv2: bool) {
    let services = ServiceFlags::from(record.services);
    if addrv2 {
        out.extend_from_slice(&(DISK_VERSION_ADDRV2 | 220_000).to_le_bytes());
        out.extend(serialize(&AddrV2Message {
            time: record.time,
            services,
            addr: to_addrv2(&record.addr),
            port: record.port,
        }));
        out.extend(serialize(&to_addrv2(&record.source)));
    } else {
        out.extend_from_slice(&170_100u32.to_le_bytes());
        out.extend_from_slice(&record.time.to_le_bytes());
        out.extend(serialize(&Address {
            services,
            address: Ipv6Addr::from(legacy_bytes(&record.addr)).segments(),
            port: record.port,
        }));
        out.extend_from_slice(&legacy_bytes(&record.source));
    }
    out.extend_from_slice(&record.last_success.to_le_bytes());
    out.extend_from_slice(&record.attempts.to_le_bytes());
}

fn to_addrv2(addr: &NetAddr) -> AddrV2 {
    match addr {
        NetAddr::Ipv4(ip) => AddrV2::Ipv4(*ip),
        NetAddr::Ipv6(ip) => AddrV2::Ipv6(*ip),
        NetAddr::TorV2(id) => AddrV2::TorV2(*id),
        NetAddr::TorV3(pubkey) => AddrV2::TorV3(*pubkey),
        NetAddr::I2p(hash) => AddrV2::I2p(*hash),
        NetAddr::Cjdns(ip) => AddrV2::Cjdns(*ip),
        NetAddr::Unknown { network_id, bytes } => AddrV2::Unknown(*network_id, bytes.clone()),
        NetAddr::Internal(_) => panic!("internal addresses have no addrv2 encoding"),
    }
}

fn legacy_bytes(addr: &NetAddr) -> [u8; 16] {
    let mut raw = [0u8; 16];
    match addr {
        NetAddr::Ipv4(ip) => return ip.to_ipv6_mapped().octets(),
        NetAddr::Ipv6(ip) => return ip.octets(),
        NetAddr::TorV2(id) => {
            raw[..6].copy_from_slice(&TORV2_IN_IPV6_PREFIX);
            raw[6..].copy_from_slice(id);
        }
        NetAddr::Internal(hash) => {
            raw[..6].copy_from_slice(&INTERNAL_IN_IPV6_PREFIX);
            raw[6..].copy_from_slice(hash);
        }
        other => panic!("{other:?} has no legacy encoding"),
    }
    raw
}
