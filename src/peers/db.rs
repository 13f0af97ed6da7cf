/// Decoding of a whole peers.dat image.
///
/// Layout:
/// ```text
/// magic[4] format u8 compat u8 key[32] nNew i32 nTried i32 nUBuckets i32
/// new CAddrInfo * nNew, tried CAddrInfo * nTried
/// per bucket: count i32, index i32 * count
/// asmap_checksum[32]  (format >= 2)
/// sha256d[32]         (over everything before it)
/// ```
use std::path::{Path, PathBuf};

use bitcoin::hashes::Hash;

use super::address::AddrInfo;
use super::errors::PeersError;
use super::network::Network;
use super::reader::ByteReader;

/// Newest file format this decoder understands.
pub const FILE_FORMAT: u8 = 4;
/// Offset added to the lowest-compatible format before it is stored.
pub const INCOMPATIBILITY_BASE: u8 = 32;
/// Format that introduced the XOR-ed bucket count.
const FORMAT_DETERMINISTIC: u8 = 1;
/// Format that introduced the trailing asmap checksum.
const FORMAT_ASMAP: u8 = 2;
/// Format that introduced BIP155 (addrv2) records.
const FORMAT_BIP155: u8 = 3;

const NEW_BUCKET_COUNT: i32 = 1 << 10;
const TRIED_BUCKET_COUNT: i32 = 1 << 8;
const BUCKET_SIZE: i32 = 64;

/// Which address table a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    New,
    Tried,
}

impl Table {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Tried => "tried",
        }
    }
}

/// A slot in the new table pointing at a record of `PeersDb::new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketEntry {
    pub bucket: u32,
    pub index: u32,
}

/// A decoded peers database.
#[derive(Debug, Clone)]
pub struct PeersDb {
    /// Where the data came from.
    pub path: PathBuf,
    /// Message-start bytes of the chain that wrote the file.
    pub magic: [u8; 4],
    /// Chain recognized from `magic`, if any.
    pub network: Option<Network>,
    /// Serialization format byte.
    pub format: u8,
    /// Raw compatibility byte. Legacy writers stored the key size (32) here.
    pub compat: u8,
    /// Secret bucketing key.
    pub key: [u8; 32],
    /// New-table records.
    pub new: Vec<AddrInfo>,
    /// Tried-table records.
    pub tried: Vec<AddrInfo>,
    /// Number of new buckets the file was written with.
    pub new_buckets: u32,
    /// New-table slots that reference a valid record.
    pub bucket_entries: Vec<BucketEntry>,
    /// New-table slots whose index was out of range.
    pub dropped_bucket_entries: usize,
    /// Checksum of the asmap in use when the file was written.
    pub asmap_checksum: Option<[u8; 32]>,
    /// Trailing SHA256d of the file contents.
    pub checksum: [u8; 32],
}

impl PeersDb {
    /// Read and decode the peers database at `path`, verifying its checksum.
    ///
    /// # Errors
    ///
    /// Returns `PeersError::Read` if the file cannot be read, or any decode error.
    pub fn open(path: &Path) -> Result<Self, PeersError> {
        Self::open_with(path, true)
    }

    /// Like [`PeersDb::open`], with control over checksum verification.
    ///
    /// # Errors
    ///
    /// Returns `PeersError::Read` if the file cannot be read, or any decode error.
    pub fn open_with(path: &Path, verify_checksum: bool) -> Result<Self, PeersError> {
        let bytes = std::fs::read(path).map_err(|source| PeersError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_bytes(path, &bytes, verify_checksum)
    }

    /// Decode a peers database image already in memory.
    ///
    /// # Errors
    ///
    /// Returns `PeersError::Truncated`, `PeersError::UnsupportedFormat`,
    /// `PeersError::Corrupt`, or `PeersError::ChecksumMismatch`.
    pub fn from_bytes(path: &Path, data: &[u8], verify_checksum: bool) -> Result<Self, PeersError> {
        let mut r = ByteReader::new(data);

        let magic: [u8; 4] = r.decode("magic")?;
        let format: u8 = r.decode("format")?;
        let compat: u8 = r.decode("compatibility")?;
        let lowest_compatible = i16::from(compat) - i16::from(INCOMPATIBILITY_BASE);
        if !(0..=i16::from(FILE_FORMAT)).contains(&lowest_compatible) {
            return Err(PeersError::UnsupportedFormat {
                format,
                lowest_compatible,
                supported: FILE_FORMAT,
            });
        }
        let stream_addrv2 = format >= FORMAT_BIP155;

        let key: [u8; 32] = r.decode("key")?;
        let n_new: i32 = r.decode("nNew")?;
        let n_tried: i32 = r.decode("nTried")?;
        let mut n_buckets: i32 = r.decode("nUBuckets")?;
        if format >= FORMAT_DETERMINISTIC {
            n_buckets ^= 1 << 30;
        }

        let max_new = NEW_BUCKET_COUNT * BUCKET_SIZE;
        if !(0..=max_new).contains(&n_new) {
            return Err(r.corrupt(format!("nNew={n_new}, should be in [0, {max_new}]")));
        }
        let max_tried = TRIED_BUCKET_COUNT * BUCKET_SIZE;
        if !(0..=max_tried).contains(&n_tried) {
            return Err(r.corrupt(format!(
                "nTried={n_tried}, should be in [0, {max_tried}]"
            )));
        }
        let new_buckets = u32::try_from(n_buckets)
            .map_err(|_| r.corrupt(format!("negative bucket count {n_buckets}")))?;
        // Both counts are range-checked above.
        let n_new = n_new.unsigned_abs();
        let n_tried = n_tried.unsigned_abs();

        let new = read_records(&mut r, n_new, stream_addrv2)?;
        let tried = read_records(&mut r, n_tried, stream_addrv2)?;

        let mut bucket_entries = Vec::new();
        let mut dropped_bucket_entries = 0;
        for bucket in 0..new_buckets {
            let count: i32 = r.decode("bucket size")?;
            if count < 0 {
                return Err(r.corrupt(format!("bucket {bucket} has negative size {count}")));
            }
            for _ in 0..count {
                let index: i32 = r.decode("bucket entry")?;
                match u32::try_from(index) {
                    Ok(index) if index < n_new => bucket_entries.push(BucketEntry { bucket, index }),
                    _ => dropped_bucket_entries += 1,
                }
            }
        }

        let asmap_checksum = if format >= FORMAT_ASMAP {
            Some(r.decode("asmap checksum")?)
        } else {
            None
        };

        let computed = sha256d(r.consumed());
        let checksum: [u8; 32] = r.decode("checksum")?;
        if verify_checksum && computed != checksum {
            return Err(PeersError::ChecksumMismatch {
                expected: data_encoding::HEXLOWER.encode(&checksum),
                actual: data_encoding::HEXLOWER.encode(&computed),
            });
        }

        Ok(Self {
            path: path.to_owned(),
            magic,
            network: Network::from_magic(magic),
            format,
            compat,
            key,
            new,
            tried,
            new_buckets,
            bucket_entries,
            dropped_bucket_entries,
            asmap_checksum,
            checksum,
        })
    }

    /// Lowest reader format able to decode this file.
    #[must_use]
    pub fn lowest_compatible(&self) -> u8 {
        self.compat.saturating_sub(INCOMPATIBILITY_BASE)
    }

    /// Human name of the serialization format.
    #[must_use]
    pub fn format_name(&self) -> &'static str {
        match self.format {
            0 => "historical",
            1 => "deterministic",
            2 => "asmap",
            3 => "bip155",
            4 => "multiport",
            _ => "future",
        }
    }

    /// Number of distinct new buckets holding at least one entry.
    #[must_use]
    pub fn occupied_buckets(&self) -> usize {
        let mut buckets: Vec<u32> = self.bucket_entries.iter().map(|e| e.bucket).collect();
        buckets.sort_unstable();
        buckets.dedup();
        buckets.len()
    }

    /// New-table records that no bucket slot points at.
    #[must_use]
    pub fn unbucketed_new(&self) -> usize {
        let mut referenced = vec![false; self.new.len()];
        for entry in &self.bucket_entries {
            if let Some(slot) = usize::try_from(entry.index)
                .ok()
                .and_then(|i| referenced.get_mut(i))
            {
                *slot = true;
            }
        }
        referenced.iter().filter(|r| !**r).count()
    }

    /// All peer addresses as `host:port`, new table first.
    #[must_use]
    pub fn addresses(&self, only: Option<Table>) -> Vec<String> {
        self.records(only).map(|(_, info)| info.address()).collect()
    }

    /// Records tagged with their table, new table first.
    ///
    /// `only` restricts the iteration to a single table.
    pub fn records(&self, only: Option<Table>) -> impl Iterator<Item = (Table, &AddrInfo)> {
        let include = move |t: Table| only.is_none_or(|o| o == t);
        let new = self
            .new
            .iter()
            .filter(move |_| include(Table::New))
            .map(|i| (Table::New, i));
        let tried = self
            .tried
            .iter()
            .filter(move |_| include(Table::Tried))
            .map(|i| (Table::Tried, i));
        new.chain(tried)
    }
}

fn read_records(
    r: &mut ByteReader<'_>,
    count: u32,
    stream_addrv2: bool,
) -> Result<Vec<AddrInfo>, PeersError> {
    (0..count).map(|_| AddrInfo::read(r, stream_addrv2)).collect()
}

/// Double SHA-256, in the byte order peers.dat stores it.
#[must_use]
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    bitcoin::hashes::sha256d::Hash::hash(data).to_byte_array()
}
