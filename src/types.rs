/// Shared serializable output types.
///
/// These types are what gets written to stdout, either as JSON or rendered
/// as text/table. They are decoupled from the decoder's `PeersDb` / `AddrInfo`.
use serde::{Deserialize, Serialize};

use crate::peers::{AddrInfo, PeersDb, PeersError, Table, format_time, format_timestamp};

/// The whole database, as printed by the full dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeersDbOutput {
    /// Path the database was read from.
    pub path: String,
    /// Message-start (magic) bytes, hex.
    pub message_bytes: String,
    /// Chain recognized from the magic bytes, or null.
    pub network: Option<String>,
    /// Serialization format byte.
    pub version: u8,
    /// Raw compatibility byte (the key size in legacy files).
    pub key_size: u8,
    /// Lowest reader format able to decode the file.
    pub lowest_compatible: u8,
    /// Bucketing key, hex.
    pub n_key: String,
    /// Number of new-table records.
    pub n_new: usize,
    /// Number of tried-table records.
    pub n_tried: usize,
    /// Number of new buckets.
    pub new_buckets: u32,
    /// Number of occupied new-table bucket slots.
    pub bucket_entries: usize,
    /// Number of new buckets holding at least one entry.
    pub occupied_buckets: usize,
    /// Asmap checksum, hex (format 2 and later).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asmap_checksum: Option<String>,
    /// Trailing SHA256d, hex.
    pub checksum: String,
    /// New-table records.
    pub new_addr_info: Vec<AddrInfoOutput>,
    /// Tried-table records.
    pub tried_addr_info: Vec<AddrInfoOutput>,
}

/// One peer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddrInfoOutput {
    /// `new` or `tried`.
    pub table: String,
    /// `host:port`.
    pub address: String,
    pub host: String,
    pub port: u16,
    /// Network class (`ipv4`, `ipv6`, `onion`, `i2p`, `cjdns`, ...).
    pub network: String,
    /// Raw service bits.
    pub services: u64,
    /// Names of the set service bits.
    pub service_flags: Vec<String>,
    /// Last seen (unix seconds).
    pub time: u32,
    /// Last seen, RFC 3339 (the epoch when zero).
    pub time_rfc3339: String,
    /// Address that relayed this peer to us.
    pub source: String,
    /// Last successful connection (unix seconds, 0 = never).
    pub last_success: i64,
    /// Connection attempts since the last success.
    pub attempts: i32,
}

impl AddrInfoOutput {
    #[must_use]
    pub fn from_record(table: Table, info: &AddrInfo) -> Self {
        Self {
            table: table.name().to_owned(),
            address: info.address(),
            host: info.addr.to_string(),
            port: info.port,
            network: info.addr.network().to_owned(),
            services: info.services.to_u64(),
            service_flags: info.service_flags(),
            time: info.time,
            time_rfc3339: format_time(info.time),
            source: info.source.to_string(),
            last_success: info.last_success,
            attempts: info.attempts,
        }
    }

    /// Single-line rendering used by the text report.
    #[must_use]
    pub fn text_line(&self) -> String {
        let flags = if self.service_flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", self.service_flags.join("|"))
        };
        let last_success = format_timestamp(self.last_success);
        format!(
            "{} services=0x{:016x}{flags} time={} source={} last_success={} attempts={}",
            self.address,
            self.services,
            self.time_rfc3339,
            self.source,
            last_success.as_deref().unwrap_or("never"),
            self.attempts,
        )
    }
}

impl PeersDbOutput {
    /// Build from a decoded database, keeping only records of `only` when set.
    #[must_use]
    pub fn from_db(db: &PeersDb, only: Option<Table>) -> Self {
        let mut new_addr_info = Vec::new();
        let mut tried_addr_info = Vec::new();
        for (table, info) in db.records(only) {
            let out = AddrInfoOutput::from_record(table, info);
            match table {
                Table::New => new_addr_info.push(out),
                Table::Tried => tried_addr_info.push(out),
            }
        }
        Self {
            path: db.path.display().to_string(),
            message_bytes: hex(&db.magic),
            network: db.network.map(|n| n.name().to_owned()),
            version: db.format,
            key_size: db.compat,
            lowest_compatible: db.lowest_compatible(),
            n_key: hex(&db.key),
            n_new: db.new.len(),
            n_tried: db.tried.len(),
            new_buckets: db.new_buckets,
            bucket_entries: db.bucket_entries.len(),
            occupied_buckets: db.occupied_buckets(),
            asmap_checksum: db.asmap_checksum.as_ref().map(|c| hex(c)),
            checksum: hex(&db.checksum),
            new_addr_info,
            tried_addr_info,
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    data_encoding::HEXLOWER.encode(bytes)
}

/// A structured error envelope for JSON error output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorOutput {
    /// Always `false`.
    pub ok: bool,
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail in the JSON error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (snake_case).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorOutput {
    /// Construct from a `PeersError`.
    #[must_use]
    pub fn from_peers_error(err: &PeersError) -> Self {
        Self {
            ok: false,
            error: ErrorDetail {
                code: err.code().to_owned(),
                message: err.to_string(),
            },
        }
    }
}
