/// CLI argument definitions via clap derive.
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::peers::Table;

/// bitpeers — inspect a Bitcoin peers.dat address database.
#[derive(Debug, Parser)]
#[command(
    name = "bitpeers",
    about = "Dump a Bitcoin peers.dat address database as JSON or text",
    version
)]
pub struct Cli {
    /// Path to peers.dat.
    #[arg(short = 'f', long, value_name = "PATH")]
    pub filepath: Option<String>,

    /// Output format.
    #[arg(long, value_name = "FORMAT", default_value = "json")]
    pub format: OutputFormat,

    /// Output only peer addresses (new table first, then tried).
    #[arg(long, visible_alias = "address-only")]
    pub addressonly: bool,

    /// Destination for `text` output, appended to. `-` writes to stdout.
    /// Defaults to `out.txt`, or `IP.txt` with `--addressonly`.
    /// Only valid with `--format text`.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Only include records from one address table.
    #[arg(long, value_name = "TABLE", default_value = "all")]
    pub only: OnlyTable,

    /// Comma-separated columns to include in table output (projection).
    /// Available: address, network, table, services, time, last_success, attempts, source.
    #[arg(long, value_name = "FIELDS")]
    pub fields: Option<String>,

    /// Omit table headers (useful for awk/cut processing).
    #[arg(long)]
    pub no_header: bool,

    /// Decode even if the trailing checksum does not match.
    #[arg(long)]
    pub skip_checksum: bool,

    /// Print phase timing to stderr for debugging.
    #[arg(long)]
    pub debug: bool,
}

/// Output format variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Compact single-line JSON.
    #[default]
    Json,
    /// Pretty-printed JSON.
    Pretty,
    /// Newline-delimited JSON (one record per line).
    Ndjson,
    /// Aligned table with headers (human-readable).
    Table,
    /// Plain-text report appended to a file.
    Text,
}

impl OutputFormat {
    /// Whether errors should be reported as a JSON envelope.
    #[must_use]
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json | Self::Pretty | Self::Ndjson)
    }
}

/// `--only` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OnlyTable {
    #[default]
    All,
    New,
    Tried,
}

impl OnlyTable {
    /// The single table to restrict to, if any.
    #[must_use]
    pub fn table(self) -> Option<Table> {
        match self {
            Self::All => None,
            Self::New => Some(Table::New),
            Self::Tried => Some(Table::Tried),
        }
    }
}
