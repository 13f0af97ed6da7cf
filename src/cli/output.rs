/// Output formatting: JSON, table and text report modes.
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use comfy_table::{Cell, Table, presets::UTF8_BORDERS_ONLY};
use serde::Serialize;

use super::args::OutputFormat;
use crate::peers::PeersError;
use crate::types::{AddrInfoOutput, ErrorOutput, PeersDbOutput};

/// Columns available for table output, in display order.
pub const TABLE_FIELDS: &[&str] = &[
    "address",
    "network",
    "table",
    "services",
    "time",
    "last_success",
    "attempts",
    "source",
];

/// Output context passed to all formatters.
pub struct OutputCtx {
    pub format: OutputFormat,
    pub fields: Option<Vec<String>>,
    pub no_header: bool,
    /// When true, print phase timing to stderr.
    pub debug: bool,
}

impl OutputCtx {
    /// Construct from CLI args.
    #[must_use]
    pub fn new(format: OutputFormat, fields: Option<&str>, no_header: bool, debug: bool) -> Self {
        let fields = fields.map(|f| {
            f.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase)
                .collect()
        });
        Self {
            format,
            fields,
            no_header,
            debug,
        }
    }

    /// Start a named debug timer. Prints elapsed on drop only when `--debug` is set.
    #[must_use]
    pub fn timer(&self, label: &'static str) -> DebugTimer {
        DebugTimer::new(label, self.debug)
    }

    /// Print a `[debug]` line to stderr when `--debug` is set.
    pub fn debug_note(&self, message: impl std::fmt::Display) {
        if self.debug {
            eprintln!("[debug] {message}");
        }
    }

    /// Whether a field should be included in output.
    fn include_field(&self, name: &str) -> bool {
        self.fields
            .as_ref()
            .is_none_or(|f| f.iter().any(|n| n == name))
    }
}

// --- Text destination ---

/// Where `text` output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextTarget {
    Stdout,
    /// Appended to, created if missing.
    File(PathBuf),
}

impl TextTarget {
    /// Pick the target from `--out`, falling back to `default_file`.
    #[must_use]
    pub fn resolve(out: Option<&Path>, default_file: &str) -> Self {
        match out {
            Some(p) if p.as_os_str() == "-" => Self::Stdout,
            Some(p) => Self::File(p.to_owned()),
            None => Self::File(PathBuf::from(default_file)),
        }
    }

    /// Write `content` in one go.
    ///
    /// # Errors
    ///
    /// Returns `PeersError::Write` if the file cannot be opened or written.
    pub fn write(&self, content: &str) -> Result<(), PeersError> {
        match self {
            Self::Stdout => {
                print!("{content}");
                Ok(())
            }
            Self::File(path) => {
                let to_err = |source| PeersError::Write {
                    path: path.clone(),
                    source,
                };
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(to_err)?;
                file.write_all(content.as_bytes()).map_err(to_err)?;
                file.flush().map_err(to_err)
            }
        }
    }
}

// --- Address-only output ---

/// Write the address list to stdout, or to `target` in text mode.
///
/// # Errors
///
/// Returns `PeersError::Json` if serialization fails, or
/// `PeersError::Write` if the text target cannot be written.
pub fn write_addresses(
    addresses: &[String],
    ctx: &OutputCtx,
    target: &TextTarget,
) -> Result<(), PeersError> {
    match ctx.format {
        OutputFormat::Json => print_compact_json(addresses),
        OutputFormat::Pretty => print_json(addresses),
        OutputFormat::Ndjson => print_ndjson(addresses),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            if !ctx.no_header {
                table.set_header(["ADDRESS"]);
            }
            for address in addresses {
                table.add_row([address.as_str()]);
            }
            println!("{table}");
            Ok(())
        }
        OutputFormat::Text => {
            target.write(&render_addresses_text(addresses))?;
            if let TextTarget::File(path) = target {
                eprintln!("Wrote {} addresses to {}", addresses.len(), path.display());
            }
            Ok(())
        }
    }
}

/// One address per line.
#[must_use]
fn render_addresses_text(addresses: &[String]) -> String {
    let mut out = String::new();
    for address in addresses {
        out.push_str(address);
        out.push('\n');
    }
    out
}

// --- Full database output ---

/// Write the whole database to stdout, or to `target` in text mode.
///
/// # Errors
///
/// Returns `PeersError::Json` if serialization fails, or
/// `PeersError::Write` if the text target cannot be written.
pub fn write_db(
    db: &PeersDbOutput,
    ctx: &OutputCtx,
    target: &TextTarget,
) -> Result<(), PeersError> {
    match ctx.format {
        OutputFormat::Json => print_compact_json(db),
        OutputFormat::Pretty => print_json(db),
        OutputFormat::Ndjson => {
            let records: Vec<&AddrInfoOutput> =
                db.new_addr_info.iter().chain(&db.tried_addr_info).collect();
            print_ndjson(&records)
        }
        OutputFormat::Table => {
            print!("{}", render_summary(db));
            println!();
            let records: Vec<&AddrInfoOutput> =
                db.new_addr_info.iter().chain(&db.tried_addr_info).collect();
            write_records_table(&records, ctx);
            Ok(())
        }
        OutputFormat::Text => {
            target.write(&render_db_text(db))?;
            if let TextTarget::File(path) = target {
                eprintln!(
                    "Wrote {} records to {}",
                    db.new_addr_info.len() + db.tried_addr_info.len(),
                    path.display()
                );
            }
            Ok(())
        }
    }
}

fn render_summary(db: &PeersDbOutput) -> String {
    let network = db.network.as_deref().unwrap_or("unknown");
    format!(
        "Path:      {}\n\
         Network:   {network} (0x{})\n\
         Format:    {} (lowest compatible {})\n\
         Addresses: {} new, {} tried\n\
         Buckets:   {} new buckets, {} occupied, {} entries\n",
        db.path,
        db.message_bytes,
        db.version,
        db.lowest_compatible,
        db.n_new,
        db.n_tried,
        db.new_buckets,
        db.occupied_buckets,
        db.bucket_entries,
    )
}

fn write_records_table(records: &[&AddrInfoOutput], ctx: &OutputCtx) {
    let columns: Vec<&str> = TABLE_FIELDS
        .iter()
        .copied()
        .filter(|f| ctx.include_field(f))
        .collect();

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    if !ctx.no_header {
        let headers: Vec<Cell> = columns
            .iter()
            .map(|c| Cell::new(c.replace('_', " ").to_uppercase()))
            .collect();
        table.set_header(headers);
    }

    for record in records {
        let row: Vec<Cell> = columns
            .iter()
            .map(|c| Cell::new(record_field(record, c)))
            .collect();
        table.add_row(row);
    }

    println!("{table}");
}

fn record_field(record: &AddrInfoOutput, field: &str) -> String {
    match field {
        "address" => record.address.clone(),
        "network" => record.network.clone(),
        "table" => record.table.clone(),
        "services" => record.service_flags.join(","),
        "time" => record.time_rfc3339.clone(),
        "last_success" => crate::peers::format_timestamp(record.last_success)
            .unwrap_or_else(|| "never".to_owned()),
        "attempts" => record.attempts.to_string(),
        "source" => record.source.clone(),
        _ => String::new(),
    }
}

/// The plain-text report: header block, new records, then tried records.
#[must_use]
fn render_db_text(db: &PeersDbOutput) -> String {
    let mut out = format!(
        "bitpeers\n\
         --------\n\
         Path: {}\n\
         MessageBytes: 0x{}\n\
         Version: {}\n\
         KeySize: {}\n\
         NKey: {}\n\
         NNew: {}\n\
         NTried: {}\n\
         NewBuckets: {}\n\n",
        db.path,
        db.message_bytes,
        db.version,
        db.key_size,
        db.n_key,
        db.n_new,
        db.n_tried,
        db.new_buckets,
    );

    for record in &db.new_addr_info {
        out.push_str(&record.text_line());
        out.push('\n');
    }
    out.push_str("Tried Addresses:\n");
    for record in &db.tried_addr_info {
        out.push_str(&record.text_line());
        out.push('\n');
    }
    out
}

// --- Error output ---

/// Write a structured error to stderr.
pub fn write_error(err: &ErrorOutput, format: OutputFormat) {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    if format.is_json() {
        let s = serde_json::to_string(err).unwrap_or_default();
        let _ = writeln!(out, "{s}");
    } else {
        let _ = writeln!(out, "Error: {}", err.error.message);
    }
}

// --- Debug timer ---

/// A RAII timer that prints elapsed milliseconds to stderr on drop.
///
/// Created via [`OutputCtx::timer`]. Does nothing when `debug` is false.
pub struct DebugTimer {
    label: &'static str,
    start: std::time::Instant,
    active: bool,
}

impl DebugTimer {
    #[must_use]
    fn new(label: &'static str, active: bool) -> Self {
        Self {
            label,
            start: std::time::Instant::now(),
            active,
        }
    }
}

impl Drop for DebugTimer {
    fn drop(&mut self) {
        if self.active {
            let ms = self.start.elapsed().as_secs_f64() * 1000.0;
            eprintln!("[debug] {}: {ms:.2}ms", self.label);
        }
    }
}

// --- Generic JSON helpers ---

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), PeersError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_compact_json<T: Serialize + ?Sized>(value: &T) -> Result<(), PeersError> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn print_ndjson<T: Serialize>(values: &[T]) -> Result<(), PeersError> {
    for v in values {
        println!("{}", serde_json::to_string(v)?);
    }
    Ok(())
}
