/// Command dispatch: validates arguments, loads the database, routes to a renderer.
pub mod addresses;
pub mod dump;

use std::path::Path;

use crate::cli::{Cli, OutputCtx, OutputFormat};
use crate::peers::{PeersDb, PeersError};

/// Dispatch the parsed command line to the address-only or full-dump handler.
///
/// # Errors
///
/// Returns `PeersError` on invalid arguments, decode failure, or write failure.
pub fn dispatch(cli: &Cli, ctx: &OutputCtx) -> Result<(), PeersError> {
    if cli.out.is_some() && cli.format != OutputFormat::Text {
        return Err(PeersError::InvalidArgument {
            message: "--out only applies to --format text".to_owned(),
        });
    }
    let db = load(cli, ctx)?;
    if cli.addressonly {
        addresses::run(&db, cli, ctx)
    } else {
        dump::run(&db, cli, ctx)
    }
}

/// Validate `--filepath` and decode the database it names.
fn load(cli: &Cli, ctx: &OutputCtx) -> Result<PeersDb, PeersError> {
    let path = match cli.filepath.as_deref() {
        Some(p) if !p.is_empty() => Path::new(p),
        other => {
            return Err(PeersError::InvalidPath {
                path: other.unwrap_or_default().to_owned(),
            });
        }
    };

    let t_decode = ctx.timer("decode");
    let db = if cli.skip_checksum {
        PeersDb::open_with(path, false)?
    } else {
        PeersDb::open(path)?
    };
    drop(t_decode);

    ctx.debug_note(format_args!(
        "format {} ({}), {} new ({} unbucketed), {} tried, {} bucket entries in {} buckets ({} dropped)",
        db.format,
        db.format_name(),
        db.new.len(),
        db.unbucketed_new(),
        db.tried.len(),
        db.bucket_entries.len(),
        db.occupied_buckets(),
        db.dropped_bucket_entries,
    ));
    Ok(db)
}
