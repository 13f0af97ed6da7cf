/// Address-only output: every peer as `host:port`, new table first.
use crate::cli::output::{TextTarget, write_addresses};
use crate::cli::{Cli, OutputCtx};
use crate::peers::{PeersDb, PeersError};

/// Default file for address-only text output.
pub const DEFAULT_TEXT_FILE: &str = "IP.txt";

/// Run `bitpeers --addressonly`.
///
/// # Errors
///
/// Returns `PeersError::Write` if the text destination cannot be written,
/// or `PeersError::Json` on serialization failure.
pub fn run(db: &PeersDb, cli: &Cli, ctx: &OutputCtx) -> Result<(), PeersError> {
    let addresses = db.addresses(cli.only.table());

    let _t_render = ctx.timer("render");
    let target = TextTarget::resolve(cli.out.as_deref(), DEFAULT_TEXT_FILE);
    write_addresses(&addresses, ctx, &target)
}
