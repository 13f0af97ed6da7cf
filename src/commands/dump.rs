/// Full dump: header fields plus every new and tried record.
use crate::cli::output::{TextTarget, write_db};
use crate::cli::{Cli, OutputCtx};
use crate::peers::{PeersDb, PeersError};
use crate::types::PeersDbOutput;

/// Default file for the text report.
pub const DEFAULT_TEXT_FILE: &str = "out.txt";

/// Run `bitpeers` without `--addressonly`.
///
/// # Errors
///
/// Returns `PeersError::Write` if the text destination cannot be written,
/// or `PeersError::Json` on serialization failure.
pub fn run(db: &PeersDb, cli: &Cli, ctx: &OutputCtx) -> Result<(), PeersError> {
    let output = PeersDbOutput::from_db(db, cli.only.table());

    let _t_render = ctx.timer("render");
    let target = TextTarget::resolve(cli.out.as_deref(), DEFAULT_TEXT_FILE);
    write_db(&output, ctx, &target)
}
