#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! bitpeers — dump Bitcoin peers.dat address databases.

mod cli;
mod commands;
mod peers;
mod types;

use clap::Parser;

use cli::{Cli, OutputCtx, write_error};
use types::ErrorOutput;

fn main() {
    let cli = Cli::parse();

    let ctx = OutputCtx::new(cli.format, cli.fields.as_deref(), cli.no_header, cli.debug);

    match commands::dispatch(&cli, &ctx) {
        Ok(()) => {}
        Err(err) => {
            let error_output = ErrorOutput::from_peers_error(&err);
            write_error(&error_output, cli.format);
            std::process::exit(err.exit_code());
        }
    }
}
