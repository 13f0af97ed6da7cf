/// CLI layer: flag parsing and rendering of decoded databases.
pub mod args;
pub mod output;

pub use args::{Cli, OutputFormat};
pub use output::{OutputCtx, write_error};
