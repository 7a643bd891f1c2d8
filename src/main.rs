//! rewikit: inspect layered application configuration
//!
//! Loads the default config, the discovered or given config file, its imports
//! and any extra files, then prints the merged result or a single value.

use anyhow::Result;

mod cli;

fn main() -> Result<()> {
    cli::run()
}
