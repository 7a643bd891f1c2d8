//! Get command implementation

use anyhow::Result;
use clap::Args;

use super::utils::{render_scalar, LoadArgs};
use rewikit::config::Entry;

#[derive(Args)]
pub struct GetArgs {
    /// Dotted key to print (e.g. database.host)
    #[arg(value_name = "KEY")]
    pub key: String,

    #[command(flatten)]
    pub load: LoadArgs,
}

pub fn run(args: GetArgs) -> Result<()> {
    let handler = args.load.load();

    match handler.get(&args.key) {
        Ok(Entry::Value(value)) => println!("{}", render_scalar(value)),
        Ok(Entry::Namespace(ns)) => println!("{}", serde_json::to_string_pretty(&ns.to_value())?),
        Err(_) => anyhow::bail!("key not found: {}", args.key),
    }

    Ok(())
}
