//! Show command implementation

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use super::utils::LoadArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Toml,
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Also print files loaded and problems skipped
    #[arg(long)]
    pub report: bool,
}

pub fn run(args: ShowArgs) -> Result<()> {
    let handler = args.load.load();
    let value = handler.namespace().to_value();

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&value)?,
        OutputFormat::Yaml => serde_yaml::to_string(&value)?,
        OutputFormat::Toml => {
            toml::to_string_pretty(&value).context("Merged config cannot be expressed as TOML")?
        }
    };
    println!("{}", rendered.trim_end());

    if args.report {
        println!();
        println!("Loaded files:");
        for file in handler.loaded_files() {
            println!("  {}", file.display());
        }
        if !handler.diagnostics().is_empty() {
            println!("Skipped:");
            for diag in handler.diagnostics() {
                println!("  [{}] {}: {}", diag.kind, diag.path.display(), diag.message);
            }
        }
    }

    Ok(())
}
