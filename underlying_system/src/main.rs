use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{error, info};
use underlying_system::config::settings::Settings;
use underlying_system::logging::init_logging;
use underlying_system::tags::structures::BlockId;
use underlying_system::{Result, TagEngine};

/// Load the tag configuration and print a snapshot of every tag as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Tag configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Only print the tags of this block
    #[arg(long)]
    block: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() {
    init_logging(None);
    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("tagdump failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let settings = Settings::load(&args.config)?;
    info!(
        "Configuration loaded: {} blocks, {} tags",
        settings.blocks.len(),
        settings.tags.len()
    );

    let engine = TagEngine::new();
    settings.populate(&engine)?;

    let snapshots = match &args.block {
        Some(block) => engine.snapshot_block(&BlockId::from(block.as_str()))?,
        None => engine.snapshot_all(),
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&snapshots)?
    } else {
        serde_json::to_string(&snapshots)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    Ok(())
}
