use anyhow::Context;
use clap::{ArgAction, Parser};
use slicemarker::Config;
use slicemarker::engine::replay::{self, Script};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "slicemarker")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("SLICEMARKER_GIT_HASH")))]
#[command(about = "Multi-tool annotation engine for volumetric scan slices")]
struct Cli {
    /// Replay a JSON interaction script headlessly over a synthetic volume
    #[arg(long, value_name = "SCRIPT")]
    replay: Option<PathBuf>,

    /// Directory to export selections, mask layers, and the final frame into
    #[arg(long, value_name = "DIR", requires = "replay")]
    out: Option<PathBuf>,

    /// Write a documented default config to ~/.config/slicemarker/config.toml
    #[arg(long, action = ArgAction::SetTrue)]
    init_config: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::debug!(
        "slicemarker {}+{}",
        env!("CARGO_PKG_VERSION"),
        env!("SLICEMARKER_GIT_HASH")
    );

    let cli = Cli::parse();

    if cli.init_config {
        let path = Config::create_default_file()?;
        println!("Created default config at {}", path.display());
        return Ok(());
    }

    if let Some(script_path) = cli.replay {
        let config = Config::load()?;

        let script_str = std::fs::read_to_string(&script_path)
            .with_context(|| format!("Failed to read script from {}", script_path.display()))?;
        let script: Script = serde_json::from_str(&script_str)
            .with_context(|| format!("Failed to parse script from {}", script_path.display()))?;

        let report = replay::run_script(&config, &script, cli.out.as_deref())?;
        println!(
            "replayed {} events: {} selections live, {} created, {} deleted",
            script.events.len(),
            report.selections,
            report.created,
            report.deleted
        );
        return Ok(());
    }

    // No flags: show usage
    println!("slicemarker: multi-tool annotation engine for volumetric scan slices");
    println!();
    println!("Usage:");
    println!("  slicemarker --replay <script.json>   Replay an interaction script headlessly");
    println!("  slicemarker --replay <s> --out <dir> ...and export selections, masks, and the frame");
    println!("  slicemarker --init-config            Write a documented default config file");
    println!("  slicemarker --help                   Show help");
    println!();
    println!("The engine is a library first: embed slicemarker::AnnotationSession in a host");
    println!("shell and feed it pointer, wheel, and explorer events directly.");

    Ok(())
}
