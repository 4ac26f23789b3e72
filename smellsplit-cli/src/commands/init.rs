use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use smellsplit_core::config::SplitConfig;

use super::DEFAULT_CONFIG;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the config file
    #[arg(long, default_value = DEFAULT_CONFIG)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    if args.path.exists() && !args.force {
        anyhow::bail!(
            "Config already exists at {}. Use --force to overwrite.",
            args.path.display()
        );
    }

    let rendered = SplitConfig::default()
        .to_toml()
        .context("Cannot render default config")?;
    std::fs::write(&args.path, rendered)
        .with_context(|| format!("Cannot write config: {}", args.path.display()))?;

    println!("Wrote {}", args.path.display());
    Ok(())
}
