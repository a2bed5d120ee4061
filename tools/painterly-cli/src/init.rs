//! Init command - write a default painterly.toml

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::settings::Settings;

/// Arguments for the init command
#[derive(Args)]
pub struct InitArgs {
    /// Where to write the settings file
    #[arg(short, long, default_value = "painterly.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Execute the init command
pub fn execute(args: InitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.output.display()
        );
    }

    let content = Settings::default_toml()?;
    std::fs::write(&args.output, content)
        .with_context(|| format!("Failed to write settings: {}", args.output.display()))?;

    println!("Created {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("painterly.toml");

        execute(InitArgs {
            output: output.clone(),
            force: false,
        })
        .unwrap();
        assert!(output.exists());

        let err = execute(InitArgs {
            output: output.clone(),
            force: false,
        })
        .unwrap_err();
        assert!(err.to_string().contains("already exists"));

        execute(InitArgs {
            output,
            force: true,
        })
        .unwrap();
    }
}
