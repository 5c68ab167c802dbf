//! Config command - configuration inspection.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration as TOML
    Show,

    /// Show which config file was loaded
    Path,
}

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => {
            print!("{}", ctx.config.config.to_toml()?);
        }
        ConfigCommand::Path => match &ctx.config.source {
            Some(path) => println!("{}", path.display()),
            None => {
                println!("(defaults)");
                if ctx.verbose {
                    if let Some(user) = crate::config::user_config_path() {
                        println!("user config would be read from {}", user.display());
                    }
                }
            }
        },
    }
    Ok(())
}
