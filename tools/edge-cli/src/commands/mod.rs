//! CLI command implementations.

pub mod config;
pub mod inspect;
pub mod resolve;

use clap::{Args, Subcommand};

/// Arguments for the resolve command.
#[derive(Args)]
pub struct ResolveArgs {
    /// Sections to resolve. They are loaded concurrently and share one batch.
    #[arg(required = true)]
    pub sections: Vec<String>,

    /// Marker in `name=value` form. Repeatable.
    #[arg(short, long = "marker", value_name = "NAME=VALUE")]
    pub markers: Vec<String>,

    /// Override the debounce window in milliseconds.
    #[arg(long)]
    pub debounce_ms: Option<u64>,
}

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Section to inspect.
    pub section: String,

    /// Marker in `name=value` form, to check whether the entry would be served. Repeatable.
    #[arg(short, long = "marker", value_name = "NAME=VALUE")]
    pub markers: Vec<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
