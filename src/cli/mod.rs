// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod convert;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// URL to Markdown converter
#[derive(Parser, Debug)]
#[command(name = "url-markdown")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Fetch a web page and print its main content as Markdown", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a page to Markdown
    Convert(convert::ConvertArgs),

    /// Print the effective configuration as TOML
    Config(convert::ConfigArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert(args) => convert::convert(args).await,
        Commands::Config(args) => convert::show_config(args),
    }
}
