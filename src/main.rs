// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use tracing::debug;
use url_markdown::cli::{execute, Cli};
use url_markdown::logging::init_logging;
use url_markdown::version;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Logs go to stderr; stdout carries the document
    init_logging(None)?;

    let cli = Cli::parse();
    debug!("{}", version::get_version_string());

    match execute(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
