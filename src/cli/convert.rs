// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::fetch::StrategyKind;
use crate::pipeline::Converter;

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Absolute URL of the page to convert
    pub url: String,

    /// TOML configuration file
    #[arg(long, env = "URL_MARKDOWN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Comma-separated strategies to use, in order (http, stealth, browser, remote-browser)
    #[arg(long, value_delimiter = ',')]
    pub strategy: Vec<StrategyKind>,

    /// Render the whole document instead of its main content
    #[arg(long)]
    pub raw: bool,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print the conversion as JSON (markdown, title, degraded)
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// TOML configuration file
    #[arg(long, env = "URL_MARKDOWN_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Build the effective configuration for a command
pub fn load_config(path: Option<&PathBuf>, strategies: &[StrategyKind]) -> Result<AppConfig> {
    let mut config = AppConfig::load(path.map(PathBuf::as_path))
        .context("Failed to load configuration")?;
    if !strategies.is_empty() {
        config.fetch.select_strategies(strategies);
        config.validate().context("Invalid strategy selection")?;
    }
    Ok(config)
}

pub async fn convert(args: ConvertArgs) -> Result<()> {
    let url = url::Url::parse(&args.url)
        .with_context(|| format!("Not an absolute URL: {}", args.url))?;
    let config = load_config(args.config.as_ref(), &args.strategy)?;

    let converter = Converter::from_config(&config)?.skip_extraction(args.raw);
    let cancel = CancellationToken::new();

    if let Some(secs) = args.timeout_secs {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!("Giving up after {}s", secs);
            token.cancel();
        });
    }
    {
        let token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, cancelling");
                token.cancel();
            }
        });
    }

    let conversion = converter
        .convert_with_cancel(url.as_str(), &cancel)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&conversion)?);
    } else {
        println!("{}", conversion.markdown);
    }
    Ok(())
}

pub fn show_config(args: ConfigArgs) -> Result<()> {
    let config = load_config(args.config.as_ref(), &[])?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
