// src/cli.rs
use crate::config::ClientConfig;
use crate::format::summarize;
use crate::history::{HistoryFilter, PresenceFilter};
use crate::services::AnalysisClient;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "carscan")]
#[command(about = "Vehicle damage detection client")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Service base URL. Overrides CARSCAN_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds. Overrides CARSCAN_TIMEOUT_SECS.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Longest side, in pixels, of the uploaded image. Overrides
    /// CARSCAN_MAX_IMAGE_DIMENSION.
    #[arg(long, global = true)]
    pub max_image_dimension: Option<u32>,

    /// Print records as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a photo for damage analysis.
    Analyze {
        image: PathBuf,
        #[arg(long)]
        user: String,
    },
    /// List previous analyses.
    History {
        #[arg(long)]
        user: String,
        /// Keep analyses with a finding whose location contains this text.
        #[arg(long, default_value = "")]
        search: String,
        /// all, damage or no-damage
        #[arg(long, default_value = "all")]
        filter: PresenceFilter,
    },
}

pub fn resolve_config(args: &Args) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("reading environment configuration")?;
    if let Some(url) = &args.api_url {
        config = config.with_api_url(url.clone());
    }
    if let Some(secs) = args.timeout_secs {
        anyhow::ensure!(secs > 0, "--timeout-secs must be positive");
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(px) = args.max_image_dimension {
        anyhow::ensure!(px > 0, "--max-image-dimension must be positive");
        config = config.with_max_image_dimension(px);
    }
    Ok(config)
}

pub async fn dispatch(args: Args) -> Result<()> {
    let config = resolve_config(&args)?;
    let client = AnalysisClient::new(&config)?;
    info!("Using damage detection service at {}", client.base_url());

    match &args.cmd {
        Command::Analyze { image, user } => {
            let analysis = client
                .submit_analysis(image, user)
                .await
                .with_context(|| format!("analyzing {}", image.display()))?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print!("{}", summarize(&analysis));
            }
        }
        Command::History {
            user,
            search,
            filter,
        } => {
            let history = client
                .fetch_history(user)
                .await
                .context("loading analysis history")?;
            let shown = HistoryFilter::new(search.clone(), *filter).apply(&history);

            if args.json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                let noun = if history.len() == 1 { "analysis" } else { "analyses" };
                println!("{} total {}, {} shown", history.len(), noun, shown.len());
                for analysis in shown {
                    println!();
                    print!("{}", summarize(analysis));
                }
            }
        }
    }

    Ok(())
}
