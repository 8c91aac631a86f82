use anyhow::{Context, Result};
use clap::Parser;
use relink_core::config::{parse_list, FileConfig};
use relink_core::http_service::HttpDocumentService;
use relink_core::{run_job, JobOutcome, RenameJob, Settings};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Rename a wiki title by rewriting every document that links to it.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Opts {
    /// Path to the TOML config file.
    #[arg(long, default_value = "relink.toml", env = "RELINK_CONFIG")]
    config: PathBuf,

    /// Title being renamed.
    #[arg(long)]
    old: String,

    /// Title links should point at afterwards.
    #[arg(long)]
    new: String,

    /// Give bare links the old title as display text so readers see no change.
    #[arg(long)]
    keep_alias: bool,

    /// Comma-separated namespaces to search, overriding the config file.
    #[arg(long)]
    namespaces: Option<String>,

    #[arg(long)]
    domain: Option<String>,

    /// API token, overriding the config file.
    #[arg(long, env = "RELINK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Document whose discussion status stops the bot.
    #[arg(long)]
    watch_document: Option<String>,
}

impl Opts {
    /// Config file contents with command-line overrides applied.
    fn file_config(&self) -> Result<FileConfig> {
        let mut config = if self.config.exists() {
            FileConfig::load(&self.config)?
        } else {
            tracing::warn!(
                "Config file {} not found, using command-line settings only",
                self.config.display()
            );
            FileConfig::default()
        };

        if let Some(namespaces) = &self.namespaces {
            config.namespaces = parse_list(namespaces);
        }
        if let Some(domain) = &self.domain {
            config.domain = Some(domain.clone());
        }
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        if let Some(watch_document) = &self.watch_document {
            config.watch_document = Some(watch_document.clone());
        }
        Ok(config)
    }
}

async fn run(opts: Opts) -> Result<ExitCode> {
    let settings = Settings::from_file_config(opts.file_config()?)
        .context("invalid configuration")?;
    let job = RenameJob::new(&settings, &opts.old, &opts.new, opts.keep_alias)?;
    let service = Arc::new(
        HttpDocumentService::new(&settings).context("failed to create HTTP client")?,
    );

    let outcome = tokio::select! {
        outcome = run_job(service, &settings, &job) => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, an edit in flight may or may not have been saved");
            return Ok(ExitCode::from(130));
        }
    };

    if let Some(report) = outcome.report() {
        tracing::info!("{}", report);
    }

    Ok(match outcome {
        JobOutcome::Completed(_) => {
            tracing::info!("All backlinks processed.");
            ExitCode::SUCCESS
        }
        JobOutcome::WatchSatisfied(_) => {
            tracing::info!("Stopped: discussion on '{}' is normal.", settings.watch_document);
            ExitCode::SUCCESS
        }
        JobOutcome::WatchFailed(e, _) => {
            tracing::error!("Stopped: could not check discussion status: {}", e);
            ExitCode::FAILURE
        }
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opts = Opts::parse();
    match run(opts).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}
