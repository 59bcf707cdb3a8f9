use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use client_core::{
    build_transport, load_settings, CredentialSource, DeploymentMode, FieldStore, StaticToken,
    SubmissionController, TransportKind,
};
use tracing_subscriber::EnvFilter;

/// Create an entry in a Moss garden.
#[derive(Parser, Debug)]
#[command(name = "moss")]
struct Args {
    #[arg(long)]
    title: String,
    #[arg(long)]
    content: String,
    /// 0/seed, 1/sprout or 2/bloom.
    #[arg(long, default_value = "0")]
    growth_stage: String,
    #[arg(long)]
    user_id: Option<String>,
    #[arg(long)]
    transport: Option<TransportKind>,
    /// Overrides the address chosen by the deployment mode.
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    production: bool,
    /// Bearer token; defaults to the configured credential source.
    #[arg(long)]
    token: Option<String>,
    /// Print the normalized request instead of sending it.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if args.production {
        settings.mode = DeploymentMode::Production;
    }
    if let Some(kind) = args.transport {
        settings.transport = kind;
    }
    if let Some(base_url) = args.base_url {
        settings.api_url_override = Some(base_url);
    }

    let fields = Arc::new(FieldStore::new());
    fields.set_field("title", &args.title)?;
    fields.set_field("content", &args.content)?;
    fields.set_field("growthStage", &args.growth_stage)?;
    if let Some(user_id) = &args.user_id {
        fields.set_field("userId", user_id)?;
    }

    if args.dry_run {
        let request = fields.draft().to_request()?;
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    let credentials: Arc<dyn CredentialSource> = match args.token {
        Some(token) => Arc::new(StaticToken::new(token)),
        None => settings.credential_source(),
    };
    let transport = build_transport(&settings, credentials)?;
    let controller = SubmissionController::new(transport, fields)
        .with_on_entry_created(|entry_id| println!("Last created entry ID: {entry_id}"));

    if let Err(err) = controller.submit().await {
        if !err.is_attempt_failure() {
            bail!(err.user_message());
        }
        let banner = controller
            .status()
            .banner()
            .unwrap_or_else(|| err.user_message());
        bail!(banner);
    }

    if let Some(banner) = controller.status().banner() {
        println!("{banner}");
    }
    Ok(())
}
