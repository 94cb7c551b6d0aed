use anyhow::{Context, Result};
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::RagError;
use crate::chat::Message;
use crate::completion::RelayState;
use crate::config::{Config, PINECONE_API_KEY_VAR, resolve_config_dir};
use crate::index::{PineconeClient, Provisioned, ensure_index};
use crate::pipeline::{ConfiguredProviders, ProviderFactory};

/// Load configuration from the given directory, or the default one
#[inline]
pub fn load_config(config_dir: Option<PathBuf>) -> Result<Arc<Config>> {
    let dir = resolve_config_dir(config_dir)?;
    let config = Config::load(&dir)
        .with_context(|| format!("Failed to load configuration from {}", dir.display()))?;
    Ok(Arc::new(config))
}

/// Run the HTTP chat service until interrupted
#[inline]
pub async fn serve(config_dir: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_dir)?;
    info!(
        "Starting chat service (chat model {}, index {})",
        config.openai.chat_model, config.pinecone.index_name
    );
    crate::server::serve(config).await
}

/// Answer a single question, printing the answer as it streams in
#[inline]
pub async fn ask(config_dir: Option<PathBuf>, question: String) -> Result<()> {
    let config = load_config(config_dir)?;
    let pipeline = ConfiguredProviders::new(config)
        .pipeline()
        .context("Failed to set up providers")?;

    let mut relay = pipeline
        .answer(&[Message::user(question)])
        .await
        .context("Failed to start answer")?;

    let mut stdout = std::io::stdout();
    while let Some(fragment) = relay.next().await {
        match fragment {
            Ok(text) => {
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
            Err(e) => {
                writeln!(stdout)?;
                error!("Answer stream failed: {}", e);
                return Err(e).context("Answer was cut short");
            }
        }
    }
    writeln!(stdout)?;

    if relay.state() == RelayState::Completed {
        info!("Streamed {} fragments", relay.forwarded());
    }

    Ok(())
}

/// Create the configured vector index if it does not exist yet
#[inline]
pub async fn provision(config_dir: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_dir)?;
    let api_key = std::env::var(PINECONE_API_KEY_VAR)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or(RagError::MissingCredential(PINECONE_API_KEY_VAR))?;

    let descriptor = config.pinecone.descriptor();
    let client = PineconeClient::new(&config.pinecone, api_key.trim())?;

    match ensure_index(&client, &descriptor)
        .await
        .with_context(|| format!("Failed to provision index {}", descriptor.name))?
    {
        Provisioned::Created => println!(
            "Created index {} ({} dimensions, {} metric, {}/{})",
            descriptor.name, descriptor.dimension, descriptor.metric, descriptor.cloud, descriptor.region
        ),
        Provisioned::Existing => println!("Index {} already exists", descriptor.name),
    }

    Ok(())
}
