#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::Path;

use super::{
    Config, ConfigError, OPENAI_API_KEY_VAR, OpenAiConfig, PINECONE_API_KEY_VAR, PineconeConfig,
    ServerConfig,
};
use crate::index::Metric;

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 Prof RAG Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir)?;

    eprintln!("{}", style("Server").bold().yellow());
    configure_server(&mut config.server)?;

    eprintln!();
    eprintln!("{}", style("OpenAI").bold().yellow());
    eprintln!("Models used for query embeddings and streamed answers.");
    configure_openai(&mut config.openai)?;

    eprintln!();
    eprintln!("{}", style("Pinecone").bold().yellow());
    eprintln!("The index is created with these settings if it does not exist yet.");
    configure_pinecone(&mut config.pinecone)?;

    eprintln!();
    report_credentials();

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Server:").bold().yellow());
    match config.server.listen_addr() {
        Ok(addr) => eprintln!("  Listen: {}", style(addr).cyan()),
        Err(e) => eprintln!("  Listen: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!("{}", style("OpenAI:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.openai.base_url).cyan());
    eprintln!(
        "  Embedding model: {}",
        style(&config.openai.embedding_model).cyan()
    );
    eprintln!("  Chat model: {}", style(&config.openai.chat_model).cyan());
    eprintln!(
        "  Timeout: {}s",
        style(config.openai.timeout_seconds).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Pinecone:").bold().yellow());
    eprintln!(
        "  Controller URL: {}",
        style(&config.pinecone.controller_url).cyan()
    );
    eprintln!("  Index: {}", style(&config.pinecone.index_name).cyan());
    eprintln!("  Namespace: {}", style(&config.pinecone.namespace).cyan());
    eprintln!("  Dimension: {}", style(config.pinecone.dimension).cyan());
    eprintln!("  Metric: {}", style(config.pinecone.metric).cyan());
    eprintln!(
        "  Serverless: {} / {}",
        style(&config.pinecone.cloud).cyan(),
        style(&config.pinecone.region).cyan()
    );

    eprintln!();
    report_credentials();

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config(config_dir: &Path) -> Result<Config> {
    Config::load(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No usable configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: config_dir.to_path_buf(),
                ..Config::default()
            })
        },
        Ok,
    )
}

fn report_credentials() {
    for name in [OPENAI_API_KEY_VAR, PINECONE_API_KEY_VAR] {
        if std::env::var(name).is_ok_and(|value| !value.trim().is_empty()) {
            eprintln!("  {} {}", style("✓").green(), name);
        } else {
            eprintln!(
                "  {} {} is not set; requests will fail until it is",
                style("⚠").yellow(),
                name
            );
        }
    }
}

fn configure_server(server: &mut ServerConfig) -> Result<()> {
    let host: String = Input::new()
        .with_prompt("Listen host")
        .default(server.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            ServerConfig {
                host: input.clone(),
                port: server.port,
            }
            .validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Listen port")
        .default(server.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    server.host = host;
    server.port = port;
    Ok(())
}

fn configure_openai(openai: &mut OpenAiConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("API base URL")
        .default(openai.base_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            OpenAiConfig {
                base_url: input.clone(),
                ..openai.clone()
            }
            .validate()
        })
        .interact_text()?;

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(openai.embedding_model.clone())
        .validate_with(non_empty)
        .interact_text()?;

    let chat_model: String = Input::new()
        .with_prompt("Chat model")
        .default(openai.chat_model.clone())
        .validate_with(non_empty)
        .interact_text()?;

    openai.base_url = base_url;
    openai.embedding_model = embedding_model;
    openai.chat_model = chat_model;
    openai.validate()?;
    Ok(())
}

fn configure_pinecone(pinecone: &mut PineconeConfig) -> Result<()> {
    let index_name: String = Input::new()
        .with_prompt("Index name")
        .default(pinecone.index_name.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            PineconeConfig {
                index_name: input.clone(),
                ..pinecone.clone()
            }
            .validate()
        })
        .interact_text()?;

    let namespace: String = Input::new()
        .with_prompt("Namespace")
        .default(pinecone.namespace.clone())
        .allow_empty(true)
        .interact_text()?;

    let dimension: u32 = Input::new()
        .with_prompt("Embedding dimension")
        .default(pinecone.dimension)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (1..=20_000).contains(input) {
                Ok(())
            } else {
                Err("Dimension must be between 1 and 20000")
            }
        })
        .interact_text()?;

    let metrics = Metric::ALL;
    let default_index = metrics
        .iter()
        .position(|&m| m == pinecone.metric)
        .unwrap_or(0);
    let metric_index = Select::new()
        .with_prompt("Similarity metric")
        .default(default_index)
        .items(&metrics)
        .interact()?;

    let cloud: String = Input::new()
        .with_prompt("Cloud")
        .default(pinecone.cloud.clone())
        .validate_with(non_empty)
        .interact_text()?;

    let region: String = Input::new()
        .with_prompt("Region")
        .default(pinecone.region.clone())
        .validate_with(non_empty)
        .interact_text()?;

    pinecone.index_name = index_name;
    pinecone.namespace = namespace;
    pinecone.dimension = dimension;
    pinecone.metric = metrics[metric_index];
    pinecone.cloud = cloud;
    pinecone.region = region;
    pinecone.validate()?;
    Ok(())
}

fn non_empty(input: &String) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("Value cannot be empty")
    } else {
        Ok(())
    }
}
