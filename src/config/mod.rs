// Configuration management module
// TOML settings on disk, API keys from the environment

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    Config, ConfigError, Credentials, OPENAI_API_KEY_VAR, OpenAiConfig, PINECONE_API_KEY_VAR,
    PineconeConfig, ServerConfig,
};

/// Resolve the configuration directory, preferring an explicit override
#[inline]
pub fn resolve_config_dir(
    override_dir: Option<std::path::PathBuf>,
) -> Result<std::path::PathBuf, ConfigError> {
    override_dir.map_or_else(Config::config_dir, Ok)
}
