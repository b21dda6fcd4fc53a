use anyhow::{Context, bail};
use reqwest::Url;

use crate::cli::Cli;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

/// Settings shared by every command, resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub service_url: String,
    pub output: OutputMode,
}

impl IntakeConfig {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        Ok(Self {
            service_url: normalize_service_url(&cli.service_url)?,
            output: if cli.json {
                OutputMode::Json
            } else {
                OutputMode::Text
            },
        })
    }
}

fn normalize_service_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).with_context(|| format!("invalid service URL: {trimmed}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("service URL must use http or https, got {}", url.scheme());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
