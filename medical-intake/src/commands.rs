use anyhow::Context;
use intake_flow::{AppState, HttpExtractor, IntakeError, IntakePipeline, Notice};
use serde_json::json;
use std::{path::PathBuf, process::ExitCode, sync::Arc};
use tokio::io::BufReader;
use tracing::{debug, info, warn};

use crate::{
    config::{IntakeConfig, OutputMode},
    picker, session,
    terminal::TerminalSurface,
};

/// Exit status when the selection never reached the service (no file, wrong type).
const EXIT_REJECTED: u8 = 2;

pub fn build_pipeline(config: &IntakeConfig) -> IntakePipeline {
    let extractor = Arc::new(HttpExtractor::new(config.service_url.clone()));
    let surface = Arc::new(TerminalSurface::stdio(config.output));
    IntakePipeline::new(extractor, surface)
}

fn exit_for(state: &AppState) -> ExitCode {
    if state.transfer.result().is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

pub async fn extract(
    config: &IntakeConfig,
    files: &[PathBuf],
    media_type: Option<&str>,
) -> anyhow::Result<ExitCode> {
    let pipeline = build_pipeline(config);
    let candidates = match picker::load_selection(files, media_type).await {
        Ok(candidates) => candidates,
        Err(e) => {
            let path = files
                .first()
                .map(|path| path.display().to_string())
                .unwrap_or_default();
            warn!(path = %path, error = %e, "Selected file not loaded");
            pipeline.notify(&Notice::Unreadable {
                path,
                reason: e.root_cause().to_string(),
            });
            return Ok(ExitCode::FAILURE);
        }
    };
    let mut state = AppState::new();

    match pipeline.run(&mut state, candidates).await {
        Ok(()) => Ok(exit_for(&state)),
        Err(IntakeError::Rejected(rejection)) => {
            debug!(%rejection, "Selection rejected");
            Ok(ExitCode::from(EXIT_REJECTED))
        }
        Err(e) => Err(e).context("extraction did not complete"),
    }
}

pub async fn session(config: &IntakeConfig, media_type: Option<&str>) -> anyhow::Result<ExitCode> {
    let pipeline = build_pipeline(config);
    if config.output == OutputMode::Text {
        eprintln!("Drop a PDF, JPG, PNG or DOCX file here and press Enter. Type quit to leave.");
    }

    let input = BufReader::new(tokio::io::stdin());
    let state = session::run_session(&pipeline, input, media_type).await?;
    Ok(if state.transfer.failure().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

pub async fn health(config: &IntakeConfig) -> anyhow::Result<ExitCode> {
    let extractor = HttpExtractor::new(config.service_url.clone());
    let status = extractor
        .health()
        .await
        .with_context(|| format!("health check failed for {}", extractor.health_url()))?;
    info!(status = %status.status, "Health check answered");

    match config.output {
        OutputMode::Json => println!(
            "{}",
            json!({
                "ok": status.is_healthy(),
                "service_url": config.service_url,
                "status": status.status,
            })
        ),
        OutputMode::Text => println!(
            "{}: {}",
            config.service_url,
            if status.is_healthy() {
                "healthy".to_string()
            } else {
                format!("unhealthy ({})", status.status)
            }
        ),
    }

    Ok(if status.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
