//! Interactive drop zone.
//!
//! Each input line is one drop: the paths a terminal pastes when files are dragged onto it.
//! The transfer runs in the background while further lines are read, so a drop that lands
//! while a document is still processing is refused with a busy notice.

use anyhow::Context;
use intake_flow::{AppState, ExtractionResult, IntakePipeline, Notice, PendingTransfer};
use std::{borrow::Cow, io};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::picker;

enum Event {
    Settled(intake_flow::Result<ExtractionResult>),
    Line(io::Result<Option<String>>),
}

async fn wait_for(
    pending: &mut Option<PendingTransfer>,
) -> intake_flow::Result<ExtractionResult> {
    match pending {
        Some(transfer) => transfer.await,
        None => std::future::pending().await,
    }
}

/// Reads one drop. Partial reads stay in `buf` when the read is cancelled by `select!`, so
/// the next call picks up where it stopped. Bytes that are not UTF-8 are decoded lossily.
async fn read_drop<R>(input: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let read = input.read_until(b'\n', buf).await?;
    if read == 0 && buf.is_empty() {
        return Ok(None);
    }

    let bytes = std::mem::take(buf);
    let line = match String::from_utf8_lossy(&bytes) {
        Cow::Borrowed(line) => line.to_string(),
        Cow::Owned(line) => {
            warn!(line = %line, "Dropped paths are not valid UTF-8");
            line
        }
    };
    Ok(Some(line))
}

fn settle(
    pipeline: &IntakePipeline,
    state: &mut AppState,
    outcome: intake_flow::Result<ExtractionResult>,
) {
    if let Err(e) = pipeline.complete(state, outcome) {
        warn!(error = %e, "Could not settle transfer");
    }
}

/// Runs the drop loop until `input` ends or the user types `quit`. A transfer still in
/// flight at that point is awaited and displayed before returning, also when reading
/// `input` fails.
pub async fn run_session<R>(
    pipeline: &IntakePipeline,
    mut input: R,
    media_type: Option<&str>,
) -> anyhow::Result<AppState>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut state = AppState::new();
    let mut pending: Option<PendingTransfer> = None;
    let mut read_error: Option<io::Error> = None;

    info!("Drop zone ready");

    loop {
        let event = tokio::select! {
            outcome = wait_for(&mut pending), if pending.is_some() => Event::Settled(outcome),
            line = read_drop(&mut input, &mut buf) => Event::Line(line),
        };

        match event {
            Event::Settled(outcome) => {
                pending = None;
                settle(pipeline, &mut state, outcome);
            }
            Event::Line(Err(e)) => {
                warn!(error = %e, "Reading drops failed");
                read_error = Some(e);
                break;
            }
            Event::Line(Ok(None)) => break,
            Event::Line(Ok(Some(line))) => {
                let line = line.trim();
                if matches!(line, "quit" | "exit") {
                    break;
                }

                let paths = picker::split_dropped_paths(line);
                let Some(first) = paths.first() else {
                    continue;
                };

                let candidates = match picker::load_selection(&paths, media_type).await {
                    Ok(candidates) => candidates,
                    Err(e) => {
                        warn!(path = %first.display(), error = %e, "Dropped file not loaded");
                        pipeline.notify(&Notice::Unreadable {
                            path: first.display().to_string(),
                            reason: e.root_cause().to_string(),
                        });
                        continue;
                    }
                };

                match pipeline.submit(&mut state, candidates) {
                    Ok(transfer) => pending = Some(transfer),
                    Err(e) => debug!(error = %e, "Drop not submitted"),
                }
            }
        }
    }

    if let Some(transfer) = pending.take() {
        let outcome = transfer.await;
        settle(pipeline, &mut state, outcome);
    }

    info!("Drop zone closed");
    match read_error {
        Some(e) => Err(e).context("failed to read dropped paths"),
        None => Ok(state),
    }
}
