use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
    error::{FailureReason, IntakeError, Result},
    extractor::Extractor,
    intake::{AcceptedFile, MediaType},
    models::ExtractionResult,
};

/// Lifecycle of the single outstanding transfer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TransferState {
    #[default]
    Idle,
    InFlight {
        transfer_id: Uuid,
        file_name: String,
        media_type: MediaType,
    },
    Succeeded {
        transfer_id: Uuid,
        result: ExtractionResult,
        completed_at: DateTime<Utc>,
    },
    Failed {
        transfer_id: Uuid,
        reason: FailureReason,
        completed_at: DateTime<Utc>,
    },
}

impl TransferState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    pub fn transfer_id(&self) -> Option<Uuid> {
        match self {
            Self::Idle => None,
            Self::InFlight { transfer_id, .. }
            | Self::Succeeded { transfer_id, .. }
            | Self::Failed { transfer_id, .. } => Some(*transfer_id),
        }
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        match self {
            Self::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            Self::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Idle or terminal → InFlight. A second submission while InFlight is refused,
    /// the running transfer is left alone.
    pub fn begin(&self, file: &AcceptedFile) -> Result<TransferState> {
        if self.is_in_flight() {
            return Err(IntakeError::Busy);
        }
        Ok(Self::InFlight {
            transfer_id: Uuid::new_v4(),
            file_name: file.name().to_string(),
            media_type: file.media_type(),
        })
    }

    /// InFlight → Succeeded | Failed
    pub fn settle(&self, outcome: Result<ExtractionResult>) -> Result<TransferState> {
        let Self::InFlight { transfer_id, .. } = self else {
            return Err(IntakeError::NotInFlight);
        };
        let completed_at = Utc::now();
        Ok(match outcome {
            Ok(result) => Self::Succeeded {
                transfer_id: *transfer_id,
                result,
                completed_at,
            },
            Err(err) => Self::Failed {
                transfer_id: *transfer_id,
                reason: FailureReason::from(&err),
                completed_at,
            },
        })
    }
}

/// The outstanding transfer, awaitable for its outcome.
///
/// Expected failures (HTTP status, transport, malformed body) resolve to `Err` values; the
/// spawned task never panics on them.
#[derive(Debug)]
pub struct PendingTransfer {
    transfer_id: Uuid,
    handle: JoinHandle<Result<ExtractionResult>>,
}

impl PendingTransfer {
    pub fn transfer_id(&self) -> Uuid {
        self.transfer_id
    }
}

impl Future for PendingTransfer {
    type Output = Result<ExtractionResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(outcome) => outcome,
            Err(e) => Err(IntakeError::Transport(format!(
                "transfer task ended abnormally: {}",
                e
            ))),
        })
    }
}

/// Owns the request lifecycle: state transitions plus the one network call per transfer
#[derive(Clone)]
pub struct TransferController {
    extractor: Arc<dyn Extractor>,
}

impl TransferController {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }

    pub fn begin(&self, state: &TransferState, file: &AcceptedFile) -> Result<TransferState> {
        state.begin(file)
    }

    /// Issue the transfer for a state returned by [`begin`](Self::begin).
    pub fn start(&self, in_flight: &TransferState, file: AcceptedFile) -> Result<PendingTransfer> {
        let TransferState::InFlight { transfer_id, .. } = in_flight else {
            return Err(IntakeError::NotInFlight);
        };
        let transfer_id = *transfer_id;

        let span = info_span!(
            "transfer",
            transfer_id = %transfer_id,
            file = %file.name(),
            media_type = %file.media_type()
        );
        let extractor = self.extractor.clone();
        let handle = tokio::spawn(
            async move {
                info!(bytes = file.len(), "Transfer started");
                let outcome = extractor.extract(file).await;
                match &outcome {
                    Ok(_) => info!("Transfer finished"),
                    Err(e) => warn!(error = %e, "Transfer failed"),
                }
                outcome
            }
            .instrument(span),
        );

        Ok(PendingTransfer {
            transfer_id,
            handle,
        })
    }

    pub fn settle(
        &self,
        state: &TransferState,
        outcome: Result<ExtractionResult>,
    ) -> Result<TransferState> {
        state.settle(outcome)
    }
}
