//! IntakePipeline – wires the intake gate, the transfer controller and the renderer to a
//! [`Surface`], threading one explicit [`AppState`] through every step.
//!
//! ## Shape of a transaction
//! 1. [`IntakePipeline::submit`] validates the selection. Rejections warn the user and leave the
//!    state untouched. Accepted files move the state to `InFlight`, show the busy indicator,
//!    hide old results, and only then spawn the transfer.
//! 2. The returned [`PendingTransfer`] is awaited by the caller; it is the only suspension point.
//! 3. [`IntakePipeline::complete`] settles the state. On success all six regions are repainted,
//!    the busy indicator is hidden and results are shown. On failure the busy indicator is hidden,
//!    results stay hidden and a generic error notice is raised.
//!
//! ## Single-shot vs interactive callers
//! ```rust,ignore
//! // One file, wait for it
//! pipeline.run(&mut state, candidates).await?;
//!
//! // Event loop: keep the pending transfer next to other event sources
//! let pending = pipeline.submit(&mut state, candidates)?;
//! let outcome = pending.await;
//! pipeline.complete(&mut state, outcome)?;
//! ```
//!
//! While a transfer is `InFlight`, further submissions are refused with a busy notice.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    error::{IntakeError, Result},
    extractor::Extractor,
    intake::{self, CandidateFile},
    models::ExtractionResult,
    render::Regions,
    surface::{Notice, Surface},
    transfer::{PendingTransfer, TransferController, TransferState},
};

/// Everything the pipeline mutates: the live transfer state and the display regions
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub transfer: TransferState,
    pub regions: Regions,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Clone)]
pub struct IntakePipeline {
    controller: TransferController,
    surface: Arc<dyn Surface>,
}

impl IntakePipeline {
    pub fn new(extractor: Arc<dyn Extractor>, surface: Arc<dyn Surface>) -> Self {
        Self {
            controller: TransferController::new(extractor),
            surface,
        }
    }

    /// Raise a notice that did not come out of the gate or a transfer, such as a file that
    /// could not be loaded. The transfer state is not touched.
    pub fn notify(&self, notice: &Notice) {
        self.surface.notify(notice);
    }

    /// Validate a selection and, if accepted, start its transfer.
    pub fn submit<I>(&self, state: &mut AppState, candidates: I) -> Result<PendingTransfer>
    where
        I: IntoIterator<Item = CandidateFile>,
    {
        let file = match intake::validate(candidates) {
            Ok(file) => file,
            Err(rejection) => {
                self.surface.notify(&Notice::Rejected(rejection.clone()));
                return Err(rejection.into());
            }
        };

        let in_flight = match self.controller.begin(&state.transfer, &file) {
            Ok(next) => next,
            Err(err) => {
                warn!(file = %file.name(), "Submission refused, a transfer is already in flight");
                self.surface.notify(&Notice::Busy);
                return Err(err);
            }
        };

        self.surface.show_busy(file.name(), file.media_type());
        self.surface.hide_results();

        let pending = self.controller.start(&in_flight, file)?;
        state.transfer = in_flight;
        Ok(pending)
    }

    /// Settle the in-flight transfer with its outcome and paint the result.
    pub fn complete(
        &self,
        state: &mut AppState,
        outcome: Result<ExtractionResult>,
    ) -> Result<()> {
        let settled = self.controller.settle(&state.transfer, outcome)?;

        match &settled {
            TransferState::Succeeded {
                transfer_id,
                result,
                ..
            } => {
                state.regions.render(result);
                self.surface.hide_busy();
                self.surface.show_results(&state.regions, result);
                info!(transfer_id = %transfer_id, "Extraction results displayed");
            }
            TransferState::Failed {
                transfer_id,
                reason,
                ..
            } => {
                self.surface.hide_busy();
                self.surface.notify(&Notice::TransferFailed(reason.clone()));
                warn!(transfer_id = %transfer_id, reason = %reason, "Extraction failed");
            }
            TransferState::Idle | TransferState::InFlight { .. } => {
                return Err(IntakeError::NotInFlight);
            }
        }

        state.transfer = settled;
        Ok(())
    }

    /// Submit, wait for the transfer, and settle it. Transfer failures are reported through
    /// the surface and `state.transfer`; only rejections and busy refusals return `Err`.
    pub async fn run<I>(&self, state: &mut AppState, candidates: I) -> Result<()>
    where
        I: IntoIterator<Item = CandidateFile>,
    {
        let pending = self.submit(state, candidates)?;
        let outcome = pending.await;
        self.complete(state, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::FailureReason,
        intake::{AcceptedFile, MediaType},
        render::{RegionContent, RegionKind},
    };
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        ShowBusy(String),
        HideBusy,
        HideResults,
        ShowResults(Regions),
        Notice(Notice),
        Extract(MediaType),
    }

    #[derive(Default)]
    struct RecordingSurface {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingSurface {
        fn push(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Surface for RecordingSurface {
        fn show_busy(&self, file_name: &str, _media_type: MediaType) {
            self.push(Event::ShowBusy(file_name.to_string()));
        }
        fn hide_busy(&self) {
            self.push(Event::HideBusy);
        }
        fn hide_results(&self) {
            self.push(Event::HideResults);
        }
        fn show_results(&self, regions: &Regions, _result: &ExtractionResult) {
            self.push(Event::ShowResults(regions.clone()));
        }
        fn notify(&self, notice: &Notice) {
            self.push(Event::Notice(notice.clone()));
        }
    }

    type Reply = Box<dyn Fn() -> Result<ExtractionResult> + Send + Sync>;

    struct StubExtractor {
        calls: AtomicUsize,
        log: Arc<RecordingSurface>,
        release: Option<Arc<Notify>>,
        reply: Reply,
    }

    #[async_trait]
    impl Extractor for StubExtractor {
        async fn extract(&self, file: AcceptedFile) -> Result<ExtractionResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.log.push(Event::Extract(file.media_type()));
            if let Some(release) = &self.release {
                release.notified().await;
            }
            (self.reply)()
        }
    }

    struct Harness {
        surface: Arc<RecordingSurface>,
        extractor: Arc<StubExtractor>,
        pipeline: IntakePipeline,
    }

    fn harness(release: Option<Arc<Notify>>, reply: Reply) -> Harness {
        let surface = Arc::new(RecordingSurface::default());
        let extractor = Arc::new(StubExtractor {
            calls: AtomicUsize::new(0),
            log: surface.clone(),
            release,
            reply,
        });
        let pipeline = IntakePipeline::new(extractor.clone(), surface.clone());
        Harness {
            surface,
            extractor,
            pipeline,
        }
    }

    fn replying(body: &'static str) -> Reply {
        Box::new(move || ExtractionResult::from_json(body))
    }

    fn file(name: &str, media_type: &str) -> Vec<CandidateFile> {
        vec![CandidateFile::new(name, media_type, b"content".to_vec())]
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected_without_network() {
        let h = harness(None, replying("{}"));
        let mut state = AppState::new();

        let err = h
            .pipeline
            .run(&mut state, file("anim.gif", "image/gif"))
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::Rejected(_)));
        assert!(state.transfer.is_idle());
        assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            h.surface.events(),
            vec![Event::Notice(Notice::Rejected(
                intake::Rejection::UnsupportedType {
                    declared: "image/gif".into()
                }
            ))]
        );
    }

    #[tokio::test]
    async fn empty_selection_is_rejected_without_network() {
        let h = harness(None, replying("{}"));
        let mut state = AppState::new();

        let err = h.pipeline.run(&mut state, Vec::new()).await.unwrap_err();

        assert!(matches!(
            err,
            IntakeError::Rejected(intake::Rejection::NoFile)
        ));
        assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);
        assert!(state.transfer.is_idle());
    }

    #[tokio::test]
    async fn server_error_fails_with_busy_shown_then_hidden() {
        let h = harness(
            None,
            Box::new(|| {
                Err(IntakeError::HttpStatus {
                    status: 500,
                    body: String::new(),
                })
            }),
        );
        let mut state = AppState::new();

        h.pipeline
            .run(&mut state, file("report.pdf", "application/pdf"))
            .await
            .unwrap();

        assert_eq!(
            state.transfer.failure(),
            Some(&FailureReason::HttpStatus(500))
        );
        assert_eq!(
            h.surface.events(),
            vec![
                Event::ShowBusy("report.pdf".into()),
                Event::HideResults,
                Event::Extract(MediaType::Pdf),
                Event::HideBusy,
                Event::Notice(Notice::TransferFailed(FailureReason::HttpStatus(500))),
            ]
        );
    }

    #[tokio::test]
    async fn partial_result_renders_present_fields_and_fallbacks() {
        let h = harness(
            None,
            replying(
                r#"{"patient_info":{"name":"Jane Doe"},"medical_record":{"medications":["Aspirin","Lisinopril"]}}"#,
            ),
        );
        let mut state = AppState::new();

        h.pipeline
            .run(&mut state, file("scan.png", "image/png"))
            .await
            .unwrap();

        assert!(state.transfer.result().is_some());
        let regions = &state.regions;
        assert_eq!(
            regions.get(RegionKind::PatientInfo).entries(),
            vec!["Name: Jane Doe"]
        );
        assert_eq!(
            regions.get(RegionKind::Medications).content,
            RegionContent::List(vec!["Aspirin".into(), "Lisinopril".into()])
        );
        for kind in [
            RegionKind::Diagnosis,
            RegionKind::Allergies,
            RegionKind::Procedures,
            RegionKind::RawText,
        ] {
            assert_eq!(
                regions.get(kind).content,
                RegionContent::Fallback(kind.fallback())
            );
        }

        let events = h.surface.events();
        assert_eq!(events[2], Event::Extract(MediaType::Png));
        assert_eq!(events[3], Event::HideBusy);
        assert_eq!(events[4], Event::ShowResults(regions.clone()));
    }

    #[tokio::test]
    async fn empty_object_renders_all_fallbacks() {
        let h = harness(None, replying("{}"));
        let mut state = AppState::new();

        h.pipeline
            .run(
                &mut state,
                file(
                    "letter.docx",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                ),
            )
            .await
            .unwrap();

        assert!(state.transfer.is_terminal());
        for region in state.regions.iter() {
            assert!(region.is_fallback(), "{:?}", region.kind);
        }
    }

    #[tokio::test]
    async fn malformed_body_fails_like_a_transport_error() {
        let h = harness(None, replying("[1, 2, 3]"));
        let mut state = AppState::new();

        h.pipeline
            .run(&mut state, file("scan.jpg", "image/jpeg"))
            .await
            .unwrap();

        assert!(matches!(
            state.transfer.failure(),
            Some(FailureReason::Parse(_))
        ));
        assert!(
            !h.surface
                .events()
                .iter()
                .any(|e| matches!(e, Event::ShowResults(_)))
        );
    }

    #[tokio::test]
    async fn submission_while_in_flight_is_refused() {
        let release = Arc::new(Notify::new());
        let h = harness(Some(release.clone()), replying("{}"));
        let mut state = AppState::new();

        let pending = h
            .pipeline
            .submit(&mut state, file("first.pdf", "application/pdf"))
            .unwrap();
        assert!(state.transfer.is_in_flight());
        let first_id = state.transfer.transfer_id();

        let err = h
            .pipeline
            .submit(&mut state, file("second.pdf", "application/pdf"))
            .unwrap_err();
        assert!(matches!(err, IntakeError::Busy));
        assert_eq!(state.transfer.transfer_id(), first_id);

        release.notify_one();
        let outcome = pending.await;
        h.pipeline.complete(&mut state, outcome).unwrap();

        assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 1);
        assert!(state.transfer.result().is_some());
        assert!(h.surface.events().contains(&Event::Notice(Notice::Busy)));
    }

    #[tokio::test]
    async fn new_submission_after_failure_replaces_the_state() {
        let h = harness(
            None,
            Box::new(|| Err(IntakeError::Transport("connection reset".into()))),
        );
        let mut state = AppState::new();

        h.pipeline
            .run(&mut state, file("a.pdf", "application/pdf"))
            .await
            .unwrap();
        let first = state.transfer.transfer_id();
        h.pipeline
            .run(&mut state, file("b.pdf", "application/pdf"))
            .await
            .unwrap();

        assert!(state.transfer.failure().is_some());
        assert_ne!(state.transfer.transfer_id(), first);
        assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn complete_without_a_transfer_is_an_error() {
        let h = harness(None, replying("{}"));
        let mut state = AppState::new();
        let err = h
            .pipeline
            .complete(&mut state, Ok(ExtractionResult::default()))
            .unwrap_err();
        assert!(matches!(err, IntakeError::NotInFlight));
        assert!(h.surface.events().is_empty());
    }
}
