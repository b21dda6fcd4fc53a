//! Intake → transfer → render pipeline for clients of a medical document extraction service.
//!
//! A user-supplied document passes the intake gate ([`intake::validate`]), is uploaded by the
//! [`TransferController`] through an [`Extractor`], and the typed [`ExtractionResult`] is
//! projected into six display [`Regions`] painted on a [`Surface`].

pub mod error;
pub mod extractor;
pub mod intake;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod surface;
pub mod transfer;

// Re-export commonly used types
pub use error::{FailureReason, IntakeError, Result};
pub use extractor::{DEFAULT_SERVICE_URL, Extractor, HealthStatus, HttpExtractor};
pub use intake::{AcceptedFile, CandidateFile, MediaType, Rejection};
pub use models::{ExtractionResult, MedicalRecord, PatientInfo};
pub use pipeline::{AppState, IntakePipeline};
pub use render::{DisplayRegion, LabeledRow, RegionContent, RegionKind, Regions};
pub use surface::{Notice, Severity, Surface};
pub use transfer::{PendingTransfer, TransferController, TransferState};
