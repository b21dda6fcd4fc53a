use crate::{
    error::FailureReason,
    intake::{MediaType, Rejection, accepted_set_message},
    models::ExtractionResult,
    render::Regions,
};

pub const GENERIC_FAILURE: &str = "Error processing file. Please try again.";
pub const BUSY_MESSAGE: &str = "A file is already being processed. Please wait for it to finish.";
pub const UNREADABLE_MESSAGE: &str = "The selected file could not be read. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Blocking notices shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Rejected(Rejection),
    Busy,
    /// The picked or dropped file could not be loaded, so nothing reached the gate
    Unreadable { path: String, reason: String },
    TransferFailed(FailureReason),
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Rejected(_) | Self::Busy | Self::Unreadable { .. } => Severity::Warning,
            Self::TransferFailed(_) => Severity::Error,
        }
    }

    /// The user-facing message. Transfer failures share one generic text whatever the cause.
    pub fn message(&self) -> String {
        match self {
            Self::Rejected(_) => accepted_set_message(),
            Self::Busy => BUSY_MESSAGE.to_string(),
            Self::Unreadable { .. } => UNREADABLE_MESSAGE.to_string(),
            Self::TransferFailed(_) => GENERIC_FAILURE.to_string(),
        }
    }

    /// Optional detail a surface may show next to the message
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Rejected(Rejection::NoFile) => Some("no file selected".to_string()),
            Self::Rejected(Rejection::UnsupportedType { declared }) if declared.is_empty() => {
                Some("file type could not be determined".to_string())
            }
            Self::Rejected(Rejection::UnsupportedType { declared }) => {
                Some(format!("unsupported file type: {}", declared))
            }
            Self::Busy => None,
            Self::Unreadable { path, reason } => Some(format!("{}: {}", path, reason)),
            Self::TransferFailed(reason) => Some(reason.to_string()),
        }
    }
}

/// Where the pipeline paints: busy indicator, results area and notices.
///
/// Calls arrive in pipeline order on the task that drives the pipeline.
pub trait Surface: Send + Sync {
    fn show_busy(&self, file_name: &str, media_type: MediaType);
    fn hide_busy(&self);
    fn hide_results(&self);
    fn show_results(&self, regions: &Regions, result: &ExtractionResult);
    fn notify(&self, notice: &Notice);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_share_the_generic_message() {
        for reason in [
            FailureReason::HttpStatus(500),
            FailureReason::Transport("connection refused".into()),
            FailureReason::Parse("invalid JSON".into()),
        ] {
            let notice = Notice::TransferFailed(reason.clone());
            assert_eq!(notice.message(), GENERIC_FAILURE);
            assert_eq!(notice.severity(), Severity::Error);
            assert_eq!(notice.detail(), Some(reason.to_string()));
        }
    }

    #[test]
    fn rejection_names_the_accepted_set() {
        let notice = Notice::Rejected(Rejection::UnsupportedType {
            declared: "image/gif".into(),
        });
        assert_eq!(
            notice.message(),
            "Please upload a valid file (PDF, JPG, PNG, or DOCX)"
        );
        assert_eq!(notice.severity(), Severity::Warning);
        assert_eq!(
            notice.detail().as_deref(),
            Some("unsupported file type: image/gif")
        );
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let notice = Notice::Unreadable {
            path: "/tmp/missing.pdf".into(),
            reason: "No such file or directory".into(),
        };
        assert_eq!(notice.severity(), Severity::Warning);
        assert_eq!(notice.message(), UNREADABLE_MESSAGE);
        assert_eq!(
            notice.detail().as_deref(),
            Some("/tmp/missing.pdf: No such file or directory")
        );
    }

    #[test]
    fn empty_selection_and_unknown_type_details() {
        assert_eq!(
            Notice::Rejected(Rejection::NoFile).detail().as_deref(),
            Some("no file selected")
        );
        let unknown = Notice::Rejected(Rejection::UnsupportedType {
            declared: String::new(),
        });
        assert_eq!(
            unknown.detail().as_deref(),
            Some("file type could not be determined")
        );
    }
}
