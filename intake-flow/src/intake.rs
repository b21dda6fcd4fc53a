use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// The document formats the extraction service understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Pdf,
    Jpeg,
    Png,
    Docx,
}

impl MediaType {
    pub const ALL: [MediaType; 4] = [Self::Pdf, Self::Jpeg, Self::Png, Self::Docx];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Short name shown to users
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Jpeg => "JPG",
            Self::Png => "PNG",
            Self::Docx => "DOCX",
        }
    }

    /// Exact, case-sensitive match against the declared type string.
    pub fn from_declared(declared: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == declared)
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file the user picked or dropped, before any validation
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    /// The media type reported for the file (by the picker, or guessed from its name)
    pub declared_media_type: String,
    pub content: Vec<u8>,
}

impl CandidateFile {
    pub fn new(
        name: impl Into<String>,
        declared_media_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_media_type: declared_media_type.into(),
            content,
        }
    }
}

/// A file that passed the gate and may be handed to the transfer controller
#[derive(Debug, Clone)]
pub struct AcceptedFile {
    name: String,
    media_type: MediaType,
    content: Vec<u8>,
}

impl AcceptedFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn into_parts(self) -> (String, MediaType, Vec<u8>) {
        (self.name, self.media_type, self.content)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("no file selected. {}", accepted_set_message())]
    NoFile,
    #[error("unsupported file type '{declared}'. {}", accepted_set_message())]
    UnsupportedType { declared: String },
}

/// "Please upload a valid file (PDF, JPG, PNG, or DOCX)"
pub fn accepted_set_message() -> String {
    let labels: Vec<&str> = MediaType::ALL.iter().map(|m| m.label()).collect();
    match labels.split_last() {
        Some((last, rest)) if !rest.is_empty() => {
            format!("Please upload a valid file ({}, or {})", rest.join(", "), last)
        }
        _ => format!("Please upload a valid file ({})", labels.join("")),
    }
}

/// Decides whether a selection is eligible for transfer. Only the first candidate counts.
pub fn validate<I>(candidates: I) -> Result<AcceptedFile, Rejection>
where
    I: IntoIterator<Item = CandidateFile>,
{
    let mut candidates = candidates.into_iter();
    let Some(first) = candidates.next() else {
        warn!("Rejected empty selection");
        return Err(Rejection::NoFile);
    };

    let ignored = candidates.count();
    if ignored > 0 {
        debug!(ignored, file = %first.name, "Multiple files selected, using the first");
    }

    match MediaType::from_declared(&first.declared_media_type) {
        Some(media_type) => {
            debug!(
                file = %first.name,
                media_type = %media_type,
                bytes = first.content.len(),
                "File accepted"
            );
            Ok(AcceptedFile {
                name: first.name,
                media_type,
                content: first.content,
            })
        }
        None => {
            warn!(
                file = %first.name,
                declared = %first.declared_media_type,
                "Rejected unsupported file type"
            );
            Err(Rejection::UnsupportedType {
                declared: first.declared_media_type,
            })
        }
    }
}
