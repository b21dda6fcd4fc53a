//! Turns paths from the command line or a terminal drop into intake candidates.

use anyhow::Context;
use intake_flow::CandidateFile;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Media type a browser would declare for this file, or empty when the extension is unknown.
pub fn guess_media_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or_default()
        .to_string()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Builds the candidate list for a selection, in order.
///
/// Only the first candidate can ever be sent, so files after it are described by name and
/// declared type without reading their bytes.
pub async fn load_selection(
    paths: &[PathBuf],
    media_type: Option<&str>,
) -> anyhow::Result<Vec<CandidateFile>> {
    let declared = |path: &Path| {
        media_type
            .map(str::to_string)
            .unwrap_or_else(|| guess_media_type(path))
    };

    let mut candidates = Vec::with_capacity(paths.len());
    let mut iter = paths.iter();

    if let Some(first) = iter.next() {
        let content = tokio::fs::read(first)
            .await
            .with_context(|| format!("failed to read {}", first.display()))?;
        debug!(path = %first.display(), bytes = content.len(), "Loaded selected file");
        candidates.push(CandidateFile::new(display_name(first), declared(first), content));
    }

    for rest in iter {
        candidates.push(CandidateFile::new(
            display_name(rest),
            declared(rest),
            Vec::new(),
        ));
    }

    Ok(candidates)
}

/// Splits one line of dropped paths the way terminals paste them: whitespace separated,
/// with quoting, backslash escapes, or `file://` URIs.
pub fn split_dropped_paths(line: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.trim().chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_token = true;
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                        in_token = true;
                    }
                }
                c if c.is_whitespace() => {
                    if in_token {
                        paths.push(dropped_path(&current));
                        current.clear();
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }

    if in_token {
        paths.push(dropped_path(&current));
    }
    paths
}

fn dropped_path(token: &str) -> PathBuf {
    match token.strip_prefix("file://") {
        Some(rest) => match urlencoding::decode(rest) {
            Ok(decoded) => PathBuf::from(decoded.into_owned()),
            Err(_) => PathBuf::from(rest),
        },
        None => PathBuf::from(token),
    }
}
