//! Terminal rendition of the intake surface.
//!
//! Results and notices go to `out` (stdout), the busy indicator to `status` (stderr).
//! In JSON mode every result or notice is a single JSON document on its own line.

use intake_flow::{ExtractionResult, MediaType, Notice, RegionContent, Regions, Severity, Surface};
use serde_json::json;
use std::{
    fmt::Write as _,
    io::{self, IsTerminal, Write},
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};
use tracing::warn;

use crate::config::OutputMode;

pub struct TerminalSurface<O, S> {
    out: Mutex<O>,
    status: Mutex<S>,
    mode: OutputMode,
    /// Erase the busy line in place instead of ending it with a newline
    clear_line: bool,
    busy: AtomicBool,
}

impl TerminalSurface<io::Stdout, io::Stderr> {
    pub fn stdio(mode: OutputMode) -> Self {
        let clear_line = io::stderr().is_terminal();
        Self::new(io::stdout(), io::stderr(), mode, clear_line)
    }
}

impl<O, S> TerminalSurface<O, S>
where
    O: Write + Send,
    S: Write + Send,
{
    pub fn new(out: O, status: S, mode: OutputMode, clear_line: bool) -> Self {
        Self {
            out: Mutex::new(out),
            status: Mutex::new(status),
            mode,
            clear_line,
            busy: AtomicBool::new(false),
        }
    }

    fn write_out(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            warn!(error = %e, "Failed to write to output");
        }
    }

    fn write_status(&self, text: &str) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = status.write_all(text.as_bytes()).and_then(|_| status.flush()) {
            warn!(error = %e, "Failed to write status line");
        }
    }
}

impl<O, S> Surface for TerminalSurface<O, S>
where
    O: Write + Send,
    S: Write + Send,
{
    fn show_busy(&self, file_name: &str, media_type: MediaType) {
        self.busy.store(true, Ordering::SeqCst);
        self.write_status(&format!(
            "Processing {} ({})...",
            safe_text(file_name),
            media_type.label()
        ));
    }

    fn hide_busy(&self) {
        if !self.busy.swap(false, Ordering::SeqCst) {
            return;
        }
        if self.clear_line {
            self.write_status("\r\x1b[2K");
        } else {
            self.write_status("\n");
        }
    }

    // Printed results cannot be withdrawn; the next paint starts a fresh block.
    fn hide_results(&self) {}

    fn show_results(&self, regions: &Regions, result: &ExtractionResult) {
        match self.mode {
            OutputMode::Text => self.write_out(&format_regions(regions)),
            OutputMode::Json => {
                let doc = json!({
                    "ok": true,
                    "regions": regions,
                    "result": result,
                });
                self.write_out(&format!("{doc}\n"));
            }
        }
    }

    fn notify(&self, notice: &Notice) {
        match self.mode {
            OutputMode::Text => self.write_out(&format_notice(notice)),
            OutputMode::Json => {
                let doc = json!({
                    "ok": false,
                    "severity": severity_label(notice.severity()),
                    "error": notice.message(),
                    "details": notice.detail(),
                });
                self.write_out(&format!("{doc}\n"));
            }
        }
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

/// Replaces control characters other than newline and tab so extracted text cannot drive
/// the terminal.
pub fn safe_text(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_control() && c != '\n' && c != '\t' {
                char::REPLACEMENT_CHARACTER
            } else {
                c
            }
        })
        .collect()
}

pub fn format_regions(regions: &Regions) -> String {
    let mut text = String::new();
    for region in regions.iter() {
        let _ = writeln!(text, "== {} ==", region.kind.title());
        match &region.content {
            RegionContent::Empty => {}
            RegionContent::Rows(rows) => {
                for row in rows {
                    let _ = writeln!(text, "  {}", safe_text(&row.to_string()));
                }
            }
            RegionContent::List(items) => {
                for item in items {
                    let _ = writeln!(text, "  - {}", safe_text(item));
                }
            }
            RegionContent::Text(body) => {
                let _ = writeln!(text, "{}", safe_text(body));
            }
            RegionContent::Fallback(notice) => {
                let _ = writeln!(text, "  {notice}");
            }
        }
        text.push('\n');
    }
    text
}

pub fn format_notice(notice: &Notice) -> String {
    let mut text = format!(
        "{}: {}\n",
        severity_label(notice.severity()),
        notice.message()
    );
    if let Some(detail) = notice.detail() {
        let _ = writeln!(text, "  {}", safe_text(&detail));
    }
    text
}
