//! Console summary of a run.
//!
//! Reporting is cosmetic: a failed write to the console is logged and
//! otherwise ignored, it never fails the run.

use std::io::{self, Write};
use std::path::Path;

use owo_colors::OwoColorize;
use tracing::warn;

use crate::error::MappingError;
use crate::event::CalendarEvent;
use crate::favorites::FavoriteRequest;
use crate::fetch::FetchOutcome;

const RULE_WIDTH: usize = 50;

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

pub struct Reporter<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Reporter { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, lines: Vec<String>) {
        let result: io::Result<()> = lines
            .iter()
            .try_for_each(|line| writeln!(self.out, "{line}"))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!(error = %e, "could not write report");
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color { text.dimmed().to_string() } else { text.to_string() }
    }

    fn strong(&self, text: &str) -> String {
        if self.color { text.bold().to_string() } else { text.to_string() }
    }

    fn warn(&self, text: &str) -> String {
        if self.color { text.yellow().to_string() } else { text.to_string() }
    }

    fn error(&self, text: &str) -> String {
        if self.color { text.red().to_string() } else { text.to_string() }
    }

    fn success(&self, text: &str) -> String {
        if self.color { text.green().to_string() } else { text.to_string() }
    }

    pub fn favorites_found(&mut self, request: &FavoriteRequest) {
        let count = request.ids.len();
        let lines = vec![
            format!(
                "Found {} favorite sessions: {}",
                count,
                request.ids.join(", ")
            ),
            self.dim(&format!("WordCamp API base: {}", request.api_base)),
        ];
        self.emit(lines);
    }

    pub fn sessions_retrieved(&mut self, outcome: &FetchOutcome) {
        let mut lines = vec![format!("Retrieved {} sessions", outcome.retrieved)];
        if !outcome.missing.is_empty() {
            lines.push(self.warn(&format!(
                "Not found upstream: {}",
                outcome.missing.join(", ")
            )));
        }
        for failed in &outcome.failed {
            lines.push(self.error(&format!("Failed batch, {failed}")));
        }
        self.emit(lines);
    }

    pub fn events(&mut self, events: &[CalendarEvent]) {
        let mut lines = vec![
            String::new(),
            self.strong("Favorite Sessions:"),
            "-".repeat(RULE_WIDTH),
        ];

        for event in events {
            let speakers = if event.speakers.is_empty() {
                "(none listed)".to_string()
            } else {
                event.speaker_list()
            };
            let location = if event.location.is_empty() {
                "(not set)"
            } else {
                event.location.as_str()
            };

            lines.push(format!("• {}", self.strong(&event.title)));
            lines.push(format!("  {} {}", self.dim("Speaker(s):"), speakers));
            lines.push(format!("  {} {}", self.dim("Location:"), location));
            lines.push(format!(
                "  {} {}",
                self.dim("Start:"),
                event.start.format("%a %b %-d, %Y %H:%M %Z")
            ));
            lines.push(String::new());
        }

        self.emit(lines);
    }

    pub fn skipped(&mut self, skipped: &[MappingError]) {
        if skipped.is_empty() {
            return;
        }
        let mut lines = vec![self.warn(&format!(
            "Skipped {} {}:",
            skipped.len(),
            pluralize("session", skipped.len())
        ))];
        lines.extend(skipped.iter().map(|e| format!("  {e}")));
        self.emit(lines);
    }

    pub fn saved(&mut self, path: &Path, count: usize) {
        let line = self.success(&format!(
            "Calendar saved to: {} ({} {})",
            path.display(),
            count,
            pluralize("event", count)
        ));
        self.emit(vec![line]);
    }
}
