//! One run: favorites in, calendar file out.

use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use chrono_tz::Tz;
use tracing::{info, instrument};

use crate::error::{MappingError, WcfavResult};
use crate::event::CalendarEvent;
use crate::favorites::FavoriteRequest;
use crate::fetch::{fetch_sessions, resolve_references, resolve_timezone};
use crate::ics::{CalendarMeta, generate_ics, write_calendar};
use crate::mapper::map_sessions;
use crate::remote::WordCampApi;
use crate::report::Reporter;
use crate::settings::Settings;

/// What a successful run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub output: PathBuf,
    pub timezone: Tz,
    pub events: Vec<CalendarEvent>,
    /// Records that were returned but could not become events
    pub skipped: Vec<MappingError>,
    pub missing: Vec<String>,
    /// Batches skipped under best-effort
    pub failed_batches: usize,
}

/// Fetch, map and write the favorites in `request`, reporting as it goes.
///
/// The calendar is written even when no session could be mapped, so a
/// re-run always replaces a stale file.
#[instrument(skip_all, fields(host = request.host()))]
pub async fn run<A, W>(
    api: &A,
    request: &FavoriteRequest,
    settings: &Settings,
    reporter: &mut Reporter<W>,
) -> WcfavResult<RunSummary>
where
    A: WordCampApi,
    W: Write,
{
    settings.validate()?;
    reporter.favorites_found(request);

    let timezone = resolve_timezone(api, settings).await;
    info!(timezone = timezone.name(), "using event timezone");

    let outcome = fetch_sessions(api, &request.ids, settings).await?;
    reporter.sessions_retrieved(&outcome);

    let refs = resolve_references(api, &outcome.records, settings.batch_size).await;
    let (events, mut skipped) =
        map_sessions(&outcome.records, &refs, timezone, settings.default_duration);
    let mut all_skipped = outcome.rejected;
    all_skipped.append(&mut skipped);

    reporter.events(&events);
    reporter.skipped(&all_skipped);

    let meta = CalendarMeta {
        name: &settings.calendar_name,
        host: request.host(),
        generated_at: Utc::now(),
    };
    let ics = generate_ics(&events, &meta);
    write_calendar(&settings.output, &ics)?;
    info!(path = %settings.output.display(), events = events.len(), "calendar written");
    reporter.saved(&settings.output, events.len());

    Ok(RunSummary {
        output: settings.output.clone(),
        timezone,
        events,
        skipped: all_skipped,
        missing: outcome.missing,
        failed_batches: outcome.failed.len(),
    })
}
