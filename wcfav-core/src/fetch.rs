//! Batched session retrieval and reference resolution.

use std::collections::HashSet;

use chrono_tz::Tz;
use tracing::{debug, info, instrument, warn};

use crate::error::{FetchError, MappingError};
use crate::mapper::References;
use crate::remote::WordCampApi;
use crate::session::{SessionRecord, decode_sessions};
use crate::settings::{FailurePolicy, Settings};
use crate::text::clean_html_text;

/// Everything the sessions endpoint gave us for one run.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Records that matched the schema, in response order
    pub records: Vec<SessionRecord>,
    /// Items the API returned, valid or not
    pub retrieved: usize,
    /// Items that did not match the schema
    pub rejected: Vec<MappingError>,
    /// Requested ids that no response contained
    pub missing: Vec<String>,
    /// Failed batches (only with [`FailurePolicy::BestEffort`])
    pub failed: Vec<FetchError>,
}

/// Fetch sessions in chunks of `settings.batch_size`, one request at a time.
///
/// Under [`FailurePolicy::Abort`] the first failing chunk ends the fetch and
/// no further chunks are requested.
#[instrument(skip_all, fields(count = ids.len(), batch_size = settings.batch_size))]
pub async fn fetch_sessions<A: WordCampApi>(
    api: &A,
    ids: &[String],
    settings: &Settings,
) -> Result<FetchOutcome, FetchError> {
    let mut outcome = FetchOutcome::default();

    for (n, chunk) in ids.chunks(settings.batch_size.max(1)).enumerate() {
        debug!(batch = n + 1, ids = ?chunk, "requesting sessions");

        let items = match api.sessions(chunk).await {
            Ok(items) => items,
            Err(failure) => {
                let error = FetchError {
                    ids: chunk.to_vec(),
                    failure,
                };
                match settings.failure_policy {
                    FailurePolicy::Abort => return Err(error),
                    FailurePolicy::BestEffort => {
                        warn!(%error, "skipping failed batch");
                        outcome.failed.push(error);
                        continue;
                    }
                }
            }
        };

        outcome.retrieved += items.len();
        let (records, rejected) = decode_sessions(items);
        outcome.records.extend(records);
        outcome.rejected.extend(rejected);
    }

    outcome.missing = missing_ids(ids, &outcome);
    if !outcome.missing.is_empty() {
        warn!(missing = ?outcome.missing, "sessions not found upstream");
    }
    info!(retrieved = outcome.retrieved, "fetched sessions");

    Ok(outcome)
}

/// Requested ids absent from every response, in request order, deduplicated.
/// Ids from failed batches are reported with the batch instead.
fn missing_ids(requested: &[String], outcome: &FetchOutcome) -> Vec<String> {
    let mut seen: HashSet<String> = outcome.records.iter().map(|r| r.id_string()).collect();
    seen.extend(outcome.rejected.iter().filter_map(|e| e.session_id.clone()));
    seen.extend(outcome.failed.iter().flat_map(|e| e.ids.iter().cloned()));

    let mut missing = Vec::new();
    for id in requested {
        if seen.insert(id.clone()) {
            missing.push(id.clone());
        }
    }
    missing
}

/// Look up speaker and track names that were referenced but not embedded.
///
/// Lookups are a convenience: a failed request is logged and those names
/// stay unresolved.
#[instrument(skip_all)]
pub async fn resolve_references<A: WordCampApi>(
    api: &A,
    records: &[SessionRecord],
    batch_size: usize,
) -> References {
    let mut refs = References::default();

    let speaker_ids = unique(records.iter().flat_map(|r| r.unembedded_speaker_ids()));
    for chunk in speaker_ids.chunks(batch_size.max(1)) {
        match api.speakers(chunk).await {
            Ok(posts) => {
                for post in posts {
                    let name = post.title.map(|t| clean_html_text(&t.rendered));
                    if let (Some(id), Some(name)) = (post.id, name.filter(|n| !n.is_empty())) {
                        refs.speakers.insert(id, name);
                    }
                }
            }
            Err(e) => warn!(ids = ?chunk, error = %e, "could not look up speakers"),
        }
    }

    let track_ids = unique(records.iter().flat_map(|r| r.unembedded_track_ids()));
    for chunk in track_ids.chunks(batch_size.max(1)) {
        match api.tracks(chunk).await {
            Ok(terms) => {
                for term in terms {
                    let name = term.name.map(|n| clean_html_text(&n));
                    if let (Some(id), Some(name)) = (term.id, name.filter(|n| !n.is_empty())) {
                        refs.tracks.insert(id, name);
                    }
                }
            }
            Err(e) => warn!(ids = ?chunk, error = %e, "could not look up tracks"),
        }
    }

    debug!(
        speakers = refs.speakers.len(),
        tracks = refs.tracks.len(),
        "resolved references"
    );
    refs
}

/// Pick the event zone: explicit override, then the site's setting, then the default.
#[instrument(skip_all)]
pub async fn resolve_timezone<A: WordCampApi>(api: &A, settings: &Settings) -> Tz {
    if let Some(tz) = settings.timezone_override {
        return tz;
    }

    let fallback = settings.default_timezone;
    match api.site_index().await {
        Ok(index) => match index.timezone_string.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.parse::<Tz>().unwrap_or_else(|_| {
                warn!(timezone = name, fallback = fallback.name(), "unknown site timezone");
                fallback
            }),
            _ => {
                debug!(fallback = fallback.name(), "site has no named timezone");
                fallback
            }
        },
        Err(e) => {
            warn!(error = %e, fallback = fallback.name(), "could not read site timezone");
            fallback
        }
    }
}

fn unique<'a>(ids: impl Iterator<Item = &'a u64>) -> Vec<u64> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(**id)).copied().collect()
}
