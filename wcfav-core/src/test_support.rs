//! In-memory [`WordCampApi`] for tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Value, json};

use crate::error::FetchFailure;
use crate::remote::WordCampApi;
use crate::session::{Post, Rendered, SiteIndex, Term};

#[derive(Default)]
pub struct FakeApi {
    sessions: Vec<Value>,
    speakers: HashMap<u64, String>,
    tracks: HashMap<u64, String>,
    timezone: Option<String>,
    failing_batch: Option<usize>,
    failing_lookups: bool,
    session_calls: RefCell<Vec<Vec<String>>>,
    speaker_calls: RefCell<Vec<Vec<u64>>>,
    index_calls: Cell<usize>,
}

impl FakeApi {
    pub fn with_sessions(sessions: impl IntoIterator<Item = Value>) -> Self {
        FakeApi {
            sessions: sessions.into_iter().collect(),
            ..FakeApi::default()
        }
    }

    /// A well-formed session starting at 2025-08-28 09:00 plus `id` minutes.
    pub fn session(id: u64) -> Value {
        json!({
            "id": id,
            "link": format!("https://us.wordcamp.org/2025/session/s{id}/"),
            "title": { "rendered": format!("Session {id}") },
            "date": format!("2025-08-28T09:{:02}:00", id % 60),
        })
    }

    /// Make the `n`th sessions request (0-based) fail with HTTP 500.
    pub fn failing_batch(mut self, n: usize) -> Self {
        self.failing_batch = Some(n);
        self
    }

    /// Make speaker, track and site index requests fail.
    pub fn failing_lookups(mut self) -> Self {
        self.failing_lookups = true;
        self
    }

    pub fn speaker(mut self, id: u64, name: &str) -> Self {
        self.speakers.insert(id, name.to_string());
        self
    }

    pub fn track(mut self, id: u64, name: &str) -> Self {
        self.tracks.insert(id, name.to_string());
        self
    }

    pub fn site_timezone(mut self, tz: &str) -> Self {
        self.timezone = Some(tz.to_string());
        self
    }

    pub fn session_calls(&self) -> Vec<Vec<String>> {
        self.session_calls.borrow().clone()
    }

    pub fn speaker_calls(&self) -> Vec<Vec<u64>> {
        self.speaker_calls.borrow().clone()
    }

    pub fn index_calls(&self) -> usize {
        self.index_calls.get()
    }
}

fn id_of(value: &Value) -> Option<String> {
    value.get("id").map(|id| match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

impl WordCampApi for FakeApi {
    async fn sessions(&self, ids: &[String]) -> Result<Vec<Value>, FetchFailure> {
        let call = {
            let mut calls = self.session_calls.borrow_mut();
            calls.push(ids.to_vec());
            calls.len() - 1
        };
        if self.failing_batch == Some(call) {
            return Err(FetchFailure::Status(500));
        }

        // Like WordPress: stored order, duplicates collapsed, unknown ids ignored
        Ok(self
            .sessions
            .iter()
            .filter(|s| id_of(s).is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn speakers(&self, ids: &[u64]) -> Result<Vec<Post>, FetchFailure> {
        self.speaker_calls.borrow_mut().push(ids.to_vec());
        if self.failing_lookups {
            return Err(FetchFailure::Network("connection refused".into()));
        }
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.speakers.get(id).map(|name| Post {
                    id: Some(*id),
                    title: Some(Rendered {
                        rendered: name.clone(),
                    }),
                })
            })
            .collect())
    }

    async fn tracks(&self, ids: &[u64]) -> Result<Vec<Term>, FetchFailure> {
        if self.failing_lookups {
            return Err(FetchFailure::Network("connection refused".into()));
        }
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.tracks.get(id).map(|name| Term {
                    id: Some(*id),
                    name: Some(name.clone()),
                    taxonomy: Some("wcb_track".into()),
                })
            })
            .collect())
    }

    async fn site_index(&self) -> Result<SiteIndex, FetchFailure> {
        self.index_calls.set(self.index_calls.get() + 1);
        if self.failing_lookups {
            return Err(FetchFailure::Timeout(Duration::from_secs(30)));
        }
        Ok(SiteIndex {
            timezone_string: self.timezone.clone(),
        })
    }
}
