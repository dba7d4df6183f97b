//! Typed schema for WordCamp session objects.
//!
//! These mirror what `GET /wp-json/wp/v2/sessions?_embed=1` returns. Every
//! field except `id` is optional: WordCamp sites run different plugin
//! versions and many fields are only present some of the time. Fields that
//! are present but of the wrong shape fail the record, which the fetcher
//! turns into a [`MappingError`] instead of a crash further down.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::MappingError;

/// Taxonomy WordCamp uses for session tracks (rooms).
pub const TRACK_TAXONOMY: &str = "wcb_track";

/// An HTML field as WordPress serializes it: `{"rendered": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionRecord {
    pub id: u64,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub title: Option<Rendered>,
    #[serde(default)]
    pub content: Option<Rendered>,
    /// Local timestamp, usually naive (`2025-08-28T14:45:00`)
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "meta_or_empty")]
    pub meta: SessionMeta,
    #[serde(default, deserialize_with = "id_list")]
    pub session_track: Vec<u64>,
    #[serde(default, rename = "_embedded")]
    pub embedded: Option<Embedded>,
}

impl SessionRecord {
    pub fn id_string(&self) -> String {
        self.id.to_string()
    }

    /// Speaker ids that were not embedded in the response.
    pub fn unembedded_speaker_ids(&self) -> &[u64] {
        let embedded = self.embedded.as_ref().is_some_and(|e| !e.speakers.is_empty());
        if embedded {
            return &[];
        }
        &self.meta.speaker_ids
    }

    /// Track ids that were not embedded in the response.
    pub fn unembedded_track_ids(&self) -> &[u64] {
        let embedded = self
            .embedded
            .as_ref()
            .is_some_and(|e| e.tracks().next().is_some());
        if embedded {
            return &[];
        }
        &self.session_track
    }
}

/// Session post meta registered by the WordCamp plugin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionMeta {
    /// Local wall-clock start, encoded as if it were a UTC unix timestamp
    #[serde(default, rename = "_wcpt_session_time", deserialize_with = "flexible_int")]
    pub session_time: Option<i64>,
    #[serde(default, rename = "_wcpt_session_end_time", deserialize_with = "flexible_int")]
    pub session_end_time: Option<i64>,
    /// Seconds
    #[serde(default, rename = "_wcpt_session_duration", deserialize_with = "flexible_int")]
    pub session_duration: Option<i64>,
    #[serde(default, rename = "_wcpt_speaker_id", deserialize_with = "id_list")]
    pub speaker_ids: Vec<u64>,
    #[serde(default, rename = "_wcb_session_speakers")]
    pub speakers_text: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub track: Option<String>,
}

/// Linked resources included by `_embed=1`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Embedded {
    #[serde(default)]
    pub speakers: Vec<Post>,
    #[serde(default, rename = "wp:term")]
    pub terms: Vec<Vec<Term>>,
}

impl Embedded {
    pub fn tracks(&self) -> impl Iterator<Item = &Term> {
        self.terms
            .iter()
            .flatten()
            .filter(|t| t.taxonomy.as_deref() == Some(TRACK_TAXONOMY))
    }
}

/// A WordPress post reduced to what we need. Embedded entries can be error
/// objects, so nothing is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<Rendered>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Term {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub taxonomy: Option<String>,
}

/// The subset of the `/wp-json/` index we read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteIndex {
    #[serde(default)]
    pub timezone_string: Option<String>,
}

/// Split a sessions payload into records and the items that failed the schema.
pub fn decode_sessions(items: Vec<Value>) -> (Vec<SessionRecord>, Vec<MappingError>) {
    let mut records = Vec::with_capacity(items.len());
    let mut rejected = Vec::new();

    for item in items {
        let session_id = item.get("id").map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        match serde_json::from_value::<SessionRecord>(item) {
            Ok(record) => records.push(record),
            Err(e) => rejected.push(MappingError {
                session_id,
                reason: format!("unexpected record shape: {e}"),
            }),
        }
    }

    (records, rejected)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flexible {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Flexible {
    fn into_int<E: serde::de::Error>(self) -> Result<Option<i64>, E> {
        match self {
            Flexible::Int(n) => Ok(Some(n)),
            Flexible::Float(f) => Ok(Some(f as i64)),
            Flexible::Text(s) if s.trim().is_empty() => Ok(None),
            Flexible::Text(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| E::custom(format!("expected a number, got '{s}'"))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Flexible>),
    One(Flexible),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MetaField {
    Meta(SessionMeta),
    /// WordPress serializes an empty meta object as `[]`
    Empty(Vec<Value>),
}

fn flexible_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match Option::<Flexible>::deserialize(d)? {
        Some(value) => value.into_int(),
        None => Ok(None),
    }
}

/// Accept `[1, "2"]`, `3`, `"4"`, `null`; drop zeros (WordPress' "none").
fn id_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u64>, D::Error> {
    let values = match Option::<OneOrMany>::deserialize(d)? {
        Some(OneOrMany::Many(values)) => values,
        Some(OneOrMany::One(value)) => vec![value],
        None => Vec::new(),
    };

    let mut ids = Vec::with_capacity(values.len());
    for value in values {
        if let Some(id) = value.into_int::<D::Error>()? {
            if id > 0 {
                ids.push(id as u64);
            }
        }
    }
    Ok(ids)
}

fn meta_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<SessionMeta, D::Error> {
    Ok(match Option::<MetaField>::deserialize(d)? {
        Some(MetaField::Meta(meta)) => meta,
        Some(MetaField::Empty(_)) | None => SessionMeta::default(),
    })
}
