//! Favorites URL parsing.
//!
//! A WordCamp schedule page encodes the visitor's starred sessions in its
//! query string, e.g. `https://us.wordcamp.org/2025/schedule/?fav-sessions=1834,1952`.

use url::Url;

use crate::constants::FAVORITES_PARAM;
use crate::error::InvalidInputError;

/// The favorites found in a schedule URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteRequest {
    /// Session ids in the order they appear in the URL
    pub ids: Vec<String>,
    pub schedule_url: Url,
    /// Site root the REST API hangs off, without a trailing slash
    pub api_base: Url,
}

impl FavoriteRequest {
    /// Host of the WordCamp site, used to scope event UIDs.
    pub fn host(&self) -> &str {
        self.api_base.host_str().unwrap_or("wordcamp")
    }
}

/// Parse a schedule URL into its favorite ids and API base.
pub fn parse_favorites_url(schedule_url: &str) -> Result<FavoriteRequest, InvalidInputError> {
    let url = Url::parse(schedule_url.trim())
        .map_err(|e| InvalidInputError::new(format!("'{schedule_url}' is not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(InvalidInputError::new(format!(
            "unsupported URL scheme '{}', expected http or https",
            url.scheme()
        )));
    }

    let ids = extract_favorite_ids(&url)?;
    let api_base = api_base(&url);

    Ok(FavoriteRequest {
        ids,
        schedule_url: url,
        api_base,
    })
}

/// Pull the ids out of the first `fav-sessions` parameter.
pub fn extract_favorite_ids(url: &Url) -> Result<Vec<String>, InvalidInputError> {
    let value = url
        .query_pairs()
        .find(|(key, _)| key == FAVORITES_PARAM)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| {
            InvalidInputError::new(format!("no '{FAVORITES_PARAM}' parameter in URL"))
        })?;

    let ids: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    if ids.is_empty() {
        return Err(InvalidInputError::new(format!(
            "'{FAVORITES_PARAM}' parameter is empty"
        )));
    }

    if let Some(bad) = ids.iter().find(|id| !id.bytes().all(|b| b.is_ascii_digit())) {
        return Err(InvalidInputError::new(format!(
            "'{bad}' is not a numeric session id"
        )));
    }

    Ok(ids)
}

/// Strip query, fragment and the trailing `schedule` segment from a schedule URL.
pub fn api_base(schedule_url: &Url) -> Url {
    let mut base = schedule_url.clone();
    base.set_query(None);
    base.set_fragment(None);

    let path = base.path().trim_end_matches('/');
    let path = path
        .strip_suffix("/schedule")
        .unwrap_or(path)
        .trim_end_matches('/')
        .to_string();
    base.set_path(&path);
    base
}
