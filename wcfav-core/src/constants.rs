//! Default policy values.

use std::time::Duration;

use chrono_tz::Tz;

/// Query parameter holding the comma-separated favorite session ids.
pub const FAVORITES_PARAM: &str = "fav-sessions";

/// Identifiers per sessions request. Matches WordPress' default page size,
/// so a full chunk always fits in one page.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// WordPress rejects `per_page` above this.
pub const MAX_BATCH_SIZE: usize = 100;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Zone attached to naive timestamps when neither the command line nor the
/// site says otherwise.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

/// Length given to sessions that carry neither an end nor a duration.
pub const DEFAULT_SESSION_MINUTES: i64 = 30;

pub const DEFAULT_OUTPUT_FILE: &str = "wordcamp_favorites.ics";

pub const DEFAULT_CALENDAR_NAME: &str = "WordCamp Favorites";

pub const PRODID: &str = "-//WordCamp Favorites//Session Calendar//EN";

pub const USER_AGENT: &str = concat!("wcfav/", env!("CARGO_PKG_VERSION"));
