//! Serialization utilities for server data
//!
//! The server emits timestamps without an offset (naive UTC) as well as
//! RFC 3339 strings depending on its version; both are accepted here.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Parse a server timestamp, treating naive values as UTC
pub fn parse_server_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Optional timestamp in either server format
///
/// # Usage
/// ```rust
/// use chrono::{DateTime, Utc};
/// use qcportal_domain::utils::serde::lenient_datetime;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Example {
///     #[serde(default, with = "lenient_datetime")]
///     created_on: Option<DateTime<Utc>>,
/// }
/// ```
pub mod lenient_datetime {
    use super::{parse_server_datetime, DateTime, Deserialize, Deserializer, Serializer, Utc};

    /// Serde serialization result type
    type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

    /// Serialize as RFC 3339, or null
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from RFC 3339 or naive UTC; unparseable values become `None`
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_server_datetime))
    }
}
