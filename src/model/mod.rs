pub mod department;
pub mod employee;
pub mod link;
pub mod role;
pub mod user;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Distinguishes an absent JSON member (`None`) from an explicit `null`
/// (`Some(None)`). Use together with `#[serde(default)]`.
pub(crate) fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Same as [`present`] for epoch-millisecond timestamps.
pub(crate) fn present_millis<'de, D>(
    deserializer: D,
) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    chrono::serde::ts_milliseconds_option::deserialize(deserializer).map(Some)
}
