//! Serde helper for backend fields that may arrive as an explicit `null`.
//!
//! `#[serde(default)]` only covers a missing key; pair it with
//! `deserialize_with = "nullable::deserialize"` to also map `null` to the
//! type's default.

use serde::{Deserialize, Deserializer};

pub(crate) fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
