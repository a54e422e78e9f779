//! Calendar-date handling for card fields.
//!
//! Dates travel as ISO-8601 strings (`2024-03-01T03:00:00.000Z`) and are
//! shown as `DD/MM/YYYY` in the viewer's local time zone. Older records may
//! carry a bare `YYYY-MM-DD`, or an empty string for "not set".

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, TimeZone, Utc};

/// Parses a stored date string; blank or unparseable input yields `None`
pub fn parse_stored(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Formats a date for storage, millisecond precision with a `Z` suffix
pub fn format_for_storage(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Calendar day of the date in the local time zone
pub fn local_day(date: &DateTime<Utc>) -> NaiveDate {
    date.with_timezone(&Local).date_naive()
}

/// Formats a date as `DD/MM/YYYY`
pub fn format_for_display(date: &DateTime<Utc>) -> String {
    local_day(date).format("%d/%m/%Y").to_string()
}

/// Converts a picked calendar day into the stored instant (local midnight)
pub fn from_local_day(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Today's calendar day in the local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) mod required {
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_for_storage(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_stored(&raw).ok_or_else(|| D::Error::custom(format!("invalid date '{}'", raw)))
    }
}

pub(crate) mod optional {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&super::format_for_storage(date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_stored))
    }
}
