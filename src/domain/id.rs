use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// Backend-assigned identifier.
///
/// The backend may hand out numeric or textual ids. Both compare by their
/// textual form, and the received JSON shape is kept for outgoing payloads.
#[derive(Debug, Clone, Eq)]
pub struct WireId {
    value: String,
    numeric: bool,
}

impl WireId {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            numeric: false,
        }
    }

    pub fn number(value: i64) -> Self {
        Self {
            value: value.to_string(),
            numeric: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl PartialEq for WireId {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Hash for WireId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Serialize for WireId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self.numeric, self.value.parse::<i64>()) {
            (true, Ok(n)) => serializer.serialize_i64(n),
            _ => serializer.serialize_str(&self.value),
        }
    }
}

impl<'de> Deserialize<'de> for WireId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => WireId::number(n),
            Raw::Text(s) => WireId::text(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_text_ids_compare_by_text() {
        assert_eq!(WireId::number(7), WireId::text("7"));
        assert_ne!(WireId::number(7), WireId::text("07"));
    }

    #[test]
    fn test_id_keeps_json_shape() {
        let numeric: WireId = serde_json::from_str("42").unwrap();
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "42");

        let text: WireId = serde_json::from_str("\"66b1f0\"").unwrap();
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"66b1f0\"");
    }
}
