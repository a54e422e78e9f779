use crate::domain::{id::WireId, nullable};
use crate::error::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned approver identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApproverId(WireId);

impl ApproverId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(WireId::text(id))
    }

    pub fn from_number(id: i64) -> Self {
        Self(WireId::number(id))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ApproverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A person eligible to approve change requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approver {
    pub id: ApproverId,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub first_name: String,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub last_name: String,
    /// Display name computed by the backend, when it sends one
    #[serde(default, rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub stored_full_name: Option<String>,
}

impl Approver {
    pub fn new(id: ApproverId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            stored_full_name: None,
        }
    }

    /// The backend's `fullName`, or first and last name separated by a space
    pub fn full_name(&self) -> String {
        match self.stored_full_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }

    /// Up to two uppercase initials, used for compact filter chips
    pub fn initials(&self) -> String {
        let full_name = self.full_name();
        let names: Vec<&str> = full_name.split_whitespace().collect();
        if names.len() >= 2 {
            names[..2]
                .iter()
                .filter_map(|n| n.chars().next())
                .flat_map(char::to_uppercase)
                .collect()
        } else {
            full_name.trim().chars().take(2).flat_map(char::to_uppercase).collect()
        }
    }
}

/// Payload for registering a new approver
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApprover {
    pub first_name: String,
    pub last_name: String,
}

impl NewApprover {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() {
            return Err(BoardError::Validation("First name is required".to_string()));
        }
        if self.last_name.trim().is_empty() {
            return Err(BoardError::Validation("Last name is required".to_string()));
        }
        Ok(())
    }
}

/// Partial update for an approver; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproverPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl ApproverPatch {
    pub fn validate(&self) -> Result<()> {
        for name in [&self.first_name, &self.last_name].into_iter().flatten() {
            if name.trim().is_empty() {
                return Err(BoardError::Validation("Approver names cannot be blank".to_string()));
            }
        }
        Ok(())
    }

    /// Applies the present fields; a rename drops the stale stored full name
    pub fn apply_to(&self, approver: &mut Approver) {
        if let Some(first_name) = &self.first_name {
            approver.first_name = first_name.clone();
            approver.stored_full_name = None;
        }
        if let Some(last_name) = &self.last_name {
            approver.last_name = last_name.clone();
            approver.stored_full_name = None;
        }
    }
}

/// An approver as referenced from a card.
///
/// The backend sends either the full record or a bare token. Bare tokens are
/// resolved against the approver directory once, at load time; anything the
/// directory does not know stays `Unresolved` and displays as the raw token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApproverRef {
    Resolved(Approver),
    Unresolved(ApproverId),
}

impl ApproverRef {
    /// Name shown on the card and matched by the approver filter
    pub fn display_name(&self) -> String {
        match self {
            Self::Resolved(approver) => approver.full_name(),
            Self::Unresolved(token) => token.as_str().to_string(),
        }
    }

    /// Id to send back to the backend, if the reference is known
    pub fn id(&self) -> &ApproverId {
        match self {
            Self::Resolved(approver) => &approver.id,
            Self::Unresolved(token) => token,
        }
    }

    /// Joins a bare token against the directory, by id first and then by full name
    pub fn resolve(self, directory: &[Approver]) -> ApproverRef {
        match self {
            Self::Unresolved(token) => directory
                .iter()
                .find(|a| a.id == token)
                .or_else(|| directory.iter().find(|a| a.full_name() == token.as_str()))
                .map(|a| Self::Resolved(a.clone()))
                .unwrap_or(Self::Unresolved(token)),
            resolved => resolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> Approver {
        Approver::new(ApproverId::from_number(1), "Jane", "Doe")
    }

    #[test]
    fn test_full_name_and_initials() {
        let approver = jane();
        assert_eq!(approver.full_name(), "Jane Doe");
        assert_eq!(approver.initials(), "JD");

        let mononym = Approver::new(ApproverId::new("x"), "cher", "");
        assert_eq!(mononym.initials(), "CH");
    }

    #[test]
    fn test_approver_ref_deserializes_both_shapes() {
        let refs: Vec<ApproverRef> = serde_json::from_str(
            r#"[{"id": 1, "firstName": "Jane", "lastName": "Doe", "fullName": "Jane Doe"}, 2, "legacy-token"]"#,
        )
        .unwrap();

        assert_eq!(refs[0].id(), &jane().id);
        assert_eq!(refs[0].display_name(), "Jane Doe");
        assert_eq!(refs[1], ApproverRef::Unresolved(ApproverId::from_number(2)));
        assert_eq!(refs[2].display_name(), "legacy-token");
    }

    #[test]
    fn test_backend_full_name_wins_until_renamed() {
        let mut approver: Approver = serde_json::from_str(
            r#"{"id": 4, "firstName": "Maria", "lastName": null, "fullName": "Maria da Silva"}"#,
        )
        .unwrap();
        assert_eq!(approver.last_name, "");
        assert_eq!(approver.full_name(), "Maria da Silva");
        assert_eq!(approver.initials(), "MD");

        ApproverPatch {
            last_name: Some("Souza".to_string()),
            ..Default::default()
        }
        .apply_to(&mut approver);
        assert_eq!(approver.full_name(), "Maria Souza");

        let blank: Approver =
            serde_json::from_str(r#"{"id": 5, "firstName": "Ana", "lastName": "Lima", "fullName": " "}"#)
                .unwrap();
        assert_eq!(blank.full_name(), "Ana Lima");
    }

    #[test]
    fn test_resolve_by_id_and_name() {
        let directory = vec![jane()];

        let by_id = ApproverRef::Unresolved(ApproverId::new("1")).resolve(&directory);
        assert_eq!(by_id, ApproverRef::Resolved(jane()));

        let by_name = ApproverRef::Unresolved(ApproverId::new("Jane Doe")).resolve(&directory);
        assert_eq!(by_name.display_name(), "Jane Doe");
        assert!(matches!(by_name, ApproverRef::Resolved(_)));
    }

    #[test]
    fn test_unknown_token_degrades_to_raw_display() {
        let unresolved = ApproverRef::Unresolved(ApproverId::new("99")).resolve(&[jane()]);
        assert_eq!(unresolved, ApproverRef::Unresolved(ApproverId::new("99")));
        assert_eq!(unresolved.display_name(), "99");
    }

    #[test]
    fn test_new_approver_validation() {
        assert!(NewApprover::new("Jane", "Doe").validate().is_ok());
        assert!(NewApprover::new("  ", "Doe").validate().is_err());
        assert!(NewApprover::new("Jane", "").validate().is_err());
    }

    #[test]
    fn test_patch_applies_present_fields() {
        let mut approver = jane();
        let patch = ApproverPatch {
            last_name: Some("Roe".to_string()),
            ..Default::default()
        };
        patch.apply_to(&mut approver);
        assert_eq!(approver.full_name(), "Jane Roe");

        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"lastName":"Roe"}"#);
    }
}
