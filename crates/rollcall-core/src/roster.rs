//! Ordered participant roster with id <-> display name lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ValidationError;

/// A tracked participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Platform user id
    pub id: String,

    /// Name used in report text
    pub name: String,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Configured participants in report order.
///
/// Both ids and names are unique: names are the join key when state is read
/// back from report text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    participants: Vec<Participant>,
    name_to_id: HashMap<String, String>,
    id_to_name: HashMap<String, String>,
}

impl Roster {
    /// Build a roster, rejecting duplicate ids or names.
    pub fn new(participants: Vec<Participant>) -> Result<Self, ValidationError> {
        let mut name_to_id = HashMap::with_capacity(participants.len());
        let mut id_to_name = HashMap::with_capacity(participants.len());

        for p in &participants {
            if id_to_name.insert(p.id.clone(), p.name.clone()).is_some() {
                return Err(ValidationError::DuplicateParticipantId(p.id.clone()));
            }
            if name_to_id.insert(p.name.clone(), p.id.clone()).is_some() {
                return Err(ValidationError::DuplicateParticipantName(p.name.clone()));
            }
        }

        Ok(Self {
            participants,
            name_to_id,
            id_to_name,
        })
    }

    /// Parse the `id:name,id:name` form used by `DISCORD_PARTICIPANTS`.
    ///
    /// Whitespace around entries is ignored and empty entries are skipped.
    pub fn parse(entries: &str) -> Result<Self, ValidationError> {
        let mut participants = Vec::new();
        for entry in entries.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (id, name) = entry
                .split_once(':')
                .ok_or_else(|| ValidationError::InvalidRosterEntry {
                    entry: entry.to_string(),
                    message: "expected id:name".into(),
                })?;
            let (id, name) = (id.trim(), name.trim());
            if id.is_empty() || name.is_empty() {
                return Err(ValidationError::InvalidRosterEntry {
                    entry: entry.to_string(),
                    message: "id and name must be non-empty".into(),
                });
            }
            participants.push(Participant::new(id, name));
        }
        Self::new(participants)
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.id_to_name.contains_key(id)
    }

    pub fn id_for_name(&self, name: &str) -> Option<&str> {
        self.name_to_id.get(name).map(String::as_str)
    }

    pub fn name_for_id(&self, id: &str) -> Option<&str> {
        self.id_to_name.get(id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_env_style_roster_in_order() {
        let roster = Roster::parse("1111:양광성, 2222:주현수").unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.participants()[0], Participant::new("1111", "양광성"));
        assert_eq!(roster.id_for_name("주현수"), Some("2222"));
        assert_eq!(roster.name_for_id("1111"), Some("양광성"));
    }

    #[test]
    fn rejects_entry_without_separator() {
        let err = Roster::parse("1111").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRosterEntry { .. }));
    }

    #[test]
    fn rejects_duplicates() {
        assert!(matches!(
            Roster::parse("1:Kim,1:Lee").unwrap_err(),
            ValidationError::DuplicateParticipantId(_)
        ));
        assert!(matches!(
            Roster::parse("1:Kim,2:Kim").unwrap_err(),
            ValidationError::DuplicateParticipantName(_)
        ));
    }

    #[test]
    fn empty_string_is_empty_roster() {
        assert!(Roster::parse("").unwrap().is_empty());
    }
}
