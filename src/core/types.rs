//! Identifiers and actor kinds shared by every subsystem

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First block of the uuid is enough to tell characters apart in logs
        let id = self.0.simple().to_string();
        write!(f, "{}", &id[..8])
    }
}

/// Unique identifier for effect records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectId(pub Uuid);

impl EffectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Who controls a character.
///
/// Only player characters may resist morale damage or attempt recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActorKind {
    #[default]
    PlayerCharacter,
    NonPlayer,
    Minion,
}

impl ActorKind {
    pub fn can_resist_morale(&self) -> bool {
        matches!(self, ActorKind::PlayerCharacter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(CharacterId::new(), CharacterId::new());
        assert_ne!(EffectId::new(), EffectId::new());
    }

    #[test]
    fn test_character_id_display_is_short() {
        let id = CharacterId::new();
        assert_eq!(id.to_string().len(), 8);
    }

    #[test]
    fn test_only_player_characters_resist() {
        assert!(ActorKind::PlayerCharacter.can_resist_morale());
        assert!(!ActorKind::NonPlayer.can_resist_morale());
        assert!(!ActorKind::Minion.can_resist_morale());
    }
}
