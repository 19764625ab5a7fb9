//! Characters in play and their all-or-nothing commits
//!
//! Every operation runs on a clone of the character. The clone is handed to
//! the store together with the effect delta; only when the store accepts it
//! does the clone replace the live character. A rejected commit leaves the
//! roster exactly as it was.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::character::Character;
use crate::core::error::{Result, RulesError};
use crate::core::types::CharacterId;
use crate::effects::EffectDelta;

/// What the host persists after one operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub character: Character,
    pub delta: EffectDelta,
}

/// Persistence boundary owned by the host
pub trait CharacterStore {
    /// Persist a commit atomically. An error means nothing was stored.
    fn commit(&mut self, id: CharacterId, commit: &Commit) -> Result<()>;
}

/// In-memory store with failure injection
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: AHashMap<CharacterId, Character>,
    history: Vec<(CharacterId, EffectDelta)>,
    failures_pending: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` commits
    pub fn fail_next(&mut self, count: usize) {
        self.failures_pending = count;
    }

    pub fn snapshot(&self, id: CharacterId) -> Option<&Character> {
        self.snapshots.get(&id)
    }

    /// Accepted commits, oldest first
    pub fn history(&self) -> &[(CharacterId, EffectDelta)] {
        &self.history
    }
}

impl CharacterStore for MemoryStore {
    fn commit(&mut self, id: CharacterId, commit: &Commit) -> Result<()> {
        if self.failures_pending > 0 {
            self.failures_pending -= 1;
            return Err(RulesError::Persistence(format!(
                "injected failure committing {}",
                commit.character.name
            )));
        }
        self.snapshots.insert(id, commit.character.clone());
        self.history.push((id, commit.delta.clone()));
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    characters: AHashMap<CharacterId, Character>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, character: Character) -> CharacterId {
        let id = character.id;
        self.characters.insert(id, character);
        id
    }

    pub fn get(&self, id: CharacterId) -> Result<&Character> {
        self.characters
            .get(&id)
            .ok_or(RulesError::CharacterNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = CharacterId> + '_ {
        self.characters.keys().copied()
    }

    /// Run `op` on a copy of the character and commit the result.
    ///
    /// The outer error is an engine fault (unknown character, rejected
    /// commit). The inner result is the operation's own outcome; a refused
    /// operation commits nothing.
    pub fn apply<T, E>(
        &mut self,
        id: CharacterId,
        store: &mut impl CharacterStore,
        op: impl FnOnce(&mut Character) -> std::result::Result<T, E>,
    ) -> Result<std::result::Result<T, E>> {
        let current = self.get(id)?;
        let mut working = current.clone();
        let outcome = match op(&mut working) {
            Ok(value) => value,
            Err(refusal) => return Ok(Err(refusal)),
        };

        if working == *current {
            return Ok(Ok(outcome));
        }

        let commit = Commit {
            delta: EffectDelta::between(&current.effects, &working.effects),
            character: working,
        };
        if let Err(err) = store.commit(id, &commit) {
            tracing::warn!(character = %commit.character.name, error = %err, "commit rejected; state rolled back");
            return Err(err);
        }

        tracing::debug!(
            character = %commit.character.name,
            added = commit.delta.added.len(),
            removed = commit.delta.removed.len(),
            modified = commit.delta.modified.len(),
            "committed"
        );
        self.characters.insert(id, commit.character);
        Ok(Ok(outcome))
    }

    /// `apply` for operations that cannot be refused
    pub fn update<T>(
        &mut self,
        id: CharacterId,
        store: &mut impl CharacterStore,
        op: impl FnOnce(&mut Character) -> T,
    ) -> Result<T> {
        match self.apply(id, store, |c| Ok::<T, std::convert::Infallible>(op(c)))? {
            Ok(value) => Ok(value),
            Err(never) => match never {},
        }
    }
}
