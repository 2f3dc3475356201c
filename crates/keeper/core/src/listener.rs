//! Entity lifecycle listeners.
//!
//! An action that references another entity (a chicken to eat, a pile to
//! carry, an opponent, a room) registers a [`ListenerHandle`] on it. Before the
//! entity becomes invalid the world notifies every registered handle; the
//! action nulls its own reference and answers whether it keeps listening.
use std::collections::BTreeMap;

use crate::types::{ActionId, EntityId};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleEvent {
    Dead,
    RemovedFromMap,
    PickedUp,
    Dropped,
}

/// Points at one action record on one creature's stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListenerHandle {
    pub creature: EntityId,
    pub action: ActionId,
}

/// Observed entity -> registered listener handles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListenerRegistry {
    by_entity: BTreeMap<EntityId, Vec<ListenerHandle>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity: EntityId, handle: ListenerHandle) {
        let handles = self.by_entity.entry(entity).or_default();
        if !handles.contains(&handle) {
            handles.push(handle);
        }
    }

    pub fn unregister(&mut self, entity: EntityId, handle: ListenerHandle) {
        if let Some(handles) = self.by_entity.get_mut(&entity) {
            handles.retain(|h| *h != handle);
            if handles.is_empty() {
                self.by_entity.remove(&entity);
            }
        }
    }

    /// Drops every registration owned by `handle`, whatever it observes.
    pub fn unregister_action(&mut self, handle: ListenerHandle) {
        self.by_entity.retain(|_, handles| {
            handles.retain(|h| *h != handle);
            !handles.is_empty()
        });
    }

    /// Snapshot of the listeners of `entity` in registration order.
    pub fn handles_for(&self, entity: EntityId) -> Vec<ListenerHandle> {
        self.by_entity.get(&entity).cloned().unwrap_or_default()
    }

    pub fn is_registered(&self, entity: EntityId, handle: ListenerHandle) -> bool {
        self.by_entity
            .get(&entity)
            .is_some_and(|handles| handles.contains(&handle))
    }

    pub fn forget_entity(&mut self, entity: EntityId) {
        self.by_entity.remove(&entity);
    }

    pub fn len(&self) -> usize {
        self.by_entity.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(creature: u32, action: u32) -> ListenerHandle {
        ListenerHandle {
            creature: EntityId(creature),
            action: ActionId(action),
        }
    }

    #[test]
    fn register_is_idempotent() {
        let mut reg = ListenerRegistry::new();
        reg.register(EntityId(9), handle(1, 1));
        reg.register(EntityId(9), handle(1, 1));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unregister_action_clears_all_targets() {
        let mut reg = ListenerRegistry::new();
        reg.register(EntityId(9), handle(1, 1));
        reg.register(EntityId(10), handle(1, 1));
        reg.register(EntityId(10), handle(2, 4));
        reg.unregister_action(handle(1, 1));
        assert_eq!(reg.handles_for(EntityId(10)), vec![handle(2, 4)]);
        assert!(reg.handles_for(EntityId(9)).is_empty());
    }
}
