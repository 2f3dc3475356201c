use std::collections::VecDeque;

use strum::EnumCount;

use super::kind::ActionKind;
use super::record::{Action, ActionRecord};
use crate::listener::LifecycleEvent;
use crate::types::{ActionId, EntityId};

/// Per-creature LIFO of pending actions; the front is the active one.
///
/// This type only stores records. Acquiring and releasing the holds an action
/// owns (tile locks, room slots, carry locks, listeners) is done by
/// [`Turn`](crate::Turn), which wraps every push and pop.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionStack {
    records: VecDeque<ActionRecord>,
    tried: [bool; ActionKind::COUNT],
    next_id: u32,
}

impl ActionStack {
    /// A stack holding a single Idle record.
    pub fn new() -> Self {
        let mut stack = Self {
            records: VecDeque::new(),
            tried: [false; ActionKind::COUNT],
            next_id: 0,
        };
        stack.insert(Action::Idle);
        stack
    }

    fn allocate_id(&mut self) -> ActionId {
        let id = ActionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Whether a push of `kind` would be accepted this tick.
    pub fn can_push(&self, kind: ActionKind, forced: bool) -> bool {
        forced || !self.tried[kind.slot()]
    }

    pub fn was_tried(&self, kind: ActionKind) -> bool {
        self.tried[kind.slot()]
    }

    /// Pushes without consulting the tried set, marking the kind as tried.
    pub fn insert(&mut self, action: Action) -> ActionId {
        let id = self.allocate_id();
        self.tried[action.kind().slot()] = true;
        self.records.push_front(ActionRecord::new(id, action));
        id
    }

    pub fn remove_top(&mut self) -> Option<ActionRecord> {
        self.records.pop_front()
    }

    /// Puts a record taken with [`remove_top`](Self::remove_top) back on top.
    pub fn restore_top(&mut self, record: ActionRecord) {
        self.records.push_front(record);
    }

    /// Removes every record, top first.
    pub fn drain(&mut self) -> Vec<ActionRecord> {
        self.records.drain(..).collect()
    }

    pub fn peek(&self) -> Option<&ActionRecord> {
        self.records.front()
    }

    pub fn peek_mut(&mut self) -> Option<&mut ActionRecord> {
        self.records.front_mut()
    }

    pub fn top_kind(&self) -> Option<ActionKind> {
        self.peek().map(ActionRecord::kind)
    }

    pub fn get_mut(&mut self, id: ActionId) -> Option<&mut ActionRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub fn contains(&self, kind: ActionKind) -> bool {
        self.records.iter().any(|r| r.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Called at the start of each upkeep.
    pub fn reset_tried(&mut self) {
        self.tried = [false; ActionKind::COUNT];
    }

    /// Every record ages by one tick, not only the active one.
    pub fn tick_turns(&mut self) {
        for record in &mut self.records {
            record.turns = record.turns.saturating_add(1);
        }
    }

    /// Delivers a lifecycle event to one record. Returns whether it keeps listening.
    ///
    /// A record that no longer exists answers `false` so stale registrations
    /// are dropped.
    pub fn notify(&mut self, id: ActionId, entity: EntityId, event: LifecycleEvent) -> bool {
        match self.get_mut(id) {
            Some(record) => record.action.on_lifecycle(entity, event),
            None => false,
        }
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.records.iter().map(ActionRecord::kind).collect()
    }
}

impl Default for ActionStack {
    fn default() -> Self {
        Self::new()
    }
}
