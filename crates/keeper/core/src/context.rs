//! Injected services and the per-creature turn view handed to handlers.
use crate::action::lifecycle::{acquire, clear_stack, release};
use crate::action::{Action, ActionKind, ActionRecord};
use crate::config::AiConfig;
use crate::creature::Creature;
use crate::env::{Pathfinder, RngOracle};
use crate::event::{AnimationState, PlayerNotice, SimEvent};
use crate::types::{ActionId, Tick};
use crate::world::World;

/// Everything a tick needs besides the world: tunables, randomness,
/// pathfinding, the current tick and an outbox for side effects.
pub struct SimulationContext<'a> {
    pub config: &'a AiConfig,
    pub rng: &'a mut dyn RngOracle,
    pub pathfinder: &'a dyn Pathfinder,
    pub tick: Tick,
    pub events: Vec<SimEvent>,
}

impl<'a> SimulationContext<'a> {
    pub fn new(
        config: &'a AiConfig,
        rng: &'a mut dyn RngOracle,
        pathfinder: &'a dyn Pathfinder,
        tick: Tick,
    ) -> Self {
        Self {
            config,
            rng,
            pathfinder,
            tick,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Hands out the events emitted so far.
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Handler result: keep dispatching this tick, or stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Re-dispatch against the (possibly new) top of the stack.
    Loop,
    /// The creature is done for this tick.
    Done,
}

impl Dispatch {
    pub fn from_loop(loop_back: bool) -> Self {
        if loop_back { Self::Loop } else { Self::Done }
    }
}

/// One creature's view of the simulation during its upkeep.
///
/// The creature is checked out of the world, so handlers hold both mutably.
pub struct Turn<'t, 'a> {
    pub creature: &'t mut Creature,
    pub world: &'t mut World,
    pub ctx: &'t mut SimulationContext<'a>,
}

impl<'t, 'a> Turn<'t, 'a> {
    pub fn new(
        creature: &'t mut Creature,
        world: &'t mut World,
        ctx: &'t mut SimulationContext<'a>,
    ) -> Self {
        Self {
            creature,
            world,
            ctx,
        }
    }

    pub fn config(&self) -> &'a AiConfig {
        self.ctx.config
    }

    // ========================================================================
    // Action stack
    // ========================================================================

    /// Pushes `action` unless its kind was already tried this tick.
    pub fn push(&mut self, action: Action) -> bool {
        self.push_with(action, false)
    }

    /// Pushes `action` even if its kind was already tried this tick.
    pub fn push_forced(&mut self, action: Action) -> bool {
        self.push_with(action, true)
    }

    fn push_with(&mut self, action: Action, forced: bool) -> bool {
        let kind = action.kind();
        if !self.creature.ai.stack.can_push(kind, forced) {
            tracing::trace!(
                "ActionStack: push rejected creature={}, kind={}",
                self.creature.id,
                kind
            );
            return false;
        }
        self.creature.ai.stack.insert(action);
        // Acquire on a detached copy so the creature and world can both be borrowed.
        let Some(mut record) = self.creature.ai.stack.remove_top() else {
            return false;
        };
        acquire(&mut record, self.creature, self.world);
        self.creature.ai.stack.restore_top(record);
        true
    }

    /// Pops the active action, releasing its holds. Reseeds Idle if the stack empties.
    pub fn pop(&mut self) -> Option<ActionRecord> {
        let record = self.creature.ai.stack.remove_top()?;
        release(&record, self.creature, self.world);
        if self.creature.ai.stack.is_empty() {
            self.creature.ai.stack.insert(Action::Idle);
        }
        Some(record)
    }

    /// Releases every action and leaves a single Idle on the stack.
    pub fn clear_action_queue(&mut self) {
        clear_stack(self.creature, self.world);
    }

    pub fn top(&self) -> Option<&ActionRecord> {
        self.creature.ai.stack.peek()
    }

    pub fn top_id(&self) -> Option<ActionId> {
        self.top().map(|r| r.id)
    }

    pub fn top_turns(&self) -> u32 {
        self.top().map_or(0, |r| r.turns)
    }

    /// Overwrites the payload of the active action.
    pub fn replace_top(&mut self, action: Action) {
        if let Some(record) = self.creature.ai.stack.peek_mut() {
            record.action = action;
        }
    }

    pub fn is_action_in_list(&self, kind: ActionKind) -> bool {
        self.creature.is_action_in_list(kind)
    }

    // ========================================================================
    // Side effects
    // ========================================================================

    pub fn emit(&mut self, event: SimEvent) {
        self.ctx.emit(event);
    }

    pub fn set_animation(&mut self, state: AnimationState, looping: bool) {
        self.ctx.emit(SimEvent::Animation {
            creature: self.creature.id,
            state,
            looping,
            facing: None,
        });
    }

    pub fn set_animation_facing(
        &mut self,
        state: AnimationState,
        looping: bool,
        facing: crate::types::Position,
    ) {
        self.ctx.emit(SimEvent::Animation {
            creature: self.creature.id,
            state,
            looping,
            facing: Some(facing),
        });
    }

    /// Advisory message to the creature's owner; dropped for AI seats.
    pub fn notify_player(&mut self, notice: PlayerNotice) {
        let seat = self.creature.seat;
        if self.world.is_human_seat(seat) {
            self.ctx.emit(SimEvent::Notify { seat, notice });
        }
    }

    pub fn chat(&mut self, message: String) {
        let seat = self.creature.seat;
        if self.world.is_human_seat(seat) {
            self.ctx.emit(SimEvent::Chat { seat, message });
        }
    }
}
