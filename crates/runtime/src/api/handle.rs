//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! advancing the simulation, acting as the keeper, or streaming events from
//! specific topics.
use tokio::sync::{broadcast, mpsc, oneshot};

use keeper_core::{EntityId, Position, SeatId, World};

use super::errors::{Result, RuntimeError};
use super::snapshot::{CreatureSummary, TickSummary, WorldSnapshot};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Run `ticks` ticks and return the summary of the last one
    pub async fn advance(&self, ticks: u32) -> Result<TickSummary> {
        self.request(|reply| Command::Advance { ticks, reply }).await
    }

    /// Serializable view of every creature and seat
    pub async fn snapshot(&self) -> Result<WorldSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Summary of a single creature
    pub async fn creature(&self, id: EntityId) -> Result<CreatureSummary> {
        let snapshot = self.snapshot().await?;
        snapshot
            .creature(id)
            .cloned()
            .ok_or(RuntimeError::UnknownCreature { id })
    }

    /// Query the current world (read-only clone)
    pub async fn query_world(&self) -> Result<World> {
        self.request(|reply| Command::QueryWorld { reply }).await
    }

    /// Lift a creature off the map, dropping whatever it was doing
    pub async fn pick_up(&self, creature: EntityId) -> Result<()> {
        self.request(|reply| Command::PickUp { creature, reply })
            .await?
    }

    /// Drop a held creature on a passable tile
    pub async fn drop_creature(&self, creature: EntityId, position: Position) -> Result<()> {
        self.request(|reply| Command::Drop {
            creature,
            position,
            reply,
        })
        .await?
    }

    /// Set (or clear with `None`) a seat's rally point
    pub async fn call_to_war(&self, seat: SeatId, rally: Option<Position>) -> Result<()> {
        self.request(|reply| Command::CallToWar { seat, rally, reply })
            .await?
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Simulation` - Animations, movement, digging, deaths
    /// - `Topic::Notification` - Rate-limited notices and chat for human keepers
    /// - `Topic::Tick` - One summary per tick
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
