//! Simulation worker that owns the authoritative [`keeper_core::World`].
//!
//! Receives commands from [`RuntimeHandle`](crate::RuntimeHandle), runs one
//! upkeep per creature per tick, and publishes what happened to the EventBus.

use tokio::sync::{mpsc, oneshot};

use keeper_core::{
    EntityId, Pathfinder, Position, RngOracle, SeatId, SimEvent, SimulationContext, Tick,
    UpkeepOutcome, World, do_upkeep,
};
use tracing::{debug, info};

use super::economy;
use crate::api::{Result, RuntimeError, TickSummary, WorldSnapshot};
use crate::events::{Event, EventBus, NotificationEvent, NotificationLimiter, SimulationEvent};
use crate::runtime::RuntimeConfig;

/// Commands that can be sent to the simulation worker
pub enum Command {
    /// Run `ticks` ticks and return the summary of the last one.
    Advance {
        ticks: u32,
        reply: oneshot::Sender<TickSummary>,
    },
    /// Serializable view of the world.
    Snapshot {
        reply: oneshot::Sender<WorldSnapshot>,
    },
    /// Full clone of the world (read-only).
    QueryWorld { reply: oneshot::Sender<World> },
    /// The keeper lifts a creature into its hand.
    PickUp {
        creature: EntityId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// The keeper drops a held creature on a tile.
    Drop {
        creature: EntityId,
        position: Position,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Sets or clears a seat's rally point.
    CallToWar {
        seat: SeatId,
        rally: Option<Position>,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Background task that advances the dungeon.
///
/// The worker is the only owner of the world; clients only ever see clones
/// and snapshots.
pub struct SimulationWorker {
    world: World,
    tick: Tick,
    config: RuntimeConfig,
    rng: Box<dyn RngOracle>,
    pathfinder: Box<dyn Pathfinder>,
    limiter: NotificationLimiter,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
}

impl SimulationWorker {
    /// Creates a new simulation worker.
    pub fn new(
        world: World,
        config: RuntimeConfig,
        rng: Box<dyn RngOracle>,
        pathfinder: Box<dyn Pathfinder>,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        info!(
            "SimulationWorker initialized with creatures: {}, buildings: {}, seed: {}",
            world.creatures().count(),
            world.buildings().count(),
            config.seed
        );

        let limiter = NotificationLimiter::new(config.notification_window);
        Self {
            world,
            tick: Tick::ZERO,
            config,
            rng,
            pathfinder,
            limiter,
            command_rx,
            event_bus,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd);
                }
                else => break,
            }
        }
        debug!("SimulationWorker stopped at tick {}", self.tick);
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Advance { ticks, reply } => {
                let mut summary = TickSummary {
                    tick: self.tick,
                    ..TickSummary::default()
                };
                for _ in 0..ticks {
                    summary = self.run_tick();
                }
                if reply.send(summary).is_err() {
                    debug!("Advance reply channel closed (caller dropped)");
                }
            }
            Command::Snapshot { reply } => {
                let snapshot = WorldSnapshot::capture(&self.world, self.tick);
                if reply.send(snapshot).is_err() {
                    debug!("Snapshot reply channel closed (caller dropped)");
                }
            }
            Command::QueryWorld { reply } => {
                if reply.send(self.world.clone()).is_err() {
                    debug!("QueryWorld reply channel closed (caller dropped)");
                }
            }
            Command::PickUp { creature, reply } => {
                let result = self.world.pick_up_creature(creature).map_err(RuntimeError::from);
                if reply.send(result).is_err() {
                    debug!("PickUp reply channel closed (caller dropped)");
                }
            }
            Command::Drop {
                creature,
                position,
                reply,
            } => {
                let result = self
                    .world
                    .drop_creature(creature, position)
                    .map_err(RuntimeError::from);
                if reply.send(result).is_err() {
                    debug!("Drop reply channel closed (caller dropped)");
                }
            }
            Command::CallToWar { seat, rally, reply } => {
                let result = match self.world.seat_mut(seat) {
                    Some(s) => {
                        s.call_to_war = rally;
                        info!("Seat {} call to war: {:?}", seat, rally);
                        Ok(())
                    }
                    None => Err(RuntimeError::UnknownSeat { seat }),
                };
                if reply.send(result).is_err() {
                    debug!("CallToWar reply channel closed (caller dropped)");
                }
            }
        }
    }

    /// Advances the world by one tick.
    ///
    /// Creatures take their turn in id order; a creature that fails its upkeep
    /// is skipped for this tick without stopping the others.
    fn run_tick(&mut self) -> TickSummary {
        self.tick = self.tick.next();
        let tick = self.tick;
        let mut summary = TickSummary {
            tick,
            ..TickSummary::default()
        };

        if every(self.config.payday_interval, tick) {
            let paid = economy::pay_wages(&mut self.world);
            debug!("Payday: tick={}, paid={}", tick, paid);
        }
        let mut events = if every(self.config.chicken_interval, tick) {
            economy::breed_chickens(&mut self.world, self.rng.as_mut())
        } else {
            Vec::new()
        };

        let mut ctx = SimulationContext::new(
            &self.config.ai,
            self.rng.as_mut(),
            self.pathfinder.as_ref(),
            tick,
        );
        for id in self.world.creature_ids() {
            if self.world.creature(id).is_none() {
                continue;
            }
            match do_upkeep(&mut self.world, id, &mut ctx) {
                Ok(UpkeepOutcome::Acted { .. }) => summary.acted += 1,
                Ok(UpkeepOutcome::Removed) => summary.removed.push(id),
                Ok(_) => summary.idle += 1,
                // Already logged by the driver.
                Err(_) => summary.errors += 1,
            }
        }
        events.extend(ctx.take_events());

        self.publish_events(tick, events, &mut summary);
        debug!(
            "Tick: tick={}, acted={}, removed={}, errors={}, events={}",
            tick,
            summary.acted,
            summary.removed.len(),
            summary.errors,
            summary.events
        );
        self.event_bus.publish(Event::Tick(summary.clone()));
        summary
    }

    fn publish_events(&mut self, tick: Tick, events: Vec<SimEvent>, summary: &mut TickSummary) {
        summary.events = events.len();
        for event in events {
            match event {
                SimEvent::Notify { seat, notice } => {
                    if !self.limiter.allow(seat, notice.kind(), tick) {
                        summary.notifications_dropped += 1;
                        continue;
                    }
                    summary.notifications_sent += 1;
                    self.event_bus
                        .publish(Event::Notification(NotificationEvent::Notice {
                            tick,
                            seat,
                            notice,
                        }));
                }
                SimEvent::Chat { seat, message } => {
                    summary.notifications_sent += 1;
                    self.event_bus
                        .publish(Event::Notification(NotificationEvent::Chat {
                            tick,
                            seat,
                            message,
                        }));
                }
                event => self
                    .event_bus
                    .publish(Event::Simulation(SimulationEvent { tick, event })),
            }
        }
    }
}

fn every(interval: u64, tick: Tick) -> bool {
    interval > 0 && tick.0 % interval == 0
}
