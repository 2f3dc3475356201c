use crate::action::ActionKind;
use crate::types::{Position, SeatId};

/// Worker search actions a seat keeps a head count of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum WorkerJob {
    Dig,
    ClaimGround,
    ClaimWall,
    Carry,
}

impl WorkerJob {
    pub fn for_action(kind: ActionKind) -> Option<Self> {
        match kind {
            ActionKind::SearchTileToDig => Some(Self::Dig),
            ActionKind::SearchGroundTileToClaim => Some(Self::ClaimGround),
            ActionKind::SearchWallTileToClaim => Some(Self::ClaimWall),
            ActionKind::SearchEntityToCarry => Some(Self::Carry),
            _ => None,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// A player slot: ownership, team and keeper-level settings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Seat {
    pub id: SeatId,
    pub team: u8,
    /// Human seats receive notifications and chat.
    pub is_human: bool,
    /// Fights started by this seat's creatures knock out instead of killing.
    pub ko_creatures: bool,
    pub call_to_war: Option<Position>,
    pub gold_mined: u64,
    pub research_points: u64,
    pub mana: f64,
    worker_jobs: [u32; 4],
}

impl Seat {
    pub fn new(id: SeatId, team: u8) -> Self {
        Self {
            id,
            team,
            is_human: false,
            ko_creatures: false,
            call_to_war: None,
            gold_mined: 0,
            research_points: 0,
            mana: 0.0,
            worker_jobs: [0; 4],
        }
    }

    pub fn human(mut self) -> Self {
        self.is_human = true;
        self
    }

    pub fn is_ally(&self, other: &Seat) -> bool {
        self.team == other.team
    }

    pub fn workers_doing(&self, job: WorkerJob) -> u32 {
        self.worker_jobs[job.slot()]
    }

    pub fn add_worker_job(&mut self, job: WorkerJob) {
        self.worker_jobs[job.slot()] += 1;
    }

    pub fn remove_worker_job(&mut self, job: WorkerJob) {
        let slot = &mut self.worker_jobs[job.slot()];
        *slot = slot.saturating_sub(1);
    }
}
