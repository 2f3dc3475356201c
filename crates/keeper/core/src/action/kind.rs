/// Every behavior a creature can have on its stack.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::AsRefStr,
    strum::EnumCount,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Idle,
    WalkToTile,
    Fight,
    FightArena,
    AttackObject,
    Flee,
    SearchTileToDig,
    DigTile,
    SearchGroundTileToClaim,
    ClaimGroundTile,
    SearchWallTileToClaim,
    ClaimWallTile,
    SearchEntityToCarry,
    GrabEntity,
    CarryEntity,
    FindHome,
    Sleep,
    Job,
    SearchJob,
    UseRoom,
    Eat,
    SearchFood,
    EatChicken,
    UseHatchery,
    GetFee,
    LeaveDungeon,
    StealFreeGold,
}

impl ActionKind {
    #[inline]
    pub(crate) fn slot(self) -> usize {
        self as usize
    }

    /// Search actions counted in the seat's worker accounting.
    pub fn is_worker_search(self) -> bool {
        matches!(
            self,
            Self::SearchTileToDig
                | Self::SearchGroundTileToClaim
                | Self::SearchWallTileToClaim
                | Self::SearchEntityToCarry
        )
    }
}
