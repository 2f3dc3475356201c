/// Tunable parameters consumed by the creature AI.
///
/// Every field has an associated `DEFAULT_*` constant; fixtures adjust single
/// values with the builder-style `with_*` setters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AiConfig {
    /// A creature is weak when `hp < max_hp * weak_coefficient`.
    pub weak_coefficient: f64,
    /// Turns a non-forced search runs before returning to idle.
    pub nb_turns_before_checking_task: u32,
    /// Turns a flee action stays active.
    pub nb_turn_flee_max: u32,
    /// Fleeing creatures stop this many tiles short of the temple.
    pub flee_temple_stop_distance: usize,
    /// Max tiles walked per fight movement burst before re-targeting.
    pub fight_walk_burst: usize,
    /// Safety valve for handler loop-backs in one upkeep.
    pub max_dispatch_loops: u32,

    pub dig_coef_gold: f64,
    pub dig_coef_gem: f64,
    pub claim_exp_coef: f64,
    pub dig_exp_coef: f64,
    pub dig_complete_exp: f64,
    pub claim_complete_exp: f64,
    pub max_level: u32,

    pub death_counter_turns: u32,
    pub ko_turns: u32,
    pub steal_gold_amount: u32,

    // ===== eating =====
    pub hatchery_max_distance: f64,
    pub hatchery_nb_try: u32,
    pub chicken_hunger_decrease: f64,
    pub chicken_hp_increase: f64,
    pub eat_cooldown_min: u32,
    pub eat_cooldown_max: u32,

    // ===== sleeping =====
    pub sleep_awakeness_gain: f64,
    pub sleep_hp_gain: f64,

    // ===== mood =====
    pub mood_recompute_turns: u32,
    pub mood_upset_points: i32,
    pub mood_angry_points: i32,
    pub mood_furious_points: i32,
    pub mood_neutral_points: i32,
    pub nb_turns_furious_max: u64,
    pub bad_mood_flee_chance: f64,
    pub upset_quit_job_chance: f64,
    pub allied_natural_enemy_chance: f64,
    pub furious_leave_chance: f64,

    /// Squared-distance cutoff for answering a seat's call to war.
    pub call_to_war_cutoff: i64,
}

impl AiConfig {
    pub const DEFAULT_WEAK_COEFFICIENT: f64 = 1.0 / 3.0;
    pub const DEFAULT_NB_TURNS_BEFORE_CHECKING_TASK: u32 = 15;
    pub const DEFAULT_NB_TURN_FLEE_MAX: u32 = 5;
    pub const DEFAULT_FLEE_TEMPLE_STOP_DISTANCE: usize = 5;
    pub const DEFAULT_FIGHT_WALK_BURST: usize = 3;
    pub const DEFAULT_MAX_DISPATCH_LOOPS: u32 = 20;

    pub const DEFAULT_DIG_COEF_GOLD: f64 = 5.0;
    pub const DEFAULT_DIG_COEF_GEM: f64 = 1.0;
    pub const DEFAULT_CLAIM_EXP_COEF: f64 = 1.5;
    pub const DEFAULT_DIG_EXP_COEF: f64 = 1.5;
    pub const DEFAULT_DIG_COMPLETE_EXP: f64 = 2.5;
    pub const DEFAULT_CLAIM_COMPLETE_EXP: f64 = 1.5;
    pub const DEFAULT_MAX_LEVEL: u32 = 30;

    pub const DEFAULT_DEATH_COUNTER_TURNS: u32 = 10;
    pub const DEFAULT_KO_TURNS: u32 = 30;
    pub const DEFAULT_STEAL_GOLD_AMOUNT: u32 = 500;

    pub const DEFAULT_HATCHERY_MAX_DISTANCE: f64 = 40.0;
    pub const DEFAULT_HATCHERY_NB_TRY: u32 = 5;
    pub const DEFAULT_CHICKEN_HUNGER_DECREASE: f64 = 20.0;
    pub const DEFAULT_CHICKEN_HP_INCREASE: f64 = 5.0;
    pub const DEFAULT_EAT_COOLDOWN_MIN: u32 = 3;
    pub const DEFAULT_EAT_COOLDOWN_MAX: u32 = 8;

    pub const DEFAULT_SLEEP_AWAKENESS_GAIN: f64 = 1.5;
    pub const DEFAULT_SLEEP_HP_GAIN: f64 = 1.0;

    pub const DEFAULT_MOOD_RECOMPUTE_TURNS: u32 = 5;
    pub const DEFAULT_MOOD_NEUTRAL_POINTS: i32 = 0;
    pub const DEFAULT_MOOD_UPSET_POINTS: i32 = -100;
    pub const DEFAULT_MOOD_ANGRY_POINTS: i32 = -200;
    pub const DEFAULT_MOOD_FURIOUS_POINTS: i32 = -300;
    pub const DEFAULT_NB_TURNS_FURIOUS_MAX: u64 = 90;
    pub const DEFAULT_BAD_MOOD_FLEE_CHANCE: f64 = 0.2;
    pub const DEFAULT_UPSET_QUIT_JOB_CHANCE: f64 = 0.2;
    pub const DEFAULT_ALLIED_NATURAL_ENEMY_CHANCE: f64 = 0.2;
    pub const DEFAULT_FURIOUS_LEAVE_CHANCE: f64 = 0.2;

    pub const DEFAULT_CALL_TO_WAR_CUTOFF: i64 = 20 * 20;

    pub fn new() -> Self {
        Self {
            weak_coefficient: Self::DEFAULT_WEAK_COEFFICIENT,
            nb_turns_before_checking_task: Self::DEFAULT_NB_TURNS_BEFORE_CHECKING_TASK,
            nb_turn_flee_max: Self::DEFAULT_NB_TURN_FLEE_MAX,
            flee_temple_stop_distance: Self::DEFAULT_FLEE_TEMPLE_STOP_DISTANCE,
            fight_walk_burst: Self::DEFAULT_FIGHT_WALK_BURST,
            max_dispatch_loops: Self::DEFAULT_MAX_DISPATCH_LOOPS,
            dig_coef_gold: Self::DEFAULT_DIG_COEF_GOLD,
            dig_coef_gem: Self::DEFAULT_DIG_COEF_GEM,
            claim_exp_coef: Self::DEFAULT_CLAIM_EXP_COEF,
            dig_exp_coef: Self::DEFAULT_DIG_EXP_COEF,
            dig_complete_exp: Self::DEFAULT_DIG_COMPLETE_EXP,
            claim_complete_exp: Self::DEFAULT_CLAIM_COMPLETE_EXP,
            max_level: Self::DEFAULT_MAX_LEVEL,
            death_counter_turns: Self::DEFAULT_DEATH_COUNTER_TURNS,
            ko_turns: Self::DEFAULT_KO_TURNS,
            steal_gold_amount: Self::DEFAULT_STEAL_GOLD_AMOUNT,
            hatchery_max_distance: Self::DEFAULT_HATCHERY_MAX_DISTANCE,
            hatchery_nb_try: Self::DEFAULT_HATCHERY_NB_TRY,
            chicken_hunger_decrease: Self::DEFAULT_CHICKEN_HUNGER_DECREASE,
            chicken_hp_increase: Self::DEFAULT_CHICKEN_HP_INCREASE,
            eat_cooldown_min: Self::DEFAULT_EAT_COOLDOWN_MIN,
            eat_cooldown_max: Self::DEFAULT_EAT_COOLDOWN_MAX,
            sleep_awakeness_gain: Self::DEFAULT_SLEEP_AWAKENESS_GAIN,
            sleep_hp_gain: Self::DEFAULT_SLEEP_HP_GAIN,
            mood_recompute_turns: Self::DEFAULT_MOOD_RECOMPUTE_TURNS,
            mood_neutral_points: Self::DEFAULT_MOOD_NEUTRAL_POINTS,
            mood_upset_points: Self::DEFAULT_MOOD_UPSET_POINTS,
            mood_angry_points: Self::DEFAULT_MOOD_ANGRY_POINTS,
            mood_furious_points: Self::DEFAULT_MOOD_FURIOUS_POINTS,
            nb_turns_furious_max: Self::DEFAULT_NB_TURNS_FURIOUS_MAX,
            bad_mood_flee_chance: Self::DEFAULT_BAD_MOOD_FLEE_CHANCE,
            upset_quit_job_chance: Self::DEFAULT_UPSET_QUIT_JOB_CHANCE,
            allied_natural_enemy_chance: Self::DEFAULT_ALLIED_NATURAL_ENEMY_CHANCE,
            furious_leave_chance: Self::DEFAULT_FURIOUS_LEAVE_CHANCE,
            call_to_war_cutoff: Self::DEFAULT_CALL_TO_WAR_CUTOFF,
        }
    }

    pub fn with_weak_coefficient(mut self, weak_coefficient: f64) -> Self {
        self.weak_coefficient = weak_coefficient;
        self
    }

    pub fn with_dig_coef_gold(mut self, coef: f64) -> Self {
        self.dig_coef_gold = coef;
        self
    }

    pub fn with_nb_turns_before_checking_task(mut self, turns: u32) -> Self {
        self.nb_turns_before_checking_task = turns;
        self
    }

    pub fn with_max_dispatch_loops(mut self, loops: u32) -> Self {
        self.max_dispatch_loops = loops;
        self
    }

    pub fn with_death_counter_turns(mut self, turns: u32) -> Self {
        self.death_counter_turns = turns;
        self
    }

    pub fn with_nb_turns_furious_max(mut self, turns: u64) -> Self {
        self.nb_turns_furious_max = turns;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::new()
    }
}
