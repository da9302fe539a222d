// Rules engine: scoring, pod generation, weekly achievement rolls and the
// tournament round/week state machine.

pub mod achievements;
pub mod pods;
pub mod progression;
pub mod scoring;

/// Players per pod.
pub const POD_SIZE: usize = 4;
/// Rounds played in each week.
pub const ROUNDS_PER_WEEK: u32 = 3;
pub const MAX_TOTAL_WEEKS: u32 = 99;
pub const MAX_RANDOM_ACHIEVEMENTS: u32 = 99;
