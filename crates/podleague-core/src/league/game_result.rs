// Per-player, per-round result records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AchievementId, GameResultId, PlayerId, PodId, TournamentId};

/// One player's outcome in one finalized round.
///
/// Points are frozen at finalization: later changes to an achievement's value
/// never touch existing results. Only the edit-round operation rewrites a
/// result, and it keeps the id and pod id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub id: GameResultId,
    pub tournament_id: TournamentId,
    pub week: u32,
    pub round: u32,
    pub player_id: PlayerId,
    pub placement: u8,
    pub placement_points: i64,
    pub achievement_points: i64,
    #[serde(default)]
    pub achievement_ids: Vec<AchievementId>,
    pub pod_id: PodId,
    pub timestamp: DateTime<Utc>,
}

impl GameResult {
    pub fn total_points(&self) -> i64 {
        self.placement_points + self.achievement_points
    }

    pub fn is_win(&self) -> bool {
        self.placement == 1
    }
}
