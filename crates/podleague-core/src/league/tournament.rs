// Tournament entity: season metadata plus the live week/round progression
// state and the snapshot history used for undo and edit.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AchievementId, PlayerId, PodId, TournamentId};
use crate::engine::{MAX_RANDOM_ACHIEVEMENTS, MAX_TOTAL_WEEKS, ROUNDS_PER_WEEK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    #[default]
    Ongoing,
    Completed,
}

/// Points a player has collected in the current week. Reset every week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyPlayerPoints {
    pub placement_points: i64,
    pub achievement_points: i64,
}

impl WeeklyPlayerPoints {
    pub fn total(&self) -> i64 {
        self.placement_points + self.achievement_points
    }
}

/// One staged achievement credit: `player_id` earned `achievement_id` this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AchievementCheck {
    pub player_id: PlayerId,
    pub achievement_id: AchievementId,
}

/// The exact additive change a finalized round applied to one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDelta {
    pub player_id: PlayerId,
    pub placement_points: i64,
    pub achievement_points: i64,
    pub wins: i64,
    pub games_played: i64,
}

/// Reversible record of one finalized round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSnapshot {
    /// Pod ids stamped on the round's game results, one per pod.
    pub pod_ids: Vec<PodId>,
    pub week: u32,
    pub round: u32,
    pub placements: BTreeMap<PlayerId, u8>,
    #[serde(default)]
    pub achievement_checks: BTreeSet<AchievementCheck>,
    pub deltas: Vec<PlayerDelta>,
    /// Whether achievements counted when this round was scored.
    pub achievements_on: bool,
    #[serde(default)]
    pub pods: Vec<Vec<PlayerId>>,
    /// Present only when this round closed out a week.
    #[serde(default)]
    pub week_boundary: Option<WeekBoundary>,
}

/// The transient state of a week that ended, captured so undo can restore it
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekBoundary {
    pub week: u32,
    pub present_player_ids: Vec<PlayerId>,
    pub weekly_points: BTreeMap<PlayerId, WeeklyPlayerPoints>,
    pub active_achievement_ids: Vec<AchievementId>,
    pub achievements_on_this_week: bool,
    pub pod_history: Vec<PodSnapshot>,
}

/// One league season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub total_weeks: u32,
    pub random_achievements_per_week: u32,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: TournamentStatus,
    /// Players selected when the tournament was created.
    #[serde(default)]
    pub player_ids: Vec<PlayerId>,

    // Live progression state, meaningful only while ongoing.
    pub current_week: u32,
    pub current_round: u32,
    #[serde(default)]
    pub present_player_ids: Vec<PlayerId>,
    #[serde(default)]
    pub weekly_points: BTreeMap<PlayerId, WeeklyPlayerPoints>,
    #[serde(default)]
    pub active_achievement_ids: Vec<AchievementId>,
    #[serde(default = "default_achievements_on")]
    pub achievements_on_this_week: bool,
    #[serde(default)]
    pub round_placements: BTreeMap<PlayerId, u8>,
    #[serde(default)]
    pub round_achievement_checks: BTreeSet<AchievementCheck>,
    /// Pods generated for the in-progress round.
    #[serde(default)]
    pub current_pods: Vec<Vec<PlayerId>>,
    #[serde(default)]
    pub pod_history: Vec<PodSnapshot>,
}

fn default_achievements_on() -> bool {
    true
}

impl Tournament {
    /// Start a new tournament at week 1, round 1.
    ///
    /// `total_weeks` is clamped to 1..=99 and `random_achievements_per_week`
    /// to 0..=99.
    pub fn new(
        name: impl Into<String>,
        total_weeks: u32,
        random_achievements_per_week: u32,
        player_ids: Vec<PlayerId>,
        active_achievement_ids: Vec<AchievementId>,
        now: DateTime<Utc>,
    ) -> Self {
        Tournament {
            id: Uuid::new_v4(),
            name: name.into(),
            total_weeks: total_weeks.clamp(1, MAX_TOTAL_WEEKS),
            random_achievements_per_week: random_achievements_per_week
                .min(MAX_RANDOM_ACHIEVEMENTS),
            start_date: now,
            end_date: None,
            status: TournamentStatus::Ongoing,
            player_ids,
            current_week: 1,
            current_round: 1,
            present_player_ids: Vec::new(),
            weekly_points: BTreeMap::new(),
            active_achievement_ids,
            achievements_on_this_week: true,
            round_placements: BTreeMap::new(),
            round_achievement_checks: BTreeSet::new(),
            current_pods: Vec::new(),
            pod_history: Vec::new(),
        }
    }

    pub fn is_ongoing(&self) -> bool {
        self.status == TournamentStatus::Ongoing
    }

    pub fn is_final_round_of_week(&self) -> bool {
        self.current_round >= ROUNDS_PER_WEEK
    }

    pub fn is_final_week(&self) -> bool {
        self.current_week >= self.total_weeks
    }

    /// True once anything has been recorded for the current week: staged
    /// placements, generated pods, or finalized rounds.
    pub fn has_round_data(&self) -> bool {
        !self.round_placements.is_empty()
            || !self.current_pods.is_empty()
            || !self.pod_history.is_empty()
    }

    pub fn clear_staging(&mut self) {
        self.round_placements.clear();
        self.round_achievement_checks.clear();
        self.current_pods.clear();
    }

    pub fn weekly_points_for(&self, player_id: PlayerId) -> WeeklyPlayerPoints {
        self.weekly_points
            .get(&player_id)
            .copied()
            .unwrap_or_default()
    }
}
