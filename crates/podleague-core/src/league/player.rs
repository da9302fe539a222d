// Players and the achievement catalog.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AchievementId, PlayerId};
use crate::engine::scoring::MAX_ACHIEVEMENT_POINTS;

/// A league member and their all-time cumulative stats.
///
/// The cumulative fields are only ever changed by the orchestrator when a round
/// is finalized, undone or edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub placement_points: i64,
    #[serde(default)]
    pub achievement_points: i64,
    #[serde(default)]
    pub wins: i64,
    #[serde(default)]
    pub games_played: i64,
    #[serde(default)]
    pub tournaments_played: i64,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Player {
            id: Uuid::new_v4(),
            name: name.into(),
            placement_points: 0,
            achievement_points: 0,
            wins: 0,
            games_played: 0,
            tournaments_played: 0,
        }
    }

    /// Placement plus achievement points. Derived, never stored.
    pub fn total_points(&self) -> i64 {
        self.placement_points + self.achievement_points
    }
}

/// A bonus objective players can earn during a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: String,
    pub points: u32,
    /// Active every week instead of being a candidate for the weekly roll.
    #[serde(default)]
    pub always_on: bool,
}

impl Achievement {
    /// Create an achievement, clamping `points` into the allowed range.
    pub fn new(name: impl Into<String>, points: u32, always_on: bool) -> Self {
        Achievement {
            id: Uuid::new_v4(),
            name: name.into(),
            points: points.min(MAX_ACHIEVEMENT_POINTS),
            always_on,
        }
    }
}
