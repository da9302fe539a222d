// League entities: players, achievements, tournaments, game results and the
// navigation session record.

pub mod game_result;
pub mod player;
pub mod session;
pub mod tournament;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PlayerId = Uuid;
pub type AchievementId = Uuid;
pub type TournamentId = Uuid;
pub type PodId = Uuid;
pub type GameResultId = Uuid;

pub use game_result::GameResult;
pub use player::{Achievement, Player};
pub use session::{LeagueState, Screen};
pub use tournament::{
    AchievementCheck, PlayerDelta, PodSnapshot, Tournament, TournamentStatus, WeekBoundary,
    WeeklyPlayerPoints,
};

/// The complete set of entity collections the league engine operates on.
///
/// This is exactly what durable storage snapshots and restores. `league_states`
/// is a collection only because storage may hand back zero or several rows;
/// [`crate::orchestrator::League::validate_and_sanitize_state`] collapses it to
/// exactly one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueData {
    pub players: Vec<Player>,
    pub achievements: Vec<Achievement>,
    pub tournaments: Vec<Tournament>,
    pub game_results: Vec<GameResult>,
    pub league_states: Vec<LeagueState>,
}

impl LeagueData {
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn achievement(&self, id: AchievementId) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn tournament(&self, id: TournamentId) -> Option<&Tournament> {
        self.tournaments.iter().find(|t| t.id == id)
    }

    pub fn tournament_mut(&mut self, id: TournamentId) -> Option<&mut Tournament> {
        self.tournaments.iter_mut().find(|t| t.id == id)
    }
}
