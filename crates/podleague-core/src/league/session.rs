// Navigation/session record: which tournament is bound to the league flow and
// which step of the flow the UI is on.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::TournamentId;

/// Position in the league flow.
///
/// Stored as a plain string. Unknown strings decode to
/// [`Screen::TournamentList`] so older or newer shells never fail to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Screen {
    #[default]
    TournamentList,
    NewTournament,
    Attendance,
    Pods,
    FinalStandings,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::TournamentList => "tournament_list",
            Screen::NewTournament => "new_tournament",
            Screen::Attendance => "attendance",
            Screen::Pods => "pods",
            Screen::FinalStandings => "final_standings",
        }
    }

    /// Decode a stored screen name, falling back to the default variant.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "tournament_list" => Screen::TournamentList,
            "new_tournament" => Screen::NewTournament,
            "attendance" => Screen::Attendance,
            "pods" => Screen::Pods,
            "final_standings" => Screen::FinalStandings,
            _ => Screen::default(),
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Screen {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Screen {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Screen::from_str_lossy(&raw))
    }
}

/// The singleton session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueState {
    pub id: Uuid,
    pub active_tournament_id: Option<TournamentId>,
    #[serde(default)]
    pub current_screen: Screen,
}

impl LeagueState {
    pub fn new() -> Self {
        LeagueState {
            id: Uuid::new_v4(),
            active_tournament_id: None,
            current_screen: Screen::TournamentList,
        }
    }
}

impl Default for LeagueState {
    fn default() -> Self {
        Self::new()
    }
}
