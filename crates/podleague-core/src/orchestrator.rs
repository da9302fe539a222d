// League orchestrator: the single mutator of the entity collections. Each
// public operation either applies completely or (when its precondition is not
// met) changes nothing, and moves the navigation screen along with it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::engine::achievements::roll_active_achievements;
use crate::engine::pods::generate_pods;
use crate::engine::progression::{self, RoundTransition, UndoOutcome};
use crate::engine::scoring::MAX_ACHIEVEMENT_POINTS;
use crate::engine::MAX_RANDOM_ACHIEVEMENTS;
use crate::league::{
    Achievement, AchievementCheck, AchievementId, GameResult, LeagueData, LeagueState, Player,
    PlayerId, Screen, Tournament, TournamentId,
};

/// Achievement seeded into an empty catalog by
/// [`League::validate_and_sanitize_state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultAchievement {
    pub name: String,
    pub points: u32,
    pub always_on: bool,
}

impl Default for DefaultAchievement {
    fn default() -> Self {
        DefaultAchievement {
            name: "Commander Kill".to_string(),
            points: 1,
            always_on: false,
        }
    }
}

/// Values pre-filled on the new-tournament form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentDefaults {
    pub total_weeks: u32,
    pub random_achievements_per_week: u32,
}

impl Default for TournamentDefaults {
    fn default() -> Self {
        TournamentDefaults {
            total_weeks: 8,
            random_achievements_per_week: 2,
        }
    }
}

/// Owns the league collections and exposes every engine operation.
pub struct League {
    data: LeagueData,
    default_achievement: DefaultAchievement,
    tournament_defaults: TournamentDefaults,
    rng: StdRng,
}

impl League {
    /// Wrap restored (or empty) collections. Call
    /// [`validate_and_sanitize_state`](Self::validate_and_sanitize_state)
    /// afterwards to guarantee the session singleton exists.
    pub fn new(data: LeagueData, default_achievement: DefaultAchievement) -> Self {
        League {
            data,
            default_achievement,
            tournament_defaults: TournamentDefaults::default(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Like [`League::new`] but with a deterministic RNG.
    pub fn with_seed(data: LeagueData, default_achievement: DefaultAchievement, seed: u64) -> Self {
        League {
            data,
            default_achievement,
            tournament_defaults: TournamentDefaults::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_tournament_defaults(mut self, defaults: TournamentDefaults) -> Self {
        self.tournament_defaults = defaults;
        self
    }

    pub fn tournament_defaults(&self) -> TournamentDefaults {
        self.tournament_defaults
    }

    pub fn data(&self) -> &LeagueData {
        &self.data
    }

    pub fn into_data(self) -> LeagueData {
        self.data
    }

    pub fn players(&self) -> &[Player] {
        &self.data.players
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.data.achievements
    }

    pub fn tournaments(&self) -> &[Tournament] {
        &self.data.tournaments
    }

    pub fn game_results(&self) -> &[GameResult] {
        &self.data.game_results
    }

    /// The session record. Falls back to a default view if sanitize has not
    /// run yet.
    pub fn session(&self) -> LeagueState {
        self.data.league_states.first().cloned().unwrap_or_default()
    }

    pub fn current_screen(&self) -> Screen {
        self.session().current_screen
    }

    fn session_mut(&mut self) -> &mut LeagueState {
        if self.data.league_states.is_empty() {
            self.data.league_states.push(LeagueState::new());
        }
        &mut self.data.league_states[0]
    }

    fn navigate(&mut self, screen: Screen) {
        debug!("Navigating to {}", screen);
        self.session_mut().current_screen = screen;
    }

    pub fn active_tournament(&self) -> Option<&Tournament> {
        let id = self.session().active_tournament_id?;
        self.data.tournament(id)
    }

    fn active_tournament_id(&self) -> Option<TournamentId> {
        self.active_tournament().map(|t| t.id)
    }

    /// Pods generated for the active tournament's in-progress round.
    pub fn current_pods(&self) -> Vec<Vec<PlayerId>> {
        self.active_tournament()
            .map(|t| t.current_pods.clone())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Startup
    // ------------------------------------------------------------------

    /// Ensure exactly one session record exists and the achievement catalog
    /// is not empty. Leaves everything else untouched and is safe to call
    /// repeatedly.
    pub fn validate_and_sanitize_state(&mut self) {
        match self.data.league_states.len() {
            0 => {
                info!("No league state found, creating one");
                self.data.league_states.push(LeagueState::new());
            }
            1 => {}
            n => {
                warn!("Found {} league states, keeping the first", n);
                self.data.league_states.truncate(1);
            }
        }

        if self.data.achievements.is_empty() {
            let seed = &self.default_achievement;
            info!("Seeding default achievement '{}'", seed.name);
            self.data
                .achievements
                .push(Achievement::new(seed.name.clone(), seed.points, seed.always_on));
        }
    }

    // ------------------------------------------------------------------
    // Roster and catalog
    // ------------------------------------------------------------------

    pub fn add_player(&mut self, name: &str) -> Option<PlayerId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let player = Player::new(name);
        let id = player.id;
        self.data.players.push(player);
        info!("Added player '{}'", name);
        Some(id)
    }

    pub fn rename_player(&mut self, id: PlayerId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        match self.data.player_mut(id) {
            Some(player) => {
                player.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn add_achievement(
        &mut self,
        name: &str,
        points: u32,
        always_on: bool,
    ) -> Option<AchievementId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let achievement = Achievement::new(name, points, always_on);
        let id = achievement.id;
        self.data.achievements.push(achievement);
        Some(id)
    }

    /// Change an achievement's value or always-on flag. Recorded results keep
    /// the points they were scored with.
    pub fn update_achievement(&mut self, id: AchievementId, points: u32, always_on: bool) -> bool {
        match self.data.achievements.iter_mut().find(|a| a.id == id) {
            Some(achievement) => {
                achievement.points = points.min(MAX_ACHIEVEMENT_POINTS);
                achievement.always_on = always_on;
                true
            }
            None => false,
        }
    }

    pub fn remove_achievement(&mut self, id: AchievementId) -> bool {
        let before = self.data.achievements.len();
        self.data.achievements.retain(|a| a.id != id);
        before != self.data.achievements.len()
    }

    // ------------------------------------------------------------------
    // Tournament flow
    // ------------------------------------------------------------------

    pub fn begin_new_tournament(&mut self) {
        self.navigate(Screen::NewTournament);
    }

    /// Create a tournament, bind it as active and go to attendance.
    ///
    /// Unknown player ids are dropped. Every selected player's
    /// `tournaments_played` goes up by one.
    pub fn create_tournament(
        &mut self,
        name: &str,
        total_weeks: u32,
        random_per_week: u32,
        player_ids: &[PlayerId],
    ) -> TournamentId {
        let mut seen = BTreeSet::new();
        let selected: Vec<PlayerId> = player_ids
            .iter()
            .copied()
            .filter(|id| self.data.player(*id).is_some() && seen.insert(*id))
            .collect();

        let active = roll_active_achievements(
            &self.data.achievements,
            random_per_week.min(MAX_RANDOM_ACHIEVEMENTS),
            &mut self.rng,
        );
        let tournament = Tournament::new(
            name.trim(),
            total_weeks,
            random_per_week,
            selected.clone(),
            active,
            Utc::now(),
        );
        let id = tournament.id;

        for player in self.data.players.iter_mut().filter(|p| selected.contains(&p.id)) {
            player.tournaments_played += 1;
        }
        info!(
            "Created tournament '{}' ({} weeks, {} players)",
            tournament.name,
            tournament.total_weeks,
            selected.len()
        );
        self.data.tournaments.push(tournament);

        let session = self.session_mut();
        session.active_tournament_id = Some(id);
        session.current_screen = Screen::Attendance;
        id
    }

    /// Create a tournament using the configured week count and random
    /// achievements per week.
    pub fn create_tournament_with_defaults(
        &mut self,
        name: &str,
        player_ids: &[PlayerId],
    ) -> TournamentId {
        let TournamentDefaults {
            total_weeks,
            random_achievements_per_week,
        } = self.tournament_defaults;
        self.create_tournament(name, total_weeks, random_achievements_per_week, player_ids)
    }

    /// Record this week's attendance and move to the pod step.
    pub fn confirm_attendance(&mut self, present_ids: &[PlayerId], achievements_on: bool) -> bool {
        let Some(id) = self.active_tournament_id() else {
            return false;
        };
        let present: Vec<PlayerId> = present_ids
            .iter()
            .copied()
            .filter(|pid| {
                let known = self.data.player(*pid).is_some();
                if !known {
                    warn!("Ignoring unknown player {} in attendance", pid);
                }
                known
            })
            .collect();

        let Some(tournament) = self.data.tournament_mut(id) else {
            return false;
        };
        if !tournament.is_ongoing() {
            return false;
        }
        progression::confirm_attendance(tournament, &present, achievements_on);
        info!(
            "Week {} attendance: {} present, achievements {}",
            tournament.current_week,
            tournament.present_player_ids.len(),
            if achievements_on { "on" } else { "off" }
        );
        self.navigate(Screen::Pods);
        true
    }

    /// Generate and store pods for the in-progress round.
    pub fn generate_pods(&mut self) -> Vec<Vec<PlayerId>> {
        let Some(id) = self.active_tournament_id() else {
            return Vec::new();
        };
        let LeagueData {
            players,
            tournaments,
            ..
        } = &mut self.data;
        let Some(tournament) = tournaments.iter_mut().find(|t| t.id == id) else {
            return Vec::new();
        };
        if !tournament.is_ongoing() {
            return Vec::new();
        }

        let pods: Vec<Vec<PlayerId>> = generate_pods(
            players,
            &tournament.present_player_ids,
            tournament.current_round,
            &tournament.weekly_points,
            &mut self.rng,
        )
        .into_iter()
        .map(|pod| pod.into_iter().map(|p| p.id).collect())
        .collect();

        debug!(
            "Generated {} pods for week {} round {}",
            pods.len(),
            tournament.current_week,
            tournament.current_round
        );
        tournament.current_pods = pods.clone();
        pods
    }

    pub fn update_placement(&mut self, player_id: PlayerId, placement: Option<u8>) -> bool {
        match self.active_ongoing_mut() {
            Some(tournament) => progression::update_placement(tournament, player_id, placement),
            None => false,
        }
    }

    pub fn update_achievement_check(
        &mut self,
        player_id: PlayerId,
        achievement_id: AchievementId,
        checked: bool,
    ) -> bool {
        match self.active_ongoing_mut() {
            Some(tournament) => {
                progression::update_achievement_check(
                    tournament,
                    player_id,
                    achievement_id,
                    checked,
                );
                true
            }
            None => false,
        }
    }

    fn active_ongoing_mut(&mut self) -> Option<&mut Tournament> {
        let id = self.active_tournament_id()?;
        self.data.tournament_mut(id).filter(|t| t.is_ongoing())
    }

    /// Finalize the staged round (`nextRound`). No-op when nothing is staged.
    pub fn finalize_round(&mut self) -> Option<RoundTransition> {
        let id = self.active_tournament_id()?;
        let LeagueData {
            players,
            achievements,
            tournaments,
            game_results,
            ..
        } = &mut self.data;
        let tournament = tournaments.iter_mut().find(|t| t.id == id)?;

        let transition = progression::finalize_round(
            tournament,
            players,
            game_results,
            achievements,
            &mut self.rng,
            Utc::now(),
        )?;

        match transition {
            RoundTransition::NextRound => {}
            RoundTransition::NextWeek => self.navigate(Screen::Attendance),
            RoundTransition::Completed => self.navigate(Screen::FinalStandings),
        }
        Some(transition)
    }

    /// Reverse the most recently finalized round of the active tournament.
    pub fn undo_last_pod(&mut self) -> Option<UndoOutcome> {
        let id = self.active_tournament_id()?;
        let LeagueData {
            players,
            tournaments,
            game_results,
            ..
        } = &mut self.data;
        let tournament = tournaments.iter_mut().find(|t| t.id == id)?;

        let outcome = progression::undo_last_round(tournament, players, game_results)?;
        if outcome.crossed_week_boundary || outcome.reopened {
            self.navigate(Screen::Pods);
        }
        Some(outcome)
    }

    /// Correct the most recently finalized round in place.
    pub fn apply_edited_round(
        &mut self,
        new_placements: &BTreeMap<PlayerId, u8>,
        new_checks: &BTreeSet<AchievementCheck>,
    ) -> bool {
        let Some(id) = self.active_tournament_id() else {
            return false;
        };
        let LeagueData {
            players,
            achievements,
            tournaments,
            game_results,
            ..
        } = &mut self.data;
        let Some(tournament) = tournaments.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        progression::apply_edited_round(
            tournament,
            players,
            game_results,
            achievements,
            new_placements,
            new_checks,
        )
    }

    /// Unbind a completed tournament and return to the tournament list.
    pub fn close_tournament_standings(&mut self) -> bool {
        match self.active_tournament() {
            Some(t) if !t.is_ongoing() => {}
            _ => return false,
        }
        let session = self.session_mut();
        session.active_tournament_id = None;
        session.current_screen = Screen::TournamentList;
        true
    }
}
