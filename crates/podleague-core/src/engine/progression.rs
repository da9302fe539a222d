// Tournament state machine: attendance, round staging, finalize, undo and
// edit of the most recent round.
//
// Every forward mutation records the exact additive delta it applied in a
// `PodSnapshot`, so the latest round can be reversed or rescored without
// replaying history.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::achievements::roll_active_achievements;
use super::scoring::{achievement_points, placement_points};
use super::ROUNDS_PER_WEEK;
use crate::league::{
    Achievement, AchievementCheck, AchievementId, GameResult, Player, PlayerDelta, PlayerId,
    PodId, PodSnapshot, Tournament, TournamentStatus, WeekBoundary, WeeklyPlayerPoints,
};

/// Where the tournament went after a round was finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTransition {
    /// Same week, next round.
    NextRound,
    /// The week closed and a new one began at round 1.
    NextWeek,
    /// The final round of the final week was played.
    Completed,
}

/// What an undo reversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoOutcome {
    pub week: u32,
    pub round: u32,
    /// The undone round had closed a week; the prior week was restored.
    pub crossed_week_boundary: bool,
    /// The undone round had completed the tournament.
    pub reopened: bool,
    pub removed_results: usize,
}

/// A player's score for one round, before it is turned into a delta and a
/// game result.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScoredPlayer {
    player_id: PlayerId,
    placement: u8,
    placement_points: i64,
    achievement_points: i64,
    achievement_ids: Vec<AchievementId>,
}

impl ScoredPlayer {
    fn delta(&self) -> PlayerDelta {
        PlayerDelta {
            player_id: self.player_id,
            placement_points: self.placement_points,
            achievement_points: self.achievement_points,
            wins: i64::from(self.placement == 1),
            games_played: 1,
        }
    }
}

fn is_valid_placement(placement: u8) -> bool {
    (1..=4).contains(&placement)
}

// ---------------------------------------------------------------------------
// Attendance and staging
// ---------------------------------------------------------------------------

/// Record who is present this week and whether achievements count.
///
/// A week with no round data yet starts from zeroed weekly points and empty
/// staging. If round data already exists (the shell restarted mid-week), all
/// in-progress state is kept and only newly present players get a zeroed
/// weekly entry.
pub fn confirm_attendance(
    tournament: &mut Tournament,
    present_ids: &[PlayerId],
    achievements_on: bool,
) {
    let mut seen = BTreeSet::new();
    let present: Vec<PlayerId> = present_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();

    if tournament.has_round_data() {
        for id in &present {
            tournament.weekly_points.entry(*id).or_default();
        }
    } else {
        tournament.weekly_points = present
            .iter()
            .map(|id| (*id, WeeklyPlayerPoints::default()))
            .collect();
        tournament.clear_staging();
    }

    tournament.present_player_ids = present;
    tournament.achievements_on_this_week = achievements_on;
}

/// Stage or clear one player's placement for the in-progress round.
///
/// Returns `false` (and changes nothing) for a placement outside 1..=4.
pub fn update_placement(
    tournament: &mut Tournament,
    player_id: PlayerId,
    placement: Option<u8>,
) -> bool {
    match placement {
        Some(place) if !is_valid_placement(place) => {
            warn!("Ignoring out-of-range placement {} for {}", place, player_id);
            false
        }
        Some(place) => {
            debug!("Staged placement {} for {}", place, player_id);
            tournament.round_placements.insert(player_id, place);
            true
        }
        None => {
            tournament.round_placements.remove(&player_id);
            true
        }
    }
}

/// Toggle one staged achievement credit.
pub fn update_achievement_check(
    tournament: &mut Tournament,
    player_id: PlayerId,
    achievement_id: AchievementId,
    checked: bool,
) {
    let check = AchievementCheck {
        player_id,
        achievement_id,
    };
    if checked {
        tournament.round_achievement_checks.insert(check);
    } else {
        tournament.round_achievement_checks.remove(&check);
    }
}

// ---------------------------------------------------------------------------
// Scoring helpers
// ---------------------------------------------------------------------------

fn score_round(
    placements: &BTreeMap<PlayerId, u8>,
    checks: &BTreeSet<AchievementCheck>,
    catalog: &[Achievement],
    achievements_on: bool,
) -> Vec<ScoredPlayer> {
    placements
        .iter()
        .map(|(&player_id, &placement)| {
            let achievement_ids: Vec<AchievementId> = if achievements_on {
                checks
                    .iter()
                    .filter(|c| c.player_id == player_id)
                    .map(|c| c.achievement_id)
                    .collect()
            } else {
                Vec::new()
            };
            ScoredPlayer {
                player_id,
                placement,
                placement_points: placement_points(placement),
                achievement_points: achievement_points(&achievement_ids, catalog),
                achievement_ids,
            }
        })
        .collect()
}

fn apply_player_delta(players: &mut [Player], delta: &PlayerDelta, sign: i64) {
    match players.iter_mut().find(|p| p.id == delta.player_id) {
        Some(player) => {
            player.placement_points += sign * delta.placement_points;
            player.achievement_points += sign * delta.achievement_points;
            player.wins += sign * delta.wins;
            player.games_played += sign * delta.games_played;
        }
        None => warn!("No player {} to apply round delta to", delta.player_id),
    }
}

fn apply_weekly_delta(
    weekly: &mut BTreeMap<PlayerId, WeeklyPlayerPoints>,
    delta: &PlayerDelta,
    sign: i64,
) {
    let entry = weekly.entry(delta.player_id).or_default();
    entry.placement_points += sign * delta.placement_points;
    entry.achievement_points += sign * delta.achievement_points;
}

/// Give every generated pod that has staged players its own pod id. Staged
/// players who are not in any generated pod share one extra id.
fn assign_pod_ids(
    pods: &[Vec<PlayerId>],
    placements: &BTreeMap<PlayerId, u8>,
) -> (Vec<PodId>, BTreeMap<PlayerId, PodId>) {
    let mut pod_ids = Vec::new();
    let mut by_player = BTreeMap::new();

    for pod in pods {
        let staged: Vec<PlayerId> = pod
            .iter()
            .copied()
            .filter(|id| placements.contains_key(id) && !by_player.contains_key(id))
            .collect();
        if staged.is_empty() {
            continue;
        }
        let pod_id = Uuid::new_v4();
        pod_ids.push(pod_id);
        for id in staged {
            by_player.insert(id, pod_id);
        }
    }

    let unpodded: Vec<PlayerId> = placements
        .keys()
        .copied()
        .filter(|id| !by_player.contains_key(id))
        .collect();
    if !unpodded.is_empty() {
        let pod_id = Uuid::new_v4();
        pod_ids.push(pod_id);
        for id in unpodded {
            by_player.insert(id, pod_id);
        }
    }

    (pod_ids, by_player)
}

/// Drop the captured history of boundaries nested inside `history`, so at
/// most two week boundaries stay reachable through undo.
fn detach_nested_boundaries(mut history: Vec<PodSnapshot>) -> Vec<PodSnapshot> {
    for snapshot in &mut history {
        if let Some(boundary) = snapshot.week_boundary.as_mut() {
            boundary.pod_history.clear();
        }
    }
    history
}

// ---------------------------------------------------------------------------
// Finalize / undo / edit
// ---------------------------------------------------------------------------

/// Score the staged round, emit its game results and advance the tournament.
///
/// Returns `None` without touching anything when the tournament is not
/// ongoing or nothing is staged.
pub fn finalize_round<R: Rng + ?Sized>(
    tournament: &mut Tournament,
    players: &mut [Player],
    results: &mut Vec<GameResult>,
    catalog: &[Achievement],
    rng: &mut R,
    now: DateTime<Utc>,
) -> Option<RoundTransition> {
    if !tournament.is_ongoing() || tournament.round_placements.is_empty() {
        return None;
    }

    let scored = score_round(
        &tournament.round_placements,
        &tournament.round_achievement_checks,
        catalog,
        tournament.achievements_on_this_week,
    );
    let (pod_ids, pod_by_player) =
        assign_pod_ids(&tournament.current_pods, &tournament.round_placements);

    let new_results: Vec<GameResult> = scored
        .iter()
        .map(|s| GameResult {
            id: Uuid::new_v4(),
            tournament_id: tournament.id,
            week: tournament.current_week,
            round: tournament.current_round,
            player_id: s.player_id,
            placement: s.placement,
            placement_points: s.placement_points,
            achievement_points: s.achievement_points,
            achievement_ids: s.achievement_ids.clone(),
            pod_id: pod_by_player[&s.player_id],
            timestamp: now,
        })
        .collect();
    let deltas: Vec<PlayerDelta> = scored.iter().map(ScoredPlayer::delta).collect();

    let mut snapshot = PodSnapshot {
        pod_ids,
        week: tournament.current_week,
        round: tournament.current_round,
        placements: tournament.round_placements.clone(),
        achievement_checks: tournament.round_achievement_checks.clone(),
        deltas: deltas.clone(),
        achievements_on: tournament.achievements_on_this_week,
        pods: tournament.current_pods.clone(),
        week_boundary: None,
    };

    let transition = if !tournament.is_final_round_of_week() {
        RoundTransition::NextRound
    } else if !tournament.is_final_week() {
        RoundTransition::NextWeek
    } else {
        RoundTransition::Completed
    };

    for delta in &deltas {
        apply_player_delta(players, delta, 1);
    }

    match transition {
        RoundTransition::NextRound => {
            for delta in &deltas {
                apply_weekly_delta(&mut tournament.weekly_points, delta, 1);
            }
            tournament.current_round += 1;
            tournament.pod_history.push(snapshot);
        }
        RoundTransition::NextWeek => {
            // Captured before this round's weekly delta, so undo lands exactly
            // on the pre-finalize state.
            snapshot.week_boundary = Some(WeekBoundary {
                week: tournament.current_week,
                present_player_ids: std::mem::take(&mut tournament.present_player_ids),
                weekly_points: std::mem::take(&mut tournament.weekly_points),
                active_achievement_ids: std::mem::take(&mut tournament.active_achievement_ids),
                achievements_on_this_week: tournament.achievements_on_this_week,
                pod_history: detach_nested_boundaries(std::mem::take(
                    &mut tournament.pod_history,
                )),
            });
            tournament.current_week += 1;
            tournament.current_round = 1;
            tournament.active_achievement_ids = roll_active_achievements(
                catalog,
                tournament.random_achievements_per_week,
                rng,
            );
            tournament.achievements_on_this_week = true;
            tournament.pod_history = vec![snapshot];
            info!(
                "Tournament '{}' advanced to week {}",
                tournament.name, tournament.current_week
            );
        }
        RoundTransition::Completed => {
            for delta in &deltas {
                apply_weekly_delta(&mut tournament.weekly_points, delta, 1);
            }
            tournament.status = TournamentStatus::Completed;
            tournament.end_date = Some(now);
            tournament.pod_history.push(snapshot);
            info!("Tournament '{}' completed", tournament.name);
        }
    }

    tournament.clear_staging();
    results.extend(new_results);
    Some(transition)
}

/// Reverse the most recent finalized round.
///
/// Player stats lose the recorded deltas and the round's game results are
/// deleted. A round that closed a week restores the previous week verbatim
/// from its boundary; otherwise weekly points are reversed arithmetically.
/// The reversed round's placements, checks and pods are staged again.
/// Returns `None` when there is no history.
pub fn undo_last_round(
    tournament: &mut Tournament,
    players: &mut [Player],
    results: &mut Vec<GameResult>,
) -> Option<UndoOutcome> {
    let snapshot = tournament.pod_history.pop()?;

    for delta in &snapshot.deltas {
        apply_player_delta(players, delta, -1);
    }
    let before = results.len();
    results.retain(|r| !snapshot.pod_ids.contains(&r.pod_id));
    let removed_results = before - results.len();

    let reopened = tournament.status == TournamentStatus::Completed;
    let crossed_week_boundary = snapshot.week_boundary.is_some();

    match snapshot.week_boundary {
        Some(boundary) => {
            tournament.current_week = boundary.week;
            tournament.current_round = ROUNDS_PER_WEEK;
            tournament.present_player_ids = boundary.present_player_ids;
            tournament.weekly_points = boundary.weekly_points;
            tournament.active_achievement_ids = boundary.active_achievement_ids;
            tournament.achievements_on_this_week = boundary.achievements_on_this_week;
            tournament.pod_history = boundary.pod_history;
        }
        None => {
            for delta in &snapshot.deltas {
                apply_weekly_delta(&mut tournament.weekly_points, delta, -1);
            }
            tournament.current_week = snapshot.week;
            tournament.current_round = snapshot.round.max(1);
        }
    }

    tournament.status = TournamentStatus::Ongoing;
    tournament.end_date = None;
    tournament.round_placements = snapshot.placements;
    tournament.round_achievement_checks = snapshot.achievement_checks;
    tournament.current_pods = snapshot.pods;

    info!(
        "Undid week {} round {} of '{}' ({} results removed)",
        tournament.current_week, tournament.current_round, tournament.name, removed_results
    );

    Some(UndoOutcome {
        week: tournament.current_week,
        round: tournament.current_round,
        crossed_week_boundary,
        reopened,
        removed_results,
    })
}

/// Rescore the most recent finalized round in place.
///
/// Equivalent to undo followed by finalize with the corrected inputs, except
/// that week/round counters, history depth and game result ids are left
/// alone. Only the players recorded in the round are affected: extra players
/// in `new_placements` are ignored and recorded players missing from it keep
/// their previous placement. Returns `false` when there is no history.
pub fn apply_edited_round(
    tournament: &mut Tournament,
    players: &mut [Player],
    results: &mut [GameResult],
    catalog: &[Achievement],
    new_placements: &BTreeMap<PlayerId, u8>,
    new_checks: &BTreeSet<AchievementCheck>,
) -> bool {
    let Some(previous) = tournament.pod_history.last() else {
        return false;
    };

    let placements: BTreeMap<PlayerId, u8> = previous
        .placements
        .iter()
        .map(|(&player_id, &old)| {
            let place = new_placements
                .get(&player_id)
                .copied()
                .filter(|p| is_valid_placement(*p))
                .unwrap_or(old);
            (player_id, place)
        })
        .collect();
    let checks: BTreeSet<AchievementCheck> = new_checks
        .iter()
        .copied()
        .filter(|c| placements.contains_key(&c.player_id))
        .collect();

    let scored = score_round(&placements, &checks, catalog, previous.achievements_on);
    let new_deltas: Vec<PlayerDelta> = scored.iter().map(ScoredPlayer::delta).collect();
    let old_deltas = previous.deltas.clone();
    let pod_ids = previous.pod_ids.clone();
    let closed_week = previous.week_boundary.is_some();

    for delta in &old_deltas {
        apply_player_delta(players, delta, -1);
    }
    for delta in &new_deltas {
        apply_player_delta(players, delta, 1);
    }

    // A week-closing round never reached the live weekly map.
    if !closed_week {
        for delta in &old_deltas {
            apply_weekly_delta(&mut tournament.weekly_points, delta, -1);
        }
        for delta in &new_deltas {
            apply_weekly_delta(&mut tournament.weekly_points, delta, 1);
        }
    }

    for result in results.iter_mut().filter(|r| pod_ids.contains(&r.pod_id)) {
        if let Some(s) = scored.iter().find(|s| s.player_id == result.player_id) {
            result.placement = s.placement;
            result.placement_points = s.placement_points;
            result.achievement_points = s.achievement_points;
            result.achievement_ids = s.achievement_ids.clone();
        }
    }

    if let Some(snapshot) = tournament.pod_history.last_mut() {
        snapshot.placements = placements;
        snapshot.achievement_checks = checks;
        snapshot.deltas = new_deltas;
    }

    info!(
        "Edited last round of '{}' ({} players rescored)",
        tournament.name,
        scored.len()
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        tournament: Tournament,
        players: Vec<Player>,
        results: Vec<GameResult>,
        catalog: Vec<Achievement>,
        rng: StdRng,
    }

    fn fixture(total_weeks: u32) -> Fixture {
        let players: Vec<Player> = ["Ash", "Bo", "Cy", "Di"]
            .iter()
            .map(|n| Player::new(*n))
            .collect();
        let catalog = vec![
            Achievement::new("Commander Kill", 2, false),
            Achievement::new("Untapped Win", 3, true),
        ];
        let ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
        let mut tournament =
            Tournament::new("Test Cup", total_weeks, 0, ids.clone(), vec![], Utc::now());
        confirm_attendance(&mut tournament, &ids, true);
        Fixture {
            tournament,
            players,
            results: Vec::new(),
            catalog,
            rng: StdRng::seed_from_u64(17),
        }
    }

    impl Fixture {
        fn id(&self, idx: usize) -> PlayerId {
            self.players[idx].id
        }

        fn stage(&mut self, order: [usize; 4]) {
            for (place, idx) in order.iter().enumerate() {
                let id = self.id(*idx);
                update_placement(&mut self.tournament, id, Some(place as u8 + 1));
            }
        }

        fn finalize(&mut self) -> Option<RoundTransition> {
            finalize_round(
                &mut self.tournament,
                &mut self.players,
                &mut self.results,
                &self.catalog,
                &mut self.rng,
                Utc::now(),
            )
        }

        fn undo(&mut self) -> Option<UndoOutcome> {
            undo_last_round(&mut self.tournament, &mut self.players, &mut self.results)
        }
    }

    #[test]
    fn finalize_without_staging_is_noop() {
        let mut f = fixture(1);
        let before = f.tournament.clone();
        assert_eq!(f.finalize(), None);
        assert_eq!(f.tournament, before);
        assert!(f.results.is_empty());
    }

    #[test]
    fn finalize_applies_placement_deltas() {
        let mut f = fixture(2);
        f.stage([0, 1, 2, 3]);
        assert_eq!(f.finalize(), Some(RoundTransition::NextRound));

        assert_eq!(f.players[0].placement_points, 4);
        assert_eq!(f.players[0].wins, 1);
        assert_eq!(f.players[3].placement_points, 1);
        assert!(f.players.iter().all(|p| p.games_played == 1));
        assert_eq!(f.results.len(), 4);
        assert_eq!(f.tournament.current_round, 2);
        assert_eq!(f.tournament.pod_history.len(), 1);
        assert!(f.tournament.round_placements.is_empty());

        let total: i64 = f.results.iter().map(|r| r.placement_points).sum();
        assert_eq!(total, 10);
        let weekly = f.tournament.weekly_points_for(f.id(1));
        assert_eq!(weekly.placement_points, 3);
    }

    #[test]
    fn results_share_one_pod_id_without_generated_pods() {
        let mut f = fixture(2);
        f.stage([0, 1, 2, 3]);
        f.finalize();
        let pod = f.results[0].pod_id;
        assert!(f.results.iter().all(|r| r.pod_id == pod));
        assert_eq!(f.tournament.pod_history[0].pod_ids, vec![pod]);
    }

    #[test]
    fn generated_pods_get_distinct_pod_ids() {
        let mut f = fixture(2);
        f.tournament.current_pods = vec![vec![f.id(0), f.id(1)], vec![f.id(2), f.id(3)]];
        f.stage([0, 1, 2, 3]);
        f.finalize();

        let snapshot = &f.tournament.pod_history[0];
        assert_eq!(snapshot.pod_ids.len(), 2);
        let pod_of = |idx: usize| {
            let id = f.players[idx].id;
            f.results.iter().find(|r| r.player_id == id).unwrap().pod_id
        };
        assert_eq!(pod_of(0), pod_of(1));
        assert_eq!(pod_of(2), pod_of(3));
        assert_ne!(pod_of(0), pod_of(2));
    }

    #[test]
    fn achievements_only_count_when_enabled() {
        let mut f = fixture(2);
        let kill = f.catalog[0].id;
        let id0 = f.id(0);
        f.stage([0, 1, 2, 3]);
        update_achievement_check(&mut f.tournament, id0, kill, true);
        f.finalize();
        assert_eq!(f.players[0].achievement_points, 2);
        assert_eq!(f.results.iter().find(|r| r.player_id == id0).unwrap().achievement_ids, vec![kill]);

        f.tournament.achievements_on_this_week = false;
        f.stage([0, 1, 2, 3]);
        update_achievement_check(&mut f.tournament, id0, kill, true);
        f.finalize();
        assert_eq!(f.players[0].achievement_points, 2);
        assert!(f.results.iter().filter(|r| r.round == 2).all(|r| r.achievement_points == 0));
    }

    #[test]
    fn unchecking_removes_staged_credit() {
        let mut f = fixture(1);
        let kill = f.catalog[0].id;
        let id0 = f.id(0);
        update_achievement_check(&mut f.tournament, id0, kill, true);
        update_achievement_check(&mut f.tournament, id0, kill, false);
        assert!(f.tournament.round_achievement_checks.is_empty());
    }

    #[test]
    fn out_of_range_placement_is_rejected() {
        let mut f = fixture(1);
        let id0 = f.id(0);
        assert!(!update_placement(&mut f.tournament, id0, Some(5)));
        assert!(!update_placement(&mut f.tournament, id0, Some(0)));
        assert!(f.tournament.round_placements.is_empty());

        assert!(update_placement(&mut f.tournament, id0, Some(2)));
        assert!(update_placement(&mut f.tournament, id0, None));
        assert!(f.tournament.round_placements.is_empty());
    }

    #[test]
    fn week_rollover_resets_weekly_state() {
        let mut f = fixture(2);
        for _ in 0..2 {
            f.stage([0, 1, 2, 3]);
            assert_eq!(f.finalize(), Some(RoundTransition::NextRound));
        }
        f.stage([0, 1, 2, 3]);
        assert_eq!(f.finalize(), Some(RoundTransition::NextWeek));

        let t = &f.tournament;
        assert_eq!(t.current_week, 2);
        assert_eq!(t.current_round, 1);
        assert!(t.present_player_ids.is_empty());
        assert!(t.weekly_points.is_empty());
        assert_eq!(t.pod_history.len(), 1);
        assert!(t.pod_history[0].week_boundary.is_some());
        // The always-on achievement is re-rolled in.
        assert_eq!(t.active_achievement_ids, vec![f.catalog[1].id]);
    }

    #[test]
    fn final_round_of_final_week_completes() {
        let mut f = fixture(1);
        for _ in 0..3 {
            f.stage([0, 1, 2, 3]);
            f.finalize();
        }
        assert_eq!(f.tournament.status, TournamentStatus::Completed);
        assert!(f.tournament.end_date.is_some());
        assert_eq!(f.players[0].placement_points, 12);
        assert_eq!(f.players[0].wins, 3);
        assert_eq!(f.players[0].games_played, 3);

        f.stage([0, 1, 2, 3]);
        assert_eq!(f.finalize(), None);
    }

    #[test]
    fn undo_with_empty_history_is_noop() {
        let mut f = fixture(1);
        assert_eq!(f.undo(), None);
    }

    #[test]
    fn undo_reverses_round_and_restages_it() {
        let mut f = fixture(2);
        let players_before = f.players.clone();
        f.stage([2, 0, 1, 3]);
        let staged = f.tournament.round_placements.clone();
        f.finalize();

        let outcome = f.undo().unwrap();
        assert_eq!(outcome.removed_results, 4);
        assert!(!outcome.crossed_week_boundary);
        assert_eq!(f.players, players_before);
        assert!(f.results.is_empty());
        assert_eq!(f.tournament.current_round, 1);
        assert_eq!(f.tournament.round_placements, staged);
        assert!(f.tournament.weekly_points.values().all(|w| w.total() == 0));
    }

    #[test]
    fn undo_across_week_boundary_restores_prior_week() {
        let mut f = fixture(2);
        for _ in 0..2 {
            f.stage([0, 1, 2, 3]);
            f.finalize();
        }
        let week_one = f.tournament.clone();
        let players_before = f.players.clone();
        f.stage([3, 2, 1, 0]);
        f.finalize();

        let outcome = f.undo().unwrap();
        assert!(outcome.crossed_week_boundary);
        let t = &f.tournament;
        assert_eq!(t.current_week, 1);
        assert_eq!(t.current_round, 3);
        assert_eq!(t.present_player_ids, week_one.present_player_ids);
        assert_eq!(t.weekly_points, week_one.weekly_points);
        assert_eq!(t.active_achievement_ids, week_one.active_achievement_ids);
        assert_eq!(t.pod_history, week_one.pod_history);
        assert_eq!(f.players, players_before);
        assert_eq!(f.results.len(), 8);
    }

    #[test]
    fn undo_of_completing_round_reopens_tournament() {
        let mut f = fixture(1);
        for _ in 0..3 {
            f.stage([0, 1, 2, 3]);
            f.finalize();
        }
        let outcome = f.undo().unwrap();
        assert!(outcome.reopened);
        assert_eq!(f.tournament.status, TournamentStatus::Ongoing);
        assert!(f.tournament.end_date.is_none());
        assert_eq!(f.tournament.current_week, 1);
        assert_eq!(f.tournament.current_round, 3);
        assert_eq!(f.players[0].placement_points, 8);
    }

    #[test]
    fn nested_boundaries_are_detached_on_rollover() {
        let mut f = fixture(3);
        for _ in 0..6 {
            f.stage([0, 1, 2, 3]);
            f.finalize();
        }
        assert_eq!(f.tournament.current_week, 3);
        let boundary = f.tournament.pod_history[0].week_boundary.as_ref().unwrap();
        let inner = boundary.pod_history[0].week_boundary.as_ref().unwrap();
        assert!(inner.pod_history.is_empty());
    }

    #[test]
    fn edit_matches_undo_then_refinalize() {
        let mut edited = fixture(2);
        edited.stage([0, 1, 2, 3]);
        edited.finalize();
        let mut replayed = Fixture {
            tournament: edited.tournament.clone(),
            players: edited.players.clone(),
            results: edited.results.clone(),
            catalog: edited.catalog.clone(),
            rng: StdRng::seed_from_u64(17),
        };

        let kill = edited.catalog[0].id;
        let mut placements = BTreeMap::new();
        for (place, idx) in [3usize, 2, 1, 0].iter().enumerate() {
            placements.insert(edited.id(*idx), place as u8 + 1);
        }
        let mut checks = BTreeSet::new();
        checks.insert(AchievementCheck {
            player_id: edited.id(3),
            achievement_id: kill,
        });

        assert!(apply_edited_round(
            &mut edited.tournament,
            &mut edited.players,
            &mut edited.results,
            &edited.catalog,
            &placements,
            &checks,
        ));

        replayed.undo();
        replayed.tournament.round_placements = placements.clone();
        replayed.tournament.round_achievement_checks = checks.clone();
        replayed.finalize();

        assert_eq!(edited.players, replayed.players);
        assert_eq!(edited.tournament.current_round, replayed.tournament.current_round);
        assert_eq!(edited.tournament.pod_history.len(), 1);
        assert_eq!(edited.tournament.weekly_points, replayed.tournament.weekly_points);

        let winner = edited.id(3);
        let r = edited.results.iter().find(|r| r.player_id == winner).unwrap();
        assert_eq!(r.placement, 1);
        assert_eq!(r.achievement_points, 2);
        assert_eq!(edited.results.len(), 4);
    }

    #[test]
    fn edit_keeps_result_ids_and_pod() {
        let mut f = fixture(2);
        f.stage([0, 1, 2, 3]);
        f.finalize();
        let ids_before: Vec<_> = f.results.iter().map(|r| (r.id, r.pod_id)).collect();

        let mut placements = BTreeMap::new();
        placements.insert(f.id(0), 2);
        placements.insert(f.id(1), 1);
        placements.insert(uuid::Uuid::new_v4(), 1);
        assert!(apply_edited_round(
            &mut f.tournament,
            &mut f.players,
            &mut f.results,
            &f.catalog,
            &placements,
            &BTreeSet::new(),
        ));

        let ids_after: Vec<_> = f.results.iter().map(|r| (r.id, r.pod_id)).collect();
        assert_eq!(ids_before, ids_after);
        // Players missing from the edit keep their old placement.
        assert_eq!(f.tournament.pod_history[0].placements[&f.id(2)], 3);
        assert_eq!(f.tournament.pod_history[0].placements.len(), 4);
        assert_eq!(f.players[1].wins, 1);
        assert_eq!(f.players[0].wins, 0);
    }

    #[test]
    fn edit_without_history_is_noop() {
        let mut f = fixture(1);
        assert!(!apply_edited_round(
            &mut f.tournament,
            &mut f.players,
            &mut f.results,
            &f.catalog,
            &BTreeMap::new(),
            &BTreeSet::new(),
        ));
    }

    #[test]
    fn reconfirming_attendance_mid_week_preserves_progress() {
        let mut f = fixture(2);
        f.stage([0, 1, 2, 3]);
        f.finalize();
        let id0 = f.id(0);
        update_placement(&mut f.tournament, id0, Some(1));

        let newcomer = uuid::Uuid::new_v4();
        let mut present: Vec<PlayerId> = f.players.iter().map(|p| p.id).collect();
        present.push(newcomer);
        confirm_attendance(&mut f.tournament, &present, false);

        assert_eq!(f.tournament.weekly_points_for(id0).placement_points, 4);
        assert_eq!(f.tournament.round_placements.len(), 1);
        assert!(f.tournament.weekly_points.contains_key(&newcomer));
        assert!(!f.tournament.achievements_on_this_week);
    }

    #[test]
    fn confirming_fresh_week_zeroes_weekly_points() {
        let mut f = fixture(2);
        let id0 = f.id(0);
        f.tournament.weekly_points.insert(
            id0,
            WeeklyPlayerPoints {
                placement_points: 9,
                achievement_points: 0,
            },
        );
        let present = vec![id0, id0];
        confirm_attendance(&mut f.tournament, &present, true);
        assert_eq!(f.tournament.present_player_ids, vec![id0]);
        assert_eq!(f.tournament.weekly_points.len(), 1);
        assert_eq!(f.tournament.weekly_points_for(id0).total(), 0);
    }

    #[test]
    fn undo_replaces_next_round_staging_with_the_undone_round() {
        let mut f = fixture(2);
        let kill = f.catalog[0].id;
        let (id0, id1, id2) = (f.id(0), f.id(1), f.id(2));
        f.tournament.current_pods = vec![f.players.iter().map(|p| p.id).collect()];
        f.stage([0, 1, 2, 3]);
        update_achievement_check(&mut f.tournament, id0, kill, true);
        f.finalize();
        let undone_placements = f.tournament.pod_history[0].placements.clone();
        let undone_pods = f.tournament.pod_history[0].pods.clone();

        // Partially staged round 2, with its own pods and checks.
        f.tournament.current_pods = vec![vec![id2, id1]];
        update_placement(&mut f.tournament, id2, Some(1));
        update_placement(&mut f.tournament, id1, Some(2));
        update_achievement_check(&mut f.tournament, id2, kill, true);

        f.undo().unwrap();

        assert_eq!(f.tournament.current_round, 1);
        assert_eq!(f.tournament.round_placements, undone_placements);
        assert_eq!(f.tournament.round_placements.get(&id2), Some(&3));
        assert_eq!(f.tournament.current_pods, undone_pods);
        let checks: Vec<AchievementCheck> =
            f.tournament.round_achievement_checks.iter().copied().collect();
        assert_eq!(
            checks,
            vec![AchievementCheck {
                player_id: id0,
                achievement_id: kill,
            }]
        );
    }
}
