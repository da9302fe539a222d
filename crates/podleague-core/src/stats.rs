// Read-only statistics over players and the game result log.
//
// Nothing here mutates state, and result rows that point at players who no
// longer exist are skipped rather than treated as errors.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::league::{AchievementId, GameResult, Player, PlayerId, PodId, Tournament, TournamentId};

/// Count of results at each placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlacementDistribution {
    pub first: u32,
    pub second: u32,
    pub third: u32,
    pub fourth: u32,
}

impl PlacementDistribution {
    fn record(&mut self, placement: u8) {
        match placement {
            1 => self.first += 1,
            2 => self.second += 1,
            3 => self.third += 1,
            4 => self.fourth += 1,
            _ => {}
        }
    }

    pub fn total(&self) -> u32 {
        self.first + self.second + self.third + self.fourth
    }
}

/// A player's numbers within one tournament.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TournamentStats {
    pub games_played: u32,
    pub wins: u32,
    pub placement_points: i64,
    pub achievement_points: i64,
    pub total_points: i64,
    pub win_rate: f64,
    pub average_placement: f64,
    pub points_per_game: f64,
    pub distribution: PlacementDistribution,
}

/// Head-to-head record between two players over the pods they shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeadToHeadRecord {
    pub player1_wins: u32,
    pub player2_wins: u32,
    pub ties: u32,
    pub total_games: u32,
}

/// One row of a per-tournament leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub placement_points: i64,
    pub achievement_points: i64,
    pub total_points: i64,
    pub wins: u32,
    pub games_played: u32,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Wins divided by games played, 0 with no games.
pub fn win_rate(player: &Player) -> f64 {
    ratio(player.wins as f64, player.games_played as f64)
}

/// Total points per game, 0 with no games.
pub fn points_per_game(player: &Player) -> f64 {
    ratio(player.total_points() as f64, player.games_played as f64)
}

/// Mean placement over the player's results, 0 with no results.
pub fn average_placement(player_id: PlayerId, results: &[GameResult]) -> f64 {
    let placements: Vec<f64> = results
        .iter()
        .filter(|r| r.player_id == player_id)
        .map(|r| f64::from(r.placement))
        .collect();
    ratio(placements.iter().sum(), placements.len() as f64)
}

pub fn placement_distribution(
    player_id: PlayerId,
    results: &[GameResult],
) -> PlacementDistribution {
    let mut dist = PlacementDistribution::default();
    for r in results.iter().filter(|r| r.player_id == player_id) {
        dist.record(r.placement);
    }
    dist
}

/// Stats narrowed to one tournament.
pub fn tournament_stats(
    player_id: PlayerId,
    tournament_id: TournamentId,
    results: &[GameResult],
) -> TournamentStats {
    let mine: Vec<&GameResult> = results
        .iter()
        .filter(|r| r.player_id == player_id && r.tournament_id == tournament_id)
        .collect();

    let mut distribution = PlacementDistribution::default();
    let mut placement_points = 0;
    let mut achievement_points = 0;
    let mut wins = 0;
    let mut placement_sum = 0.0;
    for r in &mine {
        distribution.record(r.placement);
        placement_points += r.placement_points;
        achievement_points += r.achievement_points;
        wins += u32::from(r.is_win());
        placement_sum += f64::from(r.placement);
    }

    let games_played = mine.len() as u32;
    let total_points = placement_points + achievement_points;
    TournamentStats {
        games_played,
        wins,
        placement_points,
        achievement_points,
        total_points,
        win_rate: ratio(f64::from(wins), f64::from(games_played)),
        average_placement: ratio(placement_sum, f64::from(games_played)),
        points_per_game: ratio(total_points as f64, f64::from(games_played)),
        distribution,
    }
}

/// Compare two players in every pod they both played in. Lower placement
/// wins; equal placements (a declared tie) count as ties.
pub fn head_to_head_record(p1: PlayerId, p2: PlayerId, results: &[GameResult]) -> HeadToHeadRecord {
    let mut pods: HashMap<PodId, (Option<u8>, Option<u8>)> = HashMap::new();
    for r in results {
        if r.player_id == p1 {
            pods.entry(r.pod_id).or_default().0 = Some(r.placement);
        } else if r.player_id == p2 {
            pods.entry(r.pod_id).or_default().1 = Some(r.placement);
        }
    }

    let mut record = HeadToHeadRecord::default();
    for (a, b) in pods.values().filter_map(|(a, b)| Some(((*a)?, (*b)?))) {
        record.total_games += 1;
        match a.cmp(&b) {
            std::cmp::Ordering::Less => record.player1_wins += 1,
            std::cmp::Ordering::Greater => record.player2_wins += 1,
            std::cmp::Ordering::Equal => record.ties += 1,
        }
    }
    record
}

/// All-time standings, highest total first. Ties keep roster order.
pub fn leaderboard(players: &[Player]) -> Vec<&Player> {
    let mut sorted: Vec<&Player> = players.iter().collect();
    sorted.sort_by_key(|p| std::cmp::Reverse(p.total_points()));
    sorted
}

/// Standings for one tournament built from its game results.
pub fn tournament_leaderboard(
    tournament_id: TournamentId,
    players: &[Player],
    results: &[GameResult],
) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<LeaderboardEntry> = Vec::new();
    for r in results.iter().filter(|r| r.tournament_id == tournament_id) {
        let idx = match rows.iter().position(|row| row.player_id == r.player_id) {
            Some(idx) => idx,
            None => {
                let Some(player) = players.iter().find(|p| p.id == r.player_id) else {
                    continue;
                };
                rows.push(LeaderboardEntry {
                    player_id: player.id,
                    name: player.name.clone(),
                    placement_points: 0,
                    achievement_points: 0,
                    total_points: 0,
                    wins: 0,
                    games_played: 0,
                });
                rows.len() - 1
            }
        };
        let row = &mut rows[idx];
        row.placement_points += r.placement_points;
        row.achievement_points += r.achievement_points;
        row.total_points += r.total_points();
        row.wins += u32::from(r.is_win());
        row.games_played += 1;
    }
    rows.sort_by_key(|row| std::cmp::Reverse(row.total_points));
    rows
}

/// Current week's standings of a tournament, highest weekly total first.
pub fn weekly_standings<'a>(
    tournament: &Tournament,
    players: &'a [Player],
) -> Vec<(&'a Player, i64)> {
    let mut rows: Vec<(&Player, i64)> = tournament
        .present_player_ids
        .iter()
        .filter_map(|id| players.iter().find(|p| p.id == *id))
        .map(|p| (p, tournament.weekly_points_for(p.id).total()))
        .collect();
    rows.sort_by_key(|(_, total)| std::cmp::Reverse(*total));
    rows
}

/// How many times the player earned each achievement.
pub fn achievement_counts(
    player_id: PlayerId,
    results: &[GameResult],
) -> BTreeMap<AchievementId, u32> {
    let mut counts = BTreeMap::new();
    for r in results.iter().filter(|r| r.player_id == player_id) {
        for id in &r.achievement_ids {
            *counts.entry(*id).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn result(player_id: PlayerId, pod_id: PodId, placement: u8) -> GameResult {
        result_in(Uuid::nil(), player_id, pod_id, placement)
    }

    fn result_in(
        tournament_id: TournamentId,
        player_id: PlayerId,
        pod_id: PodId,
        placement: u8,
    ) -> GameResult {
        GameResult {
            id: Uuid::new_v4(),
            tournament_id,
            week: 1,
            round: 1,
            player_id,
            placement,
            placement_points: crate::engine::scoring::placement_points(placement),
            achievement_points: 0,
            achievement_ids: vec![],
            pod_id,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn rates_are_zero_without_games() {
        let p = Player::new("Newcomer");
        assert_eq!(win_rate(&p), 0.0);
        assert_eq!(points_per_game(&p), 0.0);
        assert_eq!(average_placement(p.id, &[]), 0.0);
    }

    #[test]
    fn win_rate_and_points_per_game() {
        let mut p = Player::new("Regular");
        p.wins = 3;
        p.games_played = 12;
        p.placement_points = 30;
        p.achievement_points = 6;
        assert!((win_rate(&p) - 0.25).abs() < f64::EPSILON);
        assert!((points_per_game(&p) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn average_placement_and_distribution() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let results = vec![
            result(me, Uuid::new_v4(), 1),
            result(me, Uuid::new_v4(), 2),
            result(me, Uuid::new_v4(), 2),
            result(me, Uuid::new_v4(), 4),
            result(other, Uuid::new_v4(), 3),
        ];
        assert!((average_placement(me, &results) - 2.25).abs() < f64::EPSILON);
        let dist = placement_distribution(me, &results);
        assert_eq!(
            dist,
            PlacementDistribution {
                first: 1,
                second: 2,
                third: 0,
                fourth: 1
            }
        );
        assert_eq!(dist.total(), 4);
    }

    #[test]
    fn head_to_head_counts_wins_losses_and_ties() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (pod1, pod2, pod3, pod4) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let results = vec![
            result(a, pod1, 1),
            result(b, pod1, 3),
            result(a, pod2, 4),
            result(b, pod2, 2),
            result(a, pod3, 2),
            result(b, pod3, 2),
            // b missing from pod4: ignored
            result(a, pod4, 1),
        ];
        assert_eq!(
            head_to_head_record(a, b, &results),
            HeadToHeadRecord {
                player1_wins: 1,
                player2_wins: 1,
                ties: 1,
                total_games: 3
            }
        );
    }

    #[test]
    fn tournament_stats_only_count_that_tournament() {
        let me = Uuid::new_v4();
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let results = vec![
            result_in(t1, me, Uuid::new_v4(), 1),
            result_in(t1, me, Uuid::new_v4(), 3),
            result_in(t2, me, Uuid::new_v4(), 1),
        ];
        let stats = tournament_stats(me, t1, &results);
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.placement_points, 6);
        assert_eq!(stats.total_points, 6);
        assert!((stats.win_rate - 0.5).abs() < f64::EPSILON);
        assert!((stats.average_placement - 2.0).abs() < f64::EPSILON);
        assert_eq!(stats.distribution.first, 1);

        let empty = tournament_stats(me, Uuid::new_v4(), &results);
        assert_eq!(empty.games_played, 0);
        assert_eq!(empty.win_rate, 0.0);
    }

    #[test]
    fn leaderboard_sorts_by_total_and_is_stable() {
        let mut a = Player::new("A");
        let mut b = Player::new("B");
        let mut c = Player::new("C");
        a.placement_points = 5;
        b.placement_points = 3;
        b.achievement_points = 4;
        c.placement_points = 5;
        let players = vec![a, b, c];
        let names: Vec<&str> = leaderboard(&players).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn tournament_leaderboard_skips_dangling_players() {
        let players = vec![Player::new("Kept")];
        let t = Uuid::new_v4();
        let pod = Uuid::new_v4();
        let results = vec![
            result_in(t, players[0].id, pod, 2),
            result_in(t, Uuid::new_v4(), pod, 1),
            result_in(t, players[0].id, Uuid::new_v4(), 1),
        ];
        let board = tournament_leaderboard(t, &players, &results);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].name, "Kept");
        assert_eq!(board[0].total_points, 7);
        assert_eq!(board[0].wins, 1);
        assert_eq!(board[0].games_played, 2);
    }

    #[test]
    fn achievement_counts_tally_earned_ids() {
        let me = Uuid::new_v4();
        let kill = Uuid::new_v4();
        let mill = Uuid::new_v4();
        let mut r1 = result(me, Uuid::new_v4(), 1);
        r1.achievement_ids = vec![kill, mill];
        let mut r2 = result(me, Uuid::new_v4(), 2);
        r2.achievement_ids = vec![kill];
        let counts = achievement_counts(me, &[r1, r2]);
        assert_eq!(counts[&kill], 2);
        assert_eq!(counts[&mill], 1);
    }

    #[test]
    fn weekly_standings_order_by_weekly_total() {
        use crate::league::WeeklyPlayerPoints;

        let players: Vec<Player> = ["Ash", "Bo", "Cy"].iter().map(|n| Player::new(*n)).collect();
        let ghost = Uuid::new_v4();
        let mut t = Tournament::new(
            "Weekly",
            2,
            0,
            players.iter().map(|p| p.id).collect(),
            vec![],
            Utc::now(),
        );
        t.present_player_ids = vec![players[0].id, ghost, players[1].id, players[2].id];
        t.weekly_points.insert(
            players[0].id,
            WeeklyPlayerPoints {
                placement_points: 3,
                achievement_points: 0,
            },
        );
        t.weekly_points.insert(
            players[2].id,
            WeeklyPlayerPoints {
                placement_points: 4,
                achievement_points: 2,
            },
        );
        t.weekly_points.insert(ghost, WeeklyPlayerPoints::default());

        let rows: Vec<(&str, i64)> = weekly_standings(&t, &players)
            .into_iter()
            .map(|(p, total)| (p.name.as_str(), total))
            .collect();
        // Bo has no weekly entry and scores 0; the unknown id is dropped.
        assert_eq!(rows, vec![("Cy", 6), ("Ash", 3), ("Bo", 0)]);
    }
}
