// SQLite persistence for the league collections.
//
// The engine never touches storage; the shell saves a full snapshot of
// `LeagueData` after each operation and restores it verbatim on startup.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::league::{
    Achievement, GameResult, LeagueData, LeagueState, Player, Screen, Tournament,
};

/// SQLite-backed snapshot store for players, achievements, tournaments, game
/// results and the session record.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                id                 TEXT PRIMARY KEY,
                name               TEXT NOT NULL,
                placement_points   INTEGER NOT NULL DEFAULT 0,
                achievement_points INTEGER NOT NULL DEFAULT 0,
                wins               INTEGER NOT NULL DEFAULT 0,
                games_played       INTEGER NOT NULL DEFAULT 0,
                tournaments_played INTEGER NOT NULL DEFAULT 0,
                position           INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS achievements (
                id        TEXT PRIMARY KEY,
                name      TEXT NOT NULL,
                points    INTEGER NOT NULL,
                always_on INTEGER NOT NULL DEFAULT 0,
                position  INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tournaments (
                id       TEXT PRIMARY KEY,
                name     TEXT NOT NULL,
                status   TEXT NOT NULL,
                data     TEXT NOT NULL,
                position INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS game_results (
                id                 TEXT PRIMARY KEY,
                tournament_id      TEXT NOT NULL,
                week               INTEGER NOT NULL,
                round              INTEGER NOT NULL,
                player_id          TEXT NOT NULL,
                placement          INTEGER NOT NULL,
                placement_points   INTEGER NOT NULL,
                achievement_points INTEGER NOT NULL,
                achievement_ids    TEXT NOT NULL,
                pod_id             TEXT NOT NULL,
                timestamp          TEXT NOT NULL,
                position           INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS league_state (
                id                   TEXT PRIMARY KEY,
                active_tournament_id TEXT,
                current_screen       TEXT NOT NULL,
                position             INTEGER NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_game_results_pod ON game_results(pod_id);",
        )
        .context("failed to create pod_id index")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Returns `true` if any league data has been saved.
    pub fn has_saved_league(&self) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM league_state)
                     OR EXISTS(SELECT 1 FROM players)
                     OR EXISTS(SELECT 1 FROM tournaments)",
                [],
                |row| row.get(0),
            )
            .context("failed to check for saved league")?;
        Ok(exists)
    }

    /// Replace everything stored with `data` in one transaction.
    pub fn save_league(&self, data: &LeagueData) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;

        for table in ["players", "achievements", "tournaments", "game_results", "league_state"] {
            tx.execute(&format!("DELETE FROM {table}"), [])
                .with_context(|| format!("failed to clear {table}"))?;
        }

        for (pos, p) in data.players.iter().enumerate() {
            tx.execute(
                "INSERT INTO players
                    (id, name, placement_points, achievement_points, wins, games_played,
                     tournaments_played, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    p.id.to_string(),
                    p.name,
                    p.placement_points,
                    p.achievement_points,
                    p.wins,
                    p.games_played,
                    p.tournaments_played,
                    pos as i64,
                ],
            )
            .context("failed to save player")?;
        }

        for (pos, a) in data.achievements.iter().enumerate() {
            tx.execute(
                "INSERT INTO achievements (id, name, points, always_on, position)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![a.id.to_string(), a.name, a.points, a.always_on, pos as i64],
            )
            .context("failed to save achievement")?;
        }

        for (pos, t) in data.tournaments.iter().enumerate() {
            let json = serde_json::to_string(t).context("failed to serialize tournament")?;
            let status = if t.is_ongoing() { "ongoing" } else { "completed" };
            tx.execute(
                "INSERT INTO tournaments (id, name, status, data, position)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![t.id.to_string(), t.name, status, json, pos as i64],
            )
            .context("failed to save tournament")?;
        }

        for (pos, r) in data.game_results.iter().enumerate() {
            let achievement_ids = serde_json::to_string(&r.achievement_ids)
                .context("failed to serialize achievement_ids")?;
            tx.execute(
                "INSERT INTO game_results
                    (id, tournament_id, week, round, player_id, placement, placement_points,
                     achievement_points, achievement_ids, pod_id, timestamp, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    r.id.to_string(),
                    r.tournament_id.to_string(),
                    r.week,
                    r.round,
                    r.player_id.to_string(),
                    r.placement,
                    r.placement_points,
                    r.achievement_points,
                    achievement_ids,
                    r.pod_id.to_string(),
                    r.timestamp.to_rfc3339(),
                    pos as i64,
                ],
            )
            .context("failed to save game result")?;
        }

        for (pos, s) in data.league_states.iter().enumerate() {
            tx.execute(
                "INSERT INTO league_state (id, active_tournament_id, current_screen, position)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    s.id.to_string(),
                    s.active_tournament_id.map(|id| id.to_string()),
                    s.current_screen.as_str(),
                    pos as i64,
                ],
            )
            .context("failed to save league state")?;
        }

        tx.commit().context("failed to commit league snapshot")?;
        debug!(
            "Saved league snapshot: {} players, {} tournaments, {} results",
            data.players.len(),
            data.tournaments.len(),
            data.game_results.len()
        );
        Ok(())
    }

    /// Load the stored league snapshot. An empty database yields empty
    /// collections.
    pub fn load_league(&self) -> Result<LeagueData> {
        let conn = self.conn();

        let players = query_all(
            &conn,
            "SELECT id, name, placement_points, achievement_points, wins, games_played,
                    tournaments_played
             FROM players ORDER BY position",
            |row| {
                Ok(Player {
                    id: uuid_col(row, 0)?,
                    name: row.get(1)?,
                    placement_points: row.get(2)?,
                    achievement_points: row.get(3)?,
                    wins: row.get(4)?,
                    games_played: row.get(5)?,
                    tournaments_played: row.get(6)?,
                })
            },
        )
        .context("failed to load players")?;

        let achievements = query_all(
            &conn,
            "SELECT id, name, points, always_on FROM achievements ORDER BY position",
            |row| {
                Ok(Achievement {
                    id: uuid_col(row, 0)?,
                    name: row.get(1)?,
                    points: row.get(2)?,
                    always_on: row.get(3)?,
                })
            },
        )
        .context("failed to load achievements")?;

        let tournament_json: Vec<String> = query_all(
            &conn,
            "SELECT data FROM tournaments ORDER BY position",
            |row| row.get(0),
        )
        .context("failed to load tournaments")?;
        let tournaments = tournament_json
            .iter()
            .map(|json| serde_json::from_str::<Tournament>(json))
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to deserialize tournament")?;

        let game_results = query_all(
            &conn,
            "SELECT id, tournament_id, week, round, player_id, placement, placement_points,
                    achievement_points, achievement_ids, pod_id, timestamp
             FROM game_results ORDER BY position",
            |row| {
                let ids_json: String = row.get(8)?;
                let achievement_ids =
                    serde_json::from_str::<Vec<Uuid>>(&ids_json).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            8,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                let ts: String = row.get(10)?;
                Ok(GameResult {
                    id: uuid_col(row, 0)?,
                    tournament_id: uuid_col(row, 1)?,
                    week: row.get(2)?,
                    round: row.get(3)?,
                    player_id: uuid_col(row, 4)?,
                    placement: row.get(5)?,
                    placement_points: row.get(6)?,
                    achievement_points: row.get(7)?,
                    achievement_ids,
                    pod_id: uuid_col(row, 9)?,
                    timestamp: DateTime::parse_from_rfc3339(&ts)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(
                                10,
                                rusqlite::types::Type::Text,
                                Box::new(e),
                            )
                        })?,
                })
            },
        )
        .context("failed to load game results")?;

        let league_states = query_all(
            &conn,
            "SELECT id, active_tournament_id, current_screen FROM league_state ORDER BY position",
            |row| {
                let active: Option<String> = row.get(1)?;
                let screen: String = row.get(2)?;
                Ok(LeagueState {
                    id: uuid_col(row, 0)?,
                    active_tournament_id: active.and_then(|s| Uuid::parse_str(&s).ok()),
                    current_screen: Screen::from_str_lossy(&screen),
                })
            },
        )
        .context("failed to load league state")?;

        info!(
            "Loaded league snapshot: {} players, {} tournaments, {} results",
            players.len(),
            tournaments.len(),
            game_results.len()
        );

        Ok(LeagueData {
            players,
            achievements,
            tournaments,
            game_results,
            league_states,
        })
    }
}

fn query_all<T, F>(conn: &Connection, sql: &str, map: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], map)?;
    rows.collect()
}

fn uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
