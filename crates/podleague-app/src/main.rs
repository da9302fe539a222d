// Pod league entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database and restore the saved league
// 4. Sanitize the session record and achievement catalog
// 5. Persist the sanitized snapshot
// 6. Print the current standings

use podleague_core::config;
use podleague_core::db;
use podleague_core::orchestrator::League;
use podleague_core::stats;

use anyhow::Context;
use tracing::info;

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Pod league starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, db={}",
        config.league.name,
        config.db_path.display()
    );

    // 3. Open database and restore
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db_path = config.db_path.to_string_lossy();
    let db = db::Database::open(&db_path).context("failed to open database")?;
    let restored = db.has_saved_league().context("failed to inspect database")?;
    let data = db.load_league().context("failed to load league")?;
    info!(
        "Restored league: {} players, {} tournaments, {} results (saved data: {})",
        data.players.len(),
        data.tournaments.len(),
        data.game_results.len(),
        restored
    );

    // 4. Sanitize
    let mut league = League::new(data, config.default_achievement())
        .with_tournament_defaults(config.tournament_defaults());
    league.validate_and_sanitize_state();
    let form = league.tournament_defaults();
    info!(
        "New tournaments default to {} weeks, {} random achievements per week",
        form.total_weeks, form.random_achievements_per_week
    );

    // 5. Persist
    db.save_league(league.data())
        .context("failed to save sanitized league")?;

    // 6. Standings
    print_summary(&config.league.name, &league);

    info!("Pod league shut down");
    Ok(())
}

fn print_summary(league_name: &str, league: &League) {
    println!("{league_name}");
    println!("screen: {}", league.current_screen());

    if let Some(t) = league.active_tournament() {
        println!(
            "active: {} (week {}/{}, round {})",
            t.name, t.current_week, t.total_weeks, t.current_round
        );
        for (rank, entry) in
            stats::tournament_leaderboard(t.id, league.players(), league.game_results())
                .iter()
                .enumerate()
        {
            println!(
                "{:>3}. {:<24} {:>5} pts  {:>3} wins",
                rank + 1,
                entry.name,
                entry.total_points,
                entry.wins
            );
        }
        return;
    }

    if league.players().is_empty() {
        println!("no players yet");
        return;
    }
    for (rank, player) in stats::leaderboard(league.players()).iter().enumerate() {
        println!(
            "{:>3}. {:<24} {:>5} pts  {:>3} wins  {:>5.1}% win rate",
            rank + 1,
            player.name,
            player.total_points(),
            player.wins,
            stats::win_rate(player) * 100.0
        );
    }
}

/// Initialize tracing to log to a file in the current working directory.
///
/// Log output goes to `logs/podleague.log`. The log level can be controlled
/// via the `RUST_LOG` environment variable (defaults to `podleague=info,warn`).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("podleague.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("podleague_core=info,podleague=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
