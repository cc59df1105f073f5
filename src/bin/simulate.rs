use chrono::{SecondsFormat, Utc};
use clap::Parser;
use packman_arena::config::MatchConfig;
use packman_arena::constants::{TICK_MS, TICK_RATE};
use packman_arena::engine::{Match, MatchOptions};
use packman_arena::error::ConfigError;
use packman_arena::types::{DecisionTier, MatchEvent, MatchOutcome, MatchSnapshot};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Match config JSON; the built-in maze and ghosts are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    minutes: Option<u64>,
    #[arg(long)]
    games: Option<usize>,
    /// Overrides the config's starting currency.
    #[arg(long)]
    currency: Option<u64>,
    /// Upgrade to buy before the first game; repeat to buy several levels.
    #[arg(long = "purchase")]
    purchases: Vec<String>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct GameResultLine {
    game: usize,
    seed: u64,
    minutes: u64,
    outcome: MatchOutcome,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    rounds: u32,
    #[serde(rename = "scorePacman")]
    score_pacman: u32,
    #[serde(rename = "scoreGhost")]
    score_ghost: u32,
    #[serde(rename = "pelletsByPacman")]
    pellets_by_pacman: u32,
    #[serde(rename = "pelletsByGhosts")]
    pellets_by_ghosts: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "pacmanDeaths")]
    pacman_deaths: u32,
    #[serde(rename = "experienceLevel")]
    experience_level: u32,
    #[serde(rename = "levelUps")]
    level_ups: u32,
    #[serde(rename = "tierTicks")]
    tier_ticks: BTreeMap<String, u64>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct GameRun {
    result: GameResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "gameCount")]
    game_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    games: Vec<GameResultLine>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "failed to load match config");
            std::process::exit(2);
        }
    };

    let started_at = timestamp();
    let base_seed = cli.seed.unwrap_or_else(rand::random);
    let minutes = cli.minutes.unwrap_or(3).clamp(1, 30);
    let games = cli.games.unwrap_or(1).clamp(1, 100);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(base_seed, &started_at));

    let mut results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_ms = 0u64;
    let mut total_anomalies = 0usize;
    let mut has_anomaly = false;

    for game in 0..games {
        let seed = base_seed.wrapping_add(game as u64);
        info!(match_id = %match_id, game, seed, minutes, "game started");
        let run = match run_game(&config, game, seed, minutes) {
            Ok(run) => run,
            Err(error) => {
                error!(%error, game, "failed to build match");
                std::process::exit(2);
            }
        };

        for anomaly in &run.anomaly_records {
            warn!(game, tick = anomaly.tick, message = %anomaly.message, "anomaly detected");
        }
        has_anomaly |= !run.result.anomalies.is_empty();
        total_anomalies += run.anomaly_records.len();
        total_duration_ms += run.result.duration_ms;
        *outcome_counts
            .entry(outcome_key(run.result.outcome).to_string())
            .or_insert(0) += 1;

        info!(
            game,
            tick = run.finished_tick,
            outcome = outcome_key(run.result.outcome),
            score_pacman = run.result.score_pacman,
            score_ghost = run.result.score_ghost,
            "game finished"
        );
        match serde_json::to_string(&run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => error!(%error, game, "result line did not serialize"),
        }
        results.push(run.result);
    }

    let summary = build_run_summary(
        match_id,
        started_at,
        timestamp(),
        results,
        outcome_counts,
        total_anomalies,
        total_duration_ms,
    );

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            error!(path = %path.display(), %error, "summary write failed");
            std::process::exit(2);
        }
        info!(path = %path.display(), "summary written");
    }

    info!(
        games = summary.game_count,
        anomalies = summary.anomaly_count,
        average_duration_ms = summary.average_duration_ms,
        "run finished"
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<MatchConfig, ConfigError> {
    let mut config = match cli.config.as_deref() {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    if let Some(currency) = cli.currency {
        config.inventory.currency = currency;
    }
    config.inventory.purchases.extend(cli.purchases.iter().cloned());
    Ok(config)
}

fn run_game(config: &MatchConfig, game: usize, seed: u64, minutes: u64) -> Result<GameRun, ConfigError> {
    let time_limit_ms = minutes * 60_000;
    let mut engine = Match::from_config(
        config,
        MatchOptions {
            seed,
            time_limit_ms: Some(time_limit_ms),
        },
    )?;
    let start_lives = config.pacman_lives.max(1);

    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut tier_ticks: BTreeMap<String, u64> = BTreeMap::new();
    let mut level_ups = 0;
    let mut last_tick = 0u64;
    let tick_limit = time_limit_ms / TICK_MS + TICK_RATE as u64;

    while !engine.is_ended() {
        engine.step(TICK_MS);
        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;
        for message in collect_snapshot_anomalies(&snapshot, start_lives) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        if snapshot.tick > tick_limit {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                "tick safety limit exceeded".to_string(),
            );
            break;
        }

        if let Some(tier) = snapshot.pacman.tier {
            *tier_ticks.entry(tier_key(tier).to_string()).or_insert(0) += 1;
        }
        level_ups += snapshot
            .events
            .iter()
            .filter(|event| matches!(event, MatchEvent::ExperienceLevelUp { .. }))
            .count() as u32;
    }

    let summary = engine.build_summary();
    Ok(GameRun {
        result: GameResultLine {
            game,
            seed,
            minutes,
            outcome: summary.outcome,
            duration_ms: summary.duration_ms,
            rounds: summary.rounds,
            score_pacman: summary.score_pacman,
            score_ghost: summary.score_ghost,
            pellets_by_pacman: summary.pellets_by_pacman,
            pellets_by_ghosts: summary.pellets_by_ghosts,
            ghosts_eaten: summary.ghosts_eaten,
            pacman_deaths: summary.pacman_deaths,
            experience_level: summary.experience_level,
            level_ups,
            tier_ticks,
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    })
}

fn collect_snapshot_anomalies(snapshot: &MatchSnapshot, start_lives: u32) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.ghost_multiplier < 1 {
        anomalies.push(format!("ghost multiplier below 1: {}", snapshot.ghost_multiplier));
    }
    if snapshot.pacman_lives > start_lives {
        anomalies.push(format!("pacman lives above start: {}", snapshot.pacman_lives));
    }
    if snapshot.pellets_remaining == 0 {
        anomalies.push("no active pellets left after refill".to_string());
    }

    for ghost in &snapshot.ghosts {
        if ghost.lives > ghost.max_lives {
            anomalies.push(format!(
                "ghost lives out of range: {} {}/{}",
                ghost.name, ghost.lives, ghost.max_lives
            ));
        }
        let live = ghost.active && ghost.lives > 0;
        if live && ghost.mode.is_none() {
            anomalies.push(format!("live ghost without a mode: {}", ghost.name));
        }
        if !live && ghost.mode.is_some() {
            anomalies.push(format!("dead ghost still has a mode: {}", ghost.name));
        }
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u64, started_at: &str) -> String {
    let stamp: String = started_at.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("sim-{seed}-{stamp}")
}

fn build_run_summary(
    match_id: String,
    started_at: String,
    finished_at: String,
    games: Vec<GameResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_ms: u64,
) -> RunSummary {
    let game_count = games.len();
    let average_duration_ms = if game_count == 0 {
        0
    } else {
        total_duration_ms / game_count as u64
    };
    RunSummary {
        match_id,
        started_at,
        finished_at,
        game_count,
        anomaly_count,
        average_duration_ms,
        outcome_counts,
        games,
    }
}

fn outcome_key(outcome: MatchOutcome) -> &'static str {
    match outcome {
        MatchOutcome::PacmanVictory => "pacman_victory",
        MatchOutcome::GhostVictory => "ghost_victory",
        MatchOutcome::Timeout => "timeout",
    }
}

fn tier_key(tier: DecisionTier) -> &'static str {
    match tier {
        DecisionTier::Flee => "flee",
        DecisionTier::ChaseFrightened => "chase_frightened",
        DecisionTier::Collect => "collect",
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use packman_arena::types::{Direction, FrightenedVisual, GhostMode, GhostView, PacmanView};

    fn make_result(outcome: MatchOutcome, duration_ms: u64) -> GameResultLine {
        GameResultLine {
            game: 0,
            seed: 42,
            minutes: 1,
            outcome,
            duration_ms,
            rounds: 1,
            score_pacman: 0,
            score_ghost: 0,
            pellets_by_pacman: 0,
            pellets_by_ghosts: 0,
            ghosts_eaten: 0,
            pacman_deaths: 0,
            experience_level: 0,
            level_ups: 0,
            tier_ticks: BTreeMap::new(),
            anomalies: Vec::new(),
        }
    }

    fn make_snapshot(mode: Option<GhostMode>, active: bool, lives: u32) -> MatchSnapshot {
        MatchSnapshot {
            tick: 1,
            now_ms: 50,
            time_left_ms: None,
            round: 1,
            score_pacman: 0,
            score_ghost: 0,
            pacman_lives: 3,
            ghost_multiplier: 1,
            experience_level: 0,
            experience_total: 0,
            pellets_remaining: 10,
            pacman: PacmanView {
                x: 1,
                y: 1,
                dir: Direction::None,
                alive: true,
                tier: None,
            },
            ghosts: vec![GhostView {
                id: 0,
                name: "Blinky".to_string(),
                x: 2,
                y: 2,
                dir: Direction::None,
                mode,
                visual: FrightenedVisual::Steady,
                active,
                lives,
                max_lives: 2,
                speed_multiplier: 1.0,
            }],
            events: Vec::new(),
        }
    }

    #[test]
    fn default_match_id_keeps_seed_and_digits_of_timestamp() {
        assert_eq!(
            default_match_id(42, "2024-05-01T10:20:30.400Z"),
            "sim-42-20240501102030400"
        );
    }

    #[test]
    fn build_run_summary_calculates_average_duration() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            "a".to_string(),
            "b".to_string(),
            vec![
                make_result(MatchOutcome::Timeout, 60_000),
                make_result(MatchOutcome::GhostVictory, 90_000),
            ],
            BTreeMap::from([
                ("timeout".to_string(), 1usize),
                ("ghost_victory".to_string(), 1usize),
            ]),
            1,
            150_000,
        );
        assert_eq!(summary.average_duration_ms, 75_000);
        assert_eq!(summary.game_count, 2);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("packman-arena-missing-{}", timestamp().replace(':', "-")))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            "a".to_string(),
            "b".to_string(),
            vec![make_result(MatchOutcome::Timeout, 60_000)],
            BTreeMap::from([("timeout".to_string(), 1usize)]),
            0,
            60_000,
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same".to_string());

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn snapshot_checks_flag_modeless_live_ghosts() {
        assert!(collect_snapshot_anomalies(&make_snapshot(Some(GhostMode::Chase), true, 1), 3).is_empty());
        assert!(collect_snapshot_anomalies(&make_snapshot(None, false, 0), 3).is_empty());

        let flagged = collect_snapshot_anomalies(&make_snapshot(None, true, 1), 3);
        assert_eq!(flagged, vec!["live ghost without a mode: Blinky".to_string()]);
        let over = collect_snapshot_anomalies(&make_snapshot(Some(GhostMode::Home), true, 3), 3);
        assert_eq!(over.len(), 1);
    }

    #[test]
    fn cli_purchases_append_to_config_seed() {
        let cli = Cli::parse_from([
            "simulate",
            "--currency",
            "500",
            "--purchase",
            "Thick Skin",
            "--purchase",
            "Fleet Foot",
        ]);
        let config = load_config(&cli).expect("default config loads");
        assert_eq!(config.inventory.currency, 500);
        assert_eq!(config.inventory.purchases, vec!["Thick Skin", "Fleet Foot"]);
    }

    #[test]
    fn short_game_runs_to_timeout_or_an_ending() {
        let run = run_game(&MatchConfig::default(), 0, 7, 1).expect("game runs");
        assert!(run.result.duration_ms <= 60_000);
        assert!(run.finished_tick > 0);
        assert!(run.result.anomalies.is_empty(), "{:?}", run.result.anomalies);
    }
}
