//! Strictly Draft - Unified CLI
//!
//! Replays histories, rolls first turns, generates pools and serves draft
//! requests against a SQLite database.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strictly_draft::{
    DraftHistory, DraftInvariants, InvariantSet, PickValidator, PlayerId, PoolConfig,
    ReplayView, RulesConfig, generate_pool, reconstruct, resolve_first_player,
};
use strictly_draft_server::{
    DraftRequest, DraftService, ServerConfig, SqliteStore, load_catalog, load_pool_config,
    load_rules,
};
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Replay {
            catalog,
            history,
            player1,
            player2,
            budget,
            rules,
        } => run_replay(&catalog, &history, player1.into(), player2.into(), budget, rules),
        Command::Roll {
            player1,
            player2,
            seed,
            faces,
        } => run_roll(player1.into(), player2.into(), seed, faces),
        Command::Pool {
            catalog,
            config,
            seed,
        } => run_pool(&catalog, config, seed),
        Command::Migrate { db_path } => run_migrate(db_path),
        Command::Serve { config, seed } => run_serve(&config, seed),
        Command::Schema => run_schema(),
    }
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Replay a history blob and print the derived state
#[instrument(skip(catalog_path, history_path, rules_path))]
fn run_replay(
    catalog_path: &Path,
    history_path: &Path,
    player1: PlayerId,
    player2: PlayerId,
    budget: Option<u32>,
    rules_path: Option<PathBuf>,
) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let rules = match rules_path {
        Some(path) => load_rules(path)?,
        None => RulesConfig::default(),
    };
    let blob = std::fs::read_to_string(history_path)
        .with_context(|| format!("reading {}", history_path.display()))?;
    let history = DraftHistory::parse(&blob)?;

    let (first, second) = match history.initial_roll() {
        Some(roll) if roll.winner() == &player2 => (player2.clone(), player1.clone()),
        Some(_) => (player1.clone(), player2.clone()),
        None => {
            warn!("History has no initial roll, seating player1 first");
            (player1.clone(), player2.clone())
        }
    };
    let budget = budget.unwrap_or(*rules.points_budget());
    let events = history.log().events();
    let state = reconstruct(events, &catalog, &first, &second)?;
    let invariants = DraftInvariants::check_all(&ReplayView::new(events, &state, budget))
        .err()
        .unwrap_or_default()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    let draft = strictly_draft::Draft::invite(
        "replay".into(),
        "replay".into(),
        player1,
        player2,
        budget,
    )?;
    let validator = PickValidator::new(&catalog, &rules);
    let output = json!({
        "state": &state,
        "legal_picks": validator.legal_picks(&state, &draft),
        "complete": validator.is_complete(&state, &draft),
        "invariant_violations": invariants,
    });
    info!(picks = state.picks_made(), "History replayed");
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Roll for the first turn
#[instrument]
fn run_roll(player1: PlayerId, player2: PlayerId, seed: Option<u64>, faces: u8) -> Result<()> {
    let roll = resolve_first_player(&player1, &player2, faces, &mut rng_from(seed))?;
    println!("{}", serde_json::to_string_pretty(&roll)?);
    Ok(())
}

/// Generate a draft pool
#[instrument(skip(catalog_path, config_path))]
fn run_pool(catalog_path: &Path, config_path: Option<PathBuf>, seed: Option<u64>) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let config = match config_path {
        Some(path) => load_pool_config(path)?,
        None => PoolConfig::default(),
    };
    let pool = generate_pool(&catalog, &config, &mut rng_from(seed))?;
    println!("{}", serde_json::to_string_pretty(&pool)?);
    Ok(())
}

/// Apply database migrations
#[instrument]
fn run_migrate(db_path: String) -> Result<()> {
    let store = SqliteStore::new(db_path)?;
    let applied = store.run_migrations()?;
    info!(applied, "Database ready");
    Ok(())
}

/// Serve JSON requests over stdio
#[instrument(skip(config_path), fields(config = %config_path.display()))]
fn run_serve(config_path: &Path, seed: Option<u64>) -> Result<()> {
    let config = ServerConfig::from_file(config_path)?;
    let catalog = config.load_catalog()?;
    let store = SqliteStore::new(config.db_path().clone())?;
    store.run_migrations()?;

    let mut service = DraftService::new(store, Arc::new(catalog), config.rules().clone())?;
    if let Some(pool) = config.pool() {
        service = service.with_pool(pool.clone());
    }
    if let Some(seed) = seed {
        service = service.with_seed(seed);
    }

    info!("Serving draft requests on stdin");
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        debug!(bytes = line.len(), "Request received");
        let response = service.handle_json(&line);
        println!("{}", serde_json::to_string(&response)?);
    }
    info!("Input closed, shutting down");
    Ok(())
}

/// Print the request schema
fn run_schema() -> Result<()> {
    let schema = schemars::schema_for!(DraftRequest);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
