//! Puzzle trainer
//!
//! Line-driven driver over the puzzle core: picks puzzles from the SQLite
//! corpus, reads moves and commands from stdin, and records every attempt
//! in the progress file.

mod config;

use std::io::{self, BufRead, Write};

use anyhow::Context;
use chess_core::rules::{color_name, role_name};
use chess_core::Rules;
use chess_puzzler::puzzle::themes::{describe, themes_in, ThemeCategory};
use chess_puzzler::{
    format_clock, Difficulty, GamePhase, HintPayload, MoveResult, SelectionCriteria, Session,
    Trainer,
};
use puzzle_store::{JsonProgressStore, SqlitePuzzleStore};
use tracing::{info, warn};

use crate::config::Config;

type Store = Trainer<SqlitePuzzleStore, JsonProgressStore>;

/// Parse --difficulty N --phase P --theme T from CLI args
fn parse_criteria() -> anyhow::Result<SelectionCriteria> {
    let args: Vec<String> = std::env::args().collect();
    let mut criteria = SelectionCriteria::new(Difficulty::Intermediate);

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).map(String::as_str);
        match (args[i].as_str(), value) {
            ("--difficulty", Some(v)) => {
                let level: u8 = v.parse().context("--difficulty expects a number 1-5")?;
                criteria.difficulty = Difficulty::try_from(level)?;
                i += 1;
            }
            ("--phase", Some(v)) => {
                criteria = criteria.phase(GamePhase::parse_filter(v)?);
                i += 1;
            }
            ("--theme", Some(v)) => {
                criteria = criteria.theme(v);
                i += 1;
            }
            (flag, _) => warn!("Ignoring argument '{flag}'"),
        }
        i += 1;
    }
    Ok(criteria)
}

fn describe_hint(hint: &HintPayload) -> String {
    match hint {
        HintPayload::Piece { role } => format!("Move your {}", role_name(*role)),
        HintPayload::Origin { role, from } => format!("Move the {} on {from}", role_name(*role)),
        HintPayload::Destination { from, to, .. } => format!("Move from {from} to {to}"),
        HintPayload::FullMove { san, .. } => format!("Play {san}"),
    }
}

fn show_position(session: &Session) {
    let puzzle = session.puzzle();
    println!();
    println!(
        "Puzzle {} (rating {}, {}) {}",
        puzzle.id,
        puzzle.rating,
        puzzle.difficulty().name(),
        puzzle.phase()
    );
    println!("FEN: {}", session.fen());
    let last: Vec<String> = session
        .last_move_squares()
        .iter()
        .map(|sq| sq.to_string())
        .collect();
    if !last.is_empty() {
        println!("Last move: {}", last.join("-"));
    }
    println!(
        "{} to move, {} move(s) to find",
        color_name(session.side_to_move()),
        session.moves_remaining()
    );
    if let Some(remaining) = session.timer().remaining() {
        println!("Time remaining: {}", format_clock(remaining));
    }
}

fn print_stats(trainer: &Store) -> anyhow::Result<()> {
    let stats = trainer.stats()?;
    println!(
        "Solved {} of {} attempts ({:.1}%), streak {} (best {})",
        stats.total_solved,
        stats.total_attempted,
        stats.success_rate,
        stats.current_streak,
        stats.best_streak
    );
    for level in Difficulty::ALL {
        let avg = trainer
            .tracker()
            .average_time(Some(level))?
            .map(|secs| format_clock(std::time::Duration::from_secs_f64(secs)))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<12} solved {:>4}  avg {avg}",
            level.name(),
            stats.solved_at(level)
        );
    }
    Ok(())
}

/// Corpus theme counts grouped by catalog category, uncatalogued ones last
/// under "Other". Empty groups are left out.
fn group_themes(mut available: Vec<(String, usize)>) -> Vec<(&'static str, Vec<(String, usize)>)> {
    let mut groups = Vec::new();
    for category in ThemeCategory::ALL {
        let listed: Vec<(String, usize)> = themes_in(category)
            .into_iter()
            .filter_map(|name| {
                let pos = available.iter().position(|(theme, _)| theme == name)?;
                Some(available.remove(pos))
            })
            .collect();
        if !listed.is_empty() {
            groups.push((category.name(), listed));
        }
    }
    if !available.is_empty() {
        groups.push(("Other", available));
    }
    groups
}

fn print_themes(trainer: &Store) -> anyhow::Result<()> {
    let available = trainer.selector().available_themes(usize::MAX)?;
    for (heading, themes) in group_themes(available) {
        println!("{heading}:");
        for (theme, count) in themes {
            let description = describe(&theme).unwrap_or("");
            println!("  {theme:<20} {count:>6}  {description}");
        }
    }
    Ok(())
}

/// Listings are informational; a failure is reported and play continues.
fn show_listing(what: &str, result: anyhow::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not show {what}: {e:#}");
            println!("Could not show {what}");
            false
        }
    }
}

enum Next {
    NewPuzzle,
    Quit,
}

fn play_one(trainer: &mut Store, criteria: &SelectionCriteria) -> anyhow::Result<Next> {
    let mut session = trainer.start_session(criteria.clone())?;
    show_position(&session);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            trainer.abandon(session)?;
            return Ok(Next::Quit);
        };
        let line = line?;
        let input = line.trim();

        if session.timer().is_time_up() {
            println!("Time's up!");
            trainer.abandon(session)?;
            return Ok(Next::NewPuzzle);
        }

        match input {
            "" => continue,
            "quit" | "exit" => {
                trainer.abandon(session)?;
                return Ok(Next::Quit);
            }
            "skip" => {
                let expected = session.expected_move().map(|mv| session.board().san(mv));
                if let Some(san) = expected {
                    println!("Solution move was {san}");
                }
                trainer.abandon(session)?;
                return Ok(Next::NewPuzzle);
            }
            "hint" => {
                let hint = trainer.request_hint(&mut session)?;
                println!("Hint {}: {}", hint.level().number(), describe_hint(&hint));
            }
            "stats" => {
                show_listing("stats", print_stats(trainer));
            }
            "themes" => {
                show_listing("themes", print_themes(trainer));
            }
            "board" => show_position(&session),
            text => match trainer.submit(&mut session, text)? {
                MoveResult::Continue { reply } => {
                    println!("Correct! Opponent plays {reply}");
                    show_position(&session);
                }
                MoveResult::Solved => {
                    let penalty = session.hint_penalty();
                    let outcome = trainer.complete(session)?;
                    println!(
                        "Solved in {} with {} mistake(s) and {} hint(s) (-{penalty} points)",
                        format_clock(std::time::Duration::from_secs_f64(outcome.elapsed_secs)),
                        outcome.incorrect_attempts,
                        outcome.hints_used
                    );
                    return Ok(Next::NewPuzzle);
                }
                MoveResult::Incorrect => println!("Incorrect. Try again or type 'hint'."),
                MoveResult::Illegal { reason } => println!("{reason}"),
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let config = Config::from_env();
    let criteria = parse_criteria()?;
    info!(
        db = %config.puzzle_db_path,
        progress = %config.progress_path,
        difficulty = criteria.difficulty.level(),
        "Puzzle trainer starting"
    );

    let puzzles = SqlitePuzzleStore::open(&config.puzzle_db_path)
        .with_context(|| format!("opening puzzle database {}", config.puzzle_db_path))?;
    let progress = JsonProgressStore::open(&config.progress_path)
        .with_context(|| format!("opening progress file {}", config.progress_path))?;

    let trainer = match config.seed {
        Some(seed) => Trainer::with_seed(puzzles, progress, seed),
        None => Trainer::new(puzzles, progress),
    };
    let mut trainer = trainer.with_time_limit(config.time_limit);

    println!("Enter moves as Nf3 or g1f3. Commands: hint, skip, board, stats, themes, quit");
    loop {
        match play_one(&mut trainer, &criteria)? {
            Next::NewPuzzle => continue,
            Next::Quit => break,
        }
    }

    print_stats(&trainer)?;
    info!(
        progress = %trainer.tracker().store().path().display(),
        "Puzzle trainer stopped"
    );
    Ok(())
}
