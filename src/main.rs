//! Tablut match runner
//!
//! Plays one game between two bots and reports the result. Logging is controlled
//! with `RUST_LOG` (for example `RUST_LOG=tablut=debug` to see every board).

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tablut::{AlphaBetaBot, Bot, Match, MatchConfig, MatchResult, Player, RandomBot};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BotKind {
    /// Fixed-depth alpha-beta search
    Alphabeta,
    /// Uniformly random legal moves
    Random,
}

#[derive(Parser)]
#[command(name = "tablut")]
#[command(about = "Play a game of Tablut between two bots")]
struct Cli {
    /// Bot playing the attackers
    #[arg(long, value_enum, default_value = "alphabeta")]
    attackers: BotKind,

    /// Bot playing the defenders
    #[arg(long, value_enum, default_value = "alphabeta")]
    defenders: BotKind,

    /// Search depth for alpha-beta bots
    #[arg(long)]
    depth: Option<u32>,

    /// Moves allowed to each side before the game is drawn
    #[arg(long)]
    move_limit: Option<usize>,

    /// Time allowed per move in milliseconds
    #[arg(long)]
    time_per_move_ms: Option<u64>,

    /// Seed for random bots
    #[arg(long)]
    seed: Option<u64>,

    /// Match configuration JSON file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the game record as JSON
    #[arg(long, value_name = "FILE")]
    record: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<MatchConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        }
        None => MatchConfig::default(),
    };

    if let Some(depth) = cli.depth {
        config.search_depth = depth;
    }
    if let Some(limit) = cli.move_limit {
        config.move_limit = limit;
    }
    if let Some(ms) = cli.time_per_move_ms {
        config.time_per_move = Duration::from_millis(ms);
    }
    Ok(config)
}

fn make_bot(kind: BotKind, side: Player, config: &MatchConfig, seed: Option<u64>) -> Box<dyn Bot> {
    let name = format!("{kind:?}-{side}");
    match kind {
        BotKind::Alphabeta => Box::new(AlphaBetaBot::new(name, config.search_depth)),
        BotKind::Random => match seed {
            // Distinct streams for the two sides
            Some(seed) => Box::new(RandomBot::with_seed(name, seed.wrapping_add(side as u64))),
            None => Box::new(RandomBot::new(name)),
        },
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let attackers = make_bot(cli.attackers, Player::Attackers, &config, cli.seed);
    let defenders = make_bot(cli.defenders, Player::Defenders, &config, cli.seed);

    let mut game = Match::new(attackers, defenders, config);
    let result = game.play()?;

    println!("{}", game.board());
    match &result {
        MatchResult::AttackersWin { winner_name, moves } => {
            println!("{winner_name} wins as Attackers in {moves} moves");
        }
        MatchResult::DefendersWin { winner_name, moves } => {
            println!("{winner_name} wins as Defenders in {moves} moves");
        }
        MatchResult::Draw { moves } => {
            println!("Draw after {moves} moves");
        }
        MatchResult::Timeout { violator, winner } => {
            println!("{winner} wins by timeout ({violator} overran)");
        }
        MatchResult::IllegalMove { violator, winner } => {
            println!("{winner} wins by illegal move ({violator} forfeited)");
        }
    }
    if game.board().repeated_position() {
        println!("Decided by repetition");
    }

    if let Some(path) = &cli.record {
        let json = serde_json::to_string_pretty(&game.record(&result))?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write record: {}", path.display()))?;
    }

    Ok(())
}
