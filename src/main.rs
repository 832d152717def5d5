use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crash_game_sim::estimate::{self, QuickParams, QuickProfile, RugParams};
use crash_game_sim::report::{self, SimulationReport};
use crash_game_sim::{HouseProfitPolicy, SimConfig, Simulator, Strategy};

#[derive(Parser, Debug)]
#[command(name = "crash-game-sim")]
#[command(about = "Monte Carlo economics of a leveraged crash game")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Print verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Full candle-by-candle simulation
    Run {
        /// Number of rounds to simulate
        #[arg(short, long, env = "CRASH_SIM_ROUNDS")]
        rounds: Option<usize>,

        /// Players per strategy
        #[arg(short, long, env = "CRASH_SIM_PLAYERS")]
        players: Option<usize>,

        /// Base seed; round r uses seed + r
        #[arg(short, long, env = "CRASH_SIM_SEED")]
        seed: Option<u64>,

        /// Strategies to include (comma-separated)
        #[arg(long, value_delimiter = ',', env = "CRASH_SIM_STRATEGIES")]
        strategies: Option<Vec<Strategy>>,

        /// fees_only or fees_and_liquidations
        #[arg(long, env = "CRASH_SIM_HOUSE_POLICY")]
        house_policy: Option<HouseProfitPolicy>,

        /// JSON simulation config; flags override its run parameters
        #[arg(short, long, env = "CRASH_SIM_CONFIG")]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Write per-round summaries to this CSV file
        #[arg(long)]
        rounds_csv: Option<PathBuf>,
    },

    /// Quick estimate from sampled trade profiles
    Quick {
        #[arg(short, long, default_value = "1000", env = "CRASH_SIM_ROUNDS")]
        rounds: usize,

        #[arg(short, long, default_value = "50", env = "CRASH_SIM_PLAYERS")]
        players: usize,

        #[arg(short, long, default_value = "0", env = "CRASH_SIM_SEED")]
        seed: u64,

        /// JSON simulation config supplying the game rules
        #[arg(short, long, env = "CRASH_SIM_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Rug frequency and returns for an idle player
    Rug {
        #[arg(long, default_value = "10000")]
        simulations: usize,

        #[arg(short, long, default_value = "0", env = "CRASH_SIM_SEED")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = if args.verbose { "crash_game_sim=debug" } else { "crash_game_sim=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    match args.command {
        Commands::Run {
            rounds, players, seed,
            strategies, house_policy, config,
            json, rounds_csv,
        } => {
            let mut sim_config = load_config(config.as_ref())?;
            if let Some(rounds) = rounds {
                sim_config.rounds = rounds;
            }
            if let Some(players) = players {
                sim_config.players_per_strategy = players;
            }
            if let Some(seed) = seed {
                sim_config.seed = seed;
            }
            if let Some(strategies) = strategies {
                sim_config.strategies = strategies;
            }
            if let Some(policy) = house_policy {
                sim_config.house_policy = policy;
            }
            run_simulation(sim_config, json, rounds_csv)?;
        }
        Commands::Quick { rounds, players, seed, config } => {
            let sim_config = load_config(config.as_ref())?;
            let params = QuickParams {
                rounds,
                players_per_strategy: players,
                seed,
                ..Default::default()
            };
            info!("Quick estimate: {} rounds, {} players per strategy", rounds, players);
            let reports = estimate::quick_estimate(&sim_config.game, &params, &QuickProfile::defaults())?;
            estimate::print_quick_results(&reports, &params);
        }
        Commands::Rug { simulations, seed } => {
            let params = RugParams { simulations, seed, ..Default::default() };
            let report = estimate::rug_estimate(&params)?;
            estimate::print_rug_report(&report);
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };

    let file = File::open(path).with_context(|| format!("Failed to open config {:?}", path))?;
    let config = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse config {:?}", path))?;
    info!("Loaded config from {:?}", path);
    Ok(config)
}

fn run_simulation(config: SimConfig, json: bool, rounds_csv: Option<PathBuf>) -> Result<()> {
    let simulator = Simulator::new(config).context("Invalid simulation config")?;
    let outcome = simulator.run();
    let report = SimulationReport::from_outcome(&outcome, simulator.config());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print_report(&report);
    }

    if let Some(path) = rounds_csv {
        let file = File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
        report::write_rounds_csv(&outcome.rounds, BufWriter::new(file))?;
        info!("Wrote {} rounds to {:?}", outcome.rounds.len(), path);
    }

    Ok(())
}
