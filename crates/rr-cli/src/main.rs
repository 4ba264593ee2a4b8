//! Command-line skill check roller for the Rune & Rust engine.

mod commands;

use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "rr",
    about = "Rune & Rust — skill check resolution from the command line",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll a single skill check (optionally contested)
    Check {
        /// Skill being tested (e.g. lockpicking, stealth)
        skill: String,

        /// Base dice pool
        #[arg(short, long)]
        pool: u32,

        /// Difficulty in required successes
        #[arg(short, long)]
        dc: u32,

        /// Acting character id
        #[arg(short, long, default_value = "hero")]
        actor: String,

        /// Situational dice adjustment (may be negative)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        dice_mod: i32,

        /// Situational DC adjustment (may be negative)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        dc_mod: i32,

        /// Resolve as a contested check against an opponent with this pool
        #[arg(long)]
        vs_pool: Option<u32>,

        /// RNG seed for deterministic rolls
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Emit the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Roll a cooperative check for several participants
    Coop {
        /// Skill everyone rolls
        skill: String,

        /// Shared difficulty in required successes
        #[arg(short, long)]
        dc: u32,

        /// Combination policy: weakest-link, best-effort, sum-successes, assisted
        #[arg(long, default_value = "weakest-link")]
        policy: String,

        /// Dice pool per participant (repeat per actor; first is primary)
        #[arg(short, long = "pool", required = true)]
        pools: Vec<u32>,

        /// RNG seed for deterministic rolls
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Emit the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a multi-step chained check to completion
    Chain {
        /// Chain name (e.g. "infiltrate the keep")
        name: String,

        /// Skill rolled at every step
        #[arg(long)]
        skill: String,

        /// Step as dc:pool (repeat in order)
        #[arg(long = "step", required = true)]
        steps: Vec<String>,

        /// Retry budget per step
        #[arg(short, long, default_value = "1")]
        retries: u32,

        /// Acting character id
        #[arg(short, long, default_value = "hero")]
        actor: String,

        /// RNG seed for deterministic rolls
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Emit the final chain state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run an extended check, banking successes round by round
    Extended {
        /// Skill rolled every round
        skill: String,

        /// Successes required to complete the task
        #[arg(short, long)]
        target: u32,

        /// Round limit before the task fails on time
        #[arg(long, default_value = "10")]
        rounds: u32,

        /// Base dice pool rolled each round
        #[arg(short, long)]
        pool: u32,

        /// Acting character id
        #[arg(short, long, default_value = "hero")]
        actor: String,

        /// RNG seed for deterministic rolls
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Emit the final check state as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("RR_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            skill,
            pool,
            dc,
            actor,
            dice_mod,
            dc_mod,
            vs_pool,
            seed,
            json,
        } => commands::check::run(&skill, pool, dc, &actor, dice_mod, dc_mod, vs_pool, seed, json),
        Commands::Coop {
            skill,
            dc,
            policy,
            pools,
            seed,
            json,
        } => commands::coop::run(&skill, dc, &policy, &pools, seed, json),
        Commands::Chain {
            name,
            skill,
            steps,
            retries,
            actor,
            seed,
            json,
        } => commands::chain::run(&name, &skill, &steps, retries, &actor, seed, json),
        Commands::Extended {
            skill,
            target,
            rounds,
            pool,
            actor,
            seed,
            json,
        } => commands::extended::run(&skill, target, rounds, pool, &actor, seed, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
