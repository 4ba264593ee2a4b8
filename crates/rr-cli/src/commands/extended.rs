//! `rr extended` — run an extended check to completion, banking
//! successes round by round toward the target.

use colored::Colorize;

use rr_mechanics::{
    ChainStatus, ExtendedCheckService, MemoryConsequenceStore, NoContent, SkillCheckService,
    rng_for,
};

pub fn run(
    skill: &str,
    target: u32,
    rounds: u32,
    pool: u32,
    actor: &str,
    seed: u64,
    json: bool,
) -> Result<(), String> {
    let content = NoContent;
    let service = SkillCheckService::standard(&content, &content);
    let extended = ExtendedCheckService::new(&service);
    let mut store = MemoryConsequenceStore::new();
    let mut rng = rng_for(seed, &format!("extended:{actor}:{skill}"));

    let mut state = extended
        .start(actor, skill, target, rounds, pool)
        .map_err(|e| e.to_string())?;

    if !json {
        println!(
            "  {} {skill} {}",
            "Extended check".bold(),
            format!("(target {target} in {rounds} rounds, actor {actor}, seed {seed})").dimmed()
        );
    }

    while state.status.is_active() {
        let check = extended
            .perform_round(&mut state, None, &mut store, &mut rng)
            .map_err(|e| e.to_string())?;
        if !json {
            println!(
                "  round {}: {} {} {}",
                state.rounds_completed(),
                super::roll_line(&check.resolution),
                super::tier_label(check.outcome.tier),
                format!("(banked {}/{target})", state.accumulated).dimmed()
            );
        }
    }

    if json {
        let rendered = serde_json::to_string_pretty(&state)
            .map_err(|e| format!("failed to serialize extended check state: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }

    let label = match state.status {
        ChainStatus::Succeeded => "task completed".green().bold(),
        ChainStatus::Failed => "task failed".red().bold(),
        _ => format!("task {}", state.status).normal(),
    };
    println!(
        "  {label} {}",
        format!(
            "({} rounds, {} banked, {} fumbles)",
            state.rounds_completed(),
            state.accumulated,
            state.total_fumbles
        )
        .dimmed()
    );
    Ok(())
}
