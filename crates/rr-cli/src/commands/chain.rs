//! `rr chain` — run a multi-step chained check to completion,
//! spending retry budget automatically on soft failures.

use colored::Colorize;

use rr_mechanics::{
    ChainService, ChainStatus, ChainStep, MemoryChainRepository, MemoryConsequenceStore,
    NoContent, SkillCheckService, rng_for,
};

pub fn run(
    name: &str,
    skill: &str,
    steps: &[String],
    retries: u32,
    actor: &str,
    seed: u64,
    json: bool,
) -> Result<(), String> {
    let steps = parse_steps(steps, skill, retries)?;

    let content = NoContent;
    let service = SkillCheckService::standard(&content, &content);
    let chains = ChainService::new(&service);
    let mut repo = MemoryChainRepository::new();
    let mut store = MemoryConsequenceStore::new();
    let mut rng = rng_for(seed, &format!("chain:{actor}:{name}"));

    let id = chains
        .start_chain(actor, name, steps, &mut repo)
        .map_err(|e| e.to_string())?;

    if !json {
        println!(
            "  {} '{name}' {}",
            "Chain".bold(),
            format!("(actor {actor}, seed {seed})").dimmed()
        );
    }

    loop {
        let state = chains.chain_state(&id, &repo).map_err(|e| e.to_string())?;
        if !state.status.is_active() {
            break;
        }
        let out = if state.awaiting_retry() {
            chains.retry_step(&id, None, &mut repo, &mut store, &mut rng)
        } else {
            chains.process_step(&id, None, &mut repo, &mut store, &mut rng)
        }
        .map_err(|e| e.to_string())?;
        if !json {
            println!(
                "  step {}: {} {}",
                out.step_index + 1,
                super::roll_line(&out.check.resolution),
                super::tier_label(out.check.outcome.tier)
            );
        }
    }

    let state = chains.chain_state(&id, &repo).map_err(|e| e.to_string())?;
    if json {
        let rendered = serde_json::to_string_pretty(&state)
            .map_err(|e| format!("failed to serialize chain state: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }

    let label = match state.status {
        ChainStatus::Succeeded => "chain succeeded".green().bold(),
        ChainStatus::Failed => "chain failed".red().bold(),
        _ => format!("chain {}", state.status).normal(),
    };
    println!(
        "  {label} {}",
        format!("({} attempts)", state.attempts.len()).dimmed()
    );
    Ok(())
}

/// Parse `dc:pool` step arguments in order.
fn parse_steps(args: &[String], skill: &str, retries: u32) -> Result<Vec<ChainStep>, String> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            let (dc, pool) = arg
                .split_once(':')
                .ok_or_else(|| format!("step '{arg}' is not in dc:pool form"))?;
            let dc: u32 = dc
                .parse()
                .map_err(|_| format!("step '{arg}': '{dc}' is not a valid DC"))?;
            let pool: u32 = pool
                .parse()
                .map_err(|_| format!("step '{arg}': '{pool}' is not a valid pool"))?;
            Ok(ChainStep {
                id: format!("step-{}", i + 1),
                name: format!("step {}", i + 1),
                skill_id: skill.to_string(),
                dc,
                base_pool: pool,
                max_retries: retries,
                context: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dc_pool_pairs() {
        let steps = parse_steps(
            &["2:6".to_string(), "3:5".to_string()],
            "lore",
            1,
        )
        .unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].dc, 2);
        assert_eq!(steps[0].base_pool, 6);
        assert_eq!(steps[1].dc, 3);
        assert_eq!(steps[1].max_retries, 1);
    }

    #[test]
    fn rejects_malformed_steps() {
        assert!(parse_steps(&["2-6".to_string()], "lore", 0).is_err());
        assert!(parse_steps(&["x:6".to_string()], "lore", 0).is_err());
    }
}
