//! `rr coop` — roll a cooperative check for several participants.

use colored::Colorize;

use rr_mechanics::{
    MemoryConsequenceStore, NoContent, Participant, SkillCheckService, SkillContextBuilder,
    rng_for,
};

pub fn run(
    skill: &str,
    dc: u32,
    policy: &str,
    pools: &[u32],
    seed: u64,
    json: bool,
) -> Result<(), String> {
    let policy = super::parse_policy(policy)?;

    let names: Vec<String> = (1..=pools.len()).map(|i| format!("actor-{i}")).collect();
    let participants: Vec<Participant<'_>> = names
        .iter()
        .zip(pools)
        .map(|(name, &base_pool)| Participant {
            actor_id: name,
            context: None,
            base_pool,
        })
        .collect();

    let context = SkillContextBuilder::new().build();
    let content = NoContent;
    let service = SkillCheckService::standard(&content, &content);
    let mut store = MemoryConsequenceStore::new();
    let mut rng = rng_for(seed, &format!("coop:{skill}"));

    let result = service
        .resolve_cooperative(&participants, skill, dc, policy, &context, &mut store, &mut rng)
        .map_err(|e| e.to_string())?;

    if json {
        let rendered = serde_json::to_string_pretty(&result)
            .map_err(|e| format!("failed to serialize result: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }

    println!(
        "  {} {} {}",
        "Cooperative".bold(),
        skill,
        format!("({policy}, DC {dc}, seed {seed})").dimmed()
    );
    for (actor, individual) in &result.individual {
        println!("  {actor}: {}", super::roll_line(&individual.resolution));
    }
    println!(
        "  {} (margin {:+})",
        super::tier_label(result.outcome.tier),
        result.outcome.margin
    );
    if result.contributors.is_empty() {
        println!("  {}", "no contributors".dimmed());
    } else {
        println!("  contributors: {}", result.contributors.join(", "));
    }
    Ok(())
}
