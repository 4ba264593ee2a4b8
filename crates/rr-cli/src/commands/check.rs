//! `rr check` — roll a single or contested skill check.

use colored::Colorize;

use rr_mechanics::{
    CheckRequest, DurationKind, MemoryConsequenceStore, NoContent, SituationalModifier,
    SkillCheckService, SkillContextBuilder, rng_for,
};

#[allow(clippy::too_many_arguments)]
pub fn run(
    skill: &str,
    pool: u32,
    dc: u32,
    actor: &str,
    dice_mod: i32,
    dc_mod: i32,
    vs_pool: Option<u32>,
    seed: u64,
    json: bool,
) -> Result<(), String> {
    let mut builder = SkillContextBuilder::new();
    if dice_mod != 0 || dc_mod != 0 {
        builder = builder.with_situation(SituationalModifier {
            id: "cli-adjust".to_string(),
            name: "Command-line adjustment".to_string(),
            dice_delta: dice_mod,
            dc_delta: dc_mod,
            source: Some("cli".to_string()),
            duration: DurationKind::Instant,
        });
    }
    let context = builder.build();

    let content = NoContent;
    let service = SkillCheckService::standard(&content, &content);
    let mut store = MemoryConsequenceStore::new();
    let mut rng = rng_for(seed, &format!("check:{actor}:{skill}"));

    let request = CheckRequest {
        actor_id: actor,
        skill_id: skill,
        sub_type: None,
        target_id: None,
        context: &context,
        base_pool: pool,
        dc,
    };

    if let Some(vs_pool) = vs_pool {
        let empty = SkillContextBuilder::new().build();
        let defender = CheckRequest {
            actor_id: "opponent",
            skill_id: skill,
            sub_type: None,
            target_id: Some(actor),
            context: &empty,
            base_pool: vs_pool,
            dc,
        };
        let result = service.resolve_contested(&request, &defender, &mut store, &mut rng);
        if json {
            let rendered = serde_json::to_string_pretty(&result)
                .map_err(|e| format!("failed to serialize result: {e}"))?;
            println!("{rendered}");
            return Ok(());
        }
        println!(
            "  {} {} vs {}",
            "Contested".bold(),
            actor,
            result.defender_id
        );
        println!("  {actor}: {}", super::roll_line(&result.initiator_roll));
        println!(
            "  {}: {}",
            result.defender_id,
            super::roll_line(&result.defender_roll)
        );
        println!(
            "  {} (margin {:+})",
            format!("{:?}", result.outcome).bold(),
            result.margin
        );
        return Ok(());
    }

    let result = service.resolve(&request, &mut store, &mut rng);
    if json {
        let rendered = serde_json::to_string_pretty(&result)
            .map_err(|e| format!("failed to serialize result: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }

    println!(
        "  {} rolls {} {}",
        actor.bold(),
        skill,
        format!("(pool {pool}, DC {dc}, seed {seed})").dimmed()
    );
    if let Some(reason) = &result.blocked {
        println!("  {} {reason:?}", "blocked:".red().bold());
        return Ok(());
    }
    println!("  {}", super::roll_line(&result.resolution));
    println!(
        "  {} (margin {:+})",
        super::tier_label(result.outcome.tier),
        result.outcome.margin
    );
    for id in &result.triggered_consequence_ids {
        println!("  {} {id}", "consequence:".red());
    }
    Ok(())
}
