pub mod chain;
pub mod check;
pub mod coop;
pub mod extended;

use colored::{ColoredString, Colorize};

use rr_mechanics::{CombinationPolicy, DiceResolution, OutcomeTier};

/// Parse a combination policy name as given on the command line.
pub fn parse_policy(name: &str) -> Result<CombinationPolicy, String> {
    match name {
        "weakest-link" => Ok(CombinationPolicy::WeakestLink),
        "best-effort" => Ok(CombinationPolicy::BestEffort),
        "sum-successes" => Ok(CombinationPolicy::SumSuccesses),
        "assisted" => Ok(CombinationPolicy::Assisted),
        other => Err(format!(
            "unknown policy '{other}' (expected weakest-link, best-effort, sum-successes, or assisted)"
        )),
    }
}

/// Color a tier label for terminal output.
pub fn tier_label(tier: OutcomeTier) -> ColoredString {
    match tier {
        OutcomeTier::Fumble => "FUMBLE".red().bold(),
        OutcomeTier::Failure => "failure".red(),
        OutcomeTier::MarginalSuccess => "marginal success".yellow(),
        OutcomeTier::Success => "success".green(),
        OutcomeTier::CriticalSuccess => "CRITICAL SUCCESS".green().bold(),
    }
}

/// One line of dice detail: faces, successes, botches.
pub fn roll_line(resolution: &DiceResolution) -> String {
    if resolution.auto_succeeded {
        return "auto-succeeded (no dice drawn)".to_string();
    }
    let faces: Vec<String> = resolution.faces.iter().map(u32::to_string).collect();
    format!(
        "[{}] {} successes, {} botches",
        faces.join(", "),
        resolution.successes,
        resolution.botches
    )
}
