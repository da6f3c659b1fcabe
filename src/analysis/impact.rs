use super::classifier::combined_text;
use crate::taxonomy::{impact_rules_for, ImpactLevel};

// First tier with any matching rule wins.
pub fn assess(description: &str, log_text: &str) -> ImpactLevel {
    let text = combined_text(description, log_text);

    ImpactLevel::TIERS
        .iter()
        .copied()
        .find(|level| {
            impact_rules_for(*level)
                .map(|set| set.rules.iter().any(|rule| rule.regex.is_match(&text)))
                .unwrap_or(false)
        })
        .unwrap_or(ImpactLevel::Info)
}
