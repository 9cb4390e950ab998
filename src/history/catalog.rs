//! Built-in curated reference outcomes.

use crate::history::outcome::HistoricalOutcome;

pub fn curated_outcomes() -> Vec<HistoricalOutcome> {
    vec![
        HistoricalOutcome::new("Battle of Cannae (216 BC)", "Double envelopment", 0.78, 0.85)
            .with_context("Weak centre draws the enemy in while cavalry closes the flanks")
            .with_key_factors(["terrain", "leadership", "cavalry superiority", "maneuver"]),
        HistoricalOutcome::new("Operation Fortitude (1944)", "Strategic deception", 0.85, 0.90)
            .with_context("Phantom army and false radio traffic fix enemy reserves away from the landing")
            .with_key_factors(["deception", "intelligence superiority", "timing"]),
        HistoricalOutcome::new("Battle of Agincourt (1415)", "Prepared defensive position", 0.72, 0.70)
            .with_context("Outnumbered force holds a narrow muddy field with longbow fire")
            .with_key_factors(["terrain", "fortification", "defensive", "enemy morale"]),
        HistoricalOutcome::new("Operation Market Garden (1944)", "Deep airborne thrust", 0.35, 0.80)
            .with_context("Ambitious timetable along a single road with poor intelligence on armour")
            .with_key_factors(["timing", "intelligence", "supply lines", "maneuver"]),
        HistoricalOutcome::new("Battle of Gaugamela (331 BC)", "Oblique attack", 0.74, 0.75)
            .with_context("Flank extension opens a gap exploited by a decisive cavalry wedge")
            .with_key_factors(["maneuver", "leadership", "timing"]),
        HistoricalOutcome::new("Siege of Alesia (52 BC)", "Circumvallation", 0.66, 0.65)
            .with_context("Double line of fortifications against the garrison and a relief army")
            .with_key_factors(["fortification", "defensive", "supply lines", "attrition"]),
        HistoricalOutcome::new("Battle of Verdun (1916)", "Attrition offensive", 0.30, 0.60)
            .with_context("Sustained bombardment meant to bleed the defender white")
            .with_key_factors(["attrition", "resource availability", "enemy morale"]),
        HistoricalOutcome::new("Operation Mincemeat (1943)", "Planted documents", 0.80, 0.75)
            .with_context("Forged plans on a corpse divert reinforcements from Sicily")
            .with_key_factors(["deception", "deception credibility", "intelligence"]),
        HistoricalOutcome::new("Battle of Austerlitz (1805)", "Feigned weakness", 0.82, 0.80)
            .with_context("Deliberately weakened flank invites an attack off the commanding heights")
            .with_key_factors(["deception", "terrain", "maneuver", "leadership"]),
        HistoricalOutcome::new("Gallipoli Campaign (1915)", "Amphibious landing", 0.25, 0.70)
            .with_context("Landings stall against prepared defenders on commanding ground")
            .with_key_factors(["terrain", "supply lines", "intelligence", "timing"]),
        HistoricalOutcome::new("Battle of Thermopylae (480 BC)", "Chokepoint defence", 0.45, 0.60)
            .with_context("Small force holds a narrow pass until outflanked by a mountain path")
            .with_key_factors(["terrain", "defensive", "enemy intelligence"]),
        HistoricalOutcome::new("Inchon Landing (1950)", "Amphibious envelopment", 0.88, 0.80)
            .with_context("Landing deep behind the front cuts enemy supply lines")
            .with_key_factors(["maneuver", "timing", "supply lines", "deception"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curated_records_are_well_formed() {
        let records = curated_outcomes();
        assert!(!records.is_empty());
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.validate(i), Ok(()), "{}", record.source);
            assert!(!record.key_factors.is_empty(), "{}", record.source);
        }
    }
}
