//! Heuristic detectors. Each detector derives a feature record from its input
//! and runs it through a static rule table; weights come from the [`Ruleset`]
//! so tuning a rule never touches the predicate.

use crate::core::signal::Signal;

pub mod domain;
pub mod image;
pub mod tables;
pub mod text;
pub mod url;

pub use tables::Ruleset;

/// Outcome of a predicate that held: how many distinct things matched and
/// the evidence naming them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub count: usize,
    pub evidence: String,
}

impl Hit {
    pub fn once(evidence: impl Into<String>) -> Self {
        Self {
            count: 1,
            evidence: evidence.into(),
        }
    }

    pub fn many(count: usize, evidence: impl Into<String>) -> Self {
        Self {
            count,
            evidence: evidence.into(),
        }
    }
}

/// One row of a rule table.
pub struct Rule<F> {
    pub code: &'static str,
    pub check: fn(&F) -> Option<Hit>,
}

/// Bonus that fires when every code in `requires` already fired.
pub struct ComboRule {
    pub code: &'static str,
    pub requires: &'static [&'static str],
    pub evidence: &'static str,
}

/// Run `rules` in order; fired rules become signals weighted by `ruleset`.
pub fn evaluate<F>(rules: &[Rule<F>], features: &F, ruleset: &Ruleset) -> Vec<Signal> {
    rules
        .iter()
        .filter_map(|rule| {
            let hit = (rule.check)(features)?;
            Some(weighted(rule.code, hit, ruleset))
        })
        .collect()
}

/// Append combo bonuses whose prerequisites are present in `signals`.
pub fn apply_combos(signals: &mut Vec<Signal>, combos: &[ComboRule], ruleset: &Ruleset) {
    for combo in combos {
        let satisfied = combo
            .requires
            .iter()
            .all(|code| signals.iter().any(|s| s.code == *code));
        if satisfied {
            let signal = weighted(combo.code, Hit::once(combo.evidence), ruleset);
            signals.push(signal);
        }
    }
}

fn weighted(code: &'static str, hit: Hit, ruleset: &Ruleset) -> Signal {
    let weight = ruleset.weight(code).for_hits(hit.count);
    tracing::debug!(code, weight, evidence = %hit.evidence, "rule fired");
    Signal::new(code, weight, hit.evidence)
}

/// Join matched terms for an evidence string.
pub(crate) fn listing(items: &[String]) -> String {
    items.join(", ")
}
