//! Plan - Effects computed by the differ, in execution order
//!
//! Building a Plan touches nothing remote; a host walks `effects()` to apply it.

use std::fmt;

use crate::effect::Effect;

#[derive(Debug, Clone, Default)]
pub struct Plan {
    effects: Vec<Effect>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Whether applying would change anything on the platform
    pub fn has_changes(&self) -> bool {
        self.effects.iter().any(Effect::is_mutating)
    }

    pub fn summary(&self) -> PlanSummary {
        self.effects
            .iter()
            .fold(PlanSummary::default(), |mut summary, effect| {
                match effect {
                    Effect::Read(_) => summary.queries += 1,
                    Effect::Create(_) => summary.creates += 1,
                    Effect::Update { .. } => summary.updates += 1,
                    Effect::Delete(_) => summary.deletes += 1,
                }
                summary
            })
    }
}

impl FromIterator<Effect> for Plan {
    fn from_iter<I: IntoIterator<Item = Effect>>(iter: I) -> Self {
        Self {
            effects: iter.into_iter().collect(),
        }
    }
}

/// Effect counts by kind
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlanSummary {
    pub queries: usize,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl PlanSummary {
    pub fn changes(&self) -> usize {
        self.creates + self.updates + self.deletes
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Plan: {} to add, {} to change, {} to destroy",
            self.creates, self.updates, self.deletes
        )?;
        if self.queries > 0 {
            write!(f, " ({} data sources read)", self.queries)?;
        }
        Ok(())
    }
}
